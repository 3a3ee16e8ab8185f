//! Runs against a real PostgreSQL database when `DATABASE_URL` is set.
//!
//! The comments migration references `tasks` and `users`; minimal versions are created
//! here if the database does not already have them.

use chrono::{DateTime, Utc};
use taskboard_server::{
    db::{create_pool, run_migrations},
    store::{CommentStore, Missing, PgCommentStore, StoreError},
    DbPool,
};
use uuid::Uuid;

struct Fixture {
    db: DbPool,
    store: PgCommentStore,
    task: Uuid,
    ada: Uuid,
    bob: Uuid,
}

async fn fixture(url: &str) -> Fixture {
    let db = create_pool(url, 16).await.unwrap();

    sqlx::query("CREATE TABLE IF NOT EXISTS tasks (id UUID PRIMARY KEY)")
        .execute(&db)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (id UUID PRIMARY KEY, display_name TEXT NOT NULL)",
    )
    .execute(&db)
    .await
    .unwrap();
    run_migrations(&db).await.unwrap();

    let task = Uuid::new_v4();
    let ada = Uuid::new_v4();
    let bob = Uuid::new_v4();
    sqlx::query("INSERT INTO tasks (id) VALUES ($1)")
        .bind(task)
        .execute(&db)
        .await
        .unwrap();
    for (id, name) in [(ada, "Ada"), (bob, "Bob")] {
        sqlx::query("INSERT INTO users (id, display_name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(&db)
            .await
            .unwrap();
    }

    Fixture {
        store: PgCommentStore::new(db.clone()),
        db,
        task,
        ada,
        bob,
    }
}

#[tokio::test]
async fn postgres_comment_store() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping postgres store tests");
        return;
    };
    // Sequential: the setup creates shared tables.
    let f = fixture(&url).await;

    lifecycle(&f).await;
    only_author_may_mutate(&f).await;
    list_orders_by_creation_then_insertion(&f).await;
    concurrent_deletes_succeed_once(&f).await;
    edit_never_lands_on_deleted_row(&f).await;
}

async fn lifecycle(f: &Fixture) {
    let created = f.store.create(f.task, f.ada, "  LGTM ").await.unwrap();
    assert_eq!(created.content, "LGTM");
    assert_eq!(created.author_name, "Ada");

    // Returned timestamps are the stored ones.
    assert_eq!(f.store.list(f.task).await.unwrap(), vec![created.clone()]);

    let edited = f
        .store
        .update(f.task, created.id, f.ada, "LGTM, ship it")
        .await
        .unwrap();
    assert_eq!(edited.content, "LGTM, ship it");
    assert_eq!(edited.created_at, created.created_at);
    assert!(edited.updated_at >= created.updated_at);
    assert_eq!(f.store.list(f.task).await.unwrap(), vec![edited.clone()]);

    f.store.soft_delete(f.task, created.id, f.ada).await.unwrap();
    assert!(f.store.list(f.task).await.unwrap().is_empty());

    let err = f
        .store
        .update(f.task, created.id, f.ada, "x")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(Missing::Comment)));
    let err = f
        .store
        .soft_delete(f.task, created.id, f.ada)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(Missing::Comment)));

    let raw = f.store.find_any(created.id).await.unwrap().unwrap();
    assert_eq!(raw.content, "LGTM, ship it");
    assert!(raw.deleted_at.is_some());

    let err = f.store.list(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(Missing::Task)));
    let err = f
        .store
        .create(f.task, Uuid::new_v4(), "who")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(Missing::Author)));
}

async fn only_author_may_mutate(f: &Fixture) {
    let c = f.store.create(f.task, f.bob, "nice").await.unwrap();

    let err = f
        .store
        .update(f.task, c.id, f.ada, "hacked")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));
    let err = f.store.soft_delete(f.task, c.id, f.ada).await.unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));

    let raw = f.store.find_any(c.id).await.unwrap().unwrap();
    assert_eq!(raw.content, "nice");
    assert!(raw.deleted_at.is_none());

    f.store.soft_delete(f.task, c.id, f.bob).await.unwrap();
}

async fn list_orders_by_creation_then_insertion(f: &Fixture) {
    let first = f.store.create(f.task, f.ada, "first").await.unwrap();
    let second = f.store.create(f.task, f.bob, "second").await.unwrap();
    let third = f.store.create(f.task, f.ada, "third").await.unwrap();
    let hidden = f.store.create(f.task, f.ada, "hidden").await.unwrap();
    f.store.soft_delete(f.task, hidden.id, f.ada).await.unwrap();

    // Identical creation times fall back to insertion order.
    let same: DateTime<Utc> = third.created_at;
    sqlx::query("UPDATE task_comments SET created_at = $1 WHERE id = ANY($2)")
        .bind(same)
        .bind(vec![first.id, second.id, third.id])
        .execute(&f.db)
        .await
        .unwrap();

    let list = f.store.list(f.task).await.unwrap();
    let ids: Vec<Uuid> = list.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
    assert_eq!(list[1].author_name, "Bob");

    for c in [first, second, third] {
        let author = c.user_id;
        f.store.soft_delete(f.task, c.id, author).await.unwrap();
    }
}

async fn concurrent_deletes_succeed_once(f: &Fixture) {
    for _ in 0..10 {
        let c = f.store.create(f.task, f.ada, "contested").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = f.store.clone();
                let (task, ada, id) = (f.task, f.ada, c.id);
                tokio::spawn(async move { store.soft_delete(task, id, ada).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => succeeded += 1,
                Err(err) => assert!(matches!(err, StoreError::NotFound(Missing::Comment))),
            }
        }
        assert_eq!(succeeded, 1);
    }
}

async fn edit_never_lands_on_deleted_row(f: &Fixture) {
    for _ in 0..20 {
        let c = f.store.create(f.task, f.ada, "before").await.unwrap();

        let (edit, delete) = tokio::join!(
            f.store.update(f.task, c.id, f.ada, "after"),
            f.store.soft_delete(f.task, c.id, f.ada),
        );
        delete.unwrap();

        let raw = f.store.find_any(c.id).await.unwrap().unwrap();
        let deleted_at = raw.deleted_at.unwrap();
        match edit {
            Ok(edited) => {
                assert_eq!(raw.content, "after");
                assert!(edited.updated_at <= deleted_at);
            }
            Err(err) => {
                assert!(matches!(err, StoreError::NotFound(Missing::Comment)));
                assert_eq!(raw.content, "before");
            }
        }
    }
}

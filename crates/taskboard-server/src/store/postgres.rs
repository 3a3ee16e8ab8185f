use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskboard_shared::{validation::normalize_content, Comment, CommentWithAuthor};
use uuid::Uuid;

use super::{authorize_mutation, CommentStore, Missing, StoreError};
use crate::db::DbPool;

/// Comment store backed by the `task_comments` table.
///
/// `tasks` and `users` are owned by other services and only read here.
#[derive(Clone)]
pub struct PgCommentStore {
    db: DbPool,
}

type CommentWithAuthorRow = (
    Uuid,                          // id
    Uuid,                          // task_id
    Uuid,                          // user_id
    String,                        // author display name
    String,                        // content
    DateTime<Utc>,                 // created_at
    DateTime<Utc>,                 // updated_at
);

fn row_to_comment(row: CommentWithAuthorRow) -> CommentWithAuthor {
    CommentWithAuthor {
        id: row.0,
        task_id: row.1,
        user_id: row.2,
        author_name: row.3,
        content: row.4,
        created_at: row.5,
        updated_at: row.6,
    }
}

impl PgCommentStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn verify_task(&self, task_id: Uuid) -> Result<(), StoreError> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&self.db)
            .await?;

        if exists.is_none() {
            return Err(StoreError::NotFound(Missing::Task));
        }
        Ok(())
    }

    async fn author_name(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT display_name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|(name,)| name))
    }

    async fn fetch_raw(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, content, created_at, updated_at, deleted_at
            FROM task_comments
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(comment)
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn list(&self, task_id: Uuid) -> Result<Vec<CommentWithAuthor>, StoreError> {
        self.verify_task(task_id).await?;

        let rows: Vec<CommentWithAuthorRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.task_id, c.user_id, COALESCE(u.display_name, ''), c.content,
                   c.created_at, c.updated_at
            FROM task_comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.task_id = $1 AND c.deleted_at IS NULL
            ORDER BY c.created_at ASC, c.seq ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_comment).collect())
    }

    async fn create(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, StoreError> {
        let content = normalize_content(content)?;

        self.verify_task(task_id).await?;
        let author_name = self
            .author_name(author_id)
            .await?
            .ok_or(StoreError::NotFound(Missing::Author))?;

        let id = Uuid::new_v4();
        let (created_at, updated_at): (DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO task_comments (id, task_id, user_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(task_id)
        .bind(author_id)
        .bind(&content)
        .fetch_one(&self.db)
        .await?;

        tracing::debug!(comment_id = %id, %task_id, "comment created");

        Ok(CommentWithAuthor {
            id,
            task_id,
            user_id: author_id,
            author_name,
            content,
            created_at,
            updated_at,
        })
    }

    async fn update(
        &self,
        task_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, StoreError> {
        let content = normalize_content(content)?;

        let existing = self.fetch_raw(comment_id).await?;
        authorize_mutation(existing.as_ref(), task_id, author_id)?;

        // The row may have changed since the read.
        let updated = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE task_comments
            SET content = $1, updated_at = GREATEST(clock_timestamp(), updated_at)
            WHERE id = $2 AND task_id = $3 AND deleted_at IS NULL
            RETURNING id, task_id, user_id, content, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&content)
        .bind(comment_id)
        .bind(task_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(Missing::Comment))?;

        tracing::debug!(%comment_id, %task_id, "comment updated");

        let author_name = self.author_name(author_id).await?.unwrap_or_default();
        Ok(updated.with_author(author_name))
    }

    async fn soft_delete(
        &self,
        task_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<(), StoreError> {
        let existing = self.fetch_raw(comment_id).await?;
        authorize_mutation(existing.as_ref(), task_id, author_id)?;

        let result = sqlx::query(
            r#"
            UPDATE task_comments
            SET deleted_at = clock_timestamp()
            WHERE id = $1 AND task_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(comment_id)
        .bind(task_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(Missing::Comment));
        }

        tracing::debug!(%comment_id, %task_id, "comment soft-deleted");
        Ok(())
    }

    async fn find_any(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.fetch_raw(comment_id).await
    }
}

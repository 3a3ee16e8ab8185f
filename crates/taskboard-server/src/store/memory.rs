use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use taskboard_shared::{validation::normalize_content, Comment, CommentWithAuthor};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{authorize_mutation, bumped_timestamp, CommentStore, Missing, StoreError};

/// In-process comment store.
///
/// Tasks and users belong to other services; seed them with [`MemoryStore::insert_task`]
/// and [`MemoryStore::insert_user`]. Comments are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    tasks: HashSet<Uuid>,
    users: HashMap<Uuid, String>,
    comments: Vec<Comment>,
}

impl MemoryState {
    fn author_name(&self, user_id: Uuid) -> String {
        self.users.get(&user_id).cloned().unwrap_or_default()
    }

    fn position(&self, comment_id: Uuid) -> Option<usize> {
        self.comments.iter().position(|c| c.id == comment_id)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_task(&self, task_id: Uuid) {
        self.state.write().await.tasks.insert(task_id);
    }

    pub async fn insert_user(&self, user_id: Uuid, display_name: &str) {
        self.state
            .write()
            .await
            .users
            .insert(user_id, display_name.to_string());
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn list(&self, task_id: Uuid) -> Result<Vec<CommentWithAuthor>, StoreError> {
        let state = self.state.read().await;
        if !state.tasks.contains(&task_id) {
            return Err(StoreError::NotFound(Missing::Task));
        }

        let mut live: Vec<&Comment> = state
            .comments
            .iter()
            .filter(|c| c.task_id == task_id && c.is_live())
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        live.sort_by_key(|c| c.created_at);

        Ok(live
            .into_iter()
            .map(|c| c.clone().with_author(state.author_name(c.user_id)))
            .collect())
    }

    async fn create(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, StoreError> {
        let content = normalize_content(content)?;

        let mut state = self.state.write().await;
        if !state.tasks.contains(&task_id) {
            return Err(StoreError::NotFound(Missing::Task));
        }
        let author_name = state
            .users
            .get(&author_id)
            .cloned()
            .ok_or(StoreError::NotFound(Missing::Author))?;

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            task_id,
            user_id: author_id,
            content,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.comments.push(comment.clone());

        tracing::debug!(comment_id = %comment.id, %task_id, "comment created");
        Ok(comment.with_author(author_name))
    }

    async fn update(
        &self,
        task_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, StoreError> {
        let content = normalize_content(content)?;

        let mut state = self.state.write().await;
        let idx = state
            .position(comment_id)
            .ok_or(StoreError::NotFound(Missing::Comment))?;
        authorize_mutation(Some(&state.comments[idx]), task_id, author_id)?;

        let comment = &mut state.comments[idx];
        comment.content = content;
        comment.updated_at = bumped_timestamp(comment.updated_at);
        let updated = comment.clone();

        tracing::debug!(%comment_id, %task_id, "comment updated");
        Ok(updated.with_author(state.author_name(author_id)))
    }

    async fn soft_delete(
        &self,
        task_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let idx = state
            .position(comment_id)
            .ok_or(StoreError::NotFound(Missing::Comment))?;
        authorize_mutation(Some(&state.comments[idx]), task_id, author_id)?;

        state.comments[idx].deleted_at = Some(Utc::now());

        tracing::debug!(%comment_id, %task_id, "comment soft-deleted");
        Ok(())
    }

    async fn find_any(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == comment_id).cloned())
    }
}

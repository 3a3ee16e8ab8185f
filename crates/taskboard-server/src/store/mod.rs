//! Comment persistence.
//!
//! Every operation is scoped to one task. Mutations are check-then-act against the
//! latest stored row with no version token, so concurrent edits of the same comment
//! are last-write-wins.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskboard_shared::{validation::ContentError, Comment, CommentWithAuthor};
use uuid::Uuid;

mod guard;
mod memory;
mod postgres;

pub use guard::authorize_mutation;
pub use memory::MemoryStore;
pub use postgres::PgCommentStore;

/// Which referenced record was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Task,
    Author,
    Comment,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Task => f.write_str("Task"),
            Missing::Author => f.write_str("Author"),
            Missing::Comment => f.write_str("Comment"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ContentError),

    #[error("{0} not found")]
    NotFound(Missing),

    #[error("Only the author may change this comment")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Live comments for a task, oldest first.
    async fn list(&self, task_id: Uuid) -> Result<Vec<CommentWithAuthor>, StoreError>;

    async fn create(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, StoreError>;

    async fn update(
        &self,
        task_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, StoreError>;

    /// Set the soft-delete marker. The row is kept.
    async fn soft_delete(
        &self,
        task_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<(), StoreError>;

    /// Raw lookup that ignores the live filter.
    async fn find_any(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError>;
}

/// Timestamp for an edit. Never earlier than the previous `updated_at`.
pub(crate) fn bumped_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

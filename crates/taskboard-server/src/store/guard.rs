use taskboard_shared::Comment;
use uuid::Uuid;

use super::{Missing, StoreError};

/// Ordered checks shared by update and soft delete.
///
/// 1. the comment exists
/// 2. it belongs to `task_id`
/// 3. it has not been soft-deleted
/// 4. `actor_id` is its author
///
/// The first three fail with `NotFound`; only the last yields `Forbidden`.
pub fn authorize_mutation(
    comment: Option<&Comment>,
    task_id: Uuid,
    actor_id: Uuid,
) -> Result<&Comment, StoreError> {
    let comment = comment.ok_or(StoreError::NotFound(Missing::Comment))?;

    if comment.task_id != task_id {
        return Err(StoreError::NotFound(Missing::Comment));
    }
    if !comment.is_live() {
        return Err(StoreError::NotFound(Missing::Comment));
    }
    if comment.user_id != actor_id {
        return Err(StoreError::Forbidden);
    }

    Ok(comment)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn comment(task_id: Uuid, user_id: Uuid) -> Comment {
        let now = Utc::now();
        Comment {
            id: Uuid::new_v4(),
            task_id,
            user_id,
            content: "nice".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn missing_comment_is_not_found() {
        let err = authorize_mutation(None, Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Missing::Comment)));
    }

    #[test]
    fn other_task_is_not_found_even_for_stranger() {
        let c = comment(Uuid::new_v4(), Uuid::new_v4());
        let err = authorize_mutation(Some(&c), Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Missing::Comment)));
    }

    #[test]
    fn deleted_wins_over_forbidden() {
        let mut c = comment(Uuid::new_v4(), Uuid::new_v4());
        c.deleted_at = Some(Utc::now());
        let err = authorize_mutation(Some(&c), c.task_id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Missing::Comment)));
    }

    #[test]
    fn stranger_is_forbidden() {
        let c = comment(Uuid::new_v4(), Uuid::new_v4());
        let err = authorize_mutation(Some(&c), c.task_id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden));
    }

    #[test]
    fn author_passes() {
        let c = comment(Uuid::new_v4(), Uuid::new_v4());
        let ok = authorize_mutation(Some(&c), c.task_id, c.user_id).unwrap();
        assert_eq!(ok.id, c.id);
    }
}

//! Comment panel state.
//!
//! The panel never talks to the network itself. Each user action is a state transition
//! that may return a [`PanelRequest`]; the caller performs it and feeds the
//! [`PanelOutcome`] back through [`CommentPanel::apply`]. Every successful mutation is
//! followed by a full `List` rather than a local patch.

use std::collections::HashSet;

use taskboard_shared::{validation::is_blank, CommentWithAuthor};
use uuid::Uuid;

use crate::api::ApiError;

/// A control that can have one request in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Add,
    Save(Uuid),
    Delete(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub comment_id: Uuid,
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelRequest {
    List {
        task_id: Uuid,
    },
    Create {
        task_id: Uuid,
        content: String,
    },
    Update {
        task_id: Uuid,
        comment_id: Uuid,
        content: String,
    },
    Delete {
        task_id: Uuid,
        comment_id: Uuid,
    },
}

#[derive(Debug)]
pub enum PanelOutcome {
    Listed {
        task_id: Uuid,
        result: Result<Vec<CommentWithAuthor>, ApiError>,
    },
    Created {
        task_id: Uuid,
        result: Result<(), ApiError>,
    },
    Updated {
        task_id: Uuid,
        comment_id: Uuid,
        result: Result<(), ApiError>,
    },
    Deleted {
        task_id: Uuid,
        comment_id: Uuid,
        result: Result<(), ApiError>,
    },
}

impl PanelOutcome {
    fn task_id(&self) -> Uuid {
        match self {
            PanelOutcome::Listed { task_id, .. }
            | PanelOutcome::Created { task_id, .. }
            | PanelOutcome::Updated { task_id, .. }
            | PanelOutcome::Deleted { task_id, .. } => *task_id,
        }
    }
}

pub struct CommentPanel {
    task_id: Uuid,
    pub comments: Vec<CommentWithAuthor>,
    pub draft: String,
    pub editing: Option<EditState>,
    pub selected: usize,
    busy: HashSet<Control>,
}

impl CommentPanel {
    /// Mount the panel for a task. The returned request loads its comments.
    pub fn new(task_id: Uuid) -> (Self, PanelRequest) {
        let panel = Self {
            task_id,
            comments: Vec::new(),
            draft: String::new(),
            editing: None,
            selected: 0,
            busy: HashSet::new(),
        };
        (panel, PanelRequest::List { task_id })
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.busy.contains(&control)
    }

    pub fn refresh(&self) -> PanelRequest {
        PanelRequest::List {
            task_id: self.task_id,
        }
    }

    /// Point the panel at another task. In-flight results for the old task are dropped.
    pub fn set_task(&mut self, task_id: Uuid) -> Option<PanelRequest> {
        if task_id == self.task_id {
            return None;
        }

        self.task_id = task_id;
        self.comments.clear();
        self.editing = None;
        self.selected = 0;
        self.busy.clear();
        Some(self.refresh())
    }

    pub fn selected_comment(&self) -> Option<&CommentWithAuthor> {
        self.comments.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected < self.comments.len().saturating_sub(1) {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn submit_draft(&mut self) -> Option<PanelRequest> {
        if is_blank(&self.draft) || !self.busy.insert(Control::Add) {
            return None;
        }

        Some(PanelRequest::Create {
            task_id: self.task_id,
            content: self.draft.clone(),
        })
    }

    /// Enter edit mode for a displayed comment, copying its content into the buffer.
    pub fn begin_edit(&mut self, comment_id: Uuid) -> bool {
        let Some(comment) = self.comments.iter().find(|c| c.id == comment_id) else {
            return false;
        };

        self.editing = Some(EditState {
            comment_id,
            buffer: comment.content.clone(),
        });
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn save_edit(&mut self) -> Option<PanelRequest> {
        let edit = self.editing.as_ref()?;
        if is_blank(&edit.buffer) || !self.busy.insert(Control::Save(edit.comment_id)) {
            return None;
        }

        Some(PanelRequest::Update {
            task_id: self.task_id,
            comment_id: edit.comment_id,
            content: edit.buffer.clone(),
        })
    }

    /// Delete right away; there is no confirmation step.
    pub fn delete(&mut self, comment_id: Uuid) -> Option<PanelRequest> {
        if !self.busy.insert(Control::Delete(comment_id)) {
            return None;
        }

        Some(PanelRequest::Delete {
            task_id: self.task_id,
            comment_id,
        })
    }

    /// Fold a finished request into the panel. Returns the follow-up refetch, if any.
    ///
    /// Failures are logged and leave the panel as it was.
    pub fn apply(&mut self, outcome: PanelOutcome) -> Option<PanelRequest> {
        if outcome.task_id() != self.task_id {
            tracing::debug!(task_id = %outcome.task_id(), "dropping result for previous task");
            return None;
        }

        match outcome {
            PanelOutcome::Listed { result, .. } => {
                match result {
                    Ok(comments) => self.replace_comments(comments),
                    Err(e) => tracing::error!("Error fetching comments: {}", e),
                }
                None
            }
            PanelOutcome::Created { result, .. } => {
                self.busy.remove(&Control::Add);
                match result {
                    Ok(()) => {
                        self.draft.clear();
                        Some(self.refresh())
                    }
                    Err(e) => {
                        tracing::error!("Error adding comment: {}", e);
                        None
                    }
                }
            }
            PanelOutcome::Updated {
                comment_id, result, ..
            } => {
                self.busy.remove(&Control::Save(comment_id));
                match result {
                    Ok(()) => {
                        if self.editing.as_ref().map(|e| e.comment_id) == Some(comment_id) {
                            self.editing = None;
                        }
                        Some(self.refresh())
                    }
                    Err(e) => {
                        tracing::error!("Error editing comment: {}", e);
                        None
                    }
                }
            }
            PanelOutcome::Deleted {
                comment_id, result, ..
            } => {
                self.busy.remove(&Control::Delete(comment_id));
                match result {
                    Ok(()) => Some(self.refresh()),
                    Err(e) => {
                        tracing::error!("Error deleting comment: {}", e);
                        None
                    }
                }
            }
        }
    }

    fn replace_comments(&mut self, comments: Vec<CommentWithAuthor>) {
        self.comments = comments;
        self.selected = self.selected.min(self.comments.len().saturating_sub(1));

        // Leave edit mode if the comment is gone from the list.
        if let Some(edit) = &self.editing {
            if !self.comments.iter().any(|c| c.id == edit.comment_id) {
                self.editing = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn comment(task_id: Uuid, content: &str) -> CommentWithAuthor {
        let now = Utc::now();
        CommentWithAuthor {
            id: Uuid::new_v4(),
            task_id,
            user_id: Uuid::new_v4(),
            author_name: "Ada".to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn loaded(contents: &[&str]) -> CommentPanel {
        let (mut panel, _) = CommentPanel::new(Uuid::new_v4());
        let task_id = panel.task_id();
        let comments = contents.iter().map(|c| comment(task_id, c)).collect();
        panel.apply(PanelOutcome::Listed {
            task_id,
            result: Ok(comments),
        });
        panel
    }

    #[test]
    fn mount_requests_list() {
        let task_id = Uuid::new_v4();
        let (panel, request) = CommentPanel::new(task_id);
        assert_eq!(request, PanelRequest::List { task_id });
        assert!(panel.comments.is_empty());
    }

    #[test]
    fn list_replaces_sequence_wholesale() {
        let mut panel = loaded(&["one", "two"]);
        let task_id = panel.task_id();
        let fresh = vec![comment(task_id, "three")];

        assert_eq!(
            panel.apply(PanelOutcome::Listed {
                task_id,
                result: Ok(fresh.clone()),
            }),
            None
        );
        assert_eq!(panel.comments, fresh);
    }

    #[test]
    fn failed_list_keeps_displayed_comments() {
        let mut panel = loaded(&["one"]);
        let task_id = panel.task_id();

        panel.apply(PanelOutcome::Listed {
            task_id,
            result: Err(ApiError::Server("500".to_string())),
        });
        assert_eq!(panel.comments.len(), 1);
    }

    #[test]
    fn blank_draft_is_not_submitted() {
        let mut panel = loaded(&[]);
        panel.draft = "   ".to_string();
        assert_eq!(panel.submit_draft(), None);
        assert!(!panel.is_busy(Control::Add));
    }

    #[test]
    fn successful_create_clears_draft_and_refetches() {
        let mut panel = loaded(&[]);
        let task_id = panel.task_id();
        panel.draft = "LGTM".to_string();

        assert_eq!(
            panel.submit_draft(),
            Some(PanelRequest::Create {
                task_id,
                content: "LGTM".to_string(),
            })
        );
        assert!(panel.is_busy(Control::Add));

        let next = panel.apply(PanelOutcome::Created {
            task_id,
            result: Ok(()),
        });
        assert_eq!(next, Some(PanelRequest::List { task_id }));
        assert!(panel.draft.is_empty());
        assert!(!panel.is_busy(Control::Add));
    }

    #[test]
    fn failed_create_keeps_draft() {
        let mut panel = loaded(&[]);
        let task_id = panel.task_id();
        panel.draft = "LGTM".to_string();
        panel.submit_draft();

        let next = panel.apply(PanelOutcome::Created {
            task_id,
            result: Err(ApiError::Validation("too long".to_string())),
        });
        assert_eq!(next, None);
        assert_eq!(panel.draft, "LGTM");
        assert!(!panel.is_busy(Control::Add));
    }

    #[test]
    fn busy_add_blocks_only_itself() {
        let mut panel = loaded(&["keep", "drop"]);
        panel.draft = "first".to_string();
        assert!(panel.submit_draft().is_some());
        assert_eq!(panel.submit_draft(), None);

        let target = panel.comments[1].id;
        assert!(panel.delete(target).is_some());
        assert!(panel.begin_edit(panel.comments[0].id));
        assert!(panel.save_edit().is_some());
    }

    #[test]
    fn same_delete_is_not_sent_twice() {
        let mut panel = loaded(&["one"]);
        let id = panel.comments[0].id;
        assert!(panel.delete(id).is_some());
        assert_eq!(panel.delete(id), None);
    }

    #[test]
    fn edit_save_exits_edit_mode_and_refetches() {
        let mut panel = loaded(&["LGTM"]);
        let task_id = panel.task_id();
        let id = panel.comments[0].id;

        assert!(panel.begin_edit(id));
        let edit = panel.editing.as_mut().unwrap();
        assert_eq!(edit.buffer, "LGTM");
        edit.buffer.push_str(", ship it");

        assert_eq!(
            panel.save_edit(),
            Some(PanelRequest::Update {
                task_id,
                comment_id: id,
                content: "LGTM, ship it".to_string(),
            })
        );
        assert_eq!(panel.save_edit(), None);

        let next = panel.apply(PanelOutcome::Updated {
            task_id,
            comment_id: id,
            result: Ok(()),
        });
        assert_eq!(next, Some(PanelRequest::List { task_id }));
        assert_eq!(panel.editing, None);
    }

    #[test]
    fn failed_save_stays_in_edit_mode() {
        let mut panel = loaded(&["nice"]);
        let task_id = panel.task_id();
        let id = panel.comments[0].id;
        panel.begin_edit(id);
        panel.editing.as_mut().unwrap().buffer = "hacked".to_string();
        panel.save_edit();

        let next = panel.apply(PanelOutcome::Updated {
            task_id,
            comment_id: id,
            result: Err(ApiError::Forbidden),
        });
        assert_eq!(next, None);
        assert_eq!(panel.editing.as_ref().unwrap().buffer, "hacked");
        assert!(!panel.is_busy(Control::Save(id)));
    }

    #[test]
    fn cancel_discards_buffer_without_request() {
        let mut panel = loaded(&["LGTM"]);
        let id = panel.comments[0].id;
        panel.begin_edit(id);
        panel.editing.as_mut().unwrap().buffer.clear();

        assert_eq!(panel.save_edit(), None);
        panel.cancel_edit();
        assert_eq!(panel.editing, None);
        assert!(!panel.is_busy(Control::Save(id)));
    }

    #[test]
    fn delete_refetches_and_refetch_drops_stale_edit() {
        let mut panel = loaded(&["one", "two"]);
        let task_id = panel.task_id();
        let gone = panel.comments[1].id;
        panel.selected = 1;
        panel.begin_edit(gone);

        let request = panel.delete(gone);
        assert_eq!(
            request,
            Some(PanelRequest::Delete {
                task_id,
                comment_id: gone,
            })
        );

        let next = panel.apply(PanelOutcome::Deleted {
            task_id,
            comment_id: gone,
            result: Ok(()),
        });
        assert_eq!(next, Some(PanelRequest::List { task_id }));

        let remaining = vec![panel.comments[0].clone()];
        panel.apply(PanelOutcome::Listed {
            task_id,
            result: Ok(remaining),
        });
        assert_eq!(panel.comments.len(), 1);
        assert_eq!(panel.selected, 0);
        assert_eq!(panel.editing, None);
    }

    #[test]
    fn task_change_reloads_and_ignores_stale_results() {
        let mut panel = loaded(&["old"]);
        let old_task = panel.task_id();
        panel.draft = "pending".to_string();
        panel.submit_draft();

        assert_eq!(panel.set_task(old_task), None);

        let new_task = Uuid::new_v4();
        assert_eq!(
            panel.set_task(new_task),
            Some(PanelRequest::List { task_id: new_task })
        );
        assert!(panel.comments.is_empty());
        assert!(!panel.is_busy(Control::Add));

        let next = panel.apply(PanelOutcome::Created {
            task_id: old_task,
            result: Ok(()),
        });
        assert_eq!(next, None);
        assert_eq!(panel.draft, "pending");

        panel.apply(PanelOutcome::Listed {
            task_id: old_task,
            result: Ok(vec![comment(old_task, "old")]),
        });
        assert!(panel.comments.is_empty());
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut panel = loaded(&["a", "b"]);
        panel.select_prev();
        assert_eq!(panel.selected, 0);
        panel.select_next();
        panel.select_next();
        assert_eq!(panel.selected, 1);
        assert_eq!(panel.selected_comment().unwrap().content, "b");
    }
}

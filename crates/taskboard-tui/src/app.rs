use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::comments::{CommentPanel, PanelOutcome, PanelRequest};

/// Which part of the screen receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Compose,
    Edit,
    TaskPrompt,
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Comments(PanelOutcome),
}

pub struct App {
    pub api: ApiClient,
    pub server_url: String,
    pub panel: CommentPanel,
    pub focus: Focus,

    // Task switch prompt
    pub task_input: String,
    pub task_input_invalid: bool,
}

impl App {
    /// Build the app and the request that loads the initial task.
    pub fn new(api: ApiClient, server_url: &str, task_id: Uuid) -> (Self, PanelRequest) {
        let (panel, request) = CommentPanel::new(task_id);
        let app = Self {
            api,
            server_url: server_url.to_string(),
            panel,
            focus: Focus::List,
            task_input: String::new(),
            task_input_invalid: false,
        };
        (app, request)
    }

    /// Run a panel request in the background; its outcome comes back as an event.
    pub fn dispatch(&self, request: PanelRequest, tx: &mpsc::Sender<AppEvent>) {
        let api = self.api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = execute(&api, request).await;
            let _ = tx.send(AppEvent::Comments(outcome)).await;
        });
    }

    pub fn on_outcome(&mut self, outcome: PanelOutcome, tx: &mpsc::Sender<AppEvent>) {
        if let Some(next) = self.panel.apply(outcome) {
            self.dispatch(next, tx);
        }
        if self.focus == Focus::Edit && self.panel.editing.is_none() {
            self.focus = Focus::List;
        }
    }

    /// Handle key events, returns true if app should quit
    pub fn handle_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) -> bool {
        // Global quit with Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.focus {
            Focus::List => return self.handle_list_key(key, tx),
            Focus::Compose => self.handle_compose_key(key, tx),
            Focus::Edit => self.handle_edit_key(key, tx),
            Focus::TaskPrompt => self.handle_task_prompt_key(key, tx),
        }

        false
    }

    fn handle_list_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => self.panel.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.panel.select_prev(),
            KeyCode::Char('a') | KeyCode::Char('i') => self.focus = Focus::Compose,
            KeyCode::Char('e') => {
                if let Some(id) = self.panel.selected_comment().map(|c| c.id) {
                    if self.panel.begin_edit(id) {
                        self.focus = Focus::Edit;
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.panel.selected_comment().map(|c| c.id) {
                    if let Some(request) = self.panel.delete(id) {
                        self.dispatch(request, tx);
                    }
                }
            }
            KeyCode::Char('r') => self.dispatch(self.panel.refresh(), tx),
            KeyCode::Char('t') => {
                self.task_input.clear();
                self.task_input_invalid = false;
                self.focus = Focus::TaskPrompt;
            }
            _ => {}
        }

        false
    }

    fn handle_compose_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::List,
            KeyCode::Enter => {
                if let Some(request) = self.panel.submit_draft() {
                    self.dispatch(request, tx);
                }
            }
            KeyCode::Char(c) => self.panel.draft.push(c),
            KeyCode::Backspace => {
                self.panel.draft.pop();
            }
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) {
        match key.code {
            KeyCode::Esc => {
                self.panel.cancel_edit();
                self.focus = Focus::List;
            }
            KeyCode::Enter => {
                if let Some(request) = self.panel.save_edit() {
                    self.dispatch(request, tx);
                }
            }
            KeyCode::Char(c) => {
                if let Some(edit) = self.panel.editing.as_mut() {
                    edit.buffer.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(edit) = self.panel.editing.as_mut() {
                    edit.buffer.pop();
                }
            }
            _ => {}
        }
    }

    fn handle_task_prompt_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::List,
            KeyCode::Enter => match self.task_input.trim().parse::<Uuid>() {
                Ok(task_id) => {
                    if let Some(request) = self.panel.set_task(task_id) {
                        self.dispatch(request, tx);
                    }
                    self.focus = Focus::List;
                }
                Err(e) => {
                    tracing::warn!("Invalid task id {:?}: {}", self.task_input, e);
                    self.task_input_invalid = true;
                }
            },
            KeyCode::Char(c) => {
                self.task_input.push(c);
                self.task_input_invalid = false;
            }
            KeyCode::Backspace => {
                self.task_input.pop();
                self.task_input_invalid = false;
            }
            _ => {}
        }
    }
}

/// Perform one panel request against the server.
pub async fn execute(api: &ApiClient, request: PanelRequest) -> PanelOutcome {
    match request {
        PanelRequest::List { task_id } => PanelOutcome::Listed {
            task_id,
            result: api.list_comments(task_id).await,
        },
        PanelRequest::Create { task_id, content } => PanelOutcome::Created {
            task_id,
            result: api.create_comment(task_id, &content).await.map(|_| ()),
        },
        PanelRequest::Update {
            task_id,
            comment_id,
            content,
        } => PanelOutcome::Updated {
            task_id,
            comment_id,
            result: api
                .update_comment(task_id, comment_id, &content)
                .await
                .map(|_| ()),
        },
        PanelRequest::Delete {
            task_id,
            comment_id,
        } => PanelOutcome::Deleted {
            task_id,
            comment_id,
            result: api.delete_comment(task_id, comment_id).await,
        },
    }
}

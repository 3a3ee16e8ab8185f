use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod api;
mod app;
mod comments;
mod ui;

use api::{ApiClient, AuthTokens};
use app::{App, AppEvent};

#[derive(Parser, Debug)]
#[command(name = "taskboard-tui", version, about = "Comment panel for a taskboard task")]
struct Cli {
    /// Task whose comments to open
    #[arg(long)]
    task: Uuid,

    /// Server base URL
    #[arg(long, env = "TASKBOARD_SERVER_URL", default_value = "http://localhost:3000")]
    server: String,

    /// Access token; defaults to the one saved by the login flow
    #[arg(long, env = "TASKBOARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Persist --token for later runs
    #[arg(long, requires = "token")]
    save_token: bool,
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("Could not find cache directory")?
        .join("taskboard");
    fs::create_dir_all(&log_dir).context("Could not create log directory")?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("tui.log"))
        .context("Could not open log file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_tui=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}

fn require_token(token: Option<String>) -> Result<String> {
    match token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => anyhow::bail!("no access token; log in first or pass --token"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging()?;

    let token = match cli.token {
        Some(token) => {
            if cli.save_token {
                AuthTokens {
                    access_token: token.clone(),
                }
                .save()?;
            }
            Some(token)
        }
        None => AuthTokens::load()?.map(|t| t.access_token),
    };

    let token = require_token(token)?;

    let api = ApiClient::new(&cli.server, Some(token));
    let (app, initial) = App::new(api, &cli.server, cli.task);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, initial).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("Exited with error: {:?}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    initial: comments::PanelRequest,
) -> Result<()> {
    // Create event channel
    let (tx, mut rx) = mpsc::channel::<AppEvent>(100);

    // Spawn input handler
    let tx_input = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let _ = tx_input.send(AppEvent::Key(key)).await;
                    }
                }
            }
            // Send tick events for UI refresh
            let _ = tx_input.send(AppEvent::Tick).await;
        }
    });

    app.dispatch(initial, &tx);

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if let Some(event) = rx.recv().await {
            match event {
                AppEvent::Key(key) => {
                    if app.handle_key(key, &tx) {
                        return Ok(());
                    }
                }
                AppEvent::Tick => {
                    // Just refresh UI
                }
                AppEvent::Comments(outcome) => {
                    app.on_outcome(outcome, &tx);
                }
            }
        }
    }
}

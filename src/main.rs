use std::fs::{self, File};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use typhoon_core::config::API_URL_ENV;
use typhoon_core::{ChatClient, Config, Session};

mod app;
mod handler;
mod tui;
mod ui;
mod view;

use app::App;
use view::View;

#[derive(Parser)]
#[command(name = "typhoon")]
#[command(version, about = "Chat with the Typhoon AI backend from your terminal")]
struct Cli {
    /// Base URL of the chat API (requests go to <URL>/chat)
    #[arg(long)]
    api_url: Option<String>,

    /// Transcript layout
    #[arg(long, value_parser = ["compact", "rich"])]
    view: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

/// Log to a file: the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("Could not determine cache directory")?
        .join("typhoon");
    fs::create_dir_all(&log_dir)?;
    let log_file = File::create(log_dir.join("typhoon.log"))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("TYPHOON_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("warning: logging disabled: {e:#}");
    }

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config, using defaults");
        Config::new()
    });

    let env_url = std::env::var(API_URL_ENV).ok();
    let api_url = config.resolve_api_url(cli.api_url.as_deref(), env_url.as_deref());
    let timeout = config.resolve_timeout(cli.timeout);
    let view = cli
        .view
        .as_deref()
        .or(config.view.as_deref())
        .and_then(View::from_str)
        .unwrap_or_default();

    tracing::info!(%api_url, ?timeout, view = view.as_str(), "starting");

    let client = ChatClient::with_timeout(&api_url, timeout)?;
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();
    let session = Session::new(Arc::new(client), settled_tx);
    let mut app = App::new(session, view);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut app, &mut terminal, &mut events, &mut settled_rx).await;

    tui::restore()?;
    tracing::info!("exiting");
    result
}

/// Single event loop: terminal input, ticks and request settlements are
/// handled one at a time against the same `App`.
async fn run(
    app: &mut App,
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    settled_rx: &mut mpsc::UnboundedReceiver<typhoon_core::TurnOutcome>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event)?,
                None => break,
            },
            Some(outcome) = settled_rx.recv() => app.settle(outcome),
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod app;
mod client;
mod config;
mod handler;
mod theme;
mod tui;
mod ui;

use app::App;
use config::{Preferences, WidgetParams};

#[derive(Parser)]
#[command(name = "chatwidget")]
#[command(about = "Terminal chat widget for website bots")]
struct Cli {
    /// Bot identifier (falls back to CHATBOT_BOT_ID)
    #[arg(long)]
    bot_id: Option<String>,
    /// Bot API key (falls back to CHATBOT_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
    /// Display name shown in the widget header (falls back to CHATBOT_BOT_NAME)
    #[arg(long)]
    bot_name: Option<String>,
    /// Backend base URL (falls back to CHATBOT_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    // A missing required parameter is a failed embed: log the reason and
    // show nothing.
    let params =
        match WidgetParams::resolve(cli.bot_id, cli.api_key, cli.bot_name, cli.backend_url) {
            Ok(params) => params,
            Err(e) => {
                error!("widget not initialized: {e}");
                return Ok(());
            }
        };

    let prefs_path = Preferences::default_path().ok();
    let theme = prefs_path
        .as_deref()
        .and_then(|path| Preferences::load_from(path).ok())
        .map(|prefs| prefs.theme_mode())
        .unwrap_or_default();

    info!(bot_id = %params.bot_id, bot_name = %params.bot_name, "starting chat widget");

    let mut app = App::new(params, theme, prefs_path);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event)?;
        }

        // Settle the in-flight send, if any
        app.poll_reply().await;
    }

    Ok(())
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // The TUI owns the terminal, so diagnostics go to a file
    let dir = dirs::data_dir()?.join("chatwidget");
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, "chatwidget.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::sync::Mutex;
use std::time::Instant;
use std::{io, time::Duration};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod catalog;
mod cli;
mod collection;
mod config;
mod debug_log;
mod error;
mod launcher;
mod model;
mod preferences;
mod settings;
mod store;
mod template;
mod ui;

use app::App;
use catalog::Catalog;
use cli::Cli;
use config::ConfigManager;
use debug_log::DebugConsole;
use preferences::Preferences;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_manager = ConfigManager::new(cli.config_dir.clone())?;
    let (preferences, _) =
        Preferences::load(config_manager.settings_file()).context("Failed to load preferences")?;

    match cli.command {
        Some(command) => {
            init_cli_logging(cli.verbose);
            let mut catalog = Catalog::open(&config_manager).context("Failed to load the configuration")?;
            cli::run(command, &mut catalog, &preferences).await
        }
        None => run_tui(config_manager, preferences).await,
    }
}

fn init_cli_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run_tui(config_manager: ConfigManager, preferences: Preferences) -> Result<()> {
    // Setup logging
    let log_dir = config_manager.logs_dir();
    std::fs::create_dir_all(log_dir).context("Failed to create the log directory")?;
    let log_file = log_dir.join(format!("accessr_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
    let file = File::create(&log_file).with_context(|| format!("Failed to create {:?}", log_file))?;

    let console = DebugConsole::new(preferences.debug_buffer_size);
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("accessr=debug".parse()?))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(console.layer())
        .init();

    debug!("Starting accessr with configuration in {:?}", config_manager.config_dir());
    let catalog = Catalog::open(&config_manager).context("Failed to load the configuration")?;
    let app = App::new(config_manager, catalog, preferences, console);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("Exiting on error: {:#}", err);
        eprintln!("Error: {:#}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw::<B>(f, &mut app))?;

        if app.launcher.poll_due(Instant::now()) {
            app.poll_processes();
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key, terminal)?;
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

//! collnav - main entry point

use anyhow::{Context, Result};
use collnav::actions::ActionOutcome;
use collnav::cli::{CacheCommands, Cli, Commands};
use collnav::theme::Palette;
use collnav::ui::terminal::TerminalFrontend;
use collnav::{App, NavConfig, NavError};
use std::fs::{self, OpenOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize logging into the log file; the terminal belongs to the UI.
fn init_logging(config: &NavConfig) -> Result<()> {
    if let Some(parent) = config.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;

    // RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<NavError>() {
            Some(nav) if nav.is_contract_violation() => {
                tracing::error!("{}", nav);
                eprintln!("collnav: internal error: {}", nav);
                std::process::exit(2);
            }
            _ => {
                tracing::error!("{:#}", e);
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let mut config = NavConfig::resolve(&cli)?;

    let command = cli.command.unwrap_or(Commands::Collections {
        catalog_file: None,
        command: Vec::new(),
    });
    if let Commands::Collections {
        catalog_file,
        command,
    } = &command
    {
        // A source on the command line replaces the configured one
        if catalog_file.is_some() || !command.is_empty() {
            config.catalog_file = catalog_file.clone();
            config.catalog_command = command.clone();
        }
    }
    config.validate()?;

    init_logging(&config)?;
    info!("collnav {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Settings: {:?}", config);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Failed to install the interrupt handler: {}", e);
    }

    let app = App::new(config, interrupted);
    match command {
        Commands::Cache { action } => {
            let report = match action {
                CacheCommands::Check => app.cache_check()?,
                CacheCommands::Clear => app.cache_clear()?,
            };
            println!("{report}");
        }
        Commands::Collections { .. } => run_collections(&app)?,
    }
    Ok(())
}

/// Run the collections browser
fn run_collections(app: &App) -> Result<()> {
    let source = app.config().catalog_source()?;
    let palette = Palette::detect(app.config().color);
    let mut frontend = TerminalFrontend::new(palette).context("Failed to initialize terminal")?;

    let result = app.run_collections(&mut frontend, source);

    // Cleanup terminal (always attempt cleanup, even if the browser failed)
    if let Err(e) = frontend.restore() {
        warn!("Failed to restore terminal: {}", e);
    }

    match result? {
        ActionOutcome::NoneFound => info!("No collections found"),
        ActionOutcome::Exhausted => info!("Navigation finished"),
        ActionOutcome::Quit(step) => info!("Quit from '{}'", step.name()),
    }
    Ok(())
}

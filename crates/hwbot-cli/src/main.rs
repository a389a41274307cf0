//! hwbot CLI
//!
//! Main entry point: loads configuration, sets up logging and runs the
//! homework status poll loop until interrupted.

use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use hwbot_orchestrator::{Config, Credentials, Poller, Settings};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// hwbot - Homework Status Notifier
///
/// Polls the Practicum homework API and sends review status changes to a
/// Telegram chat. Requires PRACTICUM_TOKEN, TELEGRAM_TOKEN and
/// TELEGRAM_CHAT_ID in the environment or in a .env file.
#[derive(Parser, Debug)]
#[command(name = "hwbot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to settings file (default: hwbot.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Log file path (overrides the settings file; empty disables it)
    #[arg(short, long, value_name = "FILE")]
    log_file: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // A missing .env is fine; variables may come from the real environment.
    dotenvy::dotenv().ok();

    let mut settings = match load_settings(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };
    if let Some(ref log_file) = args.log_file {
        settings.log_file.clone_from(log_file);
    }

    if let Err(e) = init_tracing(args.verbose, &settings.log_file) {
        eprintln!("Error: {e}");
        return ExitCode::from(1);
    }

    match run(args, settings).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "hwbot exited with an error");
            ExitCode::from(1)
        }
    }
}

/// Verifies credentials, builds the poller and runs it.
async fn run(args: Args, settings: Settings) -> anyhow::Result<ExitCode> {
    tracing::info!("hwbot starting");
    tracing::debug!(?settings, "Settings loaded");

    let credentials = Credentials::from_env();
    let config = Config::new(settings, credentials).inspect_err(|e| {
        tracing::error!(error = %e, "Bot stopped: configuration is incomplete");
    })?;

    let mut poller = Poller::from_config(&config)?;

    if args.once {
        let outcome = poller.run_cycle().await;
        tracing::info!(?outcome, window = poller.state().window, "Single cycle finished");
        return Ok(if outcome.is_failure() {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        });
    }

    tokio::select! {
        () = poller.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Received Ctrl+C, shutting down");
        }
    }

    let state = poller.state();
    let elapsed = state.elapsed();
    tracing::info!(
        cycles = state.cycles,
        failures = state.failures,
        notifications = state.notifications,
        uptime_secs = elapsed.num_seconds(),
        "hwbot stopped"
    );
    Ok(ExitCode::SUCCESS)
}

/// Loads settings from the specified path or default location.
fn load_settings(config_path: Option<&str>) -> anyhow::Result<Settings> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Settings file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Settings::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Settings::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Installs the tracing subscriber: stdout, plus a log file when configured.
///
/// Priority for the filter: `RUST_LOG` env var > `--verbose` flag > default (info).
fn init_tracing(verbose: bool, log_file: &str) -> anyhow::Result<()> {
    let default_directives = if verbose {
        "info,hwbot=debug,hwbot_orchestrator=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let file_layer = if log_file.trim().is_empty() {
        None
    } else {
        let file = File::create(log_file).map_err(|e| {
            anyhow::anyhow!("Failed to open log file '{log_file}': {e}\n\nSuggestion: Check write permissions or pass --log-file \"\" to disable it")
        })?;
        Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

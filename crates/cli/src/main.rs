//! CLI entrypoint and subcommand orchestration.

mod commands;
mod config;
mod repl;
mod view;

use clap::{Parser, Subcommand};
use config::Config;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments.
#[derive(Parser)]
#[command(name = "flyingpig")]
#[command(about = "Terminal client for the FlyingPig chat server", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Enable debug logging to ~/.flyingpig/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session (default when no subcommand is given)
    Chat,
    /// Sign in and list the available models
    Models {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Sign in and list past sessions, or replay one
    History {
        #[arg(short, long)]
        username: Option<String>,

        /// Session id to replay
        #[arg(long)]
        open: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: Option<String>,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Commands::Chat => "chat",
            Commands::Models { .. } => "models",
            Commands::History { .. } => "history",
            Commands::Register { .. } => "register",
        }
    }
}

/// Console logs go to stderr so they never interleave with the transcript.
/// `--debug` adds a daily-rotated file under `~/.flyingpig/logs/`.
fn init_tracing(
    log_level: &str,
    debug: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    if !debug {
        tracing_subscriber::registry().with(console).init();
        return None;
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let log_dir = std::path::PathBuf::from(home)
        .join(".flyingpig")
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    // Flushes the file writer on exit.
    let _file_guard = init_tracing(&cli.log_level, cli.debug);

    if cli.debug {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = command.label(),
            log_level = %cli.log_level,
            "========== flyingpig session start =========="
        );
    }

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::default()
    });

    match command {
        Commands::Chat => commands::cmd_chat(config).await,
        Commands::Models { username } => commands::cmd_models(config, username).await,
        Commands::History { username, open } => {
            commands::cmd_history(config, username, open).await
        }
        Commands::Register { username } => commands::cmd_register(config, username).await,
    }
}

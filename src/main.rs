use clap::Parser;
use gitlab_telegram_notify::config::ConfigStore;
use gitlab_telegram_notify::logging::{FileLogger, setup_logging};
use gitlab_telegram_notify::telegram::{DEFAULT_API_BASE, DEFAULT_TIMEOUT, TelegramClient};
use gitlab_telegram_notify::{AppState, app};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{self, error, info};

/// Relay GitLab pipeline webhooks to Telegram chats.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Address where it listens
    #[arg(long, env = "NOTIFY_ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// Port where it listens
    #[arg(long, env = "NOTIFY_PORT", default_value_t = 8989)]
    port: u16,

    /// Path to the config file (.toml, or .yaml/.yml)
    #[arg(long, env = "NOTIFY_CONFIG")]
    config: PathBuf,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API", default_value = DEFAULT_API_BASE)]
    telegram_api: String,

    /// Timeout for each Telegram API call, in seconds
    #[arg(long, env = "NOTIFY_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Also write logs to daily rotated files in this directory
    #[arg(long, env = "NOTIFY_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let file_logger = cli.log_dir.clone().map(FileLogger::new);
    let _log_guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            std::process::exit(1);
        }
    };

    let store = match ConfigStore::load(&cli.config) {
        Ok(store) => store,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let telegram =
        match TelegramClient::new(cli.telegram_api, Duration::from_secs(cli.timeout_secs)) {
            Ok(client) => client,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };

    info!(
        "Loaded {} project(s) from {}",
        store.len(),
        cli.config.display()
    );
    let state = Arc::new(AppState::new(store, telegram));

    let bind_address = format!("{}:{}", cli.address, cli.port);
    let listener = match tokio::net::TcpListener::bind((cli.address.as_str(), cli.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", bind_address);
    if let Err(e) = axum::serve(listener, app(state)).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

//! approvald - Bulletin approval workflow daemon
//!
//! The daemon provides:
//! - REST API for approval queues and gate transitions
//! - Role directory management
//! - Event streaming and audit logging

use approval_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// approvald CLI
#[derive(Parser)]
#[command(name = "approvald")]
#[command(about = "Multi-gate approval workflow daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "APPROVALS_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "APPROVALS_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "APPROVALS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "APPROVALS_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = cli.listen.as_deref() {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print startup banner
    println!(
        r#"
   __ _ _ __  _ __  _ __ _____   ____ _| |
  / _` | '_ \| '_ \| '__/ _ \ \ / / _` | |
 | (_| | |_) | |_) | | | (_) \ V / (_| | |
  \__,_| .__/| .__/|_|  \___/ \_/ \__,_|_|
       |_|   |_|

  Bulletin Approval Workflow
  Version: {}
  Storage: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        match config.storage {
            approval_daemon::config::StorageConfig::Memory => "memory",
            approval_daemon::config::StorageConfig::Postgres { .. } => "postgres",
        },
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await
}

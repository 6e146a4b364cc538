//! Dataspace connector daemon
//!
//! Serves the connector protocol endpoint over HTTP.

use anyhow::Context;
use clap::Parser;
use dsc_daemon::{ConnectorConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dataspace connector daemon CLI
#[derive(Parser)]
#[command(name = "dscd")]
#[command(about = "Dataspace connector daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DSC_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configured one
    #[arg(short, long, env = "DSC_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level, overrides the configured one
    #[arg(long, env = "DSC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "DSC_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        ConnectorConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .with_context(|| format!("invalid listen address '{listen}'"))?;
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

    println!(
        r#"
  Dataspace Connector
  Version: {}
  Connector: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.connector.connector_id,
        config.server.listen_addr
    );

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}

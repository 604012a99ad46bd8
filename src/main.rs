use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use relayd::bootstrap::Server;
use relayd::config::Config;
use relayd::telemetry::{init_metrics, init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(name = "relayd")]
#[command(author, version, about = "Message relay bridging a broker channel to WebSocket listeners")]
struct Args {
    /// Path to config file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate config and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let tracing_config = TracingConfig {
        service_name: "relayd".to_string(),
        log_level: config.settings.log_level.clone(),
        json_logs: config.settings.json_logs,
    };

    init_tracing(&tracing_config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        broker = %config.broker.address,
        api = %config.api.address,
        "starting relayd"
    );

    // Validate only mode
    if args.validate {
        info!("configuration is valid");
        return Ok(());
    }

    let metrics_handle = init_metrics()?;

    let server = Server::new(config, Some(metrics_handle));
    server.run().await
}

mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use netstream_core::{bootstrap::load_config, logging};

use server::NetStreamServer;

#[derive(Parser, Debug)]
#[command(name = "netstream")]
#[command(about = "NetStream two-party signaling relay", long_about = None)]
struct Args {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP listen port
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load configuration
    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.http_port = port;
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("NetStream server starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Serve until shutdown
    NetStreamServer::new(config).start().await
}

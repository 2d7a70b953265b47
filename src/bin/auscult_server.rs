use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use auscult::config::AppConfig;
use auscult::context::AppContext;
use auscult::http::run_http_server;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "auscult_server",
    about = "Respiratory sound prediction HTTP service"
)]
struct Cli {
    /// Path to a JSON configuration file (defaults apply when missing)
    #[arg(long, default_value = "auscult.json")]
    config: PathBuf,
    /// Override the interface to bind
    #[arg(long)]
    host: Option<String>,
    /// Override the port to listen on
    #[arg(long)]
    port: Option<u16>,
    /// Override the classifier artifact path
    #[arg(long)]
    model: Option<PathBuf>,
    /// Override the directory uploads are persisted under
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_from_file(&cli.config);
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(model) = cli.model {
        config.model.path = model;
    }
    if let Some(data_dir) = cli.data_dir {
        config.server.data_dir = data_dir;
    }

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "creating data directory {}",
            config.server.data_dir.display()
        )
    })?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "parsing listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    // A missing or malformed artifact must stop the process here, before
    // the listener ever accepts a request.
    let context = AppContext::initialize(config).context("loading classifier artifact")?;

    run_http_server(Arc::new(context), addr).await
}

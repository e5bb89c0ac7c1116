//! S3 Data Dashboard
//!
//! A small local web server for browsing and exploring tabular files kept in
//! an S3 bucket.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3_dashboard::dashboard::{routes, Session};
use s3_dashboard::s3::S3Connector;
use s3_dashboard::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "s3-dashboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to the platform config folder)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the settings
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Write the effective settings to the settings file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3_dashboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let path = match args.config {
        Some(path) => path,
        None => Settings::settings_path()?,
    };
    let mut settings = Settings::load_from(&path)?;
    if let Some(bind) = args.bind {
        settings.bind_address = bind;
    }

    if args.init_config {
        settings.save_to(&path)?;
        tracing::info!("Wrote settings to {:?}", path);
        return Ok(());
    }

    let addr: SocketAddr = settings
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {:?}", settings.bind_address))?;

    tracing::info!("Starting S3 Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let connector = Arc::new(S3Connector::new(settings.connect_options()));
    let app = routes::router(Session::new(settings, connector));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

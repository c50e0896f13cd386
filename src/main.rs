use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use payload_filter::{api::create_router, PayloadInjectionLayer, PayloadInjectionOptions};

/// Sample API guarded by the payload injection filter
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:5000")]
    listen: String,

    /// Filter configuration file (.toml, .yaml or .yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }

    info!("Starting payload filter sample API");

    // Load configuration
    let options = match &cli.config {
        Some(path) => PayloadInjectionOptions::from_file(path)?,
        None => {
            let options = PayloadInjectionOptions::from_env()?;
            if options.allowed_http_methods.is_some() {
                options
            } else {
                PayloadInjectionOptions {
                    allowed_http_methods: PayloadInjectionOptions::recommended().allowed_http_methods,
                    ..options
                }
            }
        }
    };
    let layer = PayloadInjectionLayer::from_options(&options)?;
    info!(
        methods = ?layer.filter().settings().allowed_methods().collect::<Vec<_>>(),
        pattern = %layer.filter().settings().matcher().as_str(),
        max_depth = layer.filter().settings().max_depth(),
        "Payload filter configured"
    );

    let app = create_router(layer);

    // Start server
    info!("Listening on {}", cli.listen);
    let listener = TcpListener::bind(&cli.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

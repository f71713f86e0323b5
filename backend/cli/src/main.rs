mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use pricelens_catalog::Catalog;
use pricelens_core::PricelensError;
use pricelens_extraction::{OpenAiVisionProvider, TagExtractor};
use pricelens_gateway::{build_router, start_server, AppState};
use pricelens_imaging::CropExtractor;

use config::Config;

#[derive(Parser)]
#[command(name = "pricelens")]
#[command(about = "pricelens — price-tag annotation review and extraction backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pricelens HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show current server status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("pricelens is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    config.validate()?;
    let api_key = config.openai_api_key.clone().ok_or_else(|| {
        PricelensError::ConfigError("OPENAI_API_KEY is not set".to_string())
    })?;

    info!(
        port = config.port,
        bind = %config.bind_address,
        data_dir = %config.data_dir.display(),
        model = %config.vision_model,
        "starting pricelens"
    );

    let catalog = Arc::new(Catalog::new(
        config.images_dir(),
        config.labels_dir(),
        config.classes_file(),
    ));
    let cropper =
        CropExtractor::new(config.crops_dir()).context("failed to create crops directory")?;
    let provider = Arc::new(OpenAiVisionProvider::new(api_key));
    let extractor = Arc::new(TagExtractor::new(
        config.images_dir(),
        cropper,
        provider,
        config.vision_model.clone(),
    ));

    let state = AppState { catalog, extractor };
    let app = build_router(state, config.images_dir(), config.crops_dir());

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .context("invalid bind address")?;
    start_server(addr, app).await
}

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use seekdex_core::{directory_has_index_files, IndexConfig, SearchConfig};
use seekdex_indexer::build_index;
use seekdex_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// JSON file with search settings (BM25 parameters, snippet window, ...)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Pages to index when the index directory is incomplete
    #[arg(long)]
    input: Option<String>,
}

fn load_config(path: Option<&PathBuf>) -> Result<SearchConfig> {
    let Some(path) = path else { return Ok(SearchConfig::default()) };
    let raw = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid search config {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    if !directory_has_index_files(&args.index) {
        let input = args
            .input
            .as_deref()
            .with_context(|| format!("{} holds no complete index; pass --input to build one", args.index))?;
        tracing::info!(index = %args.index, input, "index missing, building");
        build_index(input, &args.index, IndexConfig::default())?;
    }
    let app: Router = build_app(&args.index, config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use seekdex_core::IndexConfig;
use seekdex_indexer::build_index;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a positional inverted index, link index and text store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Flush the in-memory index to a segment after roughly this many MiB
        #[arg(long, default_value_t = 128)]
        flush_threshold_mb: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, flush_threshold_mb } => {
            let config = IndexConfig {
                flush_threshold_bytes: flush_threshold_mb.max(1) * 1024 * 1024,
                ..IndexConfig::default()
            };
            build_index(&input, &output, config)?;
            Ok(())
        }
    }
}

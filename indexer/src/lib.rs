use anyhow::{Context, Result};
use seekdex_core::{BuildSummary, IndexBuilder, IndexConfig};

pub mod input;

/// Build an index in `output` from the pages found under `input`.
pub fn build_index(input: &str, output: &str, config: IndexConfig) -> Result<BuildSummary> {
    let mut builder = IndexBuilder::create(output, config)
        .with_context(|| format!("cannot prepare index directory {output}"))?;
    let stats = input::feed(input, &mut builder)?;
    let summary = builder.finish()?;
    tracing::info!(
        output,
        indexed = summary.documents,
        skipped = stats.skipped,
        terms = summary.terms,
        segments = summary.segments,
        "index build complete"
    );
    Ok(summary)
}

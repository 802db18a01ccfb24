//! Page input: JSON arrays, single JSON objects and JSONL files.

use anyhow::{Context, Result};
use seekdex_core::IndexBuilder;
use serde::Deserialize;
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct InputPage {
    pub id: u64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub redirect: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub indexed: usize,
    pub skipped: usize,
}

/// Input files below `input`: the file itself, or every `.json`/`.jsonl` file
/// of a directory tree in path order.
pub fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

pub fn feed(input: &str, builder: &mut IndexBuilder) -> Result<FeedStats> {
    let mut stats = FeedStats::default();
    for file in input_files(Path::new(input)) {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            feed_jsonl(&file, builder, &mut stats)?;
        } else {
            feed_json(&file, builder, &mut stats)?;
        }
    }
    Ok(stats)
}

fn feed_jsonl(file: &Path, builder: &mut IndexBuilder, stats: &mut FeedStats) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let page: InputPage = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid page", file.display(), number + 1))?;
        ingest(page, builder, stats)?;
    }
    Ok(())
}

fn feed_json(file: &Path, builder: &mut IndexBuilder, stats: &mut FeedStats) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                ingest(serde_json::from_value(v)?, builder, stats)?;
            }
        }
        serde_json::Value::Object(_) => ingest(serde_json::from_value(json)?, builder, stats)?,
        _ => tracing::warn!(file = %file.display(), "ignoring JSON that is neither an object nor an array"),
    }
    Ok(())
}

/// Index one page unless it is a redirect or has no title or text.
fn ingest(page: InputPage, builder: &mut IndexBuilder, stats: &mut FeedStats) -> Result<()> {
    if page.redirect || page.title.trim().is_empty() || page.body.trim().is_empty() {
        tracing::debug!(id = page.id, title = %page.title, "skipping page");
        stats.skipped += 1;
        return Ok(());
    }
    builder.index_page(page.id, &page.title, &page.body)?;
    stats.indexed += 1;
    Ok(())
}

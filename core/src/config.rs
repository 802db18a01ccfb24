use serde::{Deserialize, Serialize};

/// Settings for the write path.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Approximate serialized size of the in-memory index that triggers a segment flush.
    pub flush_threshold_bytes: usize,
    /// Buffer size of the segment and index file writers.
    pub write_buffer_bytes: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            flush_threshold_bytes: 128 * 1024 * 1024,
            write_buffer_bytes: 8192,
        }
    }
}

/// BM25 parameters.
///
/// Document length is never recorded, so `b` stays at 0 and `K = k1 * (1 - b)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub k2: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, k2: 100.0, b: 0.0 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Target width of a snippet in characters.
    pub window_chars: usize,
    /// Number of leading whitespace-delimited tokens scanned for a query term.
    pub scan_tokens: usize,
    /// Maximum number of bytes read from the texts file per document.
    pub read_bytes: usize,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self { window_chars: 240, scan_tokens: 500, read_bytes: 10_000 }
    }
}

/// Settings for the read path.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub bm25: Bm25Params,
    /// Number of feedback terms appended to a keyword query.
    pub prf_expand: usize,
    /// Maximum number of seek-list terms a prefix query expands to.
    pub prefix_term_limit: usize,
    pub snippet: SnippetConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            prf_expand: 10,
            prefix_term_limit: 1000,
            snippet: SnippetConfig::default(),
        }
    }
}

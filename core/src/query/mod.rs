//! Query evaluation: classification, dispatch and result rendering.

pub mod bm25;
pub mod boolean;
pub mod classify;
pub mod feedback;
pub mod link;
pub mod phrase;
pub mod prefix;

use serde::Serialize;
use std::path::Path;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::handler::IndexHandler;
use crate::index::DocId;
use crate::tokenizer;
pub use classify::{classify, BooleanOp, QueryKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub title: String,
    pub snippet: Option<String>,
    /// BM25 score, only set for keyword queries.
    pub score: Option<f64>,
}

pub struct QueryEngine {
    handler: IndexHandler,
    config: SearchConfig,
}

impl QueryEngine {
    pub fn new(handler: IndexHandler, config: SearchConfig) -> Self {
        Self { handler, config }
    }

    pub fn open<P: AsRef<Path>>(dir: P, config: SearchConfig) -> Result<Self> {
        Ok(Self::new(IndexHandler::open(dir)?, config))
    }

    pub fn handler(&self) -> &IndexHandler { &self.handler }

    pub fn config(&self) -> &SearchConfig { &self.config }

    /// Answer `query`. Keyword queries return at most `top_k` ranked hits and
    /// use the top `prf` documents for query expansion when `prf > 0`; the
    /// other query kinds return their matches in document order, also capped
    /// at `top_k`. Empty or unanswerable queries give an empty list.
    pub fn search(&self, query: &str, top_k: usize, prf: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let kind = classify(query);
        tracing::debug!(?kind, top_k, prf, "dispatching query");

        let limit = self.config.prefix_term_limit;
        match kind {
            QueryKind::Link(title) => {
                let ids = link::evaluate(&self.handler, title)?;
                self.render(ids.into_iter().take(top_k).map(|id| (id, None)), &[])
            }
            QueryKind::Boolean(text) => {
                let ids = boolean::evaluate(&self.handler, text, limit)?;
                self.render(ids.into_iter().take(top_k).map(|id| (id, None)), &tokenizer::terms(text))
            }
            QueryKind::Prefix(raw_prefix) => {
                let ids = prefix::evaluate(&self.handler, raw_prefix, limit)?;
                let terms: Vec<String> = prefix::normalize_prefix(raw_prefix).into_iter().collect();
                self.render(ids.into_iter().take(top_k).map(|id| (id, None)), &terms)
            }
            QueryKind::Phrase(text) => {
                let ids = phrase::evaluate(&self.handler, text)?;
                self.render(ids.into_iter().take(top_k).map(|id| (id, None)), &tokenizer::terms(text))
            }
            QueryKind::Keyword(text) => self.keyword(text, top_k, prf),
        }
    }

    fn keyword(&self, text: &str, top_k: usize, prf: usize) -> Result<Vec<SearchHit>> {
        let mut terms = tokenizer::terms(text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let params = &self.config.bm25;
        if prf > 0 {
            let feedback_hits = self.render(
                bm25::rank(&self.handler, params, &terms, prf)?.into_iter().map(|(id, _)| (id, None)),
                &terms,
            )?;
            let snippets: Vec<String> = feedback_hits
                .into_iter()
                .map(|hit| match hit.snippet {
                    Some(snippet) => format!("{}\n{}", hit.title, snippet),
                    None => hit.title,
                })
                .collect();
            let expansion = feedback::expansion_terms(&terms, &snippets, self.config.prf_expand);
            tracing::debug!(?expansion, "expanded query with feedback terms");
            terms.extend(expansion);
        }
        let ranked = bm25::rank(&self.handler, params, &terms, top_k)?;
        self.render(ranked.into_iter().map(|(id, score)| (id, Some(score))), &terms)
    }

    /// Attach titles and snippets. Documents without a title are skipped.
    fn render<I>(&self, docs: I, query_terms: &[String]) -> Result<Vec<SearchHit>>
    where
        I: IntoIterator<Item = (DocId, Option<f64>)>,
    {
        let mut hits = Vec::new();
        for (doc_id, score) in docs {
            let Some(title) = self.handler.title(doc_id) else {
                tracing::warn!(doc_id, "document without title");
                continue;
            };
            let snippet = self.handler.snippet(doc_id, query_terms, &self.config.snippet)?;
            hits.push(SearchHit { doc_id, title: title.to_string(), snippet, score });
        }
        Ok(hits)
    }
}

//! Prefix queries over the sorted seek list.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::handler::IndexHandler;
use crate::index::DocId;
use crate::tokenizer;

/// Indexed form of the last word before the `*`. Words the tokenizer drops
/// entirely (stopwords) are only lowercased.
pub fn normalize_prefix(raw: &str) -> Option<String> {
    let word = raw.split_whitespace().last()?;
    tokenizer::first_term(word).or_else(|| Some(word.to_lowercase()))
}

/// Union of the documents of the first `limit` terms starting with the prefix.
pub fn evaluate(handler: &IndexHandler, raw_prefix: &str, limit: usize) -> Result<BTreeSet<DocId>> {
    let Some(prefix) = normalize_prefix(raw_prefix) else {
        return Ok(BTreeSet::new());
    };
    let mut documents = BTreeSet::new();
    let mut expanded = 0;
    for term in handler.seek_list().terms_with_prefix(&prefix).take(limit) {
        documents.extend(handler.read_postings(term)?.doc_ids());
        expanded += 1;
    }
    tracing::debug!(prefix = %prefix, expanded, documents = documents.len(), "prefix query");
    Ok(documents)
}

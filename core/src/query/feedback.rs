//! Pseudo-relevance feedback: query expansion from the top results' snippets.

use std::collections::{BTreeMap, HashSet};

use crate::tokenizer;

/// The `limit` most frequent snippet terms not already in the query, most
/// frequent first, ties in term order.
pub fn expansion_terms(query_terms: &[String], snippets: &[String], limit: usize) -> Vec<String> {
    let known: HashSet<&str> = query_terms.iter().map(String::as_str).collect();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for snippet in snippets {
        for term in tokenizer::terms(snippet) {
            if !known.contains(term.as_str()) {
                *counts.entry(term).or_insert(0) += 1;
            }
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // stable sort keeps the BTreeMap's term order among equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(limit).map(|(term, _)| term).collect()
}

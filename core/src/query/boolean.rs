//! Boolean queries: `AND`, `OR` and `BUT NOT` over document sets.
//!
//! Operators have no precedence; the query is split on its rightmost operator
//! so that evaluation proceeds left to right.

use std::collections::BTreeSet;

use super::classify::{phrase_text, prefix_text, split_rightmost, BooleanOp};
use super::{phrase, prefix};
use crate::error::Result;
use crate::handler::IndexHandler;
use crate::index::DocId;
use crate::tokenizer;

pub fn evaluate(handler: &IndexHandler, query: &str, prefix_limit: usize) -> Result<BTreeSet<DocId>> {
    let Some((left, op, right)) = split_rightmost(query) else {
        return evaluate_leaf(handler, query, prefix_limit);
    };
    let left = evaluate(handler, left, prefix_limit)?;
    let right = evaluate(handler, right, prefix_limit)?;
    Ok(combine(op, &left, &right))
}

pub fn combine(op: BooleanOp, left: &BTreeSet<DocId>, right: &BTreeSet<DocId>) -> BTreeSet<DocId> {
    match op {
        BooleanOp::And => left.intersection(right).copied().collect(),
        BooleanOp::Or => left.union(right).copied().collect(),
        BooleanOp::ButNot => left.difference(right).copied().collect(),
    }
}

/// An operand: a prefix, a phrase, or words that must all occur.
fn evaluate_leaf(handler: &IndexHandler, leaf: &str, prefix_limit: usize) -> Result<BTreeSet<DocId>> {
    if let Some(raw_prefix) = prefix_text(leaf) {
        return prefix::evaluate(handler, raw_prefix, prefix_limit);
    }
    if let Some(text) = phrase_text(leaf) {
        return phrase::evaluate(handler, text);
    }
    let mut documents: Option<BTreeSet<DocId>> = None;
    for term in tokenizer::terms(leaf) {
        let found = handler.read_postings(&term)?.doc_set();
        documents = Some(match documents {
            Some(acc) => combine(BooleanOp::And, &acc, &found),
            None => found,
        });
    }
    Ok(documents.unwrap_or_default())
}

//! Phrase queries by positional intersection.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::handler::IndexHandler;
use crate::index::{DocId, PostingsList};
use crate::tokenizer;

/// Documents containing the phrase's terms at consecutive positions.
pub fn evaluate(handler: &IndexHandler, phrase: &str) -> Result<BTreeSet<DocId>> {
    let terms = tokenizer::terms(phrase);
    if terms.is_empty() {
        return Ok(BTreeSet::new());
    }
    let lists = terms
        .iter()
        .map(|term| handler.read_postings(term))
        .collect::<Result<Vec<_>>>()?;
    Ok(consecutive_matches(&lists))
}

/// Documents where, for some position `p` of the first list, every list `i`
/// has an occurrence at `p + i`.
pub fn consecutive_matches(lists: &[PostingsList]) -> BTreeSet<DocId> {
    let Some((first, rest)) = lists.split_first() else {
        return BTreeSet::new();
    };
    first
        .iter()
        .filter(|(doc_id, starts)| {
            starts.iter().any(|&start| {
                rest.iter().enumerate().all(|(i, list)| {
                    let wanted = start.checked_add(i as u32 + 1);
                    match (list.positions(**doc_id), wanted) {
                        (Some(positions), Some(p)) => positions.contains(&p),
                        _ => false,
                    }
                })
            })
        })
        .map(|(doc_id, _)| *doc_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[(DocId, u32)]) -> PostingsList {
        let mut list = PostingsList::new();
        for (doc, pos) in entries {
            list.add_occurrence(*doc, *pos);
        }
        list
    }

    #[test]
    fn adjacent_positions_match() {
        let a = list(&[(1, 5), (2, 5)]);
        let b = list(&[(1, 6), (2, 7)]);
        assert_eq!(consecutive_matches(&[a, b]), BTreeSet::from([1]));
    }

    #[test]
    fn any_start_position_may_match() {
        let a = list(&[(3, 1), (3, 10)]);
        let b = list(&[(3, 11)]);
        let c = list(&[(3, 12), (3, 2)]);
        assert_eq!(consecutive_matches(&[a, b, c]), BTreeSet::from([3]));
    }

    #[test]
    fn missing_term_matches_nothing() {
        let a = list(&[(1, 0)]);
        assert!(consecutive_matches(&[a, PostingsList::new()]).is_empty());
        assert!(consecutive_matches(&[]).is_empty());
    }

    #[test]
    fn single_term_phrase_is_its_document_set() {
        let a = list(&[(4, 0), (9, 3)]);
        assert_eq!(consecutive_matches(&[a]), BTreeSet::from([4, 9]));
    }
}

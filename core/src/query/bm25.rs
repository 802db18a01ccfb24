//! BM25 ranking without document length normalization.

use std::collections::{BTreeMap, HashMap};

use crate::config::Bm25Params;
use crate::error::Result;
use crate::handler::IndexHandler;
use crate::index::{DocId, PostingsList};

/// Lower bound of the idf factor. Terms in more than half of the corpus
/// would otherwise contribute negatively.
pub const IDF_FLOOR: f64 = 1e-6;

pub fn idf(total_documents: usize, document_frequency: usize) -> f64 {
    let n = document_frequency as f64;
    let total = total_documents as f64;
    ((total - n + 0.5) / (n + 0.5)).ln().max(IDF_FLOOR)
}

/// Contribution of one query term occurring `f` times in a document and `qf`
/// times in the query.
pub fn term_weight(params: &Bm25Params, f: usize, qf: usize) -> f64 {
    let k = params.k1 * (1.0 - params.b);
    let f = f as f64;
    let qf = qf as f64;
    ((params.k1 + 1.0) * f) / (k + f) * ((params.k2 + 1.0) * qf) / (params.k2 + qf)
}

/// Score every document appearing in any of the query postings. Each entry of
/// `query` is a term's postings and its frequency in the query. Results are
/// ordered by descending score, then ascending document id.
pub fn score(params: &Bm25Params, total_documents: usize, query: &[(PostingsList, usize)]) -> Vec<(DocId, f64)> {
    let mut scores: BTreeMap<DocId, f64> = BTreeMap::new();
    for (postings, qf) in query {
        let idf = idf(total_documents, postings.document_frequency());
        for (doc_id, positions) in postings {
            *scores.entry(*doc_id).or_insert(0.0) += idf * term_weight(params, positions.len(), *qf);
        }
    }
    let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

/// Top `top_k` documents for already tokenized query terms.
pub fn rank(handler: &IndexHandler, params: &Bm25Params, terms: &[String], top_k: usize) -> Result<Vec<(DocId, f64)>> {
    let mut query_frequency: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<&str> = Vec::new();
    for term in terms {
        let count = query_frequency.entry(term.as_str()).or_insert(0);
        if *count == 0 {
            unique.push(term);
        }
        *count += 1;
    }
    let mut query = Vec::with_capacity(unique.len());
    for term in unique {
        query.push((handler.read_postings(term)?, query_frequency[term]));
    }
    let mut ranked = score(params, handler.total_documents(), &query);
    ranked.truncate(top_k);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn postings(entries: &[(DocId, u32)]) -> PostingsList {
        let mut list = PostingsList::new();
        for (doc, pos) in entries {
            list.add_occurrence(*doc, *pos);
        }
        list
    }

    #[test]
    fn idf_is_floored() {
        assert!(idf(1000, 1) > 6.0);
        assert_eq!(idf(3, 3), IDF_FLOOR);
    }

    #[test]
    fn ties_break_by_document_id() {
        let list = postings(&[(9, 0), (2, 0), (5, 0)]);
        let ranked = score(&Bm25Params::default(), 100, &[(list, 1)]);
        let ids: Vec<DocId> = ranked.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn documents_without_query_terms_are_not_candidates() {
        let list = postings(&[(1, 0), (3, 4)]);
        let ranked = score(&Bm25Params::default(), 3, &[(list, 1)]);
        assert_eq!(ranked.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(ranked.iter().all(|(_, s)| *s > 0.0));
    }

    proptest! {
        #[test]
        fn higher_term_frequency_never_ranks_lower(low in 1u32..20, extra in 1u32..20, total in 2usize..500) {
            let high = low + extra;
            let mut list = PostingsList::new();
            for p in 0..low { list.add_occurrence(1, p); }
            for p in 0..high { list.add_occurrence(2, p); }
            let ranked = score(&Bm25Params::default(), total, &[(list, 1)]);
            prop_assert_eq!(ranked[0].0, 2);
            prop_assert!(ranked[0].1 > ranked[1].1);
        }
    }
}

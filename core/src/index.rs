use std::collections::{btree_map, BTreeMap, BTreeSet};

pub type DocId = u64;
pub type Position = u32;

/// Inverted list of one term: the documents it occurs in and, per document,
/// the ordered token positions of each occurrence.
///
/// A document is only present once it has at least one position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingsList {
    occurrences: BTreeMap<DocId, BTreeSet<Position>>,
}

impl PostingsList {
    pub fn new() -> Self { Self::default() }

    /// Record `position` for `doc_id`. Recording a known position is a no-op.
    pub fn add_occurrence(&mut self, doc_id: DocId, position: Position) {
        self.occurrences.entry(doc_id).or_default().insert(position);
    }

    /// Merge `other` into `self`, unioning the positions of shared documents.
    pub fn union(&mut self, other: PostingsList) {
        for (doc_id, positions) in other.occurrences {
            if positions.is_empty() { continue; }
            self.occurrences.entry(doc_id).or_default().extend(positions);
        }
    }

    pub fn positions(&self, doc_id: DocId) -> Option<&BTreeSet<Position>> {
        self.occurrences.get(&doc_id)
    }

    /// Number of occurrences of the term in `doc_id`.
    pub fn term_frequency(&self, doc_id: DocId) -> usize {
        self.occurrences.get(&doc_id).map_or(0, BTreeSet::len)
    }

    /// Number of documents containing the term.
    pub fn document_frequency(&self) -> usize { self.occurrences.len() }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.occurrences.keys().copied()
    }

    pub fn doc_set(&self) -> BTreeSet<DocId> { self.doc_ids().collect() }

    pub fn iter(&self) -> btree_map::Iter<'_, DocId, BTreeSet<Position>> {
        self.occurrences.iter()
    }

    pub fn is_empty(&self) -> bool { self.occurrences.is_empty() }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = (&'a DocId, &'a BTreeSet<Position>);
    type IntoIter = btree_map::Iter<'a, DocId, BTreeSet<Position>>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// In-memory accumulator mapping terms to their postings, ordered by term.
///
/// `approx_bytes` tracks the length of everything added in its textual form and
/// is what the builder compares against the flush threshold.
#[derive(Debug, Default)]
pub struct PostingsIndex {
    lists: BTreeMap<String, PostingsList>,
    approx_bytes: usize,
}

impl PostingsIndex {
    pub fn new() -> Self { Self::default() }

    pub fn add_term_occurrence(&mut self, term: &str, doc_id: DocId, position: Position) {
        match self.lists.get_mut(term) {
            Some(list) => list.add_occurrence(doc_id, position),
            None => {
                let mut list = PostingsList::new();
                list.add_occurrence(doc_id, position);
                self.lists.insert(term.to_string(), list);
            }
        }
        self.approx_bytes += term.len() + decimal_len(doc_id) + decimal_len(position as u64);
    }

    pub fn get(&self, term: &str) -> Option<&PostingsList> { self.lists.get(term) }

    pub fn approx_bytes(&self) -> usize { self.approx_bytes }

    pub fn len(&self) -> usize { self.lists.len() }

    pub fn is_empty(&self) -> bool { self.lists.is_empty() }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PostingsList> { self.lists.iter() }

    /// Hand over the accumulated lists, leaving an empty index with a zeroed counter.
    pub fn take(&mut self) -> PostingsIndex { std::mem::take(self) }
}

pub(crate) fn decimal_len(mut n: u64) -> usize {
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}

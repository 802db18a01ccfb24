use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Term to byte offset of its line in the final index file.
///
/// Kept sorted so prefix queries can scan a contiguous key range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekList {
    offsets: BTreeMap<String, u64>,
}

impl SeekList {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, term: String, offset: u64) { self.offsets.insert(term, offset); }

    pub fn get(&self, term: &str) -> Option<u64> { self.offsets.get(term).copied() }

    pub fn len(&self) -> usize { self.offsets.len() }

    pub fn is_empty(&self) -> bool { self.offsets.is_empty() }

    pub fn terms(&self) -> impl Iterator<Item = &str> { self.offsets.keys().map(String::as_str) }

    /// Terms starting with `prefix`, in ascending order.
    pub fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.offsets
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(term, _)| term.as_str())
            .take_while(move |term| term.starts_with(prefix))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> SeekList {
        let mut seek = SeekList::new();
        for (i, term) in ["appl", "applic", "apricot", "banana"].iter().enumerate() {
            seek.insert(term.to_string(), i as u64 * 10);
        }
        seek
    }

    #[test]
    fn prefix_scan_is_contiguous() {
        let seek = sample();
        let found: Vec<&str> = seek.terms_with_prefix("appl").collect();
        assert_eq!(found, vec!["appl", "applic"]);
        assert_eq!(seek.terms_with_prefix("zz").count(), 0);
        assert_eq!(seek.terms_with_prefix("").count(), 4);
    }

    #[test]
    fn persists_with_bincode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index_seeklist.bin");
        sample().save(&path).unwrap();
        let loaded = SeekList::load(&path).unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(loaded.get("banana"), Some(30));
        assert_eq!(loaded.get("cherry"), None);
    }
}

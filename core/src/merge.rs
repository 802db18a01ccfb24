//! K-way merge of sorted segment files into one final, sorted index file.
//!
//! Each segment is read one line at a time, so memory stays bounded by the
//! number of segments rather than their size. Records for the same key coming
//! from several segments are decoded and unioned before being written back in
//! canonical form, so the output does not depend on how often the builder
//! flushed. A segment file is deleted as soon as it has been fully consumed.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::codec::{self, Record};
use crate::error::Result;
use crate::seeklist::SeekList;
use crate::segment::{CountingWriter, SegmentReader};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of keys written to the output.
    pub keys: usize,
    /// Number of malformed tokens skipped while decoding bodies.
    pub skipped_tokens: usize,
}

/// Merge `segments` into `output`. When `seek_list` is given, the byte offset
/// of every written line is recorded in it.
pub fn merge_segments<R: Record>(
    segments: &[PathBuf],
    output: &Path,
    buffer_bytes: usize,
    mut seek_list: Option<&mut SeekList>,
) -> Result<MergeStats> {
    let mut out = CountingWriter::new(BufWriter::with_capacity(buffer_bytes, File::create(output)?));
    let mut readers: Vec<Option<SegmentReader<R>>> = Vec::with_capacity(segments.len());
    let mut bodies: Vec<String> = vec![String::new(); segments.len()];
    let mut heap: BinaryHeap<Reverse<(String, usize)>> = BinaryHeap::with_capacity(segments.len());

    for (slot, path) in segments.iter().enumerate() {
        readers.push(Some(SegmentReader::open(path)?));
        advance(&mut readers, &mut bodies, &mut heap, slot)?;
    }

    let mut stats = MergeStats::default();
    let mut errors = Vec::new();
    while let Some(Reverse((key, first))) = heap.pop() {
        let mut contributors = vec![first];
        while heap.peek().is_some_and(|Reverse((next, _))| *next == key) {
            if let Some(Reverse((_, slot))) = heap.pop() {
                contributors.push(slot);
            }
        }
        contributors.sort_unstable();

        let mut merged = R::default();
        for slot in contributors {
            let body = std::mem::take(&mut bodies[slot]);
            merged.union(R::decode_body(&key, &body, &mut errors));
            advance(&mut readers, &mut bodies, &mut heap, slot)?;
        }
        for err in errors.drain(..) {
            stats.skipped_tokens += 1;
            tracing::warn!(key = %key, error = %err, "skipping malformed token during merge");
        }
        if merged.is_empty() { continue; }

        if let Some(seek_list) = seek_list.as_deref_mut() {
            seek_list.insert(key.clone(), out.position());
        }
        codec::write_line(&mut out, &key, &merged)?;
        stats.keys += 1;
    }

    out.flush()?;
    tracing::info!(output = %output.display(), segments = segments.len(), keys = stats.keys, "merged segments");
    Ok(stats)
}

/// Load the next entry of the reader in `slot` into the heap, or close and
/// delete its segment when it is exhausted.
fn advance<R: Record>(
    readers: &mut [Option<SegmentReader<R>>],
    bodies: &mut [String],
    heap: &mut BinaryHeap<Reverse<(String, usize)>>,
    slot: usize,
) -> Result<()> {
    let Some(reader) = readers[slot].as_mut() else { return Ok(()) };
    match reader.next_entry()? {
        Some(entry) => {
            bodies[slot] = entry.body;
            heap.push(Reverse((entry.key, slot)));
        }
        None => {
            if let Some(reader) = readers[slot].take() {
                let path = reader.path().to_path_buf();
                drop(reader);
                fs::remove_file(&path)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{PostingsIndex, PostingsList};
    use crate::links::{LinkIndex, TitleList};
    use crate::segment::{segment_path, write_segment};
    use tempfile::tempdir;

    #[test]
    fn same_term_in_two_segments_is_unioned() {
        let dir = tempdir().unwrap();
        let mut s1 = PostingsIndex::new();
        s1.add_term_occurrence("a", 1, 1);
        s1.add_term_occurrence("a", 2, 5);
        let mut s2 = PostingsIndex::new();
        s2.add_term_occurrence("a", 2, 3);
        let p1 = segment_path(dir.path(), "index", 0);
        let p2 = segment_path(dir.path(), "index", 1);
        write_segment(&p1, s1.iter(), 64).unwrap();
        write_segment(&p2, s2.iter(), 64).unwrap();

        let out = dir.path().join("index.txt");
        let mut seek = SeekList::new();
        let stats = merge_segments::<PostingsList>(&[p1.clone(), p2.clone()], &out, 64, Some(&mut seek)).unwrap();
        assert_eq!(stats.keys, 1);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "YQ==:1:1;2:3,5.\n");
        assert_eq!(seek.get("a"), Some(0));
        assert!(!p1.exists() && !p2.exists());
    }

    #[test]
    fn link_segments_merge_with_plain_keys() {
        let dir = tempdir().unwrap();
        let mut l1 = LinkIndex::new();
        l1.add_linking_title("Zebra", "Savanna");
        l1.add_linking_title("Apple", "Orchard");
        let mut l2 = LinkIndex::new();
        l2.add_linking_title("Apple", "Cider");
        let p1 = segment_path(dir.path(), "link_index", 0);
        let p2 = segment_path(dir.path(), "link_index", 1);
        write_segment(&p1, l1.iter(), 64).unwrap();
        write_segment(&p2, l2.iter(), 64).unwrap();

        let out = dir.path().join("link_index.txt");
        merge_segments::<TitleList>(&[p1, p2], &out, 64, None).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "apple:cider,orchard.\nzebra:savanna.\n"
        );
    }

    #[test]
    fn no_segments_gives_empty_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("index.txt");
        let stats = merge_segments::<PostingsList>(&[], &out, 64, None).unwrap();
        assert_eq!(stats.keys, 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
    }
}

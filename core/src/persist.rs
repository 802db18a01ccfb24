//! On-disk layout of an index directory and the small flat files in it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::{self, create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::index::DocId;
use crate::segment::{SEGMENT_EXTENSION, SEGMENT_STEMS};

pub const FORMAT_VERSION: u32 = 1;
const FIELD_DELIMITER: char = '\t';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u64,
    pub num_terms: u64,
    pub num_segments: u64,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.txt") }
    pub fn seek_list(&self) -> PathBuf { self.root.join("index_seeklist.bin") }
    pub fn link_index(&self) -> PathBuf { self.root.join("link_index.txt") }
    pub fn texts(&self) -> PathBuf { self.root.join("texts.txt") }
    pub fn texts_seek_list(&self) -> PathBuf { self.root.join("texts_seeklist.txt") }
    pub fn ids_to_titles(&self) -> PathBuf { self.root.join("idsToTitles.txt") }
    pub fn titles_to_ids(&self) -> PathBuf { self.root.join("titlesToIds.txt") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// Every file a finished build leaves behind.
    pub fn required_files(&self) -> [PathBuf; 8] {
        [
            self.index(),
            self.seek_list(),
            self.link_index(),
            self.texts(),
            self.texts_seek_list(),
            self.ids_to_titles(),
            self.titles_to_ids(),
            self.meta(),
        ]
    }
}

/// True when every required index file exists and can be opened for reading.
pub fn directory_has_index_files<P: AsRef<Path>>(dir: P) -> bool {
    let paths = IndexPaths::new(dir);
    paths.required_files().iter().all(|path| {
        let readable = path.is_file() && File::open(path).is_ok();
        if !readable {
            tracing::debug!(file = %path.display(), "index file missing or unreadable");
        }
        readable
    })
}

/// Remove a previous build's files and any leftover segment files.
pub fn delete_old_files(paths: &IndexPaths) -> Result<()> {
    create_dir_all(&paths.root)?;
    for path in paths.required_files() {
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    for entry in fs::read_dir(&paths.root)? {
        let path = entry?.path();
        if path.is_file() && is_segment_file(&path) {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// True for file names `segment_path` produces, e.g. `index_3.tmp`.
fn is_segment_file(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some(SEGMENT_EXTENSION) {
        return false;
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { return false };
    SEGMENT_STEMS.iter().any(|prefix| {
        stem.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|number| !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()))
    })
}

/// Write `map` as `key\tvalue\tkey\tvalue...`. Tabs inside keys or values are
/// replaced by spaces.
pub fn save_delimited_map<K: Display, V: Display>(path: &Path, map: &BTreeMap<K, V>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (key, value) in map {
        write!(out, "{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}", escape(key), escape(value))?;
    }
    out.flush()?;
    Ok(())
}

/// Read a file written by [`save_delimited_map`]. Pairs that do not parse are
/// logged and skipped.
pub fn load_delimited_map<K: FromStr + Ord, V: FromStr>(path: &Path) -> Result<BTreeMap<K, V>> {
    let mut contents = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut contents)?;
    let mut fields = contents.split(FIELD_DELIMITER);
    let mut map = BTreeMap::new();
    while let Some(key) = fields.next() {
        let Some(value) = fields.next() else {
            // the file ends with a delimiter, leaving one empty field behind
            if !key.is_empty() {
                tracing::warn!(file = %path.display(), key, "dangling key without value");
            }
            break;
        };
        if key.is_empty() {
            tracing::warn!(file = %path.display(), value, "skipping entry with empty key");
            continue;
        }
        match (key.parse::<K>(), value.parse::<V>()) {
            (Ok(k), Ok(v)) => { map.insert(k, v); }
            _ => tracing::warn!(file = %path.display(), key, value, "skipping unparsable entry"),
        }
    }
    Ok(map)
}

fn escape<T: Display>(value: &T) -> String {
    value.to_string().replace(FIELD_DELIMITER, " ")
}

pub fn save_ids_to_titles(paths: &IndexPaths, map: &BTreeMap<DocId, String>) -> Result<()> {
    save_delimited_map(&paths.ids_to_titles(), map)
}

pub fn load_ids_to_titles(paths: &IndexPaths) -> Result<BTreeMap<DocId, String>> {
    load_delimited_map(&paths.ids_to_titles())
}

pub fn save_titles_to_ids(paths: &IndexPaths, map: &BTreeMap<String, DocId>) -> Result<()> {
    save_delimited_map(&paths.titles_to_ids(), map)
}

pub fn load_titles_to_ids(paths: &IndexPaths) -> Result<BTreeMap<String, DocId>> {
    load_delimited_map(&paths.titles_to_ids())
}

pub fn save_text_offsets(paths: &IndexPaths, map: &BTreeMap<DocId, u64>) -> Result<()> {
    save_delimited_map(&paths.texts_seek_list(), map)
}

pub fn load_text_offsets(paths: &IndexPaths) -> Result<BTreeMap<DocId, u64>> {
    load_delimited_map(&paths.texts_seek_list())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::IncompatibleVersion { expected: FORMAT_VERSION, actual: meta.version });
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn meta(version: u32) -> MetaFile {
        MetaFile {
            num_docs: 3,
            num_terms: 4,
            num_segments: 1,
            created_at: "2024-01-01T00:00:00Z".into(),
            version,
        }
    }

    #[test]
    fn delimited_map_replaces_tabs() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let mut titles = BTreeMap::new();
        titles.insert(1u64, "Apple".to_string());
        titles.insert(2u64, "Tab\tTitle".to_string());
        save_ids_to_titles(&paths, &titles).unwrap();

        assert_eq!(fs::read_to_string(paths.ids_to_titles()).unwrap(), "1\tApple\t2\tTab Title\t");
        let loaded = load_ids_to_titles(&paths).unwrap();
        assert_eq!(loaded[&2], "Tab Title");
    }

    #[test]
    fn unparsable_pairs_are_skipped() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        fs::write(paths.texts_seek_list(), "1\t0\tx\t5\t3\t40\t").unwrap();
        let offsets = load_text_offsets(&paths).unwrap();
        assert_eq!(offsets.into_iter().collect::<Vec<_>>(), vec![(1, 0), (3, 40)]);
    }

    #[test]
    fn empty_key_does_not_shift_following_pairs() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        fs::write(paths.titles_to_ids(), "\t3\tapple\t1\torchard\t2\t").unwrap();
        let titles = load_titles_to_ids(&paths).unwrap();
        assert_eq!(titles.into_iter().collect::<Vec<_>>(), vec![("apple".to_string(), 1), ("orchard".to_string(), 2)]);
    }

    #[test]
    fn meta_version_is_checked() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_meta(&paths, &meta(FORMAT_VERSION)).unwrap();
        assert_eq!(load_meta(&paths).unwrap(), meta(FORMAT_VERSION));

        save_meta(&paths, &meta(99)).unwrap();
        let err = load_meta(&paths).unwrap_err();
        assert!(matches!(err, Error::IncompatibleVersion { expected: 1, actual: 99 }));
    }

    #[test]
    fn directory_check_requires_every_file() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        assert!(!directory_has_index_files(dir.path()));
        for path in paths.required_files() {
            fs::write(path, "").unwrap();
        }
        assert!(directory_has_index_files(dir.path()));
        fs::remove_file(paths.link_index()).unwrap();
        assert!(!directory_has_index_files(dir.path()));
    }

    #[test]
    fn old_files_and_segments_are_deleted() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        fs::write(paths.index(), "old").unwrap();
        fs::write(dir.path().join("index_3.tmp"), "stale").unwrap();
        fs::write(dir.path().join("link_index_0.tmp"), "stale").unwrap();
        fs::write(dir.path().join("notes.md"), "keep").unwrap();
        fs::write(dir.path().join("session.tmp"), "keep").unwrap();
        fs::write(dir.path().join("index_old.tmp"), "keep").unwrap();
        delete_old_files(&paths).unwrap();
        assert!(!paths.index().exists());
        assert!(!dir.path().join("index_3.tmp").exists());
        assert!(!dir.path().join("link_index_0.tmp").exists());
        assert!(dir.path().join("notes.md").exists());
        assert!(dir.path().join("session.tmp").exists());
        assert!(dir.path().join("index_old.tmp").exists());
    }
}

//! Read-only access to a built index directory.
//!
//! The seek list, the title maps and the text offsets are loaded into memory
//! once. Postings, link lists and texts stay on disk; every read opens its own
//! file handle, so a handler can be shared between threads without locking.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::codec::{self, Record};
use crate::config::SnippetConfig;
use crate::error::{Error, Result};
use crate::index::{DocId, PostingsList};
use crate::links::{normalize_title, TitleList};
use crate::persist::{self, directory_has_index_files, IndexPaths, MetaFile};
use crate::seeklist::SeekList;
use crate::texts;

pub struct IndexHandler {
    paths: IndexPaths,
    meta: MetaFile,
    seek_list: SeekList,
    id_to_title: BTreeMap<DocId, String>,
    title_to_id: BTreeMap<String, DocId>,
    text_offsets: BTreeMap<DocId, u64>,
}

impl IndexHandler {
    /// Load an index directory. Fails with [`Error::MissingIndexFiles`] when the
    /// directory does not hold a complete build.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !directory_has_index_files(dir) {
            return Err(Error::MissingIndexFiles(dir.display().to_string()));
        }
        let paths = IndexPaths::new(dir);
        let meta = persist::load_meta(&paths)?;
        let seek_list = SeekList::load(&paths.seek_list())?;
        let id_to_title = persist::load_ids_to_titles(&paths)?;
        let title_to_id = persist::load_titles_to_ids(&paths)?;
        let text_offsets = persist::load_text_offsets(&paths)?;
        tracing::info!(
            dir = %dir.display(),
            documents = id_to_title.len(),
            terms = seek_list.len(),
            created_at = %meta.created_at,
            "loaded index"
        );
        Ok(Self { paths, meta, seek_list, id_to_title, title_to_id, text_offsets })
    }

    pub fn meta(&self) -> &MetaFile { &self.meta }

    pub fn seek_list(&self) -> &SeekList { &self.seek_list }

    pub fn total_documents(&self) -> usize { self.id_to_title.len() }

    pub fn title(&self, doc_id: DocId) -> Option<&str> {
        self.id_to_title.get(&doc_id).map(String::as_str)
    }

    /// Document id of the page whose title normalizes to `title`.
    pub fn doc_id_for_title(&self, title: &str) -> Option<DocId> {
        self.title_to_id.get(&normalize_title(title)).copied()
    }

    /// Postings of `term`. Unknown terms yield an empty list.
    pub fn read_postings(&self, term: &str) -> Result<PostingsList> {
        let Some(offset) = self.seek_list.get(term) else {
            return Ok(PostingsList::new());
        };
        let mut reader = BufReader::new(File::open(self.paths.index())?);
        reader.seek(SeekFrom::Start(offset))?;
        let mut raw = Vec::new();
        reader.read_until(codec::RECORD_TERMINATOR, &mut raw)?;
        let line = String::from_utf8(raw)
            .map_err(|_| Error::Corrupt(format!("postings of {term:?} are not valid UTF-8")))?;

        let mut errors = Vec::new();
        let (key, list) = codec::decode_line::<PostingsList>(&line, &mut errors)
            .map_err(|err| Error::Corrupt(format!("offset {offset} for {term:?}: {err}")))?;
        if key != term {
            return Err(Error::Corrupt(format!("offset {offset} holds {key:?}, expected {term:?}")));
        }
        for err in errors {
            tracing::warn!(term, error = %err, "skipping malformed postings token");
        }
        Ok(list)
    }

    /// Titles of the pages linking to `title`, found by binary search over the
    /// sorted lines of the link index file.
    pub fn read_link_list(&self, title: &str) -> Result<Option<TitleList>> {
        let target = normalize_title(title);
        if target.is_empty() {
            return Ok(None);
        }
        let file = File::open(self.paths.link_index())?;
        let mut hi = file.metadata()?.len();
        let mut lo = 0u64;
        let mut reader = BufReader::new(file);
        let mut line = String::new();
        let mut skipped = Vec::new();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let line_start = if mid == 0 {
                0
            } else {
                reader.seek(SeekFrom::Start(mid - 1))?;
                skipped.clear();
                mid - 1 + reader.read_until(b'\n', &mut skipped)? as u64
            };
            if line_start >= hi {
                hi = mid;
                continue;
            }

            reader.seek(SeekFrom::Start(line_start))?;
            line.clear();
            let line_end = line_start + reader.read_line(&mut line)? as u64;
            let (key, body) = codec::split_line(&line)
                .map_err(|err| Error::Corrupt(format!("link index line at {line_start}: {err}")))?;

            match key.cmp(target.as_str()) {
                std::cmp::Ordering::Less => lo = line_end,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => {
                    let mut errors = Vec::new();
                    return Ok(Some(TitleList::decode_body(key, body, &mut errors)));
                }
            }
        }
        Ok(None)
    }

    /// Cleaned text of a document, at most `max_bytes` long.
    pub fn document_text(&self, doc_id: DocId, max_bytes: usize) -> Result<Option<String>> {
        match self.text_offsets.get(&doc_id) {
            Some(&offset) => Ok(Some(texts::read_text(&self.paths.texts(), offset, max_bytes)?)),
            None => Ok(None),
        }
    }

    /// Snippet of a document around the first occurrence of one of `query_terms`.
    pub fn snippet(&self, doc_id: DocId, query_terms: &[String], cfg: &SnippetConfig) -> Result<Option<String>> {
        let Some(text) = self.document_text(doc_id, cfg.read_bytes)? else {
            return Ok(None);
        };
        Ok(texts::make_snippet(&text, query_terms, cfg))
    }
}

//! Single-pass index construction with bounded memory.
//!
//! Pages are fed one at a time. Postings and link lists accumulate in memory
//! until their approximate serialized size reaches the flush threshold, at
//! which point both are written to numbered segment files and replaced by
//! empty accumulators. [`IndexBuilder::finish`] merges the segments into the
//! final index files and writes the remaining metadata.

use std::collections::BTreeMap;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::{DocId, PostingsIndex, PostingsList};
use crate::links::{extract_linked_titles, normalize_title, LinkIndex, TitleList};
use crate::merge::merge_segments;
use crate::persist::{self, IndexPaths, MetaFile, FORMAT_VERSION};
use crate::seeklist::SeekList;
use crate::segment::{segment_path, write_segment, LINKS_STEM, POSTINGS_STEM};
use crate::texts::TextStoreWriter;
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub documents: usize,
    pub terms: usize,
    pub segments: usize,
}

pub struct IndexBuilder {
    paths: IndexPaths,
    config: IndexConfig,
    postings: PostingsIndex,
    links: LinkIndex,
    texts: TextStoreWriter,
    id_to_title: BTreeMap<DocId, String>,
    title_to_id: BTreeMap<String, DocId>,
    postings_segments: Vec<PathBuf>,
    link_segments: Vec<PathBuf>,
}

impl IndexBuilder {
    /// Start a fresh build in `dir`, deleting whatever a previous build left there.
    pub fn create<P: Into<PathBuf>>(dir: P, config: IndexConfig) -> Result<Self> {
        let root: PathBuf = dir.into();
        let paths = IndexPaths::new(root);
        persist::delete_old_files(&paths)?;
        let texts = TextStoreWriter::create(&paths.texts(), config.write_buffer_bytes)?;
        tracing::info!(dir = %paths.root.display(), flush_threshold = config.flush_threshold_bytes, "starting index build");
        Ok(Self {
            paths,
            config,
            postings: PostingsIndex::new(),
            links: LinkIndex::new(),
            texts,
            id_to_title: BTreeMap::new(),
            title_to_id: BTreeMap::new(),
            postings_segments: Vec::new(),
            link_segments: Vec::new(),
        })
    }

    /// Add one page. `text` is the raw page markup.
    pub fn index_page(&mut self, doc_id: DocId, title: &str, text: &str) -> Result<()> {
        self.id_to_title.insert(doc_id, title.to_string());
        let normalized = normalize_title(title);
        if normalized.is_empty() {
            tracing::warn!(doc_id, title, "title has no searchable characters, not mapped");
        } else {
            self.title_to_id.insert(normalized, doc_id);
        }

        for linked in extract_linked_titles(text) {
            self.links.add_linking_title(&linked, title);
        }
        for (term, position) in tokenize(text) {
            self.postings.add_term_occurrence(&term, doc_id, position);
        }
        self.texts.append(doc_id, text)?;

        if self.buffered_bytes() >= self.config.flush_threshold_bytes {
            self.flush()?;
        }
        Ok(())
    }

    pub fn documents(&self) -> usize { self.id_to_title.len() }

    pub fn segments_written(&self) -> usize { self.postings_segments.len() }

    fn buffered_bytes(&self) -> usize {
        self.postings.approx_bytes() + self.links.approx_bytes()
    }

    /// Write both accumulators to new segments and start over with empty ones.
    fn flush(&mut self) -> Result<()> {
        let number = self.postings_segments.len();
        let postings = self.postings.take();
        let links = self.links.take();

        let postings_path = segment_path(&self.paths.root, POSTINGS_STEM, number);
        let terms = write_segment(&postings_path, postings.iter(), self.config.write_buffer_bytes)?;
        self.postings_segments.push(postings_path);

        let links_path = segment_path(&self.paths.root, LINKS_STEM, number);
        let titles = write_segment(&links_path, links.iter(), self.config.write_buffer_bytes)?;
        self.link_segments.push(links_path);

        tracing::info!(segment = number, terms, titles, documents = self.documents(), "flushed segment");
        Ok(())
    }

    /// Flush what is left, merge all segments and persist the metadata.
    pub fn finish(mut self) -> Result<BuildSummary> {
        if !self.postings.is_empty() || !self.links.is_empty() || self.postings_segments.is_empty() {
            self.flush()?;
        }
        let segments = self.segments_written();
        let buffer = self.config.write_buffer_bytes;

        let mut seek_list = SeekList::new();
        let postings_stats =
            merge_segments::<PostingsList>(&self.postings_segments, &self.paths.index(), buffer, Some(&mut seek_list))?;
        let link_stats = merge_segments::<TitleList>(&self.link_segments, &self.paths.link_index(), buffer, None)?;
        if postings_stats.skipped_tokens + link_stats.skipped_tokens > 0 {
            tracing::warn!(
                skipped = postings_stats.skipped_tokens + link_stats.skipped_tokens,
                "malformed tokens were dropped while merging"
            );
        }
        seek_list.save(&self.paths.seek_list())?;

        let text_offsets = self.texts.finish()?;
        persist::save_text_offsets(&self.paths, &text_offsets)?;
        persist::save_ids_to_titles(&self.paths, &self.id_to_title)?;
        persist::save_titles_to_ids(&self.paths, &self.title_to_id)?;

        let summary = BuildSummary {
            documents: self.id_to_title.len(),
            terms: seek_list.len(),
            segments,
        };
        let meta = MetaFile {
            num_docs: summary.documents as u64,
            num_terms: summary.terms as u64,
            num_segments: summary.segments as u64,
            created_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            version: FORMAT_VERSION,
        };
        persist::save_meta(&self.paths, &meta)?;

        tracing::info!(
            documents = summary.documents,
            terms = summary.terms,
            titles = link_stats.keys,
            segments = summary.segments,
            "index build complete"
        );
        Ok(summary)
    }
}

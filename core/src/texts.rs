//! Random-access store of cleaned document texts, used for snippets.
//!
//! The texts file is the concatenation of every document's cleaned text, each
//! terminated by a tab. A separate `doc_id -> offset` map gives direct access.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::config::SnippetConfig;
use crate::error::Result;
use crate::index::DocId;
use crate::segment::CountingWriter;
use crate::tokenizer;

pub const TEXT_DELIMITER: u8 = b'\t';

lazy_static! {
    /// Ordered markup rewrites turning wiki text into plain snippet text.
    static ref CLEANING_PATTERNS: Vec<(Regex, &'static str)> = [
        (r"'''", ""),
        (r"''", ""),
        (r"==+", ""),
        (r"\[\[(?:Datei|File|Image|Bild):[^\]]*\]\]", ""),
        (r"\[\[[^|\]]+\|", ""),
        (r"\[\[", ""),
        (r"\]\]", ""),
        (r"\[\w+://[^\s]+\s", ""),
        (r"\[", ""),
        (r"\]", ""),
        (r"\{\{[^}]*\}\}", ""),
        (r"\{\{", ""),
        (r"\}\}", ""),
        (r"\{[^}]*\}", ""),
        (r"\|(.*)\n", ""),
        (r"<gallery>[^<]*</gallery>", ""),
        (r"<ref[^>]*>[^<]*</ref>", ""),
        (r"#(?:REDIRECT|WEITERLEITUNG)", ""),
        (r"<[^>]*>", ""),
        (r"\n(.*):\\mathrm(.*)\n", "\n"),
        (r" {2,}", " "),
        (r"\n ", "\n"),
        (r"\n{3,}", "\n\n"),
        (r"&nbsp;", " "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect();
}

/// Strip wiki markup from a page text. The result never contains a tab.
pub fn clean_page_text(text: &str) -> String {
    let mut cleaned = text.replace('\t', " ");
    for (pattern, replacement) in CLEANING_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }
    cleaned.trim().to_string()
}

/// Appends cleaned texts to the texts file while recording their offsets.
pub struct TextStoreWriter {
    out: CountingWriter<BufWriter<File>>,
    offsets: BTreeMap<DocId, u64>,
}

impl TextStoreWriter {
    pub fn create(path: &Path, buffer_bytes: usize) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: CountingWriter::new(BufWriter::with_capacity(buffer_bytes, file)),
            offsets: BTreeMap::new(),
        })
    }

    pub fn append(&mut self, doc_id: DocId, raw_text: &str) -> Result<()> {
        self.offsets.insert(doc_id, self.out.position());
        self.out.write_all(clean_page_text(raw_text).as_bytes())?;
        self.out.write_all(&[TEXT_DELIMITER])?;
        Ok(())
    }

    /// Flush the texts file and hand back the offset map.
    pub fn finish(mut self) -> Result<BTreeMap<DocId, u64>> {
        self.out.flush()?;
        Ok(self.offsets)
    }
}

/// Read the stored text starting at `offset`, at most `max_bytes` long, up to
/// its terminating tab.
pub fn read_text(path: &Path, offset: u64, max_bytes: usize) -> Result<String> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(max_bytes.min(64 * 1024));
    file.take(max_bytes as u64).read_to_end(&mut buf)?;
    if let Some(end) = buf.iter().position(|b| *b == TEXT_DELIMITER) {
        buf.truncate(end);
    }
    // a read cut short by max_bytes may end inside a multi-byte character
    if let Err(err) = std::str::from_utf8(&buf) {
        if err.error_len().is_none() {
            buf.truncate(err.valid_up_to());
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Build a snippet for `text`.
///
/// If one of the leading `scan_tokens` space-separated tokens normalizes to a
/// query term, the window is placed around that token; otherwise the start of
/// the text is used. Windows never extend past the end of the text.
pub fn make_snippet(text: &str, query_terms: &[String], cfg: &SnippetConfig) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let chars: Vec<char> = text.chars().collect();
    let window = cfg.window_chars.max(1);
    let lead = window * 5 / 12;
    let tail = window / 2;
    let max_lead = window * 7 / 12;
    let min_break = window * 5 / 6;

    let occurrence = find_query_term(&chars, query_terms, cfg.scan_tokens);

    let (start, end) = match occurrence {
        None => {
            let mut end = window.min(chars.len());
            if end < chars.len() {
                if let Some(space) = last_space_before(&chars, end) {
                    if space > min_break { end = space; }
                }
            }
            (0, end)
        }
        Some(idx) => {
            let mut start = 0;
            if idx > lead {
                start = last_space_before(&chars, idx - lead + 1).map_or(0, |s| s + 1);
                if idx - start > max_lead {
                    start = idx - lead;
                }
            }
            let mut end = (idx + tail).min(chars.len());
            if end < chars.len() {
                if let Some(space) = last_space_before(&chars, end) {
                    if space > start && space - start > min_break { end = space; }
                }
            }
            (start, end)
        }
    };

    let body: String = chars[start..end].iter().map(|c| if *c == '\n' { ' ' } else { *c }).collect();
    let mut snippet = String::with_capacity(body.len() + 6);
    if start > 0 { snippet.push_str("..."); }
    snippet.push_str(body.trim_end());
    if end < chars.len() { snippet.push_str("..."); }
    Some(snippet)
}

/// Index of the last space strictly before `end`.
fn last_space_before(chars: &[char], end: usize) -> Option<usize> {
    chars[..end.min(chars.len())].iter().rposition(|c| *c == ' ')
}

/// Char index of the first leading token whose normalized form is a query term.
fn find_query_term(chars: &[char], query_terms: &[String], scan_tokens: usize) -> Option<usize> {
    if query_terms.is_empty() {
        return None;
    }
    let wanted: HashSet<&str> = query_terms.iter().map(String::as_str).collect();
    let mut token_start = 0;
    let mut scanned = 0;
    for i in 0..=chars.len() {
        if i < chars.len() && chars[i] != ' ' {
            continue;
        }
        if i > token_start {
            let token: String = chars[token_start..i].iter().collect();
            if let Some(term) = tokenizer::first_term(&token) {
                if wanted.contains(term.as_str()) {
                    return Some(token_start);
                }
            }
            scanned += 1;
            if scanned >= scan_tokens {
                return None;
            }
        }
        token_start = i + 1;
    }
    None
}

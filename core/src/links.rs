//! Link graph: for every (normalized) page title, the titles of the pages
//! linking to it.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{btree_map, btree_set, BTreeMap, BTreeSet};

lazy_static! {
    static ref LINK_PATTERNS: Vec<Regex> = vec![
        // [[Target]] and [[Target#Section]]
        Regex::new(r"\[\[([^:#|\]]+)(#[^|\]]*)?\]\]").expect("valid regex"),
        // [[Target|label]]
        Regex::new(r"\[\[([^:#|\]]+)(#[^|\]]*)?\|[^\]]*\]\]").expect("valid regex"),
        // [https://xx.wikipedia.org/wiki/Target label]
        Regex::new(r"\[https?://[a-z\-]+\.wikipedia\.org/wiki/([^ :#\]]+)[^\]]*\]").expect("valid regex"),
    ];
}

/// Canonical form of a page title: trimmed, lowercased, without whitespace
/// and without the characters the on-disk formats use as delimiters.
pub fn normalize_title(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '.' | ':' | ',' | ';' | '-'))
        .collect()
}

/// Titles of the pages linked from a page's wiki markup, in first-seen order,
/// each at most once. Links into other namespaces are ignored.
pub fn extract_linked_titles(wiki_text: &str) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for pattern in LINK_PATTERNS.iter() {
        for caps in pattern.captures_iter(wiki_text) {
            let Some(target) = caps.get(1) else { continue };
            let target = target.as_str().replace('_', " ");
            let target = target.trim();
            if target.is_empty() || titles.iter().any(|t| t == target) { continue; }
            titles.push(target.to_string());
        }
    }
    titles
}

/// Normalized titles of all pages linking to `title`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleList {
    pub title: String,
    titles: BTreeSet<String>,
}

impl TitleList {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), titles: BTreeSet::new() }
    }

    pub fn add_title(&mut self, linking_title: impl Into<String>) {
        self.titles.insert(linking_title.into());
    }

    pub fn union(&mut self, other: TitleList) { self.titles.extend(other.titles); }

    /// Linking titles in ascending order.
    pub fn titles(&self) -> btree_set::Iter<'_, String> { self.titles.iter() }

    pub fn len(&self) -> usize { self.titles.len() }

    pub fn is_empty(&self) -> bool { self.titles.is_empty() }
}

/// In-memory link accumulator, flushed alongside the postings index.
#[derive(Debug, Default)]
pub struct LinkIndex {
    lists: BTreeMap<String, TitleList>,
    approx_bytes: usize,
}

impl LinkIndex {
    pub fn new() -> Self { Self::default() }

    /// Record that the page `linking_title` links to `title`. Both are normalized;
    /// links with an empty normalized end are dropped.
    pub fn add_linking_title(&mut self, title: &str, linking_title: &str) {
        let target = normalize_title(title);
        let source = normalize_title(linking_title);
        if target.is_empty() || source.is_empty() { return; }
        self.approx_bytes += target.len() + source.len();
        self.lists
            .entry(target.clone())
            .or_insert_with(|| TitleList::new(target))
            .add_title(source);
    }

    pub fn get(&self, normalized_title: &str) -> Option<&TitleList> {
        self.lists.get(normalized_title)
    }

    pub fn approx_bytes(&self) -> usize { self.approx_bytes }

    pub fn len(&self) -> usize { self.lists.len() }

    pub fn is_empty(&self) -> bool { self.lists.is_empty() }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TitleList> { self.lists.iter() }

    pub fn take(&mut self) -> LinkIndex { std::mem::take(self) }
}

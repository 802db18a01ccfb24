//! `LINKTO` queries: pages linking to a given title.

use std::collections::HashSet;

use crate::error::Result;
use crate::handler::IndexHandler;
use crate::index::DocId;

/// Ids of the pages linking to `title`, in the sort order of their
/// normalized titles. Linking titles without a known page are dropped.
pub fn evaluate(handler: &IndexHandler, title: &str) -> Result<Vec<DocId>> {
    let Some(list) = handler.read_link_list(title)? else {
        return Ok(Vec::new());
    };
    let mut seen = HashSet::new();
    Ok(list
        .titles()
        .filter_map(|linking| handler.doc_id_for_title(linking))
        .filter(|doc_id| seen.insert(*doc_id))
        .collect())
}

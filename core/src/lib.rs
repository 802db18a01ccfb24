pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod index;
pub mod links;
pub mod merge;
pub mod persist;
pub mod query;
pub mod seeklist;
pub mod segment;
pub mod texts;
pub mod tokenizer;

pub use builder::{BuildSummary, IndexBuilder};
pub use config::{Bm25Params, IndexConfig, SearchConfig, SnippetConfig};
pub use error::{EncodingError, Error, Result};
pub use handler::IndexHandler;
pub use index::{DocId, Position, PostingsIndex, PostingsList};
pub use links::{LinkIndex, TitleList};
pub use persist::directory_has_index_files;
pub use query::{QueryEngine, QueryKind, SearchHit};
pub use seeklist::SeekList;

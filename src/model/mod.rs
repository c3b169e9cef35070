//! Document model types.
//!
//! Every extractor produces a [`ParsedDocument`]; consumers read its text,
//! tables, image paths, and diagnostic metadata.

mod document;
mod table;

pub(crate) use document::to_json_string;
pub use document::{JsonFormat, Metadata, ParsedDocument};
pub use table::Table;

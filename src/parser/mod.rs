//! Document parsing: dispatch, options and the detection heuristics the
//! extractors share.

mod document_parser;
mod layout;
mod options;
mod structured;
mod table_detector;
mod text;

pub use document_parser::DocumentParser;
pub use layout::{SpanExtractor, TextSpan};
pub use options::{ParseOptions, DEFAULT_IMAGE_DIR};
pub use structured::{StructuredTextConfig, StructuredTextDetector, SyntheticTableBuilder};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};
pub use text::clean_text;

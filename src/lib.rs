//! # undoc
//!
//! Best-effort content extraction from PDF, DOCX, PPTX, TXT, HTML and CSV.
//!
//! Every document, whatever its format, comes back as the same
//! [`ParsedDocument`]: the full text, the tables that could be recovered
//! and the paths of the images that survived validation, plus a metadata
//! record describing how extraction went.
//!
//! ## Quick Start
//!
//! ```no_run
//! use undoc::{parse_document, JsonFormat};
//!
//! fn main() -> undoc::Result<()> {
//!     let data = std::fs::read("report.docx")?;
//!     let doc = parse_document(&data, "report.docx");
//!
//!     println!("{} tables, {} images", doc.tables.len(), doc.image_files.len());
//!     println!("{}", doc.to_json(JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **One shape for every format**: text, tables, images, metadata
//! - **Tolerant extraction**: a failing page, slide or stage is recorded,
//!   not raised
//! - **Table recovery**: native tables, PDF layout tables, and delimited
//!   text blocks inside free text
//! - **Image validation**: embedded images are decoded, size-checked and
//!   normalized to RGB PNG
//! - **Image descriptions**: pluggable describers attach a caption to
//!   every extracted image

pub mod detect;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod media;
pub mod model;
pub mod parser;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use detect::DocumentFormat;
pub use enrich::{
    describe_images, enrich, EnrichedDocument, ImageDescriber, ImageDescription, OfflineDescriber,
};
pub use error::{Error, Result};
pub use extract::{ExtractContext, Extractor};
pub use media::ImageValidator;
pub use model::{JsonFormat, Metadata, ParsedDocument, Table};
pub use parser::{
    clean_text, DocumentParser, ParseOptions, StructuredTextConfig, StructuredTextDetector,
    TableDetectorConfig,
};

use std::path::Path;

/// Parse a document with default options.
///
/// The extension of `filename` selects the extractor. This never fails:
/// unsupported formats produce an error document and extraction failures
/// are recorded in `metadata.extraction_error`. Images are written to
/// [`parser::DEFAULT_IMAGE_DIR`].
///
/// # Example
///
/// ```no_run
/// let doc = undoc::parse_document(b"name,age\nAda,36\n", "people.csv");
/// assert_eq!(doc.tables.len(), 1);
/// ```
pub fn parse_document(data: &[u8], filename: &str) -> ParsedDocument {
    DocumentParser::new().parse(data, filename)
}

/// Parse a document with custom options.
///
/// # Example
///
/// ```no_run
/// use undoc::{parse_document_with_options, ParseOptions};
///
/// let options = ParseOptions::new().with_image_dir("/tmp/undoc-images");
/// let data = std::fs::read("slides.pptx").unwrap();
/// let doc = parse_document_with_options(&data, "slides.pptx", options);
/// ```
pub fn parse_document_with_options(
    data: &[u8],
    filename: &str,
    options: ParseOptions,
) -> ParsedDocument {
    DocumentParser::with_options(options).parse(data, filename)
}

/// Read and parse a file with default options.
///
/// Only reading the file can fail.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedDocument> {
    DocumentParser::new().parse_file(path)
}

/// Read and parse a file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<ParsedDocument> {
    DocumentParser::with_options(options).parse_file(path)
}

/// Extract the text of a document.
///
/// # Example
///
/// ```no_run
/// let text = undoc::extract_text("notes.html").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let options = ParseOptions::new().text_only();
    Ok(parse_file_with_options(path, options)?.full_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_csv() {
        let dir = tempfile::tempdir().unwrap();
        let options = ParseOptions::new().with_image_dir(dir.path());
        let doc = parse_document_with_options(b"a,b,c\n1,2,3\n", "grid.csv", options);

        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].row_count(), 2);
        assert_eq!(doc.metadata.delimiter_detected.as_deref(), Some(","));
    }

    #[test]
    fn test_extract_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>Hello <b>there</b></p><script>x()</script>").unwrap();

        assert_eq!(extract_text(&path).unwrap(), "Hello there");
    }

    #[test]
    fn test_parse_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(parse_file(dir.path().join("nope.txt")), Err(Error::Io(_))));
    }
}

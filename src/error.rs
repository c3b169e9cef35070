//! Error types for undoc library.

use std::io;
use thiserror::Error;

/// Result type alias for undoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting a document.
///
/// None of these escape [`crate::parse_document`]: extractors record them in
/// the document metadata instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file extension is not one of the supported formats.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error reading a ZIP-based container (DOCX, PPTX).
    #[error("Archive error: {0}")]
    Archive(String),

    /// A required part is missing from the container.
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// Malformed XML inside a container part.
    #[error("XML error: {0}")]
    Xml(String),

    /// Error building an HTML selector or walking the DOM.
    #[error("HTML error: {0}")]
    Html(String),

    /// Error reading delimited text.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Error decoding or encoding raster data.
    #[error("Image error: {0}")]
    Image(String),

    /// A candidate image did not pass validation.
    #[error("Image rejected: {0}")]
    Rejected(String),

    /// An image describer failed for one image.
    #[error("Description failed: {0}")]
    Describe(String),

    /// A URL was refused by the fetch policy.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Error during JSON rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => Error::MissingPart("archive entry".to_string()),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

//! Per-format extractors.
//!
//! Each supported format has one extractor implementing [`Extractor`]. The
//! router picks the extractor from the file extension and hands it the raw
//! bytes together with an [`ExtractContext`] carrying the shared options,
//! the image validator and the structured-text detector.
//!
//! Extractors are tolerant: a failing stage is recorded in
//! `metadata.extraction_error` and whatever was collected before the
//! failure is still returned.

mod delimited;
mod docx;
mod html;
mod ooxml;
mod pdf;
mod plain;
mod pptx;

pub use delimited::CsvExtractor;
pub use docx::DocxExtractor;
pub use html::HtmlExtractor;
pub use pdf::PdfExtractor;
pub use plain::TextExtractor;
pub use pptx::PptxExtractor;

use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::media::ImageValidator;
use crate::model::ParsedDocument;
use crate::parser::{ParseOptions, StructuredTextDetector};

/// Shared collaborators handed to every extractor.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Parsing options
    pub options: &'a ParseOptions,
    /// Validator every image candidate goes through
    pub images: &'a ImageValidator,
    /// Classifier for delimiter-separated lines in free text
    pub detector: &'a StructuredTextDetector,
}

impl<'a> ExtractContext<'a> {
    /// Bundle the collaborators.
    pub fn new(
        options: &'a ParseOptions,
        images: &'a ImageValidator,
        detector: &'a StructuredTextDetector,
    ) -> Self {
        Self {
            options,
            images,
            detector,
        }
    }
}

/// Trait for format extractors.
///
/// Implement [`extract_into`](Extractor::extract_into); callers use the
/// provided [`extract`](Extractor::extract), which never fails.
pub trait Extractor: Send + Sync {
    /// The format this extractor handles.
    fn format(&self) -> DocumentFormat;

    /// Value written to `metadata.extraction_method`.
    fn method(&self) -> &'static str;

    /// Extract into `doc`, returning the first error that stopped a stage.
    ///
    /// Stages that can fail independently record their own errors on `doc`
    /// and keep going; only an error that ends the extraction is returned.
    fn extract_into(&self, data: &[u8], ctx: &ExtractContext<'_>, doc: &mut ParsedDocument)
        -> Result<()>;

    /// Extract a document, recording any failure in its metadata.
    fn extract(&self, data: &[u8], ctx: &ExtractContext<'_>) -> ParsedDocument {
        let mut doc = ParsedDocument::new(self.method());
        if let Err(e) = self.extract_into(data, ctx, &mut doc) {
            log::warn!("{} extraction failed: {}", self.format(), e);
            doc.metadata.record_error(e.to_string());
        }
        doc.finalize();
        doc
    }
}

/// The extractor for `format`.
pub fn extractor_for(format: DocumentFormat) -> &'static dyn Extractor {
    match format {
        DocumentFormat::Pdf => &PdfExtractor,
        DocumentFormat::Docx => &DocxExtractor,
        DocumentFormat::Pptx => &PptxExtractor,
        DocumentFormat::Txt => &TextExtractor,
        DocumentFormat::Html => &HtmlExtractor,
        DocumentFormat::Csv => &CsvExtractor,
    }
}

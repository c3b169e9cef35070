//! Format dispatch.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use super::{ParseOptions, StructuredTextDetector};
use crate::detect::{extension_of, DocumentFormat};
use crate::error::Result;
use crate::extract::{extractor_for, ExtractContext};
use crate::media::ImageValidator;
use crate::model::ParsedDocument;

/// Routes documents to the extractor for their format.
///
/// Parsing never fails: unsupported extensions produce an error document
/// and extractor failures are recorded in `metadata.extraction_error`.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    options: ParseOptions,
    images: ImageValidator,
    detector: StructuredTextDetector,
}

impl DocumentParser {
    /// Create a parser with default options.
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    /// Create a parser with custom options.
    pub fn with_options(options: ParseOptions) -> Self {
        let images = ImageValidator::from_options(&options);
        let detector = StructuredTextDetector::with_config(options.structured.clone());
        Self {
            options,
            images,
            detector,
        }
    }

    /// The options this parser was built with.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Directory extracted images are written to.
    pub fn image_dir(&self) -> &Path {
        self.images.dir()
    }

    /// Empty the image directory, recreating it.
    ///
    /// Call this at the start of each new upload; [`parse`](Self::parse)
    /// only ever adds files.
    pub fn reset_image_dir(&self) -> Result<()> {
        self.images.reset_dir()
    }

    /// Parse `data`, choosing the extractor from the extension of `filename`.
    pub fn parse(&self, data: &[u8], filename: &str) -> ParsedDocument {
        let ext = extension_of(filename);
        let Some(format) = DocumentFormat::from_extension(&ext) else {
            log::debug!("parser: unsupported extension {:?} for {}", ext, filename);
            return ParsedDocument::unsupported(&ext);
        };

        let dir_error = if self.options.extract_images {
            self.images.ensure_dir().err()
        } else {
            None
        };

        let extractor = extractor_for(format);
        let ctx = ExtractContext::new(&self.options, &self.images, &self.detector);
        log::debug!("parser: {} ({} bytes) as {}", filename, data.len(), format);

        let extracted = panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(data, &ctx)));
        let mut doc = match extracted {
            Ok(doc) => doc,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("parser: {} extractor panicked on {}: {}", format, filename, message);
                let mut doc = ParsedDocument::new(extractor.method());
                doc.metadata.record_error(format!("extractor panicked: {}", message));
                doc
            }
        };

        if let Some(e) = dir_error {
            log::warn!("parser: cannot create {}: {}", self.image_dir().display(), e);
            doc.metadata
                .record_error(format!("image directory {}: {}", self.image_dir().display(), e));
        }

        doc.finalize();
        doc
    }

    /// Read a file from disk and parse it under its own file name.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedDocument> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.parse(&data, &filename))
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let parser = DocumentParser::new();
        let doc = parser.parse(b"whatever", "notes.xyz");

        assert!(doc.full_text.contains("Unsupported file type '.xyz'"));
        assert_eq!(doc.metadata.error.as_deref(), Some("Unsupported format: .xyz"));
        assert_eq!(doc.metadata.extraction_method, "unsupported");
        assert!(doc.tables.is_empty());
        assert!(doc.image_files.is_empty());
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let parser = DocumentParser::with_options(ParseOptions::default().with_image_dir(dir.path()));

        let doc = parser.parse(b"a,b\n1,2\n", "DATA.CSV");
        assert_eq!(doc.metadata.extraction_method, "csv reader");
        assert_eq!(doc.tables.len(), 1);
    }

    #[test]
    fn test_creates_image_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("images");
        let parser = DocumentParser::with_options(ParseOptions::default().with_image_dir(&dir));

        parser.parse(b"hello", "hello.txt");
        assert!(dir.is_dir());
    }

    #[test]
    fn test_uncreatable_image_dir_is_recorded() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let parser =
            DocumentParser::with_options(ParseOptions::default().with_image_dir(blocker.join("images")));

        let doc = parser.parse(b"plain text", "a.txt");
        assert_eq!(doc.full_text, "plain text");
        assert!(doc.metadata.extraction_error.unwrap().contains("image directory"));
    }

    #[test]
    fn test_text_only_skips_image_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("never");
        let parser = DocumentParser::with_options(
            ParseOptions::default().with_image_dir(&dir).text_only(),
        );

        parser.parse(b"hello", "hello.txt");
        assert!(!dir.exists());
    }

    #[test]
    fn test_parse_file_uses_file_name() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("table.csv");
        fs::write(&path, "x;y\n1;2\n").unwrap();

        let parser =
            DocumentParser::with_options(ParseOptions::default().with_image_dir(root.path()));
        let doc = parser.parse_file(&path).unwrap();
        assert_eq!(doc.metadata.delimiter_detected.as_deref(), Some(";"));
        assert!(parser.parse_file(root.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}

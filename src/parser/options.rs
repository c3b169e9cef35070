//! Parsing options and configuration.

use std::path::{Path, PathBuf};

use super::structured::StructuredTextConfig;
use super::table_detector::TableDetectorConfig;

/// Directory name used when the caller does not choose an image directory.
pub const DEFAULT_IMAGE_DIR: &str = "temp_images";

/// Options for parsing documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Directory extracted images are written to
    pub image_dir: PathBuf,

    /// Whether to extract embedded images
    pub extract_images: bool,

    /// Whether to recover tables heuristically (synthetic tables from
    /// delimited text, layout tables from PDF text positions). Native
    /// DOCX/PPTX/HTML/CSV tables are always extracted.
    pub detect_tables: bool,

    /// Blobs smaller than this many bytes are never images
    pub min_image_bytes: usize,

    /// Images narrower or shorter than this are dropped
    pub min_image_dimension: u32,

    /// Structured-text heuristic settings
    pub structured: StructuredTextConfig,

    /// PDF layout table detector settings
    pub table_detector: TableDetectorConfig,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory extracted images are written to.
    pub fn with_image_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.image_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable heuristic table detection.
    pub fn with_table_detection(mut self, detect: bool) -> Self {
        self.detect_tables = detect;
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self.detect_tables = false;
        self
    }

    /// Set the minimum byte size of an image candidate.
    pub fn with_min_image_bytes(mut self, bytes: usize) -> Self {
        self.min_image_bytes = bytes;
        self
    }

    /// Set the minimum width and height of a kept image.
    pub fn with_min_image_dimension(mut self, pixels: u32) -> Self {
        self.min_image_dimension = pixels;
        self
    }

    /// Set structured-text heuristic settings.
    pub fn with_structured_text(mut self, config: StructuredTextConfig) -> Self {
        self.structured = config;
        self
    }

    /// Set the minimum length of a line classified as structured.
    pub fn with_structured_min_length(mut self, chars: usize) -> Self {
        self.structured.min_length = chars;
        self
    }

    /// Set PDF table detector settings.
    pub fn with_table_detector(mut self, config: TableDetectorConfig) -> Self {
        self.table_detector = config;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            extract_images: true,
            detect_tables: true,
            min_image_bytes: 100,
            min_image_dimension: 10,
            structured: StructuredTextConfig::default(),
            table_detector: TableDetectorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_image_dir("/tmp/out")
            .with_min_image_bytes(64)
            .with_min_image_dimension(32)
            .with_structured_min_length(8);

        assert_eq!(options.image_dir, PathBuf::from("/tmp/out"));
        assert_eq!(options.min_image_bytes, 64);
        assert_eq!(options.min_image_dimension, 32);
        assert_eq!(options.structured.min_length, 8);
    }

    #[test]
    fn test_text_only() {
        let options = ParseOptions::new().text_only();
        assert!(!options.extract_images);
        assert!(!options.detect_tables);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.image_dir, PathBuf::from(DEFAULT_IMAGE_DIR));
        assert!(options.extract_images);
        assert!(options.detect_tables);
        assert_eq!(options.min_image_dimension, 10);
    }
}

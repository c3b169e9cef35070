//! Document-level types.

use super::Table;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The normalized result of parsing one document.
///
/// Every extractor produces this shape, including the error document the
/// router builds for unsupported formats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Concatenated text, with `--- PAGE n ---` / `--- SLIDE n ---` markers
    /// for paged formats.
    pub full_text: String,

    /// Tables in extraction order. Never contains an empty table.
    pub tables: Vec<Table>,

    /// Validated PNG files written to the image directory.
    pub image_files: Vec<PathBuf>,

    /// Diagnostic metadata.
    pub metadata: Metadata,
}

impl ParsedDocument {
    /// Create an empty document tagged with an extraction method.
    pub fn new(extraction_method: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::with_method(extraction_method),
            ..Default::default()
        }
    }

    /// Build the error document returned for an unsupported extension.
    pub fn unsupported(ext: &str) -> Self {
        let mut doc = Self::new("unsupported");
        doc.full_text = format!(
            "Error: Unsupported file type '{}'. Please upload a supported file format.",
            ext
        );
        doc.metadata.error = Some(Error::UnsupportedFormat(ext.to_string()).to_string());
        doc
    }

    /// Append a table built from `rows`. Returns `false` (and appends
    /// nothing) when there are no rows.
    pub fn push_rows(&mut self, rows: Vec<Vec<String>>) -> bool {
        match Table::from_rows(rows) {
            Some(table) => {
                self.tables.push(table);
                true
            }
            None => false,
        }
    }

    /// Refresh the counters derived from the content vectors.
    pub fn finalize(&mut self) {
        self.metadata.tables_found = self.tables.len();
        self.metadata.images_found = self.image_files.len();
    }

    /// Whether any extraction stage failed or the format was rejected.
    pub fn has_error(&self) -> bool {
        self.metadata.extraction_error.is_some() || self.metadata.error.is_some()
    }

    /// Number of whitespace-separated words in `full_text`.
    pub fn word_count(&self) -> usize {
        self.full_text.split_whitespace().count()
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        to_json_string(self, format)
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without whitespace
    Compact,
}

pub(crate) fn to_json_string<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    }
    .map_err(|e| Error::Render(e.to_string()))
}

/// Document metadata.
///
/// Serialized as a flat map; keys that do not apply to a format are
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Which extractor produced the document
    pub extraction_method: String,

    /// Page count (PDF)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,

    /// Slide count (PPTX)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<u32>,

    /// Number of tables in the document
    pub tables_found: usize,

    /// Number of images that passed validation
    pub images_found: usize,

    /// Delimiter chosen by the CSV sniffer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter_detected: Option<String>,

    /// Rows kept by the CSV reader
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_parsed: Option<usize>,

    /// Text encoding that decoded the input (CSV)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Document title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Document author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Document subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Creator application
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    /// PDF producer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,

    /// Creation date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,

    /// Failures of individual extraction stages, joined with "; "
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,

    /// Set only on the unsupported-format document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Metadata {
    /// Create metadata tagged with an extraction method.
    pub fn with_method(method: impl Into<String>) -> Self {
        Self {
            extraction_method: method.into(),
            ..Default::default()
        }
    }

    /// Record a stage failure, keeping earlier ones.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &mut self.extraction_error {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&message);
            }
            None => self.extraction_error = Some(message),
        }
    }
}

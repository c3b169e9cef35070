//! Structured-text detection for free text.
//!
//! Paragraphs and lines that look like delimiter-separated data are turned
//! into synthetic tables. The heuristic is purely syntactic: prose with
//! enough incidental commas is classified as tabular, which is accepted in
//! favour of recalling real data embedded in text.

use crate::model::Table;

/// Delimiters counted by [`StructuredTextDetector::is_structured`].
const DELIMITERS: [char; 4] = [',', '\t', '|', ';'];

/// Delimiter preference when splitting a structured line.
const SPLIT_PREFERENCE: [char; 4] = [',', '\t', ';', '|'];

/// Structured-text heuristic settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredTextConfig {
    /// Trimmed strings shorter than this (in chars) are never structured
    pub min_length: usize,
}

impl Default for StructuredTextConfig {
    fn default() -> Self {
        Self { min_length: 5 }
    }
}

/// Classifies lines of free text as tabular or not.
#[derive(Debug, Clone, Default)]
pub struct StructuredTextDetector {
    config: StructuredTextConfig,
}

impl StructuredTextDetector {
    /// Create a detector with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom settings.
    pub fn with_config(config: StructuredTextConfig) -> Self {
        Self { config }
    }

    /// Whether `text` looks like a row of delimited data.
    ///
    /// True when any of `,` `\t` `|` `;` occurs at least twice, or when a
    /// colon appears together with `=` or a second colon.
    pub fn is_structured(&self, text: &str) -> bool {
        let text = text.trim();
        if text.chars().count() < self.config.min_length {
            return false;
        }

        if DELIMITERS.iter().any(|&d| count(text, d) >= 2) {
            return true;
        }

        let colons = count(text, ':');
        colons >= 2 || (colons == 1 && text.contains('='))
    }

    /// Pick the delimiter to split a structured line on.
    pub fn sniff_delimiter(&self, line: &str) -> char {
        if let Some(&d) = SPLIT_PREFERENCE.iter().find(|&&d| count(line, d) >= 2) {
            return d;
        }
        if line.contains(',') {
            ','
        } else if line.contains('\t') {
            '\t'
        } else {
            ':'
        }
    }

    /// Split one line into trimmed, non-empty cells.
    pub fn split_row(&self, line: &str, delimiter: char) -> Vec<String> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());

        let mut record = csv::StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => record
                .iter()
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(String::from)
                .collect(),
            Ok(false) => Vec::new(),
            Err(e) => {
                log::debug!("structured: csv split failed ({}), splitting literally", e);
                line.split(delimiter)
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .map(String::from)
                    .collect()
            }
        }
    }

    /// Start a synthetic table buffer backed by this detector.
    pub fn table_builder(&self) -> SyntheticTableBuilder<'_> {
        SyntheticTableBuilder {
            detector: self,
            pending: Vec::new(),
            tables: Vec::new(),
        }
    }
}

fn count(text: &str, c: char) -> usize {
    text.matches(c).count()
}

/// Accumulates consecutive structured lines into synthetic tables.
///
/// A non-structured or empty line closes the pending table. Rows with a
/// single cell are dropped without closing it.
#[derive(Debug)]
pub struct SyntheticTableBuilder<'a> {
    detector: &'a StructuredTextDetector,
    pending: Vec<Vec<String>>,
    tables: Vec<Table>,
}

impl SyntheticTableBuilder<'_> {
    /// Feed one line or paragraph. Returns whether it became a table row.
    pub fn push_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || !self.detector.is_structured(line) {
            self.flush();
            return false;
        }

        let delimiter = self.detector.sniff_delimiter(line);
        let cells = self.detector.split_row(line, delimiter);
        if cells.len() > 1 {
            self.pending.push(cells);
            true
        } else {
            false
        }
    }

    /// Close the pending table, if any.
    pub fn flush(&mut self) {
        if let Some(table) = Table::from_rows(std::mem::take(&mut self.pending)) {
            log::debug!("structured: synthetic table with {} rows", table.row_count());
            self.tables.push(table);
        }
    }

    /// Flush and return every table built so far.
    pub fn finish(mut self) -> Vec<Table> {
        self.flush();
        self.tables
    }
}

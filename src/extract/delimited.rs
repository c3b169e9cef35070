//! CSV extraction.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use super::{ExtractContext, Extractor};
use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::model::ParsedDocument;

/// Characters inspected by the delimiter sniffer.
const SNIFF_WINDOW: usize = 1024;

/// UTF-8 byte order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Extracts delimiter-separated files into a single table.
///
/// Cells are trimmed and rows whose cells are all empty (`,,`) are left
/// out, so a file of blank records yields no table at all. Every other row
/// is kept as-is, including ragged ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor;

impl Extractor for CsvExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Csv
    }

    fn method(&self) -> &'static str {
        "csv reader"
    }

    fn extract_into(
        &self,
        data: &[u8],
        _ctx: &ExtractContext<'_>,
        doc: &mut ParsedDocument,
    ) -> Result<()> {
        let (text, encoding) = decode(data);
        doc.metadata.encoding = Some(encoding.to_string());

        let delimiter = sniff_delimiter(&text);
        doc.metadata.delimiter_detected = Some(delimiter.to_string());
        log::debug!("csv: encoding {}, delimiter {:?}", encoding, delimiter);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut failure = None;
        for record in reader.records() {
            match record {
                Ok(record) => {
                    let cells: Vec<String> =
                        record.iter().map(|cell| cell.trim().to_string()).collect();
                    // all-empty records carry no data
                    if cells.iter().any(|cell| !cell.is_empty()) {
                        rows.push(cells);
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        doc.metadata.rows_parsed = Some(rows.len());
        doc.push_rows(rows);
        doc.full_text = text.into_owned();

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Decode `data`, trying UTF-8 and then Windows-1252.
///
/// Returns the text and the label of the encoding that decoded it.
fn decode(data: &[u8]) -> (Cow<'_, str>, &'static str) {
    let body = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    for encoding in [UTF_8, WINDOWS_1252] {
        if let Some(text) = decode_strict(encoding, body) {
            return (text, encoding.name());
        }
    }

    (String::from_utf8_lossy(body), "utf-8 (lossy)")
}

fn decode_strict<'a>(encoding: &'static Encoding, data: &'a [u8]) -> Option<Cow<'a, str>> {
    encoding.decode_without_bom_handling_and_without_replacement(data)
}

/// Pick the delimiter from the start of the text.
///
/// Comma unless tabs outnumber commas, or failing that semicolons do.
fn sniff_delimiter(text: &str) -> char {
    let mut commas = 0;
    let mut tabs = 0;
    let mut semicolons = 0;
    for c in text.chars().take(SNIFF_WINDOW) {
        match c {
            ',' => commas += 1,
            '\t' => tabs += 1,
            ';' => semicolons += 1,
            _ => {}
        }
    }

    if tabs > commas {
        '\t'
    } else if semicolons > commas {
        ';'
    } else {
        ','
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImageValidator;
    use crate::parser::{ParseOptions, StructuredTextDetector};

    fn extract(data: &[u8]) -> ParsedDocument {
        let options = ParseOptions::default();
        let images = ImageValidator::from_options(&options);
        let detector = StructuredTextDetector::new();
        CsvExtractor.extract(data, &ExtractContext::new(&options, &images, &detector))
    }

    #[test]
    fn test_comma_grid() {
        let doc = extract(b"a,b,c\n1,2,3\n");
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].rows()[0], vec!["a", "b", "c"]);
        assert_eq!(doc.tables[0].rows()[1], vec!["1", "2", "3"]);
        assert_eq!(doc.metadata.delimiter_detected.as_deref(), Some(","));
        assert_eq!(doc.metadata.rows_parsed, Some(2));
        assert_eq!(doc.metadata.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(doc.full_text, "a,b,c\n1,2,3\n");
    }

    #[test]
    fn test_semicolon_and_tab_sniffing() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(sniff_delimiter("a\tb\tc"), '\t');
        assert_eq!(sniff_delimiter("a,b;c"), ',');
        assert_eq!(sniff_delimiter("plain"), ',');

        let doc = extract(b"name;city\nAda;London\n");
        assert_eq!(doc.metadata.delimiter_detected.as_deref(), Some(";"));
        assert_eq!(doc.tables[0].rows()[1], vec!["Ada", "London"]);
    }

    #[test]
    fn test_blank_rows_skipped_and_cells_trimmed() {
        let doc = extract(b" a , b \n , \n\nc,d\n");
        assert_eq!(doc.tables[0].row_count(), 2);
        assert_eq!(doc.tables[0].rows()[0], vec!["a", "b"]);
        assert_eq!(doc.metadata.rows_parsed, Some(2));
    }

    #[test]
    fn test_only_empty_records_has_no_table() {
        let doc = extract(b",,\n , ,\n");
        assert!(doc.tables.is_empty());
        assert_eq!(doc.metadata.rows_parsed, Some(0));
    }

    #[test]
    fn test_quoted_fields() {
        let doc = extract(b"\"Smith, John\",42\n\"Doe, Jane\",37\n");
        assert_eq!(doc.tables[0].rows()[0], vec!["Smith, John", "42"]);
    }

    #[test]
    fn test_bom_and_latin1() {
        let doc = extract(b"\xEF\xBB\xBFid,name\n1,Zoe\n");
        assert_eq!(doc.tables[0].rows()[0], vec!["id", "name"]);

        let doc = extract(b"id,name\n1,Jos\xE9\n");
        assert_eq!(doc.metadata.encoding.as_deref(), Some("windows-1252"));
        assert_eq!(doc.tables[0].rows()[1], vec!["1", "José"]);
    }

    #[test]
    fn test_empty_input_has_no_table() {
        let doc = extract(b"");
        assert!(doc.tables.is_empty());
        assert_eq!(doc.metadata.rows_parsed, Some(0));
        assert!(doc.metadata.extraction_error.is_none());
    }
}

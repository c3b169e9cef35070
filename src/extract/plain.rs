//! Plain text extraction.

use super::{ExtractContext, Extractor};
use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::model::ParsedDocument;

/// Extracts plain text files line by line.
///
/// Runs of delimiter-separated lines become synthetic tables; the text
/// itself is returned as decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Txt
    }

    fn method(&self) -> &'static str {
        "text lines"
    }

    fn extract_into(
        &self,
        data: &[u8],
        ctx: &ExtractContext<'_>,
        doc: &mut ParsedDocument,
    ) -> Result<()> {
        let text = String::from_utf8_lossy(data);

        if ctx.options.detect_tables {
            let mut builder = ctx.detector.table_builder();
            for line in text.lines() {
                builder.push_line(line);
            }
            doc.tables.extend(builder.finish());
        }

        doc.full_text = text.into_owned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImageValidator;
    use crate::parser::{ParseOptions, StructuredTextDetector};

    fn extract(data: &[u8], options: &ParseOptions) -> ParsedDocument {
        let images = ImageValidator::from_options(options);
        let detector = StructuredTextDetector::with_config(options.structured.clone());
        TextExtractor.extract(data, &ExtractContext::new(options, &images, &detector))
    }

    #[test]
    fn test_comma_block_then_prose() {
        let input = "a,b,c\n1,2,3\n4,5,6\n\nThis is prose.";
        let doc = extract(input.as_bytes(), &ParseOptions::default());

        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].row_count(), 3);
        assert_eq!(doc.tables[0].rows()[1], vec!["1", "2", "3"]);
        assert!(doc.full_text.contains("This is prose."));
        assert_eq!(doc.full_text, input);
        assert_eq!(doc.metadata.extraction_method, "text lines");
        assert_eq!(doc.metadata.tables_found, 1);
    }

    #[test]
    fn test_blank_line_splits_tables() {
        let input = "a;b;c\nd;e;f\n\ng|h|i\nj|k|l\n";
        let doc = extract(input.as_bytes(), &ParseOptions::default());
        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[1].rows()[0], vec!["g", "h", "i"]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let doc = extract(b"caf\xE9 menu", &ParseOptions::default());
        assert!(doc.full_text.starts_with("caf"));
        assert!(doc.full_text.ends_with(" menu"));
        assert!(doc.metadata.extraction_error.is_none());
    }

    #[test]
    fn test_table_detection_disabled() {
        let options = ParseOptions::default().with_table_detection(false);
        let doc = extract(b"a,b,c\n1,2,3\n", &options);
        assert!(doc.tables.is_empty());
    }
}

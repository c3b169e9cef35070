//! Integration tests for format dispatch and the tolerance guarantees.

use std::path::Path;

use undoc::error::{Error, Result};
use undoc::{
    DocumentFormat, DocumentParser, ExtractContext, Extractor, ImageValidator, ParseOptions,
    ParsedDocument, StructuredTextDetector,
};

const EXTENSIONS: [&str; 9] = ["pdf", "docx", "pptx", "txt", "html", "htm", "csv", "xyz", ""];

fn parser_in(dir: &Path) -> DocumentParser {
    DocumentParser::with_options(ParseOptions::new().with_image_dir(dir))
}

/// Deterministic pseudo-random bytes.
fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

fn assert_invariants(doc: &ParsedDocument) {
    assert!(!doc.metadata.extraction_method.is_empty());
    for table in &doc.tables {
        assert!(table.row_count() > 0, "empty table in {:?}", doc.metadata);
    }
    for path in &doc.image_files {
        let image = image::open(path).expect("saved image decodes");
        assert!(image.width() >= 10 && image.height() >= 10);
    }
    assert_eq!(doc.metadata.tables_found, doc.tables.len());
    assert_eq!(doc.metadata.images_found, doc.image_files.len());
}

/// Mock extractor that fails after doing part of its work.
struct HalfExtractor;

impl Extractor for HalfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Txt
    }

    fn method(&self) -> &'static str {
        "half"
    }

    fn extract_into(
        &self,
        _data: &[u8],
        _ctx: &ExtractContext<'_>,
        doc: &mut ParsedDocument,
    ) -> Result<()> {
        doc.full_text = "partial".to_string();
        doc.push_rows(vec![vec!["kept".to_string()]]);
        Err(Error::MissingPart("word/stage2.xml".to_string()))
    }
}

#[test]
fn test_every_input_yields_a_document() {
    let dir = tempfile::tempdir().unwrap();
    let parser = parser_in(dir.path());

    let inputs: Vec<Vec<u8>> = vec![
        Vec::new(),
        noise(4096, 7),
        noise(257, 42),
        vec![0xFF, 0xFE, 0x00, 0xC3, 0x28, 0xA0, 0xA1],
        b"%PDF-1.7\n%broken".to_vec(),
        b"PK\x03\x04not really a zip".to_vec(),
    ];

    for ext in EXTENSIONS {
        let filename = if ext.is_empty() { "noext".to_string() } else { format!("input.{}", ext) };
        for data in &inputs {
            let doc = parser.parse(data, &filename);
            assert_invariants(&doc);
        }
    }
}

#[test]
fn test_csv_grid_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let doc = parser_in(dir.path()).parse(b"a,b,c\n1,2,3\n", "data.csv");

    assert_eq!(doc.tables.len(), 1);
    assert_eq!(doc.tables[0].row_count(), 2);
    assert_eq!(doc.tables[0].rows()[0], vec!["a", "b", "c"]);
    assert_eq!(doc.tables[0].rows()[1], vec!["1", "2", "3"]);
    assert_eq!(doc.metadata.delimiter_detected.as_deref(), Some(","));
    assert_eq!(doc.metadata.extraction_method, "csv reader");
}

#[test]
fn test_csv_n_by_m_is_one_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::new();
    for r in 0..25 {
        let row: Vec<String> = (0..4).map(|c| format!("r{}c{}", r, c)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    let doc = parser_in(dir.path()).parse(csv.as_bytes(), "wide.csv");
    assert_eq!(doc.tables.len(), 1);
    assert_eq!(doc.tables[0].row_count(), 25);
    assert_eq!(doc.tables[0].column_count(), 4);
    assert_eq!(doc.metadata.rows_parsed, Some(25));
}

#[test]
fn test_txt_block_and_prose_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let text = "x,y,z\n1,2,3\n4,5,6\n\nThis is prose.\n";
    let doc = parser_in(dir.path()).parse(text.as_bytes(), "notes.txt");

    assert_eq!(doc.tables.len(), 1);
    assert_eq!(doc.tables[0].row_count(), 3);
    assert!(doc.full_text.contains("This is prose."));
}

#[test]
fn test_unsupported_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let doc = parser_in(dir.path()).parse(b"\x00\x01", "archive.xyz");

    assert!(doc.full_text.contains("Unsupported file type"));
    assert!(doc.has_error());
    assert!(doc.tables.is_empty());
    assert!(doc.image_files.is_empty());

    let json = doc.to_json(undoc::JsonFormat::Compact).unwrap();
    assert!(json.contains("\"error\":\"Unsupported format: .xyz\""));
    assert!(!json.contains("extraction_error"));
}

#[test]
fn test_tiny_image_rejected_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ImageValidator::new(dir.path());
    assert!(!validator.validate_and_save(b"\x89PNG\r", "tiny.png"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_failed_stage_keeps_partial_output() {
    let options = ParseOptions::new().text_only();
    let images = ImageValidator::from_options(&options);
    let detector = StructuredTextDetector::new();
    let ctx = ExtractContext::new(&options, &images, &detector);

    let doc = HalfExtractor.extract(b"", &ctx);
    assert_eq!(doc.full_text, "partial");
    assert_eq!(doc.metadata.tables_found, 1);
    assert_eq!(doc.metadata.extraction_error.as_deref(), Some("Missing document part: word/stage2.xml"));
}

#[test]
fn test_reset_image_dir() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("images");
    let parser = parser_in(&dir);

    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("stale.png"), b"old").unwrap();
    parser.reset_image_dir().unwrap();

    assert!(dir.is_dir());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
}

#[test]
fn test_json_roundtrip_of_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let doc = parser_in(dir.path()).parse(b"k;v\na;1\n", "pairs.csv");

    let json = doc.to_json(undoc::JsonFormat::Pretty).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["metadata"]["delimiter_detected"], ";");
    assert_eq!(value["metadata"]["tables_found"], 1);
    assert!(value["metadata"].get("pages").is_none());

    let back: ParsedDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
}

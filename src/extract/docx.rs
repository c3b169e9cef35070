//! DOCX extraction.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{ooxml, ExtractContext, Extractor};
use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::model::ParsedDocument;
use crate::parser::clean_text;

const DOCUMENT_PART: &str = "word/document.xml";
const MEDIA_PREFIX: &str = "word/media/";

/// Extracts Word documents from their `word/document.xml` part.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl Extractor for DocxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn method(&self) -> &'static str {
        "docx xml"
    }

    fn extract_into(
        &self,
        data: &[u8],
        ctx: &ExtractContext<'_>,
        doc: &mut ParsedDocument,
    ) -> Result<()> {
        let mut package = ooxml::open(data)?;

        let mut body = DocxBody::default();
        let parsed = ooxml::read_part(&mut package, DOCUMENT_PART)
            .and_then(|xml| read_body(&xml, &mut body));
        if let Err(e) = &parsed {
            log::warn!("docx: body incomplete: {}", e);
            doc.metadata.record_error(format!("document body: {}", e));
        }

        for rows in body.tables {
            doc.push_rows(rows);
        }

        if ctx.options.detect_tables {
            let mut builder = ctx.detector.table_builder();
            for paragraph in &body.paragraphs {
                builder.push_line(paragraph);
            }
            doc.tables.extend(builder.finish());
        }

        doc.full_text = clean_text(&body.paragraphs.join("\n"));

        if ctx.options.extract_images {
            let saved = ooxml::save_media(&mut package, MEDIA_PREFIX, "docx", ctx.images);
            doc.image_files.extend(saved);
        }

        Ok(())
    }
}

/// Text content of a document body.
#[derive(Debug, Default)]
struct DocxBody {
    /// Body paragraphs outside tables, in order
    paragraphs: Vec<String>,
    /// Top-level tables; nested tables are folded into their cell
    tables: Vec<Vec<Vec<String>>>,
}

/// Walk `document.xml`, appending to `body` as elements close.
///
/// On malformed XML everything read up to the error stays in `body`.
fn read_body(xml: &str, body: &mut DocxBody) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut table_depth = 0usize;
    let mut para_depth = 0usize;
    let mut fallback_depth = 0usize;
    let mut in_text = false;

    let mut paragraph = String::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Fallback" => fallback_depth += 1,
                _ if fallback_depth > 0 => {}
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        rows.clear();
                    }
                }
                b"tr" if table_depth == 1 => row.clear(),
                b"tc" if table_depth == 1 => cell.clear(),
                b"p" => para_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if fallback_depth == 0 => {
                let target = if table_depth > 0 { &mut cell } else { &mut paragraph };
                match e.local_name().as_ref() {
                    b"tab" => target.push('\t'),
                    b"br" | b"cr" => target.push('\n'),
                    // `<w:p/>` is a blank paragraph
                    b"p" if table_depth == 0 && para_depth == 0 => {
                        body.paragraphs.push(String::new())
                    }
                    b"p" => target.push('\n'),
                    _ => {}
                }
            }
            Event::Text(e) if in_text && fallback_depth == 0 => {
                let text = e.unescape()?;
                if table_depth > 0 {
                    cell.push_str(&text);
                } else {
                    paragraph.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Fallback" => fallback_depth = fallback_depth.saturating_sub(1),
                _ if fallback_depth > 0 => {}
                b"t" => in_text = false,
                b"p" => {
                    para_depth = para_depth.saturating_sub(1);
                    if table_depth > 0 {
                        cell.push('\n');
                    } else if para_depth == 0 {
                        body.paragraphs.push(std::mem::take(&mut paragraph).trim().to_string());
                    } else {
                        paragraph.push('\n');
                    }
                }
                b"tc" if table_depth == 1 => row.push(cell.trim().to_string()),
                b"tr" if table_depth == 1 => rows.push(std::mem::take(&mut row)),
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 && !rows.is_empty() {
                        body.tables.push(std::mem::take(&mut rows));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

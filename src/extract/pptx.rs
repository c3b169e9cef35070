//! PPTX extraction.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{ooxml, ExtractContext, Extractor};
use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::model::ParsedDocument;
use crate::parser::clean_text;

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const MEDIA_PREFIX: &str = "ppt/media/";

/// Extracts PowerPoint presentations slide by slide.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxExtractor;

impl Extractor for PptxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pptx
    }

    fn method(&self) -> &'static str {
        "pptx xml"
    }

    fn extract_into(
        &self,
        data: &[u8],
        ctx: &ExtractContext<'_>,
        doc: &mut ParsedDocument,
    ) -> Result<()> {
        let mut package = ooxml::open(data)?;

        let slides = slide_parts(&ooxml::part_names(&package));
        doc.metadata.slides = Some(slides.len() as u32);

        let mut text = String::new();
        for (index, (_, part)) in slides.iter().enumerate() {
            let slide_num = index + 1;
            let mut slide = SlideContent::default();
            let parsed =
                ooxml::read_part(&mut package, part).and_then(|xml| read_slide(&xml, &mut slide));
            if let Err(e) = parsed {
                log::warn!("pptx: slide {} incomplete: {}", slide_num, e);
                doc.metadata.record_error(format!("slide {}: {}", slide_num, e));
            }

            text.push_str(&format!("--- SLIDE {} ---\n", slide_num));
            for shape in &slide.shapes {
                text.push_str(shape);
                text.push('\n');
            }
            text.push_str(&format!("--- END SLIDE {} ---\n\n", slide_num));

            for rows in slide.tables {
                doc.push_rows(rows);
            }
        }
        doc.full_text = clean_text(&text);

        if ctx.options.extract_images {
            let saved = ooxml::save_media(&mut package, MEDIA_PREFIX, "pptx", ctx.images);
            doc.image_files.extend(saved);
        }

        Ok(())
    }
}

/// Slide parts `ppt/slides/slideN.xml` with their number, ordered by N.
fn slide_parts(names: &[String]) -> Vec<(u32, String)> {
    let mut slides: Vec<(u32, String)> = names
        .iter()
        .filter_map(|name| {
            let number = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?;
            number.parse::<u32>().ok().map(|n| (n, name.clone()))
        })
        .collect();
    slides.sort_by_key(|(n, _)| *n);
    slides
}

/// Text and tables of one slide.
#[derive(Debug, Default)]
struct SlideContent {
    /// Text of each text body outside tables; paragraphs joined by newline
    shapes: Vec<String>,
    /// Native tables in slide order
    tables: Vec<Vec<Vec<String>>>,
}

fn read_slide(xml: &str, slide: &mut SlideContent) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut in_table = false;
    let mut in_text = false;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => {
                    in_table = true;
                    rows.clear();
                }
                b"tr" if in_table => row.clear(),
                b"tc" if in_table => cell.clear(),
                b"txBody" if !in_table => paragraphs.clear(),
                b"p" => paragraph.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"br" => paragraph.push('\n'),
            Event::Text(e) if in_text => paragraph.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if in_table => {
                    cell.push_str(&paragraph);
                    cell.push('\n');
                }
                b"p" => paragraphs.push(std::mem::take(&mut paragraph)),
                b"txBody" if !in_table => {
                    let text = paragraphs.join("\n");
                    if !text.trim().is_empty() {
                        slide.shapes.push(text);
                    }
                }
                b"tc" if in_table => row.push(cell.trim().to_string()),
                b"tr" if in_table => rows.push(std::mem::take(&mut row)),
                b"tbl" => {
                    in_table = false;
                    if !rows.is_empty() {
                        slide.tables.push(std::mem::take(&mut rows));
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

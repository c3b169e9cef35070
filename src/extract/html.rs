//! HTML extraction.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use scraper::{ElementRef, Html, Node, Selector};

use super::{ExtractContext, Extractor};
use crate::detect::DocumentFormat;
use crate::error::{Error, Result};
use crate::media::sanitize_extension;
use crate::model::ParsedDocument;
use crate::parser::clean_text;

/// Elements whose text never reaches the document.
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Extracts HTML pages through a parsed DOM.
///
/// Only images embedded as base64 data URIs are recovered; remote and
/// relative `src` values are never fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl Extractor for HtmlExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Html
    }

    fn method(&self) -> &'static str {
        "html dom"
    }

    fn extract_into(
        &self,
        data: &[u8],
        ctx: &ExtractContext<'_>,
        doc: &mut ParsedDocument,
    ) -> Result<()> {
        let source = String::from_utf8_lossy(data);
        let html = Html::parse_document(&source);

        doc.full_text = clean_text(&visible_text(&html).join("\n"));

        for rows in tables(&html)? {
            doc.push_rows(rows);
        }

        if ctx.options.extract_images {
            for (index, image) in embedded_images(&html)?.into_iter().enumerate() {
                let target = format!("html_img_{}.{}", index + 1, image.extension);
                if let Ok(path) = ctx.images.save(&image.data, &target) {
                    doc.image_files.push(path);
                }
            }
        }

        Ok(())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Html(format!("selector {:?}: {}", css, e)))
}

/// Trimmed, non-empty text nodes in document order, skipping script-like
/// elements.
fn visible_text(html: &Html) -> Vec<String> {
    let mut parts = Vec::new();
    let mut stack = vec![html.tree.root()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
                continue;
            }
            Node::Element(element) if SKIPPED_ELEMENTS.contains(&element.name()) => continue,
            _ => {}
        }
        stack.extend(node.children().rev());
    }

    parts
}

/// Rows of every `<table>`, one vector of cell texts per `<tr>`.
///
/// Rows without `td`/`th` cells are skipped; tables without rows are
/// dropped.
fn tables(html: &Html) -> Result<Vec<Vec<Vec<String>>>> {
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td, th")?;

    let tables = html
        .select(&table_sel)
        .map(|table| {
            table
                .select(&row_sel)
                .map(|row| row.select(&cell_sel).map(|cell| cell_text(&cell)).collect())
                .filter(|cells: &Vec<String>| !cells.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|rows| !rows.is_empty())
        .collect();

    Ok(tables)
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    clean_text(&cell.text().collect::<Vec<_>>().join(" "))
}

/// An image decoded from a data URI.
#[derive(Debug)]
struct EmbeddedImage {
    extension: String,
    data: Vec<u8>,
}

/// Decode every `<img>` whose `src` is a base64 image data URI.
fn embedded_images(html: &Html) -> Result<Vec<EmbeddedImage>> {
    let img_sel = selector("img[src]")?;

    let mut images = Vec::new();
    let mut remote = 0usize;
    for img in html.select(&img_sel) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        match parse_data_uri(src) {
            Some(image) => images.push(image),
            None if src.trim_start().starts_with("data:") => {
                log::debug!("html: undecodable data URI ({} chars)", src.len());
            }
            None => remote += 1,
        }
    }

    if remote > 0 {
        log::debug!("html: {} remote or relative image(s) not fetched", remote);
    }
    Ok(images)
}

/// Parse `data:image/<subtype>;base64,<payload>`.
fn parse_data_uri(src: &str) -> Option<EmbeddedImage> {
    let rest = src.trim().strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;

    let mut params = header.split(';');
    let mime = params.next()?.trim().to_ascii_lowercase();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return None;
    }

    let subtype = mime.strip_prefix("image/")?;
    let extension = match sanitize_extension(subtype).as_str() {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        "" => return None,
        other => other.to_string(),
    };

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let data = STANDARD.decode(payload).ok()?;
    Some(EmbeddedImage { extension, data })
}

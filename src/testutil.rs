//! Fixture builders shared by unit tests.

use std::io::{Cursor, Write};

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};

/// A PNG whose pixels do not compress away, so it clears the byte minimum.
pub(crate) fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) as u8;
        Rgb([v, v.wrapping_add(85), v.wrapping_mul(3)])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Build a ZIP archive from `(name, bytes)` entries, in order.
pub(crate) fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Wrap body XML in a minimal `word/document.xml`.
pub(crate) fn docx_document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

/// A body paragraph with one run.
pub(crate) fn docx_paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

/// A native table; each cell holds one paragraph.
pub(crate) fn docx_table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in *row {
            xml.push_str("<w:tc>");
            xml.push_str(&docx_paragraph(cell));
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// A slide with one text shape per entry of `shapes` (paragraphs separated
/// by `\n`) and an optional native table.
pub(crate) fn pptx_slide_xml(shapes: &[&str], table: Option<&[&[&str]]>) -> String {
    let mut tree = String::new();
    for shape in shapes {
        tree.push_str("<p:sp><p:txBody>");
        for para in shape.split('\n') {
            tree.push_str(&format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", para));
        }
        tree.push_str("</p:txBody></p:sp>");
    }
    if let Some(rows) = table {
        tree.push_str("<p:graphicFrame><a:graphic><a:graphicData><a:tbl>");
        for row in rows {
            tree.push_str("<a:tr>");
            for cell in *row {
                tree.push_str(&format!(
                    "<a:tc><a:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody></a:tc>",
                    cell
                ));
            }
            tree.push_str("</a:tr>");
        }
        tree.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
        tree
    )
}

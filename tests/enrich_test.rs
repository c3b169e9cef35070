//! Image description enrichment over real parsed documents.

use std::cell::Cell;
use std::io::{Cursor, Write};
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use undoc::error::{Error, Result};
use undoc::{
    enrich, parse_document_with_options, ImageDescriber, JsonFormat, OfflineDescriber,
    ParseOptions,
};

/// Fails on every second image.
struct Flaky {
    calls: Cell<usize>,
}

impl ImageDescriber for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    fn describe(&self, path: &Path) -> Result<String> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call % 2 == 1 {
            return Err(Error::Describe("service unavailable".to_string()));
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(format!("picture {}", name))
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 9 % 256) as u8, (y * 3 % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn deck_with_images(count: usize) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    writer.start_file("ppt/slides/slide1.xml", options).unwrap();
    writer
        .write_all(
            b"<p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
              xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
              <p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>Gallery</a:t></a:r></a:p>\
              </p:txBody></p:sp></p:spTree></p:cSld></p:sld>",
        )
        .unwrap();
    for i in 1..=count {
        writer.start_file(format!("ppt/media/image{}.png", i), options).unwrap();
        writer.write_all(&png(20 + i as u32, 20)).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_descriptions_align_with_images() {
    let dir = tempfile::tempdir().unwrap();
    let options = ParseOptions::new().with_image_dir(dir.path());
    let doc = parse_document_with_options(&deck_with_images(3), "gallery.pptx", options);
    assert_eq!(doc.image_files.len(), 3);

    let describer = Flaky { calls: Cell::new(0) };
    let enriched = enrich(doc, &describer);

    assert_eq!(enriched.image_descriptions.len(), enriched.document.image_files.len());
    for (description, path) in enriched
        .image_descriptions
        .iter()
        .zip(&enriched.document.image_files)
    {
        assert_eq!(&description.path, path);
    }
    assert_eq!(enriched.image_descriptions[0].description, "picture pptx_image1.png");
    assert_eq!(enriched.image_descriptions[1].description, undoc::enrich::DESCRIBE_ERROR_TEXT);
    assert_eq!(enriched.image_descriptions[2].description, "picture pptx_image3.png");
}

#[test]
fn test_offline_enrichment_json() {
    let dir = tempfile::tempdir().unwrap();
    let options = ParseOptions::new().with_image_dir(dir.path());
    let doc = parse_document_with_options(&deck_with_images(1), "gallery.pptx", options);

    let enriched = enrich(doc, &OfflineDescriber::new());
    let json = enriched.to_json(JsonFormat::Pretty).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["full_text"].as_str().unwrap().contains("Gallery"));
    assert_eq!(value["image_files"].as_array().unwrap().len(), 1);
    assert_eq!(
        value["image_descriptions"][0]["description"],
        "PNG image (21x20, landscape orientation) extracted from document"
    );
}

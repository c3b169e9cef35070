//! PDF extraction.
//!
//! Two independent passes over the same bytes: the text layer (page text,
//! Info metadata, layout tables) and the image layer (image XObjects).
//! Each pass loads its own document, so a failure in one never prevents
//! the other.

use std::io::Read;
use std::path::PathBuf;

use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::{ExtractContext, Extractor};
use crate::detect::{is_pdf_bytes, DocumentFormat};
use crate::error::{Error, Result};
use crate::media::ImageValidator;
use crate::model::{Metadata, ParsedDocument};
use crate::parser::{clean_text, SpanExtractor, TableDetector};

/// Extracts PDF text, layout tables and embedded raster images.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn method(&self) -> &'static str {
        "lopdf layout + lopdf xobjects"
    }

    fn extract_into(
        &self,
        data: &[u8],
        ctx: &ExtractContext<'_>,
        doc: &mut ParsedDocument,
    ) -> Result<()> {
        if !is_pdf_bytes(data) {
            log::debug!("pdf: no %PDF- header, trying to load anyway");
        }

        if let Err(e) = extract_text_layer(data, ctx, doc) {
            log::warn!("pdf: text layer failed: {}", e);
            doc.metadata.record_error(format!("text layer: {}", e));
        }

        if ctx.options.extract_images {
            match extract_image_layer(data, ctx.images) {
                Ok(mut images) => {
                    images.sort();
                    doc.image_files.extend(images);
                }
                Err(e) => {
                    log::warn!("pdf: image layer failed: {}", e);
                    doc.metadata.record_error(format!("image layer: {}", e));
                }
            }
        }

        Ok(())
    }
}

fn load(data: &[u8]) -> Result<LopdfDocument> {
    Ok(LopdfDocument::load_mem(data)?)
}

/// Pass 1: metadata, marked page text and layout tables.
fn extract_text_layer(data: &[u8], ctx: &ExtractContext<'_>, doc: &mut ParsedDocument) -> Result<()> {
    let pdf = load(data)?;
    let pages = pdf.get_pages();
    doc.metadata.pages = Some(pages.len() as u32);
    read_info(&pdf, &mut doc.metadata);

    let spans = SpanExtractor::new(&pdf);
    let detector = TableDetector::with_config(ctx.options.table_detector.clone());

    for &page_num in pages.keys() {
        let text = match pdf.extract_text(&[page_num]) {
            Ok(text) => clean_text(&text),
            Err(e) => {
                log::warn!("pdf: page {} text failed: {}", page_num, e);
                doc.metadata.record_error(format!("page {}: {}", page_num, e));
                String::new()
            }
        };
        doc.full_text.push_str(&format!(
            "--- PAGE {n} ---\n{text}\n--- END PAGE {n} ---\n\n",
            n = page_num,
            text = text
        ));

        if !ctx.options.detect_tables {
            continue;
        }
        match spans.extract_page_spans(page_num) {
            Ok(page_spans) => {
                let (tables, _) = detector.detect(page_spans);
                for table in &tables {
                    doc.push_rows(detector.to_rows(table));
                }
            }
            Err(e) => log::debug!("pdf: no spans for page {}: {}", page_num, e),
        }
    }

    Ok(())
}

/// Copy the Info dictionary entries into `metadata`.
fn read_info(pdf: &LopdfDocument, metadata: &mut Metadata) {
    let info = match pdf.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => pdf.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(info) = info else {
        return;
    };

    metadata.title = get_string_from_dict(info, b"Title");
    metadata.author = get_string_from_dict(info, b"Author");
    metadata.subject = get_string_from_dict(info, b"Subject");
    metadata.creator = get_string_from_dict(info, b"Creator");
    metadata.producer = get_string_from_dict(info, b"Producer");
    metadata.created = get_string_from_dict(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
    metadata.modified = get_string_from_dict(info, b"ModDate").and_then(|d| parse_pdf_date(&d));
}

/// Pass 2: every image XObject on every page, validated and saved.
fn extract_image_layer(data: &[u8], images: &ImageValidator) -> Result<Vec<PathBuf>> {
    let pdf = load(data)?;
    let mut saved = Vec::new();

    for (page_num, page_id) in pdf.get_pages() {
        for (index, xobject_id) in page_image_ids(&pdf, page_id).into_iter().enumerate() {
            let target = format!("img_p{}_{}", page_num, index + 1);
            match save_xobject(&pdf, xobject_id, images, &target) {
                Ok(path) => saved.push(path),
                Err(e) => log::debug!("pdf: skipped {}: {}", target, e),
            }
        }
    }

    Ok(saved)
}

/// Resolve an object that may be given inline or by reference.
fn resolve<'a>(pdf: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => pdf.get_object(*id).ok(),
        other => Some(other),
    }
}

/// The page's Resources, inherited from the page tree when absent.
fn page_resources(pdf: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = pdf.get_dictionary(page_id).ok();
    // Bounded walk; malformed trees can loop.
    for _ in 0..32 {
        let dict = node?;
        if let Some(res) = dict
            .get(b"Resources")
            .ok()
            .and_then(|res| resolve(pdf, res))
            .and_then(|res| res.as_dict().ok())
        {
            return Some(res);
        }
        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .ok()
            .and_then(|parent| pdf.get_dictionary(parent).ok());
    }
    None
}

/// Object ids of the image XObjects in a page's resources.
fn page_image_ids(pdf: &LopdfDocument, page_id: ObjectId) -> Vec<ObjectId> {
    let xobjects = page_resources(pdf, page_id)
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|xobj| resolve(pdf, xobj))
        .and_then(|xobj| xobj.as_dict().ok());

    let Some(xobjects) = xobjects else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| obj.as_reference().ok())
        .filter(|id| {
            pdf.get_object(*id)
                .and_then(Object::as_stream)
                .map(|s| matches!(s.dict.get(b"Subtype").and_then(Object::as_name_str), Ok("Image")))
                .unwrap_or(false)
        })
        .collect()
}

fn save_xobject(
    pdf: &LopdfDocument,
    id: ObjectId,
    images: &ImageValidator,
    target: &str,
) -> Result<PathBuf> {
    let stream = pdf.get_object(id)?.as_stream()?;
    let filters = stream_filters(&stream.dict);

    match filters.last().map(String::as_str) {
        Some("DCTDecode") if filters.len() == 1 => images.save(&stream.content, target),
        None | Some("FlateDecode") if filters.len() <= 1 => {
            let samples = raw_samples(stream, &filters)?;
            let image = rebuild_raster(pdf, &stream.dict, samples)?;
            images.save_decoded(image, target)
        }
        _ => {
            log::debug!("pdf: offering {} with filters {:?} as-is", target, filters);
            images.save(&stream.content, target)
        }
    }
}

fn stream_filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|f| f.as_name_str().ok())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Uncompressed sample bytes of an unfiltered or Flate image stream.
fn raw_samples(stream: &Stream, filters: &[String]) -> Result<Vec<u8>> {
    if filters.is_empty() {
        return Ok(stream.content.clone());
    }
    let predictor = stream
        .dict
        .get(b"DecodeParms")
        .and_then(Object::as_dict)
        .and_then(|parms| parms.get(b"Predictor"))
        .and_then(Object::as_i64)
        .unwrap_or(1);
    if predictor > 1 {
        return Err(Error::Image(format!("flate predictor {} is not supported", predictor)));
    }
    let mut decoder = ZlibDecoder::new(stream.content.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::Image(format!("flate decompression failed: {}", e)))?;
    Ok(decompressed)
}

/// Build a raster from 8-bit samples using the stream's size and color space.
fn rebuild_raster(pdf: &LopdfDocument, dict: &Dictionary, samples: Vec<u8>) -> Result<DynamicImage> {
    let dimension = |key: &[u8]| -> Result<u32> {
        dict.get(key)
            .and_then(Object::as_i64)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| Error::Image(format!("missing {}", String::from_utf8_lossy(key))))
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;

    let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    if bits != 8 {
        return Err(Error::Image(format!("{} bits per component", bits)));
    }

    let components = color_components(pdf, dict)?;
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(components))
        .ok_or_else(|| Error::Image(format!("{}x{} image is too large", width, height)))?;
    if samples.len() < expected {
        return Err(Error::Image(format!(
            "{} sample bytes for {}x{}x{}",
            samples.len(),
            width,
            height,
            components
        )));
    }
    let mut samples = samples;
    samples.truncate(expected);

    let image = match components {
        1 => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        _ => RgbImage::from_raw(width, height, cmyk_to_rgb(&samples)).map(DynamicImage::ImageRgb8),
    };
    image.ok_or_else(|| Error::Image("sample buffer does not match dimensions".to_string()))
}

/// Components per pixel of the image color space: 1, 3 or 4.
fn color_components(pdf: &LopdfDocument, dict: &Dictionary) -> Result<usize> {
    let space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| resolve(pdf, cs))
        .ok_or_else(|| Error::Image("missing color space".to_string()))?;

    let (family, params) = match space {
        Object::Name(name) => (String::from_utf8_lossy(name).into_owned(), None),
        Object::Array(arr) => match arr.first().and_then(|f| f.as_name_str().ok()) {
            Some(family) => (family.to_string(), arr.get(1)),
            None => return Err(Error::Image("empty color space array".to_string())),
        },
        _ => return Err(Error::Image("unreadable color space".to_string())),
    };

    match family.as_str() {
        "DeviceGray" | "CalGray" | "G" => Ok(1),
        "DeviceRGB" | "CalRGB" | "RGB" => Ok(3),
        "DeviceCMYK" | "CMYK" => Ok(4),
        "ICCBased" => {
            let n = params
                .and_then(|p| resolve(pdf, p))
                .and_then(|p| p.as_stream().ok())
                .and_then(|s| s.dict.get(b"N").and_then(Object::as_i64).ok());
            match n {
                Some(1) => Ok(1),
                Some(3) => Ok(3),
                Some(4) => Ok(4),
                other => Err(Error::Image(format!("ICC profile with N = {:?}", other))),
            }
        }
        other => Err(Error::Image(format!("unsupported color space {}", other))),
    }
}

/// Convert CMYK bytes to RGB.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for chunk in cmyk.chunks_exact(4) {
        let k = 1.0 - f32::from(chunk[3]) / 255.0;
        for &c in &chunk[..3] {
            rgb.push((255.0 * (1.0 - f32::from(c) / 255.0) * k) as u8);
        }
    }
    rgb
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            // UTF-16BE with BOM, the PDF text string form for Unicode
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                Some(
                    String::from_utf8(bytes.clone())
                        .unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect()),
                )
            }
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    // At minimum we need YYYY
    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use lopdf::StringFormat;

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 1);
        assert!(parse_pdf_date("D:20").is_none());
    }

    #[test]
    fn test_get_string_utf16_and_latin1() {
        let mut dict = Dictionary::new();
        dict.set(
            "Title",
            Object::String(vec![0xFE, 0xFF, 0x00, b'H', 0x00, b'i'], StringFormat::Hexadecimal),
        );
        dict.set("Author", Object::String(vec![b'J', 0xF6, b'r', b'g'], StringFormat::Literal));
        assert_eq!(get_string_from_dict(&dict, b"Title").as_deref(), Some("Hi"));
        assert_eq!(get_string_from_dict(&dict, b"Author").as_deref(), Some("Jörg"));
        assert_eq!(get_string_from_dict(&dict, b"Subject"), None);
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0, 255, 255, 255, 255]), vec![255, 255, 255, 0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[0, 255, 255, 0]), vec![255, 0, 0]);
    }

    #[test]
    fn test_stream_filters() {
        let mut dict = Dictionary::new();
        assert!(stream_filters(&dict).is_empty());
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        assert_eq!(stream_filters(&dict), vec!["DCTDecode"]);
        dict.set(
            "Filter",
            Object::Array(vec![
                Object::Name(b"FlateDecode".to_vec()),
                Object::Name(b"DCTDecode".to_vec()),
            ]),
        );
        assert_eq!(stream_filters(&dict), vec!["FlateDecode", "DCTDecode"]);
    }

    #[test]
    fn test_rebuild_gray_raster() {
        let pdf = LopdfDocument::with_version("1.5");
        let mut dict = Dictionary::new();
        dict.set("Width", Object::Integer(12));
        dict.set("Height", Object::Integer(11));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));

        let image = rebuild_raster(&pdf, &dict, vec![128; 12 * 11 + 5]).unwrap();
        assert_eq!((image.width(), image.height()), (12, 11));

        assert!(rebuild_raster(&pdf, &dict, vec![0; 10]).is_err());
        dict.set("BitsPerComponent", Object::Integer(1));
        assert!(rebuild_raster(&pdf, &dict, vec![0; 200]).is_err());
    }

    #[test]
    fn test_rebuild_raster_with_huge_dimensions() {
        let pdf = LopdfDocument::with_version("1.5");
        let mut dict = Dictionary::new();
        dict.set("Width", Object::Integer(u32::MAX as i64));
        dict.set("Height", Object::Integer(u32::MAX as i64));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));

        assert!(matches!(rebuild_raster(&pdf, &dict, vec![0; 64]), Err(Error::Image(_))));
    }

    #[test]
    fn test_not_a_pdf_records_both_layers() {
        let options = crate::parser::ParseOptions::default();
        let images = ImageValidator::from_options(&options);
        let detector = crate::parser::StructuredTextDetector::new();
        let doc = PdfExtractor.extract(b"hello", &ExtractContext::new(&options, &images, &detector));

        let error = doc.metadata.extraction_error.unwrap();
        assert!(error.contains("text layer"));
        assert!(error.contains("image layer"));
        assert!(doc.full_text.is_empty());
        assert!(doc.image_files.is_empty());
    }
}

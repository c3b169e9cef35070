//! Image description enrichment.
//!
//! A post-pass over a parsed document that attaches one description to
//! each extracted image. The describer is pluggable; failures never abort
//! the pass and are replaced by a placeholder, so the description list
//! always lines up with `image_files` index for index.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{to_json_string, JsonFormat, ParsedDocument};

/// Placeholder used when the describer fails.
pub const DESCRIBE_ERROR_TEXT: &str = "Error analyzing this image.";

/// Placeholder used when the describer returns nothing.
pub const EMPTY_DESCRIPTION_TEXT: &str = "Could not get a description.";

/// Produces a natural-language description of an image file.
pub trait ImageDescriber {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Describe the image at `path`.
    fn describe(&self, path: &Path) -> Result<String>;
}

/// A description attached to one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescription {
    /// The described image
    pub path: PathBuf,
    /// Description or placeholder text
    pub description: String,
}

/// A parsed document together with its image descriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDocument {
    /// The parsed document
    #[serde(flatten)]
    pub document: ParsedDocument,
    /// One entry per `document.image_files`, in the same order
    pub image_descriptions: Vec<ImageDescription>,
}

impl EnrichedDocument {
    /// Serialize to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        to_json_string(self, format)
    }
}

/// Describe each path in order, one record per path.
pub fn describe_images<D>(paths: &[PathBuf], describer: &D) -> Vec<ImageDescription>
where
    D: ImageDescriber + ?Sized,
{
    paths
        .iter()
        .map(|path| {
            let description = match describer.describe(path) {
                Ok(text) if text.trim().is_empty() => EMPTY_DESCRIPTION_TEXT.to_string(),
                Ok(text) => text,
                Err(e) => {
                    log::warn!("{}: cannot describe {}: {}", describer.name(), path.display(), e);
                    DESCRIBE_ERROR_TEXT.to_string()
                }
            };
            ImageDescription {
                path: path.clone(),
                description,
            }
        })
        .collect()
}

/// Attach descriptions for every image of `document`.
pub fn enrich<D>(document: ParsedDocument, describer: &D) -> EnrichedDocument
where
    D: ImageDescriber + ?Sized,
{
    let image_descriptions = describe_images(&document.image_files, describer);
    EnrichedDocument {
        document,
        image_descriptions,
    }
}

/// Describes images from their own headers, without any model.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDescriber;

impl OfflineDescriber {
    /// Create a new offline describer.
    pub fn new() -> Self {
        Self
    }

    fn inspect(path: &Path) -> Result<String> {
        let data = fs::read(path)?;
        let format = image::guess_format(&data)?;
        let image = image::load_from_memory_with_format(&data, format)?;
        let (width, height) = (image.width(), image.height());

        let orientation = if width > height {
            "landscape"
        } else if height > width {
            "portrait"
        } else {
            "square"
        };
        let format_name = format!("{:?}", format).to_ascii_uppercase();

        Ok(format!(
            "{} image ({}x{}, {} orientation) extracted from document",
            format_name, width, height, orientation
        ))
    }
}

impl ImageDescriber for OfflineDescriber {
    fn name(&self) -> &str {
        "offline"
    }

    fn describe(&self, path: &Path) -> Result<String> {
        Ok(Self::inspect(path).unwrap_or_else(|e| {
            log::debug!("offline: {}: {}", path.display(), e);
            "Image file extracted from document".to_string()
        }))
    }
}

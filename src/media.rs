//! Image validation and normalization.
//!
//! Every image an extractor finds goes through [`ImageValidator`] before
//! its path can appear in a document. Candidates that are too small, do not
//! decode, or are below the minimum dimensions are rejected; the rest are
//! converted to 8-bit RGB and written as PNG into the image directory.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::{Error, Result};
use crate::parser::ParseOptions;

/// Validates image candidates and persists the survivors.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    dir: PathBuf,
    min_bytes: usize,
    min_dimension: u32,
}

impl ImageValidator {
    /// Create a validator writing into `dir` with default thresholds.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let defaults = ParseOptions::default();
        Self {
            dir: dir.as_ref().to_path_buf(),
            min_bytes: defaults.min_image_bytes,
            min_dimension: defaults.min_image_dimension,
        }
    }

    /// Create a validator from parse options.
    pub fn from_options(options: &ParseOptions) -> Self {
        Self {
            dir: options.image_dir.clone(),
            min_bytes: options.min_image_bytes,
            min_dimension: options.min_image_dimension,
        }
    }

    /// Set the minimum candidate size in bytes.
    pub fn with_min_bytes(mut self, bytes: usize) -> Self {
        self.min_bytes = bytes;
        self
    }

    /// The directory images are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the image directory if it does not exist.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Remove the image directory with its contents and recreate it.
    pub fn reset_dir(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        self.ensure_dir()
    }

    /// Validate `data` and save it under the sanitized name of `target`.
    ///
    /// Returns whether the image was kept.
    pub fn validate_and_save(&self, data: &[u8], target: impl AsRef<Path>) -> bool {
        match self.save(data, target) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("image: {}", e);
                false
            }
        }
    }

    /// Like [`validate_and_save`](Self::validate_and_save), but returns the
    /// written path or the reason for rejection.
    pub fn save(&self, data: &[u8], target: impl AsRef<Path>) -> Result<PathBuf> {
        if data.len() < self.min_bytes {
            return Err(Error::Rejected(format!(
                "{} bytes is below the {} byte minimum",
                data.len(),
                self.min_bytes
            )));
        }

        let image = image::load_from_memory(data)
            .map_err(|e| Error::Rejected(format!("undecodable image: {}", e)))?;
        self.save_decoded(image, target)
    }

    /// Save an already decoded image, applying the dimension check and
    /// RGB normalization.
    pub fn save_decoded(&self, image: DynamicImage, target: impl AsRef<Path>) -> Result<PathBuf> {
        let (width, height) = image.dimensions();
        if width < self.min_dimension || height < self.min_dimension {
            return Err(Error::Rejected(format!(
                "{}x{} is below the {}px minimum",
                width, height, self.min_dimension
            )));
        }

        let path = self.target_path(target.as_ref());
        let rgb = image.to_rgb8();
        rgb.save_with_format(&path, ImageFormat::Png)?;

        log::debug!("image: saved {}x{} to {}", width, height, path.display());
        Ok(path)
    }

    /// Where a candidate named `target` would be written.
    pub fn target_path(&self, target: &Path) -> PathBuf {
        self.dir.join(format!("{}.png", sanitize_stem(target)))
    }
}

/// Reduce `target` to a safe file stem: only the last path component is
/// kept and anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn sanitize_stem(target: &Path) -> String {
    let stem = target
        .file_name()
        .map(|name| {
            let name = Path::new(name);
            name.file_stem().unwrap_or(name.as_os_str()).to_string_lossy().into_owned()
        })
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// Restrict an extension token to ASCII alphanumerics, lowercased.
pub fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::noisy_png;
    use image::ImageBuffer;

    #[test]
    fn test_rejects_tiny_blob() {
        let dir = tempfile::tempdir().unwrap();
        let validator = ImageValidator::new(dir.path());
        assert!(!validator.validate_and_save(&[0x89, b'P', b'N', b'G', 0x0D], "img.png"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rejects_undecodable_blob() {
        let dir = tempfile::tempdir().unwrap();
        let validator = ImageValidator::new(dir.path());
        let garbage = vec![0xABu8; 4096];
        let err = validator.save(&garbage, "junk.png").unwrap_err();
        assert!(matches!(err, Error::Rejected(_)));
    }

    #[test]
    fn test_rejects_small_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let validator = ImageValidator::new(dir.path()).with_min_bytes(0);
        assert!(!validator.validate_and_save(&noisy_png(9, 40), "narrow.png"));
        assert!(validator.validate_and_save(&noisy_png(10, 10), "square.png"));
    }

    #[test]
    fn test_saves_rgb_png() {
        let dir = tempfile::tempdir().unwrap();
        let validator = ImageValidator::new(dir.path());

        let gray = DynamicImage::ImageLuma8(ImageBuffer::from_fn(32, 16, |x, y| {
            image::Luma([(x * 8 + y) as u8])
        }));
        let path = validator.save_decoded(gray, "photo.jpeg").unwrap();

        assert_eq!(path, dir.path().join("photo.png"));
        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.dimensions(), (32, 16));
        assert_eq!(reloaded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_target_is_confined_to_dir() {
        let validator = ImageValidator::new("/srv/images");
        assert_eq!(
            validator.target_path(Path::new("../../etc/evil.sh")),
            PathBuf::from("/srv/images/evil.png")
        );
        assert_eq!(
            validator.target_path(Path::new("word/media/image 1.emf")),
            PathBuf::from("/srv/images/image_1.png")
        );
        assert_eq!(
            validator.target_path(Path::new("..")),
            PathBuf::from("/srv/images/image.png")
        );
    }

    #[test]
    fn test_sanitize_extension() {
        assert_eq!(sanitize_extension("svg+xml"), "svgxml");
        assert_eq!(sanitize_extension("PNG"), "png");
        assert_eq!(sanitize_extension("../x"), "x");
    }

    #[test]
    fn test_reset_dir_clears_previous_images() {
        let root = tempfile::tempdir().unwrap();
        let validator = ImageValidator::new(root.path().join("scratch"));
        validator.ensure_dir().unwrap();
        assert!(validator.validate_and_save(&noisy_png(64, 64), "old.png"));

        validator.reset_dir().unwrap();
        assert!(validator.dir().exists());
        assert_eq!(fs::read_dir(validator.dir()).unwrap().count(), 0);
    }
}

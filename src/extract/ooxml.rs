//! Shared helpers for Office Open XML containers (DOCX, PPTX).

use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::detect::is_zip_bytes;
use crate::error::{Error, Result};
use crate::media::{sanitize_extension, ImageValidator};

/// An opened OOXML package.
pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open the ZIP container.
pub(crate) fn open(data: &[u8]) -> Result<Package<'_>> {
    if !is_zip_bytes(data) {
        log::debug!("ooxml: no local file header, trying the central directory anyway");
    }
    Ok(ZipArchive::new(Cursor::new(data))?)
}

/// Read one part as UTF-8 text.
pub(crate) fn read_part(package: &mut Package<'_>, name: &str) -> Result<String> {
    let mut entry = package.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => Error::MissingPart(name.to_string()),
        other => Error::from(other),
    })?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Part names in archive order.
pub(crate) fn part_names(package: &Package<'_>) -> Vec<String> {
    package.file_names().map(String::from).collect()
}

/// Validate and save every file under `prefix`, in archive order.
///
/// Each image is named `{name_prefix}_{stem}`. When that name is already
/// taken by an earlier part (`image1.png` and `image1.jpeg`) the source
/// extension is appended, then a counter. Entries that cannot be read or
/// fail validation are skipped.
pub(crate) fn save_media(
    package: &mut Package<'_>,
    prefix: &str,
    name_prefix: &str,
    images: &ImageValidator,
) -> Vec<PathBuf> {
    let mut saved = Vec::new();
    let mut used = HashSet::new();

    for index in 0..package.len() {
        let mut entry = match package.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("ooxml: skipping entry {}: {}", index, e);
                continue;
            }
        };
        if entry.is_dir() || !entry.name().starts_with(prefix) {
            continue;
        }

        let name = entry.name().to_string();
        let mut bytes = Vec::new();
        if let Err(e) = entry.read_to_end(&mut bytes) {
            log::debug!("ooxml: cannot read {}: {}", name, e);
            continue;
        }

        let part = Path::new(&name);
        let stem = part
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = part
            .extension()
            .map(|e| sanitize_extension(&e.to_string_lossy()))
            .unwrap_or_default();
        log::debug!("ooxml: media candidate {} ({} bytes, .{})", name, bytes.len(), ext);

        let target = unique_target(images, &used, &format!("{}_{}", name_prefix, stem), &ext);
        if let Ok(path) = images.save(&bytes, &target) {
            used.insert(path.clone());
            saved.push(path);
        }
    }

    saved
}

/// First of `base`, `base_ext`, `base_ext_2`, ... whose saved path is free.
fn unique_target(images: &ImageValidator, used: &HashSet<PathBuf>, base: &str, ext: &str) -> String {
    let free = |candidate: &str| !used.contains(&images.target_path(Path::new(candidate)));
    if free(base) {
        return base.to_string();
    }
    let with_ext = if ext.is_empty() {
        base.to_string()
    } else {
        format!("{}_{}", base, ext)
    };
    if free(&with_ext) {
        return with_ext;
    }
    (2u32..)
        .map(|n| format!("{}_{}", with_ext, n))
        .find(|candidate| free(candidate))
        .unwrap_or(with_ext)
}

//! Finding wallpaper images on disk.

use log::{debug, info};
use std::path::{Path, PathBuf};

/// File extensions treated as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// `preferred` if it is a directory, otherwise `fallback`.
pub fn resolve_directory(preferred: &Path, fallback: &Path) -> PathBuf {
    if preferred.is_dir() {
        preferred.to_path_buf()
    } else {
        info!(
            "{} is not a directory, using {}",
            preferred.display(),
            fallback.display()
        );
        fallback.to_path_buf()
    }
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Image files directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    debug!("{} image(s) in {}", images.len(), dir.display());
    Ok(images)
}

/// The file name shown under the carousel.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

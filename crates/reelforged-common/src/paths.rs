//! Path utilities for locating image assets.
//!
//! Each topic may carry its own still image next to a shared default image.
//! Lookups try every supported extension in a fixed order.

use crate::Topic;
use std::path::{Path, PathBuf};

/// List of supported image file extensions, in lookup order.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// File stem of the shared fallback image.
pub const DEFAULT_IMAGE_STEM: &str = "default";

/// Check if a path has an image file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use reelforged_common::paths::is_image_file;
///
/// assert!(is_image_file(Path::new("leo.JPG")));
/// assert!(!is_image_file(Path::new("leo.mp3")));
/// ```
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get the list of image file extensions.
pub fn image_extensions() -> &'static [&'static str] {
    IMAGE_EXTENSIONS
}

/// Find an existing image named `stem` in `dir`.
pub fn find_image(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|candidate| candidate.is_file())
}

/// Find the image dedicated to `topic`, e.g. `images/aries.jpg`.
pub fn find_topic_image(dir: &Path, topic: Topic) -> Option<PathBuf> {
    find_image(dir, topic.slug())
}

/// Find the shared default image, e.g. `images/default.jpg`.
pub fn find_default_image(dir: &Path) -> Option<PathBuf> {
    find_image(dir, DEFAULT_IMAGE_STEM)
}

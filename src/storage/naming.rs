//! Blob name generation
//!
//! Auto-generated names always embed a timestamp so names are never reused
//! implicitly, and extensions are normalized to a known image set.

use chrono::Local;
use std::path::Path;
use url::Url;

/// Extensions stored as-is; anything else becomes the default
const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];
const DEFAULT_EXTENSION: &str = "png";

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn is_http(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// File name portion of a source URL or path, if any
fn basename(source: &str) -> Option<String> {
    if is_http(source) {
        let parsed = Url::parse(source).ok()?;
        parsed
            .path_segments()?
            .last()
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
    } else {
        Path::new(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// Lowercased extension of the source, defaulting to `png` when absent or
/// outside the allowed set
pub fn normalized_extension(source: &str) -> String {
    let ext = basename(source)
        .and_then(|name| {
            name.rsplit_once('.')
                .map(|(_, ext)| ext.to_lowercase())
        })
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        ext
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

/// Keep blob names safe for path-addressed stores
fn slug(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// Auto-generate a blob name for a single upload:
/// `{stem}_{timestamp}.{ext}`
pub fn auto_blob_name(source: &str) -> String {
    let stem = basename(source)
        .map(|name| {
            name.rsplit_once('.')
                .map(|(stem, _)| stem.to_string())
                .unwrap_or(name)
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "image".to_string());

    format!(
        "{}_{}.{}",
        slug(&stem),
        timestamp(),
        normalized_extension(source)
    )
}

/// Blob name for one entry of a batch upload:
/// `{prefix}_{index:03}_{timestamp}.{ext}`
pub fn batch_blob_name(prefix: &str, index: usize, source: &str) -> String {
    format!(
        "{}_{:03}_{}.{}",
        slug(prefix),
        index,
        timestamp(),
        normalized_extension(source)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_uppercase_extension_is_normalized() {
        let name = auto_blob_name("http://site.com/pic.JPG");
        let pattern = Regex::new(r"^pic_\d{8}_\d{6}\.jpg$").unwrap();
        assert!(pattern.is_match(&name), "unexpected name: {name}");
    }

    #[test]
    fn test_unknown_extension_falls_back_to_png() {
        assert_eq!(normalized_extension("http://site.com/vector.svg"), "png");
        assert_eq!(normalized_extension("http://site.com/noext"), "png");
    }

    #[test]
    fn test_local_path_extension() {
        assert_eq!(normalized_extension("/tmp/photo.webp"), "webp");
    }

    #[test]
    fn test_batch_name_shape() {
        let name = batch_blob_name("holiday", 7, "https://x.com/beach.png");
        let pattern = Regex::new(r"^holiday_007_\d{8}_\d{6}\.png$").unwrap();
        assert!(pattern.is_match(&name), "unexpected name: {name}");
    }

    #[test]
    fn test_sourceless_name_gets_placeholder_stem() {
        let name = auto_blob_name("https://x.com/");
        assert!(name.starts_with("image_"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_unsafe_characters_are_slugged() {
        let name = auto_blob_name("http://site.com/weird name.jpg");
        assert!(!name.contains(' '));
        assert!(!name.contains('%'));
        assert!(name.ends_with(".jpg"));
    }
}

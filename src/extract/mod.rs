//! Image-URL extraction from raw HTML and script text
//!
//! Search result pages embed image URLs in several shapes: quoted JSON-ish
//! fields, escaped script literals, and plain hrefs. This module unions a set
//! of independent textual patterns over the page, normalizes the matches, and
//! filters out everything that is not a plausible content-image URL. It is
//! the boundary that keeps garbage URLs away from callers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Quoted-field patterns, each capturing the URL in group 1
static QUOTED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#""ou":"([^"]*)""#).unwrap(),
        Regex::new(r#""data-src":"([^"]*)""#).unwrap(),
        Regex::new(r#""src":"([^"]*)""#).unwrap(),
    ]
});

/// Bare image URLs sitting directly in the text
static RAW_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^"\s,\\]+\.(?:jpg|jpeg|png|gif|webp)[^"\s,\\]*"#).unwrap()
});

/// Recognized image file extensions
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Domain and path markers for thumbnails, avatars, and other non-content images
const SKIP_MARKERS: [&str; 9] = [
    "gstatic.com",
    "ggpht.com",
    "googleusercontent.com",
    "encrypted-tbn",
    "logo",
    "icon",
    "avatar",
    "profile",
    "thumbnail",
];

// Anything shorter than "https://x.y/a.jpg" cannot be a real image URL.
const MIN_URL_LEN: usize = 17;
const MAX_URL_LEN: usize = 2000;

/// Extract plausible content-image URLs from HTML or script text.
///
/// Matches from all patterns are unioned, normalized, and filtered;
/// duplicates are dropped while preserving first-discovery order. The result
/// is truncated to `max_candidates` to bound downstream probe cost.
pub fn extract_image_urls(text: &str, max_candidates: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    let mut consider = |candidate: &str| {
        let url = normalize(candidate);
        if !is_acceptable(&url) {
            return;
        }
        if seen.insert(url.clone()) {
            ordered.push(url);
        }
    };

    for pattern in QUOTED_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                consider(m.as_str());
            }
        }
    }

    for m in RAW_URL_PATTERN.find_iter(text) {
        consider(m.as_str());
    }

    ordered.truncate(max_candidates);
    ordered
}

/// Undo the escaping search pages apply to embedded URLs
fn normalize(raw: &str) -> String {
    let unescaped = raw
        .replace("\\u003d", "=")
        .replace("\\u0026", "&")
        .replace("\\/", "/");

    match urlencoding::decode(&unescaped) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => unescaped,
    }
}

/// Accept only well-formed absolute http(s) URLs that plausibly point at a
/// content image
fn is_acceptable(candidate: &str) -> bool {
    if candidate.len() < MIN_URL_LEN || candidate.len() > MAX_URL_LEN {
        return false;
    }

    let lower = candidate.to_lowercase();
    if !lower.starts_with("http") {
        return false;
    }
    if !IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        return false;
    }
    if SKIP_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return false;
    }

    match Url::parse(candidate) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_ou_field_is_extracted() {
        let html = r#"junk "ou":"https://x.com/a.jpg" more junk"#;
        let urls = extract_image_urls(html, 10);
        assert!(urls.contains(&"https://x.com/a.jpg".to_string()));
    }

    #[test]
    fn test_thumbnail_cdn_only_yields_empty() {
        let html = r#""src":"https://encrypted-tbn0.gstatic.com/images?q=tbn:abc.jpg""#;
        assert!(extract_image_urls(html, 10).is_empty());
    }

    #[test]
    fn test_escaped_sequences_are_normalized() {
        let html = r#""ou":"https:\/\/example.org\/pics\/cat.jpg?w=800&h=600""#;
        let urls = extract_image_urls(html, 10);
        assert_eq!(urls, vec!["https://example.org/pics/cat.jpg?w=800&h=600"]);
    }

    #[test]
    fn test_raw_urls_in_text_are_found() {
        let html = "prefix https://photos.example.net/large/dog.png?x=1 suffix";
        let urls = extract_image_urls(html, 10);
        assert_eq!(urls, vec!["https://photos.example.net/large/dog.png?x=1"]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#""ou":"https://x.com/a.jpg" https://photos.example.net/b.png"#;
        let first = extract_image_urls(html, 10);
        let second = extract_image_urls(html, 10);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let html = r#""ou":"https://x.com/a.jpg" "src":"https://x.com/a.jpg" https://x.com/a.jpg"#;
        let urls = extract_image_urls(html, 10);
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn test_truncation_to_max_candidates() {
        let html = (0..30)
            .map(|i| format!(r#""ou":"https://pics.example.com/photo_{i}.jpg""#))
            .collect::<Vec<_>>()
            .join(" ");
        let urls = extract_image_urls(&html, 5);
        assert_eq!(urls.len(), 5);
        // Discovery order is preserved under truncation
        assert_eq!(urls[0], "https://pics.example.com/photo_0.jpg");
    }

    #[test]
    fn test_overlong_urls_are_rejected() {
        let long_tail = "x".repeat(2100);
        let html = format!(r#""ou":"https://example.com/{long_tail}.jpg""#);
        assert!(extract_image_urls(&html, 10).is_empty());
    }

    #[test]
    fn test_non_absolute_and_non_image_urls_are_rejected() {
        let html = r#""src":"/relative/a.jpg" "ou":"https://example.com/page.html""#;
        assert!(extract_image_urls(html, 10).is_empty());
    }

    #[test]
    fn test_avatar_and_logo_paths_are_rejected() {
        let html = r#""ou":"https://cdn.example.com/avatar/user123.png" "ou":"https://cdn.example.com/logo.jpg""#;
        assert!(extract_image_urls(html, 10).is_empty());
    }
}

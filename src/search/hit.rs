//! Search hit type shared by both strategies

use serde::{Deserialize, Serialize};

/// Outcome discriminator carried by every result entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// A single image search hit.
///
/// Both the browser strategy and the HTTP fallback produce this exact shape,
/// so callers never need to know which strategy answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHit {
    /// Direct image URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Human-readable title (alt text, filename, or a placeholder)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Originating site, or "Unknown"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Success/failure discriminator
    pub status: Status,
    /// Human-readable cause, present on failed entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageHit {
    /// A successful hit
    pub fn found(
        url: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            source: source.into(),
            status: Status::Success,
            error: None,
        }
    }

    /// A failed entry carrying only the cause
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            title: String::new(),
            source: String::new(),
            status: Status::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_hit_serializes_without_empty_fields() {
        let hit = ImageHit::failed("boom");
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_found_hit_shape() {
        let hit = ImageHit::found("https://x.com/a.jpg", "a.jpg", "https://x.com");
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["url"], "https://x.com/a.jpg");
        assert!(json.get("error").is_none());
    }
}

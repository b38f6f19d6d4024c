//! Operation outcome types

use crate::search::Status;
use serde::{Deserialize, Serialize};

/// Result of one upload attempt. Immutable once returned; one outcome is
/// produced per input source, independent of sibling failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn success(
        source: impl Into<String>,
        filename: impl Into<String>,
        blob_url: impl Into<String>,
        size_bytes: usize,
    ) -> Self {
        let filename = filename.into();
        let blob_url = blob_url.into();
        let markdown = format!("![{filename}]({blob_url})");
        Self {
            source: source.into(),
            blob_url: Some(blob_url),
            markdown: Some(markdown),
            filename: Some(filename),
            size_bytes: Some(size_bytes as u64),
            status: Status::Success,
            error: None,
        }
    }

    pub fn failure(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            blob_url: None,
            markdown: None,
            filename: None,
            size_bytes: None,
            status: Status::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Result of a blob download to a local path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn success(filename: impl Into<String>, download_path: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            download_path: Some(download_path.into()),
            status: Status::Success,
            error: None,
        }
    }

    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            download_path: None,
            status: Status::Failed,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_outcome_builds_markdown() {
        let outcome = UploadOutcome::success(
            "https://x.com/a.jpg",
            "a_20240101_120000.jpg",
            "http://blobs.local/c/a_20240101_120000.jpg?se=1&sig=abc",
            42,
        );
        assert!(outcome.is_success());
        assert_eq!(
            outcome.markdown.as_deref(),
            Some("![a_20240101_120000.jpg](http://blobs.local/c/a_20240101_120000.jpg?se=1&sig=abc)")
        );
    }

    #[test]
    fn test_failure_outcome_omits_blob_fields() {
        let outcome = UploadOutcome::failure("src", "nope");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("blob_url").is_none());
        assert!(json.get("size_bytes").is_none());
    }
}

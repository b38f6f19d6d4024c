//! Filesystem-backed blob store with HMAC-signed retrieval URLs

use super::blob::BlobStore;
use crate::config::StorageSettings;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::PathBuf;
use tracing::info;

type HmacSha256 = Hmac<Sha256>;

/// Blob store writing into `{root}/{container}` and issuing time-limited
/// URLs signed with HMAC-SHA256 over the container, blob name, and expiry.
pub struct FsBlobStore {
    container_dir: PathBuf,
    container: String,
    base_url: String,
    signing_key: Vec<u8>,
}

impl FsBlobStore {
    pub fn new(settings: &StorageSettings) -> ServiceResult<Self> {
        let container_dir = PathBuf::from(&settings.root).join(&settings.container);
        std::fs::create_dir_all(&container_dir)?;

        Ok(Self {
            container_dir,
            container: settings.container.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            signing_key: settings.signing_key.as_bytes().to_vec(),
        })
    }

    fn blob_path(&self, name: &str) -> ServiceResult<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ServiceError::Validation(format!(
                "invalid blob name: {name:?}"
            )));
        }
        Ok(self.container_dir.join(name))
    }

    fn sign(&self, name: &str, expiry: i64) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.signing_key).expect("HMAC accepts any key length");
        mac.update(format!("{}\n{}\n{}", self.container, name, expiry).as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Check a previously issued signed URL: the token must match and the
    /// expiry must still be in the future.
    pub fn verify_signed_url(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(name) = parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .map(|s| s.to_string())
        else {
            return false;
        };

        let mut expiry = None;
        let mut sig = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "se" => expiry = value.parse::<i64>().ok(),
                "sig" => sig = Some(value.into_owned()),
                _ => {}
            }
        }
        let (Some(expiry), Some(sig)) = (expiry, sig) else {
            return false;
        };

        expiry > Utc::now().timestamp() && self.sign(&name, expiry) == sig
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put_blob(&self, name: &str, bytes: Vec<u8>) -> ServiceResult<String> {
        let path = self.blob_path(name)?;
        tokio::fs::write(&path, &bytes).await?;
        info!(name = %name, size = bytes.len(), "stored blob");
        Ok(format!("{}/{}/{}", self.base_url, self.container, name))
    }

    async fn get_blob(&self, name: &str) -> ServiceResult<Vec<u8>> {
        let path = self.blob_path(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => {
                    ServiceError::Storage(format!("blob not found: {name}"))
                }
                _ => ServiceError::Storage(err.to_string()),
            })
    }

    async fn signed_url(&self, name: &str, ttl: Duration) -> ServiceResult<String> {
        self.blob_path(name)?;
        let expiry = (Utc::now() + ttl).timestamp();
        let token = self.sign(name, expiry);
        Ok(format!(
            "{}/{}/{}?se={}&sig={}",
            self.base_url, self.container, name, expiry, token
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(root: &std::path::Path) -> FsBlobStore {
        let settings = StorageSettings {
            root: root.to_string_lossy().into_owned(),
            container: "test-container".to_string(),
            base_url: "http://blobs.local".to_string(),
            signing_key: "secret".to_string(),
            signed_url_ttl_hours: 24,
        };
        FsBlobStore::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let bytes = b"not really a png".to_vec();

        let url = store.put_blob("pic.png", bytes.clone()).await.unwrap();
        assert_eq!(url, "http://blobs.local/test-container/pic.png");
        assert_eq!(store.get_blob("pic.png").await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_signed_url_embeds_expiry_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.put_blob("pic.png", vec![1, 2, 3]).await.unwrap();

        let url = store
            .signed_url("pic.png", Duration::hours(24))
            .await
            .unwrap();
        assert!(url.contains("se="));
        assert!(url.contains("sig="));
        assert!(store.verify_signed_url(&url));
    }

    #[tokio::test]
    async fn test_expired_or_tampered_urls_fail_verification() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let expired = store
            .signed_url("pic.png", Duration::hours(-1))
            .await
            .unwrap();
        assert!(!store.verify_signed_url(&expired));

        let url = store
            .signed_url("pic.png", Duration::hours(1))
            .await
            .unwrap();
        let tampered = url.replace("pic.png", "other.png");
        assert!(!store.verify_signed_url(&tampered));
    }

    #[tokio::test]
    async fn test_traversal_blob_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let err = store
            .put_blob("../escape.png", vec![1])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn test_missing_blob_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let err = store.get_blob("absent.png").await.unwrap_err();
        assert_eq!(err.kind(), "storage");
    }
}

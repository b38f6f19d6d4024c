//! Tool operations and dispatch
//!
//! The operation surface is a closed set of variants with typed argument and
//! result schemas; dispatch is an explicit match, not a name-to-function
//! lookup. Every operation resolves to a structured value; failures are
//! returned as data, never raised.

use super::outcome::{DownloadOutcome, UploadOutcome};
use crate::config::Settings;
use crate::error::{ServiceError, ServiceResult};
use crate::network::HttpClient;
use crate::search::{ImageHit, ImageSearch};
use crate::storage::{naming, policy, BlobStore};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

fn default_max_results() -> usize {
    10
}

fn default_blob_prefix() -> String {
    "image".to_string()
}

/// Arguments for an image search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchImagesArgs {
    pub search_query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

/// Arguments for a batch save of sources into the blob store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveImagesArgs {
    pub image_sources: Vec<String>,
    #[serde(default = "default_blob_prefix")]
    pub blob_prefix: String,
}

/// Arguments for a single upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadImageArgs {
    pub image_source: String,
    #[serde(default)]
    pub blob_name: Option<String>,
}

/// Arguments for a blob download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadImageArgs {
    pub filename: String,
    pub download_path: String,
}

/// The closed set of tool operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum ToolRequest {
    SearchImages(SearchImagesArgs),
    SaveImages(SaveImagesArgs),
    UploadImage(UploadImageArgs),
    DownloadImage(DownloadImageArgs),
}

/// Typed operation results; serialized bare, matching the tool protocol
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    Hits(Vec<ImageHit>),
    Uploads(Vec<UploadOutcome>),
    Upload(UploadOutcome),
    Download(DownloadOutcome),
}

fn is_http(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// The image service: search plus blob-store pass-through
pub struct ImageService {
    search: ImageSearch,
    client: HttpClient,
    store: Arc<dyn BlobStore>,
    signed_url_ttl: Duration,
}

impl ImageService {
    pub fn new(
        settings: &Settings,
        client: HttpClient,
        search: ImageSearch,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            search,
            client,
            store,
            signed_url_ttl: Duration::hours(settings.storage.signed_url_ttl_hours),
        }
    }

    /// Route a request to its operation
    pub async fn dispatch(&self, request: ToolRequest) -> ToolResponse {
        match request {
            ToolRequest::SearchImages(args) => ToolResponse::Hits(
                self.search_images(&args.search_query, args.max_results)
                    .await,
            ),
            ToolRequest::SaveImages(args) => ToolResponse::Uploads(
                self.save_images(&args.image_sources, &args.blob_prefix)
                    .await,
            ),
            ToolRequest::UploadImage(args) => ToolResponse::Upload(
                self.upload_image(&args.image_source, args.blob_name).await,
            ),
            ToolRequest::DownloadImage(args) => ToolResponse::Download(
                self.download_image(&args.filename, &args.download_path)
                    .await,
            ),
        }
    }

    /// Search for images; always a non-empty list of structured entries
    pub async fn search_images(&self, query: &str, max_results: usize) -> Vec<ImageHit> {
        info!(query = %query, "starting image search");
        let hits = self.search.search(query, max_results).await;
        if hits.is_empty() {
            return vec![ImageHit::failed("No images found for the search query")];
        }
        let successful = hits.iter().filter(|h| h.is_success()).count();
        info!(query = %query, successful, "image search completed");
        hits
    }

    /// Upload every source, one outcome per input
    pub async fn save_images(&self, sources: &[String], prefix: &str) -> Vec<UploadOutcome> {
        if sources.is_empty() {
            return vec![UploadOutcome::failure("", "No image sources provided")];
        }

        let mut outcomes = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let blob_name = naming::batch_blob_name(prefix, index + 1, source);
            outcomes.push(self.upload_one(source, blob_name).await);
        }

        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            total = sources.len(),
            successful,
            failed = sources.len() - successful,
            "batch upload finished"
        );
        outcomes
    }

    /// Upload one source, auto-naming the blob when no name was given
    pub async fn upload_image(&self, source: &str, blob_name: Option<String>) -> UploadOutcome {
        let blob_name = blob_name.unwrap_or_else(|| naming::auto_blob_name(source));
        self.upload_one(source, blob_name).await
    }

    async fn upload_one(&self, source: &str, blob_name: String) -> UploadOutcome {
        match self.try_upload(source, &blob_name).await {
            Ok(outcome) => {
                info!(source = %source, blob = %blob_name, "uploaded image");
                outcome
            }
            Err(err) => {
                warn!(source = %source, kind = err.kind(), error = %err, "upload failed");
                UploadOutcome::failure(source, err.to_string())
            }
        }
    }

    async fn try_upload(&self, source: &str, blob_name: &str) -> ServiceResult<UploadOutcome> {
        let bytes = if is_http(source) {
            if policy::is_royalty_free(source) {
                return Err(ServiceError::Policy(
                    "Royalty-free image sources are not allowed".into(),
                ));
            }

            let download = self.client.download(source).await?;
            let content_type = download.content_type.unwrap_or_default();
            if !content_type.starts_with("image/") {
                return Err(ServiceError::Validation(format!(
                    "Not an image (got {content_type})"
                )));
            }
            download.bytes
        } else {
            let path = Path::new(source);
            if !path.exists() {
                return Err(ServiceError::Validation(
                    "File not found and not a valid URL".into(),
                ));
            }
            tokio::fs::read(path).await?
        };

        let size = bytes.len();
        self.store.put_blob(blob_name, bytes).await?;
        let signed = self.store.signed_url(blob_name, self.signed_url_ttl).await?;

        Ok(UploadOutcome::success(source, blob_name, signed, size))
    }

    /// Download a blob to a local path
    pub async fn download_image(&self, filename: &str, download_path: &str) -> DownloadOutcome {
        match self.try_download(filename, download_path).await {
            Ok(()) => {
                info!(filename = %filename, path = %download_path, "downloaded blob");
                DownloadOutcome::success(filename, download_path)
            }
            Err(err) => {
                error!(filename = %filename, kind = err.kind(), error = %err, "download failed");
                DownloadOutcome::failure(filename, err.to_string())
            }
        }
    }

    async fn try_download(&self, filename: &str, download_path: &str) -> ServiceResult<()> {
        let bytes = self.store.get_blob(filename).await?;
        if let Some(parent) = Path::new(download_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(download_path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchSettings;
    use crate::search::HttpImageSearch;
    use crate::storage::MemoryBlobStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_with(server: &MockServer, store: Arc<MemoryBlobStore>) -> ImageService {
        let settings = Settings::default();
        let client = HttpClient::new().unwrap();
        let fallback = HttpImageSearch::new(client.clone(), &SearchSettings::default())
            .with_base_url(server.uri());
        let search = ImageSearch::with_strategies(None, fallback);
        ImageService::new(&settings, client, search, store)
    }

    #[tokio::test]
    async fn test_royalty_free_source_is_rejected_without_fetch() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryBlobStore::new());
        let service = service_with(&server, store.clone());

        let outcome = service
            .upload_image("https://images.unsplash.com/photo.jpg", None)
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.error.as_deref().unwrap().contains("Royalty-free"));
        assert_eq!(store.put_count(), 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_image_content_type_rejected_before_store() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryBlobStore::new());
        let service = service_with(&server, store.clone());

        let outcome = service
            .upload_image(&format!("{}/page.jpg", server.uri()), None)
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.error.as_deref().unwrap().contains("Not an image"));
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_upload_returns_markdown_and_size() {
        let server = MockServer::start().await;
        let payload = vec![0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a];
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(payload.clone()),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryBlobStore::new());
        let service = service_with(&server, store.clone());

        let outcome = service
            .upload_image(&format!("{}/cat.png", server.uri()), None)
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.size_bytes, Some(payload.len() as u64));
        let filename = outcome.filename.clone().unwrap();
        assert!(filename.ends_with(".png"));
        assert!(outcome.markdown.as_deref().unwrap().starts_with("!["));
        // Bytes actually landed in the store unchanged
        assert_eq!(store.get_blob(&filename).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_batch_save_is_sibling_independent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryBlobStore::new());
        let service = service_with(&server, store.clone());

        let sources = vec![
            format!("{}/good.jpg", server.uri()),
            "https://cdn.pixabay.com/blocked.jpg".to_string(),
            "/no/such/file.png".to_string(),
        ];
        let outcomes = service.save_images(&sources, "batch").await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(!outcomes[2].is_success());
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_fails_fast() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryBlobStore::new());
        let service = service_with(&server, store);

        let outcomes = service.save_images(&[], "batch").await;
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].is_success());
    }

    #[tokio::test]
    async fn test_download_writes_stored_bytes() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryBlobStore::new());
        store
            .put_blob("saved.png", vec![9u8, 8, 7])
            .await
            .unwrap();
        let service = service_with(&server, store);

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out.png");
        let outcome = service
            .download_image("saved.png", target.to_str().unwrap())
            .await;

        assert_eq!(outcome.status, crate::search::Status::Success);
        assert_eq!(std::fs::read(&target).unwrap(), vec![9u8, 8, 7]);
    }

    #[tokio::test]
    async fn test_download_of_missing_blob_fails_structurally() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryBlobStore::new());
        let service = service_with(&server, store);

        let outcome = service.download_image("ghost.png", "/tmp/ghost.png").await;
        assert_eq!(outcome.status, crate::search::Status::Failed);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_variant() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryBlobStore::new());
        let service = service_with(&server, store);

        let request: ToolRequest = serde_json::from_value(serde_json::json!({
            "tool": "search_images",
            "arguments": {"search_query": "  "}
        }))
        .unwrap();

        match service.dispatch(request).await {
            ToolResponse::Hits(hits) => {
                assert_eq!(hits.len(), 1);
                assert!(!hits[0].is_success());
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let request: ToolRequest = serde_json::from_value(serde_json::json!({
            "tool": "save_images",
            "arguments": {"image_sources": ["https://x.com/a.jpg"]}
        }))
        .unwrap();

        match request {
            ToolRequest::SaveImages(args) => assert_eq!(args.blob_prefix, "image"),
            other => panic!("unexpected request: {other:?}"),
        }
    }
}

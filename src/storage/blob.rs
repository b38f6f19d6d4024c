//! Blob store trait and the in-memory implementation

use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Object storage addressed by blob name.
///
/// The production gateway (a cloud object store) lives behind this trait;
/// the crate ships a filesystem-backed store and an in-memory one.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `name`, returning the blob's plain URL
    async fn put_blob(&self, name: &str, bytes: Vec<u8>) -> ServiceResult<String>;

    /// Fetch the bytes stored under `name`
    async fn get_blob(&self, name: &str) -> ServiceResult<Vec<u8>>;

    /// A retrieval URL granting read access until `ttl` from now
    async fn signed_url(&self, name: &str, ttl: Duration) -> ServiceResult<String>;
}

/// HashMap-backed store for tests and dry runs
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful put operations, for asserting that rejected
    /// uploads never reached the store
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_blob(&self, name: &str, bytes: Vec<u8>) -> ServiceResult<String> {
        self.blobs
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(format!("memory://{name}"))
    }

    async fn get_blob(&self, name: &str) -> ServiceResult<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::Storage(format!("blob not found: {name}")))
    }

    async fn signed_url(&self, name: &str, ttl: Duration) -> ServiceResult<String> {
        let expiry = (Utc::now() + ttl).timestamp();
        Ok(format!("memory://{name}?se={expiry}"))
    }
}

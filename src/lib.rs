//! ImgScout-RS: an image search and blob-storage tool service written in Rust
//!
//! Exposes a small set of tool-style operations (image search, upload,
//! download) intended to be driven by an LLM agent. Search combines a
//! headless-browser scraper with an HTTP pattern-extraction fallback.

pub mod config;
pub mod error;
pub mod extract;
pub mod network;
pub mod search;
pub mod service;
pub mod storage;

pub use config::Settings;
pub use error::ServiceError;
pub use search::{ImageHit, ImageSearch};
pub use service::{ImageService, ToolRequest, ToolResponse};
pub use storage::BlobStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for page fetches in seconds
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Timeout for candidate-URL probes in seconds
pub const PROBE_TIMEOUT: u64 = 10;

/// Hard cap on results per search call
pub const MAX_RESULTS: usize = 20;

//! HTTP networking module
//!
//! Provides the outbound HTTP client used for search-page fetches,
//! candidate-URL probes, and image downloads.

mod client;
mod user_agent;

pub use client::{Download, HttpClient};
pub use user_agent::generate_user_agent;

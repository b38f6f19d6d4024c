//! Search orchestration
//!
//! Owns the strategy routing policy: the browser strategy runs first when a
//! Chromium binary was found at construction time, and anything short of a
//! successful browser result falls through to the HTTP strategy. Both
//! strategies produce the same hit shape, so callers stay strategy-agnostic.

use crate::config::Settings;
use crate::network::{generate_user_agent, HttpClient};
use crate::search::browser::{chromium_available, BrowserSearcher};
use crate::search::fallback::HttpImageSearch;
use crate::search::hit::ImageHit;
use crate::MAX_RESULTS;
use tracing::{info, warn};

/// One of the interchangeable search algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Browser,
    Http,
}

/// Composed image search with fallback
pub struct ImageSearch {
    browser: Option<BrowserSearcher>,
    fallback: HttpImageSearch,
}

impl ImageSearch {
    /// Build the orchestrator, performing the browser capability check once.
    pub fn new(client: HttpClient, settings: &Settings) -> Self {
        let browser = if chromium_available(&settings.browser) {
            info!("browser strategy available");
            Some(BrowserSearcher::new(
                settings.browser.clone(),
                settings.search.lang.clone(),
                generate_user_agent(),
            ))
        } else {
            info!("no usable browser found, searches will use the HTTP strategy");
            None
        };

        let fallback = HttpImageSearch::new(client, &settings.search);
        Self { browser, fallback }
    }

    /// Construct from already-built strategies (used by tests)
    pub fn with_strategies(browser: Option<BrowserSearcher>, fallback: HttpImageSearch) -> Self {
        Self { browser, fallback }
    }

    /// The strategies this instance can route to, in preference order
    pub fn strategies(&self) -> Vec<Strategy> {
        let mut available = Vec::new();
        if self.browser.is_some() {
            available.push(Strategy::Browser);
        }
        available.push(Strategy::Http);
        available
    }

    /// Search for images, never raising: every outcome is a list of hits in
    /// which failures are structured entries.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<ImageHit> {
        if query.trim().is_empty() {
            return vec![ImageHit::failed("Search query cannot be empty")];
        }

        // Cap requested volume to bound scraping cost.
        let max_results = max_results.min(MAX_RESULTS);

        if let Some(browser) = &self.browser {
            match browser.search(query, max_results).await {
                Ok(hits) if hits.iter().any(ImageHit::is_success) => return hits,
                Ok(_) => {
                    info!("browser strategy returned no results, trying HTTP strategy");
                }
                Err(err) => {
                    warn!(
                        kind = err.kind(),
                        error = %err,
                        "browser strategy failed, trying HTTP strategy"
                    );
                }
            }
        }

        match self.fallback.search(query, max_results).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => vec![ImageHit::failed("No images found for the search query")],
            Err(err) => vec![ImageHit::failed(err.to_string())],
        }
    }
}

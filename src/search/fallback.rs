//! HTTP image search fallback
//!
//! Fetches the search results page directly and mines it for image URLs with
//! the pattern extractor, then HEAD-probes each candidate to confirm it
//! serves an image. Candidates whose probe fails outright are still reported,
//! marked unvalidated: recall is preferred over precision here, and the
//! marker keeps the trade-off visible to callers.

use crate::config::SearchSettings;
use crate::error::{ServiceError, ServiceResult};
use crate::extract::extract_image_urls;
use crate::network::HttpClient;
use crate::search::hit::ImageHit;
use tracing::{debug, info};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.google.com";

/// Pattern-extraction search over plain HTTP
pub struct HttpImageSearch {
    client: HttpClient,
    base_url: String,
    lang: String,
    candidate_multiplier: usize,
}

impl HttpImageSearch {
    pub fn new(client: HttpClient, settings: &SearchSettings) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: settings.lang.clone(),
            candidate_multiplier: settings.candidate_multiplier.max(1),
        }
    }

    /// Point the searcher at a different host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Both known results-page URL formats, tried in order
    fn search_urls(&self, query: &str) -> [String; 2] {
        let encoded = urlencoding::encode(query);
        [
            format!(
                "{}/search?q={}&udm=2&hl={}",
                self.base_url, encoded, self.lang
            ),
            format!(
                "{}/search?q={}&tbm=isch&hl={}",
                self.base_url, encoded, self.lang
            ),
        ]
    }

    /// Run the fallback search.
    ///
    /// Transport failures on the first URL template roll over to the second;
    /// only when both fail does the strategy itself fail.
    pub async fn search(&self, query: &str, max_results: usize) -> ServiceResult<Vec<ImageHit>> {
        let mut body = None;
        for search_url in self.search_urls(query) {
            match self.client.fetch_page(&search_url).await {
                Ok(text) => {
                    info!(url = %search_url, "fetched search results page");
                    body = Some(text);
                    break;
                }
                Err(err) => {
                    debug!(url = %search_url, error = %err, "search page fetch failed");
                }
            }
        }

        let body = body.ok_or_else(|| {
            ServiceError::Transport("failed to fetch results page with any URL format".into())
        })?;

        let candidates = extract_image_urls(&body, max_results * self.candidate_multiplier);
        debug!(count = candidates.len(), "extracted candidate URLs");

        let mut hits = Vec::new();
        for candidate in candidates {
            if hits.len() >= max_results {
                break;
            }

            match self.client.probe(&candidate).await {
                Ok(Some(content_type)) if content_type.starts_with("image/") => {
                    let (title, source) = describe(&candidate, false);
                    hits.push(ImageHit::found(candidate, title, source));
                }
                Ok(_) => {
                    // Confirmed non-image (or typeless) response: drop it.
                    debug!(url = %candidate, "candidate did not serve an image");
                }
                Err(err) => {
                    // Probe itself failed; keep the candidate but say so.
                    debug!(url = %candidate, error = %err, "probe failed, keeping unvalidated");
                    let (title, source) = describe(&candidate, true);
                    hits.push(ImageHit::found(candidate, title, source));
                }
            }
        }

        info!(query = %query, count = hits.len(), "http fallback search finished");
        Ok(hits)
    }
}

/// Title and source site for a candidate URL
fn describe(candidate: &str, unvalidated: bool) -> (String, String) {
    let parsed = Url::parse(candidate).ok();
    let domain = parsed
        .as_ref()
        .and_then(|u| {
            u.host_str().map(|host| match u.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        })
        .unwrap_or_else(|| "unknown".to_string());

    let filename = parsed
        .as_ref()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last())
                .filter(|name| !name.is_empty())
                .map(|name| name.to_string())
        })
        .unwrap_or_default();

    let title = if unvalidated {
        format!("Image from {domain} (unvalidated)")
    } else if filename.is_empty() {
        format!("Image from {domain}")
    } else {
        filename
    };

    (title, format!("https://{domain}"))
}

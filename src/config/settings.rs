//! Settings structures for ImgScout-RS configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub browser: BrowserSettings,
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            browser: BrowserSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (IMGSCOUT_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("IMGSCOUT_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("IMGSCOUT_STORAGE_KEY") {
            self.storage.signing_key = val;
        }
        if let Ok(val) = std::env::var("IMGSCOUT_CONTAINER") {
            self.storage.container = val;
        }
        if let Ok(val) = std::env::var("IMGSCOUT_STORAGE_ROOT") {
            self.storage.root = val;
        }
        if let Ok(val) = std::env::var("IMGSCOUT_BROWSER_PATH") {
            self.browser.executable_path = Some(val);
        }
        if let Ok(val) = std::env::var("IMGSCOUT_BROWSER_DISABLED") {
            self.browser.enabled = !val.parse().unwrap_or(false);
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug mode
    pub debug: bool,
    /// Instance name used in logs
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "ImgScout".to_string(),
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default number of results when the caller does not say
    pub default_max_results: usize,
    /// Candidate multiplier handed to the extractor before probing
    pub candidate_multiplier: usize,
    /// Language code sent to the search engine
    pub lang: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_max_results: 10,
            candidate_multiplier: 3,
            lang: "en".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Timeout for HEAD probes in seconds
    pub probe_timeout: f64,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            probe_timeout: crate::PROBE_TIMEOUT as f64,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Headless-browser strategy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Whether the browser strategy may be used at all
    pub enabled: bool,
    /// Explicit Chromium binary; autodetected when absent
    pub executable_path: Option<String>,
    /// Run without a visible window
    pub headless: bool,
    /// Fixed window width
    pub window_width: u32,
    /// Fixed window height
    pub window_height: u32,
    /// Seconds to let the results page settle after navigation
    pub page_settle_secs: u64,
    /// Seconds to wait for the consent-accept control
    pub consent_timeout_secs: u64,
    /// Seconds to let the preview panel settle after a thumbnail click
    pub click_settle_secs: u64,
    /// Thumbnail selectors, tried in order until one yields elements
    pub thumbnail_selectors: Vec<String>,
    /// Full-resolution image selectors, tried in order per thumbnail
    pub image_selectors: Vec<String>,
    /// Selector for the source-site link next to the preview
    pub source_selector: String,
    /// Selector for the consent-accept control
    pub consent_selector: String,
    /// Selector for the "show more results" control
    pub show_more_selector: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            executable_path: None,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            page_settle_secs: 3,
            consent_timeout_secs: 3,
            click_settle_secs: 2,
            thumbnail_selectors: vec![
                "img[data-src]".to_string(),
                "img[src*='gstatic']".to_string(),
                "div[data-tbnid] img".to_string(),
            ],
            image_selectors: vec![
                "img.n3VNCb".to_string(),
                "img.iPVvYb".to_string(),
                "img[src*='http']:not([src*='gstatic']):not([src*='encrypted'])".to_string(),
                "div[data-tbnid] img[src*='http']".to_string(),
            ],
            source_selector: "div.fxgdke a".to_string(),
            consent_selector: "#L2AGLb".to_string(),
            show_more_selector: "input[value*='Show more']".to_string(),
        }
    }
}

/// Blob store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory for the filesystem store
    pub root: String,
    /// Container (bucket) name
    pub container: String,
    /// Base URL embedded in returned blob URLs
    pub base_url: String,
    /// HMAC signing key for time-limited retrieval URLs
    pub signing_key: String,
    /// Signed-URL lifetime in hours
    pub signed_url_ttl_hours: i64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
            container: "image-scout".to_string(),
            base_url: "http://127.0.0.1:8900".to_string(),
            signing_key: String::new(),
            signed_url_ttl_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.general.debug);
        assert_eq!(settings.search.default_max_results, 10);
        assert_eq!(settings.storage.signed_url_ttl_hours, 24);
        assert!(!settings.browser.thumbnail_selectors.is_empty());
    }

    #[test]
    fn test_yaml_partial_overrides() {
        let yaml = "search:\n  default_max_results: 5\nbrowser:\n  enabled: false\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.search.default_max_results, 5);
        assert!(!settings.browser.enabled);
        // Unspecified sections fall back to defaults
        assert_eq!(settings.outgoing.probe_timeout, 10.0);
    }
}

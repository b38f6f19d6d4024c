//! Royalty-free source policy
//!
//! Stock-photo hosts whose content must not be ingested. Checked before any
//! network transfer is attempted.

use url::Url;

/// Blocked stock-photo domains
pub const ROYALTY_FREE_DOMAINS: [&str; 5] = [
    "pexels.com",
    "unsplash.com",
    "pixabay.com",
    "freepik.com",
    "stock.adobe.com",
];

/// Whether a source URL points at a blocked royalty-free host.
/// Subdomains match too (`images.unsplash.com` is still unsplash).
pub fn is_royalty_free(source: &str) -> bool {
    let Ok(parsed) = Url::parse(source) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_lowercase();

    ROYALTY_FREE_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

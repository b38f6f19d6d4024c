//! HTTP client for page fetches, image probes, and image downloads

use super::user_agent::{accept_html, accept_image, accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::error::{ServiceError, ServiceResult};
use reqwest::Client;
use std::time::Duration;

/// A fetched image payload
#[derive(Debug)]
pub struct Download {
    /// Raw body bytes
    pub bytes: Vec<u8>,
    /// Content-Type header, if the server sent one
    pub content_type: Option<String>,
}

/// HTTP client wrapper that presents itself as a regular desktop browser
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    page_timeout: Duration,
    probe_timeout: Duration,
    user_agent: String,
    lang: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> ServiceResult<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> ServiceResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .gzip(true)
            .brotli(true)
            .cookie_store(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            page_timeout: Duration::from_secs_f64(settings.request_timeout),
            probe_timeout: Duration::from_secs_f64(settings.probe_timeout),
            user_agent: generate_user_agent(),
            lang: "en".to_string(),
        })
    }

    /// Fetch an HTML page as text.
    ///
    /// Sends realistic browser headers so trivially bot-blocked hosts still
    /// answer. Non-2xx statuses are transport failures; the caller decides
    /// whether to try an alternate URL template.
    pub async fn fetch_page(&self, url: &str) -> ServiceResult<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_html())
            .header("Accept-Language", accept_language(&self.lang))
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Transport(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        Ok(response.text().await?)
    }

    /// HEAD-probe a candidate URL and report its content type.
    ///
    /// Short timeout: probes exist to cheaply confirm a URL serves an image
    /// before it is reported as a hit. Non-2xx is a transport failure.
    pub async fn probe(&self, url: &str) -> ServiceResult<Option<String>> {
        let response = self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_image())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Transport(format!(
                "probe of {} returned HTTP {}",
                url, status
            )));
        }

        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()))
    }

    /// Download the full body of a URL, typically image bytes.
    pub async fn download(&self, url: &str) -> ServiceResult<Download> {
        let response = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_image())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Transport(format!(
                "download of {} returned HTTP {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response.bytes().await?.to_vec();

        Ok(Download {
            bytes,
            content_type,
        })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        assert!(HttpClient::new().is_ok());
    }

    #[tokio::test]
    async fn test_fetch_page_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header_exists("User-Agent"))
            .and(header_exists("Accept-Language"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let body = client
            .fetch_page(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn test_fetch_page_non_2xx_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .fetch_page(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn test_probe_reports_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let ct = client
            .probe(&format!("{}/a.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(ct.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_download_returns_bytes() {
        let server = MockServer::start().await;
        let payload = vec![0x89u8, 0x50, 0x4e, 0x47];
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(payload.clone()),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let download = client
            .download(&format!("{}/img.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(download.bytes, payload);
        assert_eq!(download.content_type.as_deref(), Some("image/png"));
    }
}

//! Browser-driven image search
//!
//! Drives a headless Chromium session through an interactive image search:
//! navigate to the results page, accept the consent dialog when one appears,
//! then click each thumbnail and read the full-resolution image out of the
//! preview panel. Scrolling and the "show more results" control extend the
//! result set; when neither advances the page the loop ends with whatever was
//! collected, which is a legitimate partial success.
//!
//! The session sits behind the [`SearchSession`] trait so the loop logic
//! (selector fallback, pagination, close-on-every-exit-path) is testable
//! without a browser binary.

use crate::config::BrowserSettings;
use crate::error::{ServiceError, ServiceResult};
use crate::search::hit::ImageHit;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Raw data pulled from one opened thumbnail
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub url: String,
    pub title: Option<String>,
    pub source: Option<String>,
}

/// Browser session operations used by the extraction loop.
///
/// One implementor drives Chromium; tests script a fake to exercise the loop
/// and its teardown guarantees.
#[async_trait]
pub trait SearchSession: Send {
    /// Open the results page and let it settle
    async fn navigate(&mut self, url: &str) -> ServiceResult<()>;
    /// Accept the consent dialog when present; absence is a no-op
    async fn accept_consent(&mut self) -> ServiceResult<()>;
    /// Number of thumbnail elements the first matching selector yields
    async fn count_thumbnails(&mut self) -> ServiceResult<usize>;
    /// Click the thumbnail at `index` and read the enlarged image
    async fn open_thumbnail(&mut self, index: usize) -> ServiceResult<Option<ExtractedImage>>;
    /// Current page height, used to detect whether scrolling loaded content
    async fn page_height(&mut self) -> ServiceResult<f64>;
    /// Scroll to the bottom of the page and wait for lazy content
    async fn scroll_to_bottom(&mut self) -> ServiceResult<()>;
    /// Click the "show more results" control; false when it is absent
    async fn show_more(&mut self) -> ServiceResult<bool>;
    /// Tear the session down; must be safe to call exactly once on any path
    async fn close(&mut self) -> ServiceResult<()>;
}

/// Creates sessions; the indirection keeps launch failures a per-call concern
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> ServiceResult<Box<dyn SearchSession>>;
}

/// Check once whether a usable Chromium binary is reachable.
///
/// Consulted at orchestrator construction; call sites never re-check.
pub fn chromium_available(settings: &BrowserSettings) -> bool {
    if !settings.enabled {
        return false;
    }
    if let Some(path) = &settings.executable_path {
        return std::path::Path::new(path).exists();
    }
    // The config builder runs executable detection and errors when no
    // Chromium install is found.
    BrowserConfig::builder().build().is_ok()
}

/// Chromium-backed session
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: Option<JoinHandle<()>>,
    settings: BrowserSettings,
    active_selector: Option<String>,
    closed: bool,
}

impl ChromiumSession {
    /// Launch a headless Chromium process with a fixed window and a spoofed
    /// user agent. A missing binary or failed launch is an environment
    /// failure for this strategy only.
    pub async fn launch(settings: &BrowserSettings, user_agent: &str) -> ServiceResult<Self> {
        let mut builder = BrowserConfig::builder()
            .viewport(Viewport {
                width: settings.window_width,
                height: settings.window_height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .no_sandbox()
            .args(vec![
                format!("--user-agent={user_agent}"),
                format!(
                    "--window-size={},{}",
                    settings.window_width, settings.window_height
                ),
                "--disable-gpu".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-extensions".to_string(),
            ]);

        if let Some(path) = &settings.executable_path {
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(ServiceError::Environment)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| ServiceError::Environment(format!("browser launch failed: {err}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "browser handler reported error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| ServiceError::Environment(format!("failed to open page: {err}")))?;

        info!(
            width = settings.window_width,
            height = settings.window_height,
            "launched Chromium session"
        );

        Ok(Self {
            browser,
            page,
            handler_task: Some(handler_task),
            settings: settings.clone(),
            active_selector: None,
            closed: false,
        })
    }

    fn driver_err(context: &str, err: impl std::fmt::Display) -> ServiceError {
        ServiceError::Environment(format!("{context}: {err}"))
    }
}

#[async_trait]
impl SearchSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> ServiceResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|err| Self::driver_err("navigation failed", err))?;
        let _ = self.page.wait_for_navigation().await;
        sleep(Duration::from_secs(self.settings.page_settle_secs)).await;
        Ok(())
    }

    async fn accept_consent(&mut self) -> ServiceResult<()> {
        let wait = Duration::from_secs(self.settings.consent_timeout_secs);
        let selector = self.settings.consent_selector.clone();
        if let Ok(Ok(button)) = timeout(wait, self.page.find_element(selector.as_str())).await {
            if button.click().await.is_ok() {
                debug!("accepted consent dialog");
                sleep(Duration::from_secs(1)).await;
            }
        }
        Ok(())
    }

    async fn count_thumbnails(&mut self) -> ServiceResult<usize> {
        for selector in &self.settings.thumbnail_selectors {
            match self.page.find_elements(selector.as_str()).await {
                Ok(elements) if !elements.is_empty() => {
                    self.active_selector = Some(selector.clone());
                    return Ok(elements.len());
                }
                _ => continue,
            }
        }
        self.active_selector = None;
        Ok(0)
    }

    async fn open_thumbnail(&mut self, index: usize) -> ServiceResult<Option<ExtractedImage>> {
        let selector = match &self.active_selector {
            Some(selector) => selector.clone(),
            None => return Ok(None),
        };

        let elements = self
            .page
            .find_elements(selector.as_str())
            .await
            .map_err(|err| Self::driver_err("thumbnail lookup failed", err))?;
        let thumb = match elements.into_iter().nth(index) {
            Some(element) => element,
            None => return Ok(None),
        };

        thumb
            .click()
            .await
            .map_err(|err| Self::driver_err("thumbnail click failed", err))?;
        sleep(Duration::from_secs(self.settings.click_settle_secs)).await;

        for image_selector in &self.settings.image_selectors {
            let Ok(image) = self.page.find_element(image_selector.as_str()).await else {
                continue;
            };
            let Ok(Some(src)) = image.attribute("src").await else {
                continue;
            };
            if !src.starts_with("http") || src.contains("gstatic") || src.contains("encrypted") {
                continue;
            }

            let title = thumb.attribute("alt").await.ok().flatten();
            let source = match self
                .page
                .find_element(self.settings.source_selector.as_str())
                .await
            {
                Ok(link) => link.attribute("href").await.ok().flatten(),
                Err(_) => None,
            };

            return Ok(Some(ExtractedImage {
                url: src,
                title,
                source,
            }));
        }

        Ok(None)
    }

    async fn page_height(&mut self) -> ServiceResult<f64> {
        let value = self
            .page
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(|err| Self::driver_err("page height check failed", err))?;
        value
            .into_value::<f64>()
            .map_err(|err| Self::driver_err("page height decode failed", err))
    }

    async fn scroll_to_bottom(&mut self) -> ServiceResult<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .map_err(|err| Self::driver_err("scroll failed", err))?;
        sleep(Duration::from_secs(self.settings.click_settle_secs)).await;
        Ok(())
    }

    async fn show_more(&mut self) -> ServiceResult<bool> {
        let selector = self.settings.show_more_selector.clone();
        match self.page.find_element(selector.as_str()).await {
            Ok(button) => {
                button
                    .click()
                    .await
                    .map_err(|err| Self::driver_err("show-more click failed", err))?;
                sleep(Duration::from_secs(self.settings.page_settle_secs)).await;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn close(&mut self) -> ServiceResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "failed to close browser gracefully");
        }
        if let Some(handle) = self.handler_task.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "browser handler join error");
            }
        }
        info!("closed Chromium session");
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("browser session dropped without explicit close");
            if let Some(handle) = self.handler_task.take() {
                handle.abort();
            }
        }
    }
}

/// Default factory launching real Chromium sessions
pub struct ChromiumFactory {
    settings: BrowserSettings,
    user_agent: String,
}

impl ChromiumFactory {
    pub fn new(settings: BrowserSettings, user_agent: String) -> Self {
        Self {
            settings,
            user_agent,
        }
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn create(&self) -> ServiceResult<Box<dyn SearchSession>> {
        let session = ChromiumSession::launch(&self.settings, &self.user_agent).await?;
        Ok(Box::new(session))
    }
}

/// Drives a [`SearchSession`] through the click-and-extract loop
pub struct BrowserSearcher {
    lang: String,
    sessions: Arc<dyn SessionFactory>,
}

impl BrowserSearcher {
    pub fn new(settings: BrowserSettings, lang: String, user_agent: String) -> Self {
        let factory = Arc::new(ChromiumFactory::new(settings, user_agent));
        Self::with_factory(factory, lang)
    }

    /// Construct with an alternate session backend
    pub fn with_factory(sessions: Arc<dyn SessionFactory>, lang: String) -> Self {
        Self { lang, sessions }
    }

    /// Results-page URL for a query
    pub fn build_query_url(&self, query: &str) -> String {
        format!(
            "https://www.google.com/search?q={}&tbm=isch&hl={}",
            urlencoding::encode(query),
            self.lang
        )
    }

    /// Run one interactive search.
    ///
    /// The session is closed on every exit path; a failure inside the loop
    /// never leaks the browser process.
    pub async fn search(&self, query: &str, max_results: usize) -> ServiceResult<Vec<ImageHit>> {
        let mut session = self.sessions.create().await?;
        let outcome = self.collect(session.as_mut(), query, max_results).await;
        if let Err(err) = session.close().await {
            warn!(error = %err, "browser session close failed");
        }
        outcome
    }

    async fn collect(
        &self,
        session: &mut dyn SearchSession,
        query: &str,
        max_results: usize,
    ) -> ServiceResult<Vec<ImageHit>> {
        session.navigate(&self.build_query_url(query)).await?;
        session.accept_consent().await?;

        let mut hits: Vec<ImageHit> = Vec::new();
        let mut cursor = 0usize;
        let mut last_height = 0.0f64;
        let mut stalled = 0u32;

        while hits.len() < max_results {
            let available = session.count_thumbnails().await?;
            if available == 0 {
                warn!("no thumbnail elements found");
                break;
            }

            let before = hits.len();
            while cursor < available && hits.len() < max_results {
                match session.open_thumbnail(cursor).await {
                    Ok(Some(image)) => {
                        let title = image
                            .title
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| format!("Image {}", hits.len() + 1));
                        let source = image
                            .source
                            .filter(|s| !s.is_empty())
                            .unwrap_or_else(|| "Unknown".to_string());
                        debug!(url = %image.url, "found image");
                        hits.push(ImageHit::found(image.url, title, source));
                    }
                    Ok(None) => {}
                    Err(err) => {
                        debug!(index = cursor, error = %err, "failed to process thumbnail");
                    }
                }
                cursor += 1;
            }

            if hits.len() >= max_results {
                break;
            }

            // No new hits and every visible thumbnail consumed: pagination
            // must make progress or the loop ends with a partial result.
            if hits.len() == before && cursor >= available {
                stalled += 1;
                if stalled > 2 {
                    break;
                }
            } else {
                stalled = 0;
            }

            let height = session.page_height().await?;
            if height > last_height {
                session.scroll_to_bottom().await?;
                last_height = height;
            } else if !session.show_more().await? {
                break;
            }
        }

        info!(
            query = %query,
            count = hits.len(),
            "browser search finished"
        );
        Ok(hits)
    }
}

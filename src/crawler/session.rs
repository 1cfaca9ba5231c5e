//! Loader sessions
//!
//! A session is the per-worker handle used to bring a page in: it navigates
//! to a url under a wait condition, waits for the document body, and exposes
//! the resulting HTML. Each worker owns exactly one session for its whole
//! lifetime.
//!
//! [`HttpSession`] is the production session, backed by one `reqwest`
//! client. Non-text resources (images, media, fonts) are refused from their
//! response headers, before any of the body is read.

use crate::config::LoaderConfig;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How far a navigation must progress before it counts as done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// The document has been received and parsed; the fast path
    ContentParsed,
    /// The document and everything it depends on have loaded
    Load,
}

/// Errors raised while loading a page
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("blocked non-text resource: {0}")]
    BlockedResource(String),

    #[error("document body not present")]
    MissingBody,

    #[error("no document has been loaded")]
    NotLoaded,

    #[error("giving up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<LoadError> },
}

impl LoadError {
    /// Returns true when another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::MissingBody => true,
            Self::Request(e) => !e.is_builder(),
            Self::Status(code) => *code >= 500 || *code == StatusCode::TOO_MANY_REQUESTS.as_u16(),
            Self::BlockedResource(_) | Self::NotLoaded | Self::Exhausted { .. } => false,
        }
    }
}

/// A per-worker page loading session
///
/// The async methods return `Send` futures so a worker holding a session can
/// be spawned onto the multi-threaded runtime.
pub trait PageSession: Send {
    /// Navigates to `url`, resolving once `wait` is satisfied or failing after `timeout`
    fn navigate(
        &mut self,
        url: &Url,
        wait: WaitUntil,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), LoadError>> + Send;

    /// Waits up to `timeout` for the current document to have a body
    fn wait_for_body(&mut self, timeout: Duration)
        -> impl Future<Output = Result<(), LoadError>> + Send;

    /// Returns the HTML of the current document
    fn content(&self) -> Result<String, LoadError>;
}

/// Content-type prefixes that are never downloaded
const BLOCKED_CONTENT_TYPES: &[&str] = &["image/", "audio/", "video/", "font/", "application/font"];

/// Builds the HTTP client a session uses
///
/// # Arguments
///
/// * `config` - The loader configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &LoaderConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_millis(config.navigation_timeout_ms))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a response with this content type must not be downloaded
pub fn is_blocked_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    BLOCKED_CONTENT_TYPES
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
}

/// Session that loads pages over plain HTTP
///
/// A static document is complete once its bytes arrive, so both wait
/// conditions resolve when the body has been read.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    html: Option<String>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self { client, html: None }
    }

    /// Builds a session with its own client
    pub fn from_config(config: &LoaderConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }

    async fn fetch(&self, url: &Url) -> Result<String, LoadError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if is_blocked_content_type(&content_type) {
            return Err(LoadError::BlockedResource(content_type));
        }

        Ok(response.text().await?)
    }
}

impl PageSession for HttpSession {
    fn navigate(
        &mut self,
        url: &Url,
        _wait: WaitUntil,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), LoadError>> + Send {
        async move {
            self.html = None;
            let html = tokio::time::timeout(timeout, self.fetch(url))
                .await
                .map_err(|_| LoadError::Timeout(timeout))??;
            self.html = Some(html);
            Ok(())
        }
    }

    fn wait_for_body(
        &mut self,
        _timeout: Duration,
    ) -> impl Future<Output = Result<(), LoadError>> + Send {
        let result = match &self.html {
            Some(html) if !html.trim().is_empty() => Ok(()),
            Some(_) => Err(LoadError::MissingBody),
            None => Err(LoadError::NotLoaded),
        };
        std::future::ready(result)
    }

    fn content(&self) -> Result<String, LoadError> {
        self.html.clone().ok_or(LoadError::NotLoaded)
    }
}

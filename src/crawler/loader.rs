//! Retrying page loader
//!
//! Wraps a [`PageSession`] with the crawl's load policy: a bounded number of
//! attempts with linear backoff, a fast wait condition with a fallback to the
//! full one, and an explicit bounded wait for the document body.

use crate::config::LoaderConfig;
use crate::crawler::events;
use crate::crawler::parser::parse_html;
use crate::crawler::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::crawler::session::{LoadError, PageSession, WaitUntil};
use std::time::Duration;
use url::Url;

/// A successfully loaded and extracted page
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub html: String,
    pub title: String,
    pub text: String,
    pub links: Vec<Url>,
}

/// Loads pages through one session
pub struct PageLoader<S> {
    session: S,
    policy: RetryPolicy,
    navigation_timeout: Duration,
    body_timeout: Duration,
}

impl<S: PageSession> PageLoader<S> {
    pub fn new(session: S, config: &LoaderConfig) -> Self {
        Self {
            session,
            policy: RetryPolicy::new(
                DEFAULT_MAX_ATTEMPTS,
                Duration::from_millis(config.backoff_ms),
            ),
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            body_timeout: Duration::from_millis(config.body_timeout_ms),
        }
    }

    /// Replaces the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Loads `url` and extracts its title, text and links
    ///
    /// Every attempt logs `page_load_attempt`; every failed attempt logs
    /// `page_load_error`. When no attempt succeeds, exactly one
    /// `page_load_failed` is logged and [`LoadError::Exhausted`] is returned.
    /// Errors that another attempt cannot fix end the loop early.
    pub async fn load(&mut self, url: &Url) -> Result<LoadedPage, LoadError> {
        let mut attempts = self.policy.attempts();
        let mut last_error = None;

        while let Some(attempt) = attempts.next().await {
            tracing::info!(
                event = events::PAGE_LOAD_ATTEMPT,
                url = %url,
                attempt,
                "loading page"
            );

            match self.attempt(url).await {
                Ok(html) => {
                    let parsed = parse_html(&html, url);
                    return Ok(LoadedPage {
                        html,
                        title: parsed.title,
                        text: parsed.text,
                        links: parsed.links,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        event = events::PAGE_LOAD_ERROR,
                        url = %url,
                        attempt,
                        error = %e,
                        "page load attempt failed"
                    );
                    let transient = e.is_transient();
                    last_error = Some(e);
                    if !transient {
                        break;
                    }
                }
            }
        }

        let attempts = attempts.made();
        tracing::error!(
            event = events::PAGE_LOAD_FAILED,
            url = %url,
            attempts,
            "giving up on page"
        );

        Err(LoadError::Exhausted {
            attempts,
            last: Box::new(last_error.unwrap_or(LoadError::NotLoaded)),
        })
    }

    /// One attempt: navigate, wait for the body, read the document
    async fn attempt(&mut self, url: &Url) -> Result<String, LoadError> {
        let timeout = self.navigation_timeout;

        match self
            .session
            .navigate(url, WaitUntil::ContentParsed, timeout)
            .await
        {
            Ok(()) => {}
            // only a slow document is worth a second, fuller wait
            Err(LoadError::Timeout(_)) => {
                self.session.navigate(url, WaitUntil::Load, timeout).await?;
            }
            Err(e) => return Err(e),
        }

        self.session.wait_for_body(self.body_timeout).await?;
        self.session.content()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    /// Scripted navigation results keyed by url
    ///
    /// Each navigation pops the next scripted result for its url; once the
    /// script runs out the last result repeats.
    #[derive(Clone, Default)]
    pub(crate) struct MockSession {
        scripts: Arc<Mutex<HashMap<String, VecDeque<Result<String, u16>>>>>,
        pub(crate) navigations: Arc<Mutex<Vec<(String, WaitUntil)>>>,
        current: Option<String>,
    }

    impl MockSession {
        /// Serves `html` for `url` on every navigation
        pub(crate) fn page(self, url: &str, html: &str) -> Self {
            self.script(url, vec![Ok(html.to_string())])
        }

        /// Scripts a sequence of results; `Err(0)` is a timeout, other codes are HTTP statuses
        pub(crate) fn script(self, url: &str, results: Vec<Result<String, u16>>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(url.to_string(), results.into());
            self
        }

        pub(crate) fn navigation_count(&self, url: &str) -> usize {
            self.navigations
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, _)| u == url)
                .count()
        }
    }

    impl PageSession for MockSession {
        fn navigate(
            &mut self,
            url: &Url,
            wait: WaitUntil,
            timeout: Duration,
        ) -> impl std::future::Future<Output = Result<(), LoadError>> + Send {
            self.navigations
                .lock()
                .unwrap()
                .push((url.to_string(), wait));
            self.current = None;

            let result = {
                let mut scripts = self.scripts.lock().unwrap();
                match scripts.get_mut(url.as_str()) {
                    Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                    Some(queue) => queue.front().cloned().unwrap_or(Err(404)),
                    None => Err(404),
                }
            };

            let result = match result {
                Ok(html) => {
                    self.current = Some(html);
                    Ok(())
                }
                Err(0) => Err(LoadError::Timeout(timeout)),
                Err(code) => Err(LoadError::Status(code)),
            };
            std::future::ready(result)
        }

        fn wait_for_body(
            &mut self,
            _timeout: Duration,
        ) -> impl std::future::Future<Output = Result<(), LoadError>> + Send {
            std::future::ready(match &self.current {
                Some(html) if !html.is_empty() => Ok(()),
                Some(_) => Err(LoadError::MissingBody),
                None => Err(LoadError::NotLoaded),
            })
        }

        fn content(&self) -> Result<String, LoadError> {
            self.current.clone().ok_or(LoadError::NotLoaded)
        }
    }

    fn loader(session: MockSession) -> PageLoader<MockSession> {
        PageLoader::new(session, &LoaderConfig::default())
            .with_policy(RetryPolicy::new(3, Duration::ZERO))
    }

    const URL: &str = "https://example.test/ley";

    #[tokio::test]
    async fn test_load_extracts_page() {
        let session = MockSession::default().page(
            URL,
            r#"<html><head><title>Ley</title></head><body><p>Texto completo</p><a href="/otra">o</a></body></html>"#,
        );
        let mut loader = loader(session.clone());

        let page = loader.load(&Url::parse(URL).unwrap()).await.unwrap();
        assert_eq!(page.title, "Ley");
        assert_eq!(page.text, "Texto completo");
        assert_eq!(page.links[0].as_str(), "https://example.test/otra");
        assert_eq!(session.navigation_count(URL), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let session = MockSession::default().script(
            URL,
            vec![Err(503), Err(503), Ok("<p>Por fin cargó</p>".to_string())],
        );
        let mut loader = loader(session.clone());

        let page = loader.load(&Url::parse(URL).unwrap()).await.unwrap();
        assert_eq!(page.text, "Por fin cargó");
        assert_eq!(session.navigation_count(URL), 3);
    }

    #[tokio::test]
    async fn test_exhausts_after_three_attempts() {
        let session = MockSession::default().script(URL, vec![Err(500)]);
        let mut loader = loader(session.clone());

        let err = loader.load(&Url::parse(URL).unwrap()).await.unwrap_err();
        match err {
            LoadError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, LoadError::Status(500)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.navigation_count(URL), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_early() {
        let session = MockSession::default().script(URL, vec![Err(404)]);
        let mut loader = loader(session.clone());

        let err = loader.load(&Url::parse(URL).unwrap()).await.unwrap_err();
        assert!(matches!(err, LoadError::Exhausted { attempts: 1, .. }));
        assert_eq!(session.navigation_count(URL), 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_full_load() {
        let session = MockSession::default()
            .script(URL, vec![Err(0), Ok("<p>Cargado tarde</p>".to_string())]);
        let mut loader = loader(session.clone());

        let page = loader.load(&Url::parse(URL).unwrap()).await.unwrap();
        assert_eq!(page.text, "Cargado tarde");

        let navigations = session.navigations.lock().unwrap().clone();
        assert_eq!(
            navigations.iter().map(|(_, w)| *w).collect::<Vec<_>>(),
            vec![WaitUntil::ContentParsed, WaitUntil::Load]
        );
    }

    #[tokio::test]
    async fn test_empty_document_is_retried() {
        let session = MockSession::default().script(
            URL,
            vec![Ok(String::new()), Ok("<p>Segundo intento</p>".to_string())],
        );
        let mut loader = loader(session.clone());

        let page = loader.load(&Url::parse(URL).unwrap()).await.unwrap();
        assert_eq!(page.text, "Segundo intento");
        assert_eq!(session.navigation_count(URL), 2);
    }
}

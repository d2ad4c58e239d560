//! Page sessions: the capability that turns a URL into rendered page content.
//!
//! A [`SessionFactory`] hands out exclusive [`PageSession`]s. Each detail task
//! opens its own session and closes it when done; sessions are never shared.

mod http;

use std::time::Duration;

use async_trait::async_trait;
use scraper::Selector;

use crate::error::ScrapeError;

pub use http::{HttpSession, HttpSessionFactory};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Upper bound on the readiness wait.
    pub ready_timeout: Duration,
    /// Extra settle time after a readiness timeout before reading content.
    pub grace_period: Duration,
    /// First delay between reloads while waiting; doubles up to `max_poll_interval`.
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(10),
            grace_period: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            max_poll_interval: Duration::from_secs(4),
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Outcome of a bounded readiness wait. Neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    TimedOut,
}

#[async_trait]
pub trait PageSession: Send {
    /// Load `url`, replacing whatever the session currently shows.
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Wait until `selector` matches the current page, at most `timeout`.
    async fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> Readiness;

    /// Content of the current page as it is right now.
    async fn content(&mut self) -> Result<String, ScrapeError>;

    /// Release the session. Called exactly once, on success and failure paths alike.
    async fn close(&mut self);
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError>;
}

/// Navigate, wait for readiness, then read content.
///
/// A readiness timeout is not a failure: after the grace period the caller
/// gets whatever content the page has.
pub async fn load_page(
    session: &mut dyn PageSession,
    url: &str,
    ready: &Selector,
    settings: &FetchSettings,
) -> Result<String, ScrapeError> {
    session.navigate(url).await?;
    match session.wait_for(ready, settings.ready_timeout).await {
        Readiness::Ready => {}
        Readiness::TimedOut => {
            tracing::debug!(%url, "Page not ready after {:?}, using current content", settings.ready_timeout);
            tokio::time::sleep(settings.grace_period).await;
        }
    }
    session.content().await
}

pub fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{css}: {e}")))
}

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio::time::Instant;

use super::{FetchSettings, PageSession, Readiness, SessionFactory};
use crate::error::ScrapeError;

/// Opens plain HTTP sessions. Every session gets its own client and cookie jar.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    settings: FetchSettings,
}

impl HttpSessionFactory {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(&self.settings.user_agent)
            .timeout(self.settings.request_timeout)
            .cookie_store(true)
            .build()?;
        Ok(Box::new(HttpSession {
            client,
            poll_interval: self.settings.poll_interval,
            max_poll_interval: self.settings.max_poll_interval,
            page: None,
        }))
    }
}

struct LoadedPage {
    url: String,
    body: String,
}

pub struct HttpSession {
    client: reqwest::Client,
    poll_interval: Duration,
    max_poll_interval: Duration,
    page: Option<LoadedPage>,
}

impl HttpSession {
    async fn get(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let body = self.get(url).await?;
        self.page = Some(LoadedPage {
            url: url.to_string(),
            body,
        });
        Ok(())
    }

    async fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> Readiness {
        let deadline = Instant::now() + timeout;
        let mut interval = self.poll_interval;
        loop {
            let Some(page) = &self.page else {
                return Readiness::TimedOut;
            };
            if has_match(&page.body, selector) {
                return Readiness::Ready;
            }

            let now = Instant::now();
            if now >= deadline {
                return Readiness::TimedOut;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
            interval = (interval * 2).min(self.max_poll_interval.max(self.poll_interval));

            // Re-read the page; a failed or slow reload keeps the previous content.
            let url = page.url.clone();
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, self.get(&url)).await {
                Ok(Ok(body)) => {
                    if let Some(page) = self.page.as_mut() {
                        page.body = body;
                    }
                }
                Ok(Err(e)) => tracing::debug!(%url, "Reload during readiness wait failed: {e}"),
                Err(_) => return Readiness::TimedOut,
            }
        }
    }

    async fn content(&mut self) -> Result<String, ScrapeError> {
        self.page
            .as_ref()
            .map(|page| page.body.clone())
            .ok_or(ScrapeError::NotNavigated)
    }

    async fn close(&mut self) {
        self.page = None;
    }
}

fn has_match(body: &str, selector: &Selector) -> bool {
    Html::parse_document(body).select(selector).next().is_some()
}

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use scraper::Selector;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::ScrapeError;
use crate::extract::{DETAIL_READY_SELECTOR, DetailExtractor};
use crate::fetch::{FetchSettings, PageSession, SessionFactory, load_page, parse_selector};
use crate::models::job::{DetailOutcome, JobRecord};

pub const DEFAULT_CONCURRENCY: usize = 3;

struct PoolContext {
    sessions: Arc<dyn SessionFactory>,
    extractor: Arc<dyn DetailExtractor>,
    settings: FetchSettings,
    ready: Selector,
    source: String,
}

/// Fetches and extracts detail pages in parallel, bounded by a concurrency limit.
///
/// Every URL yields exactly one outcome. A failing URL becomes a
/// [`DetailOutcome::Failed`] and never stops the rest of the batch.
#[derive(Clone)]
pub struct DispatchPool {
    ctx: Arc<PoolContext>,
}

impl DispatchPool {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        extractor: Arc<dyn DetailExtractor>,
        settings: FetchSettings,
        source: impl Into<String>,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            ctx: Arc::new(PoolContext {
                sessions,
                extractor,
                settings,
                ready: parse_selector(DETAIL_READY_SELECTOR)?,
                source: source.into(),
            }),
        })
    }

    /// Run every URL and return error-tagged records for the failures.
    pub async fn run<I>(&self, urls: I, concurrency: usize) -> Vec<JobRecord>
    where
        I: IntoIterator<Item = String>,
    {
        self.dispatch(urls, concurrency)
            .await
            .into_iter()
            .map(|outcome| outcome.into_record(&self.ctx.source))
            .collect()
    }

    /// Run every URL, returning outcomes in completion order.
    pub async fn dispatch<I>(&self, urls: I, concurrency: usize) -> Vec<DetailOutcome>
    where
        I: IntoIterator<Item = String>,
    {
        let limit = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::new();
        let mut seen = HashSet::new();

        for url in urls {
            if !seen.insert(url.clone()) {
                continue;
            }
            let ctx = self.ctx.clone();
            let limit = limit.clone();
            let task_url = url.clone();
            let handle = tasks.spawn(async move {
                let Ok(_permit) = limit.acquire_owned().await else {
                    return DetailOutcome::Failed {
                        url: task_url,
                        reason: "dispatch pool closed".to_string(),
                    };
                };
                process_url(&ctx, task_url).await
            });
            pending.insert(handle.id(), url);
        }

        tracing::info!("Dispatching {} job URLs with concurrency {}", pending.len(), concurrency.max(1));

        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    pending.remove(&id);
                    outcome
                }
                Err(e) => {
                    let url = pending.remove(&e.id()).unwrap_or_default();
                    tracing::warn!(%url, "Detail task aborted: {e}");
                    DetailOutcome::Failed {
                        url,
                        reason: format!("task aborted: {e}"),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, DetailOutcome::Failed { .. }))
            .count();
        tracing::info!("Fetched {} job details, {failed} failed", outcomes.len() - failed);

        outcomes
    }
}

/// One URL, one exclusive session. The session is closed on every return path.
async fn process_url(ctx: &PoolContext, url: String) -> DetailOutcome {
    let mut session = match ctx.sessions.open().await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(%url, "Could not open page session: {e}");
            return DetailOutcome::Failed {
                url,
                reason: e.reason(),
            };
        }
    };

    let result = AssertUnwindSafe(fetch_detail(ctx, session.as_mut(), &url))
        .catch_unwind()
        .await;
    session.close().await;

    match result {
        Ok(Ok(record)) => DetailOutcome::Fetched(record),
        Ok(Err(e)) => {
            tracing::warn!(%url, "Error fetching job detail: {e}");
            DetailOutcome::Failed {
                url,
                reason: e.reason(),
            }
        }
        Err(panic) => {
            let reason = format!("task panicked: {}", panic_message(panic.as_ref()));
            tracing::warn!(%url, "{reason}");
            DetailOutcome::Failed { url, reason }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn fetch_detail(
    ctx: &PoolContext,
    session: &mut dyn PageSession,
    url: &str,
) -> Result<JobRecord, ScrapeError> {
    let html = load_page(session, url, &ctx.ready, &ctx.settings).await?;
    let details = ctx.extractor.extract(&html)?;
    Ok(details.into_record(url, ctx.source.as_str()))
}

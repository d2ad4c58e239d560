use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::db::{SaveSummary, Store};
use crate::dispatch::DispatchPool;
use crate::error::ScrapeError;
use crate::extract::{DetailExtractor, LISTING_READY_SELECTOR, parse_listing};
use crate::fetch::{FetchSettings, SessionFactory, load_page, parse_selector};
use crate::models::job::JobRecord;
use crate::report::write_report;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub urls_found: usize,
    pub fetched: usize,
    pub failed: usize,
    pub saved: SaveSummary,
    pub json_path: PathBuf,
    pub report_path: PathBuf,
}

/// Scrape the search page, fetch every listing, then write JSON, the table and the report.
///
/// Only outer-stage failures (search page, output directory, database,
/// report) are returned as errors. Per-listing failures end up as
/// error-tagged records.
pub async fn run(
    config: &Config,
    sessions: Arc<dyn SessionFactory>,
    extractor: Arc<dyn DetailExtractor>,
) -> anyhow::Result<RunSummary> {
    tracing::info!("Scraping: {}", config.url);
    tracing::info!("Output dir: {}", config.out.display());
    tracing::info!("Database: {}", config.db.display());

    tokio::fs::create_dir_all(&config.out)
        .await
        .with_context(|| format!("Failed to create output directory {}", config.out.display()))?;
    if let Some(parent) = config.db.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    let settings = config.fetch_settings();
    let urls = scrape_listing(sessions.as_ref(), &config.url, &settings)
        .await
        .with_context(|| format!("Failed to load search results page {}", config.url))?;
    tracing::info!("Found {} job URLs", urls.len());
    let urls_found = urls.len();

    let pool = DispatchPool::new(sessions, extractor, settings, config.source.as_str())?;
    let records = pool.run(urls, config.concurrency).await;
    let failed = records.iter().filter(|r| r.is_failed()).count();

    let json_path = config.json_path();
    write_json(&json_path, &records)
        .await
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    tracing::info!("Scraped {} job details", records.len());

    let store = Store::open(&config.db)
        .await
        .with_context(|| format!("Failed to open database {}", config.db.display()))?;
    let saved = store.save(&records).await.context("Failed to save jobs")?;
    tracing::info!("Saved to {}", config.db.display());

    let report_path = config.report_path();
    let stored = store.all().await.context("Failed to read stored jobs")?;
    write_report(&report_path, &stored)
        .await
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    store.close().await;

    Ok(RunSummary {
        urls_found,
        fetched: records.len() - failed,
        failed,
        saved,
        json_path,
        report_path,
    })
}

/// Load the search-results page in its own session and collect listing URLs.
pub async fn scrape_listing(
    sessions: &dyn SessionFactory,
    url: &str,
    settings: &FetchSettings,
) -> Result<Vec<String>, ScrapeError> {
    let ready = parse_selector(LISTING_READY_SELECTOR)?;
    let mut session = sessions.open().await?;
    let html = load_page(session.as_mut(), url, &ready, settings).await;
    session.close().await;
    parse_listing(&html?, url)
}

async fn write_json(path: &Path, records: &[JobRecord]) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

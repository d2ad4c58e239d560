use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobscraper::{Config, HttpSessionFactory, IndeedExtractor, runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobscraper=info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let sessions = Arc::new(HttpSessionFactory::new(config.fetch_settings()));
    let extractor = Arc::new(IndeedExtractor::new()?);

    match runner::run(&config, sessions, extractor).await {
        Ok(summary) => {
            tracing::info!(
                "Done: {} URLs, {} fetched, {} failed, {} new rows; report at {}",
                summary.urls_found,
                summary.fetched,
                summary.failed,
                summary.saved.inserted,
                summary.report_path.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {e:#}");
            Err(e)
        }
    }
}

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::dispatch::DEFAULT_CONCURRENCY;
use crate::fetch::FetchSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscraper", about = "Scrape job listings into JSON, SQLite and an HTML report")]
pub struct Config {
    /// Search-results page to scrape
    #[arg(long, env = "SCRAPER_URL")]
    pub url: String,

    /// Output directory for jobs.json and jobs.html
    #[arg(long, env = "SCRAPER_OUT", default_value = "output/")]
    pub out: PathBuf,

    /// SQLite database file
    #[arg(long, env = "SCRAPER_DB", default_value = "output/jobs.db")]
    pub db: PathBuf,

    /// Maximum number of detail pages fetched at once
    #[arg(long, env = "SCRAPER_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Seconds to wait for a page to become ready before using what is there
    #[arg(long, env = "SCRAPER_TIMEOUT_SECS", default_value = "10")]
    pub timeout_secs: u64,

    /// Per-request network timeout in seconds
    #[arg(long, env = "SCRAPER_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Tag written to the source column
    #[arg(long, env = "SCRAPER_SOURCE", default_value = "indeed")]
    pub source: String,

    /// User-Agent sent with every page request
    #[arg(long, env = "SCRAPER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "SCRAPER_LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Config {
    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            ready_timeout: Duration::from_secs(self.timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent.clone()),
            ..defaults
        }
    }

    pub fn json_path(&self) -> PathBuf {
        self.out.join("jobs.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.out.join("jobs.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_cli() {
        let config = Config::try_parse_from(["jobscraper", "--url", "https://ca.indeed.com/jobs?q=rust"])
            .unwrap();

        assert_eq!(config.out, PathBuf::from("output/"));
        assert_eq!(config.db, PathBuf::from("output/jobs.db"));
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.source, "indeed");
        assert_eq!(config.json_path(), PathBuf::from("output/jobs.json"));
        assert_eq!(config.report_path(), PathBuf::from("output/jobs.html"));
    }

    #[test]
    fn url_is_required() {
        assert!(Config::try_parse_from(["jobscraper"]).is_err());
    }

    #[test]
    fn fetch_settings_follow_flags() {
        let config = Config::try_parse_from([
            "jobscraper",
            "--url",
            "https://ca.indeed.com/jobs",
            "--timeout-secs",
            "2",
            "--user-agent",
            "test-agent",
        ])
        .unwrap();
        let settings = config.fetch_settings();

        assert_eq!(settings.ready_timeout, Duration::from_secs(2));
        assert_eq!(settings.user_agent, "test-agent");
    }
}

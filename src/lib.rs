//! Job listing scraper: search page → concurrent detail fetches → JSON,
//! SQLite table and HTML report.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod report;
pub mod runner;

pub use config::Config;
pub use db::{SaveSummary, Store};
pub use dispatch::{DEFAULT_CONCURRENCY, DispatchPool};
pub use error::ScrapeError;
pub use extract::{DetailExtractor, IndeedExtractor, normalize_salary, parse_listing};
pub use fetch::{FetchSettings, HttpSessionFactory, PageSession, Readiness, SessionFactory};
pub use models::job::{DetailOutcome, JobDetails, JobRecord, StoredJob, UNDISCLOSED_SALARY};
pub use report::{render_report, write_report};

use std::path::Path;

use askama::Template;

use crate::error::ScrapeError;
use crate::models::job::StoredJob;

const MISSING: &str = "N/A";
const MISSING_LINK: &str = "#";

struct ReportRow {
    job_title: String,
    company: String,
    location: String,
    salary: String,
    link: String,
    scraped_at: String,
}

impl From<&StoredJob> for ReportRow {
    fn from(job: &StoredJob) -> Self {
        let or_missing = |field: &Option<String>| field.clone().unwrap_or_else(|| MISSING.to_string());
        Self {
            job_title: or_missing(&job.job_title),
            company: or_missing(&job.company),
            location: or_missing(&job.location),
            salary: or_missing(&job.salary),
            link: job.job_url.clone().unwrap_or_else(|| MISSING_LINK.to_string()),
            scraped_at: or_missing(&job.scraped_at),
        }
    }
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    rows: Vec<ReportRow>,
}

pub fn render_report(jobs: &[StoredJob]) -> Result<String, ScrapeError> {
    let tmpl = ReportTemplate {
        rows: jobs.iter().map(ReportRow::from).collect(),
    };
    Ok(tmpl.render()?)
}

pub async fn write_report(path: &Path, jobs: &[StoredJob]) -> Result<(), ScrapeError> {
    tracing::info!("Generating HTML table with {} rows", jobs.len());
    let html = render_report(jobs)?;
    tokio::fs::write(path, html).await?;
    tracing::info!("HTML table saved to {}", path.display());
    Ok(())
}

use chrono::Local;
use serde::{Deserialize, Serialize};

pub const UNDISCLOSED_SALARY: &str = "Undisclosed Salary";

const SCRAPED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One job posting as extracted from its detail page.
///
/// `job_url` is the natural key; every descriptive field may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub job_url: String,
    pub source: String,
    pub scraped_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// Record for a URL whose fetch or parse failed.
    pub fn failed(job_url: impl Into<String>, source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            job_title: None,
            company: None,
            location: None,
            salary: None,
            description: None,
            job_url: job_url.into(),
            source: source.into(),
            scraped_at: now_timestamp(),
            error: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Descriptive fields pulled out of a detail page, before they are tied to a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetails {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: String,
    pub description: Option<String>,
}

impl JobDetails {
    pub fn into_record(self, job_url: impl Into<String>, source: impl Into<String>) -> JobRecord {
        JobRecord {
            job_title: self.job_title,
            company: self.company,
            location: self.location,
            salary: Some(self.salary),
            description: self.description,
            job_url: job_url.into(),
            source: source.into(),
            scraped_at: now_timestamp(),
            error: None,
        }
    }
}

/// Result of processing a single listing URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Fetched(JobRecord),
    Failed { url: String, reason: String },
}

impl DetailOutcome {
    pub fn into_record(self, source: &str) -> JobRecord {
        match self {
            DetailOutcome::Fetched(record) => record,
            DetailOutcome::Failed { url, reason } => JobRecord::failed(url, source, reason),
        }
    }
}

/// A row read back from the jobs table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredJob {
    pub id: i64,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_url: Option<String>,
    pub source: Option<String>,
    pub scraped_at: Option<String>,
}

pub fn now_timestamp() -> String {
    Local::now().format(SCRAPED_AT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_becomes_error_tagged_record() {
        let outcome = DetailOutcome::Failed {
            url: "https://jobs.example/1".to_string(),
            reason: "timeout".to_string(),
        };
        let record = outcome.into_record("indeed");

        assert_eq!(record.job_url, "https://jobs.example/1");
        assert_eq!(record.error.as_deref(), Some("timeout"));
        assert_eq!(record.source, "indeed");
        assert!(record.job_title.is_none());
        assert!(record.company.is_none());
        assert!(record.location.is_none());
        assert!(record.salary.is_none());
        assert!(record.description.is_none());
    }

    #[test]
    fn error_field_is_omitted_from_json_when_absent() {
        let record = JobDetails {
            job_title: Some("Engineer".to_string()),
            salary: UNDISCLOSED_SALARY.to_string(),
            ..Default::default()
        }
        .into_record("https://jobs.example/2", "indeed");

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["salary"], UNDISCLOSED_SALARY);
        assert!(json["company"].is_null());
    }

    #[test]
    fn timestamp_has_second_precision() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), "2024-01-01T00:00:00".len());
        assert_eq!(&ts[10..11], "T");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Page returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("No page loaded")]
    NotNavigated,
}

impl ScrapeError {
    /// Short, log-friendly reason stored on failed records.
    pub fn reason(&self) -> String {
        match self {
            ScrapeError::Http(e) if e.is_timeout() => format!("timeout: {e}"),
            other => other.to_string(),
        }
    }
}

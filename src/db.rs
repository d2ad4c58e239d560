use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::ScrapeError;
use crate::models::job::{JobRecord, StoredJob};

const CREATE_JOBS_TABLE: &str = "CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY,
    job_title TEXT,
    company TEXT,
    location TEXT,
    salary TEXT,
    job_url TEXT UNIQUE,
    source TEXT,
    scraped_at TEXT
)";

/// Counts from one [`Store::save`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// SQLite-backed job table keyed by `job_url`.
///
/// Holds a single connection: one store per run, one writer.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database file and make sure the table exists.
    pub async fn open(path: &Path) -> Result<Self, ScrapeError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_JOBS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert every record whose `job_url` is not stored yet.
    ///
    /// Existing URLs are left untouched. A record that fails to insert is
    /// logged and skipped. The batch is committed before this returns.
    pub async fn save(&self, records: &[JobRecord]) -> Result<SaveSummary, ScrapeError> {
        let mut tx = self.pool.begin().await?;
        let mut summary = SaveSummary::default();

        for record in records {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO jobs (job_title, company, location, salary, job_url, source, scraped_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.job_title)
            .bind(&record.company)
            .bind(&record.location)
            .bind(&record.salary)
            .bind(&record.job_url)
            .bind(&record.source)
            .bind(&record.scraped_at)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(done) if done.rows_affected() > 0 => summary.inserted += 1,
                Ok(_) => summary.ignored += 1,
                Err(e) => {
                    tracing::warn!(job_url = %record.job_url, "Error saving job: {e}");
                    summary.failed += 1;
                }
            }
        }

        tx.commit().await?;
        tracing::info!(
            "Saved jobs: {} new, {} already stored, {} failed",
            summary.inserted,
            summary.ignored,
            summary.failed
        );
        Ok(summary)
    }

    pub async fn all(&self) -> Result<Vec<StoredJob>, ScrapeError> {
        let jobs = sqlx::query_as::<_, StoredJob>(
            "SELECT id, job_title, company, location, salary, job_url, source, scraped_at FROM jobs ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn count(&self) -> Result<i64, ScrapeError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

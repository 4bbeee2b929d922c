//! Backing store contract and its SQLite implementation.
//!
//! The office tools only ever talk to a [`RecordStore`]. Ordering is part of the
//! contract: `fetch_updates` must return newest first, which is what makes the
//! reducer's "first one wins" rule pick the latest update.

mod sqlite;
#[cfg(test)]
pub(crate) mod memory;

pub use sqlite::{setup_database, ImportSummary, SqliteStore};

use crate::entities::{MailDraft, MailKind, MailRecord, Sample, UpdateDraft, UpdateRecord};
use crate::error::StoreResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Registry entries of a survey, optionally narrowed by a search query
    /// evaluated store-side over [`crate::search::SAMPLE_SEARCH`].
    async fn fetch_registry(&self, survey: &str, filter: Option<&str>)
        -> StoreResult<Vec<Sample>>;

    /// All updates of a survey, `created_at` descending.
    async fn fetch_updates(&self, survey: &str) -> StoreResult<Vec<UpdateRecord>>;

    async fn insert_update(&self, survey: &str, draft: &UpdateDraft) -> StoreResult<i64>;

    /// Fails with `NotFound` when `id` does not exist.
    async fn update_update(&self, survey: &str, id: i64, draft: &UpdateDraft) -> StoreResult<()>;

    async fn delete_update(&self, survey: &str, id: i64) -> StoreResult<()>;

    async fn fetch_mail(&self, kind: MailKind, filter: Option<&str>)
        -> StoreResult<Vec<MailRecord>>;

    async fn insert_mail(&self, kind: MailKind, draft: &MailDraft) -> StoreResult<String>;

    async fn update_mail(&self, kind: MailKind, id: &str, draft: &MailDraft) -> StoreResult<()>;

    async fn delete_mail(&self, kind: MailKind, id: &str) -> StoreResult<()>;

    async fn count_mail(&self, kind: MailKind) -> StoreResult<usize>;
}

/// Read a registry allocation CSV (headers: sample_code, district, village,
/// supervisor, enumerator) and tag every row with `survey`.
pub fn load_samples_csv(csv_path: &Path, survey: &str) -> Result<Vec<Sample>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open sample CSV file")?;

    let mut samples = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let mut sample: Sample = result
            .with_context(|| format!("Failed to deserialize sample on row {}", line + 1))?;
        sample.survey = survey.to_string();
        samples.push(sample);
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_samples_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sample_code,district,village,supervisor,enumerator").unwrap();
        writeln!(file, "140501,Siak,Kampung Dalam,Rahmat,Dewi").unwrap();
        writeln!(file, "140502,Mempura,Benteng Hilir,Sari,Budi").unwrap();

        let samples = load_samples_csv(file.path(), "ssn_m25").unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].survey, "ssn_m25");
        assert_eq!(samples[1].village, "Benteng Hilir");
    }

    #[test]
    fn test_load_samples_csv_reports_bad_row() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sample_code,district").unwrap();
        writeln!(file, "140501,Siak").unwrap();

        let err = load_samples_csv(file.path(), "ssn_m25").unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }
}

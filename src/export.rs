// 📤 Export Transform - fixed-shape spreadsheet rows
//
// Headers are literal labels expected by the provincial upload template.
// Absent values never fail the export; they render as "-".

use crate::entities::{MailRecord, UpdateStatus};
use crate::error::StoreResult;
use crate::reconciliation::ReconciledRow;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Placeholder written for any absent value
pub const PLACEHOLDER: &str = "-";

/// A count cell: the number itself, or the placeholder when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExportCount {
    Count(u32),
    Missing(&'static str),
}

impl From<Option<u32>> for ExportCount {
    fn from(value: Option<u32>) -> Self {
        match value {
            Some(n) => ExportCount::Count(n),
            None => ExportCount::Missing(PLACEHOLDER),
        }
    }
}

// ============================================================================
// SURVEY EXPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyExportRow {
    #[serde(rename = "kode prop [2 digit]")]
    pub province_code: String,

    #[serde(rename = "kode kab [2 digit]")]
    pub regency_code: String,

    #[serde(rename = "kode NKS [6 digit]")]
    pub sample_code: String,

    #[serde(rename = "Sudah Selesai 1 BS? [sudah/belum]")]
    pub status: &'static str,

    #[serde(rename = "Jumlah Keluarga Sebelum Pemutakhiran")]
    pub families_before: ExportCount,

    #[serde(rename = "Jumlah Rumah Tangga Sebelum Pemutakhiran")]
    pub households_before: ExportCount,

    #[serde(rename = "Jumlah Keluarga Hasil Pemutakhiran")]
    pub families_after: ExportCount,

    #[serde(rename = "Jumlah Rumah Tangga Hasil Pemutakhiran")]
    pub households_after: ExportCount,
}

/// Region codes stamped on every survey export row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCodes {
    pub province: String,
    pub regency: String,
}

impl Default for RegionCodes {
    fn default() -> Self {
        RegionCodes {
            province: "14".to_string(),
            regency: "05".to_string(),
        }
    }
}

/// One export row per input row, same order.
pub fn survey_export_rows(rows: &[ReconciledRow], region: &RegionCodes) -> Vec<SurveyExportRow> {
    rows.iter()
        .map(|row| SurveyExportRow {
            province_code: region.province.clone(),
            regency_code: region.regency.clone(),
            sample_code: row.sample.sample_code.clone(),
            status: row.status.unwrap_or(UpdateStatus::NotDone).code(),
            families_before: row.families_before.into(),
            households_before: row.households_before.into(),
            families_after: row.families_after.into(),
            households_after: row.households_after.into(),
        })
        .collect()
}

/// File name prefix for a survey export
pub fn survey_export_prefix(survey: &str) -> String {
    format!("pemutakhiran-data-{}", survey)
}

// ============================================================================
// MAIL EXPORT
// ============================================================================

/// Mail export mirrors the table columns, labels instead of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailExportRow {
    #[serde(rename = "No. Surat")]
    pub number: String,

    #[serde(rename = "Tanggal")]
    pub date: String,

    #[serde(rename = "Pengirim")]
    pub origin: String,

    #[serde(rename = "Tujuan")]
    pub destination: String,

    #[serde(rename = "Klasifikasi")]
    pub classification: &'static str,

    #[serde(rename = "Uraian")]
    pub description: String,

    #[serde(rename = "Keterangan")]
    pub delivery_method: &'static str,

    #[serde(rename = "Surat Balasan")]
    pub is_reply_letter: &'static str,

    #[serde(rename = "Referensi")]
    pub reference: String,

    #[serde(rename = "Pembuat")]
    pub employee_name: String,

    #[serde(rename = "Link")]
    pub link: String,
}

pub fn mail_export_rows(mails: &[MailRecord]) -> Vec<MailExportRow> {
    mails
        .iter()
        .map(|mail| MailExportRow {
            number: mail.number.clone(),
            date: mail.date_label(),
            origin: mail.origin.clone(),
            destination: mail.destination.clone(),
            classification: mail.classification_label(),
            description: mail.description.clone(),
            delivery_method: mail.delivery_label(),
            is_reply_letter: mail.reply_label(),
            reference: mail.reference.clone(),
            employee_name: mail.employee_name.clone(),
            link: mail
                .link
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        })
        .collect()
}

// ============================================================================
// EXPORTER
// ============================================================================

/// Sink for flat export rows. Returns where the file went.
pub trait Exporter {
    fn export<R: Serialize>(&self, rows: &[R], file_prefix: &str) -> StoreResult<PathBuf>;
}

/// Writes `<dir>/<prefix>.csv` with a header row taken from the serde names.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        CsvExporter {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl Exporter for CsvExporter {
    fn export<R: Serialize>(&self, rows: &[R], file_prefix: &str) -> StoreResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.csv", file_prefix));

        let mut wtr = csv::Writer::from_path(&path)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;

        tracing::info!(path = %path.display(), rows = rows.len(), "export written");
        Ok(path)
    }
}

// Office Records - Core Library
// Shared by the terminal UI, the API server, and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod export;
pub mod mail;
pub mod notification;
pub mod reconciliation;
pub mod search;
pub mod sort;
pub mod store;
pub mod survey;

// Re-export commonly used types
pub use config::Config;
pub use entities::{
    format_long_date, Classification, DeliveryMethod, MailDraft, MailKind, MailRecord, Sample,
    UpdateDraft, UpdateRecord, UpdateStatus,
};
pub use error::{StoreError, StoreResult};
pub use export::{
    mail_export_rows, survey_export_prefix, survey_export_rows, CsvExporter, ExportCount,
    Exporter, MailExportRow, RegionCodes, SurveyExportRow,
};
pub use mail::{MailSection, MailStats};
pub use notification::{NoticeLevel, Notification};
pub use reconciliation::{latest_per_key, merge, reconcile, ReconciledRow, ReconciliationReport};
pub use search::{SearchFilter, Searchable, MAIL_SEARCH, SAMPLE_SEARCH};
pub use sort::{sort_rows, MailField, SampleField, SortDirection, SortState, SortValue, Sortable};
pub use store::{load_samples_csv, ImportSummary, RecordStore, SqliteStore};
pub use survey::SurveySection;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 📊 Survey Section - registry + updates, reconciled, filtered, sorted
//
// Every change goes to the store first; the visible rows are always a fresh
// recompute from what the store returned afterwards. Nothing is patched locally.
//
// Fetch is two-phase: registry first, updates only when the registry came back
// non-empty. A failed call keeps the previous rows and leaves a notification.

use crate::entities::UpdateDraft;
use crate::error::StoreResult;
use crate::export::{survey_export_prefix, survey_export_rows, Exporter, RegionCodes, SurveyExportRow};
use crate::notification::Notification;
use crate::reconciliation::{reconcile, ReconciledRow, ReconciliationReport};
use crate::search::normalize_query;
use crate::sort::{sort_rows, SampleField, SortState};
use crate::store::RecordStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct SurveySection<S> {
    store: Arc<S>,
    survey: String,
    region: RegionCodes,
    query: String,
    sort: SortState<SampleField>,
    rows: Vec<ReconciledRow>,
    report: ReconciliationReport,
    notices: Vec<Notification>,
}

impl<S: RecordStore> SurveySection<S> {
    pub fn new(store: Arc<S>, survey: &str) -> Self {
        SurveySection {
            store,
            survey: survey.to_string(),
            region: RegionCodes::default(),
            query: String::new(),
            sort: SortState::new(),
            rows: Vec::new(),
            report: ReconciliationReport::default(),
            notices: Vec::new(),
        }
    }

    pub fn with_region(mut self, region: RegionCodes) -> Self {
        self.region = region;
        self
    }

    pub fn survey(&self) -> &str {
        &self.survey
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_state(&self) -> SortState<SampleField> {
        self.sort
    }

    pub fn report(&self) -> &ReconciliationReport {
        &self.report
    }

    /// Reconciled rows in fetch order (filtered, unsorted)
    pub fn rows(&self) -> &[ReconciledRow] {
        &self.rows
    }

    /// Rows as displayed: current sort applied
    pub fn visible_rows(&self) -> Vec<ReconciledRow> {
        sort_rows(&self.rows, &self.sort)
    }

    pub fn toggle_sort(&mut self, field: SampleField) {
        self.sort.toggle(field);
    }

    pub fn set_sort(&mut self, sort: SortState<SampleField>) {
        self.sort = sort;
    }

    pub fn notices(&self) -> &[Notification] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notification) {
        if notice.is_error() {
            tracing::warn!(survey = %self.survey, message = %notice.message, "survey notice");
        } else {
            tracing::debug!(survey = %self.survey, message = %notice.message, "survey notice");
        }
        self.notices.push(notice);
    }

    async fn load(&self) -> StoreResult<(Vec<ReconciledRow>, ReconciliationReport)> {
        let samples = self
            .store
            .fetch_registry(&self.survey, normalize_query(&self.query))
            .await?;

        // Updates wait for a non-empty registry
        let updates = if samples.is_empty() {
            Vec::new()
        } else {
            self.store.fetch_updates(&self.survey).await?
        };

        Ok(reconcile(samples, updates))
    }

    /// Re-fetch and recompute. Returns false (and keeps the old rows) on failure.
    pub async fn refresh(&mut self) -> bool {
        match self.load().await {
            Ok((rows, report)) => {
                tracing::debug!(survey = %self.survey, "{}", report.summary());
                self.rows = rows;
                self.report = report;
                true
            }
            Err(e) => {
                tracing::error!(survey = %self.survey, error = %e, "failed to fetch survey rows");
                self.notify(Notification::error("Gagal memuat data pemutakhiran"));
                false
            }
        }
    }

    /// Change the search text and re-fetch. Debouncing is the caller's job.
    pub async fn set_query(&mut self, query: &str) -> bool {
        self.query = query.to_string();
        self.refresh().await
    }

    /// Save the form: an id means edit in place, no id means insert.
    pub async fn submit(&mut self, draft: UpdateDraft) -> bool {
        let result = match draft.id {
            Some(id) => self.store.update_update(&self.survey, id, &draft).await,
            None => self.store.insert_update(&self.survey, &draft).await.map(|_| ()),
        };

        let (ok_msg, err_msg) = if draft.is_edit() {
            (
                "Data pemutakhiran berhasil diperbarui",
                "Gagal memperbarui data pemutakhiran",
            )
        } else {
            (
                "Data pemutakhiran berhasil ditambahkan",
                "Gagal menambahkan data pemutakhiran",
            )
        };

        match result {
            Ok(()) => {
                self.notify(Notification::success(ok_msg));
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(survey = %self.survey, sample_code = %draft.sample_code, error = %e, "failed to save update");
                self.notify(Notification::error(err_msg));
                false
            }
        }
    }

    pub async fn delete(&mut self, id: i64) -> bool {
        match self.store.delete_update(&self.survey, id).await {
            Ok(()) => {
                self.notify(Notification::success("Data pemutakhiran berhasil dihapus"));
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(survey = %self.survey, id, error = %e, "failed to delete update");
                self.notify(Notification::error("Gagal menghapus data pemutakhiran"));
                false
            }
        }
    }

    /// Prefilled form for the row with `sample_code`
    pub fn edit_request(&self, sample_code: &str) -> Option<UpdateDraft> {
        self.rows
            .iter()
            .find(|r| r.sample_code() == sample_code)
            .map(|r| r.edit_draft())
    }

    /// Sample codes for the form picker, sorted
    pub async fn sample_choices(&mut self) -> Vec<String> {
        match self.store.fetch_registry(&self.survey, None).await {
            Ok(samples) => {
                let mut codes: Vec<String> = samples.into_iter().map(|s| s.sample_code).collect();
                codes.sort();
                codes
            }
            Err(e) => {
                tracing::error!(survey = %self.survey, error = %e, "failed to list samples");
                self.notify(Notification::error("Gagal memuat daftar sampel"));
                Vec::new()
            }
        }
    }

    /// Export transform over the filtered rows in fetch order
    pub fn export_rows(&self) -> Vec<SurveyExportRow> {
        survey_export_rows(&self.rows, &self.region)
    }

    pub fn export<E: Exporter>(&mut self, exporter: &E) -> Option<PathBuf> {
        let rows = self.export_rows();
        match exporter.export(&rows, &survey_export_prefix(&self.survey)) {
            Ok(path) => {
                self.notify(Notification::success(format!(
                    "Data berhasil diekspor ke {}",
                    path.display()
                )));
                Some(path)
            }
            Err(e) => {
                tracing::error!(survey = %self.survey, error = %e, "export failed");
                self.notify(Notification::error("Gagal mengekspor data"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Sample, UpdateRecord, UpdateStatus};
    use crate::export::{CsvExporter, ExportCount};
    use crate::sort::SortDirection;
    use crate::store::memory::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn create_test_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_samples(vec![
            Sample::new("ssn_m25", "A").with_area("Siak", "Kampung Dalam"),
            Sample::new("ssn_m25", "B").with_area("Mempura", "Benteng Hilir"),
            Sample::new("sakernas", "Z"),
        ]))
    }

    fn create_test_update(id: i64, code: &str, minute: u32, families_after: u32) -> UpdateRecord {
        UpdateRecord {
            id,
            survey: "ssn_m25".to_string(),
            sample_code: code.to_string(),
            families_before: None,
            households_before: None,
            families_after: Some(families_after),
            households_after: None,
            status: Some(UpdateStatus::Done),
            created_at: Utc.with_ymd_and_hms(2025, 2, 1, 9, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_refresh_reconciles_one_row_per_sample() {
        let store = create_test_store();
        store.push_update(create_test_update(1, "B", 0, 4));

        let mut section = SurveySection::new(store.clone(), "ssn_m25");
        assert!(section.refresh().await);

        let rows = section.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sample_code(), "A");
        assert_eq!(rows[0].update_id, None);
        assert_eq!(rows[1].sample_code(), "B");
        assert_eq!(rows[1].update_id, Some(1));
        assert_eq!(store.calls(), vec!["fetch_registry", "fetch_updates"]);
    }

    #[tokio::test]
    async fn test_latest_duplicate_wins() {
        let store = create_test_store();
        store.push_update(create_test_update(1, "A", 0, 4));
        store.push_update(create_test_update(2, "A", 30, 8));

        let mut section = SurveySection::new(store, "ssn_m25");
        section.refresh().await;

        assert_eq!(section.rows()[0].update_id, Some(2));
        assert_eq!(section.rows()[0].families_after, Some(8));
        assert_eq!(section.report().superseded, 1);
    }

    #[tokio::test]
    async fn test_updates_not_fetched_for_empty_registry() {
        let store = create_test_store();
        let mut section = SurveySection::new(store.clone(), "ssn_m25");

        assert!(section.set_query("no such village").await);

        assert!(section.rows().is_empty());
        assert_eq!(store.calls(), vec!["fetch_registry"]);
    }

    #[tokio::test]
    async fn test_search_filters_registry_before_merge() {
        let store = create_test_store();
        store.push_update(create_test_update(1, "A", 0, 4));
        let mut section = SurveySection::new(store, "ssn_m25");

        section.set_query("benteng").await;
        assert_eq!(section.rows().len(), 1);
        assert_eq!(section.rows()[0].sample_code(), "B");

        // Status lives on the update side, search never sees it
        section.set_query("sudah").await;
        assert!(section.rows().is_empty());
    }

    #[tokio::test]
    async fn test_submit_selects_operation_by_id() {
        let store = create_test_store();
        store.push_update(create_test_update(7, "B", 0, 4));
        let mut section = SurveySection::new(store.clone(), "ssn_m25");
        section.refresh().await;
        store.clear_calls();

        let mut edit = section.edit_request("B").unwrap();
        assert_eq!(edit.id, Some(7));
        edit.families_after = 6;
        assert!(section.submit(edit).await);
        assert_eq!(store.calls()[0], "update_update:7");

        store.clear_calls();
        let create = section.edit_request("A").unwrap();
        assert_eq!(create.id, None);
        assert!(section.submit(create).await);
        assert_eq!(store.calls()[0], "insert_update");

        let notices = section.take_notices();
        assert_eq!(notices[0].message, "Data pemutakhiran berhasil diperbarui");
        assert_eq!(notices[1].message, "Data pemutakhiran berhasil ditambahkan");
    }

    #[tokio::test]
    async fn test_write_triggers_full_refresh() {
        let store = create_test_store();
        let mut section = SurveySection::new(store.clone(), "ssn_m25");
        section.refresh().await;
        store.clear_calls();

        section.submit(UpdateDraft::new("A")).await;

        assert_eq!(
            store.calls(),
            vec!["insert_update", "fetch_registry", "fetch_updates"]
        );
        assert!(section.rows()[0].has_update());
        assert_eq!(section.rows()[0].status, Some(UpdateStatus::NotDone));
    }

    #[tokio::test]
    async fn test_delete_removes_update_from_view() {
        let store = create_test_store();
        store.push_update(create_test_update(3, "A", 0, 4));
        let mut section = SurveySection::new(store, "ssn_m25");
        section.refresh().await;

        assert!(section.delete(3).await);

        assert_eq!(section.rows().len(), 2);
        assert!(!section.rows()[0].has_update());
        assert_eq!(section.take_notices()[0].message, "Data pemutakhiran berhasil dihapus");
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_rows() {
        let store = create_test_store();
        store.push_update(create_test_update(1, "B", 0, 4));
        let mut section = SurveySection::new(store.clone(), "ssn_m25");
        section.refresh().await;
        let before = section.rows().to_vec();

        store.set_failing(true);
        assert!(!section.refresh().await);
        assert!(!section.submit(UpdateDraft::new("A")).await);
        assert!(!section.delete(1).await);

        assert_eq!(section.rows(), before.as_slice());
        let messages: Vec<_> = section
            .take_notices()
            .into_iter()
            .map(|n| (n.is_error(), n.message))
            .collect();
        assert_eq!(
            messages,
            vec![
                (true, "Gagal memuat data pemutakhiran".to_string()),
                (true, "Gagal menambahkan data pemutakhiran".to_string()),
                (true, "Gagal menghapus data pemutakhiran".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_updates_failure_after_registry_keeps_previous_state() {
        let store = create_test_store();
        store.push_update(create_test_update(1, "B", 0, 4));
        let mut section = SurveySection::new(store.clone(), "ssn_m25");
        assert!(section.refresh().await);
        let rows_before = section.rows().to_vec();
        let report_before = section.report().clone();

        // Would change the view if the merge ran with a partial result
        store.push_update(create_test_update(2, "A", 3, 7));
        store.fail_on("fetch_updates");
        store.clear_calls();

        assert!(!section.refresh().await);

        assert_eq!(store.calls(), vec!["fetch_registry", "fetch_updates"]);
        assert_eq!(section.rows(), rows_before.as_slice());
        assert_eq!(section.report(), &report_before);
        let notices = section.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert_eq!(notices[0].message, "Gagal memuat data pemutakhiran");
    }

    #[tokio::test]
    async fn test_visible_rows_sorted_export_unsorted() {
        let store = create_test_store();
        store.push_update(create_test_update(1, "A", 0, 2));
        store.push_update(create_test_update(2, "B", 5, 9));
        let mut section = SurveySection::new(store, "ssn_m25");
        section.refresh().await;

        section.toggle_sort(SampleField::FamiliesAfter);
        section.toggle_sort(SampleField::FamiliesAfter);
        assert_eq!(
            section.sort_state().active(),
            Some((SampleField::FamiliesAfter, SortDirection::Descending))
        );

        let visible: Vec<_> = section.visible_rows().iter().map(|r| r.sample_code().to_string()).collect();
        assert_eq!(visible, vec!["B", "A"]);

        let exported = section.export_rows();
        assert_eq!(exported[0].sample_code, "A");
        assert_eq!(exported[0].families_after, ExportCount::Count(2));
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = create_test_store();
        let mut section = SurveySection::new(store, "ssn_m25");
        section.refresh().await;

        let path = section.export(&CsvExporter::new(dir.path())).unwrap();

        assert!(path.exists());
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_sample_choices_sorted() {
        let store = Arc::new(MemoryStore::with_samples(vec![
            Sample::new("ssn_m25", "140503"),
            Sample::new("ssn_m25", "140501"),
        ]));
        let mut section = SurveySection::new(store, "ssn_m25");

        assert_eq!(section.sample_choices().await, vec!["140501", "140503"]);
    }
}

// ✉️ Mail Section - correspondence log for one direction
//
// Simpler path than the survey: store-side filter, in-memory sort, no merge.
// Same write policy: store first, then a full re-fetch.

use crate::entities::{MailDraft, MailKind, MailRecord};
use crate::export::{mail_export_rows, Exporter, MailExportRow};
use crate::notification::Notification;
use crate::search::normalize_query;
use crate::sort::{sort_rows, MailField, SortState};
use crate::store::RecordStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub struct MailSection<S> {
    store: Arc<S>,
    kind: MailKind,
    query: String,
    sort: SortState<MailField>,
    mails: Vec<MailRecord>,
    notices: Vec<Notification>,
}

impl<S: RecordStore> MailSection<S> {
    pub fn new(store: Arc<S>, kind: MailKind) -> Self {
        MailSection {
            store,
            kind,
            query: String::new(),
            sort: SortState::new(),
            mails: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn kind(&self) -> MailKind {
        self.kind
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_state(&self) -> SortState<MailField> {
        self.sort
    }

    pub fn mails(&self) -> &[MailRecord] {
        &self.mails
    }

    pub fn visible_mails(&self) -> Vec<MailRecord> {
        sort_rows(&self.mails, &self.sort)
    }

    pub fn toggle_sort(&mut self, field: MailField) {
        self.sort.toggle(field);
    }

    pub fn set_sort(&mut self, sort: SortState<MailField>) {
        self.sort = sort;
    }

    pub fn take_notices(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notification) {
        if notice.is_error() {
            tracing::warn!(kind = self.kind.as_str(), message = %notice.message, "mail notice");
        }
        self.notices.push(notice);
    }

    /// Lowercase section noun used in messages ("surat masuk")
    fn noun(&self) -> String {
        self.kind.title().to_lowercase()
    }

    pub async fn refresh(&mut self) -> bool {
        match self
            .store
            .fetch_mail(self.kind, normalize_query(&self.query))
            .await
        {
            Ok(mails) => {
                tracing::debug!(kind = self.kind.as_str(), count = mails.len(), "mail fetched");
                self.mails = mails;
                true
            }
            Err(e) => {
                tracing::error!(kind = self.kind.as_str(), error = %e, "failed to fetch mail");
                let msg = format!("Gagal memuat {}", self.noun());
                self.notify(Notification::error(msg));
                false
            }
        }
    }

    pub async fn set_query(&mut self, query: &str) -> bool {
        self.query = query.to_string();
        self.refresh().await
    }

    /// Save the mail form: an id means edit in place, no id means insert.
    pub async fn submit(&mut self, draft: MailDraft) -> bool {
        let result = match draft.id.as_deref() {
            Some(id) => self.store.update_mail(self.kind, id, &draft).await,
            None => self.store.insert_mail(self.kind, &draft).await.map(|_| ()),
        };

        let noun = self.noun();
        match result {
            Ok(()) => {
                let verb = if draft.id.is_some() { "diperbarui" } else { "ditambahkan" };
                self.notify(Notification::success(format!(
                    "{} berhasil {}",
                    self.kind.title(),
                    verb
                )));
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(kind = self.kind.as_str(), number = %draft.number, error = %e, "failed to save mail");
                let verb = if draft.id.is_some() { "memperbarui" } else { "menambahkan" };
                self.notify(Notification::error(format!("Gagal {} {}", verb, noun)));
                false
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        match self.store.delete_mail(self.kind, id).await {
            Ok(()) => {
                let msg = format!("{} berhasil dihapus", self.kind.title());
                self.notify(Notification::success(msg));
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(kind = self.kind.as_str(), id, error = %e, "failed to delete mail");
                let msg = format!("Gagal menghapus {}", self.noun());
                self.notify(Notification::error(msg));
                false
            }
        }
    }

    pub fn edit_request(&self, id: &str) -> Option<MailDraft> {
        self.mails.iter().find(|m| m.id == id).map(MailDraft::from)
    }

    /// Export rows in the order currently displayed
    pub fn export_rows(&self) -> Vec<MailExportRow> {
        mail_export_rows(&self.visible_mails())
    }

    pub fn export<E: Exporter>(&mut self, exporter: &E) -> Option<PathBuf> {
        let rows = self.export_rows();
        match exporter.export(&rows, self.kind.export_prefix()) {
            Ok(path) => {
                self.notify(Notification::success(format!(
                    "Data berhasil diekspor ke {}",
                    path.display()
                )));
                Some(path)
            }
            Err(e) => {
                tracing::error!(kind = self.kind.as_str(), error = %e, "export failed");
                self.notify(Notification::error("Gagal mengekspor data"));
                None
            }
        }
    }
}

// ============================================================================
// MAIL STATS
// ============================================================================

/// Totals for the home screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MailStats {
    pub incoming: usize,
    pub outgoing: usize,
    pub total: usize,
}

impl MailStats {
    pub async fn collect<S: RecordStore + ?Sized>(store: &S) -> crate::error::StoreResult<Self> {
        let incoming = store.count_mail(MailKind::Incoming).await?;
        let outgoing = store.count_mail(MailKind::Outgoing).await?;
        Ok(MailStats {
            incoming,
            outgoing,
            total: incoming + outgoing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortDirection;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn create_test_draft(number: &str, origin: &str, date: Option<NaiveDate>) -> MailDraft {
        MailDraft {
            number: number.to_string(),
            date,
            origin: origin.to_string(),
            destination: "BPS Kabupaten Siak".to_string(),
            classification: "TU".to_string(),
            description: "Undangan".to_string(),
            delivery_method: "email".to_string(),
            employee_name: "Dewi".to_string(),
            ..Default::default()
        }
    }

    async fn seeded_section() -> (Arc<MemoryStore>, MailSection<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let mut section = MailSection::new(store.clone(), MailKind::Outgoing);
        section
            .submit(create_test_draft("003", "Bagian Umum", NaiveDate::from_ymd_opt(2025, 1, 20)))
            .await;
        section
            .submit(create_test_draft("001", "Tim Statistik Sosial", None))
            .await;
        section
            .submit(create_test_draft("002", "Bagian Umum", NaiveDate::from_ymd_opt(2025, 1, 5)))
            .await;
        section.take_notices();
        store.clear_calls();
        (store, section)
    }

    fn numbers(mails: &[MailRecord]) -> Vec<&str> {
        mails.iter().map(|m| m.number.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fetch_order_is_newest_first() {
        let (_, section) = seeded_section().await;
        assert_eq!(numbers(section.mails()), vec!["002", "001", "003"]);
    }

    #[tokio::test]
    async fn test_date_sort_puts_missing_dates_last() {
        let (_, mut section) = seeded_section().await;

        section.toggle_sort(MailField::Date);
        assert_eq!(numbers(&section.visible_mails()), vec!["002", "003", "001"]);

        section.toggle_sort(MailField::Date);
        assert_eq!(section.sort_state().direction_of(MailField::Date), Some(SortDirection::Descending));
        assert_eq!(numbers(&section.visible_mails()), vec!["003", "002", "001"]);

        section.toggle_sort(MailField::Date);
        assert_eq!(numbers(&section.visible_mails()), vec!["002", "001", "003"]);
    }

    #[tokio::test]
    async fn test_query_filters_at_store() {
        let (store, mut section) = seeded_section().await;

        section.set_query("STATISTIK").await;

        assert_eq!(numbers(section.mails()), vec!["001"]);
        assert_eq!(store.calls(), vec!["fetch_mail:outgoing"]);
    }

    #[tokio::test]
    async fn test_edit_and_delete_round_trip() {
        let (store, mut section) = seeded_section().await;
        let id = section.mails()[0].id.clone();

        let mut draft = section.edit_request(&id).unwrap();
        draft.is_reply_letter = true;
        assert!(section.submit(draft).await);
        assert_eq!(store.calls()[0], format!("update_mail:{}", id));
        assert!(section.mails().iter().any(|m| m.id == id && m.is_reply_letter));

        assert!(section.delete(&id).await);
        assert_eq!(section.mails().len(), 2);

        let messages: Vec<_> = section.take_notices().into_iter().map(|n| n.message).collect();
        assert_eq!(
            messages,
            vec!["Surat Keluar berhasil diperbarui", "Surat Keluar berhasil dihapus"]
        );
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_list() {
        let (store, mut section) = seeded_section().await;
        store.set_failing(true);

        assert!(!section.delete("mail-1").await);

        assert_eq!(section.mails().len(), 3);
        let notice = &section.take_notices()[0];
        assert!(notice.is_error());
        assert_eq!(notice.message, "Gagal menghapus surat keluar");
    }

    #[tokio::test]
    async fn test_export_follows_display_order() {
        let (_, mut section) = seeded_section().await;
        section.toggle_sort(MailField::Number);

        let rows = section.export_rows();
        let out: Vec<_> = rows.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(out, vec!["001", "002", "003"]);
        assert_eq!(rows[0].date, "-");
        assert_eq!(rows[0].classification, "Ketatausahaan");
        assert_eq!(rows[0].is_reply_letter, "Tidak");
    }

    #[tokio::test]
    async fn test_mail_stats() {
        let (store, _) = seeded_section().await;
        let mut incoming = MailSection::new(store.clone(), MailKind::Incoming);
        incoming.submit(create_test_draft("M-1", "Pemkab", None)).await;

        let stats = MailStats::collect(store.as_ref()).await.unwrap();
        assert_eq!(stats, MailStats { incoming: 1, outgoing: 3, total: 4 });
    }
}

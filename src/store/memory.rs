//! In-memory store used by the orchestration tests. Records every call and can
//! be made to fail, either on every call or on one named operation.

use super::RecordStore;
use crate::entities::{MailDraft, MailKind, MailRecord, Sample, UpdateDraft, UpdateRecord};
use crate::error::{StoreError, StoreResult};
use crate::search::{normalize_query, MAIL_SEARCH, SAMPLE_SEARCH};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

#[derive(Default)]
struct MemoryState {
    samples: Vec<Sample>,
    updates: Vec<UpdateRecord>,
    mails: Vec<MailRecord>,
    next_id: i64,
    calls: Vec<String>,
    failing: bool,
    fail_on: Option<&'static str>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

fn clock(tick: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap() + Duration::seconds(tick)
}

impl MemoryStore {
    pub fn with_samples(samples: Vec<Sample>) -> Self {
        let store = MemoryStore::default();
        store.lock().samples = samples;
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    /// Insert a raw update, e.g. a legacy duplicate, bypassing the draft path.
    pub fn push_update(&self, update: UpdateRecord) {
        self.lock().updates.push(update);
    }

    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Fail only calls whose log entry starts with `operation`, e.g. "fetch_updates".
    pub fn fail_on(&self, operation: &'static str) {
        self.lock().fail_on = Some(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn begin(&self, call: String) -> StoreResult<std::sync::MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        state.calls.push(call.clone());
        let targeted = state.fail_on.map_or(false, |op| call.starts_with(op));
        if state.failing || targeted {
            return Err(StoreError::Constraint(format!("{} rejected", call)));
        }
        Ok(state)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_registry(
        &self,
        survey: &str,
        filter: Option<&str>,
    ) -> StoreResult<Vec<Sample>> {
        let state = self.begin("fetch_registry".to_string())?;
        let samples: Vec<Sample> = state
            .samples
            .iter()
            .filter(|s| s.survey == survey)
            .cloned()
            .collect();
        Ok(SAMPLE_SEARCH.apply(samples, filter.and_then(normalize_query).unwrap_or("")))
    }

    async fn fetch_updates(&self, survey: &str) -> StoreResult<Vec<UpdateRecord>> {
        let state = self.begin("fetch_updates".to_string())?;
        let mut updates: Vec<UpdateRecord> = state
            .updates
            .iter()
            .filter(|u| u.survey == survey)
            .cloned()
            .collect();
        updates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(updates)
    }

    async fn insert_update(&self, survey: &str, draft: &UpdateDraft) -> StoreResult<i64> {
        let mut state = self.begin("insert_update".to_string())?;
        state.next_id += 1;
        let id = state.next_id + 100;
        let created_at = clock(state.next_id);
        state.updates.push(UpdateRecord {
            id,
            survey: survey.to_string(),
            sample_code: draft.sample_code.clone(),
            families_before: Some(draft.families_before),
            households_before: Some(draft.households_before),
            families_after: Some(draft.families_after),
            households_after: Some(draft.households_after),
            status: Some(draft.status),
            created_at,
        });
        Ok(id)
    }

    async fn update_update(&self, _survey: &str, id: i64, draft: &UpdateDraft) -> StoreResult<()> {
        let mut state = self.begin(format!("update_update:{}", id))?;
        let update = state
            .updates
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("update {}", id)))?;
        update.families_before = Some(draft.families_before);
        update.households_before = Some(draft.households_before);
        update.families_after = Some(draft.families_after);
        update.households_after = Some(draft.households_after);
        update.status = Some(draft.status);
        Ok(())
    }

    async fn delete_update(&self, _survey: &str, id: i64) -> StoreResult<()> {
        let mut state = self.begin(format!("delete_update:{}", id))?;
        let before = state.updates.len();
        state.updates.retain(|u| u.id != id);
        if state.updates.len() == before {
            return Err(StoreError::NotFound(format!("update {}", id)));
        }
        Ok(())
    }

    async fn fetch_mail(
        &self,
        kind: MailKind,
        filter: Option<&str>,
    ) -> StoreResult<Vec<MailRecord>> {
        let state = self.begin(format!("fetch_mail:{}", kind.as_str()))?;
        let mut mails: Vec<MailRecord> = state
            .mails
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect();
        mails.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(MAIL_SEARCH.apply(mails, filter.and_then(normalize_query).unwrap_or("")))
    }

    async fn insert_mail(&self, kind: MailKind, draft: &MailDraft) -> StoreResult<String> {
        let mut state = self.begin(format!("insert_mail:{}", kind.as_str()))?;
        state.next_id += 1;
        let id = format!("mail-{}", state.next_id);
        let created_at = clock(state.next_id);
        state.mails.push(MailRecord {
            id: id.clone(),
            kind,
            number: draft.number.clone(),
            date: draft.date,
            origin: draft.origin.clone(),
            destination: draft.destination.clone(),
            classification: draft.classification.clone(),
            description: draft.description.clone(),
            delivery_method: draft.delivery_method.clone(),
            is_reply_letter: draft.is_reply_letter,
            reference: draft.reference.clone(),
            employee_name: draft.employee_name.clone(),
            link: draft.link.clone(),
            created_at,
        });
        Ok(id)
    }

    async fn update_mail(&self, kind: MailKind, id: &str, draft: &MailDraft) -> StoreResult<()> {
        let mut state = self.begin(format!("update_mail:{}", id))?;
        let mail = state
            .mails
            .iter_mut()
            .find(|m| m.kind == kind && m.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("mail {}", id)))?;
        mail.number = draft.number.clone();
        mail.date = draft.date;
        mail.origin = draft.origin.clone();
        mail.destination = draft.destination.clone();
        mail.classification = draft.classification.clone();
        mail.description = draft.description.clone();
        mail.delivery_method = draft.delivery_method.clone();
        mail.is_reply_letter = draft.is_reply_letter;
        mail.reference = draft.reference.clone();
        mail.employee_name = draft.employee_name.clone();
        mail.link = draft.link.clone();
        Ok(())
    }

    async fn delete_mail(&self, kind: MailKind, id: &str) -> StoreResult<()> {
        let mut state = self.begin(format!("delete_mail:{}", id))?;
        let before = state.mails.len();
        state.mails.retain(|m| !(m.kind == kind && m.id == id));
        if state.mails.len() == before {
            return Err(StoreError::NotFound(format!("mail {}", id)));
        }
        Ok(())
    }

    async fn count_mail(&self, kind: MailKind) -> StoreResult<usize> {
        let state = self.begin(format!("count_mail:{}", kind.as_str()))?;
        Ok(state.mails.iter().filter(|m| m.kind == kind).count())
    }
}

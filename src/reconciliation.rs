// ⚖️ Reconciliation Engine - one row per sample, always
//
// Samples (immutable registry) are left-joined with their latest update:
//   rows = merge(samples, latest_per_key(updates))
//
// The store hands updates back newest first, so the first update seen for a
// sample code is the one that wins. The reducer trusts that ordering and does
// not re-check timestamps.

use crate::entities::{Sample, UpdateDraft, UpdateRecord, UpdateStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// RECONCILED ROW
// ============================================================================

/// A sample plus its (possibly absent) latest update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    #[serde(flatten)]
    pub sample: Sample,

    /// Id of the update backing this row; None means the form should create one
    pub update_id: Option<i64>,

    pub families_before: Option<u32>,
    pub households_before: Option<u32>,
    pub families_after: Option<u32>,
    pub households_after: Option<u32>,
    pub status: Option<UpdateStatus>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReconciledRow {
    fn new(sample: Sample, update: Option<&UpdateRecord>) -> Self {
        ReconciledRow {
            sample,
            update_id: update.map(|u| u.id),
            families_before: update.and_then(|u| u.families_before),
            households_before: update.and_then(|u| u.households_before),
            families_after: update.and_then(|u| u.families_after),
            households_after: update.and_then(|u| u.households_after),
            status: update.and_then(|u| u.status),
            updated_at: update.map(|u| u.created_at),
        }
    }

    pub fn sample_code(&self) -> &str {
        &self.sample.sample_code
    }

    pub fn has_update(&self) -> bool {
        self.update_id.is_some()
    }

    /// Form payload for "edit this row": carries the update id when there is one,
    /// so submitting it edits in place instead of inserting.
    pub fn edit_draft(&self) -> UpdateDraft {
        UpdateDraft {
            id: self.update_id,
            sample_code: self.sample.sample_code.clone(),
            status: self.status.unwrap_or_default(),
            families_before: self.families_before.unwrap_or(0),
            households_before: self.households_before.unwrap_or(0),
            families_after: self.families_after.unwrap_or(0),
            households_after: self.households_after.unwrap_or(0),
        }
    }
}

// ============================================================================
// REDUCER
// ============================================================================

/// Collapse an update stream (newest first) into one update per sample code.
///
/// The first record seen for a key is kept and later ones are ignored, so with
/// the store's `created_at DESC` ordering the most recent update wins. Equal
/// timestamps resolve to whichever the store returned first.
pub fn latest_per_key<I>(updates: I) -> HashMap<String, UpdateRecord>
where
    I: IntoIterator<Item = UpdateRecord>,
{
    let mut latest = HashMap::new();
    for update in updates {
        latest.entry(update.sample_code.clone()).or_insert(update);
    }
    latest
}

// ============================================================================
// MERGE
// ============================================================================

/// Left join: exactly one row per sample, in registry order.
///
/// Updates whose sample code is not in `samples` produce no row. They are
/// counted as orphaned by [`reconcile`] but never shown.
pub fn merge(samples: Vec<Sample>, latest: &HashMap<String, UpdateRecord>) -> Vec<ReconciledRow> {
    samples
        .into_iter()
        .map(|sample| {
            let update = latest.get(&sample.sample_code);
            ReconciledRow::new(sample, update)
        })
        .collect()
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub sample_count: usize,
    pub update_count: usize,

    /// Samples that have an update
    pub matched: usize,

    /// Samples without any update
    pub unmatched: usize,

    /// Older duplicates dropped by the reducer
    pub superseded: usize,

    /// Latest updates whose sample is not in the registry result
    pub orphaned: usize,
}

impl ReconciliationReport {
    pub fn summary(&self) -> String {
        format!(
            "{} samples, {} updates: {} matched, {} without update, {} superseded, {} orphaned",
            self.sample_count,
            self.update_count,
            self.matched,
            self.unmatched,
            self.superseded,
            self.orphaned
        )
    }
}

/// Reduce and merge in one pass, returning the rows and what happened to the updates.
pub fn reconcile(
    samples: Vec<Sample>,
    updates: Vec<UpdateRecord>,
) -> (Vec<ReconciledRow>, ReconciliationReport) {
    let update_count = updates.len();
    let latest = latest_per_key(updates);

    let sample_keys: HashSet<&str> = samples.iter().map(|s| s.sample_code.as_str()).collect();
    let orphaned = latest
        .keys()
        .filter(|code| !sample_keys.contains(code.as_str()))
        .count();

    let sample_count = samples.len();
    let rows = merge(samples, &latest);
    let matched = rows.iter().filter(|r| r.has_update()).count();

    let report = ReconciliationReport {
        sample_count,
        update_count,
        matched,
        unmatched: sample_count - matched,
        superseded: update_count - latest.len(),
        orphaned,
    };

    (rows, report)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_update(id: i64, code: &str, minute: u32) -> UpdateRecord {
        UpdateRecord {
            id,
            survey: "ssn_m25".to_string(),
            sample_code: code.to_string(),
            families_before: Some(10),
            households_before: None,
            families_after: Some(12),
            households_after: Some(11),
            status: Some(UpdateStatus::Done),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, minute, 0).unwrap(),
        }
    }

    fn samples(codes: &[&str]) -> Vec<Sample> {
        codes.iter().map(|c| Sample::new("ssn_m25", c)).collect()
    }

    #[test]
    fn test_reducer_keeps_first_encountered() {
        // Newest first, as the store returns them
        let updates = vec![
            create_test_update(9, "A", 30),
            create_test_update(4, "B", 20),
            create_test_update(3, "A", 10),
            create_test_update(1, "A", 5),
        ];

        let latest = latest_per_key(updates);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest["A"].id, 9);
        assert_eq!(latest["B"].id, 4);
    }

    #[test]
    fn test_reducer_follows_input_order_not_timestamps() {
        // Ordering contract violated: older record first. Reducer does not second-guess it.
        let updates = vec![create_test_update(1, "A", 5), create_test_update(2, "A", 50)];

        let latest = latest_per_key(updates);
        assert_eq!(latest["A"].id, 1);
    }

    #[test]
    fn test_merge_scenario_preserves_registry_order() {
        let latest = latest_per_key(vec![create_test_update(1, "B", 0)]);

        let rows = merge(samples(&["A", "B"]), &latest);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sample_code(), "A");
        assert_eq!(rows[0].update_id, None);
        assert_eq!(rows[0].families_before, None);
        assert_eq!(rows[0].status, None);
        assert_eq!(rows[1].sample_code(), "B");
        assert_eq!(rows[1].update_id, Some(1));
        assert_eq!(rows[1].families_after, Some(12));
    }

    #[test]
    fn test_merge_length_equals_registry_length() {
        let registry = samples(&["A", "B", "C", "D"]);
        let updates = vec![
            create_test_update(5, "C", 40),
            create_test_update(4, "C", 30),
            create_test_update(3, "A", 20),
            create_test_update(2, "Z", 10),
        ];

        let (rows, report) = reconcile(registry, updates);

        assert_eq!(rows.len(), 4);
        assert_eq!(report.matched, 2);
        assert_eq!(report.unmatched, 2);
        assert_eq!(report.superseded, 1);
        assert_eq!(report.orphaned, 1);
    }

    #[test]
    fn test_orphaned_updates_are_dropped() {
        let latest = latest_per_key(vec![create_test_update(1, "GONE", 0)]);

        let rows = merge(samples(&["A"]), &latest);

        assert_eq!(rows.len(), 1);
        assert!(!rows[0].has_update());
    }

    #[test]
    fn test_zero_counts_are_kept() {
        let mut update = create_test_update(1, "A", 0);
        update.families_before = Some(0);

        let rows = merge(samples(&["A"]), &latest_per_key(vec![update]));

        assert_eq!(rows[0].families_before, Some(0));
    }

    #[test]
    fn test_edit_draft_selects_operation_by_id() {
        let latest = latest_per_key(vec![create_test_update(7, "B", 0)]);
        let rows = merge(samples(&["A", "B"]), &latest);

        let create = rows[0].edit_draft();
        assert_eq!(create.id, None);
        assert_eq!(create.status, UpdateStatus::NotDone);
        assert_eq!(create.families_before, 0);

        let edit = rows[1].edit_draft();
        assert_eq!(edit.id, Some(7));
        assert_eq!(edit.status, UpdateStatus::Done);
        assert_eq!(edit.households_before, 0);
        assert_eq!(edit.households_after, 11);
    }

    #[test]
    fn test_report_summary() {
        let (_, report) = reconcile(samples(&["A"]), vec![create_test_update(1, "A", 0)]);
        assert_eq!(
            report.summary(),
            "1 samples, 1 updates: 1 matched, 0 without update, 0 superseded, 0 orphaned"
        );
    }
}

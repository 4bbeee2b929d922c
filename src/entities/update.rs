// 🔄 Update Entity - progress reported against a sample
//
// One live update per sample is the normal case. The store does not enforce it,
// so readers have to cope with legacy duplicates (see reconciliation::latest_per_key).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// UPDATE STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpdateStatus {
    /// Listing not finished yet
    #[default]
    #[serde(rename = "belum")]
    NotDone,

    /// Listing finished for the block
    #[serde(rename = "sudah")]
    Done,
}

impl UpdateStatus {
    pub const ALL: [UpdateStatus; 2] = [UpdateStatus::NotDone, UpdateStatus::Done];

    /// Code persisted in the store and written to exports
    pub fn code(&self) -> &'static str {
        match self {
            UpdateStatus::NotDone => "belum",
            UpdateStatus::Done => "sudah",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpdateStatus::NotDone => "Belum Selesai",
            UpdateStatus::Done => "Sudah Selesai",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "belum" => Some(UpdateStatus::NotDone),
            "sudah" => Some(UpdateStatus::Done),
            _ => None,
        }
    }

    /// Display label for a raw status code; unknown or missing codes show "-"
    pub fn label_for(code: Option<&str>) -> &'static str {
        code.and_then(Self::from_code).map(|s| s.label()).unwrap_or("-")
    }

    pub fn is_done(&self) -> bool {
        matches!(self, UpdateStatus::Done)
    }
}

// ============================================================================
// UPDATE RECORD
// ============================================================================

/// Stored progress record. Counts are optional because legacy rows left them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Surrogate id - stable across edits
    pub id: i64,
    pub survey: String,

    /// Registry key this update belongs to
    pub sample_code: String,

    pub families_before: Option<u32>,
    pub households_before: Option<u32>,
    pub families_after: Option<u32>,
    pub households_after: Option<u32>,

    pub status: Option<UpdateStatus>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// UPDATE DRAFT (form payload)
// ============================================================================

/// What the update form submits. `id` decides between insert and edit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateDraft {
    #[serde(default)]
    pub id: Option<i64>,

    pub sample_code: String,

    #[serde(default)]
    pub status: UpdateStatus,

    #[serde(default)]
    pub families_before: u32,

    #[serde(default)]
    pub households_before: u32,

    #[serde(default)]
    pub families_after: u32,

    #[serde(default)]
    pub households_after: u32,
}

impl UpdateDraft {
    /// Blank draft for a new update on `sample_code`
    pub fn new(sample_code: &str) -> Self {
        UpdateDraft {
            sample_code: sample_code.to_string(),
            ..Default::default()
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }
}

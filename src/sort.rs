// ↕️ Sort Engine - tri-state column sort
//
// Toggling a column cycles ascending -> descending -> unsorted. Empty values
// always go last, whichever way the column is sorted. Sorting is stable.

use crate::entities::MailRecord;
use crate::reconciliation::ReconciledRow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

// ============================================================================
// SORT STATE
// ============================================================================

/// Current sort, `None` meaning fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    active: Option<(F, SortDirection)>,
}

impl<F> Default for SortState<F> {
    fn default() -> Self {
        SortState { active: None }
    }
}

impl<F: Copy + PartialEq> SortState<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(field: F, direction: SortDirection) -> Self {
        SortState {
            active: Some((field, direction)),
        }
    }

    pub fn active(&self) -> Option<(F, SortDirection)> {
        self.active
    }

    pub fn is_unsorted(&self) -> bool {
        self.active.is_none()
    }

    /// Direction for `field` if it is the sorted column.
    pub fn direction_of(&self, field: F) -> Option<SortDirection> {
        match self.active {
            Some((f, dir)) if f == field => Some(dir),
            _ => None,
        }
    }

    /// Advance the cycle for `field`. A different field always starts ascending.
    pub fn toggle(&mut self, field: F) {
        self.active = match self.active {
            Some((f, SortDirection::Ascending)) if f == field => {
                Some((field, SortDirection::Descending))
            }
            Some((f, SortDirection::Descending)) if f == field => None,
            _ => Some((field, SortDirection::Ascending)),
        };
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

// ============================================================================
// SORT VALUES
// ============================================================================

/// Comparable cell value. Each field always yields the same variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Count(u32),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Flag(bool),
}

impl SortValue {
    fn natural_cmp(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Count(a), SortValue::Count(b)) => a.cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Timestamp(a), SortValue::Timestamp(b)) => a.cmp(b),
            (SortValue::Flag(a), SortValue::Flag(b)) => a.cmp(b),
            // Mixed variants never come from one field
            _ => Ordering::Equal,
        }
    }
}

/// Row type that can be sorted by its field enum.
pub trait Sortable {
    type Field: Copy + PartialEq;

    fn sort_value(&self, field: Self::Field) -> Option<SortValue>;
}

/// Null-last comparison; only the order of present values follows `direction`.
pub fn compare_values(
    a: Option<&SortValue>,
    b: Option<&SortValue>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = a.natural_cmp(b);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
    }
}

/// Rows in display order. Unsorted state returns the input order untouched.
pub fn sort_rows<T>(rows: &[T], state: &SortState<T::Field>) -> Vec<T>
where
    T: Sortable + Clone,
{
    let mut sorted = rows.to_vec();
    if let Some((field, direction)) = state.active() {
        // Extract keys once; sort_by is stable
        let mut keyed: Vec<(Option<SortValue>, T)> = sorted
            .drain(..)
            .map(|row| (row.sort_value(field), row))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_values(a.as_ref(), b.as_ref(), direction));
        sorted = keyed.into_iter().map(|(_, row)| row).collect();
    }
    sorted
}

// ============================================================================
// SURVEY COLUMNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleField {
    SampleCode,
    District,
    Village,
    Supervisor,
    Enumerator,
    FamiliesBefore,
    HouseholdsBefore,
    FamiliesAfter,
    HouseholdsAfter,
    Status,
    UpdatedAt,
}

impl SampleField {
    pub const ALL: [SampleField; 11] = [
        SampleField::SampleCode,
        SampleField::District,
        SampleField::Village,
        SampleField::Supervisor,
        SampleField::Enumerator,
        SampleField::FamiliesBefore,
        SampleField::HouseholdsBefore,
        SampleField::FamiliesAfter,
        SampleField::HouseholdsAfter,
        SampleField::Status,
        SampleField::UpdatedAt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SampleField::SampleCode => "sample_code",
            SampleField::District => "district",
            SampleField::Village => "village",
            SampleField::Supervisor => "supervisor",
            SampleField::Enumerator => "enumerator",
            SampleField::FamiliesBefore => "families_before",
            SampleField::HouseholdsBefore => "households_before",
            SampleField::FamiliesAfter => "families_after",
            SampleField::HouseholdsAfter => "households_after",
            SampleField::Status => "status",
            SampleField::UpdatedAt => "updated_at",
        }
    }

    /// Column header shown in the table
    pub fn header(&self) -> &'static str {
        match self {
            SampleField::SampleCode => "NKS",
            SampleField::District => "Kecamatan",
            SampleField::Village => "Desa/Kelurahan",
            SampleField::Supervisor => "PML",
            SampleField::Enumerator => "PPL",
            SampleField::FamiliesBefore => "Kel. Sebelum",
            SampleField::HouseholdsBefore => "RT Sebelum",
            SampleField::FamiliesAfter => "Kel. Hasil",
            SampleField::HouseholdsAfter => "RT Hasil",
            SampleField::Status => "Status",
            SampleField::UpdatedAt => "Diperbarui",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl Sortable for ReconciledRow {
    type Field = SampleField;

    fn sort_value(&self, field: SampleField) -> Option<SortValue> {
        let text = |s: &str| Some(SortValue::Text(s.to_string()));
        match field {
            SampleField::SampleCode => text(&self.sample.sample_code),
            SampleField::District => text(&self.sample.district),
            SampleField::Village => text(&self.sample.village),
            SampleField::Supervisor => text(&self.sample.supervisor),
            SampleField::Enumerator => text(&self.sample.enumerator),
            SampleField::FamiliesBefore => self.families_before.map(SortValue::Count),
            SampleField::HouseholdsBefore => self.households_before.map(SortValue::Count),
            SampleField::FamiliesAfter => self.families_after.map(SortValue::Count),
            SampleField::HouseholdsAfter => self.households_after.map(SortValue::Count),
            SampleField::Status => self.status.map(|s| SortValue::Flag(s.is_done())),
            SampleField::UpdatedAt => self.updated_at.map(SortValue::Timestamp),
        }
    }
}

// ============================================================================
// MAIL COLUMNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailField {
    Number,
    Date,
    Origin,
    Destination,
    Classification,
    Description,
    DeliveryMethod,
    IsReplyLetter,
    Reference,
    EmployeeName,
}

impl MailField {
    pub const ALL: [MailField; 10] = [
        MailField::Number,
        MailField::Date,
        MailField::Origin,
        MailField::Destination,
        MailField::Classification,
        MailField::Description,
        MailField::DeliveryMethod,
        MailField::IsReplyLetter,
        MailField::Reference,
        MailField::EmployeeName,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MailField::Number => "number",
            MailField::Date => "date",
            MailField::Origin => "origin",
            MailField::Destination => "destination",
            MailField::Classification => "classification",
            MailField::Description => "description",
            MailField::DeliveryMethod => "delivery_method",
            MailField::IsReplyLetter => "is_reply_letter",
            MailField::Reference => "reference",
            MailField::EmployeeName => "employee_name",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            MailField::Number => "No. Surat",
            MailField::Date => "Tanggal",
            MailField::Origin => "Pengirim",
            MailField::Destination => "Tujuan",
            MailField::Classification => "Klasifikasi",
            MailField::Description => "Uraian",
            MailField::DeliveryMethod => "Keterangan",
            MailField::IsReplyLetter => "Surat Balasan",
            MailField::Reference => "Referensi",
            MailField::EmployeeName => "Pembuat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl Sortable for MailRecord {
    type Field = MailField;

    fn sort_value(&self, field: MailField) -> Option<SortValue> {
        let text = |s: &str| Some(SortValue::Text(s.to_string()));
        match field {
            MailField::Number => text(&self.number),
            MailField::Date => self.date.map(SortValue::Date),
            MailField::Origin => text(&self.origin),
            MailField::Destination => text(&self.destination),
            // Sorted by stored code, like the raw column
            MailField::Classification => text(&self.classification),
            MailField::Description => text(&self.description),
            MailField::DeliveryMethod => text(&self.delivery_method),
            MailField::IsReplyLetter => Some(SortValue::Flag(self.is_reply_letter)),
            MailField::Reference => text(&self.reference),
            MailField::EmployeeName => text(&self.employee_name),
        }
    }
}

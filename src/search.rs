// 🔍 Search Filter - case-insensitive substring match over configured fields
//
// One field list per entity type drives both the in-memory matcher and the
// SQL predicate the store pushes down. Both paths fold case with `fold_case`;
// the SQLite store registers it as the `fold()` scalar function.
//
// The query is used verbatim: only the empty string disables filtering, and
// surrounding whitespace is part of the needle.
//
// Survey rows are filtered on the registry side only (before the merge), so a
// query never looks at status or counts.

use crate::entities::MailRecord;
use crate::entities::Sample;
use crate::reconciliation::ReconciledRow;
use std::borrow::Cow;

/// Anything that can expose text for a named search field.
pub trait Searchable {
    /// Text for `field`, or None when the field does not apply to this item.
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFilter {
    fields: &'static [&'static str],
}

/// Registry search: sample code, area and field staff
pub const SAMPLE_SEARCH: SearchFilter =
    SearchFilter::new(&["sample_code", "district", "village", "supervisor", "enumerator"]);

/// Mail search: every free-text column shown in the mail tables
pub const MAIL_SEARCH: SearchFilter = SearchFilter::new(&[
    "number",
    "origin",
    "destination",
    "description",
    "reference",
    "employee_name",
]);

impl SearchFilter {
    pub const fn new(fields: &'static [&'static str]) -> Self {
        SearchFilter { fields }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// True when at least one configured field contains `query`, ignoring case.
    /// The empty query matches everything.
    pub fn matches<T: Searchable>(&self, item: &T, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = fold_case(query);

        self.fields.iter().any(|field| {
            item.search_text(field)
                .map(|text| fold_case(&text).contains(&needle))
                .unwrap_or(false)
        })
    }

    /// Keep the matching items, preserving order.
    pub fn apply<T: Searchable>(&self, items: Vec<T>, query: &str) -> Vec<T> {
        if query.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.matches(item, query))
            .collect()
    }

    /// Store-side predicate: `(instr(fold(a), fold(?N)) > 0 OR ...)`.
    ///
    /// All fields share the single positional parameter `?{param}`, bound to the
    /// query as typed. `fold` must be registered on the connection. Field names
    /// are static configuration, never user input.
    pub fn sql_predicate(&self, param: usize) -> String {
        let clauses: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("instr({FOLD_FN}({}), {FOLD_FN}(?{})) > 0", field, param))
            .collect();
        format!("({})", clauses.join(" OR "))
    }
}

/// Name of the SQL scalar function wrapping [`fold_case`]
pub const FOLD_FN: &str = "fold";

/// Unicode case folding shared by the in-memory matcher and the SQL `fold()`.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// None when the query should not filter at all.
pub fn normalize_query(query: &str) -> Option<&str> {
    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}

// ============================================================================
// SEARCHABLE IMPLEMENTATIONS
// ============================================================================

impl Searchable for Sample {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
        let text = match field {
            "sample_code" => &self.sample_code,
            "district" => &self.district,
            "village" => &self.village,
            "supervisor" => &self.supervisor,
            "enumerator" => &self.enumerator,
            _ => return None,
        };
        Some(Cow::Borrowed(text.as_str()))
    }
}

impl Searchable for ReconciledRow {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
        // Registry fields only
        self.sample.search_text(field)
    }
}

impl Searchable for MailRecord {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
        let text = match field {
            "number" => &self.number,
            "origin" => &self.origin,
            "destination" => &self.destination,
            "description" => &self.description,
            "reference" => &self.reference,
            "employee_name" => &self.employee_name,
            _ => return None,
        };
        Some(Cow::Borrowed(text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UpdateStatus;

    fn create_test_samples() -> Vec<Sample> {
        vec![
            Sample::new("ssn_m25", "140501")
                .with_area("Siak", "Kampung Dalam")
                .with_staff("Rahmat", "Dewi"),
            Sample::new("ssn_m25", "140502")
                .with_area("Mempura", "Benteng Hilir")
                .with_staff("Sari", "Budi"),
            Sample::new("ssn_m25", "140733")
                .with_area("Sungai Apit", "Teluk Lanus")
                .with_staff("Rahmat", "Yanti"),
        ]
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let result = SAMPLE_SEARCH.apply(create_test_samples(), "");
        assert_eq!(result.len(), 3);

    }

    #[test]
    fn test_whitespace_is_part_of_the_query() {
        assert!(SAMPLE_SEARCH.apply(create_test_samples(), "   ").is_empty());
        assert!(SAMPLE_SEARCH.apply(create_test_samples(), " siak").is_empty());

        // Inner spaces still match multi-word villages
        let result = SAMPLE_SEARCH.apply(create_test_samples(), "kampung dalam");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_fold_case_is_unicode_aware() {
        let samples = vec![Sample::new("ssn_m25", "140509").with_staff("Ömer", "Çelik")];
        assert_eq!(SAMPLE_SEARCH.apply(samples.clone(), "ömer").len(), 1);
        assert_eq!(SAMPLE_SEARCH.apply(samples, "ÇELIK").len(), 1);
        assert_eq!(fold_case("ÖMER"), "ömer");
    }

    #[test]
    fn test_no_match_returns_empty() {
        let result = SAMPLE_SEARCH.apply(create_test_samples(), "pekanbaru");
        assert!(result.is_empty());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let result = SAMPLE_SEARCH.apply(create_test_samples(), "RAHMAT");
        let codes: Vec<_> = result.iter().map(|s| s.sample_code.as_str()).collect();
        assert_eq!(codes, vec!["140501", "140733"]);

        let result = SAMPLE_SEARCH.apply(create_test_samples(), "benteng");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].sample_code, "140502");
    }

    #[test]
    fn test_any_configured_field_matches() {
        let result = SAMPLE_SEARCH.apply(create_test_samples(), "0733");
        assert_eq!(result.len(), 1);

        let result = SAMPLE_SEARCH.apply(create_test_samples(), "yanti");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_reconciled_rows_ignore_update_fields() {
        let row = ReconciledRow {
            sample: create_test_samples().remove(0),
            update_id: Some(1),
            families_before: Some(42),
            households_before: None,
            families_after: None,
            households_after: None,
            status: Some(UpdateStatus::Done),
            updated_at: None,
        };

        assert!(!SAMPLE_SEARCH.matches(&row, "sudah"));
        assert!(!SAMPLE_SEARCH.matches(&row, "42"));
        assert!(SAMPLE_SEARCH.matches(&row, "kampung"));
    }

    #[test]
    fn test_sql_predicate_shape() {
        let filter = SearchFilter::new(&["a", "b"]);
        assert_eq!(
            filter.sql_predicate(2),
            "(instr(fold(a), fold(?2)) > 0 OR instr(fold(b), fold(?2)) > 0)"
        );
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  siak "), Some("  siak "));
        assert_eq!(normalize_query(""), None);
    }
}

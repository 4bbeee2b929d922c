use super::RecordStore;
use crate::entities::{
    MailDraft, MailKind, MailRecord, Sample, UpdateDraft, UpdateRecord, UpdateStatus,
};
use crate::error::{StoreError, StoreResult};
use crate::search::{fold_case, normalize_query, FOLD_FN, MAIL_SEARCH, SAMPLE_SEARCH};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Register `fold(text)` so search predicates fold case the same way the
/// in-memory matcher does. SQLite's own `lower()` only folds ASCII.
fn register_functions(conn: &Connection) -> StoreResult<()> {
    conn.create_scalar_function(
        FOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| fold_case(&t)))
        },
    )?;
    Ok(())
}

pub fn setup_database(conn: &Connection) -> StoreResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Survey registry + progress updates
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS samples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            survey TEXT NOT NULL,
            sample_code TEXT NOT NULL,
            district TEXT NOT NULL DEFAULT '',
            village TEXT NOT NULL DEFAULT '',
            supervisor TEXT NOT NULL DEFAULT '',
            enumerator TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (survey, sample_code)
        )",
        [],
    )?;

    // No foreign key to samples: legacy updates may outlive their sample
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sample_updates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            survey TEXT NOT NULL,
            sample_code TEXT NOT NULL,
            families_before INTEGER,
            households_before INTEGER,
            families_after INTEGER,
            households_after INTEGER,
            status TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Mail log (one table per direction, same shape)
    // ==========================================================================
    for kind in MailKind::ALL {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    number TEXT NOT NULL,
                    date TEXT,
                    origin TEXT NOT NULL DEFAULT '',
                    destination TEXT NOT NULL DEFAULT '',
                    classification TEXT NOT NULL DEFAULT '',
                    description TEXT NOT NULL DEFAULT '',
                    delivery_method TEXT NOT NULL DEFAULT '',
                    is_reply_letter INTEGER NOT NULL DEFAULT 0,
                    reference TEXT NOT NULL DEFAULT '',
                    employee_name TEXT NOT NULL DEFAULT '',
                    link TEXT,
                    created_at TEXT NOT NULL
                )",
                kind.table()
            ),
            [],
        )?;
    }

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_updates_survey_created
         ON sample_updates(survey, created_at)",
        [],
    )?;

    Ok(())
}

/// Result of a registry import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

/// SQLite-backed store. The connection is shared behind a mutex and every call
/// runs on the blocking pool so async callers are never stalled by disk I/O.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        setup_database(&conn)?;
        register_functions(&conn)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&guard)
        })
        .await?
    }

    /// Seed registry entries. Samples already present are skipped, so the same
    /// allocation file can be imported twice.
    pub async fn import_samples(&self, samples: Vec<Sample>) -> StoreResult<ImportSummary> {
        self.with_conn(move |conn| {
            let mut summary = ImportSummary::default();

            for sample in &samples {
                let result = conn.execute(
                    "INSERT INTO samples (survey, sample_code, district, village, supervisor, enumerator)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        sample.survey,
                        sample.sample_code,
                        sample.district,
                        sample.village,
                        sample.supervisor,
                        sample.enumerator,
                    ],
                );

                match result {
                    Ok(_) => summary.inserted += 1,
                    Err(rusqlite::Error::SqliteFailure(err, _))
                        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        summary.duplicates += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            tracing::info!(
                inserted = summary.inserted,
                duplicates = summary.duplicates,
                "samples imported"
            );
            Ok(summary)
        })
        .await
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    // Fixed width so the TEXT column orders chronologically
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn affected_or_not_found(affected: usize, what: String) -> StoreResult<()> {
    if affected == 0 {
        Err(StoreError::NotFound(what))
    } else {
        Ok(())
    }
}

fn update_from_row(row: &Row<'_>) -> rusqlite::Result<UpdateRecord> {
    let status: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(UpdateRecord {
        id: row.get(0)?,
        survey: row.get(1)?,
        sample_code: row.get(2)?,
        families_before: row.get(3)?,
        households_before: row.get(4)?,
        families_after: row.get(5)?,
        households_after: row.get(6)?,
        status: status.as_deref().and_then(UpdateStatus::from_code),
        created_at: parse_timestamp(&created_at).unwrap_or_default(),
    })
}

fn mail_from_row(row: &Row<'_>, kind: MailKind) -> rusqlite::Result<MailRecord> {
    let date: Option<String> = row.get(2)?;
    let created_at: String = row.get(12)?;

    Ok(MailRecord {
        id: row.get(0)?,
        kind,
        number: row.get(1)?,
        date: date.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
        origin: row.get(3)?,
        destination: row.get(4)?,
        classification: row.get(5)?,
        description: row.get(6)?,
        delivery_method: row.get(7)?,
        is_reply_letter: row.get(8)?,
        reference: row.get(9)?,
        employee_name: row.get(10)?,
        link: row.get(11)?,
        created_at: parse_timestamp(&created_at).unwrap_or_default(),
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_registry(
        &self,
        survey: &str,
        filter: Option<&str>,
    ) -> StoreResult<Vec<Sample>> {
        let mut values = vec![survey.to_string()];
        let mut sql = String::from(
            "SELECT survey, sample_code, district, village, supervisor, enumerator
             FROM samples
             WHERE survey = ?1",
        );
        if let Some(query) = filter.and_then(normalize_query) {
            sql.push_str(" AND ");
            sql.push_str(&SAMPLE_SEARCH.sql_predicate(2));
            values.push(query.to_string());
        }
        sql.push_str(" ORDER BY sample_code");

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let samples = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(Sample {
                        survey: row.get(0)?,
                        sample_code: row.get(1)?,
                        district: row.get(2)?,
                        village: row.get(3)?,
                        supervisor: row.get(4)?,
                        enumerator: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(samples)
        })
        .await
    }

    async fn fetch_updates(&self, survey: &str) -> StoreResult<Vec<UpdateRecord>> {
        let survey = survey.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, survey, sample_code, families_before, households_before,
                        families_after, households_after, status, created_at
                 FROM sample_updates
                 WHERE survey = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;
            let updates = stmt
                .query_map([&survey], update_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(updates)
        })
        .await
    }

    async fn insert_update(&self, survey: &str, draft: &UpdateDraft) -> StoreResult<i64> {
        let survey = survey.to_string();
        let draft = draft.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sample_updates (
                    survey, sample_code, families_before, households_before,
                    families_after, households_after, status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    survey,
                    draft.sample_code,
                    draft.families_before,
                    draft.households_before,
                    draft.families_after,
                    draft.households_after,
                    draft.status.code(),
                    timestamp(Utc::now()),
                ],
            )
            .map_err(StoreError::from_sqlite)?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn update_update(&self, survey: &str, id: i64, draft: &UpdateDraft) -> StoreResult<()> {
        let survey = survey.to_string();
        let draft = draft.clone();
        self.with_conn(move |conn| {
            let affected = conn
                .execute(
                    "UPDATE sample_updates
                     SET sample_code = ?1, families_before = ?2, households_before = ?3,
                         families_after = ?4, households_after = ?5, status = ?6
                     WHERE id = ?7 AND survey = ?8",
                    params![
                        draft.sample_code,
                        draft.families_before,
                        draft.households_before,
                        draft.families_after,
                        draft.households_after,
                        draft.status.code(),
                        id,
                        survey,
                    ],
                )
                .map_err(StoreError::from_sqlite)?;
            affected_or_not_found(affected, format!("update {}", id))
        })
        .await
    }

    async fn delete_update(&self, survey: &str, id: i64) -> StoreResult<()> {
        let survey = survey.to_string();
        self.with_conn(move |conn| {
            let affected = conn.execute(
                "DELETE FROM sample_updates WHERE id = ?1 AND survey = ?2",
                params![id, survey],
            )?;
            affected_or_not_found(affected, format!("update {}", id))
        })
        .await
    }

    async fn fetch_mail(
        &self,
        kind: MailKind,
        filter: Option<&str>,
    ) -> StoreResult<Vec<MailRecord>> {
        let mut values: Vec<String> = Vec::new();
        let mut sql = format!(
            "SELECT id, number, date, origin, destination, classification, description,
                    delivery_method, is_reply_letter, reference, employee_name, link, created_at
             FROM {}",
            kind.table()
        );
        if let Some(query) = filter.and_then(normalize_query) {
            sql.push_str(" WHERE ");
            sql.push_str(&MAIL_SEARCH.sql_predicate(1));
            values.push(query.to_string());
        }
        sql.push_str(" ORDER BY created_at DESC");

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mails = stmt
                .query_map(params_from_iter(values.iter()), |row| mail_from_row(row, kind))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(mails)
        })
        .await
    }

    async fn insert_mail(&self, kind: MailKind, draft: &MailDraft) -> StoreResult<String> {
        let draft = draft.clone();
        self.with_conn(move |conn| {
            let id = uuid::Uuid::new_v4().to_string();
            conn.execute(
                &format!(
                    "INSERT INTO {} (
                        id, number, date, origin, destination, classification, description,
                        delivery_method, is_reply_letter, reference, employee_name, link, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    kind.table()
                ),
                params![
                    id,
                    draft.number,
                    draft.date.map(|d| d.format(DATE_FORMAT).to_string()),
                    draft.origin,
                    draft.destination,
                    draft.classification,
                    draft.description,
                    draft.delivery_method,
                    draft.is_reply_letter,
                    draft.reference,
                    draft.employee_name,
                    draft.link,
                    timestamp(Utc::now()),
                ],
            )
            .map_err(StoreError::from_sqlite)?;
            Ok(id)
        })
        .await
    }

    async fn update_mail(&self, kind: MailKind, id: &str, draft: &MailDraft) -> StoreResult<()> {
        let id = id.to_string();
        let draft = draft.clone();
        self.with_conn(move |conn| {
            let affected = conn
                .execute(
                    &format!(
                        "UPDATE {}
                         SET number = ?1, date = ?2, origin = ?3, destination = ?4,
                             classification = ?5, description = ?6, delivery_method = ?7,
                             is_reply_letter = ?8, reference = ?9, employee_name = ?10, link = ?11
                         WHERE id = ?12",
                        kind.table()
                    ),
                    params![
                        draft.number,
                        draft.date.map(|d| d.format(DATE_FORMAT).to_string()),
                        draft.origin,
                        draft.destination,
                        draft.classification,
                        draft.description,
                        draft.delivery_method,
                        draft.is_reply_letter,
                        draft.reference,
                        draft.employee_name,
                        draft.link,
                        id,
                    ],
                )
                .map_err(StoreError::from_sqlite)?;
            affected_or_not_found(affected, format!("{} mail {}", kind.as_str(), id))
        })
        .await
    }

    async fn delete_mail(&self, kind: MailKind, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let affected = conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
                [&id],
            )?;
            affected_or_not_found(affected, format!("{} mail {}", kind.as_str(), id))
        })
        .await
    }

    async fn count_mail(&self, kind: MailKind) -> StoreResult<usize> {
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table()),
                [],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::page::{Cookie, Page, Resource, ResourceRequest};
use crate::state::FetchState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::CheckerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CheckerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CheckerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, CheckerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            start_url: row.get(3)?,
            config_hash: row.get(4)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                .unwrap_or(RunStatus::Running),
        })
    }

    /// Loads cookies, responses and requests of one page
    fn load_page_details(&self, page_id: i64, page: &mut Page) -> StorageResult<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value, domain FROM cookies WHERE page_id = ?1 ORDER BY id")?;
        page.cookies = stmt
            .query_map(params![page_id], |row| {
                Ok(Cookie {
                    name: row.get(0)?,
                    value: row.get(1)?,
                    domain: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT url, status_code, headers FROM resources WHERE page_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![page_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<u16>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (url, status_code, headers) in rows {
            page.elements.push(Resource {
                url,
                status_code,
                headers: serde_json::from_str(&headers)?,
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT url, sizes, failure, headers FROM requests WHERE page_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![page_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (url, sizes, failure, headers) in rows {
            let sizes: BTreeMap<String, u64> = serde_json::from_str(&sizes)?;
            let request = ResourceRequest {
                url,
                sizes,
                failure,
                headers: serde_json::from_str(&headers)?,
            };
            if request.failure.is_some() {
                page.failed_requests.push(request);
            } else {
                page.requests.push(request);
            }
        }

        Ok(())
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, start_url: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, start_url, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, start_url, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, start_url, config_hash, status FROM runs WHERE id = ?1",
        )?;

        stmt.query_row(params![run_id], Self::run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, start_url, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt.query_row([], Self::run_from_row).optional()?;

        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn save_page(&mut self, run_id: i64, page: &Page) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO pages (run_id, url, title, html, screenshot, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                page.url,
                page.title,
                page.html,
                page.screenshot,
                page.created.to_rfc3339()
            ],
        )?;
        let page_id = tx.last_insert_rowid();

        for cookie in &page.cookies {
            tx.execute(
                "INSERT INTO cookies (page_id, name, value, domain) VALUES (?1, ?2, ?3, ?4)",
                params![page_id, cookie.name, cookie.value, cookie.domain],
            )?;
        }

        for resource in &page.elements {
            tx.execute(
                "INSERT INTO resources (page_id, url, status_code, headers) VALUES (?1, ?2, ?3, ?4)",
                params![
                    page_id,
                    resource.url,
                    resource.status_code,
                    serde_json::to_string(&resource.headers)?
                ],
            )?;
        }

        for request in page.requests.iter().chain(page.failed_requests.iter()) {
            tx.execute(
                "INSERT INTO requests (page_id, url, sizes, failure, headers) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    page_id,
                    request.url,
                    serde_json::to_string(&request.sizes)?,
                    request.failure,
                    serde_json::to_string(&request.headers)?
                ],
            )?;
        }

        tx.commit()?;
        tracing::trace!("Stored page {} as {}", page.url, page_id);
        Ok(page_id)
    }

    fn load_pages(&self, run_id: i64) -> StorageResult<Vec<Page>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, html, screenshot, created_at FROM pages WHERE run_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<Vec<u8>>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut pages = Vec::with_capacity(rows.len());
        for (page_id, url, title, html, screenshot, created_at) in rows {
            let created = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", created_at, e)))?
                .with_timezone(&Utc);

            let mut page = Page::new(url);
            page.title = title;
            page.html = html;
            page.screenshot = screenshot;
            page.created = created;
            self.load_page_details(page_id, &mut page)?;
            pages.push(page);
        }

        Ok(pages)
    }

    fn count_pages(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Visit Tracking =====

    fn record_visit(&mut self, run_id: i64, url: &str, state: FetchState) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO visits (run_id, url, state, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, url, state.to_db_string(), now],
        )?;
        Ok(())
    }

    fn visit_summary(&self, run_id: i64) -> StorageResult<HashMap<FetchState, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT state, COUNT(*) FROM visits WHERE run_id = ?1 GROUP BY state")?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = HashMap::new();
        for (state, count) in rows {
            let state = FetchState::from_db_string(&state)
                .ok_or_else(|| StorageError::Database(format!("Unknown visit state '{}'", state)))?;
            summary.insert(state, count as u64);
        }

        Ok(summary)
    }
}

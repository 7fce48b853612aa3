//! Completion-log reads and the monotone upsert.

use super::{Database, now_ms};
use crate::dates::DateKey;
use crate::error::{CoreError, CoreResult};
use crate::types::CompletionLog;
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn parse_log_row(row: &Row) -> rusqlite::Result<CompletionLog> {
    Ok(CompletionLog {
        user_id: row.get("user_id")?,
        template_id: row.get("template_id")?,
        log_date: row.get("log_date")?,
        completed: row.get::<_, i64>("completed")? != 0,
        completed_at: row.get("completed_at")?,
    })
}

/// Aggregate completion numbers over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionStats {
    pub total_logs: i64,
    pub completed_logs: i64,
    /// Completed-log count per template id.
    pub completed_by_template: HashMap<String, i64>,
}

impl Database {
    /// Upsert a completion log keyed by `(user, template, date)`.
    ///
    /// The write is monotone on the completed flag: a row that is already
    /// completed never reverts, no matter the order concurrent requests from
    /// multiple devices land in. `completed_at` keeps the first completion
    /// time.
    pub fn upsert_completion_log(
        &self,
        user_id: &str,
        template_id: &str,
        date: DateKey,
        completed: bool,
    ) -> CoreResult<CompletionLog> {
        let completed_at = if completed { Some(now_ms()) } else { None };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO completion_logs (user_id, template_id, log_date, completed, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id, template_id, log_date) DO UPDATE SET
                     completed = MAX(completion_logs.completed, excluded.completed),
                     completed_at = COALESCE(completion_logs.completed_at, excluded.completed_at)",
                params![user_id, template_id, date, completed as i64, completed_at],
            )?;

            let mut stmt = conn.prepare(
                "SELECT user_id, template_id, log_date, completed, completed_at
                 FROM completion_logs
                 WHERE user_id = ?1 AND template_id = ?2 AND log_date = ?3",
            )?;
            let log = stmt.query_row(params![user_id, template_id, date], parse_log_row)?;
            Ok(log)
        })
        .map_err(CoreError::database)
    }

    /// Fetch one completion log, if present.
    pub fn get_completion_log(
        &self,
        user_id: &str,
        template_id: &str,
        date: DateKey,
    ) -> CoreResult<Option<CompletionLog>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, template_id, log_date, completed, completed_at
                 FROM completion_logs
                 WHERE user_id = ?1 AND template_id = ?2 AND log_date = ?3",
            )?;
            match stmt.query_row(params![user_id, template_id, date], parse_log_row) {
                Ok(log) => Ok(Some(log)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .map_err(CoreError::database)
    }

    /// Is there a completed log for this key? Drives checklist visibility.
    pub fn has_completed_log(
        &self,
        user_id: &str,
        template_id: &str,
        date: DateKey,
    ) -> CoreResult<bool> {
        Ok(self
            .get_completion_log(user_id, template_id, date)?
            .is_some_and(|log| log.completed))
    }

    /// List a user's completion logs over an inclusive date range.
    pub fn list_completion_logs(
        &self,
        user_id: &str,
        from: DateKey,
        to: DateKey,
    ) -> CoreResult<Vec<CompletionLog>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, template_id, log_date, completed, completed_at
                 FROM completion_logs
                 WHERE user_id = ?1 AND log_date >= ?2 AND log_date <= ?3
                 ORDER BY log_date, template_id",
            )?;
            let logs = stmt
                .query_map(params![user_id, from, to], parse_log_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(logs)
        })
        .map_err(CoreError::database)
    }

    /// List a user's completion logs for a single day.
    pub fn list_completion_logs_on(
        &self,
        user_id: &str,
        date: DateKey,
    ) -> CoreResult<Vec<CompletionLog>> {
        self.list_completion_logs(user_id, date, date)
    }

    /// Number of completed logs a template has accumulated.
    pub fn count_completed_logs(&self, user_id: &str, template_id: &str) -> CoreResult<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM completion_logs
                 WHERE user_id = ?1 AND template_id = ?2 AND completed = 1",
                params![user_id, template_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .map_err(CoreError::database)
    }

    /// Aggregate completion stats over an inclusive date range.
    pub fn completion_stats(
        &self,
        user_id: &str,
        from: DateKey,
        to: DateKey,
    ) -> CoreResult<CompletionStats> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT template_id, completed FROM completion_logs
                 WHERE user_id = ?1 AND log_date >= ?2 AND log_date <= ?3",
            )?;

            let mut total_logs = 0i64;
            let mut completed_logs = 0i64;
            let mut completed_by_template: HashMap<String, i64> = HashMap::new();

            let mut rows = stmt.query(params![user_id, from, to])?;
            while let Some(row) = rows.next()? {
                let template_id: String = row.get(0)?;
                let completed: i64 = row.get(1)?;

                total_logs += 1;
                if completed != 0 {
                    completed_logs += 1;
                    *completed_by_template.entry(template_id).or_insert(0) += 1;
                }
            }

            Ok(CompletionStats {
                total_logs,
                completed_logs,
                completed_by_template,
            })
        })
        .map_err(CoreError::database)
    }
}

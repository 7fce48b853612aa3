//! Completion recording: idempotent checks, ignored unchecks, and the
//! one-off auto-archive side effect.

use super::Database;
use crate::dates::DateKey;
use crate::error::{CoreError, CoreResult};
use crate::types::{LedgerOutcome, TaskType};
use tracing::{info, warn};

impl Database {
    /// Record a completion action for `(user, template, date)`.
    ///
    /// - `checked = false` never touches the ledger; completion history is
    ///   not cleared through this path.
    /// - A repeat check against an already-completed key changes nothing.
    /// - Otherwise a completed log row is upserted, and a one-off template
    ///   is auto-archived in the same logical operation.
    ///
    /// When the archive step fails after the log write succeeded, the log is
    /// kept and the call fails with `CompletionSavedArchiveFailed`, so the
    /// caller retries only the archive rather than re-recording completion.
    pub fn record_completion(
        &self,
        user_id: &str,
        template_id: &str,
        date: DateKey,
        checked: bool,
    ) -> CoreResult<LedgerOutcome> {
        // Ownership and existence are enforced even for no-op paths;
        // authorization failures are never silently ignored.
        let template = self.get_template(user_id, template_id)?;

        if !checked {
            return Ok(LedgerOutcome::UncheckIgnored);
        }

        if let Some(log) = self.get_completion_log(user_id, template_id, date)?
            && log.completed
        {
            return Ok(LedgerOutcome::AlreadyCompleted { log });
        }

        let log = self.upsert_completion_log(user_id, template_id, date, true)?;
        info!(template_id, date = %date, "completion recorded");

        let archived = match template.task_type {
            TaskType::Recurring => false,
            TaskType::OneOff => match self.auto_archive(user_id, template_id) {
                Ok(_) => true,
                Err(err) => {
                    warn!(template_id, error = %err, "completion saved but archive failed");
                    return Err(CoreError::archive_failed(template_id, err));
                }
            },
        };

        Ok(LedgerOutcome::Recorded { log, archived })
    }
}

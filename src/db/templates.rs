//! Template CRUD and lifecycle operations.

use super::{Database, now_ms};
use crate::error::{CoreError, CoreResult};
use crate::lifecycle;
use crate::types::{NewTemplate, TaskTemplate, TaskType, TemplatePatch};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

pub(crate) fn parse_template_row(row: &Row) -> rusqlite::Result<TaskTemplate> {
    let task_type_raw: String = row.get("task_type")?;
    let mask_raw: Option<i64> = row.get("recurrence_days_mask")?;

    Ok(TaskTemplate {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        // Unknown type strings cannot occur under the schema CHECK; treat a
        // hand-edited row as recurring rather than failing the whole query.
        task_type: TaskType::from_str(&task_type_raw).unwrap_or(TaskType::Recurring),
        is_active: row.get::<_, i64>("is_active")? != 0,
        archived_at: row.get("archived_at")?,
        recurrence_interval_days: crate::types::normalize_interval(
            row.get("recurrence_interval_days")?,
        ),
        recurrence_days_mask: crate::types::normalize_mask(mask_raw),
        due_date: row.get("due_date")?,
        due_time: row.get("due_time")?,
        category: row.get("category")?,
        project_id: row.get("project_id")?,
        priority: row.get("priority")?,
        difficulty: row.get("difficulty")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a template using an existing connection.
pub(crate) fn get_template_internal(
    conn: &Connection,
    template_id: &str,
) -> Result<Option<TaskTemplate>> {
    let mut stmt = conn.prepare("SELECT * FROM task_templates WHERE id = ?1")?;

    let result = stmt.query_row(params![template_id], parse_template_row);

    match result {
        Ok(template) => Ok(Some(template)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Reject a malformed interval before it reaches the store.
fn validate_interval(interval_days: i64) -> CoreResult<i64> {
    if interval_days < 1 {
        return Err(CoreError::invalid_value(
            "recurrence_interval_days",
            "recurrence interval must be a positive number of days",
        ));
    }
    Ok(interval_days)
}

/// Reject an out-of-range mask; fold zero into "no mask".
fn validate_mask(mask: i64) -> CoreResult<Option<u8>> {
    match mask {
        0 => Ok(None),
        1..=127 => Ok(Some(mask as u8)),
        _ => Err(CoreError::invalid_value(
            "recurrence_days_mask",
            "weekday mask must be an integer between 0 and 127",
        )),
    }
}

impl Database {
    /// Fetch a template, enforcing ownership.
    pub fn get_template(&self, user_id: &str, template_id: &str) -> CoreResult<TaskTemplate> {
        let template = self
            .with_conn(|conn| get_template_internal(conn, template_id))
            .map_err(CoreError::database)?
            .ok_or_else(|| CoreError::template_not_found(template_id))?;

        if template.user_id != user_id {
            return Err(CoreError::not_owner(template_id, user_id));
        }

        Ok(template)
    }

    /// List all templates owned by a user, newest first.
    pub fn list_templates(&self, user_id: &str) -> CoreResult<Vec<TaskTemplate>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM task_templates WHERE user_id = ?1
                 ORDER BY created_at DESC, id",
            )?;
            let templates = stmt
                .query_map(params![user_id], parse_template_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(templates)
        })
        .map_err(CoreError::database)
    }

    /// Create a template. New templates start in the Active lifecycle state.
    pub fn create_template(&self, user_id: &str, input: NewTemplate) -> CoreResult<TaskTemplate> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(CoreError::missing_field("title"));
        }
        let task_type = input
            .task_type
            .ok_or_else(|| CoreError::missing_field("task_type"))?;
        let interval = validate_interval(input.recurrence_interval_days.unwrap_or(1))?;
        let mask = match input.recurrence_days_mask {
            Some(raw) => validate_mask(raw)?,
            None => None,
        };

        let id = Uuid::new_v4().to_string();
        let now = now_ms();
        let template = TaskTemplate {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            notes: input.notes,
            task_type,
            is_active: true,
            archived_at: None,
            recurrence_interval_days: interval,
            recurrence_days_mask: mask,
            due_date: input.due_date,
            due_time: input.due_time,
            category: input.category,
            project_id: input.project_id,
            priority: input.priority.unwrap_or(0),
            difficulty: input.difficulty,
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO task_templates (
                     id, user_id, title, notes, task_type, is_active, archived_at,
                     recurrence_interval_days, recurrence_days_mask, due_date, due_time,
                     category, project_id, priority, difficulty, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, 1, NULL, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
                params![
                    template.id,
                    template.user_id,
                    template.title,
                    template.notes,
                    template.task_type.as_str(),
                    template.recurrence_interval_days,
                    template.recurrence_days_mask.map(i64::from),
                    template.due_date,
                    template.due_time,
                    template.category,
                    template.project_id,
                    template.priority,
                    template.difficulty,
                    now,
                ],
            )?;
            Ok(())
        })
        .map_err(CoreError::database)?;

        info!(template_id = %template.id, task_type = template.task_type.as_str(), "template created");
        Ok(template)
    }

    /// Apply a field-level patch to a template the user owns.
    pub fn update_template(
        &self,
        user_id: &str,
        template_id: &str,
        patch: TemplatePatch,
    ) -> CoreResult<TaskTemplate> {
        let mut template = self.get_template(user_id, template_id)?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(CoreError::missing_field("title"));
            }
            template.title = title;
        }
        if let Some(interval) = patch.recurrence_interval_days {
            template.recurrence_interval_days = validate_interval(interval)?;
        }
        if let Some(mask) = patch.recurrence_days_mask {
            template.recurrence_days_mask = match mask {
                Some(raw) => validate_mask(raw)?,
                None => None,
            };
        }
        if let Some(notes) = patch.notes {
            template.notes = notes;
        }
        if let Some(due_date) = patch.due_date {
            template.due_date = due_date;
        }
        if let Some(due_time) = patch.due_time {
            template.due_time = due_time;
        }
        if let Some(category) = patch.category {
            template.category = category;
        }
        if let Some(project_id) = patch.project_id {
            template.project_id = project_id;
        }
        if let Some(priority) = patch.priority {
            template.priority = priority;
        }
        if let Some(difficulty) = patch.difficulty {
            template.difficulty = difficulty;
        }

        template.updated_at = now_ms();
        self.persist_template(&template)?;
        debug!(template_id = %template.id, "template updated");
        Ok(template)
    }

    /// Toggle a template's active flag.
    ///
    /// Rejected with a lifecycle violation when reactivating a completed
    /// (archived) one-off.
    pub fn set_active(
        &self,
        user_id: &str,
        template_id: &str,
        active: bool,
    ) -> CoreResult<TaskTemplate> {
        let mut template = self.get_template(user_id, template_id)?;
        lifecycle::check_activation(&template, active)?;

        template.is_active = active;
        template.updated_at = now_ms();
        self.persist_template(&template)?;
        info!(template_id = %template.id, active, "template activation toggled");
        Ok(template)
    }

    /// User-facing "delete": archive the template so completion history
    /// stays valid. Rows are never hard-deleted.
    pub fn archive_template(&self, user_id: &str, template_id: &str) -> CoreResult<TaskTemplate> {
        let mut template = self.get_template(user_id, template_id)?;

        let now = now_ms();
        template.archived_at = Some(now);
        template.is_active = false;
        template.updated_at = now;
        self.persist_template(&template)?;
        info!(template_id = %template.id, "template archived");
        Ok(template)
    }

    /// Archive a one-off after completion. Fails loudly on a recurring
    /// template; that path is a caller bug, not a user condition.
    pub fn auto_archive(&self, user_id: &str, template_id: &str) -> CoreResult<TaskTemplate> {
        let mut template = self.get_template(user_id, template_id)?;
        lifecycle::check_auto_archive(&template)?;

        if template.is_archived() {
            // Already terminal; repeated completion calls stay idempotent.
            return Ok(template);
        }

        let now = now_ms();
        template.archived_at = Some(now);
        template.is_active = false;
        template.updated_at = now;
        self.persist_template(&template)?;
        info!(template_id = %template.id, "one-off auto-archived");
        Ok(template)
    }

    /// Change a template's type.
    ///
    /// Recurring → one-off is rejected while completed logs exist.
    pub fn convert_type(
        &self,
        user_id: &str,
        template_id: &str,
        target: TaskType,
    ) -> CoreResult<TaskTemplate> {
        let mut template = self.get_template(user_id, template_id)?;
        if template.task_type == target {
            return Ok(template);
        }

        let completed = self.count_completed_logs(user_id, template_id)?;
        lifecycle::check_conversion(&template, target, completed)?;

        template.task_type = target;
        template.updated_at = now_ms();
        self.persist_template(&template)?;
        info!(template_id = %template.id, target = target.as_str(), "template type converted");
        Ok(template)
    }

    fn persist_template(&self, template: &TaskTemplate) -> CoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE task_templates SET
                     title = ?2, notes = ?3, task_type = ?4, is_active = ?5,
                     archived_at = ?6, recurrence_interval_days = ?7,
                     recurrence_days_mask = ?8, due_date = ?9, due_time = ?10,
                     category = ?11, project_id = ?12, priority = ?13,
                     difficulty = ?14, updated_at = ?15
                 WHERE id = ?1",
                params![
                    template.id,
                    template.title,
                    template.notes,
                    template.task_type.as_str(),
                    template.is_active as i64,
                    template.archived_at,
                    template.recurrence_interval_days,
                    template.recurrence_days_mask.map(i64::from),
                    template.due_date,
                    template.due_time,
                    template.category,
                    template.project_id,
                    template.priority,
                    template.difficulty,
                    template.updated_at,
                ],
            )?;
            Ok(())
        })
        .map_err(CoreError::database)
    }
}

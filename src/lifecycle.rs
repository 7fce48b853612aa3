//! Lifecycle state machine for task templates.
//!
//! Active → Inactive is freely reversible; Archived is terminal for one-off
//! templates. Recurring templates only move between Active and Inactive, and
//! never enter Archived in normal operation.

use crate::error::{CoreError, CoreResult};
use crate::types::{TaskTemplate, TaskType};
use serde::{Deserialize, Serialize};

/// Lifecycle state derived from a template's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Active,
    Inactive,
    Archived,
}

/// The template's current lifecycle state. `archived_at` dominates the
/// active flag.
pub fn state_of(template: &TaskTemplate) -> LifecycleState {
    if template.is_archived() {
        LifecycleState::Archived
    } else if template.is_active {
        LifecycleState::Active
    } else {
        LifecycleState::Inactive
    }
}

/// Guard for activate/deactivate.
///
/// The one forbidden move: reactivating an archived one-off. Archival marks
/// a one-off as completed for good; turning it back on would resurrect a
/// finished task.
pub fn check_activation(template: &TaskTemplate, activate: bool) -> CoreResult<()> {
    if activate && template.task_type == TaskType::OneOff && template.is_archived() {
        return Err(CoreError::reactivation_blocked(&template.id));
    }
    Ok(())
}

/// Guard for the auto-archive transition.
///
/// Archiving a recurring template through this path is a programming error
/// in the caller, not a user-facing condition, so it fails loudly.
pub fn check_auto_archive(template: &TaskTemplate) -> CoreResult<()> {
    if template.task_type != TaskType::OneOff {
        return Err(CoreError::not_one_off(&template.id));
    }
    Ok(())
}

/// Guard for type conversion.
///
/// Recurring → one-off is rejected once completed logs exist: a one-off's
/// lifecycle assumes at most one completion, and rewriting the type under
/// existing history would make that history lie. One-off → recurring carries
/// no such restriction, and deliberately leaves `archived_at` untouched so an
/// archived one-off cannot escape its terminal state via conversion.
pub fn check_conversion(
    template: &TaskTemplate,
    target: TaskType,
    completed_count: i64,
) -> CoreResult<()> {
    if template.task_type == TaskType::Recurring
        && target == TaskType::OneOff
        && completed_count > 0
    {
        return Err(CoreError::conversion_blocked(&template.id, completed_count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn one_off() -> TaskTemplate {
        TaskTemplate {
            id: "t1".into(),
            user_id: "u1".into(),
            title: "File taxes".into(),
            notes: None,
            task_type: TaskType::OneOff,
            is_active: true,
            archived_at: None,
            recurrence_interval_days: 1,
            recurrence_days_mask: None,
            due_date: None,
            due_time: None,
            category: None,
            project_id: None,
            priority: 0,
            difficulty: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn archived_dominates_active_flag() {
        let mut t = one_off();
        t.archived_at = Some(1);
        t.is_active = true;
        assert_eq!(state_of(&t), LifecycleState::Archived);
    }

    #[test]
    fn archived_one_off_cannot_reactivate() {
        let mut t = one_off();
        t.archived_at = Some(1);
        let err = check_activation(&t, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::ReactivationBlocked);
        // Deactivating it further is still a no-op-safe toggle.
        assert!(check_activation(&t, false).is_ok());
    }

    #[test]
    fn recurring_templates_toggle_freely() {
        let mut t = one_off();
        t.task_type = TaskType::Recurring;
        assert!(check_activation(&t, true).is_ok());
        assert!(check_activation(&t, false).is_ok());
    }

    #[test]
    fn auto_archive_rejects_recurring() {
        let mut t = one_off();
        t.task_type = TaskType::Recurring;
        let err = check_auto_archive(&t).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotOneOff);
    }

    #[test]
    fn conversion_guard_depends_on_completed_count() {
        let mut t = one_off();
        t.task_type = TaskType::Recurring;
        assert!(check_conversion(&t, TaskType::OneOff, 0).is_ok());
        let err = check_conversion(&t, TaskType::OneOff, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConversionBlocked);
        assert!(err.message.contains('2'));
    }

    #[test]
    fn one_off_to_recurring_is_unguarded() {
        let t = one_off();
        assert!(check_conversion(&t, TaskType::Recurring, 5).is_ok());
    }
}

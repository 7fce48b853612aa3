//! Core types for the habitline recurrence and lifecycle engine.

use crate::dates::DateKey;
use serde::{Deserialize, Serialize};

/// Classification of a task template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Repeats on an interval/weekday schedule; never archived in normal use.
    Recurring,
    /// Completed once, then auto-archived.
    OneOff,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Recurring => "recurring",
            TaskType::OneOff => "one_off",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "recurring" => Some(TaskType::Recurring),
            "one_off" => Some(TaskType::OneOff),
            _ => None,
        }
    }
}

/// Coerce a stored interval into a usable one: positive, fallback 1.
///
/// Guards the modulo in the recurrence evaluator against zero and negative
/// values that may arrive from loosely validated historical rows.
pub fn normalize_interval(interval_days: i64) -> i64 {
    if interval_days >= 1 { interval_days } else { 1 }
}

/// Coerce a stored weekday mask into the valid 1–127 range.
///
/// Zero means "no weekday restriction" and is folded into `None`; anything
/// outside 0–127 is treated as no mask rather than a hard error.
pub fn normalize_mask(mask: Option<i64>) -> Option<u8> {
    match mask {
        Some(m) if (1..=127).contains(&m) => Some(m as u8),
        _ => None,
    }
}

/// A user-owned task definition, recurring or one-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub notes: Option<String>,
    pub task_type: TaskType,

    // Lifecycle flags
    pub is_active: bool,
    /// Set means permanently retired. One-off only in normal operation.
    pub archived_at: Option<i64>,

    // Recurrence rule (meaningful only for recurring templates)
    pub recurrence_interval_days: i64,
    /// 7-bit weekday mask, bit 0 = Sunday through bit 6 = Saturday.
    /// `None` means no weekday restriction.
    pub recurrence_days_mask: Option<u8>,

    // Scheduling anchor and display fields
    pub due_date: Option<DateKey>,
    /// `HH:MM`, used only for ordering within a day.
    pub due_time: Option<String>,
    pub category: Option<String>,
    pub project_id: Option<String>,
    pub priority: i32,
    pub difficulty: Option<i32>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskTemplate {
    /// The reference date interval recurrence is counted from: the due date
    /// if set, else the creation day. `None` if neither yields a valid day,
    /// in which case the template never occurs (fails closed).
    pub fn anchor_date(&self) -> Option<DateKey> {
        self.due_date.or_else(|| DateKey::from_ms(self.created_at))
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Input for creating a task template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTemplate {
    pub title: String,
    pub task_type: Option<TaskType>,
    pub notes: Option<String>,
    pub recurrence_interval_days: Option<i64>,
    /// Raw mask as exchanged across the boundary (integer 0–127).
    pub recurrence_days_mask: Option<i64>,
    pub due_date: Option<DateKey>,
    pub due_time: Option<String>,
    pub category: Option<String>,
    pub project_id: Option<String>,
    pub priority: Option<i32>,
    pub difficulty: Option<i32>,
}

/// Field-level patch for template edits.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatePatch {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub recurrence_interval_days: Option<i64>,
    pub recurrence_days_mask: Option<Option<i64>>,
    pub due_date: Option<Option<DateKey>>,
    pub due_time: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub project_id: Option<Option<String>>,
    pub priority: Option<i32>,
    pub difficulty: Option<Option<i32>>,
}

/// One row per (user, template, calendar date) marking completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionLog {
    pub user_id: String,
    pub template_id: String,
    pub log_date: DateKey,
    pub completed: bool,
    pub completed_at: Option<i64>,
}

/// Whether an occurrence came from a recurrence rule or a dated one-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceKind {
    Recurring,
    Single,
}

/// A template projected onto one date of a query window. Derived, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occurrence {
    pub template_id: String,
    pub user_id: String,
    pub date: DateKey,
    pub kind: OccurrenceKind,
    pub title: String,
    pub due_time: Option<String>,
    pub category: Option<String>,
    pub project_id: Option<String>,
    pub priority: i32,
}

impl Occurrence {
    /// Stable key for idempotent re-rendering and de-duplication across
    /// overlapping windows.
    pub fn instance_key(&self) -> String {
        format!("{}:{}", self.template_id, self.date)
    }
}

/// Display grouping for expanded occurrences: project wins over category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum GroupKey {
    Project(String),
    Category(String),
    Uncategorized,
}

/// One display group of ordered occurrences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceGroup {
    pub key: GroupKey,
    pub occurrences: Vec<Occurrence>,
}

/// Outcome of a completion-ledger write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum LedgerOutcome {
    /// A completed log row was written. `archived` reports whether the
    /// one-off auto-archive side effect ran.
    Recorded { log: CompletionLog, archived: bool },
    /// The log was already completed for this key; nothing changed.
    AlreadyCompleted { log: CompletionLog },
    /// Uncheck requests never clear history; nothing changed.
    UncheckIgnored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_coercion_falls_back_to_one() {
        assert_eq!(normalize_interval(3), 3);
        assert_eq!(normalize_interval(1), 1);
        assert_eq!(normalize_interval(0), 1);
        assert_eq!(normalize_interval(-7), 1);
    }

    #[test]
    fn mask_outside_range_means_no_mask() {
        assert_eq!(normalize_mask(Some(0b0100010)), Some(0b0100010));
        assert_eq!(normalize_mask(Some(127)), Some(127));
        assert_eq!(normalize_mask(Some(0)), None);
        assert_eq!(normalize_mask(Some(128)), None);
        assert_eq!(normalize_mask(Some(-1)), None);
        assert_eq!(normalize_mask(None), None);
    }

    #[test]
    fn anchor_prefers_due_date_over_creation_day() {
        let mut t = template_fixture();
        t.due_date = DateKey::parse("2024-06-01");
        assert_eq!(t.anchor_date(), DateKey::parse("2024-06-01"));

        t.due_date = None;
        // created_at below is 2024-01-01T00:00:00Z
        assert_eq!(t.anchor_date(), DateKey::parse("2024-01-01"));
    }

    fn template_fixture() -> TaskTemplate {
        TaskTemplate {
            id: "t1".into(),
            user_id: "u1".into(),
            title: "Water the plants".into(),
            notes: None,
            task_type: TaskType::Recurring,
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
            created_at: 1_704_067_200_000,
            updated_at: 1_704_067_200_000,
        }
    }
}

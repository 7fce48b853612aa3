//! Visibility rules for the "today" checklist.

use crate::config::CompletedTodayPolicy;
use crate::dates::DateKey;
use crate::recurrence::mask_allows;
use crate::types::{TaskTemplate, TaskType};

/// Resolved visibility of a template in today's checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    /// `done_today` lets show-but-mark-done callers render the check state.
    Visible { done_today: bool },
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible { .. })
    }
}

/// Decide whether `template` belongs in the checklist for `today`.
///
/// Rules, in order:
/// 1. A completed log for today settles it: hidden under
///    [`CompletedTodayPolicy::Hide`], shown-as-done under
///    [`CompletedTodayPolicy::ShowMarkedDone`] (so a finished one-off stays
///    counted for the day it was completed).
/// 2. One-off: appears iff not archived.
/// 3. Recurring: appears iff active, not archived, and its weekday mask (if
///    any) admits today. The mask check lives here, in the resolver itself,
///    so every view of "today" agrees.
///
/// Pure; evaluated once per template per render, persists nothing.
pub fn resolve(
    template: &TaskTemplate,
    completed_today: bool,
    today: DateKey,
    policy: CompletedTodayPolicy,
) -> Visibility {
    if completed_today {
        return match policy {
            CompletedTodayPolicy::Hide => Visibility::Hidden,
            CompletedTodayPolicy::ShowMarkedDone => Visibility::Visible { done_today: true },
        };
    }

    let visible = match template.task_type {
        TaskType::OneOff => !template.is_archived(),
        TaskType::Recurring => {
            template.is_active && !template.is_archived() && mask_allows(template, today)
        }
    };

    if visible {
        Visibility::Visible { done_today: false }
    } else {
        Visibility::Hidden
    }
}

/// Boolean form of [`resolve`] for callers that only need show/hide.
pub fn should_appear(
    template: &TaskTemplate,
    completed_today: bool,
    today: DateKey,
    policy: CompletedTodayPolicy,
) -> bool {
    resolve(template, completed_today, today, policy).is_visible()
}

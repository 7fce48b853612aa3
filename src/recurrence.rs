//! Recurrence evaluation for recurring templates.
//!
//! A recurring template occurs on a date when the whole-day distance from its
//! anchor is a non-negative multiple of the interval, and (when a weekday
//! mask is present) the date's weekday bit is set.

use crate::dates::DateKey;
use crate::types::{TaskTemplate, TaskType, normalize_interval, normalize_mask};

/// Does `template` have an occurrence on `date`?
///
/// Defined for recurring templates; anything else never occurs. A template
/// whose anchor cannot be resolved to a valid calendar day also never occurs
/// (fails closed rather than guessing).
pub fn occurs_on(template: &TaskTemplate, date: DateKey) -> bool {
    if template.task_type != TaskType::Recurring {
        return false;
    }

    let Some(anchor) = template.anchor_date() else {
        return false;
    };

    let diff_days = date.days_since(anchor);
    if diff_days < 0 {
        return false;
    }

    let interval = normalize_interval(template.recurrence_interval_days);
    if diff_days % interval != 0 {
        return false;
    }

    // Re-clamp here as well: rows predating boundary validation may carry an
    // out-of-range mask, which must degrade to "no restriction".
    match normalize_mask(template.recurrence_days_mask.map(i64::from)) {
        Some(mask) => mask & (1u8 << date.weekday_index()) != 0,
        None => true,
    }
}

/// Does the template's weekday mask (if any) admit `date`?
///
/// The interval condition is ignored; used by the checklist resolver, which
/// only honors the weekly restriction for "today".
pub fn mask_allows(template: &TaskTemplate, date: DateKey) -> bool {
    match normalize_mask(template.recurrence_days_mask.map(i64::from)) {
        Some(mask) => mask & (1u8 << date.weekday_index()) != 0,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskType;

    fn recurring(anchor: &str, interval: i64, mask: Option<u8>) -> TaskTemplate {
        TaskTemplate {
            id: "t1".into(),
            user_id: "u1".into(),
            title: "Stretch".into(),
            notes: None,
            task_type: TaskType::Recurring,
            is_active: true,
            archived_at: None,
            recurrence_interval_days: interval,
            recurrence_days_mask: mask,
            due_date: DateKey::parse(anchor),
            due_time: None,
            category: None,
            project_id: None,
            priority: 0,
            difficulty: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn day(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    #[test]
    fn daily_without_mask_occurs_every_day_from_anchor() {
        let t = recurring("2024-01-01", 1, None);
        assert!(occurs_on(&t, day("2024-01-01")));
        assert!(occurs_on(&t, day("2024-01-02")));
        assert!(occurs_on(&t, day("2024-01-15")));
    }

    #[test]
    fn no_occurrence_before_anchor() {
        let t = recurring("2024-01-10", 1, None);
        assert!(!occurs_on(&t, day("2024-01-09")));
        assert!(occurs_on(&t, day("2024-01-10")));
    }

    #[test]
    fn interval_three_hits_every_third_day() {
        let t = recurring("2024-01-01", 3, None);
        assert!(occurs_on(&t, day("2024-01-01")));
        assert!(!occurs_on(&t, day("2024-01-02")));
        assert!(!occurs_on(&t, day("2024-01-03")));
        assert!(occurs_on(&t, day("2024-01-04")));
        assert!(occurs_on(&t, day("2024-01-07")));
    }

    #[test]
    fn weekday_mask_restricts_to_set_bits() {
        // Monday (bit 1) and Friday (bit 5); 2024-01-01 is a Monday.
        let t = recurring("2024-01-01", 1, Some(0b0100010));
        assert!(occurs_on(&t, day("2024-01-01"))); // Mon
        assert!(!occurs_on(&t, day("2024-01-02"))); // Tue
        assert!(occurs_on(&t, day("2024-01-05"))); // Fri
        assert!(!occurs_on(&t, day("2024-01-06"))); // Sat
        assert!(!occurs_on(&t, day("2024-01-07"))); // Sun
        assert!(occurs_on(&t, day("2024-01-08"))); // next Mon
    }

    #[test]
    fn mask_intersects_with_interval() {
        // Every 2 days from a Monday, masked to Mon+Fri. Fri (diff 4) passes
        // both; Wed (diff 2) passes the interval but not the mask.
        let t = recurring("2024-01-01", 2, Some(0b0100010));
        assert!(occurs_on(&t, day("2024-01-01")));
        assert!(!occurs_on(&t, day("2024-01-03")));
        assert!(occurs_on(&t, day("2024-01-05")));
    }

    #[test]
    fn zero_interval_is_coerced_to_daily() {
        let t = recurring("2024-01-01", 0, None);
        assert!(occurs_on(&t, day("2024-01-02")));
    }

    #[test]
    fn one_off_never_occurs() {
        let mut t = recurring("2024-01-01", 1, None);
        t.task_type = TaskType::OneOff;
        assert!(!occurs_on(&t, day("2024-01-01")));
    }

    #[test]
    fn missing_anchor_fails_closed() {
        let mut t = recurring("2024-01-01", 1, None);
        t.due_date = None;
        t.created_at = i64::MAX; // not representable as a calendar day
        assert!(!occurs_on(&t, day("2024-01-01")));
    }
}

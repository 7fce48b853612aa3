//! Expansion of templates into dated occurrences over a bounded window.

use crate::config::ExpandConfig;
use crate::dates::DateKey;
use crate::recurrence::occurs_on;
use crate::types::{
    GroupKey, Occurrence, OccurrenceGroup, OccurrenceKind, TaskTemplate, TaskType,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Expand templates into one occurrence per matching date in `window`.
///
/// Recurring templates are evaluated once per window day (windows are ≤30
/// days, so the quadratic loop is cheaper than getting closed-form recurrence
/// math right). One-off templates contribute a single occurrence when their
/// due date lands inside the window; undated one-offs never appear here, they
/// belong to the undated checklist only.
///
/// Output is de-duplicated on the `(template, date)` instance key, so a
/// window containing repeated dates cannot double-emit.
pub fn expand(templates: &[TaskTemplate], window: &[DateKey]) -> Vec<Occurrence> {
    let mut seen: HashSet<(String, DateKey)> = HashSet::new();
    let mut out = Vec::new();

    for template in templates {
        match template.task_type {
            TaskType::Recurring => {
                for &date in window {
                    if occurs_on(template, date)
                        && seen.insert((template.id.clone(), date))
                    {
                        out.push(project(template, date, OccurrenceKind::Recurring));
                    }
                }
            }
            TaskType::OneOff => {
                if let Some(due) = template.due_date
                    && window.contains(&due)
                    && seen.insert((template.id.clone(), due))
                {
                    out.push(project(template, due, OccurrenceKind::Single));
                }
            }
        }
    }

    out
}

/// Expand and arrange occurrences for display.
///
/// Templates with a project group under it (name resolved through
/// `project_lookup`, falling back to the raw id); the rest group by category,
/// or land in the trailing uncategorized bucket. Within a group occurrences
/// are ordered by date, then due time ascending with timed entries first,
/// ties broken by title.
pub fn expand_grouped<F>(
    templates: &[TaskTemplate],
    window: &[DateKey],
    project_lookup: F,
) -> Vec<OccurrenceGroup>
where
    F: Fn(&str) -> Option<String>,
{
    let mut groups: BTreeMap<GroupKey, Vec<Occurrence>> = BTreeMap::new();

    for occ in expand(templates, window) {
        let key = match (&occ.project_id, &occ.category) {
            (Some(project_id), _) => {
                GroupKey::Project(project_lookup(project_id).unwrap_or_else(|| project_id.clone()))
            }
            (None, Some(category)) => GroupKey::Category(category.clone()),
            (None, None) => GroupKey::Uncategorized,
        };
        groups.entry(key).or_default().push(occ);
    }

    groups
        .into_iter()
        .map(|(key, mut occurrences)| {
            occurrences.sort_by(display_order);
            OccurrenceGroup { key, occurrences }
        })
        .collect()
}

/// Grouped timeline starting at `start`, with the window length taken from
/// caller-supplied configuration (clamped to the supported range).
pub fn timeline<F>(
    templates: &[TaskTemplate],
    start: DateKey,
    config: &ExpandConfig,
    project_lookup: F,
) -> Vec<OccurrenceGroup>
where
    F: Fn(&str) -> Option<String>,
{
    let window = start.window(config.effective_window_days());
    expand_grouped(templates, &window, project_lookup)
}

fn display_order(a: &Occurrence, b: &Occurrence) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| match (&a.due_time, &b.due_time) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.title.cmp(&b.title))
}

fn project(template: &TaskTemplate, date: DateKey, kind: OccurrenceKind) -> Occurrence {
    Occurrence {
        template_id: template.id.clone(),
        user_id: template.user_id.clone(),
        date,
        kind,
        title: template.title.clone(),
        due_time: template.due_time.clone(),
        category: template.category.clone(),
        project_id: template.project_id.clone(),
        priority: template.priority,
    }
}

//! Habitline — recurrence and lifecycle core for a personal task/habit
//! tracker.
//!
//! Decides which task templates are visible on a calendar day, expands
//! recurring templates into dated occurrences over a bounded window, records
//! completions idempotently, and drives the one-way lifecycle of one-off
//! tasks. Presentation, auth, and everything else around it are the caller's
//! business.

pub mod checklist;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod expand;
pub mod lifecycle;
pub mod logging;
pub mod recurrence;
pub mod types;

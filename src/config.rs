//! Caller-supplied core configuration.
//!
//! Preferences that shape checklist and timeline rendering are passed into
//! the core explicitly rather than living in ambient module state, so the
//! recurrence and visibility logic stays pure and testable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest expansion window the timeline supports.
pub const MAX_WINDOW_DAYS: usize = 30;

/// What to do with a template whose log for today is already completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletedTodayPolicy {
    /// Drop it from the checklist ("done for today").
    #[default]
    Hide,
    /// Keep it visible, rendered as done, so it stays counted for the day.
    ShowMarkedDone,
}

/// Checklist rendering preferences.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChecklistConfig {
    #[serde(default)]
    pub completed_today: CompletedTodayPolicy,
}

/// Timeline expansion preferences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExpandConfig {
    /// Requested window length in days (typical: 7, 14, 30).
    #[serde(default = "default_window_days")]
    pub window_days: usize,
}

impl ExpandConfig {
    /// Window length clamped to 1..=[`MAX_WINDOW_DAYS`].
    pub fn effective_window_days(&self) -> usize {
        self.window_days.clamp(1, MAX_WINDOW_DAYS)
    }
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

fn default_window_days() -> usize {
    14
}

/// Top-level core configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub checklist: ChecklistConfig,
    #[serde(default)]
    pub expand: ExpandConfig,
}

impl CoreConfig {
    /// Load configuration from a YAML file at an explicit path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: CoreConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

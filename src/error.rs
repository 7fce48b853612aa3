//! Structured error types for core operations.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Authorization errors
    NotOwner,

    // Not found errors
    TemplateNotFound,

    // Lifecycle violations (deliberate business rules, not bugs)
    ReactivationBlocked,
    ConversionBlocked,
    NotOneOff,

    // Partial failures
    CompletionSavedArchiveFailed,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Structured error for core operations.
#[derive(Debug, Serialize, Error)]
#[error("{message}")]
pub struct CoreError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn not_owner(template_id: &str, user_id: &str) -> Self {
        Self::new(
            ErrorCode::NotOwner,
            format!("Template {} does not belong to user {}", template_id, user_id),
        )
    }

    pub fn template_not_found(template_id: &str) -> Self {
        Self::new(
            ErrorCode::TemplateNotFound,
            format!("Template not found: {}", template_id),
        )
    }

    pub fn reactivation_blocked(template_id: &str) -> Self {
        Self::new(
            ErrorCode::ReactivationBlocked,
            format!(
                "Template {} is a completed one-off task and cannot be reactivated",
                template_id
            ),
        )
    }

    pub fn conversion_blocked(template_id: &str, completed_count: i64) -> Self {
        Self::new(
            ErrorCode::ConversionBlocked,
            format!(
                "Template {} has {} completed log(s); converting to one-off would \
                 orphan its completion history",
                template_id, completed_count
            ),
        )
    }

    pub fn not_one_off(template_id: &str) -> Self {
        Self::new(
            ErrorCode::NotOneOff,
            format!(
                "Auto-archive is only valid for one-off templates, got {}",
                template_id
            ),
        )
    }

    pub fn archive_failed(template_id: &str, cause: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CompletionSavedArchiveFailed,
            "Completion saved, but the task could not be archived; retry the archive step",
        )
        .with_details(format!("template {}: {}", template_id, cause))
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    /// JSON form for presentation-layer responses.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message,
            "field": self.field,
            "details": self.details,
        })
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::database(err)
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CoreError>() {
            Ok(core_err) => core_err,
            Err(err) => CoreError::internal(err),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_as_screaming_snake_case() {
        let err = CoreError::reactivation_blocked("t1");
        let json = err.to_json();
        assert_eq!(json["code"], "REACTIVATION_BLOCKED");
        assert!(json["message"].as_str().unwrap().contains("t1"));
        assert!(json["field"].is_null());
    }

    #[test]
    fn display_renders_the_message() {
        let err = CoreError::invalid_value("recurrence_days_mask", "mask out of range");
        assert_eq!(err.to_string(), "mask out of range");
    }

    #[test]
    fn partial_failure_names_the_template_for_archive_retry() {
        let err = CoreError::archive_failed("t7", "database is locked");
        assert_eq!(err.code, ErrorCode::CompletionSavedArchiveFailed);
        // The details carry the template id so callers can retry just the
        // archive step without re-recording completion.
        let details = err.details.as_deref().unwrap();
        assert!(details.contains("t7"));
        assert!(details.contains("database is locked"));
        assert!(err.message.contains("retry the archive"));
    }

    #[test]
    fn anyhow_roundtrip_preserves_the_core_error() {
        let err: anyhow::Error = CoreError::template_not_found("t9").into();
        let back = CoreError::from(err);
        assert_eq!(back.code, ErrorCode::TemplateNotFound);
    }
}

//! Error types for the migration engine and the HTTP surface.

use crate::mapping::MappingError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Failure while reading the legacy store or reconciling a project.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A base plan the engine had already confirmed is missing.
    #[error("base plan {base_number} not found for project {project_id}")]
    BasePlanNotFound { project_id: i64, base_number: i64 },

    /// A base plan exists without its parentless root version.
    #[error("root version not found for base plan {base_plan_id} of project {project_id}")]
    RootVersionNotFound { project_id: i64, base_plan_id: i64 },

    /// A baseline group has no task carrying both dates.
    #[error("baseline {base_number} of project {project_uid} has no dated tasks")]
    UndatedBaseline { project_uid: Uuid, base_number: i64 },

    #[error("invalid legacy data: {0}")]
    InvalidSource(String),

    #[error("migration task failed: {0}")]
    Aborted(String),
}

impl MigrationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MigrationError::Mapping(_) => ErrorCode::MappingFailed,
            MigrationError::Database(_) => ErrorCode::DatabaseError,
            MigrationError::BasePlanNotFound { .. } | MigrationError::RootVersionNotFound { .. } => {
                ErrorCode::InconsistentTarget
            }
            MigrationError::UndatedBaseline { .. } | MigrationError::InvalidSource(_) => {
                ErrorCode::InvalidSource
            }
            MigrationError::Aborted(_) => ErrorCode::MigrationFailed,
        }
    }
}

pub type MigrationResult<T> = std::result::Result<T, MigrationError>;

/// Error codes returned by the HTTP API.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFoundApi,
    ProjectNotFound,
    MappingFailed,
    InconsistentTarget,
    InvalidSource,
    MigrationFailed,
    DatabaseError,
    InternalError,
}

/// Error body for HTTP responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found_api(path: &str) -> Self {
        Self::new(ErrorCode::NotFoundApi, format!("API not found: {}", path))
    }

    pub fn project_not_found(project_id: i64) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {}", project_id),
        )
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<MigrationError> for ErrorResponse {
    fn from(err: MigrationError) -> Self {
        ErrorResponse::new(err.code(), err.to_string())
    }
}

impl From<anyhow::Error> for ErrorResponse {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<MigrationError>() {
            Ok(migration_err) => migration_err.into(),
            Err(err) => ErrorResponse::internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_serialize_screaming_snake() {
        let body = ErrorResponse::not_found_api("/nope");
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"NOT_FOUND_API\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn lookup_failures_map_to_inconsistent_target() {
        let err = MigrationError::BasePlanNotFound {
            project_id: 3,
            base_number: 1,
        };
        assert_eq!(err.code(), ErrorCode::InconsistentTarget);
        let body: ErrorResponse = err.into();
        assert_eq!(body.message, "base plan 1 not found for project 3");
    }

    #[test]
    fn anyhow_wrapping_keeps_migration_code() {
        let err = anyhow::Error::new(MigrationError::InvalidSource("bad uuid".into()));
        let body: ErrorResponse = err.into();
        assert_eq!(body.code, ErrorCode::InvalidSource);
    }
}

//! API Error Types
//!
//! Maps engine and domain errors onto HTTP status codes and a uniform
//! JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use loyalty_core::LoyaltyError;
use loyalty_engine::EngineError;
use loyalty_store::StoreError;

/// API-specific errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation error
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// Unauthorized access
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Conflict (duplicate, concurrent modification, running migration)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Engine error
    #[error("Engine error: {0}")]
    EngineError(#[from] EngineError),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Error message
    pub message: String,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::EngineError(err) => match err {
                EngineError::Core(core) => match core {
                    LoyaltyError::InsufficientBalance { .. }
                    | LoyaltyError::ExceedsCartTotal { .. }
                    | LoyaltyError::NegativeBalanceViolation { .. } => StatusCode::CONFLICT,
                    _ if core.is_validation() => StatusCode::BAD_REQUEST,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                },
                EngineError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
                EngineError::MigrationAlreadyRunning
                | EngineError::RollbackUnavailable
                | EngineError::InvalidMigrationState { .. } => StatusCode::CONFLICT,
                EngineError::InvalidRatioChange { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> String {
        match self {
            Self::ValidationError { .. } => "VALIDATION_ERROR".to_string(),
            Self::NotFound { .. } => "NOT_FOUND".to_string(),
            Self::Unauthorized { .. } => "UNAUTHORIZED".to_string(),
            Self::Conflict { .. } => "CONFLICT".to_string(),
            Self::Internal { .. } => "INTERNAL_ERROR".to_string(),
            Self::EngineError(EngineError::Core(core)) => core.code().to_string(),
            Self::EngineError(EngineError::MigrationAlreadyRunning) => {
                "MIGRATION_ALREADY_RUNNING".to_string()
            }
            Self::EngineError(EngineError::RollbackUnavailable) => {
                "ROLLBACK_UNAVAILABLE".to_string()
            }
            Self::EngineError(EngineError::MigrationVerificationFailed { .. }) => {
                "MIGRATION_VERIFICATION_FAILED".to_string()
            }
            Self::EngineError(EngineError::MigrationBackupFailed { .. }) => {
                "MIGRATION_BACKUP_FAILED".to_string()
            }
            Self::EngineError(_) => "ENGINE_ERROR".to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        crate::metrics::record_error(&self.error_code());
        let body = ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_bad_request() {
        let err = ApiError::validation("missing field");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_redemption_bounds_map_to_conflict() {
        let err = ApiError::from(EngineError::Core(LoyaltyError::InsufficientBalance {
            requested: 100,
            available: 10,
        }));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "LOY-REDEEM-001");
    }

    #[test]
    fn test_invalid_rate_maps_to_bad_request() {
        let err = ApiError::from(EngineError::Core(LoyaltyError::InvalidRate { rate: 0 }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_migration_guard_maps_to_conflict() {
        let err = ApiError::from(EngineError::MigrationAlreadyRunning);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let err = ApiError::from(EngineError::RollbackUnavailable);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_migration_failures_map_to_internal() {
        let err = ApiError::from(EngineError::MigrationBackupFailed {
            reason: "disk full".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

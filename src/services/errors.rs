//! Typed outcomes of the service layer.

use serde::Serialize;
use thiserror::Error;

use crate::domain::transition::{RejectionCode, RejectionDetail, TransitionRejection};
use crate::repository::errors::RepositoryError;

/// Stable, caller-facing error codes.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Forbidden,
    NotFound,
    ValidationError,
    InvalidTransition,
    Conflict,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidTransition => "INVALID_TRANSITION",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl From<RejectionCode> for ErrorCode {
    fn from(code: RejectionCode) -> Self {
        match code {
            RejectionCode::ValidationError => ErrorCode::ValidationError,
            RejectionCode::InvalidTransition => ErrorCode::InvalidTransition,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Rejected(#[from] TransitionRejection),

    #[error("invalid request: {0}")]
    Form(String),

    #[error("invalid value: {0}")]
    TypeConstraint(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Forbidden(_) => ErrorCode::Forbidden,
            ServiceError::NotFound(_) | ServiceError::Repository(RepositoryError::NotFound) => {
                ErrorCode::NotFound
            }
            ServiceError::Rejected(rejection) => rejection.code.into(),
            ServiceError::Form(_) | ServiceError::TypeConstraint(_) => ErrorCode::ValidationError,
            ServiceError::Conflict(_) | ServiceError::Repository(RepositoryError::Conflict(_)) => {
                ErrorCode::Conflict
            }
            ServiceError::Repository(_) | ServiceError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Message safe to return to callers. Storage failures are not described.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Forbidden(message)
            | ServiceError::NotFound(message)
            | ServiceError::Form(message)
            | ServiceError::TypeConstraint(message)
            | ServiceError::Conflict(message) => message.clone(),
            ServiceError::Rejected(rejection) => rejection.message.clone(),
            ServiceError::Repository(RepositoryError::NotFound) => "Not found".to_string(),
            ServiceError::Repository(RepositoryError::Conflict(_)) => {
                "The status was changed concurrently, retry the request".to_string()
            }
            ServiceError::Repository(_) | ServiceError::Internal(_) => {
                "Internal error".to_string()
            }
        }
    }

    pub fn details(&self) -> Option<&RejectionDetail> {
        match self {
            ServiceError::Rejected(rejection) => Some(&rejection.details),
            _ => None,
        }
    }
}

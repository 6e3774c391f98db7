//! Request bodies and query strings accepted by the status API.

use thiserror::Error;
use validator::ValidationErrors;

pub mod status;

#[derive(Debug, Error)]
/// Errors that can occur when processing request data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error("invalid client id")]
    InvalidClientId,

    #[error("invalid status type id")]
    InvalidStatusTypeId,

    #[error("invalid reason id")]
    InvalidReasonId,

    #[error("invalid remarks: {0}")]
    InvalidRemarks(String),
}

//! Pure validation of a requested status transition.
//!
//! Nothing here touches storage: the caller loads the organization's
//! [`StatusCatalog`] and the current record, and gets back either the target
//! [`StatusType`] or a structured [`TransitionRejection`].

use serde::Serialize;
use thiserror::Error;

use crate::domain::status::{StatusCatalog, StatusType};
use crate::domain::types::{OrganizationId, Remarks, StatusReasonId, StatusTypeId};

/// Decides whether an organization permits moving between two statuses.
///
/// Terminality is checked before the policy is consulted, so implementations
/// only express the organization-specific graph.
pub trait TransitionPolicy {
    fn permits(&self, from: StatusTypeId, to: StatusTypeId) -> bool;
}

/// Policy allowing every non-terminal transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct PermitAll;

impl TransitionPolicy for PermitAll {
    fn permits(&self, _from: StatusTypeId, _to: StatusTypeId) -> bool {
        true
    }
}

/// Configured rules: pairs without a rule are permitted.
impl TransitionPolicy for StatusCatalog {
    fn permits(&self, from: StatusTypeId, to: StatusTypeId) -> bool {
        self.rule(from, to).unwrap_or(true)
    }
}

/// The status currently stored for the period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentStatus {
    pub status_type_id: StatusTypeId,
    pub is_terminal: bool,
}

/// Inputs of one validation.
#[derive(Clone, Copy, Debug)]
pub struct TransitionRequest<'a> {
    pub organization_id: OrganizationId,
    pub current: Option<CurrentStatus>,
    pub target_status_id: StatusTypeId,
    pub reason_id: Option<StatusReasonId>,
    pub remarks: Option<&'a Remarks>,
}

/// Machine-readable class of a rejection.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    ValidationError,
    InvalidTransition,
}

impl RejectionCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            RejectionCode::ValidationError => "VALIDATION_ERROR",
            RejectionCode::InvalidTransition => "INVALID_TRANSITION",
        }
    }
}

/// Structured details of a rejection, one fixed key set per case.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionDetail {
    UnknownStatus {
        status_type_id: StatusTypeId,
    },
    InactiveStatus {
        status_code: String,
    },
    TerminalStatus {
        current_status_code: String,
    },
    TransitionDenied {
        from_status_code: String,
        to_status_code: String,
    },
    MissingReason {
        status_code: String,
    },
    ReasonNotAllowed {
        reason_id: StatusReasonId,
        status_code: String,
    },
    MissingRemarks {
        status_code: String,
    },
}

/// Why a transition was refused.
#[derive(Clone, Debug, Error, Serialize, PartialEq, Eq)]
#[error("{message}")]
pub struct TransitionRejection {
    pub code: RejectionCode,
    pub message: String,
    pub details: RejectionDetail,
}

impl TransitionRejection {
    fn validation(message: String, details: RejectionDetail) -> Self {
        Self {
            code: RejectionCode::ValidationError,
            message,
            details,
        }
    }

    fn transition(message: String, details: RejectionDetail) -> Self {
        Self {
            code: RejectionCode::InvalidTransition,
            message,
            details,
        }
    }
}

fn status_code_of(catalog: &StatusCatalog, id: StatusTypeId) -> String {
    catalog
        .status_type(id)
        .map(|s| s.code.as_str().to_string())
        .unwrap_or_else(|| format!("#{id}"))
}

/// Validates a transition and returns the target status type on success.
///
/// Checks run in a fixed order and the first failure is returned: unknown or
/// inactive target, terminal current status, organization rule, required
/// reason, reason ownership, required remarks.
pub fn validate_transition<'c, P>(
    catalog: &'c StatusCatalog,
    policy: &P,
    request: &TransitionRequest<'_>,
) -> Result<&'c StatusType, TransitionRejection>
where
    P: TransitionPolicy + ?Sized,
{
    let target = catalog
        .status_type(request.target_status_id)
        .filter(|s| s.organization_id == request.organization_id)
        .ok_or_else(|| {
            TransitionRejection::validation(
                format!("Unknown status type {}", request.target_status_id),
                RejectionDetail::UnknownStatus {
                    status_type_id: request.target_status_id,
                },
            )
        })?;

    if !target.is_active {
        return Err(TransitionRejection::validation(
            format!("Status {} is no longer in use", target.code),
            RejectionDetail::InactiveStatus {
                status_code: target.code.as_str().to_string(),
            },
        ));
    }

    if let Some(current) = request.current {
        let current_code = status_code_of(catalog, current.status_type_id);

        if current.is_terminal {
            return Err(TransitionRejection::transition(
                format!("Status {current_code} is final for this period"),
                RejectionDetail::TerminalStatus {
                    current_status_code: current_code,
                },
            ));
        }

        if !policy.permits(current.status_type_id, target.id) {
            return Err(TransitionRejection::transition(
                format!("Changing status from {current_code} to {} is not allowed", target.code),
                RejectionDetail::TransitionDenied {
                    from_status_code: current_code,
                    to_status_code: target.code.as_str().to_string(),
                },
            ));
        }
    }

    match request.reason_id {
        None if target.requires_reason => {
            return Err(TransitionRejection::validation(
                format!("Status {} requires a reason", target.code),
                RejectionDetail::MissingReason {
                    status_code: target.code.as_str().to_string(),
                },
            ));
        }
        Some(reason_id) => {
            let belongs = catalog
                .reason(reason_id)
                .is_some_and(|r| r.status_type_id == target.id);
            if !belongs {
                return Err(TransitionRejection::validation(
                    format!("Reason {reason_id} cannot be used with status {}", target.code),
                    RejectionDetail::ReasonNotAllowed {
                        reason_id,
                        status_code: target.code.as_str().to_string(),
                    },
                ));
            }
        }
        None => {}
    }

    if target.requires_remarks && request.remarks.is_none() {
        return Err(TransitionRejection::validation(
            format!("Status {} requires remarks", target.code),
            RejectionDetail::MissingRemarks {
                status_code: target.code.as_str().to_string(),
            },
        ));
    }

    Ok(target)
}

//! JSON shapes returned by the status API.

use serde::Serialize;

use crate::domain::status::{StatusReason, StatusType};
use crate::domain::transition::RejectionDetail;
use crate::domain::types::{ClientPeriodStatusId, StatusEventId};
use crate::services::bulk::{BulkItemOutcome, BulkUpdateResult};
use crate::services::query::Page;
use crate::services::status::StatusUpdateOutcome;
use crate::services::{ErrorCode, ServiceError};

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub items: Vec<T>,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            items: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusTypeResponse {
    #[serde(flatten)]
    pub status_type: StatusType,
    pub reasons: Vec<StatusReason>,
}

impl From<(StatusType, Vec<StatusReason>)> for StatusTypeResponse {
    fn from((status_type, reasons): (StatusType, Vec<StatusReason>)) -> Self {
        Self {
            status_type,
            reasons,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BulkItemResponse {
    Applied {
        success: bool,
        status_id: ClientPeriodStatusId,
        event_id: StatusEventId,
        event_sequence: i32,
    },
    Failed {
        success: bool,
        client_id: i32,
        error_code: ErrorCode,
        message: String,
    },
}

impl From<BulkItemOutcome> for BulkItemResponse {
    fn from(outcome: BulkItemOutcome) -> Self {
        match outcome {
            BulkItemOutcome::Applied(StatusUpdateOutcome {
                status_id,
                event_id,
                event_sequence,
                ..
            }) => BulkItemResponse::Applied {
                success: true,
                status_id,
                event_id,
                event_sequence,
            },
            BulkItemOutcome::Failed {
                client_id,
                code,
                message,
            } => BulkItemResponse::Failed {
                success: false,
                client_id,
                error_code: code,
                message,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub results: Vec<BulkItemResponse>,
    pub successful: usize,
    pub failed: usize,
}

impl From<BulkUpdateResult> for BulkUpdateResponse {
    fn from(result: BulkUpdateResult) -> Self {
        Self {
            results: result.items.into_iter().map(Into::into).collect(),
            successful: result.successful,
            failed: result.failed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a RejectionDetail>,
}

/// `{"error": {...}}` envelope of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: ErrorBody<'a>,
}

impl<'a> From<&'a ServiceError> for ErrorResponse<'a> {
    fn from(err: &'a ServiceError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code(),
                message: err.public_message(),
                details: err.details(),
            },
        }
    }
}

//! Bulk status updates with per-item isolation.

use validator::Validate;

use crate::domain::auth::Actor;
use crate::domain::territory::StatusAction;
use crate::forms::status::{BulkStatusUpdateForm, StatusUpdatePayload};
use crate::repository::{
    ClientReader, PermissionReader, StatusCatalogReader, StatusReader, StatusWriter,
    TerritoryReader,
};
use crate::services::status::{StatusUpdateOutcome, apply_status_update};
use crate::services::territory::{authorize, resolve};
use crate::services::{ErrorCode, ServiceError, ServiceResult};

/// Result of one item of a bulk request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BulkItemOutcome {
    Applied(StatusUpdateOutcome),
    Failed {
        /// As submitted, which may not be a valid id.
        client_id: i32,
        code: ErrorCode,
        message: String,
    },
}

impl BulkItemOutcome {
    fn failed(client_id: i32, err: &ServiceError) -> Self {
        BulkItemOutcome::Failed {
            client_id,
            code: err.code(),
            message: err.public_message(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BulkItemOutcome::Applied(_))
    }
}

/// Per-item outcomes in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkUpdateResult {
    pub items: Vec<BulkItemOutcome>,
    pub successful: usize,
    pub failed: usize,
}

impl From<Vec<BulkItemOutcome>> for BulkUpdateResult {
    fn from(items: Vec<BulkItemOutcome>) -> Self {
        let successful = items.iter().filter(|i| i.is_success()).count();
        let failed = items.len() - successful;
        Self {
            items,
            successful,
            failed,
        }
    }
}

/// Applies a batch of status changes.
///
/// The batch is rejected as a whole only for a bad size or a missing
/// `status:bulk_update` grant. After that every item runs the single-update
/// pipeline on its own and a failure only marks that item; earlier successes
/// are never rolled back.
pub fn bulk_update_statuses<R>(
    repo: &R,
    actor: &Actor,
    form: BulkStatusUpdateForm,
) -> ServiceResult<BulkUpdateResult>
where
    R: ClientReader
        + PermissionReader
        + TerritoryReader
        + StatusCatalogReader
        + StatusReader
        + StatusWriter
        + ?Sized,
{
    form.validate().map_err(|err| {
        log::warn!("User {} sent an invalid bulk request: {err}", actor.user_id);
        ServiceError::Form(format!("A bulk request carries 1 to 100 updates: {err}"))
    })?;

    authorize(repo, actor, StatusAction::BulkUpdate)?;

    if resolve(repo, actor, StatusAction::Update)?.is_none() {
        log::warn!(
            "User {} has no territory, rejecting all {} bulk items",
            actor.user_id,
            form.updates.len()
        );
        let denied = ServiceError::Forbidden("You have no territory assigned".to_string());
        let items = form
            .updates
            .iter()
            .map(|item| BulkItemOutcome::failed(item.client_id, &denied))
            .collect::<Vec<_>>();
        return Ok(items.into());
    }

    let items = form
        .updates
        .into_iter()
        .map(|item| {
            let client_id = item.client_id;
            let result = StatusUpdatePayload::try_from(item)
                .map_err(ServiceError::from)
                .and_then(|payload| {
                    apply_status_update(repo, actor, &payload.into_domain())
                });

            match result {
                Ok(outcome) => BulkItemOutcome::Applied(outcome),
                Err(err) => BulkItemOutcome::failed(client_id, &err),
            }
        })
        .collect::<Vec<_>>();

    let result = BulkUpdateResult::from(items);
    log::info!(
        "User {} bulk update: {} applied, {} failed",
        actor.user_id,
        result.successful,
        result.failed
    );
    Ok(result)
}

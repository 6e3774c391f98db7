use crate::domain::auth::Actor;
use crate::domain::status::{StatusReason, StatusType};
use crate::domain::territory::StatusAction;
use crate::repository::{PermissionReader, StatusCatalogReader, TerritoryReader};
use crate::services::territory::authorize;
use crate::services::{ServiceError, ServiceResult};

/// Status types of the actor's organization, each with its reasons.
pub fn list_status_types<R>(
    repo: &R,
    actor: &Actor,
) -> ServiceResult<Vec<(StatusType, Vec<StatusReason>)>>
where
    R: PermissionReader + TerritoryReader + StatusCatalogReader + ?Sized,
{
    authorize(repo, actor, StatusAction::Read)?;

    let catalog = repo
        .load_status_catalog(actor.organization_id)
        .map_err(|err| {
            log::error!(
                "Failed to load status catalog of organization {}: {err}",
                actor.organization_id
            );
            ServiceError::from(err)
        })?;

    Ok(catalog.entries())
}

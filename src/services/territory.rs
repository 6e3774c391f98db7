//! Capability checks and territory resolution for an [`Actor`].

use crate::domain::auth::Actor;
use crate::domain::territory::{BranchFilter, GrantScope, StatusAction, resolve_branch_filter};
use crate::domain::types::BranchId;
use crate::repository::{PermissionReader, TerritoryReader};
use crate::services::{ServiceError, ServiceResult};

fn load_scopes<R>(repo: &R, actor: &Actor, action: StatusAction) -> ServiceResult<Vec<GrantScope>>
where
    R: PermissionReader + ?Sized,
{
    repo.list_permission_scopes(actor.user_id, actor.organization_id, action)
        .map_err(|err| {
            log::error!(
                "Failed to load {action} grants for user {} in organization {}: {err}",
                actor.user_id,
                actor.organization_id
            );
            ServiceError::from(err)
        })
}

fn filter_from_scopes<R>(
    repo: &R,
    actor: &Actor,
    scopes: &[GrantScope],
) -> ServiceResult<BranchFilter>
where
    R: TerritoryReader + ?Sized,
{
    let needs_branches =
        scopes.contains(&GrantScope::Territory) && !scopes.contains(&GrantScope::All);

    let branches = if needs_branches {
        repo.list_territory_branch_ids(actor.user_id, actor.organization_id)
            .map_err(|err| {
                log::error!(
                    "Failed to load territory of user {} in organization {}: {err}",
                    actor.user_id,
                    actor.organization_id
                );
                ServiceError::from(err)
            })?
    } else {
        vec![]
    };

    Ok(resolve_branch_filter(scopes, branches))
}

/// Answers whether the actor holds any grant for `status:<action>`.
pub fn has_permission<R>(repo: &R, actor: &Actor, action: StatusAction) -> ServiceResult<bool>
where
    R: PermissionReader + ?Sized,
{
    Ok(!load_scopes(repo, actor, action)?.is_empty())
}

/// Computes the branches the actor may act on for `action`.
pub fn resolve<R>(repo: &R, actor: &Actor, action: StatusAction) -> ServiceResult<BranchFilter>
where
    R: PermissionReader + TerritoryReader + ?Sized,
{
    let scopes = load_scopes(repo, actor, action)?;
    filter_from_scopes(repo, actor, &scopes)
}

/// Consistent with [`resolve`]: true iff the filter allows `branch_id`.
pub fn can_access_branch<R>(
    repo: &R,
    actor: &Actor,
    action: StatusAction,
    branch_id: BranchId,
) -> ServiceResult<bool>
where
    R: PermissionReader + TerritoryReader + ?Sized,
{
    Ok(resolve(repo, actor, action)?.allows(branch_id))
}

/// Fails with `FORBIDDEN` unless the actor holds `status:<action>`, and
/// returns the branch filter derived from the same grants.
pub(crate) fn authorize<R>(
    repo: &R,
    actor: &Actor,
    action: StatusAction,
) -> ServiceResult<BranchFilter>
where
    R: PermissionReader + TerritoryReader + ?Sized,
{
    let scopes = load_scopes(repo, actor, action)?;
    if scopes.is_empty() {
        log::warn!(
            "User {} lacks {action} in organization {}",
            actor.user_id,
            actor.organization_id
        );
        return Err(ServiceError::Forbidden(format!("Missing permission {action}")));
    }
    filter_from_scopes(repo, actor, &scopes)
}

//! Read paths over current statuses and their history.

use crate::domain::auth::Actor;
use crate::domain::status::{ClientPeriodStatus, StatusHistoryEntry};
use crate::domain::territory::StatusAction;
use crate::domain::types::ClientId;
use crate::forms::status::{HistoryQuery, PeriodQuery};
use crate::repository::{
    ClientReader, PeriodStatusListQuery, PermissionReader, StatusHistoryQuery, StatusReader,
    TerritoryReader,
};
use crate::services::status::{ensure_branch, load_client};
use crate::services::territory::authorize;
use crate::services::{DEFAULT_ITEMS_PER_PAGE, ServiceError, ServiceResult};

/// One page of results with the total number of matches.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub items: Vec<T>,
}

/// Current status of one client for one period.
pub fn get_current_status<R>(
    repo: &R,
    actor: &Actor,
    client_id: i32,
    query: &PeriodQuery,
) -> ServiceResult<ClientPeriodStatus>
where
    R: ClientReader + PermissionReader + TerritoryReader + StatusReader + ?Sized,
{
    let client_id = ClientId::new(client_id)?;
    let period = query.period()?;

    let filter = authorize(repo, actor, StatusAction::Read)?;
    let client = load_client(repo, actor, client_id)?;
    ensure_branch(actor, &filter, &client, StatusAction::Read)?;

    repo.get_period_status(client_id, &period)
        .map_err(|err| {
            log::error!("Failed to load status of client {client_id} for {period}: {err}");
            ServiceError::from(err)
        })?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Client {client_id} has no status for {period}"))
        })
}

/// Status events of one client, oldest record first, optionally for one period.
pub fn list_status_history<R>(
    repo: &R,
    actor: &Actor,
    client_id: i32,
    query: &HistoryQuery,
) -> ServiceResult<Page<StatusHistoryEntry>>
where
    R: ClientReader + PermissionReader + TerritoryReader + StatusReader + ?Sized,
{
    let client_id = ClientId::new(client_id)?;
    let period = query.period()?;
    let page = query.page.unwrap_or(1).max(1);

    let filter = authorize(repo, actor, StatusAction::Read)?;
    let client = load_client(repo, actor, client_id)?;
    ensure_branch(actor, &filter, &client, StatusAction::Read)?;

    let mut history = StatusHistoryQuery::new(client_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(period) = period {
        history = history.period(period);
    }

    let (total, items) = repo.list_status_history(history).map_err(|err| {
        log::error!("Failed to list status history of client {client_id}: {err}");
        ServiceError::from(err)
    })?;

    Ok(Page {
        total,
        page,
        per_page: DEFAULT_ITEMS_PER_PAGE,
        items,
    })
}

/// Statuses of one period across the actor's territory.
///
/// An actor holding `status:read` with an empty territory gets an empty page.
pub fn list_period_statuses<R>(
    repo: &R,
    actor: &Actor,
    query: &PeriodQuery,
) -> ServiceResult<Page<ClientPeriodStatus>>
where
    R: PermissionReader + TerritoryReader + StatusReader + ?Sized,
{
    let period = query.period()?;
    let page = query.page.unwrap_or(1).max(1);

    let filter = authorize(repo, actor, StatusAction::Read)?;

    let list = PeriodStatusListQuery::new(actor.organization_id, period, filter)
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);

    let (total, items) = repo.list_period_statuses(list).map_err(|err| {
        log::error!(
            "Failed to list statuses of organization {} for {period}: {err}",
            actor.organization_id
        );
        ServiceError::from(err)
    })?;

    Ok(Page {
        total,
        page,
        per_page: DEFAULT_ITEMS_PER_PAGE,
        items,
    })
}

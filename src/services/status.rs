//! Single-item status updates.

use serde::Serialize;

use crate::domain::auth::Actor;
use crate::domain::client::Client;
use crate::domain::status::{StatusChange, StatusUpdateRequest};
use crate::domain::territory::{BranchFilter, StatusAction};
use crate::domain::transition::{CurrentStatus, TransitionRequest, validate_transition};
use crate::domain::types::{ClientId, ClientPeriodStatusId, StatusEventId};
use crate::forms::status::{StatusUpdateForm, StatusUpdatePayload};
use crate::repository::errors::RepositoryError;
use crate::repository::{
    ClientReader, PermissionReader, StatusCatalogReader, StatusReader, StatusWriter,
    TerritoryReader,
};
use crate::services::territory::authorize;
use crate::services::{ServiceError, ServiceResult};

/// Write attempts before a lost optimistic race is reported as `CONFLICT`.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Identifiers of what a successful update wrote.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct StatusUpdateOutcome {
    pub status_id: ClientPeriodStatusId,
    pub event_id: StatusEventId,
    pub event_sequence: i32,
    pub update_count: i32,
}

/// Loads a client, hiding clients of other organizations.
pub(crate) fn load_client<R>(repo: &R, actor: &Actor, client_id: ClientId) -> ServiceResult<Client>
where
    R: ClientReader + ?Sized,
{
    let not_found = || ServiceError::NotFound(format!("Client {client_id} not found"));

    let client = repo
        .get_client_by_id(client_id)
        .map_err(|err| {
            log::error!("Failed to load client {client_id}: {err}");
            ServiceError::from(err)
        })?
        .ok_or_else(not_found)?;

    let product = repo.get_product_by_id(client.product_id).map_err(|err| {
        log::error!(
            "Failed to load product {} of client {client_id}: {err}",
            client.product_id
        );
        ServiceError::from(err)
    })?;

    match product {
        Some(product) if product.organization_id == actor.organization_id => Ok(client),
        _ => Err(not_found()),
    }
}

/// Fails with `FORBIDDEN` when the client's branch is outside `filter`.
pub(crate) fn ensure_branch(
    actor: &Actor,
    filter: &BranchFilter,
    client: &Client,
    action: StatusAction,
) -> ServiceResult<()> {
    if filter.allows(client.branch_id) {
        return Ok(());
    }
    log::warn!(
        "User {} denied {action} on client {} in branch {}",
        actor.user_id,
        client.id,
        client.branch_id
    );
    Err(ServiceError::Forbidden(format!(
        "Client {} is outside your territory",
        client.id
    )))
}

/// Validates and writes the change for a client that passed every
/// authorization check.
///
/// The write is optimistic: it carries the `update_count` that was validated
/// and is retried from a fresh read when another writer got there first.
pub(crate) fn write_status<R>(
    repo: &R,
    actor: &Actor,
    request: &StatusUpdateRequest,
) -> ServiceResult<StatusUpdateOutcome>
where
    R: StatusCatalogReader + StatusReader + StatusWriter + ?Sized,
{
    let catalog = repo
        .load_status_catalog(actor.organization_id)
        .map_err(|err| {
            log::error!(
                "Failed to load status catalog of organization {}: {err}",
                actor.organization_id
            );
            ServiceError::from(err)
        })?;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let current = repo
            .get_period_status(request.client_id, &request.period)
            .map_err(|err| {
                log::error!(
                    "Failed to load status of client {} for {}: {err}",
                    request.client_id,
                    request.period
                );
                ServiceError::from(err)
            })?;

        let target = validate_transition(
            &catalog,
            &catalog,
            &TransitionRequest {
                organization_id: actor.organization_id,
                current: current.as_ref().map(|c| CurrentStatus {
                    status_type_id: c.status_type_id,
                    is_terminal: c.is_terminal,
                }),
                target_status_id: request.status_type_id,
                reason_id: request.reason_id,
                remarks: request.remarks.as_ref(),
            },
        )
        .map_err(|rejection| {
            log::warn!(
                "User {} status change on client {} for {} rejected: {rejection}",
                actor.user_id,
                request.client_id,
                request.period
            );
            rejection
        })?;

        let change = StatusChange {
            client_id: request.client_id,
            period: request.period,
            status_type_id: target.id,
            reason_id: request.reason_id,
            remarks: request.remarks.clone(),
            has_payment: request.has_payment,
            is_terminal: target.is_terminal,
            acting_user: actor.user_id,
            expected_update_count: current.as_ref().map(|c| c.update_count),
        };

        match repo.record_status_change(&change) {
            Ok(recorded) => {
                log::info!(
                    "User {} set client {} {} to {} (event {})",
                    actor.user_id,
                    request.client_id,
                    request.period,
                    target.code,
                    recorded.event.event_sequence
                );
                return Ok(StatusUpdateOutcome {
                    status_id: recorded.status.id,
                    event_id: recorded.event.id,
                    event_sequence: recorded.event.event_sequence,
                    update_count: recorded.status.update_count,
                });
            }
            Err(RepositoryError::Conflict(message)) => {
                log::warn!(
                    "Concurrent write on client {} {} (attempt {attempt}/{MAX_WRITE_ATTEMPTS}): {message}",
                    request.client_id,
                    request.period
                );
            }
            Err(err) => {
                log::error!(
                    "Failed to write status {} for client {} {} by user {}: {err}",
                    request.status_type_id,
                    request.client_id,
                    request.period,
                    actor.user_id
                );
                return Err(err.into());
            }
        }
    }

    Err(ServiceError::Conflict(format!(
        "Status of client {} for {} kept changing, retry the request",
        request.client_id, request.period
    )))
}

/// Applies one status change end to end.
pub fn apply_status_update<R>(
    repo: &R,
    actor: &Actor,
    request: &StatusUpdateRequest,
) -> ServiceResult<StatusUpdateOutcome>
where
    R: ClientReader
        + PermissionReader
        + TerritoryReader
        + StatusCatalogReader
        + StatusReader
        + StatusWriter
        + ?Sized,
{
    let filter = authorize(repo, actor, StatusAction::Update)?;
    let client = load_client(repo, actor, request.client_id)?;
    ensure_branch(actor, &filter, &client, StatusAction::Update)?;
    write_status(repo, actor, request)
}

/// Parses the request body and applies it.
pub fn update_status<R>(
    repo: &R,
    actor: &Actor,
    form: StatusUpdateForm,
) -> ServiceResult<StatusUpdateOutcome>
where
    R: ClientReader
        + PermissionReader
        + TerritoryReader
        + StatusCatalogReader
        + StatusReader
        + StatusWriter
        + ?Sized,
{
    let payload = StatusUpdatePayload::try_from(form)?;
    apply_status_update(repo, actor, &payload.into_domain())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::client::Product;
    use crate::domain::period::PeriodKey;
    use crate::domain::status::{
        ClientPeriodStatus, RecordedStatusChange, StatusCatalog, StatusEvent, StatusType,
    };
    use crate::domain::territory::GrantScope;
    use crate::domain::types::{
        BranchId, ClientName, OrganizationId, ProductId, StatusCode, StatusName, StatusTypeId,
        UserId,
    };
    use crate::repository::mock::MockRepository;
    use crate::services::ErrorCode;

    const TO_FOLLOW: i32 = 1;
    const DONE: i32 = 2;

    fn actor() -> Actor {
        Actor::new(
            UserId::new(7).expect("valid user id"),
            OrganizationId::new(1).expect("valid organization id"),
        )
    }

    fn client() -> Client {
        let now = Utc::now().naive_utc();
        Client {
            id: ClientId::new(10).expect("valid client id"),
            product_id: ProductId::new(1).expect("valid product id"),
            branch_id: BranchId::new(2).expect("valid branch id"),
            full_name: ClientName::new("Maria Santos").expect("valid name"),
            created_at: now,
            updated_at: now,
        }
    }

    fn product(organization_id: i32) -> Product {
        Product {
            id: ProductId::new(1).expect("valid product id"),
            organization_id: OrganizationId::new(organization_id).expect("valid organization id"),
            name: "Pension Loan".into(),
        }
    }

    fn status_type(id: i32, code: &str, is_terminal: bool) -> StatusType {
        StatusType {
            id: StatusTypeId::new(id).expect("valid status id"),
            organization_id: OrganizationId::new(1).expect("valid organization id"),
            code: StatusCode::new(code).expect("valid code"),
            name: StatusName::new(code).expect("valid name"),
            is_terminal,
            requires_reason: false,
            requires_remarks: false,
            is_active: true,
        }
    }

    fn catalog() -> StatusCatalog {
        StatusCatalog::new(
            vec![status_type(TO_FOLLOW, "TO_FOLLOW", false), status_type(DONE, "DONE", true)],
            vec![],
            vec![],
        )
    }

    fn request(status: i32) -> StatusUpdateRequest {
        StatusUpdateRequest {
            client_id: ClientId::new(10).expect("valid client id"),
            period: PeriodKey::monthly(2024, 1).expect("valid period"),
            status_type_id: StatusTypeId::new(status).expect("valid status id"),
            reason_id: None,
            remarks: None,
            has_payment: false,
        }
    }

    fn current(status: i32, update_count: i32, is_terminal: bool) -> ClientPeriodStatus {
        let now = Utc::now().naive_utc();
        ClientPeriodStatus {
            id: ClientPeriodStatusId::new(5).expect("valid id"),
            client_id: ClientId::new(10).expect("valid client id"),
            period: PeriodKey::monthly(2024, 1).expect("valid period"),
            status_type_id: StatusTypeId::new(status).expect("valid status id"),
            reason_id: None,
            remarks: None,
            has_payment: false,
            update_count,
            is_terminal,
            updated_by: UserId::new(7).expect("valid user id"),
            created_at: now,
            updated_at: now,
        }
    }

    fn recorded(change: &StatusChange) -> RecordedStatusChange {
        let now = Utc::now().naive_utc();
        let update_count = change.expected_update_count.unwrap_or(0) + 1;
        RecordedStatusChange {
            status: ClientPeriodStatus {
                status_type_id: change.status_type_id,
                is_terminal: change.is_terminal,
                ..current(change.status_type_id.get(), update_count, change.is_terminal)
            },
            event: StatusEvent {
                id: StatusEventId::new(update_count).expect("valid id"),
                client_period_status_id: ClientPeriodStatusId::new(5).expect("valid id"),
                status_type_id: change.status_type_id,
                reason_id: None,
                remarks: None,
                has_payment: false,
                event_sequence: update_count,
                created_by: change.acting_user,
                created_at: now,
            },
        }
    }

    fn authorized_repo(scope: GrantScope, branches: Vec<i32>) -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_list_permission_scopes()
            .returning(move |_, _, _| Ok(vec![scope]));
        repo.expect_list_territory_branch_ids().returning(move |_, _| {
            Ok(branches
                .iter()
                .map(|id| BranchId::new(*id).expect("valid branch id"))
                .collect())
        });
        repo.expect_get_client_by_id()
            .returning(|_| Ok(Some(client())));
        repo.expect_get_product_by_id()
            .returning(|_| Ok(Some(product(1))));
        repo.expect_load_status_catalog()
            .returning(|_| Ok(catalog()));
        repo
    }

    #[test]
    fn first_write_creates_record() {
        let mut repo = authorized_repo(GrantScope::All, vec![]);
        repo.expect_get_period_status().returning(|_, _| Ok(None));
        repo.expect_record_status_change()
            .withf(|change| change.expected_update_count.is_none() && !change.is_terminal)
            .times(1)
            .returning(|change| Ok(recorded(change)));

        let outcome = apply_status_update(&repo, &actor(), &request(TO_FOLLOW)).expect("applied");
        assert_eq!(outcome.update_count, 1);
        assert_eq!(outcome.event_sequence, 1);
    }

    #[test]
    fn terminal_target_is_flagged_on_write() {
        let mut repo = authorized_repo(GrantScope::Territory, vec![2]);
        repo.expect_get_period_status()
            .returning(|_, _| Ok(Some(current(TO_FOLLOW, 1, false))));
        repo.expect_record_status_change()
            .withf(|change| change.expected_update_count == Some(1) && change.is_terminal)
            .times(1)
            .returning(|change| Ok(recorded(change)));

        let outcome = apply_status_update(&repo, &actor(), &request(DONE)).expect("applied");
        assert_eq!(outcome.update_count, 2);
    }

    #[test]
    fn terminal_current_status_writes_nothing() {
        let mut repo = authorized_repo(GrantScope::All, vec![]);
        repo.expect_get_period_status()
            .returning(|_, _| Ok(Some(current(DONE, 2, true))));
        repo.expect_record_status_change().times(0);

        let err = apply_status_update(&repo, &actor(), &request(TO_FOLLOW))
            .expect_err("terminal status blocks");
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
    }

    #[test]
    fn missing_permission_stops_before_any_lookup() {
        let mut repo = MockRepository::new();
        repo.expect_list_permission_scopes()
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_get_client_by_id().times(0);
        repo.expect_record_status_change().times(0);

        let err = apply_status_update(&repo, &actor(), &request(TO_FOLLOW))
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn out_of_territory_client_is_forbidden() {
        let mut repo = authorized_repo(GrantScope::Territory, vec![1]);
        repo.expect_get_period_status().times(0);
        repo.expect_record_status_change().times(0);

        let err = apply_status_update(&repo, &actor(), &request(TO_FOLLOW))
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn client_of_other_organization_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_list_permission_scopes()
            .returning(|_, _, _| Ok(vec![GrantScope::All]));
        repo.expect_get_client_by_id()
            .returning(|_| Ok(Some(client())));
        repo.expect_get_product_by_id()
            .returning(|_| Ok(Some(product(2))));
        repo.expect_record_status_change().times(0);

        let err = apply_status_update(&repo, &actor(), &request(TO_FOLLOW))
            .expect_err("not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn lost_race_is_retried_against_fresh_state() {
        let mut repo = authorized_repo(GrantScope::All, vec![]);
        let mut reads = 0;
        repo.expect_get_period_status().times(2).returning(move |_, _| {
            reads += 1;
            if reads == 1 {
                Ok(None)
            } else {
                Ok(Some(current(TO_FOLLOW, 1, false)))
            }
        });
        repo.expect_record_status_change()
            .withf(|change| change.expected_update_count.is_none())
            .times(1)
            .returning(|_| Err(RepositoryError::Conflict("record exists".into())));
        repo.expect_record_status_change()
            .withf(|change| change.expected_update_count == Some(1))
            .times(1)
            .returning(|change| Ok(recorded(change)));

        let outcome = apply_status_update(&repo, &actor(), &request(DONE)).expect("applied");
        assert_eq!(outcome.update_count, 2);
    }

    #[test]
    fn persistent_conflict_gives_up() {
        let mut repo = authorized_repo(GrantScope::All, vec![]);
        repo.expect_get_period_status()
            .times(MAX_WRITE_ATTEMPTS)
            .returning(|_, _| Ok(None));
        repo.expect_record_status_change()
            .times(MAX_WRITE_ATTEMPTS)
            .returning(|_| Err(RepositoryError::Conflict("busy".into())));

        let err = apply_status_update(&repo, &actor(), &request(TO_FOLLOW)).expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[test]
    fn storage_failure_is_internal() {
        let mut repo = authorized_repo(GrantScope::All, vec![]);
        repo.expect_get_period_status().returning(|_, _| Ok(None));
        repo.expect_record_status_change()
            .returning(|_| Err(RepositoryError::DatabaseError("disk full".into())));

        let err = apply_status_update(&repo, &actor(), &request(TO_FOLLOW)).expect_err("fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.public_message(), "Internal error");
    }
}

use crate::db::{DbConnection, DbPool};
use crate::domain::client::{Client, Product};
use crate::domain::period::PeriodKey;
use crate::domain::status::{
    ClientPeriodStatus, RecordedStatusChange, StatusCatalog, StatusChange, StatusHistoryEntry,
};
use crate::domain::territory::{BranchFilter, GrantScope, StatusAction};
use crate::domain::types::{BranchId, ClientId, OrganizationId, ProductId, UserId};
use crate::repository::errors::RepositoryResult;

pub mod client;
pub mod errors;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod status;
pub mod territory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Rows to skip; saturates so any page past the data is simply empty.
    pub(crate) fn offset(&self) -> i64 {
        let skipped = (self.page.max(1) - 1).saturating_mul(self.per_page);
        i64::try_from(skipped).unwrap_or(i64::MAX)
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }
}

/// Events of one client, optionally narrowed to a single period.
#[derive(Debug, Clone)]
pub struct StatusHistoryQuery {
    pub client_id: ClientId,
    pub period: Option<PeriodKey>,
    pub pagination: Option<Pagination>,
}

impl StatusHistoryQuery {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            period: None,
            pagination: None,
        }
    }

    pub fn period(mut self, period: PeriodKey) -> Self {
        self.period = Some(period);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Statuses of one period for the clients an actor may see.
#[derive(Debug, Clone)]
pub struct PeriodStatusListQuery {
    pub organization_id: OrganizationId,
    pub period: PeriodKey,
    pub branch_filter: BranchFilter,
    pub pagination: Option<Pagination>,
}

impl PeriodStatusListQuery {
    pub fn new(organization_id: OrganizationId, period: PeriodKey, branch_filter: BranchFilter) -> Self {
        Self {
            organization_id,
            period,
            branch_filter,
            pagination: None,
        }
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait ClientReader {
    fn get_client_by_id(&self, id: ClientId) -> RepositoryResult<Option<Client>>;
    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;
}

pub trait PermissionReader {
    /// Scopes of every `status:<action>` grant the user holds in the organization.
    fn list_permission_scopes(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        action: StatusAction,
    ) -> RepositoryResult<Vec<GrantScope>>;
}

pub trait TerritoryReader {
    /// Directly granted branches plus the branches of granted areas.
    fn list_territory_branch_ids(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> RepositoryResult<Vec<BranchId>>;
}

pub trait StatusCatalogReader {
    fn load_status_catalog(&self, organization_id: OrganizationId)
    -> RepositoryResult<StatusCatalog>;
}

pub trait StatusReader {
    fn get_period_status(
        &self,
        client_id: ClientId,
        period: &PeriodKey,
    ) -> RepositoryResult<Option<ClientPeriodStatus>>;
    fn list_status_history(
        &self,
        query: StatusHistoryQuery,
    ) -> RepositoryResult<(usize, Vec<StatusHistoryEntry>)>;
    fn list_period_statuses(
        &self,
        query: PeriodStatusListQuery,
    ) -> RepositoryResult<(usize, Vec<ClientPeriodStatus>)>;
}

pub trait StatusWriter {
    /// Creates or updates the period record and appends its next event in one
    /// transaction. Fails with [`errors::RepositoryError::Conflict`] when the
    /// stored `update_count` differs from `change.expected_update_count`.
    fn record_status_change(&self, change: &StatusChange)
    -> RepositoryResult<RecordedStatusChange>;
}

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

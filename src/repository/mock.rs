//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::client::{Client, Product};
use crate::domain::period::PeriodKey;
use crate::domain::status::{
    ClientPeriodStatus, RecordedStatusChange, StatusCatalog, StatusChange, StatusHistoryEntry,
};
use crate::domain::territory::{GrantScope, StatusAction};
use crate::domain::types::{BranchId, ClientId, OrganizationId, ProductId, UserId};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    ClientReader, PeriodStatusListQuery, PermissionReader, StatusCatalogReader,
    StatusHistoryQuery, StatusReader, StatusWriter, TerritoryReader,
};

mock! {
    pub Repository {}

    impl ClientReader for Repository {
        fn get_client_by_id(&self, id: ClientId) -> RepositoryResult<Option<Client>>;
        fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;
    }

    impl PermissionReader for Repository {
        fn list_permission_scopes(
            &self,
            user_id: UserId,
            organization_id: OrganizationId,
            action: StatusAction,
        ) -> RepositoryResult<Vec<GrantScope>>;
    }

    impl TerritoryReader for Repository {
        fn list_territory_branch_ids(
            &self,
            user_id: UserId,
            organization_id: OrganizationId,
        ) -> RepositoryResult<Vec<BranchId>>;
    }

    impl StatusCatalogReader for Repository {
        fn load_status_catalog(
            &self,
            organization_id: OrganizationId,
        ) -> RepositoryResult<StatusCatalog>;
    }

    impl StatusReader for Repository {
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

    impl StatusWriter for Repository {
        fn record_status_change(
            &self,
            change: &StatusChange,
        ) -> RepositoryResult<RecordedStatusChange>;
    }
}

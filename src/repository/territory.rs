//! Permission grants and territory membership lookups.

use diesel::prelude::*;

use crate::domain::territory::{GrantScope, STATUS_RESOURCE, StatusAction};
use crate::domain::types::{BranchId, OrganizationId, UserId};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, PermissionReader, TerritoryReader};

impl PermissionReader for DieselRepository {
    fn list_permission_scopes(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        action: StatusAction,
    ) -> RepositoryResult<Vec<GrantScope>> {
        use crate::schema::user_permissions;

        let mut conn = self.conn()?;
        let scopes = user_permissions::table
            .filter(user_permissions::user_id.eq(user_id.get()))
            .filter(user_permissions::organization_id.eq(organization_id.get()))
            .filter(user_permissions::resource.eq(STATUS_RESOURCE))
            .filter(user_permissions::action.eq(action.as_str()))
            .select(user_permissions::scope)
            .load::<String>(&mut conn)?;

        scopes
            .iter()
            .map(|scope| scope.parse::<GrantScope>().map_err(RepositoryError::from))
            .collect()
    }
}

impl TerritoryReader for DieselRepository {
    fn list_territory_branch_ids(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> RepositoryResult<Vec<BranchId>> {
        use crate::schema::{areas, branches, user_area_grants, user_branch_grants};

        let mut conn = self.conn()?;

        let direct = user_branch_grants::table
            .inner_join(branches::table.inner_join(areas::table))
            .filter(user_branch_grants::user_id.eq(user_id.get()))
            .filter(areas::organization_id.eq(organization_id.get()))
            .select(branches::id)
            .load::<i32>(&mut conn)?;

        let granted_areas = user_area_grants::table
            .inner_join(areas::table)
            .filter(user_area_grants::user_id.eq(user_id.get()))
            .filter(areas::organization_id.eq(organization_id.get()))
            .select(areas::id);

        let via_areas = branches::table
            .filter(branches::area_id.eq_any(granted_areas))
            .select(branches::id)
            .load::<i32>(&mut conn)?;

        let mut ids = direct
            .into_iter()
            .chain(via_areas)
            .map(|id| BranchId::try_from(id).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<BranchId>>>()?;
        ids.sort_unstable();
        ids.dedup();

        Ok(ids)
    }
}

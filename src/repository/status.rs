//! Status catalog, period status records and the event log.

use diesel::dsl::{max, now};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::period::PeriodKey;
use crate::domain::status::{
    ClientPeriodStatus, RecordedStatusChange, StatusCatalog, StatusChange, StatusEvent,
    StatusHistoryEntry, StatusReason, StatusType, TransitionRule,
};
use crate::domain::territory::TerritoryScope;
use crate::domain::types::{ClientId, OrganizationId};
use crate::models::status::{
    ClientPeriodStatus as DbClientPeriodStatus, NewClientPeriodStatus as DbNewClientPeriodStatus,
    NewStatusEvent as DbNewStatusEvent, StatusEvent as DbStatusEvent,
    StatusReason as DbStatusReason, StatusType as DbStatusType,
    TransitionRule as DbTransitionRule, UpdateClientPeriodStatus as DbUpdateClientPeriodStatus,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, PeriodStatusListQuery, StatusCatalogReader, StatusHistoryQuery,
    StatusReader, StatusWriter,
};

/// Narrows a boxed query on `client_period_statuses` to one period key.
macro_rules! filter_period {
    ($query:expr, $period:expr) => {{
        use crate::schema::client_period_statuses as cps;

        let period: &PeriodKey = $period;
        let query = $query
            .filter(cps::period_type.eq(period.period_type().as_str()))
            .filter(cps::period_year.eq(period.year()));
        let query = match period.month() {
            Some(month) => query.filter(cps::period_month.eq(month)),
            None => query.filter(cps::period_month.is_null()),
        };
        match period.quarter() {
            Some(quarter) => query.filter(cps::period_quarter.eq(quarter)),
            None => query.filter(cps::period_quarter.is_null()),
        }
    }};
}

fn find_period_status(
    conn: &mut SqliteConnection,
    client_id: ClientId,
    period: &PeriodKey,
) -> QueryResult<Option<DbClientPeriodStatus>> {
    use crate::schema::client_period_statuses;

    let query = client_period_statuses::table
        .filter(client_period_statuses::client_id.eq(client_id.get()))
        .into_boxed::<Sqlite>();

    filter_period!(query, period)
        .first::<DbClientPeriodStatus>(conn)
        .optional()
}

impl StatusCatalogReader for DieselRepository {
    fn load_status_catalog(
        &self,
        organization_id: OrganizationId,
    ) -> RepositoryResult<StatusCatalog> {
        use crate::schema::{status_reasons, status_transition_rules, status_types};

        let mut conn = self.conn()?;

        let db_types = status_types::table
            .filter(status_types::organization_id.eq(organization_id.get()))
            .load::<DbStatusType>(&mut conn)?;

        let db_reasons = status_reasons::table
            .inner_join(status_types::table)
            .filter(status_types::organization_id.eq(organization_id.get()))
            .select(status_reasons::all_columns)
            .load::<DbStatusReason>(&mut conn)?;

        let db_rules = status_transition_rules::table
            .filter(status_transition_rules::organization_id.eq(organization_id.get()))
            .load::<DbTransitionRule>(&mut conn)?;

        let status_types = db_types
            .into_iter()
            .map(StatusType::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let reasons = db_reasons
            .into_iter()
            .map(StatusReason::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let rules = db_rules
            .into_iter()
            .map(TransitionRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StatusCatalog::new(status_types, reasons, rules))
    }
}

impl StatusReader for DieselRepository {
    fn get_period_status(
        &self,
        client_id: ClientId,
        period: &PeriodKey,
    ) -> RepositoryResult<Option<ClientPeriodStatus>> {
        let mut conn = self.conn()?;

        find_period_status(&mut conn, client_id, period)?
            .map(|s| ClientPeriodStatus::try_from(s).map_err(RepositoryError::from))
            .transpose()
    }

    fn list_status_history(
        &self,
        query: StatusHistoryQuery,
    ) -> RepositoryResult<(usize, Vec<StatusHistoryEntry>)> {
        use crate::schema::{client_period_statuses, status_events};

        let mut conn = self.conn()?;

        let query_builder = || {
            let items = status_events::table
                .inner_join(client_period_statuses::table)
                .filter(client_period_statuses::client_id.eq(query.client_id.get()))
                .into_boxed::<Sqlite>();

            match &query.period {
                Some(period) => filter_period!(items, period),
                None => items,
            }
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let rows = items
            .order((
                client_period_statuses::id.asc(),
                status_events::event_sequence.asc(),
            ))
            .select((status_events::all_columns, client_period_statuses::all_columns))
            .load::<(DbStatusEvent, DbClientPeriodStatus)>(&mut conn)?;

        let entries = rows
            .into_iter()
            .map(|(db_event, db_status)| {
                let status = ClientPeriodStatus::try_from(db_status)?;
                let event = StatusEvent::try_from(db_event)?;
                Ok(StatusHistoryEntry {
                    period: status.period,
                    event,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, entries))
    }

    fn list_period_statuses(
        &self,
        query: PeriodStatusListQuery,
    ) -> RepositoryResult<(usize, Vec<ClientPeriodStatus>)> {
        use crate::schema::{client_period_statuses, clients, products};

        if query.branch_filter.scope == TerritoryScope::None {
            return Ok((0, vec![]));
        }

        let mut conn = self.conn()?;

        let branch_ids = query
            .branch_filter
            .branch_ids
            .iter()
            .map(|id| id.get())
            .collect::<Vec<i32>>();

        let query_builder = || {
            let items = client_period_statuses::table
                .inner_join(clients::table.inner_join(products::table))
                .filter(products::organization_id.eq(query.organization_id.get()))
                .into_boxed::<Sqlite>();

            let items = filter_period!(items, &query.period);

            if query.branch_filter.scope == TerritoryScope::Territory {
                items.filter(clients::branch_id.eq_any(branch_ids.clone()))
            } else {
                items
            }
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let statuses = items
            .order(clients::id.asc())
            .select(client_period_statuses::all_columns)
            .load::<DbClientPeriodStatus>(&mut conn)?
            .into_iter()
            .map(|s| ClientPeriodStatus::try_from(s).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, statuses))
    }
}

impl StatusWriter for DieselRepository {
    fn record_status_change(
        &self,
        change: &StatusChange,
    ) -> RepositoryResult<RecordedStatusChange> {
        use crate::schema::{client_period_statuses, status_events};

        let mut conn = self.conn()?;

        // BEGIN IMMEDIATE takes the write lock before the read below, so the
        // observed update_count and the next event sequence cannot go stale.
        let (db_status, db_event) = conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let existing = find_period_status(conn, change.client_id, &change.period)?;

            let observed = existing.as_ref().map(|s| s.update_count);
            if observed != change.expected_update_count {
                return Err(RepositoryError::Conflict(format!(
                    "client {} period {}: expected update count {:?}, found {:?}",
                    change.client_id, change.period, change.expected_update_count, observed
                )));
            }

            let db_status = match existing {
                Some(existing) => {
                    let updates: DbUpdateClientPeriodStatus = change.into();
                    diesel::update(client_period_statuses::table.find(existing.id))
                        .set((
                            &updates,
                            client_period_statuses::update_count
                                .eq(client_period_statuses::update_count + 1),
                            client_period_statuses::updated_at.eq(now),
                        ))
                        .get_result::<DbClientPeriodStatus>(conn)?
                }
                None => {
                    let new_status: DbNewClientPeriodStatus = change.into();
                    diesel::insert_into(client_period_statuses::table)
                        .values(&new_status)
                        .get_result::<DbClientPeriodStatus>(conn)?
                }
            };

            let last_sequence = status_events::table
                .filter(status_events::client_period_status_id.eq(db_status.id))
                .select(max(status_events::event_sequence))
                .first::<Option<i32>>(conn)?;

            let new_event =
                DbNewStatusEvent::for_change(db_status.id, last_sequence.unwrap_or(0) + 1, change);
            let db_event = diesel::insert_into(status_events::table)
                .values(&new_event)
                .get_result::<DbStatusEvent>(conn)?;

            Ok((db_status, db_event))
        })?;

        Ok(RecordedStatusChange {
            status: ClientPeriodStatus::try_from(db_status)?,
            event: StatusEvent::try_from(db_event)?,
        })
    }
}

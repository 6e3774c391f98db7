//! Diesel models for the status catalog, period statuses and status events.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::period::{PeriodKey, PeriodType};
use crate::domain::status::{
    ClientPeriodStatus as DomainClientPeriodStatus, StatusChange, StatusEvent as DomainStatusEvent,
    StatusReason as DomainStatusReason, StatusType as DomainStatusType,
    TransitionRule as DomainTransitionRule,
};
use crate::domain::types::{
    ClientId, ClientPeriodStatusId, OrganizationId, ReasonCode, ReasonName, Remarks, StatusCode,
    StatusEventId, StatusName, StatusReasonId, StatusTypeId, TypeConstraintError, UserId,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::status_types)]
pub struct StatusType {
    pub id: i32,
    pub organization_id: i32,
    pub code: String,
    pub name: String,
    pub is_terminal: bool,
    pub requires_reason: bool,
    pub requires_remarks: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::status_reasons)]
#[diesel(belongs_to(StatusType, foreign_key = status_type_id))]
pub struct StatusReason {
    pub id: i32,
    pub status_type_id: i32,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::status_transition_rules)]
pub struct TransitionRule {
    pub id: i32,
    pub organization_id: i32,
    pub from_status_type_id: i32,
    pub to_status_type_id: i32,
    pub allowed: bool,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::client_period_statuses)]
/// Diesel model for [`crate::domain::status::ClientPeriodStatus`].
pub struct ClientPeriodStatus {
    pub id: i32,
    pub client_id: i32,
    pub period_type: String,
    pub period_year: i32,
    pub period_month: Option<i32>,
    pub period_quarter: Option<i32>,
    pub status_type_id: i32,
    pub reason_id: Option<i32>,
    pub remarks: Option<String>,
    pub has_payment: bool,
    pub update_count: i32,
    pub is_terminal: bool,
    pub updated_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::client_period_statuses)]
/// Insertable form of [`ClientPeriodStatus`]; a new record starts at `update_count = 1`.
pub struct NewClientPeriodStatus<'a> {
    pub client_id: i32,
    pub period_type: &'static str,
    pub period_year: i32,
    pub period_month: Option<i32>,
    pub period_quarter: Option<i32>,
    pub status_type_id: i32,
    pub reason_id: Option<i32>,
    pub remarks: Option<&'a str>,
    pub has_payment: bool,
    pub update_count: i32,
    pub is_terminal: bool,
    pub updated_by: i32,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::client_period_statuses)]
#[diesel(treat_none_as_null = true)]
/// Mutable fields overwritten by a later status write.
pub struct UpdateClientPeriodStatus<'a> {
    pub status_type_id: i32,
    pub reason_id: Option<i32>,
    pub remarks: Option<&'a str>,
    pub has_payment: bool,
    pub is_terminal: bool,
    pub updated_by: i32,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::status_events)]
#[diesel(belongs_to(ClientPeriodStatus, foreign_key = client_period_status_id))]
/// Diesel model for [`crate::domain::status::StatusEvent`].
pub struct StatusEvent {
    pub id: i32,
    pub client_period_status_id: i32,
    pub status_type_id: i32,
    pub reason_id: Option<i32>,
    pub remarks: Option<String>,
    pub has_payment: bool,
    pub event_sequence: i32,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::status_events)]
pub struct NewStatusEvent<'a> {
    pub client_period_status_id: i32,
    pub status_type_id: i32,
    pub reason_id: Option<i32>,
    pub remarks: Option<&'a str>,
    pub has_payment: bool,
    pub event_sequence: i32,
    pub created_by: i32,
}

impl<'a> NewStatusEvent<'a> {
    /// Event appended for `change` on the record `client_period_status_id`.
    pub fn for_change(
        client_period_status_id: i32,
        event_sequence: i32,
        change: &'a StatusChange,
    ) -> Self {
        Self {
            client_period_status_id,
            status_type_id: change.status_type_id.get(),
            reason_id: change.reason_id.map(StatusReasonId::get),
            remarks: change.remarks.as_ref().map(Remarks::as_str),
            has_payment: change.has_payment,
            event_sequence,
            created_by: change.acting_user.get(),
        }
    }
}

impl<'a> From<&'a StatusChange> for NewClientPeriodStatus<'a> {
    fn from(change: &'a StatusChange) -> Self {
        Self {
            client_id: change.client_id.get(),
            period_type: change.period.period_type().as_str(),
            period_year: change.period.year(),
            period_month: change.period.month(),
            period_quarter: change.period.quarter(),
            status_type_id: change.status_type_id.get(),
            reason_id: change.reason_id.map(StatusReasonId::get),
            remarks: change.remarks.as_ref().map(Remarks::as_str),
            has_payment: change.has_payment,
            update_count: 1,
            is_terminal: change.is_terminal,
            updated_by: change.acting_user.get(),
        }
    }
}

impl<'a> From<&'a StatusChange> for UpdateClientPeriodStatus<'a> {
    fn from(change: &'a StatusChange) -> Self {
        Self {
            status_type_id: change.status_type_id.get(),
            reason_id: change.reason_id.map(StatusReasonId::get),
            remarks: change.remarks.as_ref().map(Remarks::as_str),
            has_payment: change.has_payment,
            is_terminal: change.is_terminal,
            updated_by: change.acting_user.get(),
        }
    }
}

fn optional_remarks(remarks: Option<String>) -> Result<Option<Remarks>, TypeConstraintError> {
    Remarks::optional(remarks)
}

impl TryFrom<StatusType> for DomainStatusType {
    type Error = TypeConstraintError;

    fn try_from(status: StatusType) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StatusTypeId::try_from(status.id)?,
            organization_id: OrganizationId::try_from(status.organization_id)?,
            code: StatusCode::new(status.code)?,
            name: StatusName::new(status.name)?,
            is_terminal: status.is_terminal,
            requires_reason: status.requires_reason,
            requires_remarks: status.requires_remarks,
            is_active: status.is_active,
        })
    }
}

impl TryFrom<StatusReason> for DomainStatusReason {
    type Error = TypeConstraintError;

    fn try_from(reason: StatusReason) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StatusReasonId::try_from(reason.id)?,
            status_type_id: StatusTypeId::try_from(reason.status_type_id)?,
            code: ReasonCode::new(reason.code)?,
            name: ReasonName::new(reason.name)?,
        })
    }
}

impl TryFrom<TransitionRule> for DomainTransitionRule {
    type Error = TypeConstraintError;

    fn try_from(rule: TransitionRule) -> Result<Self, Self::Error> {
        Ok(Self {
            from_status_type_id: StatusTypeId::try_from(rule.from_status_type_id)?,
            to_status_type_id: StatusTypeId::try_from(rule.to_status_type_id)?,
            allowed: rule.allowed,
        })
    }
}

impl TryFrom<ClientPeriodStatus> for DomainClientPeriodStatus {
    type Error = TypeConstraintError;

    fn try_from(status: ClientPeriodStatus) -> Result<Self, Self::Error> {
        let period = PeriodKey::from_parts(
            status.period_type.parse::<PeriodType>()?,
            status.period_year,
            status.period_month,
            status.period_quarter,
        )?;

        Ok(Self {
            id: ClientPeriodStatusId::try_from(status.id)?,
            client_id: ClientId::try_from(status.client_id)?,
            period,
            status_type_id: StatusTypeId::try_from(status.status_type_id)?,
            reason_id: status.reason_id.map(StatusReasonId::try_from).transpose()?,
            remarks: optional_remarks(status.remarks)?,
            has_payment: status.has_payment,
            update_count: status.update_count,
            is_terminal: status.is_terminal,
            updated_by: UserId::try_from(status.updated_by)?,
            created_at: status.created_at,
            updated_at: status.updated_at,
        })
    }
}

impl TryFrom<StatusEvent> for DomainStatusEvent {
    type Error = TypeConstraintError;

    fn try_from(event: StatusEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StatusEventId::try_from(event.id)?,
            client_period_status_id: ClientPeriodStatusId::try_from(
                event.client_period_status_id,
            )?,
            status_type_id: StatusTypeId::try_from(event.status_type_id)?,
            reason_id: event.reason_id.map(StatusReasonId::try_from).transpose()?,
            remarks: optional_remarks(event.remarks)?,
            has_payment: event.has_payment,
            event_sequence: event.event_sequence,
            created_by: UserId::try_from(event.created_by)?,
            created_at: event.created_at,
        })
    }
}

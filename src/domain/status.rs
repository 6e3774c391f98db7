//! Status catalog, current period statuses and their audit events.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::period::PeriodKey;
use crate::domain::types::{
    ClientId, ClientPeriodStatusId, OrganizationId, ReasonCode, ReasonName, Remarks, StatusCode,
    StatusEventId, StatusName, StatusReasonId, StatusTypeId, UserId,
};

/// A configurable disposition an organization can assign to a client.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StatusType {
    pub id: StatusTypeId,
    pub organization_id: OrganizationId,
    pub code: StatusCode,
    pub name: StatusName,
    /// No further change is allowed within the period once reached.
    pub is_terminal: bool,
    pub requires_reason: bool,
    pub requires_remarks: bool,
    pub is_active: bool,
}

/// A reason that may accompany one specific status type.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StatusReason {
    pub id: StatusReasonId,
    pub status_type_id: StatusTypeId,
    pub code: ReasonCode,
    pub name: ReasonName,
}

/// Organization override for one `from -> to` transition.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct TransitionRule {
    pub from_status_type_id: StatusTypeId,
    pub to_status_type_id: StatusTypeId,
    pub allowed: bool,
}

/// Everything the transition validator needs to know about an organization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusCatalog {
    status_types: HashMap<StatusTypeId, StatusType>,
    reasons: HashMap<StatusReasonId, StatusReason>,
    rules: HashMap<(StatusTypeId, StatusTypeId), bool>,
}

impl StatusCatalog {
    pub fn new(
        status_types: Vec<StatusType>,
        reasons: Vec<StatusReason>,
        rules: Vec<TransitionRule>,
    ) -> Self {
        Self {
            status_types: status_types.into_iter().map(|s| (s.id, s)).collect(),
            reasons: reasons.into_iter().map(|r| (r.id, r)).collect(),
            rules: rules
                .into_iter()
                .map(|r| ((r.from_status_type_id, r.to_status_type_id), r.allowed))
                .collect(),
        }
    }

    pub fn status_type(&self, id: StatusTypeId) -> Option<&StatusType> {
        self.status_types.get(&id)
    }

    pub fn reason(&self, id: StatusReasonId) -> Option<&StatusReason> {
        self.reasons.get(&id)
    }

    /// Explicit organization rule for the pair, if one is configured.
    pub fn rule(&self, from: StatusTypeId, to: StatusTypeId) -> Option<bool> {
        self.rules.get(&(from, to)).copied()
    }

    /// Status types sorted by id, each with its reasons sorted by id.
    pub fn entries(&self) -> Vec<(StatusType, Vec<StatusReason>)> {
        let mut status_types: Vec<&StatusType> = self.status_types.values().collect();
        status_types.sort_by_key(|s| s.id);

        status_types
            .into_iter()
            .map(|status_type| {
                let mut reasons: Vec<StatusReason> = self
                    .reasons
                    .values()
                    .filter(|r| r.status_type_id == status_type.id)
                    .cloned()
                    .collect();
                reasons.sort_by_key(|r| r.id);
                (status_type.clone(), reasons)
            })
            .collect()
    }
}

/// Current disposition of one client for one reporting period.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ClientPeriodStatus {
    pub id: ClientPeriodStatusId,
    pub client_id: ClientId,
    pub period: PeriodKey,
    pub status_type_id: StatusTypeId,
    pub reason_id: Option<StatusReasonId>,
    pub remarks: Option<Remarks>,
    pub has_payment: bool,
    /// 1 after creation, +1 on every later write.
    pub update_count: i32,
    pub is_terminal: bool,
    pub updated_by: UserId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Immutable audit record of one status change.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StatusEvent {
    pub id: StatusEventId,
    pub client_period_status_id: ClientPeriodStatusId,
    pub status_type_id: StatusTypeId,
    pub reason_id: Option<StatusReasonId>,
    pub remarks: Option<Remarks>,
    pub has_payment: bool,
    /// Gapless, starting at 1 per status record.
    pub event_sequence: i32,
    pub created_by: UserId,
    pub created_at: NaiveDateTime,
}

/// A status event together with the period of the record it belongs to.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StatusHistoryEntry {
    pub period: PeriodKey,
    pub event: StatusEvent,
}

/// One requested status change, already well-formed.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdateRequest {
    pub client_id: ClientId,
    pub period: PeriodKey,
    pub status_type_id: StatusTypeId,
    pub reason_id: Option<StatusReasonId>,
    pub remarks: Option<Remarks>,
    pub has_payment: bool,
}

/// A validated status write handed to the repository.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusChange {
    pub client_id: ClientId,
    pub period: PeriodKey,
    pub status_type_id: StatusTypeId,
    pub reason_id: Option<StatusReasonId>,
    pub remarks: Option<Remarks>,
    pub has_payment: bool,
    pub is_terminal: bool,
    pub acting_user: UserId,
    /// `update_count` observed when the change was validated; `None` when no
    /// record existed. The write is refused if storage no longer matches.
    pub expected_update_count: Option<i32>,
}

/// Result of a successful status write.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedStatusChange {
    pub status: ClientPeriodStatus,
    pub event: StatusEvent,
}

//! Identity of the caller as seen by the services.

use serde::Serialize;

use crate::domain::types::{OrganizationId, UserId};

/// The acting user and the organization the request is made in.
///
/// Passed explicitly into every service call instead of being looked up from
/// request-local state.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
pub struct Actor {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: UserId, organization_id: OrganizationId) -> Self {
        Self {
            user_id,
            organization_id,
        }
    }
}

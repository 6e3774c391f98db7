//! Capability grants and the territory filter derived from them.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::types::{BranchId, TypeConstraintError};

/// Resource name under which status capabilities are granted.
pub const STATUS_RESOURCE: &str = "status";

/// Actions a user may be granted on client statuses.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Read,
    Update,
    BulkUpdate,
}

impl StatusAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusAction::Read => "read",
            StatusAction::Update => "update",
            StatusAction::BulkUpdate => "bulk_update",
        }
    }
}

impl Display for StatusAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{STATUS_RESOURCE}:{}", self.as_str())
    }
}

/// Breadth of a single permission grant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GrantScope {
    /// Every branch of the organization.
    All,
    /// Only branches reachable through the user's area/branch grants.
    Territory,
}

impl GrantScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            GrantScope::All => "all",
            GrantScope::Territory => "territory",
        }
    }
}

impl FromStr for GrantScope {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(GrantScope::All),
            "territory" => Ok(GrantScope::Territory),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown grant scope `{other}`"
            ))),
        }
    }
}

/// Breadth of branches a user may act on for one action.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TerritoryScope {
    None,
    Territory,
    All,
}

/// Branch restriction computed per request from a user's grants.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct BranchFilter {
    pub scope: TerritoryScope,
    /// Populated only when `scope` is [`TerritoryScope::Territory`].
    pub branch_ids: BTreeSet<BranchId>,
}

impl BranchFilter {
    #[must_use]
    pub fn none() -> Self {
        Self {
            scope: TerritoryScope::None,
            branch_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self {
            scope: TerritoryScope::All,
            branch_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn territory<I>(branch_ids: I) -> Self
    where
        I: IntoIterator<Item = BranchId>,
    {
        Self {
            scope: TerritoryScope::Territory,
            branch_ids: branch_ids.into_iter().collect(),
        }
    }

    /// Answers whether the filter lets the user act on `branch_id`.
    pub fn allows(&self, branch_id: BranchId) -> bool {
        match self.scope {
            TerritoryScope::All => true,
            TerritoryScope::Territory => self.branch_ids.contains(&branch_id),
            TerritoryScope::None => false,
        }
    }

    pub fn is_none(&self) -> bool {
        self.scope == TerritoryScope::None
    }
}

/// Derives the branch filter from already-loaded grants.
///
/// `grant_scopes` are the scopes of every grant the user holds for the action
/// in the organization; `territory_branches` is the union of directly granted
/// branches and the branches of granted areas. An unscoped grant wins over
/// scoped ones.
pub fn resolve_branch_filter<I>(grant_scopes: &[GrantScope], territory_branches: I) -> BranchFilter
where
    I: IntoIterator<Item = BranchId>,
{
    if grant_scopes.contains(&GrantScope::All) {
        BranchFilter::all()
    } else if grant_scopes.contains(&GrantScope::Territory) {
        BranchFilter::territory(territory_branches)
    } else {
        BranchFilter::none()
    }
}

//! Role reconciliation primitives
//!
//! [`RoleTarget`] states what the authoritative source says about a member's
//! roles; [`RoleDiff`] is the minimal set of changes that makes the local
//! association match it.

use std::collections::BTreeSet;

use crate::value_objects::Snowflake;

/// Authoritative role state for one member
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleTarget {
    /// Nothing is known; leave the member untouched
    #[default]
    NoChange,
    /// The complete set of Discord role IDs the member must end up with.
    /// An empty set detaches everything.
    TargetSet(BTreeSet<Snowflake>),
    /// The source reported no membership data at all; drop every role
    DetachAll,
}

impl RoleTarget {
    /// Build a target set, collapsing duplicates
    pub fn set(ids: impl IntoIterator<Item = Snowflake>) -> Self {
        Self::TargetSet(ids.into_iter().collect())
    }

    #[inline]
    pub fn is_no_change(&self) -> bool {
        matches!(self, Self::NoChange)
    }
}

/// Absent data (`None`) means "no roles" and detaches everything.
impl From<Option<Vec<Snowflake>>> for RoleTarget {
    fn from(ids: Option<Vec<Snowflake>>) -> Self {
        match ids {
            Some(ids) => Self::set(ids),
            None => Self::DetachAll,
        }
    }
}

/// Set difference between current and target Discord role IDs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleDiff {
    pub to_attach: BTreeSet<Snowflake>,
    pub to_detach: BTreeSet<Snowflake>,
}

impl RoleDiff {
    /// `to_detach = current - target`, `to_attach = target - current`
    pub fn compute(current: &BTreeSet<Snowflake>, target: &BTreeSet<Snowflake>) -> Self {
        Self {
            to_attach: target.difference(current).copied().collect(),
            to_detach: current.difference(target).copied().collect(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to_attach.is_empty() && self.to_detach.is_empty()
    }
}

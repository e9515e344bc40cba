//! Role catalog - immutable snapshot of a guild's locally known roles

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::Role;
use crate::value_objects::{RecordId, Snowflake};

/// Snapshot of a guild's roles keyed by Discord role ID
///
/// A refresh produces a new snapshot instead of mutating this one, so a
/// reconciliation in progress never observes a half-updated catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
    guild_id: RecordId,
    roles: HashMap<Snowflake, Role>,
    loaded_at: DateTime<Utc>,
}

impl RoleCatalog {
    /// Build a snapshot; roles from other guilds are ignored
    pub fn new(guild_id: RecordId, roles: impl IntoIterator<Item = Role>) -> Self {
        let roles = roles
            .into_iter()
            .filter(|role| role.guild_id == guild_id)
            .map(|role| (role.discord_id, role))
            .collect();
        Self {
            guild_id,
            roles,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty(guild_id: RecordId) -> Self {
        Self::new(guild_id, Vec::new())
    }

    #[inline]
    pub fn guild_id(&self) -> RecordId {
        self.guild_id
    }

    #[inline]
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    #[inline]
    pub fn resolve(&self, discord_id: Snowflake) -> Option<&Role> {
        self.roles.get(&discord_id)
    }

    #[inline]
    pub fn contains(&self, discord_id: Snowflake) -> bool {
        self.roles.contains_key(&discord_id)
    }

    /// Split Discord IDs into resolved local IDs and unresolved Discord IDs
    ///
    /// Both outputs keep the input order.
    pub fn partition<'a, I>(&self, discord_ids: I) -> (Vec<RecordId>, Vec<Snowflake>)
    where
        I: IntoIterator<Item = &'a Snowflake>,
    {
        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        for discord_id in discord_ids {
            match self.resolve(*discord_id) {
                Some(role) => resolved.push(role.id),
                None => unresolved.push(*discord_id),
            }
        }
        (resolved, unresolved)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

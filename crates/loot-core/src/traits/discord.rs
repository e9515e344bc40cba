//! External source ports - Discord as the authority for roles and membership

use async_trait::async_trait;

use super::repositories::RepoResult;
use crate::entities::{DiscordMember, DiscordRole, Guild, RoleCatalog};
use crate::value_objects::Snowflake;

/// Read access to a Discord guild's roles and members
#[async_trait]
pub trait DiscordRoleSource: Send + Sync {
    /// All role definitions of a Discord guild
    async fn fetch_guild_roles(&self, guild_id: Snowflake) -> RepoResult<Vec<DiscordRole>>;

    /// One member of a Discord guild; `None` when the user is not in the guild
    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<DiscordMember>>;

    /// A page of guild members ordered by user ID, starting after `after`
    async fn list_members(
        &self,
        guild_id: Snowflake,
        limit: u16,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<DiscordMember>>;
}

/// Result of asking for a fresh role catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Roles were pulled from Discord and stored; this is the new snapshot
    Refreshed(RoleCatalog),
    /// Discord could not be reached or answered with an error
    Failed { reason: String },
}

impl RefreshOutcome {
    pub fn catalog(&self) -> Option<&RoleCatalog> {
        match self {
            Self::Refreshed(catalog) => Some(catalog),
            Self::Failed { .. } => None,
        }
    }
}

/// Re-fetches a guild's role catalog from Discord and stores it
///
/// Errors are reserved for local storage failures. Discord being unavailable
/// is reported as [`RefreshOutcome::Failed`].
#[async_trait]
pub trait RoleCatalogRefresher: Send + Sync {
    async fn refresh(&self, guild: &Guild) -> RepoResult<RefreshOutcome>;
}

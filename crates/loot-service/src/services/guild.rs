//! Guild role service
//!
//! Standalone access to a guild's role catalog: inspect it or refresh it from
//! Discord outside of any member reconciliation.

use tracing::{info, instrument};

use loot_core::entities::{Guild, RoleCatalog};
use loot_core::traits::RefreshOutcome;
use loot_core::value_objects::{RecordId, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Guild role service
pub struct GuildRoleService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GuildRoleService<'a> {
    /// Create a new GuildRoleService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a Discord guild locally
    #[instrument(skip(self))]
    pub async fn register_guild(&self, discord_id: Snowflake, name: &str) -> ServiceResult<Guild> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(ServiceError::validation(
                "Guild name must be between 1 and 100 characters",
            ));
        }

        if self
            .ctx
            .guild_repo()
            .find_by_discord_id(discord_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::conflict(format!(
                "Discord guild {discord_id} is already registered"
            )));
        }

        let guild = self.ctx.guild_repo().create(discord_id, name).await?;
        info!(guild_id = %guild.id, guild_discord_id = %discord_id, "Guild registered");
        Ok(guild)
    }

    /// Current snapshot of the guild's locally known roles
    #[instrument(skip(self))]
    pub async fn catalog(&self, guild_id: RecordId) -> ServiceResult<RoleCatalog> {
        let guild = self.ctx.require_guild(guild_id).await?;
        self.ctx.load_catalog(&guild).await
    }

    /// Pull the guild's roles from Discord and store them
    ///
    /// A Discord failure is reported as [`RefreshOutcome::Failed`], not as an
    /// error.
    #[instrument(skip(self))]
    pub async fn refresh_roles(&self, guild_id: RecordId) -> ServiceResult<RefreshOutcome> {
        let guild = self.ctx.require_guild(guild_id).await?;
        Ok(self.ctx.refresher().refresh(&guild).await?)
    }
}

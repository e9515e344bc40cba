//! Guild role catalog refresh from Discord

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use loot_core::entities::{Guild, RoleCatalog};
use loot_core::traits::{
    DiscordRoleSource, RefreshOutcome, RepoResult, RoleCatalogRefresher, RoleRepository,
};

/// Pulls every role of a guild from Discord and upserts it locally
///
/// Upserts are keyed on `(guild, discord role id)`, so concurrent refreshes of
/// the same guild are harmless and the last writer wins.
pub struct DiscordCatalogRefresher {
    source: Arc<dyn DiscordRoleSource>,
    roles: Arc<dyn RoleRepository>,
    timeout: Duration,
}

impl DiscordCatalogRefresher {
    pub fn new(
        source: Arc<dyn DiscordRoleSource>,
        roles: Arc<dyn RoleRepository>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            roles,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl RoleCatalogRefresher for DiscordCatalogRefresher {
    #[instrument(skip(self, guild), fields(guild_id = %guild.id, guild_discord_id = %guild.discord_id))]
    async fn refresh(&self, guild: &Guild) -> RepoResult<RefreshOutcome> {
        let fetched =
            tokio::time::timeout(self.timeout, self.source.fetch_guild_roles(guild.discord_id)).await;

        let discord_roles = match fetched {
            Ok(Ok(roles)) => roles,
            Ok(Err(e)) => {
                warn!(error = %e, "Role catalog refresh failed");
                return Ok(RefreshOutcome::Failed {
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Role catalog refresh timed out");
                return Ok(RefreshOutcome::Failed {
                    reason: format!("timed out after {:?}", self.timeout),
                });
            }
        };

        debug!(fetched = discord_roles.len(), "Fetched Discord roles");

        // Storage failures are fatal, unlike Discord failures above
        self.roles
            .upsert_from_discord(guild.id, &discord_roles)
            .await?;
        let stored = self.roles.find_by_guild(guild.id).await?;
        let catalog = RoleCatalog::new(guild.id, stored);

        info!(roles = catalog.len(), "Role catalog refreshed");

        Ok(RefreshOutcome::Refreshed(catalog))
    }
}

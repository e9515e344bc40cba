//! Service context - dependency container for services
//!
//! Holds the repositories, the Discord source and the catalog refresher.

use std::sync::Arc;

use loot_common::SyncConfig;
use loot_core::entities::{Guild, RoleCatalog};
use loot_core::traits::{
    DiscordRoleSource, GuildRepository, MemberRepository, RoleCatalogRefresher, RoleRepository,
};

use super::error::{ServiceError, ServiceResult};
use super::locks::MemberLocks;
use super::refresh::DiscordCatalogRefresher;

/// Service context containing all dependencies
///
/// Cheap to clone; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    guild_repo: Arc<dyn GuildRepository>,
    role_repo: Arc<dyn RoleRepository>,
    member_repo: Arc<dyn MemberRepository>,

    // Discord
    discord: Arc<dyn DiscordRoleSource>,
    refresher: Arc<dyn RoleCatalogRefresher>,

    sync_config: SyncConfig,
    member_locks: Arc<MemberLocks>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        guild_repo: Arc<dyn GuildRepository>,
        role_repo: Arc<dyn RoleRepository>,
        member_repo: Arc<dyn MemberRepository>,
        discord: Arc<dyn DiscordRoleSource>,
        refresher: Arc<dyn RoleCatalogRefresher>,
        sync_config: SyncConfig,
    ) -> Self {
        Self {
            guild_repo,
            role_repo,
            member_repo,
            discord,
            refresher,
            sync_config,
            member_locks: Arc::new(MemberLocks::new()),
        }
    }

    // === Repositories ===

    /// Get the guild repository
    pub fn guild_repo(&self) -> &dyn GuildRepository {
        self.guild_repo.as_ref()
    }

    /// Get the role repository
    pub fn role_repo(&self) -> &dyn RoleRepository {
        self.role_repo.as_ref()
    }

    /// Get the member repository
    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    // === Discord ===

    /// Get the Discord role and membership source
    pub fn discord(&self) -> &dyn DiscordRoleSource {
        self.discord.as_ref()
    }

    /// Get the guild role catalog refresher
    pub fn refresher(&self) -> &dyn RoleCatalogRefresher {
        self.refresher.as_ref()
    }

    // === Settings ===

    pub fn sync_config(&self) -> &SyncConfig {
        &self.sync_config
    }

    pub fn member_locks(&self) -> &MemberLocks {
        self.member_locks.as_ref()
    }

    // === Shared lookups ===

    /// Load a guild or fail with `NotFound`
    pub async fn require_guild(&self, guild_id: loot_core::RecordId) -> ServiceResult<Guild> {
        self.guild_repo
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))
    }

    /// Snapshot of the guild's locally stored roles
    pub async fn load_catalog(&self, guild: &Guild) -> ServiceResult<RoleCatalog> {
        let roles = self.role_repo.find_by_guild(guild.id).await?;
        Ok(RoleCatalog::new(guild.id, roles))
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("discord", &"...")
            .field("sync_config", &self.sync_config)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext with custom configuration
///
/// When no refresher is given, a [`DiscordCatalogRefresher`] is assembled from
/// the Discord source, the role repository and the configured timeout.
#[derive(Default)]
pub struct ServiceContextBuilder {
    guild_repo: Option<Arc<dyn GuildRepository>>,
    role_repo: Option<Arc<dyn RoleRepository>>,
    member_repo: Option<Arc<dyn MemberRepository>>,
    discord: Option<Arc<dyn DiscordRoleSource>>,
    refresher: Option<Arc<dyn RoleCatalogRefresher>>,
    sync_config: Option<SyncConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild_repo(mut self, repo: Arc<dyn GuildRepository>) -> Self {
        self.guild_repo = Some(repo);
        self
    }

    pub fn role_repo(mut self, repo: Arc<dyn RoleRepository>) -> Self {
        self.role_repo = Some(repo);
        self
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn discord(mut self, source: Arc<dyn DiscordRoleSource>) -> Self {
        self.discord = Some(source);
        self
    }

    pub fn refresher(mut self, refresher: Arc<dyn RoleCatalogRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn sync_config(mut self, config: SyncConfig) -> Self {
        self.sync_config = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let guild_repo = self
            .guild_repo
            .ok_or_else(|| ServiceError::validation("guild_repo is required"))?;
        let role_repo = self
            .role_repo
            .ok_or_else(|| ServiceError::validation("role_repo is required"))?;
        let member_repo = self
            .member_repo
            .ok_or_else(|| ServiceError::validation("member_repo is required"))?;
        let discord = self
            .discord
            .ok_or_else(|| ServiceError::validation("discord is required"))?;
        let sync_config = self.sync_config.unwrap_or_default();

        let refresher = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(DiscordCatalogRefresher::new(
                Arc::clone(&discord),
                Arc::clone(&role_repo),
                sync_config.refresh_timeout(),
            )),
        };

        Ok(ServiceContext::new(
            guild_repo,
            role_repo,
            member_repo,
            discord,
            refresher,
            sync_config,
        ))
    }
}

//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;

use crate::entities::{DiscordRole, Guild, Member, Role};
use crate::error::DomainError;
use crate::value_objects::{RecordId, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Guild Repository
// ============================================================================

#[async_trait]
pub trait GuildRepository: Send + Sync {
    /// Find guild by local ID
    async fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Guild>>;

    /// Find guild by its Discord server ID
    async fn find_by_discord_id(&self, discord_id: Snowflake) -> RepoResult<Option<Guild>>;

    /// Register a Discord server as a guild; storage assigns the ID
    async fn create(&self, discord_id: Snowflake, name: &str) -> RepoResult<Guild>;
}

// ============================================================================
// Role Repository
// ============================================================================

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Find role by local ID
    async fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Role>>;

    /// List all roles of a guild (ordered by position, highest first)
    async fn find_by_guild(&self, guild_id: RecordId) -> RepoResult<Vec<Role>>;

    /// Insert or update roles keyed on `(guild_id, discord_id)`
    ///
    /// Last writer wins; concurrent upserts of the same role are safe.
    /// Returns the number of rows written.
    async fn upsert_from_discord(&self, guild_id: RecordId, roles: &[DiscordRole])
        -> RepoResult<u64>;
}

// ============================================================================
// Member Repository
// ============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find member by local ID, with role IDs loaded
    async fn find(&self, id: RecordId) -> RepoResult<Option<Member>>;

    /// Find the membership of a user in a guild
    async fn find_by_user(&self, guild_id: RecordId, user_id: RecordId)
        -> RepoResult<Option<Member>>;

    /// List all members of a guild, with role IDs loaded
    async fn find_by_guild(&self, guild_id: RecordId) -> RepoResult<Vec<Member>>;

    /// Insert a member; `member.id` and `member.role_ids` are ignored.
    /// Returns the ID assigned by storage.
    async fn create(&self, member: &Member) -> RepoResult<RecordId>;

    /// Update notes and lifecycle timestamps
    async fn update(&self, member: &Member) -> RepoResult<()>;

    /// Roles currently associated with the member
    async fn current_roles(&self, member_id: RecordId) -> RepoResult<Vec<Role>>;

    /// Associate roles with the member in one batch.
    /// Already-present associations are left alone.
    async fn attach_roles(&self, member_id: RecordId, role_ids: &[RecordId]) -> RepoResult<u64>;

    /// Remove role associations; `None` removes all of them.
    /// Already-absent associations are not an error.
    async fn detach_roles(&self, member_id: RecordId, role_ids: Option<&[RecordId]>)
        -> RepoResult<u64>;
}

//! # loot-core
//!
//! Domain layer for the guild roster: entities, value objects, the role catalog
//! snapshot, role reconciliation primitives, and the ports implemented by the
//! storage and Discord adapters.
//! This crate has zero dependencies on infrastructure (database, HTTP client, etc.).

pub mod entities;
pub mod error;
pub mod reconcile;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{DiscordMember, DiscordRole, Guild, Member, Role, RoleCatalog};
pub use error::DomainError;
pub use reconcile::{RoleDiff, RoleTarget};
pub use traits::{
    DiscordRoleSource, GuildRepository, MemberRepository, RefreshOutcome, RepoResult,
    RoleCatalogRefresher, RoleRepository,
};
pub use value_objects::{RecordId, Snowflake, SnowflakeParseError};

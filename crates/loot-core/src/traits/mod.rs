//! Ports - interfaces the domain needs from infrastructure

mod discord;
mod repositories;

pub use discord::{DiscordRoleSource, RefreshOutcome, RoleCatalogRefresher};
pub use repositories::{GuildRepository, MemberRepository, RepoResult, RoleRepository};

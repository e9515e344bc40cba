//! # loot-service
//!
//! Application layer: keeps local role associations in agreement with Discord.
//!
//! - [`RoleReconciler`] applies an authoritative role target to one member
//! - [`DiscordCatalogRefresher`] pulls a guild's role catalog from Discord
//! - [`MemberSyncService`] looks members up on Discord and feeds the reconciler
//! - [`MemberService`] creates members and manages their lifecycle fields

pub mod services;

pub use services::{
    Anomaly, CreatedMember, DiscordCatalogRefresher, GuildRoleService, GuildSyncSummary,
    MemberLockGuard, MemberLocks, MemberService, MemberSyncService, ReconcileReport,
    RoleReconciler, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
    UnresolvedCause,
};

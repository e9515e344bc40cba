//! Business logic services
//!
//! Services borrow a [`ServiceContext`] and orchestrate repository and Discord
//! calls. None of them hold state between calls.

pub mod context;
pub mod error;
pub mod guild;
pub mod locks;
pub mod member;
pub mod member_sync;
pub mod reconciler;
pub mod refresh;

// Re-export all services for convenience
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use guild::GuildRoleService;
pub use locks::{MemberLockGuard, MemberLocks};
pub use member::{CreatedMember, MemberService};
pub use member_sync::{GuildSyncSummary, MemberSyncService};
pub use reconciler::{Anomaly, ReconcileReport, RoleReconciler, UnresolvedCause};
pub use refresh::DiscordCatalogRefresher;

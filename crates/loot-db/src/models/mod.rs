//! Database models - SQLx-compatible structs for PostgreSQL tables

mod guild;
mod member;
mod role;

pub use guild::GuildModel;
pub use member::{MemberModel, MemberRoleModel};
pub use role::RoleModel;

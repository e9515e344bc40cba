//! Entity to model mappers
//!
//! Conversions from database rows (`*Model`) to domain entities (loot-core).

mod guild;
mod member;
mod role;

pub use member::{group_role_ids, member_with_roles};

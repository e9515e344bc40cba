//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in loot-core.

mod error;
mod guild;
mod member;
mod role;

pub use guild::PgGuildRepository;
pub use member::PgMemberRepository;
pub use role::PgRoleRepository;

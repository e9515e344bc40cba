//! Domain entities - core business objects

mod catalog;
mod discord;
mod guild;
mod member;
mod role;

pub use catalog::RoleCatalog;
pub use discord::{DiscordMember, DiscordRole};
pub use guild::Guild;
pub use member::Member;
pub use role::Role;

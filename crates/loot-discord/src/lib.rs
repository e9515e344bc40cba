//! # loot-discord
//!
//! Discord REST API adapter implementing [`loot_core::traits::DiscordRoleSource`].
//!
//! Only the read endpoints needed for role synchronization are covered:
//!
//! - `GET /guilds/{guild.id}/roles`
//! - `GET /guilds/{guild.id}/members/{user.id}`
//! - `GET /guilds/{guild.id}/members?limit=&after=`

mod client;
mod error;
mod payloads;

pub use client::{DiscordClient, DEFAULT_API_BASE};
pub use error::{DiscordError, UNKNOWN_MEMBER};

//! Records as reported by Discord
//!
//! These are the authoritative inputs for role refresh and reconciliation.
//! They carry no local identifiers.

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Role definition reported by `GET /guilds/{guild.id}/roles`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordRole {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub color: i32,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub permissions: Option<String>,
    /// Roles owned by an integration (bots, boosts)
    #[serde(default)]
    pub managed: bool,
}

/// Guild membership reported by `GET /guilds/{guild.id}/members/{user.id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordMember {
    pub user_id: Snowflake,
    pub username: String,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
}

impl DiscordMember {
    /// Name shown in the guild (nickname if set)
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

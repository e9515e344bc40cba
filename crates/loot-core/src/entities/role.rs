//! Role entity - a guild role known locally and mirrored from Discord

use chrono::{DateTime, Utc};

use super::DiscordRole;
use crate::value_objects::{RecordId, Snowflake};

/// Role entity
///
/// Identified locally by `id` and externally by `discord_id`.
/// `(guild_id, discord_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RecordId,
    pub guild_id: RecordId,
    pub discord_id: Snowflake,
    pub name: String,
    pub color: i32,
    pub position: i32,
    /// Raw Discord permission bits, kept as the decimal string Discord sends
    pub permissions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Create a new Role
    pub fn new(id: RecordId, guild_id: RecordId, discord_id: Snowflake, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            guild_id,
            discord_id,
            name,
            color: 0,
            position: 0,
            permissions: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a local role from a Discord definition
    pub fn from_discord(id: RecordId, guild_id: RecordId, source: &DiscordRole) -> Self {
        let mut role = Self::new(id, guild_id, source.id, source.name.clone());
        role.color = source.color;
        role.position = source.position;
        role.permissions.clone_from(&source.permissions);
        role
    }

    /// Overwrite the mirrored fields with the Discord definition
    ///
    /// Returns `true` when anything changed.
    pub fn apply_discord(&mut self, source: &DiscordRole) -> bool {
        if self.matches_discord(source) {
            return false;
        }
        self.name.clone_from(&source.name);
        self.color = source.color;
        self.position = source.position;
        self.permissions.clone_from(&source.permissions);
        self.updated_at = Utc::now();
        true
    }

    /// Whether the mirrored fields already equal the Discord definition
    pub fn matches_discord(&self, source: &DiscordRole) -> bool {
        self.discord_id == source.id
            && self.name == source.name
            && self.color == source.color
            && self.position == source.position
            && self.permissions == source.permissions
    }

    /// Get the color as a hex string (without #)
    pub fn color_hex(&self) -> String {
        format!("{:06x}", self.color)
    }
}

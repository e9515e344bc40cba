//! Guild entity - a raiding guild mirrored from a Discord server

use chrono::{DateTime, Utc};

use crate::value_objects::{RecordId, Snowflake};

/// Guild entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: RecordId,
    pub discord_id: Snowflake,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guild {
    /// Create a new Guild
    pub fn new(id: RecordId, discord_id: Snowflake, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            discord_id,
            name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the guild name
    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }
}

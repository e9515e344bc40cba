//! Guild entity <-> model mapper

use loot_core::entities::Guild;
use loot_core::value_objects::{RecordId, Snowflake};

use crate::models::GuildModel;

impl From<GuildModel> for Guild {
    fn from(model: GuildModel) -> Self {
        Guild {
            id: RecordId::new(model.id),
            discord_id: Snowflake::new(model.discord_id),
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

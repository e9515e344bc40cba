//! Role entity <-> model mapper

use loot_core::entities::Role;
use loot_core::value_objects::{RecordId, Snowflake};

use crate::models::RoleModel;

impl From<RoleModel> for Role {
    fn from(model: RoleModel) -> Self {
        Role {
            id: RecordId::new(model.id),
            guild_id: RecordId::new(model.guild_id),
            discord_id: Snowflake::new(model.discord_id),
            name: model.name,
            color: model.color,
            position: model.position,
            permissions: model.discord_permissions,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

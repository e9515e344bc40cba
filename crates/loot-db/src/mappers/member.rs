//! Member entity <-> model mapper

use std::collections::HashMap;

use loot_core::entities::Member;
use loot_core::value_objects::{RecordId, Snowflake};

use crate::models::{MemberModel, MemberRoleModel};

/// Convert MemberModel to Member entity.
/// Role IDs are loaded separately; see [`member_with_roles`].
impl From<MemberModel> for Member {
    fn from(model: MemberModel) -> Self {
        member_with_roles(model, Vec::new())
    }
}

/// Convert MemberModel with its role IDs to Member entity
pub fn member_with_roles(model: MemberModel, role_ids: Vec<i64>) -> Member {
    Member {
        id: RecordId::new(model.id),
        guild_id: RecordId::new(model.guild_id),
        user_id: RecordId::new(model.user_id),
        discord_user_id: model.discord_user_id.map(Snowflake::new),
        username: model.username,
        public_note: model.public_note,
        officer_note: model.officer_note,
        role_ids: role_ids.into_iter().map(RecordId::new).collect(),
        banned_at: model.banned_at,
        inactive_at: model.inactive_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Group member_roles rows by member ID, oldest assignment first
pub fn group_role_ids(rows: Vec<MemberRoleModel>) -> HashMap<i64, Vec<i64>> {
    let mut rows = rows;
    rows.sort_by_key(|row| (row.member_id, row.created_at, row.role_id));

    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        grouped.entry(row.member_id).or_default().push(row.role_id);
    }
    grouped
}

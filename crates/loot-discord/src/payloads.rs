//! Wire shapes of Discord responses that differ from the domain records

use serde::Deserialize;

use loot_core::entities::DiscordMember;
use loot_core::value_objects::Snowflake;

/// Guild member object
#[derive(Debug, Deserialize)]
pub(crate) struct MemberPayload {
    /// Absent only in some gateway events, never on REST lookups
    pub user: Option<UserPayload>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserPayload {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

/// JSON body of a Discord error response
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: u32,
}

impl MemberPayload {
    pub(crate) fn into_member(self) -> Option<DiscordMember> {
        let user = self.user?;
        Some(DiscordMember {
            user_id: user.id,
            username: user.global_name.unwrap_or(user.username),
            nickname: self.nick,
            role_ids: self.roles,
        })
    }
}

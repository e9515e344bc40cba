//! Member database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for members table, joined with the owning user's Discord ID
#[derive(Debug, Clone, FromRow)]
pub struct MemberModel {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub discord_user_id: Option<i64>,
    pub username: String,
    pub public_note: Option<String>,
    pub officer_note: Option<String>,
    pub banned_at: Option<DateTime<Utc>>,
    pub inactive_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for member_roles table
#[derive(Debug, Clone, FromRow)]
pub struct MemberRoleModel {
    pub member_id: i64,
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
}

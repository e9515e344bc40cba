//! Member entity - a user's roster membership within one guild

use chrono::{DateTime, Utc};

use crate::value_objects::{RecordId, Snowflake};

/// Guild member entity
///
/// `role_ids` holds the loaded role association (local role ids). It is only
/// changed through reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: RecordId,
    pub guild_id: RecordId,
    pub user_id: RecordId,
    /// Discord account of the owning user, when linked
    pub discord_user_id: Option<Snowflake>,
    pub username: String,
    pub public_note: Option<String>,
    pub officer_note: Option<String>,
    pub role_ids: Vec<RecordId>,
    pub banned_at: Option<DateTime<Utc>>,
    /// Set when the member quit the guild
    pub inactive_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Create a new Member
    pub fn new(id: RecordId, guild_id: RecordId, user_id: RecordId, username: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            guild_id,
            user_id,
            discord_user_id: None,
            username,
            public_note: None,
            officer_note: None,
            role_ids: Vec::new(),
            banned_at: None,
            inactive_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Link the member to a Discord account
    pub fn with_discord_user(mut self, discord_user_id: Snowflake) -> Self {
        self.discord_user_id = Some(discord_user_id);
        self
    }

    #[inline]
    pub fn has_role(&self, role_id: RecordId) -> bool {
        self.role_ids.contains(&role_id)
    }

    #[inline]
    pub fn is_banned(&self) -> bool {
        self.banned_at.is_some()
    }

    #[inline]
    pub fn has_quit(&self) -> bool {
        self.inactive_at.is_some()
    }

    /// Active members are neither banned nor gone
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_banned() && !self.has_quit()
    }

    pub fn ban(&mut self) {
        if self.banned_at.is_none() {
            let now = Utc::now();
            self.banned_at = Some(now);
            self.updated_at = now;
        }
    }

    pub fn unban(&mut self) {
        if self.banned_at.take().is_some() {
            self.updated_at = Utc::now();
        }
    }

    /// Mark the member as having left the guild
    pub fn quit(&mut self) {
        if self.inactive_at.is_none() {
            let now = Utc::now();
            self.inactive_at = Some(now);
            self.updated_at = now;
        }
    }

    /// Bring a member back after quitting
    pub fn rejoin(&mut self) {
        if self.inactive_at.take().is_some() {
            self.updated_at = Utc::now();
        }
    }

    /// Replace both notes
    pub fn set_notes(&mut self, public_note: Option<String>, officer_note: Option<String>) {
        self.public_note = public_note;
        self.officer_note = officer_note;
        self.updated_at = Utc::now();
    }
}

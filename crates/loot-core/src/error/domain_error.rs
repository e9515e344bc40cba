//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{RecordId, Snowflake};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Guild not found: {0}")]
    GuildNotFound(RecordId),

    #[error("Guild not found for Discord guild {0}")]
    DiscordGuildNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(RecordId),

    #[error("Member not found: {0}")]
    MemberNotFound(RecordId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("User {user_id} is already a member of guild {guild_id}")]
    AlreadyMember { guild_id: RecordId, user_id: RecordId },

    #[error("Discord guild {0} is already registered")]
    GuildAlreadyExists(Snowflake),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Discord API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    DiscordApi { status: Option<u16>, message: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and CLI output
    pub fn code(&self) -> &'static str {
        match self {
            Self::GuildNotFound(_) | Self::DiscordGuildNotFound(_) => "UNKNOWN_GUILD",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::AlreadyMember { .. } => "ALREADY_MEMBER",
            Self::GuildAlreadyExists(_) => "GUILD_ALREADY_EXISTS",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::DiscordApi { .. } => "DISCORD_API_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GuildNotFound(_)
                | Self::DiscordGuildNotFound(_)
                | Self::RoleNotFound(_)
                | Self::MemberNotFound(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyMember { .. } | Self::GuildAlreadyExists(_))
    }

    /// Check if this error came from an external dependency
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::DiscordApi { .. })
    }
}

//! Discord client errors

use loot_core::error::DomainError;
use reqwest::StatusCode;

use crate::payloads::ErrorBody;

/// JSON error code for `Unknown Member`
pub const UNKNOWN_MEMBER: u32 = 10007;

/// Errors raised while talking to the Discord REST API
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    /// Transport failure (connect, TLS, timeout)
    #[error("Discord request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Discord answered with a non-success status
    #[error("Discord API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    /// The response body did not match the expected shape
    #[error("Failed to decode Discord response: {0}")]
    Decode(String),
}

impl DiscordError {
    /// HTTP status reported by Discord, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(e) => e.status(),
            Self::Status { status, .. } => Some(*status),
            Self::Decode(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Discord's JSON error code from a status response body
    pub fn discord_code(&self) -> Option<u32> {
        match self {
            Self::Status { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .map(|b| b.code),
            _ => None,
        }
    }

    /// 404 whose body names the member, not the guild, as missing
    pub fn is_unknown_member(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND) && self.discord_code() == Some(UNKNOWN_MEMBER)
    }
}

impl From<DiscordError> for DomainError {
    fn from(err: DiscordError) -> Self {
        DomainError::DiscordApi {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

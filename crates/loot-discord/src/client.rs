//! Discord REST client

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use loot_common::DiscordConfig;
use loot_core::entities::{DiscordMember, DiscordRole};
use loot_core::traits::{DiscordRoleSource, RepoResult};
use loot_core::value_objects::Snowflake;

use crate::error::DiscordError;
use crate::payloads::MemberPayload;

/// Discord API v10 base URL
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Largest page Discord accepts for `List Guild Members`
const MAX_MEMBER_PAGE: u16 = 1000;

/// Bot-authenticated Discord REST client
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DiscordClient {
    /// Build a client from configuration
    pub fn new(config: &DiscordConfig) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET request and decode the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, DiscordError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "Discord GET");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| DiscordError::Decode(e.to_string()))
    }

    /// `GET /guilds/{guild.id}/roles`
    pub async fn get_guild_roles(&self, guild_id: Snowflake) -> Result<Vec<DiscordRole>, DiscordError> {
        let endpoint = format!("/guilds/{guild_id}/roles");
        self.get(&endpoint, &[]).await
    }

    /// `GET /guilds/{guild.id}/members/{user.id}`
    ///
    /// `None` only when Discord reports Unknown Member. Any other 404, such as
    /// Unknown Guild, is an error.
    pub async fn get_guild_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<Option<DiscordMember>, DiscordError> {
        let endpoint = format!("/guilds/{guild_id}/members/{user_id}");
        match self.get::<MemberPayload>(&endpoint, &[]).await {
            Ok(payload) => Ok(payload.into_member()),
            Err(e) if e.is_unknown_member() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `GET /guilds/{guild.id}/members?limit=&after=`
    pub async fn list_guild_members(
        &self,
        guild_id: Snowflake,
        limit: u16,
        after: Option<Snowflake>,
    ) -> Result<Vec<DiscordMember>, DiscordError> {
        let endpoint = format!("/guilds/{guild_id}/members");
        let mut query = vec![("limit", limit.clamp(1, MAX_MEMBER_PAGE).to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let payloads: Vec<MemberPayload> = self.get(&endpoint, &query).await?;

        Ok(payloads
            .into_iter()
            .filter_map(MemberPayload::into_member)
            .collect())
    }
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DiscordRoleSource for DiscordClient {
    #[instrument(skip(self))]
    async fn fetch_guild_roles(&self, guild_id: Snowflake) -> RepoResult<Vec<DiscordRole>> {
        Ok(self.get_guild_roles(guild_id).await?)
    }

    #[instrument(skip(self))]
    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<DiscordMember>> {
        Ok(self.get_guild_member(guild_id, user_id).await?)
    }

    #[instrument(skip(self))]
    async fn list_members(
        &self,
        guild_id: Snowflake,
        limit: u16,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<DiscordMember>> {
        Ok(self.list_guild_members(guild_id, limit, after).await?)
    }
}

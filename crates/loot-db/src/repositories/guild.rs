//! PostgreSQL implementation of GuildRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use loot_core::entities::Guild;
use loot_core::error::DomainError;
use loot_core::traits::{GuildRepository, RepoResult};
use loot_core::value_objects::{RecordId, Snowflake};

use crate::models::GuildModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of GuildRepository
#[derive(Clone)]
pub struct PgGuildRepository {
    pool: PgPool,
}

impl PgGuildRepository {
    /// Create a new PgGuildRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildRepository for PgGuildRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Guild>> {
        let result = sqlx::query_as::<_, GuildModel>(
            r"
            SELECT id, discord_id, name, created_at, updated_at
            FROM guilds
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Guild::from))
    }

    #[instrument(skip(self))]
    async fn find_by_discord_id(&self, discord_id: Snowflake) -> RepoResult<Option<Guild>> {
        let result = sqlx::query_as::<_, GuildModel>(
            r"
            SELECT id, discord_id, name, created_at, updated_at
            FROM guilds
            WHERE discord_id = $1
            ",
        )
        .bind(discord_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Guild::from))
    }

    #[instrument(skip(self))]
    async fn create(&self, discord_id: Snowflake, name: &str) -> RepoResult<Guild> {
        let model = sqlx::query_as::<_, GuildModel>(
            r"
            INSERT INTO guilds (discord_id, name, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, discord_id, name, created_at, updated_at
            ",
        )
        .bind(discord_id.into_inner())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::GuildAlreadyExists(discord_id)))?;

        Ok(Guild::from(model))
    }
}

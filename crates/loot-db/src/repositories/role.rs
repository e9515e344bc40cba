//! PostgreSQL implementation of RoleRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use loot_core::entities::{DiscordRole, Role};
use loot_core::traits::{RepoResult, RoleRepository};
use loot_core::value_objects::RecordId;

use crate::models::RoleModel;

use super::error::map_db_error;

/// PostgreSQL implementation of RoleRepository
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    /// Create a new PgRoleRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Role>> {
        let result = sqlx::query_as::<_, RoleModel>(
            r"
            SELECT id, guild_id, discord_id, name, color, position, discord_permissions,
                   created_at, updated_at
            FROM roles
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Role::from))
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: RecordId) -> RepoResult<Vec<Role>> {
        let results = sqlx::query_as::<_, RoleModel>(
            r"
            SELECT id, guild_id, discord_id, name, color, position, discord_permissions,
                   created_at, updated_at
            FROM roles
            WHERE guild_id = $1
            ORDER BY position DESC, id
            ",
        )
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Role::from).collect())
    }

    #[instrument(skip(self, roles), fields(count = roles.len()))]
    async fn upsert_from_discord(
        &self,
        guild_id: RecordId,
        roles: &[DiscordRole],
    ) -> RepoResult<u64> {
        if roles.is_empty() {
            return Ok(0);
        }

        // One transaction so a refresh never leaves half a catalog behind
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let mut written = 0;

        for role in roles {
            let result = sqlx::query(
                r"
                INSERT INTO roles (guild_id, discord_id, name, color, position,
                                   discord_permissions, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
                ON CONFLICT (guild_id, discord_id) DO UPDATE
                SET name = EXCLUDED.name,
                    color = EXCLUDED.color,
                    position = EXCLUDED.position,
                    discord_permissions = EXCLUDED.discord_permissions,
                    updated_at = NOW()
                ",
            )
            .bind(guild_id.into_inner())
            .bind(role.id.into_inner())
            .bind(&role.name)
            .bind(role.color)
            .bind(role.position)
            .bind(&role.permissions)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

            written += result.rows_affected();
        }

        tx.commit().await.map_err(map_db_error)?;

        debug!(guild_id = %guild_id, written, "Upserted Discord roles");

        Ok(written)
    }
}

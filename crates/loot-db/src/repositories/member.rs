//! PostgreSQL implementation of MemberRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use loot_core::entities::{Member, Role};
use loot_core::error::DomainError;
use loot_core::traits::{MemberRepository, RepoResult};
use loot_core::value_objects::RecordId;

use crate::mappers::{group_role_ids, member_with_roles};
use crate::models::{MemberModel, MemberRoleModel, RoleModel};

use super::error::{map_db_error, map_unique_violation, to_i64s};

const MEMBER_COLUMNS: &str = r"
    m.id, m.guild_id, m.user_id, u.discord_id AS discord_user_id, m.username,
    m.public_note, m.officer_note, m.banned_at, m.inactive_at, m.created_at, m.updated_at
";

/// PostgreSQL implementation of MemberRepository
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a new PgMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load role IDs for a member
    async fn load_role_ids(&self, member_id: i64) -> Result<Vec<i64>, DomainError> {
        let role_ids = sqlx::query_scalar::<_, i64>(
            r"
            SELECT role_id FROM member_roles WHERE member_id = $1 ORDER BY created_at, role_id
            ",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(role_ids)
    }

    /// Fetch a single member matching `filter`, binding `params` in order
    async fn find_one(&self, filter: &str, params: &[i64]) -> RepoResult<Option<Member>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m LEFT JOIN users u ON u.id = m.user_id WHERE {filter}"
        );
        let mut query = sqlx::query_as::<_, MemberModel>(&sql);
        for value in params {
            query = query.bind(*value);
        }

        let result = query
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        match result {
            Some(model) => {
                let role_ids = self.load_role_ids(model.id).await?;
                Ok(Some(member_with_roles(model, role_ids)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self))]
    async fn find(&self, id: RecordId) -> RepoResult<Option<Member>> {
        self.find_one("m.id = $1", &[id.into_inner()]).await
    }

    #[instrument(skip(self))]
    async fn find_by_user(
        &self,
        guild_id: RecordId,
        user_id: RecordId,
    ) -> RepoResult<Option<Member>> {
        self.find_one(
            "m.guild_id = $1 AND m.user_id = $2",
            &[guild_id.into_inner(), user_id.into_inner()],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: RecordId) -> RepoResult<Vec<Member>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m LEFT JOIN users u ON u.id = m.user_id \
             WHERE m.guild_id = $1 ORDER BY m.username, m.id"
        );
        let models = sqlx::query_as::<_, MemberModel>(&sql)
            .bind(guild_id.into_inner())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        let member_ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let rows = sqlx::query_as::<_, MemberRoleModel>(
            r"
            SELECT member_id, role_id, created_at
            FROM member_roles
            WHERE member_id = ANY($1)
            ",
        )
        .bind(&member_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let mut grouped = group_role_ids(rows);
        Ok(models
            .into_iter()
            .map(|model| {
                let role_ids = grouped.remove(&model.id).unwrap_or_default();
                member_with_roles(model, role_ids)
            })
            .collect())
    }

    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    async fn create(&self, member: &Member) -> RepoResult<RecordId> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO members (guild_id, user_id, username, public_note, officer_note,
                                 banned_at, inactive_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(member.guild_id.into_inner())
        .bind(member.user_id.into_inner())
        .bind(&member.username)
        .bind(&member.public_note)
        .bind(&member.officer_note)
        .bind(member.banned_at)
        .bind(member.inactive_at)
        .bind(member.created_at)
        .bind(member.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || DomainError::AlreadyMember {
                guild_id: member.guild_id,
                user_id: member.user_id,
            })
        })?;

        Ok(RecordId::new(id))
    }

    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn update(&self, member: &Member) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE members
            SET username = $2, public_note = $3, officer_note = $4,
                banned_at = $5, inactive_at = $6, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(member.id.into_inner())
        .bind(&member.username)
        .bind(&member.public_note)
        .bind(&member.officer_note)
        .bind(member.banned_at)
        .bind(member.inactive_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MemberNotFound(member.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn current_roles(&self, member_id: RecordId) -> RepoResult<Vec<Role>> {
        let results = sqlx::query_as::<_, RoleModel>(
            r"
            SELECT r.id, r.guild_id, r.discord_id, r.name, r.color, r.position,
                   r.discord_permissions, r.created_at, r.updated_at
            FROM member_roles mr
            JOIN roles r ON r.id = mr.role_id
            WHERE mr.member_id = $1
            ORDER BY r.position DESC, r.id
            ",
        )
        .bind(member_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Role::from).collect())
    }

    #[instrument(skip(self))]
    async fn attach_roles(&self, member_id: RecordId, role_ids: &[RecordId]) -> RepoResult<u64> {
        if role_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r"
            INSERT INTO member_roles (member_id, role_id, created_at)
            SELECT $1, role_id, NOW() FROM UNNEST($2::BIGINT[]) AS t(role_id)
            ON CONFLICT (member_id, role_id) DO NOTHING
            ",
        )
        .bind(member_id.into_inner())
        .bind(to_i64s(role_ids))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn detach_roles(
        &self,
        member_id: RecordId,
        role_ids: Option<&[RecordId]>,
    ) -> RepoResult<u64> {
        let result = match role_ids {
            Some([]) => return Ok(0),
            Some(ids) => {
                sqlx::query(
                    r"
                    DELETE FROM member_roles WHERE member_id = $1 AND role_id = ANY($2)
                    ",
                )
                .bind(member_id.into_inner())
                .bind(to_i64s(ids))
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r"
                    DELETE FROM member_roles WHERE member_id = $1
                    ",
                )
                .bind(member_id.into_inner())
                .execute(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

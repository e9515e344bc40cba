//! Member service
//!
//! Member creation with initial roles, and the lifecycle fields (ban, quit,
//! notes) that live on the member record.

use tracing::{info, instrument};

use loot_core::entities::Member;
use loot_core::reconcile::RoleTarget;
use loot_core::value_objects::{RecordId, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::reconciler::{ReconcileReport, RoleReconciler};

const MAX_USERNAME_LEN: usize = 32;
const MAX_NOTE_LEN: usize = 2000;

/// A freshly created member and how its initial roles were applied
#[derive(Debug, Clone)]
pub struct CreatedMember {
    pub member: Member,
    pub roles: ReconcileReport,
}

/// Member service
pub struct MemberService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberService<'a> {
    /// Create a new MemberService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Add a user to a guild's roster and apply their initial roles
    ///
    /// Initial roles go through the reconciler like any later sync, so unknown
    /// Discord roles trigger a catalog refresh and unresolvable ones become
    /// anomalies.
    #[instrument(skip(self, initial_roles))]
    pub async fn create_member(
        &self,
        guild_id: RecordId,
        user_id: RecordId,
        username: &str,
        discord_user_id: Option<Snowflake>,
        initial_roles: RoleTarget,
    ) -> ServiceResult<CreatedMember> {
        let username = validate_username(username)?;
        let guild = self.ctx.require_guild(guild_id).await?;

        if self
            .ctx
            .member_repo()
            .find_by_user(guild_id, user_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::conflict(format!(
                "User {user_id} is already a member of guild {guild_id}"
            )));
        }

        let mut member = Member::new(RecordId::new(0), guild.id, user_id, username);
        if let Some(discord_user_id) = discord_user_id {
            member = member.with_discord_user(discord_user_id);
        }
        member.id = self.ctx.member_repo().create(&member).await?;

        info!(member_id = %member.id, guild_id = %guild_id, user_id = %user_id, "Member created");

        let catalog = self.ctx.load_catalog(&guild).await?;
        let roles = RoleReconciler::new(self.ctx)
            .reconcile(&member, &guild, &catalog, initial_roles)
            .await?;

        member.role_ids = self
            .ctx
            .member_repo()
            .current_roles(member.id)
            .await?
            .into_iter()
            .map(|role| role.id)
            .collect();

        Ok(CreatedMember { member, roles })
    }

    /// Get member by ID
    #[instrument(skip(self))]
    pub async fn get_member(&self, member_id: RecordId) -> ServiceResult<Member> {
        self.ctx
            .member_repo()
            .find(member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member", member_id.to_string()))
    }

    /// Ban a member
    #[instrument(skip(self))]
    pub async fn ban(&self, member_id: RecordId) -> ServiceResult<Member> {
        let member = self.update_with(member_id, Member::ban).await?;
        info!(member_id = %member_id, "Member banned");
        Ok(member)
    }

    /// Lift a ban
    #[instrument(skip(self))]
    pub async fn unban(&self, member_id: RecordId) -> ServiceResult<Member> {
        let member = self.update_with(member_id, Member::unban).await?;
        info!(member_id = %member_id, "Member unbanned");
        Ok(member)
    }

    /// Mark a member as having left the guild
    #[instrument(skip(self))]
    pub async fn quit(&self, member_id: RecordId) -> ServiceResult<Member> {
        let member = self.update_with(member_id, Member::quit).await?;
        info!(member_id = %member_id, "Member quit");
        Ok(member)
    }

    /// Bring back a member who quit
    #[instrument(skip(self))]
    pub async fn rejoin(&self, member_id: RecordId) -> ServiceResult<Member> {
        self.update_with(member_id, Member::rejoin).await
    }

    /// Replace a member's public and officer notes
    #[instrument(skip(self, public_note, officer_note))]
    pub async fn set_notes(
        &self,
        member_id: RecordId,
        public_note: Option<String>,
        officer_note: Option<String>,
    ) -> ServiceResult<Member> {
        let public_note = normalize_note(public_note)?;
        let officer_note = normalize_note(officer_note)?;
        self.update_with(member_id, move |member| {
            member.set_notes(public_note, officer_note);
        })
        .await
    }

    async fn update_with<F>(&self, member_id: RecordId, change: F) -> ServiceResult<Member>
    where
        F: FnOnce(&mut Member),
    {
        let mut member = self.get_member(member_id).await?;
        change(&mut member);
        self.ctx.member_repo().update(&member).await?;
        Ok(member)
    }
}

fn validate_username(username: &str) -> ServiceResult<String> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(ServiceError::validation(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username.to_string())
}

/// Blank notes are stored as no note
fn normalize_note(note: Option<String>) -> ServiceResult<Option<String>> {
    let Some(note) = note else {
        return Ok(None);
    };
    let trimmed = note.trim();
    if trimmed.chars().count() > MAX_NOTE_LEN {
        return Err(ServiceError::validation(format!(
            "Notes must be at most {MAX_NOTE_LEN} characters"
        )));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

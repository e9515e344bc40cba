//! Member sync service
//!
//! Looks members up on Discord and hands the reported roles to the
//! [`RoleReconciler`]. Failing to read membership from Discord aborts the
//! operation: without a target there is nothing safe to reconcile towards.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use loot_core::entities::{DiscordMember, Guild, Member};
use loot_core::reconcile::RoleTarget;
use loot_core::value_objects::{RecordId, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::reconciler::{Anomaly, ReconcileReport, RoleReconciler};

/// Aggregate result of syncing every member of a guild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildSyncSummary {
    /// Members Discord reported for the guild
    pub discord_members: usize,
    /// Local members that went through reconciliation
    pub reconciled: usize,
    /// Local members without a linked Discord account
    pub skipped: usize,
    pub attached: usize,
    pub detached: usize,
    pub anomalies: Vec<Anomaly>,
    /// Number of catalog refreshes performed
    pub refreshes: usize,
}

impl GuildSyncSummary {
    fn record(&mut self, report: &ReconcileReport) {
        self.reconciled += 1;
        self.attached += report.attached.len();
        self.detached += report.detached.len();
        self.anomalies.extend(report.anomalies.iter().cloned());
        if report.was_refreshed() {
            self.refreshes += 1;
        }
    }
}

/// Member sync service
pub struct MemberSyncService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberSyncService<'a> {
    /// Create a new MemberSyncService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Sync one member's roles with Discord
    ///
    /// Members without a linked Discord account are left untouched. A member
    /// who is no longer in the Discord guild loses every role.
    #[instrument(skip(self))]
    pub async fn sync_member(
        &self,
        guild_id: RecordId,
        member_id: RecordId,
    ) -> ServiceResult<ReconcileReport> {
        let guild = self.ctx.require_guild(guild_id).await?;
        let member = self.require_member(&guild, member_id).await?;

        let target = match member.discord_user_id {
            Some(discord_user_id) => {
                let found = self
                    .ctx
                    .discord()
                    .fetch_member(guild.discord_id, discord_user_id)
                    .await?;
                target_for(found.as_ref())
            }
            None => {
                debug!("Member has no Discord account linked");
                RoleTarget::NoChange
            }
        };

        let catalog = self.ctx.load_catalog(&guild).await?;
        RoleReconciler::new(self.ctx)
            .reconcile(&member, &guild, &catalog, target)
            .await
    }

    /// Sync every linked member of the guild with Discord
    ///
    /// The guild's Discord member list is read in full before any local change
    /// is made. Local members missing from it lose every role.
    #[instrument(skip(self))]
    pub async fn sync_guild(&self, guild_id: RecordId) -> ServiceResult<GuildSyncSummary> {
        let guild = self.ctx.require_guild(guild_id).await?;
        let discord_members = self.fetch_all_members(&guild).await?;
        let local_members = self.ctx.member_repo().find_by_guild(guild.id).await?;

        let mut summary = GuildSyncSummary {
            discord_members: discord_members.len(),
            ..GuildSyncSummary::default()
        };

        let reconciler = RoleReconciler::new(self.ctx);
        let mut catalog = self.ctx.load_catalog(&guild).await?;

        for member in &local_members {
            let Some(discord_user_id) = member.discord_user_id else {
                summary.skipped += 1;
                continue;
            };

            let target = target_for(discord_members.get(&discord_user_id));
            let report = reconciler
                .reconcile(member, &guild, &catalog, target)
                .await?;
            summary.record(&report);

            // Later members resolve against the freshest snapshot
            if let Some(fresh) = report.refreshed {
                catalog = fresh;
            }
        }

        info!(
            discord_members = summary.discord_members,
            reconciled = summary.reconciled,
            skipped = summary.skipped,
            attached = summary.attached,
            detached = summary.detached,
            anomalies = summary.anomalies.len(),
            "Guild roles synced"
        );

        Ok(summary)
    }

    async fn require_member(&self, guild: &Guild, member_id: RecordId) -> ServiceResult<Member> {
        self.ctx
            .member_repo()
            .find(member_id)
            .await?
            .filter(|member| member.guild_id == guild.id)
            .ok_or_else(|| ServiceError::not_found("Member", member_id.to_string()))
    }

    /// Page through the Discord member list, keyed by user ID
    async fn fetch_all_members(
        &self,
        guild: &Guild,
    ) -> ServiceResult<HashMap<Snowflake, DiscordMember>> {
        let page_size = self.ctx.sync_config().member_page_size.clamp(1, 1000);
        let mut members = HashMap::new();
        let mut after = None;

        loop {
            let page = self
                .ctx
                .discord()
                .list_members(guild.discord_id, page_size, after)
                .await?;
            let full_page = page.len() >= usize::from(page_size);

            let last = page.iter().map(|m| m.user_id).max();
            members.extend(page.into_iter().map(|m| (m.user_id, m)));

            match last {
                Some(last) if full_page && after.is_none_or(|prev| last > prev) => {
                    after = Some(last);
                }
                _ => break,
            }
        }

        debug!(count = members.len(), "Fetched Discord guild members");
        Ok(members)
    }
}

/// Membership data to reconciliation target; absent membership drops all roles
fn target_for(member: Option<&DiscordMember>) -> RoleTarget {
    match member {
        Some(member) => RoleTarget::set(member.role_ids.iter().copied()),
        None => RoleTarget::DetachAll,
    }
}

//! Role reconciliation
//!
//! Brings a member's stored role associations into agreement with the role
//! set Discord reports for them. Detach and attach are separate committed
//! phases; both are idempotent, so a failed run can simply be repeated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info, instrument, warn};

use loot_core::entities::{Guild, Member, RoleCatalog};
use loot_core::reconcile::{RoleDiff, RoleTarget};
use loot_core::traits::RefreshOutcome;
use loot_core::value_objects::{RecordId, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Why a Discord role could not be attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedCause {
    /// Discord answered the refresh but does not list the role
    MissingUpstream,
    /// The refresh itself failed or timed out; the role may well exist
    RefreshFailed { reason: String },
}

impl fmt::Display for UnresolvedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUpstream => f.write_str("missing_upstream"),
            Self::RefreshFailed { reason } => write!(f, "refresh_failed: {reason}"),
        }
    }
}

/// A Discord role that was skipped during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub member_id: RecordId,
    pub guild_id: RecordId,
    pub guild_discord_id: Snowflake,
    pub discord_role_id: Snowflake,
    pub cause: UnresolvedCause,
}

impl Anomaly {
    /// Transient anomalies are expected to clear on the next sync
    pub fn is_transient(&self) -> bool {
        matches!(self.cause, UnresolvedCause::RefreshFailed { .. })
    }
}

/// What one reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Discord role IDs newly attached
    pub attached: BTreeSet<Snowflake>,
    /// Discord role IDs removed
    pub detached: BTreeSet<Snowflake>,
    /// Target roles that could not be resolved, one entry per role
    pub anomalies: Vec<Anomaly>,
    /// Catalog produced by a successful refresh during this run
    pub refreshed: Option<RoleCatalog>,
}

impl ReconcileReport {
    /// Nothing was attached or detached
    pub fn is_noop(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }

    pub fn was_refreshed(&self) -> bool {
        self.refreshed.is_some()
    }
}

/// Applies an authoritative [`RoleTarget`] to one member
pub struct RoleReconciler<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoleReconciler<'a> {
    /// Create a new RoleReconciler
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Reconcile `member`'s roles against `target`
    ///
    /// `catalog` is the caller's snapshot of the guild's known roles. If any
    /// target role is missing from it, the guild catalog is refreshed exactly
    /// once and the new snapshot is returned in the report.
    ///
    /// Unresolvable roles never fail the call; they are reported as anomalies.
    /// Repository failures are returned as errors.
    #[instrument(skip(self, member, guild, catalog), fields(member_id = %member.id, guild_id = %guild.id))]
    pub async fn reconcile(
        &self,
        member: &Member,
        guild: &Guild,
        catalog: &RoleCatalog,
        target: RoleTarget,
    ) -> ServiceResult<ReconcileReport> {
        if member.guild_id != guild.id || catalog.guild_id() != guild.id {
            return Err(ServiceError::validation(format!(
                "member {} and catalog of guild {} do not belong to guild {}",
                member.id,
                catalog.guild_id(),
                guild.id
            )));
        }

        let target = match target {
            RoleTarget::NoChange => {
                debug!("No role data, leaving member untouched");
                return Ok(ReconcileReport::default());
            }
            RoleTarget::TargetSet(ids) => Some(ids),
            RoleTarget::DetachAll => None,
        };

        let _guard = self.ctx.member_locks().acquire(member.id).await;

        let current: BTreeMap<Snowflake, RecordId> = self
            .ctx
            .member_repo()
            .current_roles(member.id)
            .await?
            .into_iter()
            .map(|role| (role.discord_id, role.id))
            .collect();

        let report = match target {
            Some(target) => self.apply_target(member, guild, catalog, &current, &target).await?,
            None => self.detach_all(member, &current).await?,
        };

        info!(
            attached = report.attached.len(),
            detached = report.detached.len(),
            anomalies = report.anomalies.len(),
            refreshed = report.was_refreshed(),
            "Member roles reconciled"
        );

        Ok(report)
    }

    async fn detach_all(
        &self,
        member: &Member,
        current: &BTreeMap<Snowflake, RecordId>,
    ) -> ServiceResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        if current.is_empty() {
            return Ok(report);
        }

        self.ctx.member_repo().detach_roles(member.id, None).await?;
        report.detached = current.keys().copied().collect();
        Ok(report)
    }

    async fn apply_target(
        &self,
        member: &Member,
        guild: &Guild,
        catalog: &RoleCatalog,
        current: &BTreeMap<Snowflake, RecordId>,
        target: &BTreeSet<Snowflake>,
    ) -> ServiceResult<ReconcileReport> {
        let current_ids: BTreeSet<Snowflake> = current.keys().copied().collect();
        let diff = RoleDiff::compute(&current_ids, target);
        debug!(
            to_attach = diff.to_attach.len(),
            to_detach = diff.to_detach.len(),
            "Computed role diff"
        );

        let mut report = ReconcileReport::default();

        // Phase 1: detach
        if !diff.to_detach.is_empty() {
            let local: Vec<RecordId> = diff
                .to_detach
                .iter()
                .filter_map(|discord_id| current.get(discord_id).copied())
                .collect();
            self.ctx
                .member_repo()
                .detach_roles(member.id, Some(&local))
                .await?;
            report.detached = diff.to_detach.clone();
        }

        // Phase 2: attach
        if diff.to_attach.is_empty() {
            return Ok(report);
        }

        let (mut resolved, unresolved) = catalog.partition(&diff.to_attach);
        let mut skipped: Vec<(Snowflake, UnresolvedCause)> = Vec::new();

        if !unresolved.is_empty() {
            debug!(unresolved = unresolved.len(), "Refreshing role catalog");
            match self.ctx.refresher().refresh(guild).await? {
                RefreshOutcome::Refreshed(fresh) => {
                    let (found, missing) = fresh.partition(&unresolved);
                    resolved.extend(found);
                    skipped.extend(
                        missing
                            .into_iter()
                            .map(|id| (id, UnresolvedCause::MissingUpstream)),
                    );
                    report.refreshed = Some(fresh);
                }
                RefreshOutcome::Failed { reason } => {
                    skipped.extend(unresolved.into_iter().map(|id| {
                        (
                            id,
                            UnresolvedCause::RefreshFailed {
                                reason: reason.clone(),
                            },
                        )
                    }));
                }
            }
        }

        if !resolved.is_empty() {
            self.ctx
                .member_repo()
                .attach_roles(member.id, &resolved)
                .await?;
        }

        let skipped_ids: BTreeSet<Snowflake> = skipped.iter().map(|(id, _)| *id).collect();
        report.attached = diff.to_attach.difference(&skipped_ids).copied().collect();

        for (discord_role_id, cause) in skipped {
            warn!(
                guild_id = %guild.id,
                guild_discord_id = %guild.discord_id,
                discord_role_id = %discord_role_id,
                member_id = %member.id,
                cause = %cause,
                "Discord role could not be resolved locally, skipping"
            );
            report.anomalies.push(Anomaly {
                member_id: member.id,
                guild_id: guild.id,
                guild_discord_id: guild.discord_id,
                discord_role_id,
                cause,
            });
        }

        Ok(report)
    }
}

//! Test fixtures and in-memory collaborators
//!
//! [`InMemoryStore`] implements every repository trait over plain collections
//! and counts the association writes the reconciler issues. [`FakeDiscord`]
//! plays Discord, [`CountingRefresher`] counts catalog refreshes.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use loot_common::SyncConfig;
use loot_core::entities::{DiscordMember, DiscordRole, Guild, Member, Role};
use loot_core::error::DomainError;
use loot_core::reconcile::RoleTarget;
use loot_core::traits::{
    DiscordRoleSource, GuildRepository, MemberRepository, RefreshOutcome, RepoResult,
    RoleCatalogRefresher, RoleRepository,
};
use loot_core::value_objects::{RecordId, Snowflake};
use loot_service::{DiscordCatalogRefresher, ServiceContext, ServiceContextBuilder};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Shorthand for building Discord ID sets
pub fn snowflakes(ids: &[i64]) -> BTreeSet<Snowflake> {
    ids.iter().copied().map(Snowflake::new).collect()
}

/// A role definition as Discord would report it
pub fn discord_role(id: i64) -> DiscordRole {
    DiscordRole {
        id: Snowflake::new(id),
        name: format!("Role {id}"),
        color: 0x00AA_FF00,
        position: (id % 100) as i32,
        permissions: Some("0".to_string()),
        managed: false,
    }
}

/// A guild member as Discord would report it
pub fn discord_member(user_id: Snowflake, roles: &[i64]) -> DiscordMember {
    DiscordMember {
        user_id,
        username: format!("user{user_id}"),
        nickname: None,
        role_ids: roles.iter().copied().map(Snowflake::new).collect(),
    }
}

// ============================================================================
// In-memory repositories
// ============================================================================

#[derive(Default)]
struct State {
    guilds: Vec<Guild>,
    roles: Vec<Role>,
    members: Vec<Member>,
    /// (member_id, role_id)
    member_roles: BTreeSet<(RecordId, RecordId)>,
}

/// In-memory storage implementing the guild, role and member repositories
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    next_id: AtomicI64,
    pub attach_calls: AtomicUsize,
    pub detach_calls: AtomicUsize,
    pub upsert_calls: AtomicUsize,
    /// Make the next attach fail with a database error
    pub fail_attach: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_id(&self) -> RecordId {
        RecordId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Store a role locally, as if a previous refresh had seen it
    pub fn seed_role(&self, guild_id: RecordId, discord_id: i64) -> Role {
        let role = Role::from_discord(self.next_id(), guild_id, &discord_role(discord_id));
        self.state.lock().unwrap().roles.push(role.clone());
        role
    }

    /// Attach roles directly, bypassing the reconciler
    pub fn seed_member_roles(&self, member_id: RecordId, role_ids: &[RecordId]) {
        let mut state = self.state.lock().unwrap();
        for role_id in role_ids {
            state.member_roles.insert((member_id, *role_id));
        }
    }

    /// Discord IDs of the roles currently attached to a member
    pub fn member_discord_roles(&self, member_id: RecordId) -> BTreeSet<Snowflake> {
        let state = self.state.lock().unwrap();
        state
            .member_roles
            .iter()
            .filter(|(m, _)| *m == member_id)
            .filter_map(|(_, r)| state.roles.iter().find(|role| role.id == *r))
            .map(|role| role.discord_id)
            .collect()
    }

    pub fn role_count(&self, guild_id: RecordId) -> usize {
        let state = self.state.lock().unwrap();
        state.roles.iter().filter(|r| r.guild_id == guild_id).count()
    }

    pub fn writes(&self) -> (usize, usize) {
        (
            self.attach_calls.load(Ordering::SeqCst),
            self.detach_calls.load(Ordering::SeqCst),
        )
    }

    pub fn reset_counters(&self) {
        self.attach_calls.store(0, Ordering::SeqCst);
        self.detach_calls.store(0, Ordering::SeqCst);
        self.upsert_calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl GuildRepository for InMemoryStore {
    async fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Guild>> {
        let state = self.state.lock().unwrap();
        Ok(state.guilds.iter().find(|g| g.id == id).cloned())
    }

    async fn find_by_discord_id(&self, discord_id: Snowflake) -> RepoResult<Option<Guild>> {
        let state = self.state.lock().unwrap();
        Ok(state.guilds.iter().find(|g| g.discord_id == discord_id).cloned())
    }

    async fn create(&self, discord_id: Snowflake, name: &str) -> RepoResult<Guild> {
        let id = self.next_id();
        let mut state = self.state.lock().unwrap();
        if state.guilds.iter().any(|g| g.discord_id == discord_id) {
            return Err(DomainError::GuildAlreadyExists(discord_id));
        }
        let guild = Guild::new(id, discord_id, name.to_string());
        state.guilds.push(guild.clone());
        Ok(guild)
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Role>> {
        let state = self.state.lock().unwrap();
        Ok(state.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_guild(&self, guild_id: RecordId) -> RepoResult<Vec<Role>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .roles
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn upsert_from_discord(
        &self,
        guild_id: RecordId,
        roles: &[DiscordRole],
    ) -> RepoResult<u64> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut written = 0;
        for source in roles {
            let fresh_id = self.next_id();
            let mut state = self.state.lock().unwrap();
            if let Some(role) = state
                .roles
                .iter_mut()
                .find(|r| r.guild_id == guild_id && r.discord_id == source.id)
            {
                role.apply_discord(source);
            } else {
                state
                    .roles
                    .push(Role::from_discord(fresh_id, guild_id, source));
            }
            written += 1;
        }
        Ok(written)
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find(&self, id: RecordId) -> RepoResult<Option<Member>> {
        let state = self.state.lock().unwrap();
        Ok(state.members.iter().find(|m| m.id == id).map(|m| {
            let mut member = m.clone();
            member.role_ids = state
                .member_roles
                .iter()
                .filter(|(mid, _)| *mid == id)
                .map(|(_, rid)| *rid)
                .collect();
            member
        }))
    }

    async fn find_by_user(
        &self,
        guild_id: RecordId,
        user_id: RecordId,
    ) -> RepoResult<Option<Member>> {
        let id = {
            let state = self.state.lock().unwrap();
            state
                .members
                .iter()
                .find(|m| m.guild_id == guild_id && m.user_id == user_id)
                .map(|m| m.id)
        };
        match id {
            Some(id) => self.find(id).await,
            None => Ok(None),
        }
    }

    async fn find_by_guild(&self, guild_id: RecordId) -> RepoResult<Vec<Member>> {
        let ids: Vec<RecordId> = {
            let state = self.state.lock().unwrap();
            state
                .members
                .iter()
                .filter(|m| m.guild_id == guild_id)
                .map(|m| m.id)
                .collect()
        };
        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(member) = self.find(id).await? {
                members.push(member);
            }
        }
        Ok(members)
    }

    async fn create(&self, member: &Member) -> RepoResult<RecordId> {
        let id = self.next_id();
        let mut state = self.state.lock().unwrap();
        if state
            .members
            .iter()
            .any(|m| m.guild_id == member.guild_id && m.user_id == member.user_id)
        {
            return Err(DomainError::AlreadyMember {
                guild_id: member.guild_id,
                user_id: member.user_id,
            });
        }
        let mut stored = member.clone();
        stored.id = id;
        stored.role_ids.clear();
        state.members.push(stored);
        Ok(id)
    }

    async fn update(&self, member: &Member) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .members
            .iter_mut()
            .find(|m| m.id == member.id)
            .ok_or(DomainError::MemberNotFound(member.id))?;
        stored.username.clone_from(&member.username);
        stored.public_note.clone_from(&member.public_note);
        stored.officer_note.clone_from(&member.officer_note);
        stored.banned_at = member.banned_at;
        stored.inactive_at = member.inactive_at;
        stored.updated_at = member.updated_at;
        Ok(())
    }

    async fn current_roles(&self, member_id: RecordId) -> RepoResult<Vec<Role>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .member_roles
            .iter()
            .filter(|(m, _)| *m == member_id)
            .filter_map(|(_, r)| state.roles.iter().find(|role| role.id == *r).cloned())
            .collect())
    }

    async fn attach_roles(&self, member_id: RecordId, role_ids: &[RecordId]) -> RepoResult<u64> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_attach.swap(false, Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("connection reset".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let mut inserted = 0;
        for role_id in role_ids {
            if state.member_roles.insert((member_id, *role_id)) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn detach_roles(
        &self,
        member_id: RecordId,
        role_ids: Option<&[RecordId]>,
    ) -> RepoResult<u64> {
        self.detach_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let before = state.member_roles.len();
        match role_ids {
            Some(ids) => state
                .member_roles
                .retain(|(m, r)| *m != member_id || !ids.contains(r)),
            None => state.member_roles.retain(|(m, _)| *m != member_id),
        }
        Ok((before - state.member_roles.len()) as u64)
    }
}

// ============================================================================
// Discord
// ============================================================================

/// Scriptable stand-in for the Discord REST API
#[derive(Default)]
pub struct FakeDiscord {
    roles: Mutex<HashMap<Snowflake, Vec<DiscordRole>>>,
    members: Mutex<HashMap<Snowflake, Vec<DiscordMember>>>,
    /// Every call fails with a 503 while set
    pub unavailable: AtomicBool,
    /// Delay applied to role fetches, in milliseconds
    pub role_delay_ms: AtomicU64,
    pub role_fetches: AtomicUsize,
    pub member_page_fetches: AtomicUsize,
}

impl FakeDiscord {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_roles(&self, guild_id: Snowflake, ids: &[i64]) {
        let roles = ids.iter().copied().map(discord_role).collect();
        self.roles.lock().unwrap().insert(guild_id, roles);
    }

    pub fn add_member(&self, guild_id: Snowflake, member: DiscordMember) {
        let mut members = self.members.lock().unwrap();
        let list = members.entry(guild_id).or_default();
        list.retain(|m| m.user_id != member.user_id);
        list.push(member);
    }

    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) {
        if let Some(list) = self.members.lock().unwrap().get_mut(&guild_id) {
            list.retain(|m| m.user_id != user_id);
        }
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::DiscordApi {
                status: Some(503),
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DiscordRoleSource for FakeDiscord {
    async fn fetch_guild_roles(&self, guild_id: Snowflake) -> RepoResult<Vec<DiscordRole>> {
        self.role_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = self.role_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check_available()?;
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<DiscordMember>> {
        self.check_available()?;
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&guild_id)
            .and_then(|list| list.iter().find(|m| m.user_id == user_id).cloned()))
    }

    async fn list_members(
        &self,
        guild_id: Snowflake,
        limit: u16,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<DiscordMember>> {
        self.member_page_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut list = self
            .members
            .lock()
            .unwrap()
            .get(&guild_id)
            .cloned()
            .unwrap_or_default();
        list.sort_by_key(|m| m.user_id);
        Ok(list
            .into_iter()
            .filter(|m| after.is_none_or(|after| m.user_id > after))
            .take(usize::from(limit))
            .collect())
    }
}

/// Wraps a refresher and counts how often it is invoked
pub struct CountingRefresher {
    inner: Arc<dyn RoleCatalogRefresher>,
    calls: AtomicUsize,
}

impl CountingRefresher {
    pub fn new(inner: Arc<dyn RoleCatalogRefresher>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleCatalogRefresher for CountingRefresher {
    async fn refresh(&self, guild: &Guild) -> RepoResult<RefreshOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.refresh(guild).await
    }
}

// ============================================================================
// Assembled harness
// ============================================================================

/// Refresh timeout used by the harness
pub const TEST_REFRESH_TIMEOUT: Duration = Duration::from_millis(200);

/// A service context wired to in-memory collaborators, with one guild
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub discord: Arc<FakeDiscord>,
    pub refresher: Arc<CountingRefresher>,
    pub ctx: ServiceContext,
    pub guild: Guild,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_sync_config(SyncConfig {
            refresh_timeout_secs: 1,
            member_page_size: 1000,
        })
        .await
    }

    pub async fn with_sync_config(sync_config: SyncConfig) -> Self {
        let store = InMemoryStore::new();
        let discord = FakeDiscord::new();
        let refresher = CountingRefresher::new(Arc::new(DiscordCatalogRefresher::new(
            discord.clone(),
            store.clone(),
            TEST_REFRESH_TIMEOUT,
        )));

        let ctx = ServiceContextBuilder::new()
            .guild_repo(store.clone())
            .role_repo(store.clone())
            .member_repo(store.clone())
            .discord(discord.clone())
            .refresher(refresher.clone())
            .sync_config(sync_config)
            .build()
            .expect("all dependencies provided");

        let suffix = unique_suffix() as i64;
        let guild = GuildRepository::create(
            store.as_ref(),
            Snowflake::new(900_000 + suffix),
            &format!("Raid Team {suffix}"),
        )
        .await
        .expect("guild created");

        Self {
            store,
            discord,
            refresher,
            ctx,
            guild,
        }
    }

    /// Roles the guild already knows locally
    pub fn seed_roles(&self, discord_ids: &[i64]) -> Vec<Role> {
        discord_ids
            .iter()
            .map(|id| self.store.seed_role(self.guild.id, *id))
            .collect()
    }

    /// Roles Discord reports for the guild on refresh
    pub fn discord_roles(&self, discord_ids: &[i64]) {
        self.discord.set_roles(self.guild.discord_id, discord_ids);
    }

    /// A linked member holding `current` (which must be seeded roles)
    pub async fn member_with_roles(&self, current: &[i64]) -> Member {
        let suffix = unique_suffix() as i64;
        let member = Member::new(
            RecordId::new(0),
            self.guild.id,
            RecordId::new(10_000 + suffix),
            format!("raider{suffix}"),
        )
        .with_discord_user(Snowflake::new(500_000 + suffix));

        let id = MemberRepository::create(self.store.as_ref(), &member)
            .await
            .expect("member created");

        let catalog = self.catalog().await;
        let role_ids: Vec<RecordId> = current
            .iter()
            .map(|d| {
                catalog
                    .resolve(Snowflake::new(*d))
                    .map(|role| role.id)
                    .expect("current roles must be seeded first")
            })
            .collect();
        self.store.seed_member_roles(id, &role_ids);

        MemberRepository::find(self.store.as_ref(), id)
            .await
            .unwrap()
            .expect("member exists")
    }

    pub async fn catalog(&self) -> loot_core::entities::RoleCatalog {
        self.ctx.load_catalog(&self.guild).await.expect("catalog loads")
    }

    pub fn roles_of(&self, member: &Member) -> BTreeSet<Snowflake> {
        self.store.member_discord_roles(member.id)
    }

    /// Reconcile against the current local catalog
    pub async fn reconcile(
        &self,
        member: &Member,
        target: RoleTarget,
    ) -> loot_service::ServiceResult<loot_service::ReconcileReport> {
        let catalog = self.catalog().await;
        loot_service::RoleReconciler::new(&self.ctx)
            .reconcile(member, &self.guild, &catalog, target)
            .await
    }
}

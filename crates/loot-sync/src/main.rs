//! Guild role sync entry point
//!
//! Run with:
//! ```bash
//! cargo run -p loot-sync -- sync-guild --guild 1
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};

use loot_common::{try_init_tracing, AppConfig, TracingConfig};
use loot_core::traits::RefreshOutcome;
use loot_core::{RecordId, Snowflake};
use loot_db::{create_pool, DatabaseConfig, PgGuildRepository, PgMemberRepository, PgRoleRepository};
use loot_discord::DiscordClient;
use loot_service::{
    GuildRoleService, MemberSyncService, ReconcileReport, ServiceContext, ServiceContextBuilder,
};

#[derive(Parser)]
#[command(name = "loot-sync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keep guild roster roles in sync with Discord", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a Discord guild and pull its roles
    RegisterGuild {
        /// Discord guild ID
        #[arg(long)]
        discord_id: Snowflake,

        /// Display name
        #[arg(long)]
        name: String,
    },

    /// Pull a guild's role catalog from Discord
    RefreshRoles {
        /// Local guild ID
        #[arg(long)]
        guild: i64,
    },

    /// Sync one member's roles with Discord
    SyncMember {
        /// Local guild ID
        #[arg(long)]
        guild: i64,

        /// Local member ID
        #[arg(long)]
        member: i64,
    },

    /// Sync every linked member of a guild with Discord
    SyncGuild {
        /// Local guild ID
        #[arg(long)]
        guild: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %format!("{e:#}"), "loot-sync failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let mut tracing_config = TracingConfig::for_environment(config.app.env);
    if cli.verbose {
        tracing_config = tracing_config.with_level(Level::DEBUG);
    }
    if let Err(e) = try_init_tracing(&tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(env = ?config.app.env, app = %config.app.name, "Configuration loaded");

    let ctx = build_context(&config).await?;

    match cli.command {
        Commands::RegisterGuild { discord_id, name } => {
            let service = GuildRoleService::new(&ctx);
            let guild = service.register_guild(discord_id, &name).await?;
            println!("Registered guild {} as {}", guild.discord_id, guild.id);
            report_refresh(&service.refresh_roles(guild.id).await?);
        }
        Commands::RefreshRoles { guild } => {
            let outcome = GuildRoleService::new(&ctx)
                .refresh_roles(RecordId::new(guild))
                .await?;
            report_refresh(&outcome);
        }
        Commands::SyncMember { guild, member } => {
            let report = MemberSyncService::new(&ctx)
                .sync_member(RecordId::new(guild), RecordId::new(member))
                .await?;
            report_member(&report);
        }
        Commands::SyncGuild { guild } => {
            let summary = MemberSyncService::new(&ctx)
                .sync_guild(RecordId::new(guild))
                .await?;
            println!(
                "Discord members: {}, reconciled: {}, skipped: {}, attached: {}, detached: {}, anomalies: {}",
                summary.discord_members,
                summary.reconciled,
                summary.skipped,
                summary.attached,
                summary.detached,
                summary.anomalies.len()
            );
            for anomaly in &summary.anomalies {
                println!(
                    "  member {} role {}: {}",
                    anomaly.member_id, anomaly.discord_role_id, anomaly.cause
                );
            }
        }
    }

    Ok(())
}

async fn build_context(config: &AppConfig) -> Result<ServiceContext> {
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .context("Failed to connect to PostgreSQL")?;
    let discord = DiscordClient::new(&config.discord).context("Failed to build Discord client")?;

    let ctx = ServiceContextBuilder::new()
        .guild_repo(Arc::new(PgGuildRepository::new(pool.clone())))
        .role_repo(Arc::new(PgRoleRepository::new(pool.clone())))
        .member_repo(Arc::new(PgMemberRepository::new(pool)))
        .discord(Arc::new(discord))
        .sync_config(config.sync.clone())
        .build()?;

    Ok(ctx)
}

fn report_refresh(outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Refreshed(catalog) => println!("Role catalog refreshed: {} roles", catalog.len()),
        RefreshOutcome::Failed { reason } => {
            warn!(%reason, "Role catalog refresh failed");
            println!("Role catalog refresh failed: {reason}");
        }
    }
}

fn report_member(report: &ReconcileReport) {
    if report.is_noop() && report.anomalies.is_empty() {
        println!("Roles already in sync");
        return;
    }
    println!(
        "Attached: {}, detached: {}, anomalies: {}",
        report.attached.len(),
        report.detached.len(),
        report.anomalies.len()
    );
    for anomaly in &report.anomalies {
        println!("  role {}: {}", anomaly.discord_role_id, anomaly.cause);
    }
}

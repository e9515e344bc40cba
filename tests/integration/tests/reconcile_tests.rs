//! Role reconciliation against in-memory storage
//!
//! Run with:
//! ```bash
//! cargo test -p integration-tests --test reconcile_tests
//! ```

use std::sync::atomic::Ordering;

use integration_tests::{snowflakes, Harness, TEST_REFRESH_TIMEOUT};
use loot_core::reconcile::RoleTarget;
use loot_core::value_objects::Snowflake;
use loot_service::{RoleReconciler, ServiceError, UnresolvedCause};

// ============================================================================
// Final state
// ============================================================================

#[tokio::test]
async fn test_final_state_is_target_intersected_with_resolvable() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2, 3]);
    h.discord_roles(&[1, 2, 3, 4]);
    let member = h.member_with_roles(&[1, 2]).await;

    let report = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[2, 3, 4, 5])))
        .await
        .unwrap();

    // 4 is gained through the refresh, 5 exists nowhere
    assert_eq!(h.roles_of(&member), snowflakes(&[2, 3, 4]));
    assert_eq!(report.attached, snowflakes(&[3, 4]));
    assert_eq!(report.detached, snowflakes(&[1]));
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].discord_role_id, Snowflake::new(5));
}

#[tokio::test]
async fn test_attach_and_detach_are_single_batches() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2, 3, 4, 5, 6]);
    let member = h.member_with_roles(&[1, 2, 3]).await;

    h.reconcile(&member, RoleTarget::set(snowflakes(&[4, 5, 6])))
        .await
        .unwrap();

    assert_eq!(h.roles_of(&member), snowflakes(&[4, 5, 6]));
    assert_eq!(h.store.writes(), (1, 1));
    assert_eq!(h.refresher.calls(), 0);
}

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn test_second_reconcile_issues_no_writes() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2, 3]);
    h.discord_roles(&[1, 2, 3, 4]);
    let member = h.member_with_roles(&[1]).await;
    let target = RoleTarget::set(snowflakes(&[2, 3, 4]));

    h.reconcile(&member, target.clone()).await.unwrap();
    let after_first = h.roles_of(&member);
    h.store.reset_counters();

    let report = h.reconcile(&member, target).await.unwrap();

    assert_eq!(h.roles_of(&member), after_first);
    assert_eq!(h.store.writes(), (0, 0));
    assert!(report.is_noop());
    assert!(report.anomalies.is_empty());
}

#[tokio::test]
async fn test_repeat_with_unresolvable_role_still_writes_nothing() {
    let h = Harness::new().await;
    h.seed_roles(&[1]);
    h.discord_roles(&[1]);
    let member = h.member_with_roles(&[1]).await;
    let target = RoleTarget::set(snowflakes(&[1, 99]));

    h.reconcile(&member, target.clone()).await.unwrap();
    h.store.reset_counters();
    let report = h.reconcile(&member, target).await.unwrap();

    assert_eq!(h.store.writes(), (0, 0));
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(h.roles_of(&member), snowflakes(&[1]));
}

// ============================================================================
// Detach-only and absent targets
// ============================================================================

#[tokio::test]
async fn test_empty_target_detaches_everything() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2]);
    let member = h.member_with_roles(&[1, 2]).await;

    let report = h.reconcile(&member, RoleTarget::set(snowflakes(&[]))).await.unwrap();

    assert!(h.roles_of(&member).is_empty());
    assert_eq!(report.detached, snowflakes(&[1, 2]));
    assert_eq!(h.store.attach_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_absent_target_detaches_everything() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2]);
    let member = h.member_with_roles(&[1, 2]).await;

    let report = h.reconcile(&member, RoleTarget::from(None::<Vec<Snowflake>>)).await.unwrap();

    assert!(h.roles_of(&member).is_empty());
    assert_eq!(report.detached, snowflakes(&[1, 2]));
    assert_eq!(h.store.writes(), (0, 1));
    assert_eq!(h.refresher.calls(), 0);
}

#[tokio::test]
async fn test_detach_all_without_roles_writes_nothing() {
    let h = Harness::new().await;
    let member = h.member_with_roles(&[]).await;

    let report = h.reconcile(&member, RoleTarget::DetachAll).await.unwrap();

    assert!(report.is_noop());
    assert_eq!(h.store.writes(), (0, 0));
}

#[tokio::test]
async fn test_no_change_leaves_member_untouched() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2]);
    let member = h.member_with_roles(&[1, 2]).await;

    let report = h.reconcile(&member, RoleTarget::NoChange).await.unwrap();

    assert!(report.is_noop());
    assert_eq!(h.roles_of(&member), snowflakes(&[1, 2]));
    assert_eq!(h.store.writes(), (0, 0));
}

// ============================================================================
// Partial resolution and refresh
// ============================================================================

#[tokio::test]
async fn test_role_gained_through_refresh_is_attached() {
    let h = Harness::new().await;
    h.seed_roles(&[10]);
    h.discord_roles(&[10, 11]);
    let member = h.member_with_roles(&[10]).await;

    let report = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[10, 11])))
        .await
        .unwrap();

    assert_eq!(h.roles_of(&member), snowflakes(&[10, 11]));
    assert!(report.anomalies.is_empty());
    assert_eq!(h.refresher.calls(), 1);

    let refreshed = report.refreshed.expect("catalog was refreshed");
    assert!(refreshed.contains(Snowflake::new(11)));
    assert_eq!(h.store.role_count(h.guild.id), 2);
}

#[tokio::test]
async fn test_role_missing_after_refresh_is_one_anomaly() {
    let h = Harness::new().await;
    h.seed_roles(&[10]);
    h.discord_roles(&[10]);
    let member = h.member_with_roles(&[10]).await;

    let report = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[10, 11])))
        .await
        .unwrap();

    assert_eq!(h.roles_of(&member), snowflakes(&[10]));
    assert_eq!(report.anomalies.len(), 1);

    let anomaly = &report.anomalies[0];
    assert_eq!(anomaly.discord_role_id, Snowflake::new(11));
    assert_eq!(anomaly.guild_id, h.guild.id);
    assert_eq!(anomaly.guild_discord_id, h.guild.discord_id);
    assert_eq!(anomaly.member_id, member.id);
    assert_eq!(anomaly.cause, UnresolvedCause::MissingUpstream);
    assert!(!anomaly.is_transient());

    // Nothing was resolved, so no attach call at all
    assert_eq!(h.store.writes(), (0, 0));
}

#[tokio::test]
async fn test_refresh_happens_once_for_many_unresolved_roles() {
    let h = Harness::new().await;
    h.discord_roles(&[20, 21]);
    let member = h.member_with_roles(&[]).await;

    let report = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[20, 21, 22, 23])))
        .await
        .unwrap();

    assert_eq!(h.refresher.calls(), 1);
    assert_eq!(h.discord.role_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.upsert_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.roles_of(&member), snowflakes(&[20, 21]));
    assert_eq!(report.anomalies.len(), 2);
    assert_eq!(h.store.attach_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_no_refresh_when_everything_resolves() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2]);
    let member = h.member_with_roles(&[]).await;

    let report = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[1, 2])))
        .await
        .unwrap();

    assert_eq!(h.refresher.calls(), 0);
    assert!(!report.was_refreshed());
}

// ============================================================================
// Refresh failures
// ============================================================================

#[tokio::test]
async fn test_refresh_failure_is_not_fatal() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2]);
    h.discord.unavailable.store(true, Ordering::SeqCst);
    let member = h.member_with_roles(&[1]).await;

    let report = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[2, 30, 31])))
        .await
        .unwrap();

    // Resolvable roles still go through
    assert_eq!(h.roles_of(&member), snowflakes(&[2]));
    assert_eq!(report.detached, snowflakes(&[1]));
    assert_eq!(report.attached, snowflakes(&[2]));
    assert!(!report.was_refreshed());

    assert_eq!(report.anomalies.len(), 2);
    for anomaly in &report.anomalies {
        assert!(anomaly.is_transient());
        assert!(matches!(
            &anomaly.cause,
            UnresolvedCause::RefreshFailed { reason } if reason.contains("Service Unavailable")
        ));
    }
}

#[tokio::test]
async fn test_refresh_timeout_is_not_fatal() {
    let h = Harness::new().await;
    let slow = TEST_REFRESH_TIMEOUT.as_millis() as u64 * 5;
    h.discord.role_delay_ms.store(slow, Ordering::SeqCst);
    h.discord_roles(&[40]);
    let member = h.member_with_roles(&[]).await;

    let report = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[40])))
        .await
        .unwrap();

    assert!(h.roles_of(&member).is_empty());
    assert_eq!(report.anomalies.len(), 1);
    assert!(matches!(
        &report.anomalies[0].cause,
        UnresolvedCause::RefreshFailed { reason } if reason.contains("timed out")
    ));
    // The timed-out refresh never reached storage
    assert_eq!(h.store.upsert_calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Failure isolation and concurrency
// ============================================================================

#[tokio::test]
async fn test_attach_failure_keeps_committed_detach() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2]);
    let member = h.member_with_roles(&[1]).await;
    h.store.fail_attach.store(true, Ordering::SeqCst);

    let err = h
        .reconcile(&member, RoleTarget::set(snowflakes(&[2])))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));
    assert_eq!(err.error_code(), "DATABASE_ERROR");

    // Detach phase was already committed
    assert!(h.roles_of(&member).is_empty());

    // A retry finishes the job without repeating the detach
    h.store.reset_counters();
    h.reconcile(&member, RoleTarget::set(snowflakes(&[2])))
        .await
        .unwrap();
    assert_eq!(h.roles_of(&member), snowflakes(&[2]));
    assert_eq!(h.store.writes(), (1, 0));
}

#[tokio::test]
async fn test_concurrent_reconciles_of_one_member_converge() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2, 3]);
    let member = h.member_with_roles(&[1]).await;
    let catalog = h.catalog().await;
    let reconciler = RoleReconciler::new(&h.ctx);
    let target = RoleTarget::set(snowflakes(&[2, 3]));

    let runs = (0..4).map(|_| reconciler.reconcile(&member, &h.guild, &catalog, target.clone()));
    let reports = futures::future::join_all(runs).await;

    assert!(reports.iter().all(Result::is_ok));
    assert_eq!(h.roles_of(&member), snowflakes(&[2, 3]));
    // Serialized per member: only the first run had anything to do
    assert_eq!(h.store.writes(), (1, 1));
    assert!(h.ctx.member_locks().is_empty());
}

#[tokio::test]
async fn test_member_locks_are_released_after_reconcile() {
    let h = Harness::new().await;
    h.seed_roles(&[1, 2]);
    let mut members = Vec::new();
    for _ in 0..50 {
        members.push(h.member_with_roles(&[1]).await);
    }
    let catalog = h.catalog().await;
    let reconciler = RoleReconciler::new(&h.ctx);

    let runs = members
        .iter()
        .map(|m| reconciler.reconcile(m, &h.guild, &catalog, RoleTarget::set(snowflakes(&[2]))));
    let reports = futures::future::join_all(runs).await;

    assert!(reports.iter().all(Result::is_ok));
    assert!(h.ctx.member_locks().is_empty());
}

#[tokio::test]
async fn test_member_of_another_guild_is_rejected() {
    let h = Harness::new().await;
    let other = Harness::new().await;
    let stranger = other.member_with_roles(&[]).await;

    let err = h
        .reconcile(&stranger, RoleTarget::set(snowflakes(&[1])))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(h.store.writes(), (0, 0));
}

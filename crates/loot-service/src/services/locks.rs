//! Per-member reconciliation locks

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use loot_core::RecordId;

/// Serializes reconciliation of the same member within this process
///
/// Different members never contend. An entry lives only while someone holds
/// or waits on it. Nothing is locked across processes.
#[derive(Debug, Default)]
pub struct MemberLocks {
    locks: DashMap<RecordId, Arc<Mutex<()>>>,
}

/// Exclusive access to one member; releases its map entry when dropped
#[derive(Debug)]
pub struct MemberLockGuard<'a> {
    locks: &'a MemberLocks,
    member_id: RecordId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl MemberLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `member_id`
    pub async fn acquire(&self, member_id: RecordId) -> MemberLockGuard<'_> {
        // Clone the Arc out so the shard guard is released before awaiting
        let lock = self
            .locks
            .entry(member_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;

        MemberLockGuard {
            locks: self,
            member_id,
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for MemberLockGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so the map holds the only reference unless someone waits
        drop(self.guard.take());
        self.locks
            .locks
            .remove_if(&self.member_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

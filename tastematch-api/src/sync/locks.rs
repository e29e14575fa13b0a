//! Per-profile merge serialization

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Async mutex per profile id
///
/// Entries are created on demand and pruned once no task holds or waits on
/// them.
#[derive(Clone, Default)]
pub struct ProfileLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ProfileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `profile_id`
    pub async fn acquire(&self, profile_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Only the map holds these entries
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(profile_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of tracked profiles
    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_profile_is_serialized() {
        let locks = ProfileLocks::new();
        let guard = locks.acquire(1).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_other_profiles_do_not_wait() {
        let locks = ProfileLocks::new();
        let _one = locks.acquire(1).await;
        let _two = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = ProfileLocks::new();
        drop(locks.acquire(1).await);
        drop(locks.acquire(2).await);
        // Acquiring prunes idle entries before inserting
        let _g = locks.acquire(3).await;
        assert_eq!(locks.len(), 1);
    }
}

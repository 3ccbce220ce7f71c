//! Coalescing group: concurrent requests for one key share one fetch
//!
//! The first caller for a key (the leader) spawns the fetch as its own task
//! and publishes a shared handle to it. Later callers clone the handle.
//! The slot is removed by the task itself once the fetch finishes, so only
//! the result outlives it, and only if the fetch body stored it somewhere.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{Result, ReviewError};

pub type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

pub struct CoalescingGroup<V> {
    slots: Arc<Mutex<HashMap<String, SharedFetch<V>>>>,
}

impl<V> Default for CoalescingGroup<V> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V> Clone for CoalescingGroup<V> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<V> CoalescingGroup<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight fetch for `key`, or start one with `make`
    ///
    /// Returns the shared result and whether this caller started the fetch.
    /// `make` is only called by the leader. Dropping the returned handle does
    /// not cancel the fetch.
    pub fn join<F, Fut>(&self, key: &str, make: F) -> (SharedFetch<V>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut slots = self.slots.lock();
        if let Some(in_flight) = slots.get(key) {
            return (in_flight.clone(), false);
        }

        let fetch = make();
        // Removal waits for our lock, so the slot is always inserted first
        let release = SlotRelease {
            slots: Arc::clone(&self.slots),
            key: key.to_string(),
        };
        let task = tokio::spawn(async move {
            let _release = release;
            fetch.await
        });

        let shared = async move {
            match task.await {
                Ok(result) => result,
                Err(join_err) => Err(ReviewError::Internal(format!(
                    "coalesced fetch failed: {}",
                    join_err
                ))),
            }
        }
        .boxed()
        .shared();

        slots.insert(key.to_string(), shared.clone());
        (shared, true)
    }

    /// Number of keys with a fetch in flight
    pub fn in_flight(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Frees the slot when the fetch task ends, including by panic
struct SlotRelease<V> {
    slots: Arc<Mutex<HashMap<String, SharedFetch<V>>>>,
    key: String,
}

impl<V> Drop for SlotRelease<V> {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_concurrent_joins_share_one_fetch() {
        let group: CoalescingGroup<u32> = CoalescingGroup::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let mut handles = Vec::new();
        let mut leaders = 0;
        for _ in 0..8 {
            let calls = Arc::clone(&calls);
            let release = Arc::clone(&release);
            let (shared, leader) = group.join("k", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                release.notified().await;
                Ok(42)
            });
            leaders += leader as usize;
            handles.push(tokio::spawn(shared));
        }

        assert_eq!(leaders, 1);
        assert_eq!(group.in_flight(), 1);
        tokio::time::sleep(Duration::from_millis(10)).await;
        release.notify_one();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_error_is_shared() {
        let group: CoalescingGroup<u32> = CoalescingGroup::new();
        let (first, _) = group.join("k", || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(ReviewError::Cancelled)
        });
        let (second, leader) = group.join("k", || async { Ok(1) });
        assert!(!leader);

        assert!(matches!(first.await, Err(ReviewError::Cancelled)));
        assert!(matches!(second.await, Err(ReviewError::Cancelled)));
    }

    #[tokio::test]
    async fn test_slot_released_after_completion() {
        let group: CoalescingGroup<u32> = CoalescingGroup::new();
        let (first, _) = group.join("k", || async { Ok(1) });
        assert_eq!(first.await.unwrap(), 1);

        let (second, leader) = group.join("k", || async { Ok(2) });
        assert!(leader);
        assert_eq!(second.await.unwrap(), 2);
    }

    async fn explode() -> Result<u32> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_internal() {
        let group: CoalescingGroup<u32> = CoalescingGroup::new();
        let (shared, _) = group.join("k", explode);
        assert!(matches!(shared.await, Err(ReviewError::Internal(_))));
        assert_eq!(group.in_flight(), 0);
    }
}

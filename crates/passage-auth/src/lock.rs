//! Owner-checked leases on the coordination store.
//!
//! A lease is a key holding a random owner value. Only the holder of that
//! value can delete it, and the TTL frees it if the holder dies.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use passage_cache::StoreManager;
use passage_core::result::AppResult;
use passage_core::traits::CoordinationStore;

/// Outcome of a non-blocking acquisition.
#[derive(Debug)]
pub enum LockOutcome<T> {
    /// Every requested key is now held.
    Acquired(T),
    /// At least one key is held by someone else.
    Busy,
}

impl<T> LockOutcome<T> {
    /// Whether the outcome is [`LockOutcome::Busy`].
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

/// A single held lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    key: String,
    owner: String,
}

impl Lease {
    /// The leased key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owner value stored under the key.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// Leases taken together by [`DistributedLock::acquire_all`].
///
/// Call [`LeaseSet::release`]. If the set is dropped while still holding
/// leases (for example when the owning future is cancelled) a release is
/// spawned on the current runtime.
#[derive(Debug)]
pub struct LeaseSet {
    leases: Vec<Lease>,
    store: Arc<StoreManager>,
}

impl LeaseSet {
    /// The held leases in acquisition order.
    pub fn leases(&self) -> &[Lease] {
        &self.leases
    }

    /// Release every lease in reverse acquisition order.
    pub async fn release(mut self) {
        let leases = std::mem::take(&mut self.leases);
        release_leases(&self.store, leases).await;
    }
}

impl Drop for LeaseSet {
    fn drop(&mut self) {
        if self.leases.is_empty() {
            return;
        }
        let leases = std::mem::take(&mut self.leases);
        let store = Arc::clone(&self.store);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { release_leases(&store, leases).await });
            }
            Err(_) => {
                warn!(count = leases.len(), "Lease set dropped outside a runtime; leaving to TTL");
            }
        }
    }
}

async fn release_leases(store: &StoreManager, leases: Vec<Lease>) {
    for lease in leases.iter().rev() {
        match store.compare_and_delete(&lease.key, &lease.owner).await {
            Ok(true) => {}
            Ok(false) => debug!(key = %lease.key, "Lease already expired or taken over"),
            Err(e) => warn!(key = %lease.key, error = %e, "Failed to release lease; TTL will free it"),
        }
    }
}

/// Non-blocking distributed mutual exclusion.
#[derive(Debug, Clone)]
pub struct DistributedLock {
    store: Arc<StoreManager>,
}

impl DistributedLock {
    /// Create a lock manager on the given store.
    pub fn new(store: Arc<StoreManager>) -> Self {
        Self { store }
    }

    /// Try to take `key` for `ttl` with a fresh owner value.
    pub async fn acquire(&self, key: &str, ttl: Duration) -> AppResult<LockOutcome<Lease>> {
        let owner = Uuid::new_v4().to_string();
        if self.store.set_nx(key, &owner, ttl).await? {
            Ok(LockOutcome::Acquired(Lease {
                key: key.to_string(),
                owner,
            }))
        } else {
            Ok(LockOutcome::Busy)
        }
    }

    /// Release a lease. Returns `false` if it had expired or changed hands.
    pub async fn release(&self, lease: &Lease) -> AppResult<bool> {
        self.store.compare_and_delete(&lease.key, &lease.owner).await
    }

    /// Take every key or none.
    ///
    /// Keys are sorted first so two callers contending for overlapping sets
    /// always try them in the same order and cannot wait on each other in a
    /// cycle. On the first busy key everything taken so far is released.
    pub async fn acquire_all(
        &self,
        keys: &[String],
        ttl: Duration,
    ) -> AppResult<LockOutcome<LeaseSet>> {
        let mut ordered: Vec<&String> = keys.iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut set = LeaseSet {
            leases: Vec::with_capacity(ordered.len()),
            store: Arc::clone(&self.store),
        };
        for key in ordered {
            match self.acquire(key, ttl).await {
                Ok(LockOutcome::Acquired(lease)) => set.leases.push(lease),
                Ok(LockOutcome::Busy) => {
                    debug!(key = %key, "Lease busy; backing out");
                    set.release().await;
                    return Ok(LockOutcome::Busy);
                }
                Err(e) => {
                    set.release().await;
                    return Err(e);
                }
            }
        }
        Ok(LockOutcome::Acquired(set))
    }

    /// Run `work` while holding every key, releasing on every exit path.
    pub async fn run_exclusive<F, Fut, T>(
        &self,
        keys: &[String],
        ttl: Duration,
        work: F,
    ) -> AppResult<LockOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let set = match self.acquire_all(keys, ttl).await? {
            LockOutcome::Acquired(set) => set,
            LockOutcome::Busy => return Ok(LockOutcome::Busy),
        };
        let result = work().await;
        set.release().await;
        result.map(LockOutcome::Acquired)
    }
}

//! Coalescing of concurrent identical backend calls.
//!
//! The first caller for a key starts the call; callers arriving while it is in
//! flight await the same shared future and receive a clone of its outcome,
//! success or failure. The entry is removed as soon as the call settles, so the
//! next caller starts a fresh call (by then the result is normally cached).

use crate::GatewayError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

type SharedCall<V> = Shared<BoxFuture<'static, Result<V, GatewayError>>>;

struct Flight<V> {
    id: u64,
    call: SharedCall<V>,
}

/// Which part a caller played in a coalesced call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Started the call.
    Leader,
    /// Joined a call already in flight.
    Follower,
}

/// In-flight calls keyed by `K`.
pub struct SingleFlight<K, V> {
    inflight: Mutex<HashMap<K, Flight<V>>>,
    next_id: AtomicU64,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self { inflight: Mutex::new(HashMap::new()), next_id: AtomicU64::new(0) }
    }
}

impl<K, V> std::fmt::Debug for SingleFlight<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight").field("in_flight", &self.lock().len()).finish()
    }
}

impl<K, V> SingleFlight<K, V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<K, Flight<V>>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `start()` for `key` unless a call for `key` is already in flight,
    /// in which case await that one instead.
    ///
    /// `start` is only invoked by the leader. If the leader is dropped before
    /// the call settles, any follower still awaiting drives it to completion.
    pub async fn run<F>(&self, key: K, start: F) -> (Role, Result<V, GatewayError>)
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, GatewayError>>,
    {
        let (role, id, call) = {
            let mut inflight = self.lock();
            match inflight.get(&key) {
                Some(flight) => (Role::Follower, flight.id, flight.call.clone()),
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let call = start().shared();
                    inflight.insert(key.clone(), Flight { id, call: call.clone() });
                    (Role::Leader, id, call)
                }
            }
        };

        let outcome = call.await;

        let mut inflight = self.lock();
        if inflight.get(&key).is_some_and(|flight| flight.id == id) {
            inflight.remove(&key);
        }
        (role, outcome)
    }
}

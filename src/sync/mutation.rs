//! Generic optimistic mutation bookkeeping.
//!
//! The coordinator knows nothing about what is being mutated. Callers hand it
//! the state plus four functions:
//!
//! - `snapshot` captures what is needed to undo the change
//! - `patch` applies the change locally and describes the remote action
//! - `commit` reconciles local state with the confirmed remote result
//! - `rollback` restores the snapshot
//!
//! At most one mutation per key is in flight; a second `begin` for the same
//! key is dropped, so a double tap cannot fork two optimistic branches.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// A pending optimistic change and the data needed to undo it.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationIntent<K, A, S> {
    pub target_id: K,
    /// Remote action plus whatever the patch recorded about itself.
    pub action: A,
    pub rollback_snapshot: S,
    token: u64,
}

#[derive(Debug)]
pub struct MutationCoordinator<K> {
    in_flight: HashMap<K, u64>,
    next_token: u64,
}

impl<K> Default for MutationCoordinator<K> {
    fn default() -> Self {
        Self {
            in_flight: HashMap::new(),
            next_token: 0,
        }
    }
}

impl<K> MutationCoordinator<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, target_id: &K) -> bool {
        self.in_flight.contains_key(target_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Lock `target_id`, snapshot `state`, then apply the optimistic patch.
    ///
    /// Returns `None` without touching `state` if a mutation for the same key
    /// is already in flight.
    pub fn begin<T, A, S>(
        &mut self,
        target_id: K,
        state: &mut T,
        snapshot: impl FnOnce(&T, &K) -> S,
        patch: impl FnOnce(&mut T, &K, &S) -> A,
    ) -> Option<MutationIntent<K, A, S>> {
        if self.in_flight.contains_key(&target_id) {
            tracing::debug!(target = %target_id, "Mutation already in flight, dropping request");
            return None;
        }

        let rollback_snapshot = snapshot(state, &target_id);
        let action = patch(state, &target_id, &rollback_snapshot);

        self.next_token += 1;
        let token = self.next_token;
        self.in_flight.insert(target_id.clone(), token);

        Some(MutationIntent {
            target_id,
            action,
            rollback_snapshot,
            token,
        })
    }

    /// Release the lock and reconcile `state` with the remote outcome.
    ///
    /// On a remote error, or when `commit` itself rejects the result, the
    /// snapshot is restored before the error is returned.
    pub fn settle<T, A, S, V, E>(
        &mut self,
        intent: MutationIntent<K, A, S>,
        result: Result<V, E>,
        state: &mut T,
        commit: impl FnOnce(&mut T, &K, &A, V) -> Result<(), E>,
        rollback: impl FnOnce(&mut T, &K, S),
    ) -> Result<(), E> {
        match self.in_flight.get(&intent.target_id) {
            Some(&token) if token == intent.token => {
                self.in_flight.remove(&intent.target_id);
            }
            _ => {
                tracing::warn!(target = %intent.target_id, "Settling a mutation that does not hold the lock");
            }
        }

        let MutationIntent {
            target_id,
            action,
            rollback_snapshot,
            ..
        } = intent;

        let outcome = result.and_then(|value| commit(state, &target_id, &action, value));
        if outcome.is_err() {
            tracing::warn!(target = %target_id, "Mutation failed, rolling back");
            rollback(state, &target_id, rollback_snapshot);
        }
        outcome
    }
}

//! Idempotency guard: at most one durable effect per client key.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::types::IdempotencyKey;

/// Uniqueness index claimed at the point of durable insert.
///
/// The guard lives inside a store's locked interior, so a claim and the
/// insert it protects form a single atomic step — the constraint itself
/// is the final arbiter, not a separate existence check. Two concurrent
/// creations with the same key result in exactly one success and one
/// `Conflict`.
#[derive(Debug, Default)]
pub struct IdempotencyGuard<T> {
    claimed: HashMap<IdempotencyKey, T>,
}

impl<T: Clone> IdempotencyGuard<T> {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self {
            claimed: HashMap::new(),
        }
    }

    /// Claims a key for the given owner.
    ///
    /// Fails with `Conflict` when the key has already been claimed,
    /// leaving the original claim untouched.
    pub fn claim(&mut self, key: IdempotencyKey, owner: T) -> Result<(), CoreError> {
        match self.claimed.entry(key) {
            std::collections::hash_map::Entry::Occupied(entry) => Err(CoreError::Conflict(
                format!("idempotency key {} already used", entry.key()),
            )),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(owner);
                Ok(())
            }
        }
    }

    /// Returns the owner that claimed the key, if any.
    pub fn lookup(&self, key: &IdempotencyKey) -> Option<&T> {
        self.claimed.get(key)
    }

    /// Releases a claim (administrative delete of the owning entity).
    pub fn release(&mut self, key: &IdempotencyKey) {
        self.claimed.remove(key);
    }

    /// Number of claimed keys.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Returns true if no key has been claimed.
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

//! Per-name exclusive claims for the read-then-delete sequence.
//!
//! A download holds an `ObjectClaim` from the moment it looks an object up
//! until it has either deleted it or given up. While a claim is held no other
//! request can claim the same name, so one object is handed to at most one
//! reader. Claims are in-process only.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct ClaimSet {
    active: HashSet<String>,
    /// Names that were fully served but could not be removed from storage.
    /// An entry lives until a later lookup finds the object gone and calls
    /// `ClaimRegistry::forget_retired`, so the set is bounded by the number
    /// of undeletable objects still on disk.
    retired: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    inner: Arc<Mutex<ClaimSet>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`, or `None` if another request holds it or it was retired.
    pub fn try_claim(&self, name: &str) -> Option<ObjectClaim> {
        let mut set = lock(&self.inner);
        if set.retired.contains(name) || !set.active.insert(name.to_string()) {
            return None;
        }
        Some(ObjectClaim {
            name: name.to_string(),
            registry: self.inner.clone(),
        })
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        lock(&self.inner).active.contains(name)
    }

    pub fn is_retired(&self, name: &str) -> bool {
        lock(&self.inner).retired.contains(name)
    }

    /// Drop the retirement of `name` once its object no longer exists.
    /// Returns whether the name was retired.
    pub fn forget_retired(&self, name: &str) -> bool {
        lock(&self.inner).retired.remove(name)
    }
}

/// Exclusive hold on one object name; released on drop.
#[derive(Debug)]
pub struct ObjectClaim {
    name: String,
    registry: Arc<Mutex<ClaimSet>>,
}

impl ObjectClaim {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release the claim and refuse every future claim on this name.
    pub fn retire(self) {
        lock(&self.registry).retired.insert(self.name.clone());
    }
}

impl Drop for ObjectClaim {
    fn drop(&mut self) {
        lock(&self.registry).active.remove(&self.name);
    }
}

// A panic while holding the lock leaves the sets consistent (every mutation
// is a single insert or remove), so poisoning is ignored.
fn lock(inner: &Mutex<ClaimSet>) -> MutexGuard<'_, ClaimSet> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! Lock registry keyed by target.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

use tracing::debug;

/// What a lock protects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockScope {
    /// Web server configuration of one site.
    Site(String),
    /// One PHP-FPM pool (version, pool name).
    PhpPool(String, String),
    /// The host firewall.
    Firewall,
    /// One managed service, by catalog key.
    Service(String),
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockScope::Site(domain) => write!(f, "site:{}", domain),
            LockScope::PhpPool(version, pool) => write!(f, "php:{}:{}", version, pool),
            LockScope::Firewall => f.write_str("firewall"),
            LockScope::Service(key) => write!(f, "service:{}", key),
        }
    }
}

#[derive(Default)]
struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

type Slots = Mutex<HashMap<LockScope, Arc<Slot>>>;

/// Holds the lock of one scope; released on drop, including on early
/// returns and unwinding.
pub struct ScopeGuard {
    scope: LockScope,
    slot: Arc<Slot>,
    slots: Arc<Slots>,
}

impl ScopeGuard {
    pub fn scope(&self) -> &LockScope {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        {
            let mut held = self.slot.held.lock().unwrap_or_else(|e| e.into_inner());
            *held = false;
            self.slot.released.notify_one();
        }

        // Waiters clone the slot under the map lock, so with the map locked
        // a count of two (map + this guard) means nobody else can use it.
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let idle = slots
            .get(&self.scope)
            .is_some_and(|slot| Arc::ptr_eq(slot, &self.slot) && Arc::strong_count(slot) == 2);
        if idle {
            slots.remove(&self.scope);
        }
        debug!(scope = %self.scope, "Released lock");
    }
}

/// Registry handing out one lock per [`LockScope`]. Slots exist only while
/// a scope is held or waited on.
#[derive(Default)]
pub struct LockRegistry {
    slots: Arc<Slots>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, scope: &LockScope) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(scope.clone()).or_default())
    }

    /// Block until `scope` is free, then hold it.
    pub fn acquire(&self, scope: LockScope) -> ScopeGuard {
        let slot = self.slot(&scope);
        let start = Instant::now();
        {
            let mut held = slot.held.lock().unwrap_or_else(|e| e.into_inner());
            while *held {
                held = slot
                    .released
                    .wait(held)
                    .unwrap_or_else(|e| e.into_inner());
            }
            *held = true;
        }
        debug!(
            scope = %scope,
            waited_ms = start.elapsed().as_millis(),
            "Acquired lock"
        );
        ScopeGuard {
            scope,
            slot,
            slots: Arc::clone(&self.slots),
        }
    }

    /// Hold `scope` if it is free right now.
    pub fn try_acquire(&self, scope: LockScope) -> Option<ScopeGuard> {
        let slot = self.slot(&scope);
        {
            let mut held = slot.held.lock().unwrap_or_else(|e| e.into_inner());
            if *held {
                return None;
            }
            *held = true;
        }
        Some(ScopeGuard {
            scope,
            slot,
            slots: Arc::clone(&self.slots),
        })
    }

    /// Whether `scope` is currently held.
    pub fn is_locked(&self, scope: &LockScope) -> bool {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .get(scope)
            .is_some_and(|slot| *slot.held.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Number of scopes currently held or waited on.
    pub fn tracked_scopes(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

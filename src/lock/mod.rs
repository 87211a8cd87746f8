//! Per-target mutual exclusion.
//!
//! Mutating sequences (deploy, rule change, service restart) hold a lock on
//! their target for their whole duration. Different targets never contend.

mod registry;

pub use registry::{LockRegistry, LockScope, ScopeGuard};

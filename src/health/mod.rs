//! Deadline-bounded health snapshots of the service catalog.

mod monitor;

pub use monitor::{HealthMonitor, HealthSnapshot};

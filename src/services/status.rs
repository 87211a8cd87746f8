//! Live service status.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::executor::CommandResult;

/// Live state of one catalog service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub key: String,
    pub unit: String,
    /// `systemctl is-active` word ("active", "inactive", "failed", ...).
    pub status: String,
    pub running: bool,
    pub enabled: bool,
    pub pid: Option<u32>,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub uptime_seconds: Option<u64>,
    pub up_since: Option<DateTime<Utc>>,
}

impl ServiceStatus {
    /// Status when nothing could be learned (tool missing, deadline hit).
    pub fn unknown(key: &str, unit: &str) -> Self {
        Self {
            key: key.to_string(),
            unit: unit.to_string(),
            status: "unknown".to_string(),
            running: false,
            enabled: false,
            pid: None,
            cpu_percent: None,
            memory_percent: None,
            uptime_seconds: None,
            up_since: None,
        }
    }
}

/// Process figures from `ps -o %cpu=,%mem=,etimes=`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessStats {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub elapsed_seconds: u64,
}

impl ProcessStats {
    pub fn started_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::seconds(self.elapsed_seconds as i64)
    }
}

/// Word printed by `systemctl is-active`. It exits non-zero for anything
/// but "active", so stdout is read regardless of the exit status.
pub fn parse_active_state(result: &CommandResult) -> String {
    let word = result.stdout.trim();
    if word.is_empty() {
        "unknown".to_string()
    } else {
        word.to_string()
    }
}

/// `systemctl is-enabled` output; "enabled" and its aliases count.
pub fn parse_enabled_state(result: &CommandResult) -> bool {
    matches!(
        result.stdout.trim(),
        "enabled" | "enabled-runtime" | "alias" | "static"
    )
}

/// `systemctl show --property=MainPID --value`; 0 means no process.
pub fn parse_main_pid(output: &str) -> Option<u32> {
    output.trim().parse::<u32>().ok().filter(|&pid| pid > 0)
}

pub fn parse_process_stats(output: &str) -> Option<ProcessStats> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    let mut fields = line.split_whitespace();
    let cpu_percent = fields.next()?.parse().ok()?;
    let memory_percent = fields.next()?.parse().ok()?;
    let elapsed_seconds = fields.next()?.parse().ok()?;
    Some(ProcessStats {
        cpu_percent,
        memory_percent,
        elapsed_seconds,
    })
}

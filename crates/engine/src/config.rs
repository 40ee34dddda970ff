//! Engine tunables.
//!
//! Everything here is a policy knob, not an invariant: deadlines bound
//! how long silence from the store is tolerated before it is read as
//! absence, the debounce window bounds write amplification for drag
//! updates, and the shard threshold bounds per-read map size.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single store read before it resolves to absent.
    pub read_deadline: Duration,
    /// Upper bound on draining one child stream (full-collection scans,
    /// shard fan-out).
    pub scan_deadline: Duration,
    /// Per-step deadline when assembling an aggregate; children still
    /// unresolved when it elapses are marked, not awaited further.
    pub step_deadline: Duration,
    /// Quiet window before a coalesced position write is flushed.
    pub debounce_window: Duration,
    /// Boolean-map cardinality at which membership writes move to the
    /// next page shard.
    pub shard_threshold: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_deadline: Duration::from_secs(2),
            scan_deadline: Duration::from_secs(3),
            step_deadline: Duration::from_secs(3),
            debounce_window: Duration::from_millis(100),
            shard_threshold: 500,
        }
    }
}

impl EngineConfig {
    /// Build a config from environment variables, falling back to the
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            read_deadline: env_millis("ACCORD_READ_DEADLINE_MS")
                .unwrap_or(defaults.read_deadline),
            scan_deadline: env_millis("ACCORD_SCAN_DEADLINE_MS")
                .unwrap_or(defaults.scan_deadline),
            step_deadline: env_millis("ACCORD_STEP_DEADLINE_MS")
                .unwrap_or(defaults.step_deadline),
            debounce_window: env_millis("ACCORD_DEBOUNCE_MS")
                .unwrap_or(defaults.debounce_window),
            shard_threshold: std::env::var("ACCORD_SHARD_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shard_threshold),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Controller tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Bound on simultaneous remote launch attempts per step. Limits how many
    /// calls may be waiting on transport acceptance at once, not how many
    /// workers execute in parallel. Unbounded when `None`.
    pub max_concurrent_launches: Option<NonZeroUsize>,
    /// How often the health watch loop probes the pool.
    pub health_watch_period_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_launches: None,
            health_watch_period_ms: 1_000,
        }
    }
}

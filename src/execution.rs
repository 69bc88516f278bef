use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One scheduler-produced unit of work. Opaque here: the coordination layer
/// passes it to every worker without inspecting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledWork(pub Value);

/// The aggregated result of one execution step — the driver's output under
/// correct tensor-parallel replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput(pub Value);

/// The per-step contract a transport-specific coordinator fulfils.
#[allow(unused)]
#[trait_variant::make(ExecutionCoordinator: Send)]
pub trait ExecutionCoordinatorTemplate {
    /// Runs one scheduled unit of work on every worker in lockstep.
    ///
    /// # Returns
    /// The driver's output; remote outputs are discarded.
    ///
    /// # Errors
    /// Any worker failure wins over any output.
    async fn execute_step(&self, work: ScheduledWork) -> Result<StepOutput>;

    /// Has every worker write its own state shard under `path`.
    ///
    /// Fire-and-confirm: success means every worker accepted the call, no
    /// value is aggregated.
    async fn save_state(
        &self,
        path: &str,
        pattern: Option<&str>,
        max_size: Option<u64>,
    ) -> Result<()>;
}

use std::io;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::dispatch::DispatchRequest;

/// Operation names the coordination layer dispatches. Each worker resolves
/// them against its own execution kernel.
pub mod ops {
    pub const DETERMINE_NUM_AVAILABLE_BLOCKS: &str = "determine_num_available_blocks";
    pub const INITIALIZE_CACHE: &str = "initialize_cache";
    pub const COMPILE_OR_WARM_UP_MODEL: &str = "compile_or_warm_up_model";
    pub const EXECUTE_MODEL: &str = "execute_model";
    pub const SAVE_SHARDED_STATE: &str = "save_sharded_state";
}

/// What one worker eventually answers for one invocation: a value, or the
/// worker-side failure cause.
pub type InvokeOutcome = std::result::Result<Value, String>;

/// The transport seam of the coordination layer.
///
/// A transport implements this once per worker kind (in-process driver,
/// spawned subprocess, remote endpoint). `submit` must resolve as soon as the
/// transport has *accepted* the call, not when the worker finished it; the
/// returned [`Reply`] completes with the worker's outcome later.
#[allow(unused)]
#[trait_variant::make(WorkerEndpoint: Send)]
pub trait WorkerEndpointTemplate {
    /// Hands one named-operation invocation to the worker.
    ///
    /// # Arguments
    /// * `request` - The operation name and its opaque argument payload.
    ///
    /// # Returns
    /// A pending [`Reply`], or an io error if the transport rejected the call.
    async fn submit(&self, request: DispatchRequest) -> io::Result<Reply>;

    /// Liveness probe. Must be callable at any time without disturbing
    /// in-flight invocations.
    async fn probe(&self) -> bool;
}

/// One invocation's pending result, completed by the transport.
pub struct Reply {
    rx: oneshot::Receiver<InvokeOutcome>,
}

impl Reply {
    /// Creates the completion side and the pending side of one reply.
    ///
    /// # Returns
    /// The sender a transport completes, and the `Reply` it hands back from
    /// [`WorkerEndpointTemplate::submit`].
    pub fn channel() -> (oneshot::Sender<InvokeOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Waits for the worker's outcome.
    ///
    /// A transport that drops the completion side without answering counts as
    /// a worker failure.
    pub async fn recv(self) -> InvokeOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err("transport dropped the reply before answering".to_string()),
        }
    }
}

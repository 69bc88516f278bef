use std::{num::NonZeroUsize, sync::Arc};

use futures::future;
use log::debug;
use serde_json::Value;
use tokio::sync::{Semaphore, oneshot};

use crate::{
    endpoint::{InvokeOutcome, WorkerEndpoint},
    error::{CoordinationError, Result},
    pool::WorkerPool,
};

/// One named-operation invocation, fanned out as-is to every selected worker.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    operation: String,
    args: Value,
}

impl DispatchRequest {
    /// An invocation with no arguments.
    pub fn new(operation: impl Into<String>) -> Self {
        Self::with_args(operation, Value::Null)
    }

    /// An invocation carrying an opaque argument payload.
    pub fn with_args(operation: impl Into<String>, args: Value) -> Self {
        Self {
            operation: operation.into(),
            args,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn args(&self) -> &Value {
        &self.args
    }
}

/// The fan-out/fan-in primitive sitting between the coordinators and the pool.
pub struct Dispatcher<E> {
    pool: Arc<WorkerPool<E>>,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<E> Dispatcher<E> {
    pub fn new(pool: Arc<WorkerPool<E>>) -> Self {
        Self { pool }
    }
}

impl<E> Dispatcher<E>
where
    E: WorkerEndpoint + Sync,
{
    /// Invokes `request` on every worker, driver included, and blocks until
    /// all of them answered.
    ///
    /// # Returns
    /// The per-worker values in pool order, regardless of completion order.
    ///
    /// # Errors
    /// The lowest-pool-index `WorkerExecution` failure. Every sibling
    /// invocation of the same dispatch is resolved before it is returned, so
    /// no in-flight call outlives this method.
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<Vec<Value>> {
        debug!(operation = request.operation(); "dispatching to all workers");

        let calls = self.pool.workers().iter().map(async |worker| {
            let reply = worker
                .endpoint()
                .submit(request.clone())
                .await
                .map_err(|e| {
                    CoordinationError::execution(worker.index(), request.operation(), e.to_string())
                })?;

            reply.recv().await.map_err(|cause| {
                CoordinationError::execution(worker.index(), request.operation(), cause)
            })
        });

        // join_all is the rendezvous: every worker answers before any failure
        // is surfaced.
        let outcomes = future::join_all(calls).await;
        outcomes.into_iter().collect()
    }
}

impl<E> Dispatcher<E>
where
    E: WorkerEndpoint + Sync + 'static,
{
    /// Invokes `request` on the remote workers only, without waiting.
    ///
    /// The driver is excluded; the caller is expected to run the equivalent
    /// call in its own context. Returns immediately with one pending
    /// invocation per remote worker, pool order preserved. Failures surface
    /// only when a pending invocation is joined.
    ///
    /// # Arguments
    /// * `request` - The invocation to fan out.
    /// * `max_concurrent` - Bound on simultaneous *launches* (calls handed to
    ///   their transport but not yet accepted). Unbounded when `None`.
    pub fn dispatch_remote(
        &self,
        request: &DispatchRequest,
        max_concurrent: Option<NonZeroUsize>,
    ) -> Vec<PendingInvocation> {
        let permits = max_concurrent.map_or(self.pool.len(), NonZeroUsize::get);
        let gate = Arc::new(Semaphore::new(permits));

        debug!(
            operation = request.operation(),
            max_concurrent = permits;
            "dispatching to remote workers"
        );

        self.pool
            .remote_workers()
            .map(|worker| {
                let (tx, rx) = oneshot::channel();
                let endpoint = worker.endpoint_arc();
                let task_request = request.clone();
                let gate = Arc::clone(&gate);

                tokio::spawn(async move {
                    let outcome = launch(endpoint, task_request, gate).await;
                    // The caller may have dropped its pending handle; in this
                    // mode that discards the outcome.
                    let _ = tx.send(outcome);
                });

                PendingInvocation {
                    worker_index: worker.index(),
                    operation: request.operation().to_string(),
                    rx,
                }
            })
            .collect()
    }
}

/// Launches one remote invocation behind the launch gate and waits it out.
///
/// The permit is held across `submit` only: it is released the moment the
/// transport accepts the call, not when the worker finishes it.
async fn launch<E>(endpoint: Arc<E>, request: DispatchRequest, gate: Arc<Semaphore>) -> InvokeOutcome
where
    E: WorkerEndpoint + Sync,
{
    let reply = {
        let _permit = match gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Err("launch gate closed".to_string()),
        };

        match endpoint.submit(request).await {
            Ok(reply) => reply,
            Err(e) => return Err(e.to_string()),
        }
    };

    reply.recv().await
}

/// One remote worker's not-yet-consumed invocation result.
pub struct PendingInvocation {
    worker_index: usize,
    operation: String,
    rx: oneshot::Receiver<InvokeOutcome>,
}

impl PendingInvocation {
    /// Pool index of the worker this invocation went to.
    pub fn worker_index(&self) -> usize {
        self.worker_index
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Waits for the worker's result.
    ///
    /// # Errors
    /// A `WorkerExecution` failure naming this worker and operation.
    pub async fn join(self) -> Result<Value> {
        let outcome = self
            .rx
            .await
            .unwrap_or_else(|_| Err("launch task dropped before replying".to_string()));

        outcome
            .map_err(|cause| CoordinationError::execution(self.worker_index, &self.operation, cause))
    }
}

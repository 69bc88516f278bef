use std::{sync::Arc, time::Duration};

use futures::future;
use log::debug;
use tokio::time::{self, MissedTickBehavior};

use crate::{
    endpoint::WorkerEndpoint,
    error::{CoordinationError, Result},
    pool::WorkerPool,
};

/// Verifies liveness of every worker through the endpoint's probe hook,
/// bypassing the dispatcher so in-flight dispatches are undisturbed.
pub struct HealthMonitor<E> {
    pool: Arc<WorkerPool<E>>,
}

impl<E> HealthMonitor<E> {
    pub fn new(pool: Arc<WorkerPool<E>>) -> Self {
        Self { pool }
    }
}

impl<E> HealthMonitor<E>
where
    E: WorkerEndpoint + Sync,
{
    /// Probes every worker concurrently.
    ///
    /// # Errors
    /// `WorkerUnhealthy` naming the lowest-index worker that failed its probe.
    pub async fn check_health(&self) -> Result<()> {
        let probes = self
            .pool
            .workers()
            .iter()
            .map(async |worker| (worker.index(), worker.endpoint().probe().await));

        for (worker_index, healthy) in future::join_all(probes).await {
            if !healthy {
                return Err(CoordinationError::WorkerUnhealthy { worker_index });
            }
        }

        Ok(())
    }

    /// Probes the pool every `period` until a worker fails, and returns that
    /// failure. Meant to be raced against the main loop with `select!`.
    pub async fn watch(&self, period: Duration) -> CoordinationError {
        let mut ticks = time::interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;

            if let Err(e) = self.check_health().await {
                return e;
            }

            debug!("all workers healthy");
        }
    }
}

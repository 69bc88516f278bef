use std::{sync::Arc, time::Duration};

use log::info;
use serde_json::{Value, json};

use crate::{
    cache::CacheCoordinator,
    capacity::{CacheSize, CapacityNegotiator},
    config::CoordinatorConfig,
    dispatch::{DispatchRequest, Dispatcher},
    endpoint::{WorkerEndpoint, ops},
    error::{CoordinationError, Result},
    execution::{ExecutionCoordinator, ScheduledWork, StepOutput},
    health::HealthMonitor,
    pool::WorkerPool,
};

/// Startup phase of the controller. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unconfigured,
    CacheSized,
    Ready,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Unconfigured => "unconfigured",
            Phase::CacheSized => "cache-sized",
            Phase::Ready => "ready",
        }
    }
}

/// The controller-visible façade over one worker pool.
///
/// Owns the startup sequencing as an explicit state machine rather than
/// caller discipline: capacity negotiation, then cache initialization, then
/// step execution. Out-of-order calls are rejected with `OutOfOrder`.
pub struct ClusterCoordinator<E> {
    pool: Arc<WorkerPool<E>>,
    dispatcher: Dispatcher<E>,
    negotiator: CapacityNegotiator<E>,
    cache: CacheCoordinator<E>,
    health: HealthMonitor<E>,
    config: CoordinatorConfig,
    phase: Phase,
}

impl<E> ClusterCoordinator<E> {
    pub fn new(pool: WorkerPool<E>) -> Self {
        Self::with_config(pool, CoordinatorConfig::default())
    }

    pub fn with_config(pool: WorkerPool<E>, config: CoordinatorConfig) -> Self {
        let pool = Arc::new(pool);
        let dispatcher = Dispatcher::new(Arc::clone(&pool));

        Self {
            negotiator: CapacityNegotiator::new(dispatcher.clone()),
            cache: CacheCoordinator::new(dispatcher.clone()),
            health: HealthMonitor::new(Arc::clone(&pool)),
            pool,
            dispatcher,
            config,
            phase: Phase::Unconfigured,
        }
    }

    /// Replaces the hook invoked with the finalized cache size.
    pub fn with_cache_observer(
        mut self,
        observer: impl Fn(&CacheSize) + Send + Sync + 'static,
    ) -> Self {
        self.cache = self.cache.with_observer(observer);
        self
    }

    pub fn pool(&self) -> &WorkerPool<E> {
        &self.pool
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<()> {
        if self.phase != expected {
            return Err(CoordinationError::OutOfOrder {
                operation,
                phase: self.phase.as_str(),
            });
        }

        Ok(())
    }
}

impl<E> ClusterCoordinator<E>
where
    E: WorkerEndpoint + Sync + 'static,
{
    /// Negotiates the cluster-wide cache size across the full pool.
    ///
    /// First step of the startup sequence; callable exactly once.
    pub async fn negotiate_cache_size(&mut self) -> Result<CacheSize> {
        self.expect_phase(Phase::Unconfigured, "negotiate_cache_size")?;

        let size = self.negotiator.negotiate_cache_size().await?;
        self.phase = Phase::CacheSized;
        info!(num_primary_blocks = size.num_primary_blocks; "cache size negotiated");
        Ok(size)
    }

    /// Applies the finalized cache size on every worker and warms them up.
    ///
    /// Second step of the startup sequence; consumes the negotiated size
    /// exactly once and makes the coordinator ready for execution.
    pub async fn initialize(&mut self, cache_size: CacheSize) -> Result<()> {
        self.expect_phase(Phase::CacheSized, "initialize")?;

        self.cache.initialize(cache_size).await?;
        self.phase = Phase::Ready;
        info!("workers initialized and warmed up");
        Ok(())
    }

    /// On-demand liveness check. Callable in any phase.
    pub async fn check_health(&self) -> Result<()> {
        self.health.check_health().await
    }

    /// Periodic liveness loop, returning the first failure. Callable in any
    /// phase; meant to be raced against the caller's main loop.
    pub async fn watch_health(&self) -> CoordinationError {
        let period = Duration::from_millis(self.config.health_watch_period_ms);
        self.health.watch(period).await
    }
}

impl<E> ExecutionCoordinator for ClusterCoordinator<E>
where
    E: WorkerEndpoint + Sync + 'static,
{
    async fn execute_step(&self, work: ScheduledWork) -> Result<StepOutput> {
        self.expect_phase(Phase::Ready, "execute_step")?;

        let request = DispatchRequest::with_args(ops::EXECUTE_MODEL, work.0);

        // Remotes are launched without waiting; the driver runs the same step
        // in the controller's own context.
        let pending = self
            .dispatcher
            .dispatch_remote(&request, self.config.max_concurrent_launches);

        let driver = self.pool.driver();
        let driver_outcome = match driver.endpoint().submit(request.clone()).await {
            Ok(reply) => reply.recv().await,
            Err(e) => Err(e.to_string()),
        };

        // Every remote must be resolved before the step is reported, even
        // when the driver already failed.
        let mut resolved: Vec<(usize, Result<Value>)> = Vec::with_capacity(self.pool.len());
        resolved.push((
            driver.index(),
            driver_outcome.map_err(|cause| {
                CoordinationError::execution(driver.index(), request.operation(), cause)
            }),
        ));

        for invocation in pending {
            let worker_index = invocation.worker_index();
            resolved.push((worker_index, invocation.join().await));
        }

        // Lowest pool index wins when several workers failed.
        resolved.sort_by_key(|(worker_index, _)| *worker_index);

        let driver_index = driver.index();
        let mut output = Value::Null;
        for (worker_index, outcome) in resolved {
            let value = outcome?;
            if worker_index == driver_index {
                output = value;
            }
        }

        Ok(StepOutput(output))
    }

    async fn save_state(
        &self,
        path: &str,
        pattern: Option<&str>,
        max_size: Option<u64>,
    ) -> Result<()> {
        self.expect_phase(Phase::Ready, "save_state")?;

        let args = json!({
            "path": path,
            "pattern": pattern,
            "max_size": max_size,
        });

        let request = DispatchRequest::with_args(ops::SAVE_SHARDED_STATE, args);
        self.dispatcher.dispatch(&request).await?;
        Ok(())
    }
}

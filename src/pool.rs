use std::sync::Arc;

use crate::error::{CoordinationError, Result};

/// Where a worker runs relative to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    /// Runs in the controller's own context; its result is authoritative.
    Driver,
    /// Runs behind a transport.
    Remote,
}

/// One worker of the pool: its canonical index, its role and its endpoint.
pub struct WorkerHandle<E> {
    index: usize,
    role: WorkerRole,
    endpoint: Arc<E>,
}

impl<E> WorkerHandle<E> {
    fn new(index: usize, role: WorkerRole, endpoint: E) -> Self {
        Self {
            index,
            role,
            endpoint: Arc::new(endpoint),
        }
    }

    /// The worker's position in the pool, `0..N-1`. Reductions and result
    /// alignment are keyed on this.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    pub fn is_driver(&self) -> bool {
        self.role == WorkerRole::Driver
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub(crate) fn endpoint_arc(&self) -> Arc<E> {
        Arc::clone(&self.endpoint)
    }
}

/// The ordered, immutable worker set owned by the controller.
///
/// Index order is significant: it is the canonical ordering every dispatch
/// aligns its results to. Membership never changes after construction, so the
/// pool is shared freely without locking.
pub struct WorkerPool<E> {
    workers: Vec<WorkerHandle<E>>,
    driver_index: usize,
}

impl<E> WorkerPool<E> {
    /// Creates a pool from role-tagged endpoints, assigning indices by
    /// position.
    ///
    /// # Arguments
    /// * `endpoints` - One `(role, endpoint)` pair per worker, in pool order.
    ///
    /// # Returns
    /// A `PoolConfiguration` error if no workers are supplied or the driver
    /// count is not exactly one.
    pub fn new(endpoints: Vec<(WorkerRole, E)>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(CoordinationError::PoolConfiguration(
                "a pool needs at least one worker".to_string(),
            ));
        }

        let workers: Vec<_> = endpoints
            .into_iter()
            .enumerate()
            .map(|(index, (role, endpoint))| WorkerHandle::new(index, role, endpoint))
            .collect();

        let mut drivers = workers.iter().filter(|worker| worker.is_driver());
        let driver_index = match (drivers.next(), drivers.next()) {
            (Some(driver), None) => driver.index(),
            (None, _) => {
                return Err(CoordinationError::PoolConfiguration(
                    "exactly one worker must be the driver, got none".to_string(),
                ));
            }
            (Some(_), Some(extra)) => {
                return Err(CoordinationError::PoolConfiguration(format!(
                    "exactly one worker must be the driver, worker {} is a second one",
                    extra.index()
                )));
            }
        };

        Ok(Self {
            workers,
            driver_index,
        })
    }

    /// Every worker, in pool order.
    pub fn workers(&self) -> &[WorkerHandle<E>] {
        &self.workers
    }

    /// The distinguished driver worker.
    pub fn driver(&self) -> &WorkerHandle<E> {
        &self.workers[self.driver_index]
    }

    /// Every non-driver worker, pool order preserved.
    pub fn remote_workers(&self) -> impl Iterator<Item = &WorkerHandle<E>> {
        self.workers.iter().filter(|worker| !worker.is_driver())
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    #[test]
    fn rejects_an_empty_pool() {
        let result = WorkerPool::<Nop>::new(Vec::new());
        assert!(matches!(
            result,
            Err(CoordinationError::PoolConfiguration(_))
        ));
    }

    #[test]
    fn rejects_zero_and_double_drivers() {
        let all_remote = vec![(WorkerRole::Remote, Nop), (WorkerRole::Remote, Nop)];
        assert!(matches!(
            WorkerPool::new(all_remote),
            Err(CoordinationError::PoolConfiguration(_))
        ));

        let two_drivers = vec![(WorkerRole::Driver, Nop), (WorkerRole::Driver, Nop)];
        assert!(matches!(
            WorkerPool::new(two_drivers),
            Err(CoordinationError::PoolConfiguration(_))
        ));
    }

    #[test]
    fn preserves_pool_order() {
        let pool = WorkerPool::new(vec![
            (WorkerRole::Remote, Nop),
            (WorkerRole::Driver, Nop),
            (WorkerRole::Remote, Nop),
        ])
        .unwrap();

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.driver().index(), 1);

        let remote_indices: Vec<_> = pool.remote_workers().map(WorkerHandle::index).collect();
        assert_eq!(remote_indices, [0, 2]);
    }
}

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    dispatch::{DispatchRequest, Dispatcher},
    endpoint::{WorkerEndpoint, ops},
    error::{CoordinationError, Result},
};

/// The cluster-wide cache capacity, finalized once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSize {
    pub num_primary_blocks: u64,
    pub num_secondary_blocks: u64,
}

/// What one worker answers to `determine_num_available_blocks`: the block
/// counts its own device can hold.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockReport {
    pub num_primary_blocks: i64,
    pub num_secondary_blocks: i64,
}

/// Reduces per-worker capacity reports to one cluster-wide figure.
pub struct CapacityNegotiator<E> {
    dispatcher: Dispatcher<E>,
}

impl<E> CapacityNegotiator<E> {
    pub fn new(dispatcher: Dispatcher<E>) -> Self {
        Self { dispatcher }
    }
}

impl<E> CapacityNegotiator<E>
where
    E: WorkerEndpoint + Sync,
{
    /// Queries every worker's block counts and reduces them.
    ///
    /// The same allocation must be valid on every worker simultaneously, so
    /// the primary count is the minimum over all reports. The secondary tier
    /// is not negotiated and stays at zero.
    ///
    /// # Errors
    /// `CapacityNegotiation` if the dispatch fails, a report cannot be
    /// decoded, or any worker reports a non-positive primary count.
    pub async fn negotiate_cache_size(&self) -> Result<CacheSize> {
        let request = DispatchRequest::new(ops::DETERMINE_NUM_AVAILABLE_BLOCKS);
        let reports = self
            .dispatcher
            .dispatch(&request)
            .await
            .map_err(|e| CoordinationError::CapacityNegotiation(e.to_string()))?;

        let mut min_primary: Option<i64> = None;
        for (worker_index, value) in reports.into_iter().enumerate() {
            let report: BlockReport = serde_json::from_value(value).map_err(|e| {
                CoordinationError::CapacityNegotiation(format!(
                    "worker {worker_index} sent an undecodable block report: {e}"
                ))
            })?;

            debug!(
                worker_index = worker_index,
                num_primary_blocks = report.num_primary_blocks;
                "worker reported its capacity"
            );

            if report.num_primary_blocks <= 0 {
                return Err(CoordinationError::CapacityNegotiation(format!(
                    "worker {worker_index} reported a non-positive primary block count: {}",
                    report.num_primary_blocks
                )));
            }

            min_primary = Some(match min_primary {
                Some(current) => current.min(report.num_primary_blocks),
                None => report.num_primary_blocks,
            });
        }

        let num_primary_blocks = min_primary.ok_or_else(|| {
            CoordinationError::CapacityNegotiation("no worker reported block counts".to_string())
        })?;

        Ok(CacheSize {
            num_primary_blocks: num_primary_blocks as u64,
            num_secondary_blocks: 0,
        })
    }
}

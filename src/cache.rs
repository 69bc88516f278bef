use log::info;

use crate::{
    capacity::CacheSize,
    dispatch::{DispatchRequest, Dispatcher},
    endpoint::{WorkerEndpoint, ops},
    error::Result,
};

type CacheSizeObserver = Box<dyn Fn(&CacheSize) + Send + Sync>;

/// Pushes the finalized cache size to every worker and warms them up.
pub struct CacheCoordinator<E> {
    dispatcher: Dispatcher<E>,
    observer: CacheSizeObserver,
}

impl<E> CacheCoordinator<E> {
    pub fn new(dispatcher: Dispatcher<E>) -> Self {
        Self {
            dispatcher,
            observer: Box::new(|size| {
                info!(
                    num_primary_blocks = size.num_primary_blocks,
                    num_secondary_blocks = size.num_secondary_blocks;
                    "worker cache size finalized"
                );
            }),
        }
    }

    /// Replaces the hook invoked once with the finalized cache size, before
    /// any worker is dispatched to. The default hook logs the block counts.
    pub fn with_observer(mut self, observer: impl Fn(&CacheSize) + Send + Sync + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }
}

impl<E> CacheCoordinator<E>
where
    E: WorkerEndpoint + Sync,
{
    /// Applies `cache_size` on every worker, then runs the warm-up/compile
    /// pass on every worker.
    ///
    /// The warm-up reads the cache it just allocated, so it is not issued to
    /// anyone until the initialization dispatch completed on all workers. A
    /// failed initialization therefore means no worker ever sees the warm-up.
    pub async fn initialize(&self, cache_size: CacheSize) -> Result<()> {
        (self.observer)(&cache_size);

        // SAFETY: Serialize impl for `CacheSize` is derived over two plain
        //         integers, `to_value` cannot fail on it.
        let args = serde_json::to_value(cache_size).unwrap();
        let init = DispatchRequest::with_args(ops::INITIALIZE_CACHE, args);
        self.dispatcher.dispatch(&init).await?;

        let warm_up = DispatchRequest::new(ops::COMPILE_OR_WARM_UP_MODEL);
        self.dispatcher.dispatch(&warm_up).await?;
        Ok(())
    }
}

pub mod cache;
pub mod capacity;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod execution;
pub mod health;
pub mod pool;


pub use cache::CacheCoordinator;
pub use capacity::{BlockReport, CacheSize, CapacityNegotiator};
pub use config::CoordinatorConfig;
pub use coordinator::ClusterCoordinator;
pub use dispatch::{DispatchRequest, Dispatcher, PendingInvocation};
pub use endpoint::{InvokeOutcome, Reply, WorkerEndpoint, ops};
pub use error::{CoordinationError, Result};
pub use execution::{ExecutionCoordinator, ScheduledWork, StepOutput};
pub use health::HealthMonitor;
pub use pool::{WorkerHandle, WorkerPool, WorkerRole};

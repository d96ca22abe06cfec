pub mod cli;
pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod gateway;
pub mod services;
pub mod snapshot;
pub mod tags;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigManager, Environment, Settings};
pub use errors::{GatewayError, ReplicationError, SnapshotterError, ValidationError};
pub use gateway::{CloudGateway, InMemoryGateway, Snapshot, SnapshotState, Volume};
pub use services::{LifecycleService, RunPlan, RunSummary};
pub use tags::Tag;

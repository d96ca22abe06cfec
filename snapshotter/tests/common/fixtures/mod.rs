//! This module provides reusable test utilities:
//! - In-memory gateways seeded with volumes and snapshots
//! - Fast polling/throttle settings
//! - Common tag sets

// Allow unused code in test fixtures - each test binary uses a subset
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod test_data;
pub mod test_gateway;

// Re-export commonly used items
pub use test_data::*;
pub use test_gateway::*;

// File: snapshotter/src/services/mod.rs

pub mod lifecycle_service;

pub use lifecycle_service::{CreationPlan, LifecycleService, RunPlan, RunSummary};

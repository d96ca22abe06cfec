// File: snapshotter/src/snapshot/mod.rs

//! Tag-driven snapshot lifecycle
//!
//! All lifecycle state lives in the tags of the remote snapshots; nothing is
//! kept locally between runs.
//!
//! # Lifecycle
//!
//! 1. **Create**: every volume tagged `<selector>=true` is snapshotted, and the
//!    snapshot is tagged with the volume's `Name` plus, when expiration is
//!    enabled, `PurgeAllow=true` and `PurgeAfterFE=<epoch seconds>`
//! 2. **Replicate** (optional): once the snapshot leaves `pending`, a
//!    `completed` snapshot is copied to the destination region with the same tags
//! 3. **Purge**: snapshots with `PurgeAllow=true` whose `PurgeAfterFE` lies in
//!    the past are deleted one by one, throttled between deletes

pub mod creator;
pub mod purger;
pub mod replicator;

pub use creator::{CreatedSnapshot, CreationReport, SnapshotCreator};
pub use purger::{evaluate, ExpirationPurger, PurgeDecision, PurgeReport};
pub use replicator::{copy_description, CrossRegionReplicator};

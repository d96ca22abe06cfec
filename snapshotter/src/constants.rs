//! Application-wide constants for tag keys, timeouts and defaults
//!
//! The tag keys and literal values in [`tags`] are the durable lifecycle
//! encoding shared with snapshots created by earlier runs. They must stay
//! bit-for-bit identical.

use std::time::Duration;

/// Tag keys and values written to and read from remote resources
pub mod tags {
    /// Copied from the source volume onto the snapshot when present
    pub const NAME: &str = "Name";

    /// Marks a snapshot as eligible for lifecycle deletion
    pub const PURGE_ALLOW: &str = "PurgeAllow";

    /// Epoch-seconds threshold after which a snapshot may be purged
    pub const PURGE_AFTER_FE: &str = "PurgeAfterFE";

    /// The only value accepted as "enabled" for opt-in tags
    pub const TRUE_VALUE: &str = "true";
}

/// Replication polling constants
pub mod polling {
    use super::Duration;

    /// Delay between snapshot state fetches while waiting for completion
    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

    /// Fetch attempts before giving up on a pending snapshot (about one hour)
    pub const MAX_POLL_ATTEMPTS: u32 = 7200;
}

/// Purge pass constants
pub mod purge {
    /// Default delay between consecutive deletes, in milliseconds
    pub const DEFAULT_THROTTLE_MS: u64 = 250;
}

/// Time conversion helpers
pub mod time {
    pub const SECONDS_PER_HOUR: i64 = 3600;
}

/// Environment variable names for credentials and region
pub mod env {
    pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
    pub const DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
}

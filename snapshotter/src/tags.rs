//! Tag lookup and the expiration tagging scheme
//!
//! Everything the lifecycle knows about a snapshot lives in its tags. This
//! module reads typed values out of a tag list and builds the tag set stamped
//! onto newly created snapshots.

use crate::constants::{tags as tag_keys, time::SECONDS_PER_HOUR};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Value of the first tag whose key equals `key` exactly.
pub fn get_tag_value<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.key == key)
        .map(|tag| tag.value.as_str())
}

/// True only when the tag is present with the literal value `"true"`.
pub fn is_opted_in(tags: &[Tag], key: &str) -> bool {
    get_tag_value(tags, key) == Some(tag_keys::TRUE_VALUE)
}

/// Decimal epoch-seconds value of a tag, if present and an integer.
pub fn get_epoch_tag(tags: &[Tag], key: &str) -> Option<i64> {
    get_tag_value(tags, key).and_then(|value| value.parse::<i64>().ok())
}

/// `hours * 3600` as epoch seconds, `None` when it does not fit an `i64`.
pub fn hours_to_seconds(hours: u64) -> Option<i64> {
    i64::try_from(hours)
        .ok()
        .and_then(|hours| hours.checked_mul(SECONDS_PER_HOUR))
}

/// Expiration settings materialized into `PurgeAllow` / `PurgeAfterFE` at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    purge_after_epoch: Option<i64>,
}

impl ExpirationPolicy {
    pub fn disabled() -> Self {
        Self {
            purge_after_epoch: None,
        }
    }

    /// `hours == 0` disables expiration. A window too large to represent
    /// clamps to `i64::MAX` and never expires.
    pub fn from_hours(now_epoch: i64, hours: u64) -> Self {
        if hours == 0 {
            return Self::disabled();
        }
        let purge_after = hours_to_seconds(hours)
            .and_then(|offset| now_epoch.checked_add(offset))
            .unwrap_or(i64::MAX);
        Self {
            purge_after_epoch: Some(purge_after),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.purge_after_epoch.is_some()
    }

    pub fn purge_after_epoch(&self) -> Option<i64> {
        self.purge_after_epoch
    }

    pub fn to_tags(&self) -> Vec<Tag> {
        match self.purge_after_epoch {
            Some(epoch) => vec![
                Tag::new(tag_keys::PURGE_ALLOW, tag_keys::TRUE_VALUE),
                Tag::new(tag_keys::PURGE_AFTER_FE, epoch.to_string()),
            ],
            None => Vec::new(),
        }
    }
}

/// Tag set for a snapshot of a volume: its `Name` (if any) then the expiration pair.
pub fn build_snapshot_tags(volume_tags: &[Tag], policy: &ExpirationPolicy) -> Vec<Tag> {
    let mut snapshot_tags = Vec::with_capacity(3);
    if let Some(name) = get_tag_value(volume_tags, tag_keys::NAME) {
        snapshot_tags.push(Tag::new(tag_keys::NAME, name));
    }
    snapshot_tags.extend(policy.to_tags());
    snapshot_tags
}

/// `vol-123 (db)` when the resource has a Name tag, otherwise just the id.
pub fn resource_label(id: &str, resource_tags: &[Tag]) -> String {
    match get_tag_value(resource_tags, tag_keys::NAME) {
        Some(name) => format!("{} ({})", id, name),
        None => id.to_string(),
    }
}

//! Common tag sets and epochs used across tests

use snapshotter::Tag;

/// Creation time used by fixed-clock tests
pub const NOW: i64 = 1_700_000_000;

pub fn tags(pairs: &[(&str, &str)]) -> Vec<Tag> {
    pairs.iter().map(|(k, v)| Tag::new(*k, *v)).collect()
}

/// Tags of a snapshot eligible for purge once `now > purge_after`.
pub fn purgeable(purge_after: i64) -> Vec<Tag> {
    vec![
        Tag::new("PurgeAllow", "true"),
        Tag::new("PurgeAfterFE", purge_after.to_string()),
    ]
}

pub fn named_purgeable(name: &str, purge_after: i64) -> Vec<Tag> {
    let mut tags = vec![Tag::new("Name", name)];
    tags.extend(purgeable(purge_after));
    tags
}

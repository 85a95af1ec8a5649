//! Staff configuration loaded from environment variables.
//!
//! Only Discord users listed in `STAFF_USER_IDS` (comma-separated) may run shop
//! actions. Optional nicknames come from `STAFF_NICKNAMES` as `id=name` pairs.

use std::collections::{HashMap, HashSet};

/// Parses a comma-separated list of user IDs, ignoring blanks.
#[must_use]
pub fn parse_staff_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses `id=name` pairs separated by commas. Malformed pairs are skipped.
#[must_use]
pub fn parse_nicknames(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(id, name)| (id.trim().to_string(), name.trim().to_string()))
        .filter(|(id, name)| !id.is_empty() && !name.is_empty())
        .collect()
}

/// Staff user IDs allowed to act on the configured shop.
#[must_use]
pub fn get_staff_ids() -> HashSet<String> {
    std::env::var("STAFF_USER_IDS")
        .map(|raw| parse_staff_ids(&raw))
        .unwrap_or_default()
}

/// Mapping of staff user IDs to display nicknames.
#[must_use]
pub fn get_staff_nicknames() -> HashMap<String, String> {
    std::env::var("STAFF_NICKNAMES")
        .map(|raw| parse_nicknames(&raw))
        .unwrap_or_default()
}

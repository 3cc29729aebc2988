use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Wraparound distance between two ring locations.
pub fn ring_distance(a: f64, b: f64) -> f64 {
    let direct = (a - b).abs();
    direct.min(1.0 - direct).max(0.0)
}

pub fn short_id(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(8)
        .map(|(index, _)| index)
        .unwrap_or(id.len());
    &id[..end]
}

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Maps a string onto [0, 1) deterministically.
pub fn stable_unit(value: &str) -> f64 {
    let hash = stable_hash(value);
    ((hash >> 11) as f64) / ((1u64 << 53) as f64)
}

pub fn stable_hue(value: &str) -> f32 {
    (stable_hash(value) % 360) as f32 / 360.0
}

/// Canonical form of an undirected connection key (`"a|b"` with `a <= b`).
pub fn connection_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

pub fn split_connection_key(key: &str) -> Option<(&str, &str)> {
    let (a, b) = key.split_once('|')?;
    if a.is_empty() || b.is_empty() || a == b {
        return None;
    }
    Some((a, b))
}

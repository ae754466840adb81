use std::collections::HashSet;
use std::sync::Arc;

use crate::model::Track;

/// Outcome of diffing candidate songs against a target playlist.
#[derive(Debug, Clone)]
pub struct PlaylistDiff {
    /// Candidates whose key is not already in the playlist, in input order.
    pub to_add: Vec<Arc<Track>>,
    pub duplicate_count: usize,
}

/// Pure set difference for "add songs to named playlist". No side effects,
/// no I/O, so the duplicate-handling flow can be tested without the rest of
/// the session.
pub fn diff(candidates: &[Arc<Track>], existing_keys: &HashSet<String>) -> PlaylistDiff {
    let to_add: Vec<Arc<Track>> = candidates
        .iter()
        .filter(|t| !existing_keys.contains(&t.key))
        .cloned()
        .collect();
    PlaylistDiff {
        duplicate_count: candidates.len() - to_add.len(),
        to_add,
    }
}

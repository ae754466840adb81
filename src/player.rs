use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::Track;

/// Loop/shuffle policy for queue stepping 🔁
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    #[default]
    Sequential,
    LoopAll,
    LoopOne,
    Shuffle,
}

/// Next queue index for the given mode, or `None` when playback stops
/// (sequential mode falling off the end).
pub fn next_index(current: usize, len: usize, mode: PlaybackMode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match mode {
        PlaybackMode::Sequential => {
            let next = current + 1;
            (next < len).then_some(next)
        }
        PlaybackMode::LoopAll => Some((current + 1) % len),
        PlaybackMode::LoopOne => Some(current),
        PlaybackMode::Shuffle => Some(random_other(current, len)),
    }
}

/// Previous queue index for the given mode, or `None` when already at the
/// start in sequential mode.
pub fn prev_index(current: usize, len: usize, mode: PlaybackMode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match mode {
        PlaybackMode::Sequential => current.checked_sub(1),
        PlaybackMode::LoopAll => Some(current.checked_sub(1).unwrap_or(len - 1)),
        PlaybackMode::LoopOne => Some(current),
        PlaybackMode::Shuffle => Some(random_other(current, len)),
    }
}

fn random_other(current: usize, len: usize) -> usize {
    if len == 1 {
        return current;
    }
    let mut rng = rand::thread_rng();
    // Draw from the range without the current index to avoid repeats.
    let pick = rng.gen_range(0..len - 1);
    if pick >= current {
        pick + 1
    } else {
        pick
    }
}

/// The unified interface to whatever actually produces sound 🎧
///
/// Implementations live outside this crate (MPD, rodio, system players).
/// `load_and_play` reports missing/unreadable media as an error; the session
/// absorbs it and raises a user-visible notice instead of crashing.
pub trait Player: Send + Sync {
    fn load_and_play(&self, track: &Track) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn position_ms(&self) -> u64 {
        0
    }
}

/// A player that accepts everything and plays nothing. Used by the headless
/// binary and by tests.
#[derive(Debug, Default)]
pub struct NullPlayer;

impl Player for NullPlayer {
    fn load_and_play(&self, _track: &Track) -> Result<()> {
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_stops_at_the_edges() {
        assert_eq!(next_index(1, 3, PlaybackMode::Sequential), Some(2));
        assert_eq!(next_index(2, 3, PlaybackMode::Sequential), None);
        assert_eq!(prev_index(0, 3, PlaybackMode::Sequential), None);
        assert_eq!(next_index(0, 0, PlaybackMode::Sequential), None);
    }

    #[test]
    fn loop_all_wraps() {
        assert_eq!(next_index(2, 3, PlaybackMode::LoopAll), Some(0));
        assert_eq!(prev_index(0, 3, PlaybackMode::LoopAll), Some(2));
    }

    #[test]
    fn loop_one_stays_put() {
        assert_eq!(next_index(1, 3, PlaybackMode::LoopOne), Some(1));
        assert_eq!(prev_index(1, 3, PlaybackMode::LoopOne), Some(1));
    }

    #[test]
    fn shuffle_never_repeats_with_more_than_one_track() {
        for _ in 0..50 {
            let next = next_index(2, 5, PlaybackMode::Shuffle).unwrap();
            assert!(next < 5);
            assert_ne!(next, 2);
        }
        assert_eq!(next_index(0, 1, PlaybackMode::Shuffle), Some(0));
    }
}

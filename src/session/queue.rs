use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{SourceId, Track, TrackList};
use crate::player::{next_index, prev_index, PlaybackMode};
use crate::session::error::SessionError;

/// Semantic source of the current queue 📻
///
/// Set by the orchestrator *before* the sequence is replaced; it decides
/// which identity rule applies when an incoming play request might be the
/// queue that is already active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueueKind {
    AllLibrary,
    AlbumCard,
    SongCard,
    CustomPlaylist,
    SearchLocal,
    SearchOnline,
    #[default]
    None,
}

/// The ordered list of tracks eligible for playback plus a position cursor.
///
/// Invariant: `position` is `None` exactly when the queue is empty, otherwise
/// a valid index.
#[derive(Debug, Default)]
pub struct PlayQueue {
    tracks: Vec<Arc<Track>>,
    position: Option<usize>,
    kind: QueueKind,
    source: Option<SourceId>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn current(&self) -> Option<&Arc<Track>> {
        self.position.and_then(|i| self.tracks.get(i))
    }

    /// Replace the whole sequence and kind unconditionally.
    ///
    /// `start` is clamped to the valid range; an empty source leaves the
    /// queue empty with no position. Callers always treat this as "queue
    /// replaced" regardless of the previous contents.
    pub fn set_queue(&mut self, source: &TrackList, start: usize, kind: QueueKind) {
        self.kind = kind;
        self.tracks = source.tracks().to_vec();
        self.source = Some(source.id());
        self.position = if self.tracks.is_empty() {
            None
        } else {
            Some(start.min(self.tracks.len() - 1))
        };
    }

    /// True iff `source` is the very sequence this queue was set from (same
    /// identity stamp, not merely equal contents) and the kind matches.
    pub fn is_same_queue(&self, source: &TrackList, kind: QueueKind) -> bool {
        self.kind == kind && self.source == Some(source.id())
    }

    pub fn set_position(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.tracks.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.tracks.len(),
            });
        }
        self.position = Some(index);
        Ok(())
    }

    /// Insert a contiguous run at `index` (clamped to `[0, len]`). When the
    /// insertion lands at or before the current position, the position shifts
    /// so it keeps pointing at the same logical track.
    pub fn insert_at(&mut self, index: usize, tracks: &[Arc<Track>]) {
        if tracks.is_empty() {
            return;
        }
        let index = index.min(self.tracks.len());
        self.tracks
            .splice(index..index, tracks.iter().cloned());
        if let Some(pos) = self.position {
            if index <= pos {
                self.position = Some(pos + tracks.len());
            }
        }
    }

    pub fn append(&mut self, tracks: &[Arc<Track>]) {
        let len = self.tracks.len();
        self.insert_at(len, tracks);
    }

    /// Swap a single slot without touching the position. Dependent views
    /// patch the one slot instead of re-rendering the whole list.
    pub fn replace_at(&mut self, index: usize, track: Arc<Track>) -> Result<(), SessionError> {
        match self.tracks.get_mut(index) {
            Some(slot) => {
                *slot = track;
                Ok(())
            }
            None => Err(SessionError::IndexOutOfRange {
                index,
                len: self.tracks.len(),
            }),
        }
    }

    /// Remove every slot matching the predicate, returning how many went.
    ///
    /// If the current slot is removed, the position moves to the next
    /// surviving slot (never backwards), or clears when nothing survives.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Track) -> bool,
    {
        let old_pos = self.position;
        let mut removed = 0usize;
        let mut new_pos: Option<usize> = None;
        let mut kept = Vec::with_capacity(self.tracks.len());

        for (i, track) in self.tracks.drain(..).enumerate() {
            if predicate(&track) {
                removed += 1;
                continue;
            }
            if let Some(pos) = old_pos {
                // First survivor at or after the old position becomes current.
                if i >= pos && new_pos.is_none() {
                    new_pos = Some(kept.len());
                }
            }
            kept.push(track);
        }

        self.tracks = kept;
        self.position = if self.tracks.is_empty() {
            None
        } else {
            match (old_pos, new_pos) {
                (Some(_), Some(p)) => Some(p),
                // Everything from the old position onwards was removed but
                // earlier slots survive; settle on the last of them.
                (Some(_), None) => Some(self.tracks.len() - 1),
                (None, _) => None,
            }
        };
        removed
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.position = None;
        self.kind = QueueKind::None;
        self.source = None;
    }

    /// Move to the next track according to the playback mode strategy.
    pub fn advance(&mut self, mode: PlaybackMode) -> Option<usize> {
        let next = next_index(self.position?, self.tracks.len(), mode)?;
        self.position = Some(next);
        Some(next)
    }

    /// Move to the previous track according to the playback mode strategy.
    pub fn retreat(&mut self, mode: PlaybackMode) -> Option<usize> {
        let prev = prev_index(self.position?, self.tracks.len(), mode)?;
        self.position = Some(prev);
        Some(prev)
    }
}

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity stamp for a canonical track sequence.
///
/// Two lists with equal contents but different ids are different queues;
/// re-selecting a source that still holds the same id keeps playback
/// continuity instead of restarting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub fn fresh() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A single song, local or online 🎵
///
/// Slots holding a `Track` are swapped, never mutated: resolving an online
/// track produces a new `Arc<Track>` that replaces the placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique key: file path for local songs, crawler id for online ones.
    pub key: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    /// True for songs that came from an online search.
    pub online: bool,
    /// Playable URL for online songs, filled in by the resolver.
    pub play_url: Option<String>,
    /// Cover art locator, if known.
    pub cover_path: Option<String>,
}

impl Track {
    pub fn local(path: &str, title: &str, artist: &str, album: &str, duration_ms: u64) -> Self {
        Self {
            key: path.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            duration_ms,
            online: false,
            play_url: None,
            cover_path: None,
        }
    }

    /// An online search result whose play URL is not known yet.
    pub fn online_placeholder(id: &str, title: &str, artist: &str, album: &str) -> Self {
        Self {
            key: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            duration_ms: 0,
            online: true,
            play_url: None,
            cover_path: None,
        }
    }

    /// Playback cannot start for this track until the resolver has run.
    pub fn is_pending(&self) -> bool {
        self.online && self.play_url.is_none()
    }

    /// The resolved counterpart of a placeholder. Key stays stable so other
    /// views can patch their copy of the same logical slot.
    pub fn resolved(&self, url: &str, cover_path: Option<String>) -> Self {
        let mut track = self.clone();
        track.play_url = Some(url.to_string());
        track.cover_path = cover_path;
        track
    }

    /// What the player should open: the resolved URL for online songs,
    /// the file path for local ones.
    pub fn playable_url(&self) -> Option<&str> {
        if self.online {
            self.play_url.as_deref()
        } else {
            Some(&self.key)
        }
    }
}

/// A canonical sequence of tracks with an assigned identity.
///
/// Canonical holders (an album's own list, a saved playlist, a search result
/// page) keep their id as long as the contents stand; synthesized queues
/// (shuffle-all) mint a fresh id every time.
#[derive(Debug, Clone)]
pub struct TrackList {
    id: SourceId,
    tracks: Vec<Arc<Track>>,
}

impl TrackList {
    pub fn new(tracks: Vec<Arc<Track>>) -> Self {
        Self {
            id: SourceId::fresh(),
            tracks,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> SourceId {
        self.id
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

    pub fn get(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    pub fn position_of_key(&self, key: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.key == key)
    }

    /// Replace the contents. This is a new logical queue, so a fresh id is
    /// assigned.
    pub fn set_tracks(&mut self, tracks: Vec<Arc<Track>>) {
        self.tracks = tracks;
        self.id = SourceId::fresh();
    }

    /// Append tracks, keeping the identity. Used when the live source grows
    /// (e.g. songs added to the playlist currently playing).
    pub fn extend(&mut self, tracks: &[Arc<Track>]) {
        self.tracks.extend(tracks.iter().cloned());
    }

    /// Patch a single slot in place without changing identity. Used when a
    /// placeholder is swapped for its resolved counterpart.
    pub fn patch_slot(&mut self, index: usize, track: Arc<Track>) {
        if let Some(slot) = self.tracks.get_mut(index) {
            *slot = track;
        }
    }

    pub fn patch_by_key(&mut self, track: &Arc<Track>) {
        if let Some(index) = self.position_of_key(&track.key) {
            self.tracks[index] = track.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_lists_have_distinct_ids() {
        let a = TrackList::new(vec![]);
        let b = TrackList::new(vec![]);
        assert_ne!(a.id(), b.id());
        // A clone is the same logical sequence.
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn set_tracks_mints_a_new_id() {
        let mut list = TrackList::new(vec![]);
        let old = list.id();
        list.set_tracks(vec![Arc::new(Track::local("a.mp3", "A", "x", "y", 1000))]);
        assert_ne!(list.id(), old);
    }

    #[test]
    fn pending_flag_follows_resolution() {
        let placeholder = Track::online_placeholder("song-1", "Song", "Artist", "Album");
        assert!(placeholder.is_pending());
        assert_eq!(placeholder.playable_url(), None);

        let resolved = placeholder.resolved("https://cdn.example/song-1.m4a", None);
        assert!(!resolved.is_pending());
        assert_eq!(resolved.key, placeholder.key);
        assert_eq!(
            resolved.playable_url(),
            Some("https://cdn.example/song-1.m4a")
        );
    }
}

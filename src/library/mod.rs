pub mod scanner;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Track, TrackList};

/// All songs of one album, with the album's canonical track list.
#[derive(Debug, Clone)]
pub struct Album {
    pub title: String,
    pub artist: String,
    pub tracks: TrackList,
}

#[derive(Debug, Clone)]
pub struct ArtistInfo {
    pub name: String,
    pub track_count: usize,
}

/// A user-created playlist persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct SavedPlaylist {
    pub name: String,
    pub tracks: TrackList,
}

/// On-disk shape of a saved playlist.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistFile {
    pub name: String,
    pub songs: Vec<Track>,
}

/// Immutable read model of the indexed library 📚
///
/// Built fully off the session context by the scanner, then swapped in as a
/// single `Arc` replacement; readers never observe a half-updated snapshot.
#[derive(Debug, Clone)]
pub struct LibrarySnapshot {
    /// Canonical all-songs list; its identity is stable per snapshot.
    pub all: TrackList,
    pub albums: Vec<Album>,
    pub artists: Vec<ArtistInfo>,
    pub playlists: Vec<SavedPlaylist>,
}

impl Default for LibrarySnapshot {
    fn default() -> Self {
        Self {
            all: TrackList::empty(),
            albums: Vec::new(),
            artists: Vec::new(),
            playlists: Vec::new(),
        }
    }
}

impl LibrarySnapshot {
    pub fn find_album(&self, artist: &str, title: &str) -> Option<&Album> {
        self.albums
            .iter()
            .find(|a| a.artist == artist && a.title == title)
    }

    pub fn find_playlist(&self, name: &str) -> Option<&SavedPlaylist> {
        self.playlists.iter().find(|p| p.name == name)
    }
}

/// Snapshot cell plus saved-playlist persistence.
#[derive(Debug)]
pub struct Library {
    snapshot: RwLock<Arc<LibrarySnapshot>>,
    playlist_dir: PathBuf,
}

impl Library {
    pub fn new(playlist_dir: PathBuf) -> Self {
        if !playlist_dir.exists() {
            let _ = fs::create_dir_all(&playlist_dir);
        }
        Self {
            snapshot: RwLock::new(Arc::new(LibrarySnapshot::default())),
            playlist_dir,
        }
    }

    pub fn playlist_dir(&self) -> &PathBuf {
        &self.playlist_dir
    }

    pub fn snapshot(&self) -> Arc<LibrarySnapshot> {
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }

    /// Single pointer swap; the new snapshot was built elsewhere in full.
    pub fn swap(&self, snapshot: LibrarySnapshot) {
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(snapshot);
    }

    pub fn create_playlist(&self, name: &str) -> bool {
        let current = self.snapshot();
        if current.find_playlist(name).is_some() {
            return false;
        }
        let mut next = (*current).clone();
        let playlist = SavedPlaylist {
            name: name.to_string(),
            tracks: TrackList::empty(),
        };
        self.persist_playlist(&playlist);
        next.playlists.push(playlist);
        self.swap(next);
        true
    }

    /// Append songs to a saved playlist and persist it. The playlist keeps
    /// its identity so a queue playing from it stays "the same queue".
    pub fn add_songs_to_playlist(&self, name: &str, tracks: &[Arc<Track>]) -> bool {
        self.update_playlist(name, |playlist| playlist.tracks.extend(tracks))
    }

    pub fn remove_songs_from_playlist(&self, name: &str, keys: &HashSet<String>) -> bool {
        self.update_playlist(name, |playlist| {
            let kept: Vec<Arc<Track>> = playlist
                .tracks
                .tracks()
                .iter()
                .filter(|t| !keys.contains(&t.key))
                .cloned()
                .collect();
            playlist.tracks.set_tracks(kept);
        })
    }

    pub fn rename_playlist(&self, old: &str, new: &str) -> bool {
        let current = self.snapshot();
        if current.find_playlist(old).is_none() || current.find_playlist(new).is_some() {
            return false;
        }
        let mut next = (*current).clone();
        let playlist = next
            .playlists
            .iter_mut()
            .find(|p| p.name == old)
            .expect("checked above");
        playlist.name = new.to_string();
        let _ = fs::remove_file(self.playlist_path(old));
        self.persist_playlist(playlist);
        self.swap(next);
        true
    }

    pub fn delete_playlist(&self, name: &str) -> bool {
        let current = self.snapshot();
        if current.find_playlist(name).is_none() {
            return false;
        }
        let mut next = (*current).clone();
        next.playlists.retain(|p| p.name != name);
        let _ = fs::remove_file(self.playlist_path(name));
        self.swap(next);
        true
    }

    fn update_playlist<F>(&self, name: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut SavedPlaylist),
    {
        let current = self.snapshot();
        if current.find_playlist(name).is_none() {
            return false;
        }
        let mut next = (*current).clone();
        let playlist = next
            .playlists
            .iter_mut()
            .find(|p| p.name == name)
            .expect("checked above");
        mutate(playlist);
        self.persist_playlist(playlist);
        self.swap(next);
        true
    }

    fn playlist_path(&self, name: &str) -> PathBuf {
        self.playlist_dir.join(format!("{name}.json"))
    }

    fn persist_playlist(&self, playlist: &SavedPlaylist) {
        let file = PlaylistFile {
            name: playlist.name.clone(),
            songs: playlist
                .tracks
                .tracks()
                .iter()
                .map(|t| (**t).clone())
                .collect(),
        };
        match serde_json::to_string_pretty(&file) {
            Ok(json) => {
                if let Err(e) = fs::write(self.playlist_path(&playlist.name), json) {
                    warn!("failed to write playlist {}: {e}", playlist.name);
                }
            }
            Err(e) => warn!("failed to serialize playlist {}: {e}", playlist.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(key: &str) -> Arc<Track> {
        Arc::new(Track::local(key, key, "artist", "album", 1000))
    }

    #[test]
    fn playlist_round_trip_through_library() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::new(dir.path().to_path_buf());

        assert!(library.create_playlist("Favourites"));
        assert!(!library.create_playlist("Favourites"));

        assert!(library.add_songs_to_playlist("Favourites", &[track("a"), track("b")]));
        let snapshot = library.snapshot();
        let playlist = snapshot.find_playlist("Favourites").unwrap();
        assert_eq!(playlist.tracks.len(), 2);
        assert!(dir.path().join("Favourites.json").exists());

        assert!(library.rename_playlist("Favourites", "Road Trip"));
        assert!(!dir.path().join("Favourites.json").exists());
        assert!(dir.path().join("Road Trip.json").exists());

        assert!(library.delete_playlist("Road Trip"));
        assert!(library.snapshot().playlists.is_empty());
    }

    #[test]
    fn appending_keeps_playlist_identity() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::new(dir.path().to_path_buf());
        library.create_playlist("Mix");
        library.add_songs_to_playlist("Mix", &[track("a")]);

        let before = library
            .snapshot()
            .find_playlist("Mix")
            .unwrap()
            .tracks
            .id();
        library.add_songs_to_playlist("Mix", &[track("b")]);
        let after = library
            .snapshot()
            .find_playlist("Mix")
            .unwrap()
            .tracks
            .id();
        assert_eq!(before, after);
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::library::{Album, ArtistInfo, LibrarySnapshot, PlaylistFile, SavedPlaylist};
use crate::model::{Track, TrackList};
use crate::session::error::SessionError;

/// File extensions the scanner indexes.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "aac", "ogg", "opus", "wav"];

/// Build a full replacement snapshot from the selected music directories.
///
/// Runs off the session context (the rescan worker's body); the result is
/// swapped in atomically by the caller. An unreadable root directory fails
/// the whole pass and the previous snapshot stays authoritative.
pub fn scan_directories(
    directories: &[PathBuf],
    playlist_dir: &Path,
) -> Result<LibrarySnapshot, SessionError> {
    let mut tracks: Vec<Arc<Track>> = Vec::new();

    for dir in directories {
        if !dir.is_dir() {
            return Err(SessionError::RescanFailed(format!(
                "not a readable directory: {}",
                dir.display()
            )));
        }
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable entry under {}: {e}", dir.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_audio_file(entry.path()) {
                continue;
            }
            tracks.push(Arc::new(read_track(entry.path())));
        }
    }

    tracks.sort_by(|a, b| {
        (&a.artist, &a.album, &a.title).cmp(&(&b.artist, &b.album, &b.title))
    });
    debug!("scanned {} tracks from {} directories", tracks.len(), directories.len());

    let albums = group_albums(&tracks);
    let artists = group_artists(&tracks);
    let playlists = load_playlists(playlist_dir);

    Ok(LibrarySnapshot {
        all: TrackList::new(tracks),
        albums,
        artists,
        playlists,
    })
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read one track's metadata, falling back to the raw file name when the
/// tags are missing or unreadable.
fn read_track(path: &Path) -> Track {
    let fallback_title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string();
    let key = path.to_string_lossy().to_string();

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            let duration_ms = tagged.properties().duration().as_millis() as u64;
            let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
            let title = tag
                .and_then(|t| t.title().map(|s| s.to_string()))
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(fallback_title);
            let artist = tag
                .and_then(|t| t.artist().map(|s| s.to_string()))
                .unwrap_or_else(|| "Unknown Artist".to_string());
            let album = tag
                .and_then(|t| t.album().map(|s| s.to_string()))
                .unwrap_or_else(|| "Unknown Album".to_string());
            Track::local(&key, &title, &artist, &album, duration_ms)
        }
        Err(e) => {
            debug!("no readable tags for {}: {e}", path.display());
            Track::local(&key, &fallback_title, "Unknown Artist", "Unknown Album", 0)
        }
    }
}

fn group_albums(tracks: &[Arc<Track>]) -> Vec<Album> {
    let mut grouped: BTreeMap<(String, String), Vec<Arc<Track>>> = BTreeMap::new();
    for track in tracks {
        grouped
            .entry((track.artist.clone(), track.album.clone()))
            .or_default()
            .push(track.clone());
    }
    grouped
        .into_iter()
        .map(|((artist, title), songs)| Album {
            title,
            artist,
            tracks: TrackList::new(songs),
        })
        .collect()
}

fn group_artists(tracks: &[Arc<Track>]) -> Vec<ArtistInfo> {
    let mut grouped: BTreeMap<String, usize> = BTreeMap::new();
    for track in tracks {
        *grouped.entry(track.artist.clone()).or_default() += 1;
    }
    grouped
        .into_iter()
        .map(|(name, track_count)| ArtistInfo { name, track_count })
        .collect()
}

fn load_playlists(playlist_dir: &Path) -> Vec<SavedPlaylist> {
    let mut playlists = Vec::new();
    let Ok(entries) = fs::read_dir(playlist_dir) else {
        return playlists;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str::<PlaylistFile>(&s).map_err(Into::into))
        {
            Ok(file) => playlists.push(SavedPlaylist {
                name: file.name,
                tracks: TrackList::new(file.songs.into_iter().map(Arc::new).collect()),
            }),
            Err(e) => warn!("skipping malformed playlist {}: {e}", path.display()),
        }
    }
    playlists.sort_by(|a, b| a.name.cmp(&b.name));
    playlists
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_supported_extensions_only() {
        let music = tempfile::tempdir().unwrap();
        let playlists = tempfile::tempdir().unwrap();
        fs::write(music.path().join("song.mp3"), b"not really audio").unwrap();
        fs::write(music.path().join("cover.jpg"), b"image").unwrap();
        fs::write(music.path().join("notes.txt"), b"text").unwrap();

        let snapshot = scan_directories(&[music.path().to_path_buf()], playlists.path()).unwrap();
        assert_eq!(snapshot.all.len(), 1);
        // Unreadable tags fall back to the file name.
        assert_eq!(snapshot.all.get(0).unwrap().title, "song");
        assert_eq!(snapshot.albums.len(), 1);
        assert_eq!(snapshot.artists.len(), 1);
    }

    #[test]
    fn missing_directory_fails_the_pass() {
        let playlists = tempfile::tempdir().unwrap();
        let result = scan_directories(&[PathBuf::from("/definitely/not/here")], playlists.path());
        assert!(matches!(result, Err(SessionError::RescanFailed(_))));
    }

    #[test]
    fn playlist_json_files_are_picked_up() {
        let music = tempfile::tempdir().unwrap();
        let playlists = tempfile::tempdir().unwrap();
        let file = PlaylistFile {
            name: "Jogging".to_string(),
            songs: vec![Track::local("a.mp3", "A", "X", "Y", 1000)],
        };
        fs::write(
            playlists.path().join("Jogging.json"),
            serde_json::to_string(&file).unwrap(),
        )
        .unwrap();
        fs::write(playlists.path().join("junk.json"), b"{").unwrap();

        let snapshot = scan_directories(&[music.path().to_path_buf()], playlists.path()).unwrap();
        assert_eq!(snapshot.playlists.len(), 1);
        assert_eq!(snapshot.playlists[0].name, "Jogging");
        assert_eq!(snapshot.playlists[0].tracks.len(), 1);
    }
}

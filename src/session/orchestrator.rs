use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{PersistentState, UserConfig};
use crate::library::Library;
use crate::model::{Track, TrackList};
use crate::player::{PlaybackMode, Player};
use crate::resolver::{Quality, Resolver};
use crate::search;
use crate::session::error::SessionError;
use crate::session::events::{EventBus, SessionEvent};
use crate::session::navigation::{Frame, NavigationStack};
use crate::session::playlist_diff;
use crate::session::queue::{PlayQueue, QueueKind};
use crate::session::tasks::{RescanDisposition, TaskCoordinator, TaskEvent};

/// What the user decided when told some songs are already in the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateDecision {
    /// Add the full requested set, duplicates included.
    AddAll,
    /// Add only the songs not already present.
    OnlyNew,
}

/// Confirmation dialog capability for the duplicate-add flow. Implemented by
/// the presentation layer.
pub trait DuplicateConfirm {
    fn confirm(&self, planned: usize, duplicates: usize) -> DuplicateDecision;
}

/// The session façade 🎛️
///
/// Owns the play queue, the navigation stack, the task coordinator and the
/// event bus; every user/UI intent enters here. One task holds `&mut Session`
/// and is the session context: all queue/navigation mutation happens on it.
/// The only suspension point is online-URL resolution; intents arriving
/// during the wait queue behind the borrow.
pub struct Session {
    queue: PlayQueue,
    nav: NavigationStack,
    tasks: TaskCoordinator,
    task_events: mpsc::UnboundedReceiver<TaskEvent>,
    bus: EventBus,
    library: Library,
    player: Arc<dyn Player>,
    resolver: Arc<dyn Resolver>,

    music_directories: Vec<PathBuf>,
    quality: Quality,
    search_limit: usize,

    mode: PlaybackMode,
    volume: u8,
    last_queue_kind: QueueKind,
    last_playlist: Option<String>,
    last_track_key: String,

    /// Canonical result lists; they are the patch targets when a resolved
    /// track must reach every holder of the same logical slot.
    local_search: Option<TrackList>,
    online_search: Option<TrackList>,
    /// Name of the saved playlist the queue was set from, when the active
    /// kind is `CustomPlaylist` backed by a saved playlist.
    active_playlist: Option<String>,
}

impl Session {
    pub fn new(
        config: UserConfig,
        state: PersistentState,
        playlist_dir: PathBuf,
        player: Arc<dyn Player>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        let (tasks, task_events) = TaskCoordinator::new(playlist_dir.clone());
        Self {
            queue: PlayQueue::new(),
            nav: NavigationStack::new(),
            tasks,
            task_events,
            bus: EventBus::new(),
            library: Library::new(playlist_dir),
            player,
            resolver,
            music_directories: config.music_directories,
            quality: config.online_play_quality,
            search_limit: config.search_limit,
            mode: state.loop_mode,
            volume: state.volume,
            last_queue_kind: state.last_queue_kind,
            last_playlist: state.last_playlist,
            last_track_key: state.last_track_key,
            local_search: None,
            online_search: None,
            active_playlist: None,
        }
    }

    // ── observers ────────────────────────────────────────────────

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.bus.subscribe()
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn navigation(&self) -> &NavigationStack {
        &self.nav
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn loop_mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn set_loop_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
    }

    // ── startup / teardown ───────────────────────────────────────

    /// Blocking initial scan, then restore the default all-library queue and
    /// re-seat the position on the persisted last track. Like the teardown
    /// state, this runs once per session.
    pub async fn initialize(&mut self) {
        self.tasks.start_rescan(self.music_directories.clone());
        while self.tasks.rescan_in_flight() {
            match self.task_events.recv().await {
                Some(event) => self.apply_task_event(event),
                None => break,
            }
        }
        self.restore_queue();
    }

    /// Rebuild the queue that was active at teardown. A saved playlist is
    /// restored by name; every other kind (and a deleted playlist) falls back
    /// to the all-library queue.
    fn restore_queue(&mut self) {
        let snapshot = self.library.snapshot();
        let restored = if self.last_queue_kind == QueueKind::CustomPlaylist {
            self.last_playlist.as_deref().and_then(|name| {
                snapshot
                    .find_playlist(name)
                    .map(|p| (p.tracks.clone(), Some(name.to_string())))
            })
        } else {
            None
        };
        let (list, kind, playlist) = match restored {
            Some((list, name)) => (list, QueueKind::CustomPlaylist, name),
            None => (snapshot.all.clone(), QueueKind::AllLibrary, None),
        };
        if list.is_empty() {
            return;
        }
        let start = list.position_of_key(&self.last_track_key).unwrap_or(0);
        self.active_playlist = playlist;
        self.queue.set_queue(&list, start, kind);
        self.emit_queue_replaced();
    }

    /// Snapshot for `state.toml`; written once at teardown by the caller.
    pub fn save_state(&self) -> PersistentState {
        PersistentState {
            last_queue_kind: self.queue.kind(),
            last_playlist: self.active_playlist.clone(),
            last_track_key: self
                .queue
                .current()
                .map(|t| t.key.clone())
                .unwrap_or_default(),
            volume: self.volume,
            loop_mode: self.mode,
        }
    }

    // ── play intents ─────────────────────────────────────────────

    pub async fn play_all(&mut self, index: usize) {
        let all = self.library.snapshot().all.clone();
        self.active_playlist = None;
        self.play_from(&all, index, QueueKind::AllLibrary).await;
    }

    /// Shuffle-all synthesizes a fresh sequence every time, so repeating the
    /// intent always reshuffles instead of keeping continuity.
    pub async fn play_all_shuffled(&mut self) {
        let mut tracks = self.library.snapshot().all.tracks().to_vec();
        tracks.shuffle(&mut rand::thread_rng());
        let shuffled = TrackList::new(tracks);
        self.active_playlist = None;
        self.play_from(&shuffled, 0, QueueKind::AllLibrary).await;
    }

    pub async fn play_album(&mut self, artist: &str, title: &str, index: usize) {
        let snapshot = self.library.snapshot();
        let Some(album) = snapshot.find_album(artist, title) else {
            debug!("ignoring play request for unknown album {artist} - {title}");
            return;
        };
        let list = album.tracks.clone();
        self.active_playlist = None;
        self.play_from(&list, index, QueueKind::AlbumCard).await;
    }

    pub async fn play_playlist(&mut self, name: &str, index: usize) {
        let snapshot = self.library.snapshot();
        let Some(playlist) = snapshot.find_playlist(name) else {
            debug!("ignoring play request for unknown playlist {name}");
            return;
        };
        let list = playlist.tracks.clone();
        self.active_playlist = Some(name.to_string());
        self.play_from(&list, index, QueueKind::CustomPlaylist).await;
    }

    /// Reset the queue to a single song.
    pub async fn play_song_card(&mut self, track: Arc<Track>) {
        let list = TrackList::new(vec![track]);
        self.active_playlist = None;
        self.play_from(&list, 0, QueueKind::SongCard).await;
    }

    pub async fn play_local_search_result(&mut self, index: usize) {
        let Some(list) = self.local_search.clone() else {
            return;
        };
        self.active_playlist = None;
        self.play_from(&list, index, QueueKind::SearchLocal).await;
    }

    pub async fn play_online_search_result(&mut self, index: usize) {
        let Some(list) = self.online_search.clone() else {
            return;
        };
        self.active_playlist = None;
        self.play_from(&list, index, QueueKind::SearchOnline).await;
    }

    /// The general rule for every "play X" intent: replace the queue only
    /// when the request targets a different logical queue; re-entering the
    /// active one just moves the cursor, preserving continuity.
    async fn play_from(&mut self, source: &TrackList, index: usize, kind: QueueKind) {
        if !self.queue.is_same_queue(source, kind) {
            self.queue.set_queue(source, index, kind);
            self.emit_queue_replaced();
        } else if self.queue.position() != Some(index) {
            match self.queue.set_position(index) {
                Ok(()) => {
                    self.bus.emit(SessionEvent::PositionChanged { index });
                }
                Err(e) => {
                    debug_assert!(false, "play intent with invalid index: {e}");
                    warn!("ignoring play intent with invalid index: {e}");
                    return;
                }
            }
        }
        self.start_playback().await;
    }

    /// Kick the player for the current slot, resolving a placeholder first.
    /// Every failure is absorbed here and surfaced as a notification.
    async fn start_playback(&mut self) {
        let Some(index) = self.queue.position() else {
            return;
        };

        if self.queue.current().is_some_and(|t| t.is_pending()) {
            let resolved = self
                .tasks
                .resolve_and_apply(
                    &mut self.queue,
                    index,
                    self.resolver.clone(),
                    self.quality,
                )
                .await;
            match resolved {
                Ok(track) => {
                    // Every other holder of the same logical slot gets the
                    // resolved track before playback starts.
                    if let Some(list) = self.online_search.as_mut() {
                        list.patch_by_key(&track);
                    }
                    self.bus.emit(SessionEvent::SlotUpdated {
                        index,
                        key: track.key.clone(),
                    });
                }
                Err(e) => {
                    warn!("{e}");
                    let _ = self.player.pause();
                    let key = self
                        .queue
                        .current()
                        .map(|t| t.key.clone())
                        .unwrap_or_default();
                    self.bus.emit(SessionEvent::PlaybackUnavailable {
                        key,
                        message: e.to_string(),
                    });
                    return;
                }
            }
        }

        if let Some(track) = self.queue.current().cloned() {
            if let Err(e) = self.player.load_and_play(&track) {
                let err = SessionError::MediaUnavailable(e.to_string());
                warn!("{err}");
                self.bus.emit(SessionEvent::PlaybackUnavailable {
                    key: track.key.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    // ── queue editing intents ────────────────────────────────────

    pub async fn skip_next(&mut self) {
        if let Some(index) = self.queue.advance(self.mode) {
            self.bus.emit(SessionEvent::PositionChanged { index });
            self.start_playback().await;
        }
    }

    pub async fn skip_previous(&mut self) {
        if let Some(index) = self.queue.retreat(self.mode) {
            self.bus.emit(SessionEvent::PositionChanged { index });
            self.start_playback().await;
        }
    }

    /// "Play next": insert right after the current track. Editing a playing
    /// queue never restarts the current track; playback only starts when the
    /// queue was empty before the edit.
    pub async fn play_next(&mut self, tracks: Vec<Arc<Track>>) {
        if tracks.is_empty() {
            return;
        }
        let was_empty = self.queue.is_empty();
        let at = self.queue.position().map(|p| p + 1).unwrap_or(0);
        self.queue.insert_at(at, &tracks);
        if was_empty {
            let _ = self.queue.set_position(0);
        }
        self.emit_queue_replaced();
        if was_empty {
            self.start_playback().await;
        }
    }

    pub async fn append_to_queue(&mut self, tracks: Vec<Arc<Track>>) {
        if tracks.is_empty() {
            return;
        }
        let was_empty = self.queue.is_empty();
        self.queue.append(&tracks);
        if was_empty {
            let _ = self.queue.set_position(0);
        }
        self.emit_queue_replaced();
        if was_empty {
            self.start_playback().await;
        }
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.active_playlist = None;
        let _ = self.player.pause();
        self.emit_queue_replaced();
    }

    /// Local files vanished from disk; drop them from the live queue.
    pub fn remove_deleted_files(&mut self, keys: &[String]) {
        let gone: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let removed = self.queue.remove_where(|t| gone.contains(t.key.as_str()));
        if removed > 0 {
            self.emit_queue_replaced();
        }
    }

    // ── search ───────────────────────────────────────────────────

    /// Search the indexed library; the returned list is the canonical
    /// sequence for subsequent `play_local_search_result` intents.
    pub fn search_local(&mut self, query: &str) -> TrackList {
        let snapshot = self.library.snapshot();
        let results = search::search_tracks(&snapshot, query, self.search_limit);
        self.local_search = Some(results.clone());
        results
    }

    /// Online results come from the external crawler; the session keeps the
    /// canonical list so resolved URLs propagate back into it.
    pub fn set_online_search_results(&mut self, tracks: Vec<Arc<Track>>) -> TrackList {
        let list = TrackList::new(tracks);
        self.online_search = Some(list.clone());
        list
    }

    // ── navigation intents ───────────────────────────────────────

    pub fn enter_view(&mut self, frame: Frame) {
        // Re-selecting the active view is a no-op; don't renotify.
        if *self.nav.top() == frame {
            return;
        }
        self.nav.push(frame);
        self.bus.emit(SessionEvent::NavigationChanged {
            depth: self.nav.depth(),
            top: *self.nav.top(),
        });
    }

    /// One back-action, applying the collapse rule. Underflow means we are
    /// already at the root: not an error, just "hide the back affordance".
    pub fn navigate_back(&mut self) {
        match self.nav.back() {
            Ok(top) => self.bus.emit(SessionEvent::NavigationChanged {
                depth: self.nav.depth(),
                top,
            }),
            Err(SessionError::StackUnderflow) => {
                debug!("back requested at navigation root");
                self.bus.emit(SessionEvent::NavigationChanged {
                    depth: 1,
                    top: *self.nav.top(),
                });
            }
            Err(e) => warn!("unexpected navigation failure: {e}"),
        }
    }

    // ── playlist intents ─────────────────────────────────────────

    /// Add songs to a saved playlist, asking the user what to do about
    /// duplicates. When the target playlist is also the active queue, the
    /// live queue grows with it so the two stay consistent.
    pub fn add_songs_to_playlist(
        &mut self,
        name: &str,
        tracks: Vec<Arc<Track>>,
        confirm: &dyn DuplicateConfirm,
    ) -> bool {
        let snapshot = self.library.snapshot();
        let Some(playlist) = snapshot.find_playlist(name) else {
            debug!("no such playlist: {name}");
            return false;
        };
        let existing: HashSet<String> = playlist
            .tracks
            .tracks()
            .iter()
            .map(|t| t.key.clone())
            .collect();

        let diff = playlist_diff::diff(&tracks, &existing);
        let chosen = if diff.duplicate_count > 0 {
            match confirm.confirm(tracks.len(), diff.duplicate_count) {
                DuplicateDecision::AddAll => tracks,
                DuplicateDecision::OnlyNew => diff.to_add,
            }
        } else {
            diff.to_add
        };
        if chosen.is_empty() {
            return false;
        }

        if !self.library.add_songs_to_playlist(name, &chosen) {
            return false;
        }

        if self.queue.kind() == QueueKind::CustomPlaylist
            && self.active_playlist.as_deref() == Some(name)
        {
            self.queue.append(&chosen);
            self.emit_queue_replaced();
        }
        true
    }

    // ── background tasks ─────────────────────────────────────────

    /// Selected music folders changed; fire a rescan pass.
    pub fn rescan(&mut self, directories: Vec<PathBuf>) {
        self.music_directories = directories.clone();
        self.tasks.start_rescan(directories);
    }

    /// Next worker completion notification. The session run loop awaits this
    /// alongside UI intents and feeds the result to `apply_task_event`.
    pub async fn next_task_event(&mut self) -> Option<TaskEvent> {
        self.task_events.recv().await
    }

    /// Apply a worker result on the session context.
    pub fn apply_task_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::RescanFinished {
                token,
                directories,
                result,
            } => {
                match self.tasks.finish_rescan(token, &directories) {
                    RescanDisposition::Stale | RescanDisposition::Superseded => return,
                    RescanDisposition::Current => {}
                }
                match result {
                    Ok(snapshot) => {
                        let (tracks, albums, playlists) = (
                            snapshot.all.len(),
                            snapshot.albums.len(),
                            snapshot.playlists.len(),
                        );
                        info!("library updated: {tracks} tracks, {albums} albums");
                        self.library.swap(snapshot);
                        self.bus.emit(SessionEvent::LibraryUpdated {
                            tracks,
                            albums,
                            playlists,
                        });
                    }
                    Err(e) => {
                        // Previous snapshot stays authoritative.
                        warn!("{e}");
                        self.bus.emit(SessionEvent::RescanFailed {
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn emit_queue_replaced(&mut self) {
        self.bus.emit(SessionEvent::QueueReplaced {
            kind: self.queue.kind(),
            len: self.queue.len(),
            position: self.queue.position(),
        });
    }
}

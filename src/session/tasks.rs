use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::library::{scanner, LibrarySnapshot};
use crate::model::Track;
use crate::resolver::{Quality, Resolver};
use crate::session::error::SessionError;
use crate::session::queue::PlayQueue;

/// Completion notification from a background worker, consumed back on the
/// session context. Workers never touch the queue or the navigation stack
/// directly.
#[derive(Debug)]
pub enum TaskEvent {
    RescanFinished {
        token: u64,
        directories: Vec<PathBuf>,
        result: Result<LibrarySnapshot, SessionError>,
    },
}

/// What to do with a finished rescan pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescanDisposition {
    /// An even newer pass already started; this result is dead.
    Stale,
    /// The directory set changed while this pass ran; the result is
    /// discarded and a follow-up pass has been started.
    Superseded,
    /// Result of the latest request; apply it.
    Current,
}

/// Manages the two background workers: the library rescan pass and the
/// online-URL resolution. At most one of each is in flight; newer requests
/// supersede older ones, and stale results are filtered by a monotonically
/// increasing token.
pub struct TaskCoordinator {
    events_tx: mpsc::UnboundedSender<TaskEvent>,
    playlist_dir: PathBuf,
    scan_token: u64,
    inflight_scan: Option<u64>,
    requested_dirs: Vec<PathBuf>,
    resolution_token: u64,
}

impl TaskCoordinator {
    pub fn new(playlist_dir: PathBuf) -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                events_tx: tx,
                playlist_dir,
                scan_token: 0,
                inflight_scan: None,
                requested_dirs: Vec::new(),
                resolution_token: 0,
            },
            rx,
        )
    }

    /// Fire-and-forget rescan of the given root directories.
    ///
    /// If a pass is already running the request is remembered instead of
    /// spawning a second worker; when the running pass lands, a follow-up
    /// pass picks up the most recent directory set. The latest request is
    /// never silently dropped.
    pub fn start_rescan(&mut self, directories: Vec<PathBuf>) {
        self.requested_dirs = directories.clone();
        if self.inflight_scan.is_some() {
            debug!("rescan already running; queued {} directories", directories.len());
            return;
        }
        self.spawn_scan(directories);
    }

    fn spawn_scan(&mut self, directories: Vec<PathBuf>) {
        self.scan_token += 1;
        let token = self.scan_token;
        self.inflight_scan = Some(token);
        info!("starting library scan pass {token} over {} directories", directories.len());

        let tx = self.events_tx.clone();
        let playlist_dir = self.playlist_dir.clone();
        tokio::task::spawn_blocking(move || {
            let result = scanner::scan_directories(&directories, &playlist_dir);
            // Receiver gone means the session is shutting down.
            let _ = tx.send(TaskEvent::RescanFinished {
                token,
                directories,
                result,
            });
        });
    }

    /// Book-keeping for a finished pass. Must be called before the result is
    /// applied; only `Current` results may be swapped in.
    pub fn finish_rescan(&mut self, token: u64, directories: &[PathBuf]) -> RescanDisposition {
        if self.inflight_scan != Some(token) {
            debug!("discarding stale rescan result (pass {token})");
            return RescanDisposition::Stale;
        }
        self.inflight_scan = None;

        if self.requested_dirs != directories {
            debug!("directory set changed during pass {token}; rescanning");
            let dirs = self.requested_dirs.clone();
            self.spawn_scan(dirs);
            return RescanDisposition::Superseded;
        }
        RescanDisposition::Current
    }

    pub fn rescan_in_flight(&self) -> bool {
        self.inflight_scan.is_some()
    }

    /// Resolve the placeholder at `index` and swap the queue slot for its
    /// resolved counterpart.
    ///
    /// Synchronous from the caller's point of view: the session context
    /// suspends here until the worker returns, because playback cannot
    /// proceed without a URL. Re-entrant intents queue behind the session
    /// borrow instead of interleaving. Latest request wins: a result landing
    /// after a newer request started is discarded. On failure the slot stays
    /// pending and neither kind nor position is touched.
    pub async fn resolve_and_apply(
        &mut self,
        queue: &mut PlayQueue,
        index: usize,
        resolver: Arc<dyn Resolver>,
        quality: Quality,
    ) -> Result<Arc<Track>, SessionError> {
        let track = queue
            .tracks()
            .get(index)
            .cloned()
            .ok_or(SessionError::IndexOutOfRange {
                index,
                len: queue.len(),
            })?;
        if !track.is_pending() {
            return Ok(track);
        }

        self.resolution_token += 1;
        let token = self.resolution_token;
        debug!("resolving online source for {} (request {token})", track.key);

        let worker_track = (*track).clone();
        let handle =
            tokio::task::spawn_blocking(move || resolver.resolve(&worker_track, quality));
        let outcome = handle.await.map_err(|e| SessionError::ResolutionFailed {
            key: track.key.clone(),
            message: e.to_string(),
        })?;

        if token != self.resolution_token {
            return Err(SessionError::ResolutionFailed {
                key: track.key.clone(),
                message: "superseded by a newer resolution request".to_string(),
            });
        }

        match outcome {
            Ok(source) => {
                let resolved = Arc::new(track.resolved(&source.url, source.cover_path));
                queue.replace_at(index, resolved.clone())?;
                Ok(resolved)
            }
            Err(e) => Err(SessionError::ResolutionFailed {
                key: track.key.clone(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn superseded_pass_is_discarded_and_rerun() {
        let music_a = tempfile::tempdir().unwrap();
        let music_b = tempfile::tempdir().unwrap();
        let playlists = tempfile::tempdir().unwrap();

        let (mut tasks, mut rx) = TaskCoordinator::new(playlists.path().to_path_buf());
        let set_a = vec![music_a.path().to_path_buf()];
        let set_ab = vec![music_a.path().to_path_buf(), music_b.path().to_path_buf()];

        tasks.start_rescan(set_a.clone());
        // Supersede while the first pass is (possibly still) running.
        tasks.start_rescan(set_ab.clone());

        let mut applied = Vec::new();
        while applied.is_empty() {
            let TaskEvent::RescanFinished {
                token,
                directories,
                result,
            } = rx.recv().await.unwrap();
            assert!(result.is_ok());
            if tasks.finish_rescan(token, &directories) == RescanDisposition::Current {
                applied.push(directories);
            }
        }

        // Exactly one applied pass, and it reflects the latest request.
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0], set_ab);
        assert!(rx.try_recv().is_err());
    }
}

use serde::{Deserialize, Serialize};

use crate::player::PlaybackMode;
use crate::session::queue::QueueKind;

/// Automatically saved session state
/// stored in `state.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentState {
    /// Queue kind active when the last session ended; startup rebuilds a
    /// queue of this kind when it can.
    #[serde(default)]
    pub last_queue_kind: QueueKind,
    /// Saved playlist that was playing at teardown, so a custom-playlist
    /// queue can be rebuilt by name.
    #[serde(default)]
    pub last_playlist: Option<String>,
    /// Unique key of the track that was current at teardown; used to re-seat
    /// the position when the restored queue still contains it.
    #[serde(default)]
    pub last_track_key: String,
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default)]
    pub loop_mode: PlaybackMode,
}

fn default_volume() -> u8 {
    50
}

impl Default for PersistentState {
    fn default() -> Self {
        Self {
            last_queue_kind: QueueKind::None,
            last_playlist: None,
            last_track_key: String::new(),
            volume: 50,
            loop_mode: PlaybackMode::default(),
        }
    }
}

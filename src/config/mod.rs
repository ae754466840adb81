use std::fs;
use std::path::PathBuf;

use tracing::warn;

pub mod persistence;
pub mod user;

pub use persistence::PersistentState;
pub use user::UserConfig;

pub struct AppConfig;

impl AppConfig {
    pub fn get_config_dir() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let xdg_dir = home.join(".config").join("taal");

        // Ensure it exists
        if !xdg_dir.exists() {
            let _ = fs::create_dir_all(&xdg_dir);
        }

        xdg_dir
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_state_path() -> PathBuf {
        Self::get_config_dir().join("state.toml")
    }

    pub fn get_playlist_dir() -> PathBuf {
        let dir = Self::get_config_dir().join("playlists");
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        dir
    }

    /// Load user config and persisted session state, creating a default
    /// `config.toml` on first run.
    pub fn load() -> (UserConfig, PersistentState) {
        let config_path = Self::get_config_path();
        let state_path = Self::get_state_path();

        let user_config = if config_path.exists() {
            if let Ok(content) = fs::read_to_string(&config_path) {
                toml::from_str(&content).unwrap_or_else(|_| UserConfig::default())
            } else {
                UserConfig::default()
            }
        } else {
            let c = UserConfig::default();
            if let Ok(content) = toml::to_string_pretty(&c) {
                let _ = fs::write(&config_path, content);
            }
            c
        };

        let state = if state_path.exists() {
            if let Ok(content) = fs::read_to_string(&state_path) {
                toml::from_str(&content).unwrap_or_else(|_| PersistentState::default())
            } else {
                PersistentState::default()
            }
        } else {
            PersistentState::default()
        };

        (user_config, state)
    }

    /// Written once at session teardown.
    pub fn save_state(state: &PersistentState) {
        match toml::to_string_pretty(state) {
            Ok(content) => {
                if let Err(e) = fs::write(Self::get_state_path(), content) {
                    warn!("failed to write state.toml: {e}");
                }
            }
            Err(e) => warn!("failed to serialize session state: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlaybackMode;
    use crate::session::queue::QueueKind;

    #[test]
    fn state_round_trips_through_toml() {
        let state = PersistentState {
            last_queue_kind: QueueKind::CustomPlaylist,
            last_playlist: Some("Gym".to_string()),
            last_track_key: "/music/a.flac".to_string(),
            volume: 72,
            loop_mode: PlaybackMode::LoopAll,
        };
        let text = toml::to_string_pretty(&state).unwrap();
        let back: PersistentState = toml::from_str(&text).unwrap();
        assert_eq!(back.last_queue_kind, QueueKind::CustomPlaylist);
        assert_eq!(back.last_playlist.as_deref(), Some("Gym"));
        assert_eq!(back.last_track_key, "/music/a.flac");
        assert_eq!(back.volume, 72);
        assert_eq!(back.loop_mode, PlaybackMode::LoopAll);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: PersistentState = toml::from_str("volume = 30\n").unwrap();
        assert_eq!(state.volume, 30);
        assert_eq!(state.last_queue_kind, QueueKind::None);
        assert_eq!(state.loop_mode, PlaybackMode::Sequential);

        let config: UserConfig = toml::from_str("search_limit = 10\n").unwrap();
        assert_eq!(config.search_limit, 10);
    }
}

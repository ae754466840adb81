use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resolver::Quality;

/// User-editable settings, stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Root directories the library scanner indexes.
    #[serde(default = "default_music_directories")]
    pub music_directories: Vec<PathBuf>,
    /// Stream quality requested from the online resolver.
    #[serde(default)]
    pub online_play_quality: Quality,
    /// Cap on local search result pages.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_music_directories() -> Vec<PathBuf> {
    dirs::audio_dir().into_iter().collect()
}

fn default_search_limit() -> usize {
    50
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            music_directories: default_music_directories(),
            online_play_quality: Quality::default(),
            search_limit: default_search_limit(),
        }
    }
}

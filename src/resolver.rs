use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::Track;

/// Requested stream quality for online playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    #[default]
    Standard,
    High,
    SuperQuality,
}

/// What the resolver hands back for a placeholder track.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub url: String,
    pub cover_path: Option<String>,
}

/// Turns an online placeholder into something playable.
///
/// Implementations do the actual crawling/HTTP work and are free to block;
/// the coordinator always calls this off the session context.
pub trait Resolver: Send + Sync {
    fn resolve(&self, track: &Track, quality: Quality) -> Result<ResolvedSource>;
}

/// A resolver for sessions without online playback. Every request fails,
/// which the session reports as "can't play this track".
#[derive(Debug, Default)]
pub struct NullResolver;

impl Resolver for NullResolver {
    fn resolve(&self, track: &Track, _quality: Quality) -> Result<ResolvedSource> {
        anyhow::bail!("no resolver configured for online track {}", track.key)
    }
}

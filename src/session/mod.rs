pub mod error;
pub mod events;
pub mod navigation;
pub mod playlist_diff;
pub mod queue;
pub mod tasks;

pub mod orchestrator;
pub use orchestrator::*;

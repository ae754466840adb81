pub mod config;
pub mod library;
pub mod model;
pub mod player;
pub mod resolver;
pub mod search;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use human_panic::setup_panic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taal::config::{AppConfig, UserConfig};
use taal::player::NullPlayer;
use taal::resolver::NullResolver;
use taal::session::Session;

/// Taal - the playback-session core, driven headless 🎛️
#[derive(Parser, Debug)]
#[command(name = "taal", version, about)]
struct Args {
    /// Scan these directories instead of the configured ones
    #[arg(long, short = 'd')]
    music_dir: Vec<PathBuf>,

    /// Generate default config.toml to stdout
    #[arg(long)]
    generate_config: bool,
}

fn init_logging() -> Result<()> {
    let log_dir = AppConfig::get_config_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "taal.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,taal=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // The guard flushes on drop; keep it alive for the whole run.
    std::mem::forget(guard);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_panic!();

    let args = Args::parse();
    if args.generate_config {
        print!("{}", toml::to_string_pretty(&UserConfig::default())?);
        return Ok(());
    }

    init_logging()?;

    let (mut user_config, state) = AppConfig::load();
    if !args.music_dir.is_empty() {
        user_config.music_directories = args.music_dir.clone();
    }
    info!(
        "starting session over {} directories",
        user_config.music_directories.len()
    );

    let mut session = Session::new(
        user_config,
        state,
        AppConfig::get_playlist_dir(),
        Arc::new(NullPlayer),
        Arc::new(NullResolver),
    );
    let mut events = session.subscribe();
    session.initialize().await;

    let snapshot = session.library().snapshot();
    println!(
        "{} tracks, {} albums, {} playlists",
        snapshot.all.len(),
        snapshot.albums.len(),
        snapshot.playlists.len()
    );
    if let Some(track) = session.queue().current() {
        println!("restored position: {} - {}", track.artist, track.title);
    }
    while let Ok(event) = events.try_recv() {
        println!("event: {event:?}");
    }

    AppConfig::save_state(&session.save_state());
    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tidetrack_core::TrackerConfig;

#[derive(Parser)]
#[command(name = "tidetrack")]
#[command(about = "TIDAL playback timecode tracker")]
struct Args {
    /// Configuration file (JSON); a missing file falls back to defaults
    #[arg(short, long, default_value = "tidetrack.json")]
    config: PathBuf,

    /// Override the target process name from the config
    #[arg(long)]
    process_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tidetrack=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match TrackerConfig::load(&args.config) {
        Ok(c) => {
            info!("Loaded config from {:?}", args.config);
            c
        }
        Err(e) => {
            if !e.is_not_found() {
                warn!("Failed to load config: {}, using defaults", e);
            }
            TrackerConfig::default()
        }
    };
    if let Some(name) = args.process_name {
        config.process_name = name;
    }

    run(config).await
}

#[cfg(target_os = "windows")]
async fn run(config: TrackerConfig) -> Result<()> {
    use tidetrack_core::{Poller, SongInfo, SystemProcessProvider, TrackObserver};
    use tokio_util::sync::CancellationToken;

    struct ConsoleObserver;

    impl TrackObserver for ConsoleObserver {
        fn on_song_changed(&mut self, _old: Option<&SongInfo>, new: Option<&SongInfo>) {
            match new {
                Some(song) => println!("Now playing: {song}"),
                None => println!("Nothing playing"),
            }
        }

        fn on_timecode_changed(&mut self, _old: Option<f64>, new: Option<f64>) {
            if let Some(secs) = new {
                let minutes = (secs / 60.0).floor() as u64;
                println!("  {}:{:05.2}", minutes, secs - (minutes * 60) as f64);
            }
        }
    }

    info!(
        "tidetrack {} - waiting for {}",
        env!("CARGO_PKG_VERSION"),
        config.process_name
    );

    let provider = SystemProcessProvider::new(config.max_timecode_secs);
    let poller = Poller::new(provider, &config);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping...");
            signal_token.cancel();
        }
    });

    let mut observer = ConsoleObserver;
    poller.run(&mut observer, shutdown).await;

    info!("Shutdown complete");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
async fn run(_config: TrackerConfig) -> Result<()> {
    anyhow::bail!("live tracking requires Windows; the target player only runs there")
}

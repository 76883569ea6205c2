//! Fixed-cadence coordinator tying process resolution, song tracking and
//! address discovery together

mod song;

pub use song::{SongInfo, parse_window_title};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::discovery::{DiscoveryEngine, DiscoveryOutcome, ElapsedClock};
use crate::memory::ReadMemory;
use crate::process::{ProcessProvider, ProcessQuery};

/// Change notifications raised by the poller, delivered synchronously
/// within the tick that produced them, at most one per tick. A song change
/// suppresses a simultaneous timecode change.
pub trait TrackObserver {
    fn on_song_changed(&mut self, old: Option<&SongInfo>, new: Option<&SongInfo>);
    fn on_timecode_changed(&mut self, old: Option<f64>, new: Option<f64>);
}

/// State shared between the poller and the discovery task it spawned.
///
/// Written by the poller (clearing on process/track change) and by at most
/// one live run (setting on resolution). Both writers go through the one
/// mutex, and a new run cancel-and-replaces the previous token under that
/// lock, so at most one run is ever mid-flight.
#[derive(Debug, Default)]
struct SharedState {
    discovered: Option<u64>,
    run: Option<RunHandle>,
    generation: u64,
}

#[derive(Debug)]
struct RunHandle {
    cancel: CancellationToken,
    generation: u64,
}

impl SharedState {
    fn cancel_run(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel.cancel();
        }
    }
}

fn lock_shared(shared: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed-interval driver. Each tick re-resolves the player process, derives
/// the current song from its window title, reads the timecode once an
/// address is known, and starts a discovery run when a genuinely new track
/// appears with no address discovered yet.
pub struct Poller<P: ProcessProvider> {
    provider: P,
    process_name: String,
    poll_interval: Duration,
    scan_interval: Duration,
    process: Option<Arc<P::Proc>>,
    current_song: Option<SongInfo>,
    /// Raw track identity of the current song (trimmed window title)
    current_track: Option<String>,
    /// Most recent non-empty track identity; silence does not reset it
    last_track: Option<String>,
    current_timecode: Option<f64>,
    shared: Arc<Mutex<SharedState>>,
}

impl<P: ProcessProvider> Poller<P> {
    pub fn new(provider: P, config: &TrackerConfig) -> Self {
        Self {
            provider,
            process_name: config.process_name.clone(),
            poll_interval: config.poll_interval(),
            scan_interval: config.scan_interval(),
            process: None,
            current_song: None,
            current_track: None,
            last_track: None,
            current_timecode: None,
            shared: Arc::new(Mutex::new(SharedState::default())),
        }
    }

    pub fn current_song(&self) -> Option<&SongInfo> {
        self.current_song.as_ref()
    }

    pub fn current_timecode(&self) -> Option<f64> {
        self.current_timecode
    }

    pub fn discovered_address(&self) -> Option<u64> {
        lock_shared(&self.shared).discovered
    }

    /// Drive ticks at the poll cadence until `shutdown` fires.
    pub async fn run(mut self, observer: &mut impl TrackObserver, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.tick(observer),
            }
        }

        lock_shared(&self.shared).cancel_run();
        debug!("poller stopped");
    }

    /// One evaluation pass. Must run inside a tokio runtime because a new
    /// track spawns the discovery task.
    pub fn tick(&mut self, observer: &mut impl TrackObserver) {
        let process = self.resolve_process();

        let raw_title = process.as_ref().and_then(|p| p.window_title());
        let song = raw_title
            .as_deref()
            .and_then(|t| parse_window_title(t, &self.process_name));
        let identity = if song.is_some() {
            raw_title.as_deref().map(|t| t.trim().to_string())
        } else {
            None
        };

        let song_changed = identity != self.current_track;
        if song_changed {
            // The address belongs to the track it was discovered under;
            // any identity change (including track -> silence) invalidates
            // it and any run still narrowing toward it.
            let mut shared = lock_shared(&self.shared);
            shared.discovered = None;
            shared.cancel_run();
        }

        let timecode = match (&song, &process) {
            (Some(_), Some(proc)) => {
                let address = lock_shared(&self.shared).discovered;
                // A failed read clears the timecode for this tick only
                address.and_then(|a| proc.read_f64(a).ok())
            }
            _ => None,
        };

        if song_changed {
            debug!(
                "Song changed: {:?} -> {:?}",
                self.current_song.as_ref().map(|s| s.to_string()),
                song.as_ref().map(|s| s.to_string())
            );
            observer.on_song_changed(self.current_song.as_ref(), song.as_ref());
        } else if timecode != self.current_timecode {
            observer.on_timecode_changed(self.current_timecode, timecode);
        }

        // A genuinely new track (not a transition to silence) with no known
        // address starts a fresh discovery run.
        let new_track = identity.is_some() && identity != self.last_track;
        let no_address = lock_shared(&self.shared).discovered.is_none();
        if new_track
            && no_address
            && let Some(proc) = process.as_ref()
        {
            self.start_discovery(Arc::clone(proc));
        }

        if identity.is_some() {
            self.last_track = identity.clone();
        }
        self.current_track = identity;
        self.current_song = song;
        self.current_timecode = timecode;
    }

    /// Keep the current handle while it stays alive, otherwise re-resolve by
    /// name. An identity change invalidates the address, the active run and
    /// the remembered track.
    fn resolve_process(&mut self) -> Option<Arc<P::Proc>> {
        let previous_pid = self.process.as_ref().map(|p| p.id());
        let kept = self.process.take().filter(|p| p.is_alive());
        let resolved = kept.or_else(|| self.provider.resolve(&self.process_name));
        let pid = resolved.as_ref().map(|p| p.id());

        if pid != previous_pid {
            debug!(?previous_pid, ?pid, "target process changed");
            let mut shared = lock_shared(&self.shared);
            shared.discovered = None;
            shared.cancel_run();
            drop(shared);
            self.last_track = None;
        }

        self.process = resolved.clone();
        resolved
    }

    /// Cancel-and-replace the active run, then spawn a new engine seeded
    /// with a freshly started elapsed clock.
    fn start_discovery(&mut self, process: Arc<P::Proc>) {
        let cancel = CancellationToken::new();
        let generation = {
            let mut shared = lock_shared(&self.shared);
            shared.cancel_run();
            shared.generation += 1;
            shared.run = Some(RunHandle {
                cancel: cancel.clone(),
                generation: shared.generation,
            });
            shared.generation
        };

        info!(generation, "starting timecode discovery");
        let engine = DiscoveryEngine::new(
            process,
            ElapsedClock::start(),
            self.scan_interval,
            self.poll_interval,
            cancel.clone(),
        );
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            let outcome = engine.run().await;
            let mut state = lock_shared(&shared);
            if state
                .run
                .as_ref()
                .is_some_and(|r| r.generation == generation)
            {
                state.run = None;
            }
            match outcome {
                // The token is re-checked under the lock: a superseded run
                // racing past cancellation must not publish its address.
                DiscoveryOutcome::Resolved(address) if !cancel.is_cancelled() => {
                    info!("Discovered timecode address {:#x} (run {})", address, generation);
                    state.discovered = Some(address);
                }
                DiscoveryOutcome::Resolved(_) => {}
                DiscoveryOutcome::Failed => {
                    debug!(generation, "discovery failed; waiting for the next track");
                }
                DiscoveryOutcome::Cancelled => {}
            }
        });
    }
}

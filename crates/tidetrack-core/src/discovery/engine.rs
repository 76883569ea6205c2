use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::discovery::ElapsedClock;
use crate::error::Error;
use crate::memory::ReadMemory;
use crate::scan::{
    CandidateSet, ConstraintScanner, ConstraintSet, SnapshotSource, ValueKind, tolerance_margin,
};

/// Terminal result of one discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Narrowed to one or two candidates; the first in iteration order wins
    Resolved(u64),
    /// Narrowed to zero candidates; nothing matched the expected value
    /// trajectory. Terminal for this run, no automatic retry.
    Failed,
    /// Superseded or the process went away before a round committed
    Cancelled,
}

/// Two survivors are accepted: the player keeps duplicate representations
/// of the same value in some builds.
const MAX_RESOLVED_CANDIDATES: usize = 2;

/// The narrowing loop: `Idle -> Scanning -> {Resolved, Failed, Cancelled}`.
///
/// One engine drives exactly one run. Rounds fire on a fixed cadence and
/// never overlap: a round rearms only after its filter pass has committed.
/// The async filter is the only suspension point and honors the
/// cancellation token mid-flight, so a superseded run stops promptly
/// instead of finishing a scan whose result would be discarded.
pub struct DiscoveryEngine<P>
where
    P: ReadMemory + SnapshotSource,
{
    process: Arc<P>,
    clock: ElapsedClock,
    cadence: Duration,
    /// Symmetric window half-width, twice the poll interval; absorbs
    /// poll-interval and measurement jitter around the elapsed time
    margin: f64,
    cancel: CancellationToken,
}

impl<P> DiscoveryEngine<P>
where
    P: ReadMemory + SnapshotSource,
{
    pub fn new(
        process: Arc<P>,
        clock: ElapsedClock,
        cadence: Duration,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            process,
            clock,
            cadence,
            margin: tolerance_margin(poll_interval),
            cancel,
        }
    }

    /// Run to a terminal state, seeding from a fresh full snapshot.
    pub async fn run(self) -> DiscoveryOutcome {
        let seed = match self.process.snapshot(ValueKind::F64) {
            Ok(set) => set,
            Err(e) => {
                warn!("initial snapshot failed: {}", e);
                return DiscoveryOutcome::Failed;
            }
        };
        self.run_with_seed(seed).await
    }

    /// Run to a terminal state from an existing, possibly prefiltered set.
    pub async fn run_with_seed(self, seed: CandidateSet) -> DiscoveryOutcome {
        debug!(candidates = seed.len(), "discovery run started");

        let scanner = ConstraintScanner::new(self.process.as_ref());
        let mut candidates = seed;
        let mut rounds = 0u32;
        let mut ticker = tokio::time::interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!(rounds, "discovery run cancelled");
                    return DiscoveryOutcome::Cancelled;
                }
                _ = ticker.tick() => {}
            }

            let elapsed = self.clock.elapsed_secs();
            let window = ConstraintSet::window(elapsed, self.margin);
            let filtered = match scanner.filter(&candidates, &window, &self.cancel).await {
                Ok(set) => set,
                Err(Error::ScanCancelled) => {
                    debug!(rounds, "discovery run cancelled mid-filter");
                    return DiscoveryOutcome::Cancelled;
                }
                Err(e) => {
                    warn!("scan round failed: {}", e);
                    return DiscoveryOutcome::Failed;
                }
            };
            rounds += 1;

            match filtered.len() {
                0 => {
                    debug!(rounds, elapsed, "no candidate fit the value trajectory");
                    return DiscoveryOutcome::Failed;
                }
                n if n <= MAX_RESOLVED_CANDIDATES => {
                    let Some(front) = filtered.first() else {
                        return DiscoveryOutcome::Failed;
                    };
                    info!(
                        "Timecode address resolved: {:#x} ({} survivors, {} rounds)",
                        front.address, n, rounds
                    );
                    return DiscoveryOutcome::Resolved(front.address);
                }
                n => {
                    debug!(rounds, remaining = n, elapsed, "narrowing continues");
                    candidates = filtered;
                }
            }
        }
    }
}

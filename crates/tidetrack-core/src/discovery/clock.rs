use std::time::Instant;

/// Monotonic timer started the instant a track is first observed.
///
/// Owned exclusively by one discovery run; a superseding run starts its own.
#[derive(Debug, Clone)]
pub struct ElapsedClock {
    started: Instant,
}

impl ElapsedClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Seconds since the track started, as the scan's value estimate
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

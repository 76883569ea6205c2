//! # tidetrack-core
//!
//! Core library for the tidetrack playback tracker.
//!
//! This crate provides:
//! - Discovery of the playback timecode address inside the TIDAL process
//!   via iterative constraint scanning
//! - A fixed-cadence poller that tracks the current song and timecode
//! - Windows process memory reading
//!
//! The player never publishes the timecode, and its address moves between
//! launches (and possibly between tracks). The discovery engine finds it at
//! runtime: snapshot every plausible f64 cell, then each round keep only the
//! cells whose live value tracks the elapsed play time, until one (or two
//! mirrored) candidates remain.

pub mod config;
pub mod discovery;
pub mod error;
pub mod memory;
pub mod poller;
pub mod process;
pub mod scan;

pub use config::TrackerConfig;
pub use discovery::{DiscoveryEngine, DiscoveryOutcome, ElapsedClock};
pub use error::{Error, Result};
pub use memory::ReadMemory;
pub use poller::{Poller, SongInfo, TrackObserver, parse_window_title};
pub use process::{ProcessProvider, ProcessQuery};
pub use scan::{
    Candidate, CandidateSet, ConstraintScanner, ConstraintSet, ScanConstraint, SnapshotSource,
    ValueKind, tolerance_margin,
};

#[cfg(target_os = "windows")]
pub use process::windows::{SystemProcessProvider, WindowsProcess};

//! Target-process resolution and observation

#[cfg(target_os = "windows")]
pub mod windows;

use std::sync::Arc;

use crate::memory::ReadMemory;
use crate::scan::SnapshotSource;

/// Observable facts about a resolved target process.
///
/// The poller treats equality of `id` as the only meaningful identity
/// signal; everything else derived from the process is invalidated when
/// the id changes.
pub trait ProcessQuery {
    /// Stable identity for the lifetime of this process (the pid)
    fn id(&self) -> u32;

    /// Current top-level window title text, if the process has a window
    fn window_title(&self) -> Option<String>;

    /// Whether the process is still running
    fn is_alive(&self) -> bool;
}

/// Resolves the target player process by executable name.
///
/// Absence is a normal outcome; the poller keeps asking every tick until
/// the player shows up.
pub trait ProcessProvider {
    type Proc: ProcessQuery + ReadMemory + SnapshotSource + Send + Sync + 'static;

    fn resolve(&mut self, name: &str) -> Option<Arc<Self::Proc>>;
}

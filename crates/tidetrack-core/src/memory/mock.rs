//! In-memory fakes for exercising the scanner and poller without a live
//! player process.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::process::{ProcessProvider, ProcessQuery};
use crate::scan::{Candidate, CandidateSet, SnapshotSource, ValueKind};

/// Fake target process backed by a mutable map of f64 cells.
///
/// Cells live in a `BTreeMap` so snapshot iteration order is stable
/// (ascending address); the tie-break tests rely on that ordering.
#[derive(Debug)]
pub struct MockProcess {
    pid: u32,
    title: Mutex<Option<String>>,
    alive: AtomicBool,
    cells: Mutex<BTreeMap<u64, f64>>,
}

impl MockProcess {
    pub fn new(pid: u32) -> Arc<Self> {
        Arc::new(Self {
            pid,
            title: Mutex::new(None),
            alive: AtomicBool::new(true),
            cells: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn set_title(&self, title: Option<&str>) {
        *self.title.lock().unwrap() = title.map(str::to_string);
    }

    pub fn set_cell(&self, address: u64, value: f64) {
        self.cells.lock().unwrap().insert(address, value);
    }

    pub fn remove_cell(&self, address: u64) {
        self.cells.lock().unwrap().remove(&address);
    }

    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl ProcessQuery for MockProcess {
    fn id(&self) -> u32 {
        self.pid
    }

    fn window_title(&self) -> Option<String> {
        self.title.lock().unwrap().clone()
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl ReadMemory for MockProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if !self.is_alive() {
            return Err(Error::MemoryReadFailed {
                address,
                message: "process exited".to_string(),
            });
        }
        let cells = self.cells.lock().unwrap();
        match cells.get(&address) {
            Some(value) if size == 8 => Ok(value.to_le_bytes().to_vec()),
            _ => Err(Error::MemoryReadFailed {
                address,
                message: "unmapped".to_string(),
            }),
        }
    }
}

impl SnapshotSource for MockProcess {
    fn snapshot(&self, kind: ValueKind) -> Result<CandidateSet> {
        if !self.is_alive() {
            return Err(Error::SnapshotFailed("process exited".to_string()));
        }
        let cells = self.cells.lock().unwrap();
        let candidates = cells
            .iter()
            .map(|(&address, &value)| Candidate { address, value })
            .collect();
        Ok(CandidateSet::from_candidates(kind, candidates))
    }
}

/// Provider whose current process the test can swap out between ticks.
#[derive(Clone, Default)]
pub struct MockProcessProvider {
    current: Arc<Mutex<Option<Arc<MockProcess>>>>,
}

impl MockProcessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, process: Option<Arc<MockProcess>>) {
        *self.current.lock().unwrap() = process;
    }
}

impl ProcessProvider for MockProcessProvider {
    type Proc = MockProcess;

    fn resolve(&mut self, _name: &str) -> Option<Arc<MockProcess>> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .filter(|p| p.is_alive())
    }
}

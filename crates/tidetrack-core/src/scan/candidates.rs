use crate::error::Result;

/// Data type of the cells in a snapshot. The timecode is a double, which is
/// the only type scanned today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    F64,
}

impl ValueKind {
    /// Size of one cell of this type in bytes
    pub const fn size(self) -> usize {
        match self {
            ValueKind::F64 => 8,
        }
    }
}

/// A memory address plus the value observed there at snapshot or filter time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub address: u64,
    pub value: f64,
}

/// The surviving cells of a snapshot or of a filter round.
///
/// Each scan round replaces the whole set; the scanner never mutates its
/// input in place. Iteration order is the snapshot order, which the
/// resolution tie-break depends on.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    kind: ValueKind,
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            candidates: Vec::new(),
        }
    }

    pub fn from_candidates(kind: ValueKind, candidates: Vec<Candidate>) -> Self {
        Self { kind, candidates }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn first(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}

/// Produces an enumerable snapshot of a process's memory cells of one data
/// type, as the seed for a discovery run.
///
/// The call is synchronous and can take seconds on a real process: the
/// Windows implementation walks every committed writable region of the
/// target. The engine takes exactly one snapshot per run, on that run's
/// own task, before its first round; every later round only re-reads the
/// surviving cells through [`crate::memory::ReadMemory`]. Callers that
/// cannot tolerate occupying a worker for that long must offload the call.
pub trait SnapshotSource {
    fn snapshot(&self, kind: ValueKind) -> Result<CandidateSet>;
}

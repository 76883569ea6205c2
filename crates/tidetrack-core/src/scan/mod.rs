//! Value-constraint scanning over candidate memory cells

mod candidates;
mod constraint;
mod scanner;

pub use candidates::{Candidate, CandidateSet, SnapshotSource, ValueKind};
pub use constraint::{ConstraintSet, ScanConstraint, tolerance_margin};
pub use scanner::ConstraintScanner;

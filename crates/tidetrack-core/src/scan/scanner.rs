use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::scan::{Candidate, CandidateSet, ConstraintSet};

/// Candidates re-read between two cancellation checks
const CANCEL_CHECK_STRIDE: usize = 1024;

/// Re-reads a candidate set's live values and keeps the cells that satisfy
/// every constraint.
pub struct ConstraintScanner<'a, R: ReadMemory> {
    reader: &'a R,
}

impl<'a, R: ReadMemory> ConstraintScanner<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Filter `input` down to the cells whose current value satisfies
    /// `constraints`.
    ///
    /// The input set is left untouched; survivors come back as a fresh set
    /// carrying the re-read values. Cells that fail to read are dropped for
    /// this pass. Returns `Error::ScanCancelled` if the token fires before
    /// the pass commits; a cancelled pass produces no partial result.
    pub async fn filter(
        &self,
        input: &CandidateSet,
        constraints: &ConstraintSet,
        cancel: &CancellationToken,
    ) -> Result<CandidateSet> {
        if cancel.is_cancelled() {
            return Err(Error::ScanCancelled);
        }

        let mut survivors = CandidateSet::new(input.kind());
        for (index, candidate) in input.iter().enumerate() {
            if index % CANCEL_CHECK_STRIDE == 0 {
                if cancel.is_cancelled() {
                    return Err(Error::ScanCancelled);
                }
                // Stay cooperative on long sets
                tokio::task::yield_now().await;
            }

            let Ok(value) = self.reader.read_f64(candidate.address) else {
                continue;
            };
            if constraints.admits(value) {
                survivors.push(Candidate {
                    address: candidate.address,
                    value,
                });
            }
        }

        trace!(
            before = input.len(),
            after = survivors.len(),
            "constraint filter pass"
        );
        Ok(survivors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockProcess;
    use crate::scan::{SnapshotSource, ValueKind};

    #[tokio::test]
    async fn test_filter_keeps_only_admitted_values() {
        let process = MockProcess::new(1);
        process.set_cell(0x10, 29.5);
        process.set_cell(0x20, 120.0);
        process.set_cell(0x30, 31.0);

        let input = process.snapshot(ValueKind::F64).unwrap();
        let scanner = ConstraintScanner::new(&*process);
        let window = ConstraintSet::window(30.0, 4.0);

        let filtered = scanner
            .filter(&input, &window, &CancellationToken::new())
            .await
            .unwrap();

        let addresses: Vec<u64> = filtered.iter().map(|c| c.address).collect();
        assert_eq!(addresses, vec![0x10, 0x30]);
        // Input set is not mutated
        assert_eq!(input.len(), 3);
    }

    #[tokio::test]
    async fn test_filter_rereads_live_values() {
        let process = MockProcess::new(1);
        process.set_cell(0x10, 5.0);

        let input = process.snapshot(ValueKind::F64).unwrap();
        // The value moves after the snapshot; the filter sees the new one
        process.set_cell(0x10, 50.0);

        let scanner = ConstraintScanner::new(&*process);
        let window = ConstraintSet::window(6.0, 4.0);
        let filtered = scanner
            .filter(&input, &window, &CancellationToken::new())
            .await
            .unwrap();

        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn test_filter_drops_unreadable_cells() {
        let process = MockProcess::new(1);
        process.set_cell(0x10, 30.0);
        process.set_cell(0x20, 30.0);

        let input = process.snapshot(ValueKind::F64).unwrap();
        process.remove_cell(0x20);

        let scanner = ConstraintScanner::new(&*process);
        let window = ConstraintSet::window(30.0, 4.0);
        let filtered = scanner
            .filter(&input, &window, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.first().map(|c| c.address), Some(0x10));
    }

    #[tokio::test]
    async fn test_filter_honors_cancellation() {
        let process = MockProcess::new(1);
        process.set_cell(0x10, 30.0);

        let input = process.snapshot(ValueKind::F64).unwrap();
        let scanner = ConstraintScanner::new(&*process);
        let window = ConstraintSet::window(30.0, 4.0);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = scanner.filter(&input, &window, &cancel).await;
        assert!(matches!(result, Err(Error::ScanCancelled)));
    }

    #[tokio::test]
    async fn test_repeated_filtering_never_grows() {
        let process = MockProcess::new(1);
        for i in 0..16u64 {
            process.set_cell(0x100 + i * 8, i as f64);
        }

        let scanner = ConstraintScanner::new(&*process);
        let cancel = CancellationToken::new();
        let seed = process.snapshot(ValueKind::F64).unwrap();

        let round1 = scanner
            .filter(&seed, &ConstraintSet::window(8.0, 4.0), &cancel)
            .await
            .unwrap();
        let round2 = scanner
            .filter(&round1, &ConstraintSet::window(8.0, 2.0), &cancel)
            .await
            .unwrap();

        assert!(round1.len() <= seed.len());
        assert!(round2.len() <= round1.len());
    }
}

use std::time::Duration;

/// Direction of a relational bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintKind {
    AtMost,
    AtLeast,
}

/// A single relational bound on a candidate's current value.
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConstraint {
    kind: ConstraintKind,
    threshold: f64,
}

impl ScanConstraint {
    pub fn at_most(threshold: f64) -> Self {
        Self {
            kind: ConstraintKind::AtMost,
            threshold,
        }
    }

    pub fn at_least(threshold: f64) -> Self {
        Self {
            kind: ConstraintKind::AtLeast,
            threshold,
        }
    }

    pub fn admits(&self, value: f64) -> bool {
        match self.kind {
            ConstraintKind::AtMost => value <= self.threshold,
            ConstraintKind::AtLeast => value >= self.threshold,
        }
    }
}

/// Conjunction of bounds; a candidate survives only if its current value
/// satisfies every one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    constraints: Vec<ScanConstraint>,
}

impl ConstraintSet {
    /// The closed interval `[center - margin, center + margin]`.
    pub fn window(center: f64, margin: f64) -> Self {
        Self {
            constraints: vec![
                ScanConstraint::at_most(center + margin),
                ScanConstraint::at_least(center - margin),
            ],
        }
    }

    pub fn admits(&self, value: f64) -> bool {
        self.constraints.iter().all(|c| c.admits(value))
    }
}

/// Symmetric margin added around the expected elapsed-time value: two full
/// poll intervals, absorbing poll-interval and measurement jitter.
pub fn tolerance_margin(interval: Duration) -> f64 {
    2.0 * interval.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_admits_closed_interval() {
        // elapsed t = 30s, interval c = 2s: the window is [t - 2c, t + 2c]
        let margin = tolerance_margin(Duration::from_millis(2000));
        assert_eq!(margin, 4.0);

        let window = ConstraintSet::window(30.0, margin);
        assert!(window.admits(26.0));
        assert!(window.admits(30.0));
        assert!(window.admits(34.0));
        assert!(!window.admits(25.999));
        assert!(!window.admits(34.001));
    }

    #[test]
    fn test_window_rejects_non_finite() {
        let window = ConstraintSet::window(10.0, 4.0);
        assert!(!window.admits(f64::NAN));
        assert!(!window.admits(f64::INFINITY));
        assert!(!window.admits(f64::NEG_INFINITY));
    }

    #[test]
    fn test_window_lower_bound_may_go_negative() {
        // Early in a track the lower bound dips below zero; real timecodes
        // are non-negative so this only widens the admitted set.
        let window = ConstraintSet::window(1.0, 4.0);
        assert!(window.admits(0.0));
        assert!(window.admits(-2.9));
        assert!(!window.admits(5.1));
    }

    #[test]
    fn test_single_constraints() {
        assert!(ScanConstraint::at_most(5.0).admits(5.0));
        assert!(!ScanConstraint::at_most(5.0).admits(5.1));
        assert!(ScanConstraint::at_least(5.0).admits(5.0));
        assert!(!ScanConstraint::at_least(5.0).admits(4.9));
    }

}

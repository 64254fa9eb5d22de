//! Difficulty curve: a pure function of play time and score
//!
//! No RNG, no hidden state, so generation driven by it stays reproducible.

use serde::{Deserialize, Serialize};

use crate::tuning::TuningError;

/// Shape of the difficulty ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DifficultyCurve {
    /// Blend of log(score) and log(time), saturating at `cap`
    Logarithmic {
        score_weight: f32,
        time_weight: f32,
        cap: f32,
    },
    /// Time only, growing linearly until `cap`
    Linear { per_second: f32, cap: f32 },
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        DifficultyCurve::Logarithmic {
            score_weight: 0.3,
            time_weight: 0.2,
            cap: 5.0,
        }
    }
}

/// Floor of every curve
pub const BASE_DIFFICULTY: f32 = 1.0;

impl DifficultyCurve {
    /// Difficulty after `elapsed_ms` of play with `score` points
    pub fn compute(&self, elapsed_ms: f64, score: u64) -> f32 {
        let seconds = (elapsed_ms.max(0.0) / 1000.0) as f32;
        let raw = match *self {
            DifficultyCurve::Logarithmic {
                score_weight,
                time_weight,
                ..
            } => {
                let score_factor = (score as f32 + 1.0).ln() * score_weight;
                let time_factor = (seconds + 1.0).ln() * time_weight;
                BASE_DIFFICULTY + score_factor + time_factor
            }
            DifficultyCurve::Linear { per_second, .. } => BASE_DIFFICULTY + seconds * per_second,
        };
        raw.min(self.cap())
    }

    pub fn cap(&self) -> f32 {
        match *self {
            DifficultyCurve::Logarithmic { cap, .. } | DifficultyCurve::Linear { cap, .. } => cap,
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.cap() < BASE_DIFFICULTY {
            return Err(TuningError::Invalid("difficulty cap must be at least 1"));
        }
        let non_negative = match *self {
            DifficultyCurve::Logarithmic {
                score_weight,
                time_weight,
                ..
            } => score_weight >= 0.0 && time_weight >= 0.0,
            DifficultyCurve::Linear { per_second, .. } => per_second >= 0.0,
        };
        if !non_negative {
            return Err(TuningError::Invalid("difficulty weights must not be negative"));
        }
        Ok(())
    }
}

/// Points for passing an obstacle pair at this difficulty
#[inline]
pub fn pass_points(difficulty: f32) -> u64 {
    (1.0 + difficulty * 0.5).floor().max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_one() {
        let curve = DifficultyCurve::default();
        assert_eq!(curve.compute(0.0, 0), 1.0);
        let linear = DifficultyCurve::Linear { per_second: 0.1, cap: 10.0 };
        assert_eq!(linear.compute(0.0, 0), 1.0);
    }

    #[test]
    fn test_logarithmic_saturates_at_cap() {
        let curve = DifficultyCurve::default();
        assert_eq!(curve.compute(1.0e9, 1_000_000_000), 5.0);
    }

    #[test]
    fn test_linear_ignores_score() {
        let curve = DifficultyCurve::Linear { per_second: 0.1, cap: 10.0 };
        assert_eq!(curve.compute(10_000.0, 0), curve.compute(10_000.0, 9999));
        assert!((curve.compute(10_000.0, 0) - 2.0).abs() < 1e-5);
        assert_eq!(curve.compute(1.0e7, 0), 10.0);
    }

    #[test]
    fn test_deterministic() {
        let curve = DifficultyCurve::default();
        assert_eq!(curve.compute(12_345.0, 77), curve.compute(12_345.0, 77));
    }

    #[test]
    fn test_pass_points() {
        assert_eq!(pass_points(1.0), 1);
        assert_eq!(pass_points(2.0), 2);
        assert_eq!(pass_points(3.9), 2);
        assert_eq!(pass_points(5.0), 3);
    }

    #[test]
    fn test_rejects_cap_below_one() {
        let curve = DifficultyCurve::Linear { per_second: 0.1, cap: 0.5 };
        assert!(curve.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_monotonic_in_time(a in 0.0f64..1.0e7, b in 0.0f64..1.0e7, score in 0u64..100_000) {
            let curve = DifficultyCurve::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.compute(lo, score) <= curve.compute(hi, score));
            prop_assert!(curve.compute(hi, score) <= curve.cap());
        }

        #[test]
        fn prop_linear_monotonic_and_capped(a in 0.0f64..1.0e7, b in 0.0f64..1.0e7) {
            let curve = DifficultyCurve::Linear { per_second: 0.05, cap: 10.0 };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.compute(lo, 0) <= curve.compute(hi, 0));
            prop_assert!(curve.compute(hi, 0) <= 10.0);
        }

        #[test]
        fn prop_monotonic_in_score(t in 0.0f64..1.0e6, s1 in 0u64..1_000_000, s2 in 0u64..1_000_000) {
            let curve = DifficultyCurve::default();
            let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
            prop_assert!(curve.compute(t, lo) <= curve.compute(t, hi));
        }
    }
}

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a series' accumulator moves between steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DeltaPolicy {
    /// Whole-number step drawn uniformly from `[-bound, bound]`.
    BoundedWalk { bound: u32 },
    /// Step drawn uniformly from `[0, max)`. The series never decreases.
    NonNegative { max: f64 },
}

impl DeltaPolicy {
    /// Rejects parameters no step can be drawn from.
    pub fn check(&self) -> Result<(), String> {
        match *self {
            DeltaPolicy::NonNegative { max } if !max.is_finite() || max < 0.0 => Err(format!(
                "`max` must be a finite number of at least 0, got {max}"
            )),
            _ => Ok(()),
        }
    }

    pub fn delta<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            DeltaPolicy::BoundedWalk { bound } => {
                let bound = i64::from(bound);
                rng.random_range(-bound..=bound) as f64
            }
            DeltaPolicy::NonNegative { max } if max > 0.0 && max.is_finite() => {
                rng.random_range(0.0..max)
            }
            DeltaPolicy::NonNegative { .. } => 0.0,
        }
    }
}

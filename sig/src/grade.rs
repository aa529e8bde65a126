//! Named, weighted sub-scores ("impacts") which combine into a single grade.
//!
//! Impacts exist for explainability: when a support relation is graded, the individual geometric
//! contributions are kept alongside the combined value so that a user (or a log line) can see
//! *why* a candidate connection scored the way it did.

use std::fmt::{Display, Formatter};

/// One named contribution to a grade.  `value` is normally in `[0, 1]`, but may go negative when
/// a gap exceeds its configured maximum (which callers treat as failure).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub name: &'static str,
    pub weight: f64,
    pub value: f64,
}

/// An ordered sequence of [`Impact`]s, combined by weighted arithmetic mean.
///
/// The intrinsic ratio of support impacts is 1: the combined mean *is* the grade, with no extra
/// scaling layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradeImpacts {
    impacts: Vec<Impact>,
}

impl GradeImpacts {
    pub fn new(impacts: Vec<Impact>) -> Self {
        Self { impacts }
    }

    pub fn impacts(&self) -> &[Impact] {
        &self.impacts
    }

    /// The combined grade: `sum(weight * value) / sum(weight)`.  Zero-weight impacts contribute
    /// detail but no score.
    pub fn grade(&self) -> f64 {
        let weight_sum: f64 = self.impacts.iter().map(|i| i.weight).sum();
        if weight_sum == 0.0 {
            return 0.0;
        }
        let weighted: f64 = self.impacts.iter().map(|i| i.weight * i.value).sum();
        weighted / weight_sum
    }
}

impl Display for GradeImpacts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, impact) in self.impacts.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}:{:.2}", impact.name, impact.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impacts(pairs: &[(&'static str, f64, f64)]) -> GradeImpacts {
        GradeImpacts::new(
            pairs
                .iter()
                .map(|&(name, weight, value)| Impact {
                    name,
                    weight,
                    value,
                })
                .collect(),
        )
    }

    #[test]
    fn weighted_mean() {
        #[track_caller]
        fn check(pairs: &[(&'static str, f64, f64)], expected: f64) {
            assert!((impacts(pairs).grade() - expected).abs() < 1e-12);
        }
        check(&[("dx", 1.0, 0.5)], 0.5);
        check(&[("dx", 1.0, 1.0), ("dy", 1.0, 0.0)], 0.5);
        // A 4x weight on dy dominates the mean
        check(&[("dx", 1.0, 0.0), ("dy", 4.0, 1.0)], 0.8);
        // Negative values (beyond-limit gaps) propagate through
        check(&[("dx", 1.0, -0.5), ("dy", 1.0, 0.5)], 0.0);
    }

    #[test]
    fn empty_impacts_grade_zero() {
        assert_eq!(GradeImpacts::default().grade(), 0.0);
    }

    #[test]
    fn display() {
        let imp = impacts(&[("dx", 2.0, 0.25), ("dy", 1.0, 1.0)]);
        assert_eq!(imp.to_string(), "dx:0.25 dy:1.00");
    }
}

//! Gap-based connection scoring, the core algorithm of the subsystem.
//!
//! A candidate connection between two shapes is summarised by a signed horizontal gap `dx`
//! (positive = true separation, negative or zero = overlap) and an unsigned vertical gap `dy`,
//! both in interline fractions.  Each gap is turned into a normalised impact which decreases
//! linearly from 1 (touching) to 0 (at the configured maximum) and goes negative beyond it; the
//! impacts combine into the relation's grade through the kind's weights.

use crate::error::Error;
use crate::grade::{GradeImpacts, Impact};
use crate::relation::{Family, Relation, Tuning};

impl Relation {
    /// Score this connection from measured gaps, selecting the in- or out-branch on the sign of
    /// `dx` (`dx == 0` belongs to the out branch).
    ///
    /// Stores `dx`, `dy` and the impacts atomically and sets the grade to the combined value.
    /// Viability (`grade >= min_grade`) is caller policy, not enforced here.
    pub fn set_in_out_gaps(
        &mut self,
        dx: f64,
        dy: f64,
        profile: usize,
        tuning: &Tuning,
    ) -> crate::Result<()> {
        let kind = self.kind();
        if !matches!(kind.family(), Family::Connection | Family::StemConnection) {
            return Err(Error::NotGapScored { kind });
        }

        let spec = kind.spec();
        let y_max = tuning.y_max(kind, profile)?;
        let y_impact = (y_max - dy) / y_max;

        let (x_impact, x_name, weights) = if dx >= 0.0 {
            let x_max = tuning.x_out_max(kind, profile)?;
            ((x_max - dx) / x_max, "xOutGap", spec.out_weights)
        } else {
            let x_max = tuning.x_in_max(kind, profile)?;
            ((x_max + dx) / x_max, "xInGap", spec.in_weights)
        };

        let impacts = GradeImpacts::new(vec![
            Impact {
                name: x_name,
                weight: weights[0],
                value: x_impact,
            },
            Impact {
                name: "yGap",
                weight: weights[1],
                value: y_impact,
            },
        ]);
        let grade = impacts.grade();
        self.set_gaps(dx, dy);
        self.set_support(grade, Some(impacts));
        Ok(())
    }

    /// Pure-separation variant for kinds which draw no distinction between the two branches:
    /// the absolute value of `dx` is always scored as an out gap
    pub fn set_out_gaps(
        &mut self,
        dx: f64,
        dy: f64,
        profile: usize,
        tuning: &Tuning,
    ) -> crate::Result<()> {
        self.set_in_out_gaps(dx.abs(), dy, profile, tuning)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::relation::{GapTuning, RelationKind};

    fn scored(kind: RelationKind, dx: f64, dy: f64, profile: usize) -> Relation {
        let tuning = Tuning::default();
        let mut relation = Relation::new(kind);
        relation
            .set_in_out_gaps(dx, dy, profile, &tuning)
            .unwrap();
        relation
    }

    #[test]
    fn sign_selects_branch() {
        // BeamStem has distinct in/out maxima (0.5 vs 0.1), so the branch shows in the impacts
        let overlap = scored(RelationKind::BeamStem, -0.1, 0.0, 0);
        assert_eq!(overlap.impacts().unwrap().impacts()[0].name, "xInGap");
        // xImpact = (0.5 - 0.1) / 0.5
        assert!((overlap.impacts().unwrap().impacts()[0].value - 0.8).abs() < 1e-9);

        let separation = scored(RelationKind::BeamStem, 0.05, 0.0, 0);
        assert_eq!(separation.impacts().unwrap().impacts()[0].name, "xOutGap");
        // xImpact = (0.1 - 0.05) / 0.1
        assert!((separation.impacts().unwrap().impacts()[0].value - 0.5).abs() < 1e-9);

        // The boundary belongs to the out branch
        let touching = scored(RelationKind::BeamStem, 0.0, 0.0, 0);
        assert_eq!(touching.impacts().unwrap().impacts()[0].name, "xOutGap");
        assert!((touching.grade() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn round_trip_and_grade_consistency() {
        let relation = scored(RelationKind::HeadStem, 0.123456, 0.456789, 1);
        // Gaps are stored to 3 decimals
        assert_eq!(relation.dx(), Some(0.123));
        assert_eq!(relation.dy(), Some(0.457));
        // The relation's grade is exactly the impacts' combined grade
        assert_eq!(relation.grade(), relation.impacts().unwrap().grade());
    }

    #[test]
    fn out_gaps_variant_takes_absolute_value() {
        let negative = {
            let tuning = Tuning::default();
            let mut rel = Relation::new(RelationKind::FermataChord);
            rel.set_out_gaps(-0.3, 0.5, 0, &tuning).unwrap();
            rel
        };
        // Overlap scored identically to separation, on the out branch
        assert_eq!(negative.dx(), Some(0.3));
        assert_eq!(negative.impacts().unwrap().impacts()[0].name, "xOutGap");
    }

    #[test]
    fn beyond_limit_goes_negative() {
        let relation = scored(RelationKind::FlagStem, 0.5, 0.0, 0);
        // dx = 0.5 with x_out_max = 0.25 yields a negative x impact, dragging the grade down
        assert!(relation.impacts().unwrap().impacts()[0].value < 0.0);
        assert!(relation.grade() < relation.min_grade());
    }

    #[test]
    fn unsupported_overlap_fails_fast() {
        let tuning = Tuning::default();
        let mut relation = Relation::new(RelationKind::Augmentation);
        assert_eq!(
            relation.set_in_out_gaps(-0.1, 0.2, 0, &tuning),
            Err(Error::UnsupportedInGap {
                kind: RelationKind::Augmentation
            })
        );
        // Nothing was stored by the failed call
        assert_eq!(relation.gaps(), None);
    }

    #[test]
    fn zero_gap_max_fails_fast() {
        let tuning = Tuning::default().with_gaps(
            RelationKind::SlurHead,
            GapTuning::new(Some(&[0.5]), &[0.75], &[0.0]),
        );
        let mut relation = Relation::new(RelationKind::SlurHead);
        assert_eq!(
            relation.set_in_out_gaps(0.1, 0.1, 0, &tuning),
            Err(Error::ZeroGapMax {
                kind: RelationKind::SlurHead,
                gap: "y_max"
            })
        );
    }

    #[test]
    fn plain_kind_is_not_gap_scored() {
        let tuning = Tuning::default();
        let mut relation = Relation::new(RelationKind::Mirror);
        assert_eq!(
            relation.set_in_out_gaps(0.1, 0.1, 0, &tuning),
            Err(Error::NotGapScored {
                kind: RelationKind::Mirror
            })
        );
    }

    #[test]
    fn augmentation_ignores_horizontal_weight() {
        // Augmentation weights x at 0: only the vertical gap moves the grade
        let near = scored(RelationKind::Augmentation, 0.2, 0.1, 0);
        let far = scored(RelationKind::Augmentation, 1.4, 0.1, 0);
        assert_eq!(near.grade(), far.grade());
    }

    #[quickcheck]
    fn grade_monotonic_in_dx(seed: u8, step: u8) -> bool {
        // Holding dy fixed, a larger out-gap never scores better
        let dx1 = f64::from(seed % 100) / 1000.0;
        let dx2 = dx1 + f64::from(step % 50 + 1) / 1000.0;
        let g1 = scored(RelationKind::HeadStem, dx1, 0.2, 0).grade();
        let g2 = scored(RelationKind::HeadStem, dx2, 0.2, 0).grade();
        g2 <= g1
    }

    #[quickcheck]
    fn grade_monotonic_in_dy(seed: u8, step: u8) -> bool {
        let dy1 = f64::from(seed % 100) / 1000.0;
        let dy2 = dy1 + f64::from(step % 50 + 1) / 1000.0;
        let g1 = scored(RelationKind::HeadStem, 0.05, dy1, 0).grade();
        let g2 = scored(RelationKind::HeadStem, 0.05, dy2, 0).grade();
        g2 <= g1
    }
}

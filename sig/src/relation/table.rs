//! Per-kind behavior table and gap tuning.
//!
//! Everything a relation kind *is* lives in data, not in dispatch: one immutable [`KindSpec`]
//! per kind (looked up by tag) and one explicit [`Tuning`] value holding the profile-indexed gap
//! maxima, passed into the scoring functions rather than read from a global.

use std::collections::HashMap;

use crate::error::Error;

use super::{Family, RelationKind};

/// Default minimum viable grade for a scored connection
const MIN_GRADE: f64 = 0.1;

/// Static behavior of one relation kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindSpec {
    pub name: &'static str,
    pub family: Family,
    /// Seen from a target, at most one incoming edge of this kind
    pub single_source: bool,
    /// Seen from a source, at most one outgoing edge of this kind
    pub single_target: bool,
    pub source_coeff: f64,
    pub target_coeff: f64,
    pub min_grade: f64,
    /// Byproduct of automatic reduction; excluded from interactive suggestions
    pub reduction_only: bool,
    /// `[x, y]` impact weights for the overlap branch
    pub in_weights: [f64; 2],
    /// `[x, y]` impact weights for the separation branch
    pub out_weights: [f64; 2],
}

const fn plain(name: &'static str, ss: bool, st: bool, reduction_only: bool) -> KindSpec {
    KindSpec {
        name,
        family: Family::Plain,
        single_source: ss,
        single_target: st,
        source_coeff: 0.0,
        target_coeff: 0.0,
        min_grade: MIN_GRADE,
        reduction_only,
        in_weights: [0.0, 0.0],
        out_weights: [0.0, 0.0],
    }
}

const fn support(
    name: &'static str,
    ss: bool,
    st: bool,
    src: f64,
    tgt: f64,
    reduction_only: bool,
) -> KindSpec {
    KindSpec {
        name,
        family: Family::Support,
        single_source: ss,
        single_target: st,
        source_coeff: src,
        target_coeff: tgt,
        min_grade: MIN_GRADE,
        reduction_only,
        in_weights: [0.0, 0.0],
        out_weights: [0.0, 0.0],
    }
}

const fn connection(
    name: &'static str,
    ss: bool,
    st: bool,
    src: f64,
    tgt: f64,
    in_weights: [f64; 2],
    out_weights: [f64; 2],
) -> KindSpec {
    KindSpec {
        name,
        family: Family::Connection,
        single_source: ss,
        single_target: st,
        source_coeff: src,
        target_coeff: tgt,
        min_grade: MIN_GRADE,
        reduction_only: false,
        in_weights,
        out_weights,
    }
}

const fn stem_connection(
    name: &'static str,
    ss: bool,
    st: bool,
    src: f64,
    tgt: f64,
    in_weights: [f64; 2],
    out_weights: [f64; 2],
) -> KindSpec {
    KindSpec {
        name,
        family: Family::StemConnection,
        single_source: ss,
        single_target: st,
        source_coeff: src,
        target_coeff: tgt,
        min_grade: MIN_GRADE,
        reduction_only: false,
        in_weights,
        out_weights,
    }
}

impl RelationKind {
    pub const ALL: &'static [RelationKind] = &[
        RelationKind::Exclusion,
        RelationKind::NoExclusion,
        RelationKind::Mirror,
        RelationKind::Containment,
        RelationKind::StemAlignment,
        RelationKind::SameVoice,
        RelationKind::SeparateVoice,
        RelationKind::SameTime,
        RelationKind::SeparateTime,
        RelationKind::NextInVoice,
        RelationKind::ChordStem,
        RelationKind::ChordTuplet,
        RelationKind::ChordName,
        RelationKind::ChordSentence,
        RelationKind::ChordSyllable,
        RelationKind::ChordDynamics,
        RelationKind::ChordWedge,
        RelationKind::ChordOrnament,
        RelationKind::ChordArpeggiato,
        RelationKind::ChordArticulation,
        RelationKind::ChordGrace,
        RelationKind::BeamHead,
        RelationKind::ClefKey,
        RelationKind::KeyAlters,
        RelationKind::HeadHead,
        RelationKind::TimeTopBottom,
        RelationKind::EndingSentence,
        RelationKind::BarGroup,
        RelationKind::BarConnection,
        RelationKind::OctaveShiftChord,
        RelationKind::AlterHead,
        RelationKind::Augmentation,
        RelationKind::DoubleDot,
        RelationKind::DotFermata,
        RelationKind::RepeatDotBar,
        RelationKind::RepeatDotPair,
        RelationKind::EndingBar,
        RelationKind::FermataChord,
        RelationKind::FermataBar,
        RelationKind::SlurHead,
        RelationKind::MarkerBar,
        RelationKind::MultipleRestCount,
        RelationKind::BeamRest,
        RelationKind::HeadStem,
        RelationKind::BeamStem,
        RelationKind::FlagStem,
        RelationKind::TremoloStem,
    ];

    /// The behavior record for this kind
    pub fn spec(self) -> KindSpec {
        use RelationKind::*;
        match self {
            // Plain
            Exclusion => plain("Exclusion", false, false, false),
            NoExclusion => plain("NoExclusion", false, false, true),
            Mirror => plain("Mirror", true, true, false),
            Containment => plain("Containment", true, false, false),
            StemAlignment => plain("StemAlignment", true, true, true),
            SameVoice => plain("SameVoice", false, false, false),
            SeparateVoice => plain("SeparateVoice", false, false, false),
            SameTime => plain("SameTime", false, false, false),
            SeparateTime => plain("SeparateTime", false, false, false),
            NextInVoice => plain("NextInVoice", true, true, false),
            // Support
            ChordStem => support("ChordStem", true, true, 0.0, 0.0, false),
            // Target coefficient comes from the tuplet kind, see `Relation::target_coeff`
            ChordTuplet => support("ChordTuplet", false, true, 0.0, 0.0, false),
            ChordName => support("ChordName", true, true, 0.0, 2.0, false),
            ChordSentence => support("ChordSentence", true, false, 0.0, 0.0, false),
            ChordSyllable => support("ChordSyllable", true, false, 0.0, 2.0, false),
            ChordDynamics => support("ChordDynamics", true, false, 0.0, 3.0, false),
            ChordWedge => support("ChordWedge", false, false, 0.0, 2.0, false),
            ChordOrnament => support("ChordOrnament", true, false, 0.0, 3.0, false),
            ChordArpeggiato => support("ChordArpeggiato", true, false, 0.0, 3.0, false),
            ChordArticulation => support("ChordArticulation", true, false, 0.0, 3.0, false),
            ChordGrace => support("ChordGrace", true, true, 0.0, 3.0, false),
            BeamHead => support("BeamHead", false, false, 0.0, 2.0, true),
            ClefKey => support("ClefKey", true, true, 0.0, 2.0, true),
            KeyAlters => support("KeyAlters", true, false, 0.0, 2.0, true),
            HeadHead => support("HeadHead", true, true, 2.0, 2.0, true),
            TimeTopBottom => support("TimeTopBottom", true, true, 2.0, 2.0, false),
            EndingSentence => support("EndingSentence", true, false, 0.0, 2.0, false),
            BarGroup => support("BarGroup", false, false, 0.0, 0.0, false),
            BarConnection => support("BarConnection", true, true, 2.0, 2.0, true),
            OctaveShiftChord => support("OctaveShiftChord", false, false, 0.0, 2.0, false),
            // Connection
            AlterHead => connection("AlterHead", true, false, 3.0, 3.0, [2.0, 1.0], [2.0, 1.0]),
            // Only the vertical gap is scored for a dot against its note
            Augmentation => connection("Augmentation", false, true, 0.0, 3.0, [0.0, 1.0], [0.0, 1.0]),
            DoubleDot => connection("DoubleDot", true, true, 0.0, 3.0, [1.0, 2.0], [1.0, 2.0]),
            DotFermata => connection("DotFermata", true, true, 0.0, 2.0, [1.0, 1.0], [1.0, 1.0]),
            RepeatDotBar => connection("RepeatDotBar", false, true, 0.0, 2.0, [2.0, 1.0], [2.0, 1.0]),
            RepeatDotPair => connection("RepeatDotPair", true, true, 2.0, 2.0, [1.0, 1.0], [1.0, 1.0]),
            EndingBar => connection("EndingBar", false, false, 2.0, 0.0, [1.0, 0.0], [1.0, 0.0]),
            FermataChord => connection("FermataChord", false, true, 2.0, 0.0, [1.0, 1.0], [1.0, 1.0]),
            FermataBar => connection("FermataBar", false, true, 2.0, 0.0, [1.0, 1.0], [1.0, 1.0]),
            SlurHead => connection("SlurHead", false, false, 5.0, 0.0, [1.0, 1.0], [1.0, 1.0]),
            MarkerBar => connection("MarkerBar", false, true, 2.0, 0.0, [1.0, 0.0], [1.0, 0.0]),
            MultipleRestCount => {
                connection("MultipleRestCount", true, true, 2.0, 2.0, [1.0, 1.0], [1.0, 1.0])
            }
            BeamRest => connection("BeamRest", true, false, 0.0, 2.0, [1.0, 2.0], [1.0, 2.0]),
            // StemConnection
            HeadStem => stem_connection("HeadStem", false, true, 4.0, 10.0, [2.0, 1.0], [2.0, 1.0]),
            BeamStem => stem_connection("BeamStem", false, false, 2.0, 2.0, [1.0, 4.0], [1.0, 4.0]),
            FlagStem => stem_connection("FlagStem", false, true, 2.0, 2.0, [1.0, 1.0], [1.0, 1.0]),
            TremoloStem => {
                stem_connection("TremoloStem", true, true, 2.0, 2.0, [1.0, 1.0], [1.0, 1.0])
            }
        }
    }
}

/// Profile-indexed gap maxima for one relation kind, in interline fractions.
///
/// Each list holds the value for profile 0 first; a profile beyond the last defined value clamps
/// to the last one (the original's "fall back to the nearest lower profile" behavior).
#[derive(Debug, Clone, PartialEq)]
pub struct GapTuning {
    /// `None` means overlap is physically impossible for this kind; requesting the in-gap branch
    /// is then a configuration error
    x_in_max: Option<Vec<f64>>,
    x_out_max: Vec<f64>,
    y_max: Vec<f64>,
}

impl GapTuning {
    pub fn new(x_in_max: Option<&[f64]>, x_out_max: &[f64], y_max: &[f64]) -> Self {
        assert!(!x_out_max.is_empty() && !y_max.is_empty());
        Self {
            x_in_max: x_in_max.map(<[f64]>::to_vec),
            x_out_max: x_out_max.to_vec(),
            y_max: y_max.to_vec(),
        }
    }
}

/// Clamp a profile index to the last defined value
fn at(values: &[f64], profile: usize) -> f64 {
    values[profile.min(values.len() - 1)]
}

/// The immutable gap-tuning table, built once and passed explicitly into scoring functions
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    gaps: HashMap<RelationKind, GapTuning>,
}

impl Default for Tuning {
    fn default() -> Self {
        use RelationKind::*;
        let mut gaps = HashMap::new();
        let mut add = |kind: RelationKind, tuning: GapTuning| {
            gaps.insert(kind, tuning);
        };
        // Connections
        add(AlterHead, GapTuning::new(Some(&[0.3]), &[0.5, 0.75], &[0.4, 0.6]));
        add(Augmentation, GapTuning::new(None, &[1.5, 2.0], &[0.35, 0.5]));
        add(DoubleDot, GapTuning::new(None, &[0.75], &[0.2]));
        add(DotFermata, GapTuning::new(None, &[0.5], &[0.5]));
        add(RepeatDotBar, GapTuning::new(None, &[0.5, 0.75], &[0.5]));
        add(RepeatDotPair, GapTuning::new(None, &[0.3], &[2.5]));
        add(EndingBar, GapTuning::new(Some(&[0.5]), &[0.5, 1.0], &[2.0]));
        add(FermataChord, GapTuning::new(None, &[1.0], &[2.5]));
        add(FermataBar, GapTuning::new(None, &[1.0], &[2.5]));
        add(SlurHead, GapTuning::new(Some(&[0.5]), &[0.75, 1.0], &[1.0, 1.5]));
        add(MarkerBar, GapTuning::new(None, &[1.0], &[1.0]));
        add(MultipleRestCount, GapTuning::new(None, &[1.0], &[1.5]));
        add(BeamRest, GapTuning::new(Some(&[2.0]), &[0.5], &[2.0]));
        // Stem connections
        add(HeadStem, GapTuning::new(Some(&[0.2, 0.4]), &[0.15, 0.25, 0.35], &[0.8, 1.2]));
        add(BeamStem, GapTuning::new(Some(&[0.5]), &[0.1, 0.2], &[0.8, 1.2]));
        add(FlagStem, GapTuning::new(Some(&[0.3]), &[0.25], &[0.5]));
        add(TremoloStem, GapTuning::new(Some(&[0.3]), &[0.2], &[1.0]));
        Self { gaps }
    }
}

impl Tuning {
    /// Override the tuning of one kind (testing and experimentation)
    pub fn with_gaps(mut self, kind: RelationKind, tuning: GapTuning) -> Self {
        self.gaps.insert(kind, tuning);
        self
    }

    fn gap(&self, kind: RelationKind) -> crate::Result<&GapTuning> {
        self.gaps.get(&kind).ok_or(Error::NotGapScored { kind })
    }

    /// Maximum separation gap for the given kind and profile
    pub fn x_out_max(&self, kind: RelationKind, profile: usize) -> crate::Result<f64> {
        let value = at(&self.gap(kind)?.x_out_max, profile);
        if value <= 0.0 {
            return Err(Error::ZeroGapMax {
                kind,
                gap: "x_out_max",
            });
        }
        Ok(value)
    }

    /// Maximum overlap for the given kind and profile.  Errors when the kind never overlaps.
    pub fn x_in_max(&self, kind: RelationKind, profile: usize) -> crate::Result<f64> {
        let gap = self.gap(kind)?;
        let values = gap
            .x_in_max
            .as_deref()
            .ok_or(Error::UnsupportedInGap { kind })?;
        let value = at(values, profile);
        if value <= 0.0 {
            return Err(Error::ZeroGapMax {
                kind,
                gap: "x_in_max",
            });
        }
        Ok(value)
    }

    /// Maximum vertical gap for the given kind and profile
    pub fn y_max(&self, kind: RelationKind, profile: usize) -> crate::Result<f64> {
        let value = at(&self.gap(kind)?.y_max, profile);
        if value <= 0.0 {
            return Err(Error::ZeroGapMax { kind, gap: "y_max" });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Family;

    #[test]
    fn every_kind_has_a_spec() {
        for &kind in RelationKind::ALL {
            let spec = kind.spec();
            assert!(!spec.name.is_empty());
            assert!(spec.min_grade > 0.0);
        }
    }

    #[test]
    fn gap_scored_kinds_have_tuning() {
        let tuning = Tuning::default();
        for &kind in RelationKind::ALL {
            match kind.family() {
                Family::Connection | Family::StemConnection => {
                    assert!(tuning.x_out_max(kind, 0).is_ok(), "{}", kind.name());
                    assert!(tuning.y_max(kind, 0).is_ok(), "{}", kind.name());
                }
                Family::Plain | Family::Support => {
                    assert_eq!(
                        tuning.x_out_max(kind, 0),
                        Err(Error::NotGapScored { kind }),
                        "{}",
                        kind.name()
                    );
                }
            }
        }
    }

    #[test]
    fn profile_clamps_to_last_defined() {
        let tuning = Tuning::default();
        // HeadStem defines three out-gap profiles, two in-gap profiles
        assert_eq!(tuning.x_out_max(RelationKind::HeadStem, 0).unwrap(), 0.15);
        assert_eq!(tuning.x_out_max(RelationKind::HeadStem, 2).unwrap(), 0.35);
        assert_eq!(tuning.x_out_max(RelationKind::HeadStem, 9).unwrap(), 0.35);
        assert_eq!(tuning.x_in_max(RelationKind::HeadStem, 9).unwrap(), 0.4);
    }

    #[test]
    fn unsupported_in_gap_is_signalled() {
        let tuning = Tuning::default();
        assert_eq!(
            tuning.x_in_max(RelationKind::Augmentation, 0),
            Err(Error::UnsupportedInGap {
                kind: RelationKind::Augmentation
            })
        );
    }

    #[test]
    fn zero_gap_max_is_signalled() {
        let tuning = Tuning::default().with_gaps(
            RelationKind::HeadStem,
            GapTuning::new(Some(&[0.2]), &[0.0], &[0.8]),
        );
        assert_eq!(
            tuning.x_out_max(RelationKind::HeadStem, 0),
            Err(Error::ZeroGapMax {
                kind: RelationKind::HeadStem,
                gap: "x_out_max"
            })
        );
    }

    #[test]
    fn reduction_only_set() {
        use RelationKind::*;
        let expected = [
            BarConnection,
            BeamHead,
            ClefKey,
            HeadHead,
            KeyAlters,
            NoExclusion,
            StemAlignment,
        ];
        for &kind in RelationKind::ALL {
            assert_eq!(
                kind.is_reduction_only(),
                expected.contains(&kind),
                "{}",
                kind.name()
            );
        }
    }
}

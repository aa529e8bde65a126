//! Typed, directed edges between interpretations.
//!
//! Every edge of the symbol interpretation graph is a [`Relation`]: a kind tag, a manual flag and
//! a family-shaped body.  Rather than one type per kind, the four [`Family`] variants carry the
//! structure and everything type-specific (cardinality, coefficients, gap maxima, impact weights)
//! lives in the per-kind behavior table (see [`table`]).

mod checks;
mod connection;
mod hooks;
mod table;

pub use checks::{beam_stem_check, head_stem_check};
pub use hooks::{is_canonical_share, pre_link_head_stem, GraphCommand, UiRef, UiTask};
pub(crate) use hooks::{added, removed};
pub use table::{GapTuning, KindSpec, Tuning};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::grade::GradeImpacts;
use crate::inter::{Inter, Shape};
use crate::utils::{round3, HorizontalSide, Line2D, Point2D};

/// Maximum horizontal gap (interline fractions) below which a false head-stem pair is "invading"
const MAX_INVADING_DX: f64 = 0.05;
/// Maximum vertical gap for the invading test
const MAX_INVADING_DY: f64 = 0.0;
/// Vertical margin for stem anchor portions, as a ratio of head height
const ANCHOR_HEIGHT_RATIO: f64 = 0.275;
/// Neutral scaled stem length between small and standard heads, in interlines
pub(crate) const NEUTRAL_STEM_LENGTH: f64 = 2.8;

/// The four structural families a relation kind can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Bare edge, no grade
    Plain,
    /// Mutually reinforcing edge carrying a grade
    Support,
    /// Support whose grade derives from measured gaps
    Connection,
    /// Connection to a stem, with an extension point and portion classification
    StemConnection,
}

/// Every concrete relation kind.  Behavior is looked up via [`RelationKind::spec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    // Plain
    Exclusion,
    NoExclusion,
    Mirror,
    Containment,
    StemAlignment,
    SameVoice,
    SeparateVoice,
    SameTime,
    SeparateTime,
    NextInVoice,
    // Support
    ChordStem,
    ChordTuplet,
    ChordName,
    ChordSentence,
    ChordSyllable,
    ChordDynamics,
    ChordWedge,
    ChordOrnament,
    ChordArpeggiato,
    ChordArticulation,
    ChordGrace,
    BeamHead,
    ClefKey,
    KeyAlters,
    HeadHead,
    TimeTopBottom,
    EndingSentence,
    BarGroup,
    BarConnection,
    OctaveShiftChord,
    // Connection
    AlterHead,
    Augmentation,
    DoubleDot,
    DotFermata,
    RepeatDotBar,
    RepeatDotPair,
    EndingBar,
    FermataChord,
    FermataBar,
    SlurHead,
    MarkerBar,
    MultipleRestCount,
    BeamRest,
    // StemConnection
    HeadStem,
    BeamStem,
    FlagStem,
    TremoloStem,
}

impl RelationKind {
    /// Short display name, for logs and UI only — never a behavior discriminant
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn family(self) -> Family {
        self.spec().family
    }

    /// Whether a target inter may carry at most one incoming edge of this kind
    pub fn is_single_source(self) -> bool {
        self.spec().single_source
    }

    /// Whether a source inter may carry at most one outgoing edge of this kind
    pub fn is_single_target(self) -> bool {
        self.spec().single_target
    }

    /// Minimum viable grade for a scored connection of this kind
    pub fn min_grade(self) -> f64 {
        self.spec().min_grade
    }

    /// Whether this kind exists purely as a byproduct of automatic reduction.  Such kinds are
    /// fully functional as graph edges but excluded from interactive suggestions.
    pub fn is_reduction_only(self) -> bool {
        self.spec().reduction_only
    }
}

/// Which cause led to an exclusion edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionCause {
    /// The two inters occupy overlapping pixels
    Overlap,
    /// The two interpretations are logically incompatible
    Incompatible,
}

/// Which portion of a stem an attachment uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StemPortion {
    Top,
    Middle,
    Bottom,
}

/// Which portion of a beam a stem crosses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BeamPortion {
    Left,
    Center,
    Right,
}

/// Tuplet signs supported by [`RelationKind::ChordTuplet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TupletKind {
    Three,
    Six,
}

impl TupletKind {
    pub fn from_shape(shape: Shape) -> crate::Result<Self> {
        match shape {
            Shape::Tuplet3 => Ok(TupletKind::Three),
            Shape::Tuplet6 => Ok(TupletKind::Six),
            _ => Err(Error::UnexpectedShape {
                kind: RelationKind::ChordTuplet,
                shape,
            }),
        }
    }

    /// Support coefficient granted to the tuplet sign, spread over the expected chord count
    fn target_coeff(self) -> f64 {
        match self {
            TupletKind::Three => 0.33,
            TupletKind::Six => 0.17,
        }
    }
}

/// Kind-specific attributes, mostly populated lazily by the `added` hook
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Detail {
    None,
    Exclusion {
        cause: ExclusionCause,
    },
    HeadStem {
        #[serde(rename = "head-side")]
        head_side: Option<HorizontalSide>,
        /// Consistency between head size and stem length (neutral 1.0 when absent)
        consistency: Option<f64>,
    },
    BeamStem {
        #[serde(rename = "beam-portion")]
        beam_portion: Option<BeamPortion>,
    },
    SlurHead {
        side: HorizontalSide,
    },
    EndingBar {
        side: HorizontalSide,
    },
    ChordTuplet {
        tuplet: TupletKind,
    },
}

/// Measured gaps of a connection, in interline fractions, rounded to 3 decimals.
/// `dx >= 0` is true separation, `dx < 0` overlap; `dy` is unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaps {
    pub dx: f64,
    pub dy: f64,
}

/// Grade + provenance shared by every support-family body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SupportCore {
    pub(crate) grade: f64,
    #[serde(skip)]
    pub(crate) impacts: Option<GradeImpacts>,
}

impl Default for SupportCore {
    fn default() -> Self {
        // Grade defaults to 1.0 for supports not backed by geometric scoring
        Self {
            grade: 1.0,
            impacts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Body {
    Plain {
        detail: Detail,
    },
    Support {
        sup: SupportCore,
        detail: Detail,
    },
    Connection {
        sup: SupportCore,
        gaps: Option<Gaps>,
        detail: Detail,
    },
    StemConnection {
        sup: SupportCore,
        gaps: Option<Gaps>,
        #[serde(rename = "extension-point")]
        extension_point: Option<Point2D>,
        detail: Detail,
    },
}

/// One edge of the symbol interpretation graph.
///
/// A relation never owns its endpoints: it is created, inserted between two inters by the graph,
/// and removed as a unit.  Endpoints never change; to move an edge, remove it and add a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    kind: RelationKind,
    /// True if created by direct user action rather than algorithmic inference
    #[serde(default)]
    manual: bool,
    body: Body,
}

impl Relation {
    /// Build a relation of the given kind with default detail.  Kinds whose detail is mandatory
    /// at construction have dedicated constructors ([`Relation::exclusion`],
    /// [`Relation::slur_head`], [`Relation::ending_bar`], [`Relation::chord_tuplet`]).
    pub fn new(kind: RelationKind) -> Self {
        let detail = match kind {
            RelationKind::Exclusion => Detail::Exclusion {
                cause: ExclusionCause::Overlap,
            },
            RelationKind::HeadStem => Detail::HeadStem {
                head_side: None,
                consistency: None,
            },
            RelationKind::BeamStem => Detail::BeamStem { beam_portion: None },
            RelationKind::SlurHead => Detail::SlurHead {
                side: HorizontalSide::Left,
            },
            RelationKind::EndingBar => Detail::EndingBar {
                side: HorizontalSide::Left,
            },
            RelationKind::ChordTuplet => Detail::ChordTuplet {
                tuplet: TupletKind::Three,
            },
            _ => Detail::None,
        };
        Self::with_detail(kind, detail)
    }

    fn with_detail(kind: RelationKind, detail: Detail) -> Self {
        let body = match kind.family() {
            Family::Plain => Body::Plain { detail },
            Family::Support => Body::Support {
                sup: SupportCore::default(),
                detail,
            },
            Family::Connection => Body::Connection {
                sup: SupportCore::default(),
                gaps: None,
                detail,
            },
            Family::StemConnection => Body::StemConnection {
                sup: SupportCore::default(),
                gaps: None,
                extension_point: None,
                detail,
            },
        };
        Self {
            kind,
            manual: false,
            body,
        }
    }

    pub fn exclusion(cause: ExclusionCause) -> Self {
        Self::with_detail(RelationKind::Exclusion, Detail::Exclusion { cause })
    }

    pub fn slur_head(side: HorizontalSide) -> Self {
        Self::with_detail(RelationKind::SlurHead, Detail::SlurHead { side })
    }

    pub fn ending_bar(side: HorizontalSide) -> Self {
        Self::with_detail(RelationKind::EndingBar, Detail::EndingBar { side })
    }

    /// Build a chord-tuplet relation from the tuplet sign's shape.  A shape outside the tuplet
    /// set is an illegal argument, not a silent zero-coefficient default.
    pub fn chord_tuplet(shape: Shape) -> crate::Result<Self> {
        let tuplet = TupletKind::from_shape(shape)?;
        Ok(Self::with_detail(
            RelationKind::ChordTuplet,
            Detail::ChordTuplet { tuplet },
        ))
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn family(&self) -> Family {
        self.kind.family()
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn set_manual(&mut self, manual: bool) {
        self.manual = manual;
    }

    pub fn is_single_source(&self) -> bool {
        self.kind.is_single_source()
    }

    pub fn is_single_target(&self) -> bool {
        self.kind.is_single_target()
    }

    pub fn min_grade(&self) -> f64 {
        self.kind.min_grade()
    }

    fn support(&self) -> Option<&SupportCore> {
        match &self.body {
            Body::Plain { .. } => None,
            Body::Support { sup, .. }
            | Body::Connection { sup, .. }
            | Body::StemConnection { sup, .. } => Some(sup),
        }
    }

    fn support_mut(&mut self) -> Option<&mut SupportCore> {
        match &mut self.body {
            Body::Plain { .. } => None,
            Body::Support { sup, .. }
            | Body::Connection { sup, .. }
            | Body::StemConnection { sup, .. } => Some(sup),
        }
    }

    /// The support grade.  Plain relations report the neutral 1.0.
    pub fn grade(&self) -> f64 {
        self.support().map_or(1.0, |sup| sup.grade)
    }

    pub fn impacts(&self) -> Option<&GradeImpacts> {
        self.support().and_then(|sup| sup.impacts.as_ref())
    }

    pub(crate) fn set_support(&mut self, grade: f64, impacts: Option<GradeImpacts>) {
        if let Some(sup) = self.support_mut() {
            sup.grade = grade;
            sup.impacts = impacts;
        }
    }

    /// Effective coefficient boosting the source endpoint
    pub fn source_coeff(&self) -> f64 {
        let base = self.kind.spec().source_coeff;
        match self.detail() {
            // A stem length consistent with the head size strengthens the head support
            Detail::HeadStem { consistency, .. } => base * consistency.unwrap_or(1.0),
            _ => base,
        }
    }

    /// Effective coefficient boosting the target endpoint
    pub fn target_coeff(&self) -> f64 {
        match self.detail() {
            Detail::ChordTuplet { tuplet } => tuplet.target_coeff(),
            _ => self.kind.spec().target_coeff,
        }
    }

    /// Multiplicative boost applied to the source endpoint's own grade; always >= 1
    pub fn source_ratio(&self) -> f64 {
        1.0 + self.source_coeff() * self.grade()
    }

    /// Multiplicative boost applied to the target endpoint's own grade; always >= 1
    pub fn target_ratio(&self) -> f64 {
        1.0 + self.target_coeff() * self.grade()
    }

    pub fn gaps(&self) -> Option<Gaps> {
        match &self.body {
            Body::Connection { gaps, .. } | Body::StemConnection { gaps, .. } => *gaps,
            _ => None,
        }
    }

    pub fn dx(&self) -> Option<f64> {
        self.gaps().map(|g| g.dx)
    }

    pub fn dy(&self) -> Option<f64> {
        self.gaps().map(|g| g.dy)
    }

    pub(crate) fn set_gaps(&mut self, dx: f64, dy: f64) {
        let stored = Gaps {
            dx: round3(dx),
            dy: round3(dy),
        };
        match &mut self.body {
            Body::Connection { gaps, .. } | Body::StemConnection { gaps, .. } => {
                *gaps = Some(stored)
            }
            _ => unreachable!("set_gaps is only reachable through gap scoring"),
        }
    }

    fn detail(&self) -> &Detail {
        match &self.body {
            Body::Plain { detail }
            | Body::Support { detail, .. }
            | Body::Connection { detail, .. }
            | Body::StemConnection { detail, .. } => detail,
        }
    }

    fn detail_mut(&mut self) -> &mut Detail {
        match &mut self.body {
            Body::Plain { detail }
            | Body::Support { detail, .. }
            | Body::Connection { detail, .. }
            | Body::StemConnection { detail, .. } => detail,
        }
    }

    pub fn exclusion_cause(&self) -> Option<ExclusionCause> {
        match self.detail() {
            Detail::Exclusion { cause } => Some(*cause),
            _ => None,
        }
    }

    pub fn head_side(&self) -> Option<HorizontalSide> {
        match self.detail() {
            Detail::HeadStem { head_side, .. } => *head_side,
            _ => None,
        }
    }

    pub fn set_head_side(&mut self, side: HorizontalSide) {
        if let Detail::HeadStem { head_side, .. } = self.detail_mut() {
            *head_side = Some(side);
        }
    }

    /// Consistency between head size and stem length; neutral 1.0 when unknown
    pub fn consistency(&self) -> f64 {
        match self.detail() {
            Detail::HeadStem { consistency, .. } => consistency.unwrap_or(1.0),
            _ => 1.0,
        }
    }

    /// Record head/stem size consistency from raw measurements
    pub fn set_consistency(&mut self, head_is_small: bool, scaled_stem_length: f64) {
        let ratio = scaled_stem_length / NEUTRAL_STEM_LENGTH;
        let value = if head_is_small { 1.0 / ratio } else { ratio };
        log::debug!(
            "consistency small:{} length:{:.1} -> {:.1}",
            head_is_small,
            scaled_stem_length,
            value
        );
        if let Detail::HeadStem { consistency, .. } = self.detail_mut() {
            *consistency = Some(value);
        }
    }

    /// Record consistency from the involved head and stem inters
    pub fn set_consistency_from(&mut self, head: &Inter, stem: &Inter, scale: &crate::Scale) {
        let is_small = head.shape().is_some_and(Shape::is_small_head);
        let Some(median) = stem.stem_median() else {
            return;
        };
        let scaled_length = scale.pixels_to_frac(median.p2.y - median.p1.y);
        self.set_consistency(is_small, scaled_length);
    }

    pub fn beam_portion(&self) -> Option<BeamPortion> {
        match self.detail() {
            Detail::BeamStem { beam_portion } => *beam_portion,
            _ => None,
        }
    }

    pub fn set_beam_portion(&mut self, portion: BeamPortion) {
        if let Detail::BeamStem { beam_portion } = self.detail_mut() {
            *beam_portion = Some(portion);
        }
    }

    pub fn slur_side(&self) -> Option<HorizontalSide> {
        match self.detail() {
            Detail::SlurHead { side } => Some(*side),
            _ => None,
        }
    }

    pub fn ending_side(&self) -> Option<HorizontalSide> {
        match self.detail() {
            Detail::EndingBar { side } => Some(*side),
            _ => None,
        }
    }

    pub fn tuplet(&self) -> Option<TupletKind> {
        match self.detail() {
            Detail::ChordTuplet { tuplet } => Some(*tuplet),
            _ => None,
        }
    }

    pub fn extension_point(&self) -> Option<Point2D> {
        match &self.body {
            Body::StemConnection {
                extension_point, ..
            } => *extension_point,
            _ => None,
        }
    }

    pub fn set_extension_point(&mut self, point: Point2D) {
        if let Body::StemConnection {
            extension_point, ..
        } = &mut self.body
        {
            *extension_point = Some(point);
        }
    }

    /// Whether a false head-stem pair is "invading": the instances are too close to coexist
    pub fn is_invading(&self) -> bool {
        match self.gaps() {
            Some(gaps) => gaps.dy <= MAX_INVADING_DY && gaps.dx <= MAX_INVADING_DX,
            None => false,
        }
    }

    /// Which stem portion this head-stem connection uses, from the extension point ordinate
    pub fn stem_portion(&self, head: &Inter, stem_line: &Line2D) -> Option<StemPortion> {
        let y_extension = self.extension_point()?.y;
        Some(stem_portion_at(
            head.bounds().height,
            stem_line,
            y_extension,
        ))
    }
}

/// Classify the portion of `stem_line` used by an attachment at `y_extension`, with a vertical
/// margin proportional to the head height
pub fn stem_portion_at(head_height: f64, stem_line: &Line2D, y_extension: f64) -> StemPortion {
    let margin = head_height * ANCHOR_HEIGHT_RATIO;
    let y_mid = stem_line.mid_y();
    if y_extension >= y_mid {
        if y_extension > stem_line.p2.y - margin {
            StemPortion::Bottom
        } else {
            StemPortion::Middle
        }
    } else if y_extension < stem_line.p1.y + margin {
        StemPortion::Top
    } else {
        StemPortion::Middle
    }
}

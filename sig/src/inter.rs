//! Interpretation ("inter") vertices.
//!
//! An inter is one candidate reading of an image region as a musical symbol.  The relation
//! subsystem never produces inters; it only consumes their identity, classification and geometry.
//! The model here is therefore deliberately narrow: a kind (with its inheritance chain, used by
//! the compatibility registry), a bounding box, a confidence grade and the handful of lifecycle
//! flags the relation hooks read.

use serde::{Deserialize, Serialize};

use crate::relation::RelationKind;
use crate::utils::{HorizontalSide, Line2D, Point2D, Rectangle};

/// Classification of an inter.  Kinds form a small inheritance tree (via [`parent`](Self::parent))
/// so that a relation registered against e.g. [`Note`](Self::Note) covers both heads and rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterKind {
    // Abstract kinds, used as registration targets
    /// Any note-bearing symbol (head or rest)
    Note,
    /// Any chord (head-based or rest-based)
    Chord,

    // Concrete kinds
    Head,
    Rest,
    HeadChord,
    RestChord,
    Stem,
    Beam,
    /// A beam hook is a degenerate beam attached to a single stem
    BeamHook,
    Flag,
    Slur,
    Alter,
    KeyAlter,
    AugmentationDot,
    Barline,
    Ending,
    Fermata,
    FermataDot,
    Dynamics,
    Articulation,
    Ornament,
    Arpeggiato,
    Tuplet,
    Clef,
    Key,
    Time,
    Sentence,
    Syllable,
    Wedge,
    Marker,
    MultipleRest,
    Tremolo,
    OctaveShift,
}

impl InterKind {
    /// The immediate supertype of this kind, if any
    pub fn parent(self) -> Option<InterKind> {
        use InterKind::*;
        match self {
            Head | Rest => Some(Note),
            HeadChord | RestChord => Some(Chord),
            BeamHook => Some(Beam),
            KeyAlter => Some(Alter),
            _ => None,
        }
    }

    /// This kind followed by its supertypes, most specific first
    pub fn ancestry(self) -> impl Iterator<Item = InterKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// Relation kinds whose presence (as either endpoint) clears this kind's "abnormal" state.
    /// An empty slice means the kind has no support requirement.
    pub fn required_supports(self) -> &'static [RelationKind] {
        use RelationKind::*;
        match self {
            InterKind::Alter => &[AlterHead],
            InterKind::AugmentationDot => &[Augmentation, DoubleDot],
            InterKind::Stem => &[HeadStem],
            InterKind::Flag => &[FlagStem],
            InterKind::Tuplet => &[ChordTuplet],
            InterKind::Slur => &[SlurHead],
            InterKind::Tremolo => &[TremoloStem],
            _ => &[],
        }
    }
}

/// The subset of glyph shapes this subsystem inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    NoteheadBlack,
    NoteheadVoid,
    NoteheadBlackSmall,
    NoteheadVoidSmall,
    WholeNote,
    Tuplet3,
    Tuplet6,
    Flat,
    Sharp,
    Natural,
    Fermata,
}

impl Shape {
    pub fn is_small_head(self) -> bool {
        matches!(self, Shape::NoteheadBlackSmall | Shape::NoteheadVoidSmall)
    }
}

/// Kind-specific geometry beyond the bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Geometry {
    #[default]
    None,
    /// A stem's median line, stored top-down
    Stem { median: Line2D },
    /// A beam's median line (left to right) and its thickness
    Beam { median: Line2D, height: f64 },
}

/// One interpretation vertex.  Structural edits (adding/removing edges, marking removed) go
/// through [`SIGraph`](crate::graph::SIGraph); nothing mutates an inter's fields directly from
/// relation code.
#[derive(Debug, Clone)]
pub struct Inter {
    kind: InterKind,
    shape: Option<Shape>,
    bounds: Rectangle,
    grade: f64,
    pub(crate) manual: bool,
    pub(crate) vip: bool,
    pub(crate) removed: bool,
    pub(crate) abnormal: bool,
    /// Set when a cascade invalidated some cached aggregate (e.g. a chord's duration info).
    /// Recomputation is the owner's business, outside this subsystem.
    pub(crate) dirty: bool,
    geometry: Geometry,
}

impl Inter {
    pub fn new(kind: InterKind, bounds: Rectangle, grade: f64) -> Self {
        Self {
            kind,
            shape: None,
            bounds,
            grade,
            manual: false,
            vip: false,
            removed: false,
            abnormal: false,
            dirty: false,
            geometry: Geometry::None,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }

    pub fn with_vip(mut self) -> Self {
        self.vip = true;
        self
    }

    pub fn kind(&self) -> InterKind {
        self.kind
    }

    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn center(&self) -> Point2D {
        self.bounds.center()
    }

    pub fn grade(&self) -> f64 {
        self.grade
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn is_vip(&self) -> bool {
        self.vip
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn is_abnormal(&self) -> bool {
        self.abnormal
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// A stem's median line, if this inter is a stem
    pub fn stem_median(&self) -> Option<Line2D> {
        match self.geometry {
            Geometry::Stem { median } => Some(median),
            _ => None,
        }
    }

    /// A beam's median line, if this inter is a beam
    pub fn beam_median(&self) -> Option<Line2D> {
        match self.geometry {
            Geometry::Beam { median, .. } => Some(median),
            _ => None,
        }
    }

    /// Where a stem is expected to attach on the given horizontal side of a head.
    /// The abscissa is the head border on that side, the ordinate the head center.
    pub fn stem_reference_point(&self, side: HorizontalSide) -> Point2D {
        let x = match side {
            HorizontalSide::Left => self.bounds.x,
            HorizontalSide::Right => self.bounds.max_x(),
        };
        Point2D::new(x, self.center().y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestry_walk() {
        #[track_caller]
        fn check(kind: InterKind, expected: &[InterKind]) {
            let chain: Vec<_> = kind.ancestry().collect();
            assert_eq!(chain, expected);
        }
        check(InterKind::Head, &[InterKind::Head, InterKind::Note]);
        check(InterKind::Rest, &[InterKind::Rest, InterKind::Note]);
        check(
            InterKind::KeyAlter,
            &[InterKind::KeyAlter, InterKind::Alter],
        );
        check(InterKind::Stem, &[InterKind::Stem]);
    }

    #[test]
    fn stem_reference_point() {
        let head = Inter::new(
            InterKind::Head,
            Rectangle::new(10.0, 20.0, 12.0, 10.0),
            0.8,
        );
        let left = head.stem_reference_point(HorizontalSide::Left);
        let right = head.stem_reference_point(HorizontalSide::Right);
        assert_eq!((left.x, left.y), (10.0, 25.0));
        assert_eq!((right.x, right.y), (22.0, 25.0));
    }
}

//! Geometric feasibility checks which build scored relations from raw geometry.
//!
//! These are the entry points used by inference code: given the concrete geometry of two
//! candidate partners, measure the gaps in pixels, convert to interline fractions, score, and
//! return the relation only when it reaches the kind's minimum grade.

use crate::inter::Inter;
use crate::relation::{BeamPortion, Relation, RelationKind, Tuning};
use crate::scale::Scale;
use crate::utils::{HorizontalSide, Line2D, Point2D, Rectangle, VerticalSide};

/// Check whether a head-stem relation is possible between `head` and a stem whose median line is
/// `stem_line` (top-down).
///
/// `stump` is the head's stem stump glyph box, when one was detected; `head_to_tail` is the
/// vertical direction from the head towards the stem's tail.  Returns `None` when the scored
/// grade stays below the kind's minimum.
pub fn head_stem_check(
    head: &Inter,
    stem_line: Line2D,
    stump: Option<Rectangle>,
    head_to_tail: VerticalSide,
    scale: &Scale,
    profile: usize,
    tuning: &Tuning,
) -> crate::Result<Option<Relation>> {
    if head.is_vip() {
        log::info!("VIP head_stem_check {:?} & {:?}", head.kind(), stem_line);
    }

    let y_dir = head_to_tail.direction();
    // The head sits on one side of the (top-down) stem line: ccw > 0 puts it to the right,
    // so the stem attaches on the head's left
    let h_side = if stem_line.relative_ccw(head.center()) > 0 {
        HorizontalSide::Left
    } else {
        HorizontalSide::Right
    };
    let ref_pt = head.stem_reference_point(h_side);

    let x_stem = stem_line.x_at_y(ref_pt.y);
    let x_gap = h_side.direction() * (x_stem - ref_pt.x);

    let y_gap = match stump {
        Some(stump_box) => {
            let overlap = if y_dir > 0.0 {
                stump_box.max_y() - stem_line.p1.y
            } else {
                stem_line.p2.y - stump_box.y
            };
            overlap.min(0.0).abs()
        }
        None => {
            if ref_pt.y < stem_line.p1.y {
                stem_line.p1.y - ref_pt.y
            } else if ref_pt.y > stem_line.p2.y {
                ref_pt.y - stem_line.p2.y
            } else {
                0.0
            }
        }
    };

    let mut relation = Relation::new(RelationKind::HeadStem);
    relation.set_head_side(h_side);
    relation.set_in_out_gaps(
        scale.pixels_to_frac(x_gap),
        scale.pixels_to_frac(y_gap),
        profile,
        tuning,
    )?;

    if relation.grade() < relation.min_grade() {
        return Ok(None);
    }

    // The extension must be the maximum y extension within the head's y range
    let head_box = head.bounds();
    let y_ext = if y_dir > 0.0 {
        head_box.y
    } else {
        head_box.max_y() - 1.0
    };
    relation.set_extension_point(Point2D::new(x_stem, y_ext));
    Ok(Some(relation))
}

/// Check whether a beam-stem relation is possible between `beam` and `stem`.
///
/// The stem's crossing abscissa against the beam median classifies the beam portion
/// (left / center / right, with a margin of the in-gap maximum); the measured gaps are then
/// scored the usual way.  Returns `None` when either inter lacks the needed geometry or the
/// grade stays below the minimum.
pub fn beam_stem_check(
    beam: &Inter,
    stem: &Inter,
    scale: &Scale,
    profile: usize,
    tuning: &Tuning,
) -> crate::Result<Option<Relation>> {
    let (Some(beam_median), Some(stem_median)) = (beam.beam_median(), stem.stem_median()) else {
        return Ok(None);
    };
    if beam.is_vip() || stem.is_vip() {
        log::info!("VIP beam_stem_check {:?} & {:?}", beam_median, stem_median);
    }

    // Crossing point of the stem line with the beam median
    let y_cross = beam_median.y_at_x(stem_median.p1.x);
    let x_cross = stem_median.x_at_y(y_cross);

    // Beam portion, with a margin of one in-gap maximum on each end
    let max_dx = scale.to_pixels(tuning.x_in_max(RelationKind::BeamStem, profile)?);
    let portion = if x_cross < beam_median.p1.x + max_dx {
        BeamPortion::Left
    } else if x_cross > beam_median.p2.x - max_dx {
        BeamPortion::Right
    } else {
        BeamPortion::Center
    };

    // Horizontal gap: negative (overlap) while the crossing lies within the beam's x range.
    // The overlap depth is capped at the margin: anything deeper is simply "fully inside".
    let x_gap = if x_cross < beam_median.p1.x {
        beam_median.p1.x - x_cross
    } else if x_cross > beam_median.p2.x {
        x_cross - beam_median.p2.x
    } else {
        let depth = (x_cross - beam_median.p1.x).min(beam_median.p2.x - x_cross);
        -depth.min(max_dx)
    };

    // Vertical gap: distance from the crossing ordinate to the stem's y range
    let y_gap = if y_cross < stem_median.p1.y {
        stem_median.p1.y - y_cross
    } else if y_cross > stem_median.p2.y {
        y_cross - stem_median.p2.y
    } else {
        0.0
    };

    let mut relation = Relation::new(RelationKind::BeamStem);
    relation.set_beam_portion(portion);
    relation.set_in_out_gaps(
        scale.pixels_to_frac(x_gap),
        scale.pixels_to_frac(y_gap),
        profile,
        tuning,
    )?;

    if relation.grade() < relation.min_grade() {
        return Ok(None);
    }
    Ok(Some(relation))
}

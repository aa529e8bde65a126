//! Edge lifecycle hooks.
//!
//! The graph invokes [`added`] / [`removed`] immediately after an edge is structurally inserted
//! or removed.  Hooks never mutate the graph re-entrantly: they may lazily populate fields of the
//! relation itself, and return *descriptions* of follow-up edits ([`GraphCommand`]s) which the
//! graph drains from a work queue.  This keeps cascade ordering testable and makes idempotence a
//! local property: every command application re-checks the current graph state.

use crate::graph::{InterId, RelationId, SIGraph};
use crate::inter::{Geometry, InterKind};
use crate::link::InterPair;
use crate::relation::{Relation, RelationKind};
use crate::utils::{HorizontalSide, Point2D, VerticalSide};

/// A follow-up graph edit requested by a hook.  Commands are applied by the graph until the
/// cascade is quiescent; each application re-checks preconditions, so replaying a command whose
/// effect already holds is a no-op.
#[derive(Debug, Clone)]
pub enum GraphCommand {
    /// Insert an edge unless one of the same kind already connects the pair
    Link {
        source: InterId,
        target: InterId,
        relation: Relation,
    },
    /// Remove a specific edge if it still exists
    Unlink { edge: RelationId },
    /// Remove an inter and, in cascade, all its edges
    RemoveInter(InterId),
    /// Re-evaluate whether an inter's support requirements are satisfied
    CheckAbnormal(InterId),
    /// Invalidate cached aggregate state on a composite inter (recomputation is the owner's
    /// business, outside this subsystem)
    MarkDirty(InterId),
}

/// Hook invoked after an edge was inserted.  Populates lazy geometric fields on the relation and
/// reports cascading edits.
pub(crate) fn added(graph: &mut SIGraph, edge: RelationId) -> Vec<GraphCommand> {
    let Some((source, target)) = graph.edge_ends(edge) else {
        return Vec::new();
    };
    let Some(relation) = graph.relation(edge) else {
        return Vec::new();
    };
    let kind = relation.kind();
    let manual = relation.is_manual();

    if graph.inter(source).is_vip() || graph.inter(target).is_vip() {
        log::info!(
            "VIP {} linked: #{} -> #{}",
            kind.name(),
            source.index(),
            target.index()
        );
    }

    let mut commands = Vec::new();
    match kind {
        RelationKind::HeadStem => {
            head_stem_added(graph, edge, source, target, manual, &mut commands);
        }
        RelationKind::BeamStem => {
            beam_stem_added(graph, edge, source, target);
            // Beam group membership may have changed; the group owner recomputes lazily
            commands.push(GraphCommand::MarkDirty(source));
            commands.push(GraphCommand::CheckAbnormal(target));
        }
        RelationKind::ChordStem => {
            commands.push(GraphCommand::MarkDirty(source));
            commands.push(GraphCommand::CheckAbnormal(source));
            commands.push(GraphCommand::CheckAbnormal(target));
        }
        RelationKind::Containment => {
            commands.push(GraphCommand::MarkDirty(source));
        }
        _ => {
            // Generic support: the endpoints' support requirements may now be satisfied
            commands.push(GraphCommand::CheckAbnormal(source));
            commands.push(GraphCommand::CheckAbnormal(target));
        }
    }
    commands
}

/// Hook invoked after an edge was removed.  `relation` is the edge just taken out of the graph.
pub(crate) fn removed(
    graph: &SIGraph,
    source: InterId,
    target: InterId,
    relation: &Relation,
) -> Vec<GraphCommand> {
    if graph.inter(source).is_vip() || graph.inter(target).is_vip() {
        log::info!(
            "VIP {} unlinked: #{} -> #{}",
            relation.name(),
            source.index(),
            target.index()
        );
    }

    let mut commands = Vec::new();
    // Cascading deletions fire hooks in unspecified order: never touch a removed endpoint
    for id in [source, target] {
        if !graph.inter(id).is_removed() {
            commands.push(GraphCommand::CheckAbnormal(id));
        }
    }
    if matches!(
        relation.kind(),
        RelationKind::ChordStem | RelationKind::Containment | RelationKind::BeamStem
    ) && !graph.inter(source).is_removed()
    {
        commands.push(GraphCommand::MarkDirty(source));
    }
    commands
}

/// Populate head side and extension point if absent, and reassign the head's chord to the stem
/// for manual edits
fn head_stem_added(
    graph: &mut SIGraph,
    edge: RelationId,
    head: InterId,
    stem: InterId,
    manual: bool,
    commands: &mut Vec<GraphCommand>,
) {
    let head_center = graph.inter(head).center();
    let head_bounds = graph.inter(head).bounds();
    let stem_center = graph.inter(stem).center();

    if let Some(relation) = graph.relation_mut(edge) {
        let side = relation.head_side().unwrap_or(if stem_center.x < head_center.x {
            HorizontalSide::Left
        } else {
            HorizontalSide::Right
        });
        relation.set_head_side(side);

        if relation.extension_point().is_none() {
            let v_side = if stem_center.y < head_center.y {
                VerticalSide::Top
            } else {
                VerticalSide::Bottom
            };
            let ref_x = match side {
                HorizontalSide::Left => head_bounds.x,
                HorizontalSide::Right => head_bounds.max_x(),
            };
            let ref_y = match v_side {
                VerticalSide::Top => head_bounds.y,
                VerticalSide::Bottom => head_bounds.max_y() - 1.0,
            };
            relation.set_extension_point(Point2D::new(ref_x, ref_y));
        }
    }

    let head_is_manual = graph.inter(head).is_manual();
    let stem_is_manual = graph.inter(stem).is_manual();
    if manual || head_is_manual || stem_is_manual {
        // Update the head's chord with the stem
        if let Some(chord) = chord_of(graph, head) {
            let existing = graph
                .outgoing_of(chord, RelationKind::ChordStem)
                .into_iter()
                .next();
            let existing_stem = existing.and_then(|e| graph.edge_ends(e)).map(|(_, t)| t);
            if existing_stem != Some(stem) {
                if let Some(old_edge) = existing {
                    commands.push(GraphCommand::Unlink { edge: old_edge });
                }
                commands.push(GraphCommand::Link {
                    source: chord,
                    target: stem,
                    relation: Relation::new(RelationKind::ChordStem),
                });
            }
        }
    }

    commands.push(GraphCommand::CheckAbnormal(head));
    commands.push(GraphCommand::CheckAbnormal(stem));
}

/// Populate the beam portion if absent, from where the stem crosses the beam median.
/// The classification margin is the beam's own thickness.
fn beam_stem_added(graph: &mut SIGraph, edge: RelationId, beam: InterId, stem: InterId) {
    let beam_geometry = graph.inter(beam).geometry();
    let stem_median = graph.inter(stem).stem_median();
    let (Geometry::Beam { median, height }, Some(stem_line)) = (beam_geometry, stem_median) else {
        return;
    };

    if let Some(relation) = graph.relation_mut(edge) {
        if relation.beam_portion().is_none() {
            let y_cross = median.y_at_x(stem_line.p1.x);
            let x_cross = stem_line.x_at_y(y_cross);
            let margin = height.max(2.0);
            let portion = if x_cross < median.p1.x + margin {
                super::BeamPortion::Left
            } else if x_cross > median.p2.x - margin {
                super::BeamPortion::Right
            } else {
                super::BeamPortion::Center
            };
            relation.set_beam_portion(portion);
        }
    }
}

/// The chord containing the given note, i.e. the source of its incoming containment edge
fn chord_of(graph: &SIGraph, note: InterId) -> Option<InterId> {
    graph
        .incoming_of(note, RelationKind::Containment)
        .into_iter()
        .filter_map(|edge| graph.edge_ends(edge))
        .map(|(source, _)| source)
        .find(|&source| {
            graph
                .inter(source)
                .kind()
                .ancestry()
                .any(|k| k == InterKind::Chord)
        })
}

/// Reference to an inter within a [`UiTask`] sequence: either an existing vertex or the result of
/// a preceding `Addition` task (indexed among the additions of the same sequence)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRef {
    Existing(InterId),
    Created(usize),
}

/// One abstract edit operation of a transactional UI command sequence.  This subsystem only
/// builds the sequence; applying it (and resolving [`UiRef::Created`] references to realized
/// inter ids) is the UI layer's business.
#[derive(Debug, Clone)]
pub enum UiTask {
    /// Create a new inter
    Addition { inter: crate::inter::Inter },
    /// Insert an edge between two (possibly just-created) inters
    Link {
        source: UiRef,
        target: UiRef,
        relation: Relation,
    },
    /// Remove an existing edge
    Unlink { edge: RelationId },
    /// Remove an existing inter
    Removal { inter: InterId },
}

/// Prepare the UI edits needed before a head-stem link can be applied.
///
/// Covers two configurations:
/// - the canonical "shared head" (stem-top on the head's left, stem-bottom on its right): the
///   head is duplicated, mirrored, and the duplicate joins the stem's chord;
/// - incompatible chords: the head moves from its current chord to the stem's chord, deleting
///   the old chord when it empties.
///
/// Returns an empty sequence when the head has no chord (nothing to prepare).
pub fn pre_link_head_stem(graph: &SIGraph, pair: &InterPair) -> Vec<UiTask> {
    let head = pair.source;
    let stem = pair.target;

    let Some(head_chord) = chord_of(graph, head) else {
        return Vec::new();
    };

    let mut tasks = Vec::new();
    let stem_chords: Vec<InterId> = graph
        .incoming_of(stem, RelationKind::ChordStem)
        .into_iter()
        .filter_map(|edge| graph.edge_ends(edge))
        .map(|(source, _)| source)
        .collect();
    let stem_chord_ref = stem_chords.first().map(|&id| UiRef::Existing(id));

    // Check for a canonical head share
    let head_center = graph.inter(head).center();
    let stem_center = graph.inter(stem).center();
    let head_side = if stem_center.x < head_center.x {
        HorizontalSide::Left
    } else {
        HorizontalSide::Right
    };
    let chord_stem = graph
        .outgoing_of(head_chord, RelationKind::ChordStem)
        .into_iter()
        .filter_map(|edge| graph.edge_ends(edge))
        .map(|(_, target)| target)
        .next();

    let sharing = match (head_side, chord_stem) {
        (HorizontalSide::Left, Some(head_stem)) => {
            is_canonical_share(graph, stem, head, head_stem)
        }
        (HorizontalSide::Right, Some(head_stem)) => {
            is_canonical_share(graph, head_stem, head, stem)
        }
        _ => false,
    };

    if sharing {
        // Duplicate the head and link the duplicate as mirror of the original
        let new_head = graph.inter(head).clone().with_manual(true);
        tasks.push(UiTask::Addition { inter: new_head });
        let created = UiRef::Created(0);
        tasks.push(UiTask::Link {
            source: created,
            target: UiRef::Existing(head),
            relation: Relation::new(RelationKind::Mirror),
        });

        let chord_ref =
            stem_chord_ref.unwrap_or_else(|| build_stem_chord(graph, stem, &mut tasks));
        tasks.push(UiTask::Link {
            source: chord_ref,
            target: created,
            relation: Relation::new(RelationKind::Containment),
        });
        return tasks;
    }

    // If the resulting chords are not compatible, move the head to the stem chord
    let incompatible = (stem_chords.is_empty() && chord_stem.is_some())
        || (!stem_chords.is_empty() && !stem_chords.contains(&head_chord));
    if incompatible {
        if let Some(containment) = graph.get_relation(head_chord, head, RelationKind::Containment)
        {
            tasks.push(UiTask::Unlink { edge: containment });
        }
        if note_count(graph, head_chord) <= 1 {
            // The head chord is getting empty
            tasks.push(UiTask::Removal { inter: head_chord });
        }
        let chord_ref =
            stem_chord_ref.unwrap_or_else(|| build_stem_chord(graph, stem, &mut tasks));
        tasks.push(UiTask::Link {
            source: chord_ref,
            target: UiRef::Existing(head),
            relation: Relation::new(RelationKind::Containment),
        });
    }

    tasks
}

/// Append tasks creating a head chord around the given stem; returns the reference to it
fn build_stem_chord(graph: &SIGraph, stem: InterId, tasks: &mut Vec<UiTask>) -> UiRef {
    let created_index = tasks
        .iter()
        .filter(|t| matches!(t, UiTask::Addition { .. }))
        .count();
    let chord = crate::inter::Inter::new(
        InterKind::HeadChord,
        graph.inter(stem).bounds(),
        graph.inter(stem).grade(),
    );
    tasks.push(UiTask::Addition { inter: chord });
    let chord_ref = UiRef::Created(created_index);
    tasks.push(UiTask::Link {
        source: chord_ref,
        target: UiRef::Existing(stem),
        relation: Relation::new(RelationKind::ChordStem),
    });
    chord_ref
}

/// Number of notes contained in the given chord
fn note_count(graph: &SIGraph, chord: InterId) -> usize {
    graph
        .outgoing_of(chord, RelationKind::Containment)
        .len()
}

/// Whether `left_stem`, `head` and `right_stem` form the canonical "shared head" configuration:
/// the head sits at the top of the descending left stem and at the bottom of the ascending right
/// stem
pub fn is_canonical_share(
    graph: &SIGraph,
    left_stem: InterId,
    head: InterId,
    right_stem: InterId,
) -> bool {
    let (Some(left_line), Some(right_line)) = (
        graph.inter(left_stem).stem_median(),
        graph.inter(right_stem).stem_median(),
    ) else {
        return false;
    };

    let head_box = graph.inter(head).bounds();
    let head_center = graph.inter(head).center();
    if head_center.y >= left_line.mid_y() || head_center.y <= right_line.mid_y() {
        return false;
    }

    let left_portion = super::stem_portion_at(head_box.height, &left_line, head_box.y);
    let right_portion =
        super::stem_portion_at(head_box.height, &right_line, head_box.max_y() - 1.0);
    left_portion == super::StemPortion::Top && right_portion == super::StemPortion::Bottom
}

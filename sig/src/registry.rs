//! Compatibility registry: which relation kinds can connect which inter kinds.
//!
//! Registrations are (source kind, relation kind, target kind) triples, some of them against
//! abstract inter kinds (e.g. `Note`, `Chord`) so that a single entry covers a whole subtree.
//! Lookups walk the inter kind's ancestry.  Reduction-only relation kinds are never registered;
//! they exist as graph edges but are invisible to interactive suggestions.

use std::collections::HashMap;

use itertools::Itertools;
use once_cell::sync::Lazy;

use crate::graph::{InterId, SIGraph};
use crate::inter::InterKind;
use crate::relation::RelationKind;

/// The full registration table.  Kept sorted by relation kind name for easy auditing.
const REGISTRATIONS: &[(InterKind, RelationKind, InterKind)] = {
    use InterKind as I;
    use RelationKind as R;
    &[
        (I::Alter, R::AlterHead, I::Head),
        (I::AugmentationDot, R::Augmentation, I::Note),
        (I::Barline, R::BarGroup, I::Barline),
        (I::Beam, R::BeamRest, I::Rest),
        (I::Beam, R::BeamStem, I::Stem),
        (I::Chord, R::ChordArpeggiato, I::Arpeggiato),
        (I::Chord, R::ChordArticulation, I::Articulation),
        (I::Chord, R::ChordDynamics, I::Dynamics),
        (I::Chord, R::ChordGrace, I::Chord),
        (I::Chord, R::ChordName, I::Sentence),
        (I::Chord, R::ChordOrnament, I::Ornament),
        (I::Chord, R::ChordSentence, I::Sentence),
        (I::HeadChord, R::ChordStem, I::Stem),
        (I::Chord, R::ChordSyllable, I::Syllable),
        (I::Chord, R::ChordTuplet, I::Tuplet),
        (I::Chord, R::ChordWedge, I::Wedge),
        (I::Chord, R::Containment, I::Note),
        (I::FermataDot, R::DotFermata, I::Fermata),
        (I::AugmentationDot, R::DoubleDot, I::AugmentationDot),
        (I::Ending, R::EndingBar, I::Barline),
        (I::Ending, R::EndingSentence, I::Sentence),
        (I::Fermata, R::FermataBar, I::Barline),
        (I::Fermata, R::FermataChord, I::Chord),
        (I::Flag, R::FlagStem, I::Stem),
        (I::Head, R::HeadStem, I::Stem),
        (I::Marker, R::MarkerBar, I::Barline),
        (I::Head, R::Mirror, I::Head),
        (I::MultipleRest, R::MultipleRestCount, I::Time),
        (I::Chord, R::NextInVoice, I::Chord),
        (I::OctaveShift, R::OctaveShiftChord, I::Chord),
        (I::AugmentationDot, R::RepeatDotBar, I::Barline),
        (I::AugmentationDot, R::RepeatDotPair, I::AugmentationDot),
        (I::Chord, R::SameTime, I::Chord),
        (I::Chord, R::SameVoice, I::Chord),
        (I::Chord, R::SeparateTime, I::Chord),
        (I::Chord, R::SeparateVoice, I::Chord),
        (I::Slur, R::SlurHead, I::Head),
        (I::Time, R::TimeTopBottom, I::Time),
        (I::Tremolo, R::TremoloStem, I::Stem),
    ]
};

struct Registry {
    from: HashMap<InterKind, Vec<RelationKind>>,
    to: HashMap<InterKind, Vec<RelationKind>>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut from: HashMap<InterKind, Vec<RelationKind>> = HashMap::new();
    let mut to: HashMap<InterKind, Vec<RelationKind>> = HashMap::new();
    for &(source, relation, target) in REGISTRATIONS {
        debug_assert!(
            !relation.is_reduction_only(),
            "{} is reduction-only and must not be registered",
            relation.name()
        );
        from.entry(source).or_default().push(relation);
        to.entry(target).or_default().push(relation);
    }
    Registry { from, to }
});

/// Relation kinds which may leave an inter of the given kind (as source), including those
/// registered against its supertypes
pub fn relations_from(kind: InterKind) -> Vec<RelationKind> {
    lookup(&REGISTRY.from, kind)
}

/// Relation kinds which may reach an inter of the given kind (as target)
pub fn relations_to(kind: InterKind) -> Vec<RelationKind> {
    lookup(&REGISTRY.to, kind)
}

fn lookup(map: &HashMap<InterKind, Vec<RelationKind>>, kind: InterKind) -> Vec<RelationKind> {
    kind.ancestry()
        .filter_map(|k| map.get(&k))
        .flatten()
        .copied()
        .unique()
        .collect()
}

/// Relation kinds registered for the directed (source kind, target kind) pair, inheritance-aware
/// on both ends
pub fn between(source: InterKind, target: InterKind) -> Vec<RelationKind> {
    REGISTRATIONS
        .iter()
        .filter(|(s, _, t)| {
            source.ancestry().any(|k| k == *s) && target.ancestry().any(|k| k == *t)
        })
        .map(|&(_, relation, _)| relation)
        .unique()
        .collect()
}

/// Relation kinds a user could still add from `source` to `target`: the registered kinds for the
/// pair, minus any kind already connecting the two inters (in either direction).  Removed inters
/// get no suggestions.
pub fn suggestions(graph: &SIGraph, source: InterId, target: InterId) -> Vec<RelationKind> {
    if graph.inter(source).is_removed() || graph.inter(target).is_removed() {
        return Vec::new();
    }
    let existing: Vec<RelationKind> = graph
        .edges_between(source, target)
        .into_iter()
        .filter_map(|edge| graph.relation(edge))
        .map(|relation| relation.kind())
        .collect();
    between(graph.inter(source).kind(), graph.inter(target).kind())
        .into_iter()
        .filter(|kind| !existing.contains(kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ConflictPolicy;
    use crate::inter::Inter;
    use crate::relation::Relation;
    use crate::utils::Rectangle;

    #[test]
    fn inheritance_covers_subtypes() {
        // Augmentation is registered against the abstract Note kind
        assert!(relations_to(InterKind::Head).contains(&RelationKind::Augmentation));
        assert!(relations_to(InterKind::Rest).contains(&RelationKind::Augmentation));
        // ChordStem is registered on HeadChord only
        assert!(relations_from(InterKind::HeadChord).contains(&RelationKind::ChordStem));
        assert!(!relations_from(InterKind::RestChord).contains(&RelationKind::ChordStem));
        // But abstract-Chord registrations cover both chord kinds
        assert!(relations_from(InterKind::RestChord).contains(&RelationKind::ChordTuplet));
    }

    #[test]
    fn unregistered_kind_is_empty() {
        assert!(relations_from(InterKind::Clef).is_empty());
        assert!(between(InterKind::Clef, InterKind::Stem).is_empty());
    }

    #[test]
    fn reduction_only_kinds_are_absent() {
        for kind in relations_from(InterKind::Head)
            .into_iter()
            .chain(relations_to(InterKind::Head))
        {
            assert!(!kind.is_reduction_only(), "{}", kind.name());
        }
    }

    #[test]
    fn suggestions_subtract_existing_edges() {
        let mut graph = SIGraph::new();
        let boxed = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let head = graph.add_inter(Inter::new(InterKind::Head, boxed, 0.8));
        let stem = graph.add_inter(Inter::new(InterKind::Stem, boxed, 0.8));

        assert_eq!(
            suggestions(&graph, head, stem),
            vec![RelationKind::HeadStem]
        );

        graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap();
        assert!(suggestions(&graph, head, stem).is_empty());
    }

    #[test]
    fn removed_inter_gets_no_suggestions() {
        let mut graph = SIGraph::new();
        let boxed = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let head = graph.add_inter(Inter::new(InterKind::Head, boxed, 0.8));
        let stem = graph.add_inter(Inter::new(InterKind::Stem, boxed, 0.8));
        graph.remove_inter(head);
        assert!(suggestions(&graph, head, stem).is_empty());
    }
}

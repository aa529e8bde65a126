//! The symbol interpretation graph: inters as vertices, relations as directed edges.
//!
//! The graph owns all structural invariants.  Edge insertion enforces endpoint liveness, the
//! one-edge-per-kind-per-pair rule and the kind's cardinality contract; edge lifecycle hooks run
//! at the boundary and their follow-up edits go through a work queue (see
//! [`GraphCommand`](crate::relation::GraphCommand)), never through re-entrant mutation.
//!
//! Storage is arena-style: inters and edges keep their ids forever, removed edges leave a
//! tombstone, removed inters keep their slot with the `removed` flag set.

use std::collections::VecDeque;

use index_vec::IndexVec;

use crate::error::Error;
use crate::inter::Inter;
use crate::relation::{self, ExclusionCause, GraphCommand, Relation, RelationKind};

index_vec::define_index_type! {
    /// Unique id of an inter within its graph.  Never reused.
    pub struct InterId = u32;
}

index_vec::define_index_type! {
    /// Unique id of an edge within its graph.  Never reused.
    pub struct RelationId = u32;
}

/// What to do when inserting an edge whose kind's cardinality contract is already saturated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail the insertion with [`Error::Conflict`]
    Reject,
    /// Remove the conflicting edge(s) first, then insert
    Preempt,
}

#[derive(Debug, Clone)]
struct Edge {
    source: InterId,
    target: InterId,
    relation: Relation,
}

/// Hard stop for hook cascades; a well-formed cascade converges long before this
const MAX_CASCADE_COMMANDS: usize = 10_000;

#[derive(Debug, Default)]
pub struct SIGraph {
    inters: IndexVec<InterId, Inter>,
    edges: IndexVec<RelationId, Option<Edge>>,
    outgoing: IndexVec<InterId, Vec<RelationId>>,
    incoming: IndexVec<InterId, Vec<RelationId>>,
}

impl SIGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_inter(&mut self, inter: Inter) -> InterId {
        let id = self.inters.push(inter);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    pub fn inter(&self, id: InterId) -> &Inter {
        &self.inters[id]
    }

    pub fn num_inters(&self) -> usize {
        self.inters.len()
    }

    /// Number of live edges
    pub fn num_edges(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Insert an edge, enforcing structural invariants and running the `added` hook cascade.
    ///
    /// Fails with [`Error::RemovedInter`] on a dead endpoint, [`Error::Duplicate`] when an edge
    /// of the same kind already connects the pair, and [`Error::Conflict`] when the kind's
    /// cardinality contract is saturated and `policy` is [`ConflictPolicy::Reject`].
    pub fn add_edge(
        &mut self,
        source: InterId,
        target: InterId,
        relation: Relation,
        policy: ConflictPolicy,
    ) -> crate::Result<RelationId> {
        let mut queue = VecDeque::new();
        let id = self.insert_edge(source, target, relation, policy, &mut queue)?;
        queue.extend(relation::added(self, id));
        self.drain(queue);
        Ok(id)
    }

    /// Structural part of edge insertion: invariant checks, preemption, storage.  Hook commands
    /// from preempted edges go to `queue`; the caller runs the `added` hook itself.
    fn insert_edge(
        &mut self,
        source: InterId,
        target: InterId,
        relation: Relation,
        policy: ConflictPolicy,
        queue: &mut VecDeque<GraphCommand>,
    ) -> crate::Result<RelationId> {
        let kind = relation.kind();
        for id in [source, target] {
            if self.inters[id].removed {
                return Err(Error::RemovedInter(id));
            }
        }
        if self.get_relation(source, target, kind).is_some() {
            return Err(Error::Duplicate {
                kind,
                source,
                target,
            });
        }

        if kind.is_single_target() {
            self.resolve_conflicts(self.outgoing_of(source, kind), kind, source, policy, queue)?;
        }
        if kind.is_single_source() {
            self.resolve_conflicts(self.incoming_of(target, kind), kind, target, policy, queue)?;
        }

        log::debug!(
            "add {} #{} -> #{}",
            kind.name(),
            source.index(),
            target.index()
        );
        let id = self.edges.push(Some(Edge {
            source,
            target,
            relation,
        }));
        self.outgoing[source].push(id);
        self.incoming[target].push(id);
        Ok(id)
    }

    /// Apply the conflict policy to the edges saturating a cardinality contract at `inter`
    fn resolve_conflicts(
        &mut self,
        conflicting: Vec<RelationId>,
        kind: RelationKind,
        inter: InterId,
        policy: ConflictPolicy,
        queue: &mut VecDeque<GraphCommand>,
    ) -> crate::Result<()> {
        if conflicting.is_empty() {
            return Ok(());
        }
        match policy {
            ConflictPolicy::Reject => Err(Error::Conflict { kind, inter }),
            ConflictPolicy::Preempt => {
                for edge in conflicting {
                    if let Some((source, target, relation)) = self.take_edge(edge) {
                        queue.extend(relation::removed(self, source, target, &relation));
                    }
                }
                Ok(())
            }
        }
    }

    /// Remove an edge, running the `removed` hook cascade.  Returns whether an edge was actually
    /// removed.
    pub fn remove_edge(&mut self, edge: RelationId) -> bool {
        let Some((source, target, relation)) = self.take_edge(edge) else {
            return false;
        };
        let queue: VecDeque<_> = relation::removed(self, source, target, &relation).into();
        self.drain(queue);
        true
    }

    /// Mark an inter removed and drop all its edges in cascade.  A no-op on an already-removed
    /// inter.
    pub fn remove_inter(&mut self, id: InterId) {
        if self.inters[id].removed {
            return;
        }
        let mut queue = VecDeque::new();
        self.discard_inter(id, &mut queue);
        self.drain(queue);
    }

    /// Removal without draining: used both by [`Self::remove_inter`] and by cascaded
    /// `RemoveInter` commands sharing an outer queue
    fn discard_inter(&mut self, id: InterId, queue: &mut VecDeque<GraphCommand>) {
        if self.inters[id].is_vip() {
            log::info!("VIP removing inter #{}", id.index());
        }
        // The flag goes up first so hooks fired below see the endpoint as dead
        self.inters[id].removed = true;
        let edges: Vec<RelationId> = self.outgoing[id]
            .iter()
            .chain(&self.incoming[id])
            .copied()
            .collect();
        for edge in edges {
            if let Some((source, target, relation)) = self.take_edge(edge) {
                queue.extend(relation::removed(self, source, target, &relation));
            }
        }
    }

    /// Detach an edge from storage and adjacency, without hooks
    fn take_edge(&mut self, edge: RelationId) -> Option<(InterId, InterId, Relation)> {
        let taken = self.edges[edge].take()?;
        self.outgoing[taken.source].retain(|&e| e != edge);
        self.incoming[taken.target].retain(|&e| e != edge);
        log::debug!(
            "remove {} #{} -> #{}",
            taken.relation.name(),
            taken.source.index(),
            taken.target.index()
        );
        Some((taken.source, taken.target, taken.relation))
    }

    /// Run hook commands until the cascade is quiescent.  Every command re-checks the current
    /// state, so replays are no-ops.
    fn drain(&mut self, mut queue: VecDeque<GraphCommand>) {
        let mut applied = 0;
        while let Some(command) = queue.pop_front() {
            applied += 1;
            if applied > MAX_CASCADE_COMMANDS {
                log::warn!("hook cascade did not converge; dropping {} commands", queue.len() + 1);
                return;
            }
            match command {
                GraphCommand::Link {
                    source,
                    target,
                    relation,
                } => {
                    if self.inters[source].removed
                        || self.inters[target].removed
                        || self.get_relation(source, target, relation.kind()).is_some()
                    {
                        continue;
                    }
                    match self.insert_edge(
                        source,
                        target,
                        relation,
                        ConflictPolicy::Preempt,
                        &mut queue,
                    ) {
                        Ok(id) => queue.extend(relation::added(self, id)),
                        Err(err) => log::warn!("cascaded link failed: {}", err),
                    }
                }
                GraphCommand::Unlink { edge } => {
                    if let Some((source, target, relation)) = self.take_edge(edge) {
                        queue.extend(relation::removed(self, source, target, &relation));
                    }
                }
                GraphCommand::RemoveInter(id) => {
                    if !self.inters[id].removed {
                        self.discard_inter(id, &mut queue);
                    }
                }
                GraphCommand::CheckAbnormal(id) => self.refresh_abnormal(id),
                GraphCommand::MarkDirty(id) => {
                    if !self.inters[id].removed {
                        self.inters[id].dirty = true;
                    }
                }
            }
        }
    }

    /// Recompute the abnormal flag of an inter from its support requirements
    fn refresh_abnormal(&mut self, id: InterId) {
        if self.inters[id].removed {
            return;
        }
        let required = self.inters[id].kind().required_supports();
        if required.is_empty() {
            self.inters[id].abnormal = false;
            return;
        }
        let supported = self.outgoing[id]
            .iter()
            .chain(&self.incoming[id])
            .filter_map(|&edge| self.relation(edge))
            .any(|relation| required.contains(&relation.kind()));
        self.inters[id].abnormal = !supported;
    }

    pub fn relation(&self, edge: RelationId) -> Option<&Relation> {
        self.edges[edge].as_ref().map(|e| &e.relation)
    }

    pub(crate) fn relation_mut(&mut self, edge: RelationId) -> Option<&mut Relation> {
        self.edges[edge].as_mut().map(|e| &mut e.relation)
    }

    /// The (source, target) pair of a live edge
    pub fn edge_ends(&self, edge: RelationId) -> Option<(InterId, InterId)> {
        self.edges[edge].as_ref().map(|e| (e.source, e.target))
    }

    /// The other endpoint of an edge, seen from `inter`
    pub fn opposite_of(&self, inter: InterId, edge: RelationId) -> Option<InterId> {
        let (source, target) = self.edge_ends(edge)?;
        if source == inter {
            Some(target)
        } else if target == inter {
            Some(source)
        } else {
            None
        }
    }

    /// The edge of the given kind from `source` to `target`, if any.  At most one exists.
    pub fn get_relation(
        &self,
        source: InterId,
        target: InterId,
        kind: RelationKind,
    ) -> Option<RelationId> {
        self.outgoing[source]
            .iter()
            .copied()
            .find(|&edge| match &self.edges[edge] {
                Some(e) => e.target == target && e.relation.kind() == kind,
                None => false,
            })
    }

    /// All live edges between the two inters, in either direction
    pub fn edges_between(&self, a: InterId, b: InterId) -> Vec<RelationId> {
        self.outgoing[a]
            .iter()
            .chain(&self.incoming[a])
            .copied()
            .filter(|&edge| self.opposite_of(a, edge) == Some(b))
            .collect()
    }

    /// Outgoing edges of the given kind at `inter`
    pub fn outgoing_of(&self, inter: InterId, kind: RelationKind) -> Vec<RelationId> {
        self.of_kind(&self.outgoing[inter], kind)
    }

    /// Incoming edges of the given kind at `inter`
    pub fn incoming_of(&self, inter: InterId, kind: RelationKind) -> Vec<RelationId> {
        self.of_kind(&self.incoming[inter], kind)
    }

    /// Edges of the given kind at `inter`, in either direction
    pub fn relations_of(&self, inter: InterId, kind: RelationKind) -> Vec<RelationId> {
        let mut edges = self.outgoing_of(inter, kind);
        edges.extend(self.incoming_of(inter, kind));
        edges
    }

    fn of_kind(&self, edges: &[RelationId], kind: RelationKind) -> Vec<RelationId> {
        edges
            .iter()
            .copied()
            .filter(|&edge| {
                self.relation(edge)
                    .is_some_and(|relation| relation.kind() == kind)
            })
            .collect()
    }

    /// Insert an exclusion between two inters, normalizing the direction (lower id as source) so
    /// the pair carries at most one exclusion edge.  Returns the existing edge when one is
    /// already present.
    pub fn insert_exclusion(
        &mut self,
        a: InterId,
        b: InterId,
        cause: ExclusionCause,
    ) -> crate::Result<RelationId> {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        if let Some(existing) = self.get_relation(source, target, RelationKind::Exclusion) {
            return Ok(existing);
        }
        if self.inters[a].is_vip() || self.inters[b].is_vip() {
            log::info!(
                "VIP exclusion {:?} between #{} and #{}",
                cause,
                a.index(),
                b.index()
            );
        }
        self.add_edge(
            source,
            target,
            Relation::exclusion(cause),
            ConflictPolicy::Reject,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inter::{Geometry, InterKind};
    use crate::utils::{Line2D, Rectangle};

    fn boxed() -> Rectangle {
        Rectangle::new(0.0, 0.0, 10.0, 10.0)
    }

    fn head_and_stem(graph: &mut SIGraph) -> (InterId, InterId) {
        let head = graph.add_inter(Inter::new(
            InterKind::Head,
            Rectangle::new(100.0, 100.0, 12.0, 10.0),
            0.8,
        ));
        let stem = graph.add_inter(
            Inter::new(InterKind::Stem, Rectangle::new(112.0, 100.0, 2.0, 60.0), 0.8)
                .with_geometry(Geometry::Stem {
                    median: Line2D::new(113.0, 100.0, 113.0, 160.0),
                }),
        );
        (head, stem)
    }

    #[test]
    fn duplicate_edge_is_rejected() {
        let mut graph = SIGraph::new();
        let (head, stem) = head_and_stem(&mut graph);
        graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap();
        let err = graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap_err();
        assert_eq!(
            err,
            Error::Duplicate {
                kind: RelationKind::HeadStem,
                source: head,
                target: stem,
            }
        );
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn single_target_conflict_rejected_then_preempted() {
        let mut graph = SIGraph::new();
        let chord = graph.add_inter(Inter::new(InterKind::HeadChord, boxed(), 0.8));
        let stem1 = graph.add_inter(Inter::new(InterKind::Stem, boxed(), 0.8));
        let stem2 = graph.add_inter(Inter::new(InterKind::Stem, boxed(), 0.8));

        let first = graph
            .add_edge(
                chord,
                stem1,
                Relation::new(RelationKind::ChordStem),
                ConflictPolicy::Reject,
            )
            .unwrap();

        // A second stem for the same chord violates single-target
        let err = graph
            .add_edge(
                chord,
                stem2,
                Relation::new(RelationKind::ChordStem),
                ConflictPolicy::Reject,
            )
            .unwrap_err();
        assert_eq!(
            err,
            Error::Conflict {
                kind: RelationKind::ChordStem,
                inter: chord,
            }
        );
        assert!(graph.relation(first).is_some());

        // Preemption drops the first edge and installs the second
        graph
            .add_edge(
                chord,
                stem2,
                Relation::new(RelationKind::ChordStem),
                ConflictPolicy::Preempt,
            )
            .unwrap();
        assert!(graph.relation(first).is_none());
        assert!(graph
            .get_relation(chord, stem2, RelationKind::ChordStem)
            .is_some());
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn removed_endpoint_is_rejected() {
        let mut graph = SIGraph::new();
        let (head, stem) = head_and_stem(&mut graph);
        graph.remove_inter(stem);
        let err = graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap_err();
        assert_eq!(err, Error::RemovedInter(stem));
    }

    #[test]
    fn added_hook_populates_head_stem_fields() {
        let mut graph = SIGraph::new();
        let (head, stem) = head_and_stem(&mut graph);
        let edge = graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap();

        let relation = graph.relation(edge).unwrap();
        // Stem center (x 113) right of head center (x 106)
        assert_eq!(
            relation.head_side(),
            Some(crate::utils::HorizontalSide::Right)
        );
        // Stem center below head center: extension snaps to the head's bottom border
        let ext = relation.extension_point().unwrap();
        assert_eq!((ext.x, ext.y), (112.0, 109.0));
    }

    #[test]
    fn abnormal_tracks_support_requirements() {
        let mut graph = SIGraph::new();
        let (head, stem) = head_and_stem(&mut graph);

        let edge = graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap();
        // A stem requires a head-stem support; the hook just cleared the flag
        assert!(!graph.inter(stem).is_abnormal());

        graph.remove_edge(edge);
        assert!(graph.inter(stem).is_abnormal());
        // Heads have no support requirement
        assert!(!graph.inter(head).is_abnormal());
    }

    #[test]
    fn remove_inter_cascades_over_edges() {
        let mut graph = SIGraph::new();
        let (head, stem) = head_and_stem(&mut graph);
        let edge = graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap();

        graph.remove_inter(stem);
        assert!(graph.inter(stem).is_removed());
        assert!(graph.relation(edge).is_none());
        assert_eq!(graph.num_edges(), 0);
        // Removal is idempotent
        graph.remove_inter(stem);
    }

    #[test]
    fn manual_head_stem_reassigns_the_chord() {
        let mut graph = SIGraph::new();
        let chord = graph.add_inter(Inter::new(InterKind::HeadChord, boxed(), 0.8));
        let (head, stem1) = head_and_stem(&mut graph);
        let stem2 = graph.add_inter(
            Inter::new(InterKind::Stem, Rectangle::new(98.0, 40.0, 2.0, 70.0), 0.8)
                .with_geometry(Geometry::Stem {
                    median: Line2D::new(99.0, 40.0, 99.0, 110.0),
                }),
        );

        graph
            .add_edge(
                chord,
                head,
                Relation::new(RelationKind::Containment),
                ConflictPolicy::Reject,
            )
            .unwrap();
        graph
            .add_edge(
                chord,
                stem1,
                Relation::new(RelationKind::ChordStem),
                ConflictPolicy::Reject,
            )
            .unwrap();

        // A manual head-stem link to another stem drags the chord with it
        let mut manual = Relation::new(RelationKind::HeadStem);
        manual.set_manual(true);
        graph
            .add_edge(head, stem2, manual, ConflictPolicy::Preempt)
            .unwrap();

        assert!(graph
            .get_relation(chord, stem1, RelationKind::ChordStem)
            .is_none());
        assert!(graph
            .get_relation(chord, stem2, RelationKind::ChordStem)
            .is_some());
        assert!(graph.inter(chord).is_dirty());
    }

    #[test]
    fn exclusion_is_normalized_and_unique() {
        let mut graph = SIGraph::new();
        let a = graph.add_inter(Inter::new(InterKind::Head, boxed(), 0.8));
        let b = graph.add_inter(Inter::new(InterKind::Head, boxed(), 0.7));

        // Inserted in reverse order, stored lower-id-first
        let first = graph
            .insert_exclusion(b, a, ExclusionCause::Overlap)
            .unwrap();
        assert_eq!(graph.edge_ends(first), Some((a, b)));

        let second = graph
            .insert_exclusion(a, b, ExclusionCause::Incompatible)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn opposite_and_relations_of() {
        let mut graph = SIGraph::new();
        let (head, stem) = head_and_stem(&mut graph);
        let edge = graph
            .add_edge(
                head,
                stem,
                Relation::new(RelationKind::HeadStem),
                ConflictPolicy::Reject,
            )
            .unwrap();

        assert_eq!(graph.opposite_of(head, edge), Some(stem));
        assert_eq!(graph.opposite_of(stem, edge), Some(head));
        assert_eq!(graph.relations_of(stem, RelationKind::HeadStem), vec![edge]);
        assert!(graph.relations_of(stem, RelationKind::BeamStem).is_empty());
    }
}

//! Candidate links: a relation paired with the partner it would connect to, before any edge
//! exists in the graph.
//!
//! Inference code builds [`Link`]s while searching for partners, keeps the best one per kind
//! ([`Link::best_of`]), and applies the winner to the graph.  A [`Partnership`] is the unguarded
//! variant used when the caller has already decided the edge must exist.

use ordered_float::OrderedFloat;

use crate::graph::{ConflictPolicy, InterId, RelationId, SIGraph};
use crate::relation::Relation;

/// An ordered pair of inters, as used by UI-side sequence builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterPair {
    pub source: InterId,
    pub target: InterId,
}

/// A potential edge seen from one of its endpoints: the other endpoint, the relation to insert,
/// and the direction (`outgoing` = the viewpoint inter is the source).
#[derive(Debug, Clone)]
pub struct Link {
    pub partner: InterId,
    pub relation: Relation,
    pub outgoing: bool,
}

impl Link {
    pub fn new(partner: InterId, relation: Relation, outgoing: bool) -> Self {
        Self {
            partner,
            relation,
            outgoing,
        }
    }

    /// Resolve the (source, target) pair for the given viewpoint inter
    fn ends(&self, inter: InterId) -> (InterId, InterId) {
        if self.outgoing {
            (inter, self.partner)
        } else {
            (self.partner, inter)
        }
    }

    /// Insert the link into the graph, seen from `inter`.
    ///
    /// Guarded: nothing happens (and `Ok(false)` is returned) when either endpoint has been
    /// removed or when an edge of the same kind already connects the pair.  Cardinality conflicts
    /// are resolved by preemption, matching interactive semantics.
    pub fn apply_to(&self, graph: &mut SIGraph, inter: InterId) -> crate::Result<bool> {
        let (source, target) = self.ends(inter);
        if graph.inter(source).is_removed() || graph.inter(target).is_removed() {
            return Ok(false);
        }
        if graph
            .get_relation(source, target, self.relation.kind())
            .is_some()
        {
            return Ok(false);
        }
        graph.add_edge(source, target, self.relation.clone(), ConflictPolicy::Preempt)?;
        Ok(true)
    }

    /// Remove the corresponding edge from the graph, seen from `inter`.  Returns whether an edge
    /// was actually removed.
    pub fn remove_from(&self, graph: &mut SIGraph, inter: InterId) -> bool {
        let (source, target) = self.ends(inter);
        match graph.get_relation(source, target, self.relation.kind()) {
            Some(edge) => graph.remove_edge(edge),
            None => false,
        }
    }

    /// The best link among candidates: the first one with the strictly highest relation grade.
    /// Ties keep the earliest candidate; an empty input yields `None`.
    pub fn best_of(links: Vec<Link>) -> Option<Link> {
        links
            .into_iter()
            .reduce(|best, link| {
                if OrderedFloat(link.relation.grade()) > OrderedFloat(best.relation.grade()) {
                    link
                } else {
                    best
                }
            })
    }
}

/// An unguarded link: applying it inserts the edge regardless of existing same-kind edges,
/// surfacing conflicts as errors instead of skipping
#[derive(Debug, Clone)]
pub struct Partnership {
    pub partner: InterId,
    pub relation: Relation,
    pub outgoing: bool,
}

impl Partnership {
    pub fn new(partner: InterId, relation: Relation, outgoing: bool) -> Self {
        Self {
            partner,
            relation,
            outgoing,
        }
    }

    pub fn apply_to(&self, graph: &mut SIGraph, inter: InterId) -> crate::Result<RelationId> {
        let (source, target) = if self.outgoing {
            (inter, self.partner)
        } else {
            (self.partner, inter)
        };
        graph.add_edge(source, target, self.relation.clone(), ConflictPolicy::Reject)
    }
}

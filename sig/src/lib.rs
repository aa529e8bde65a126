//! `sigrel` is the relation subsystem of a symbol interpretation graph for optical music
//! recognition.
//!
//! An OMR engine reads a score image into competing *interpretations* ("inters"): candidate
//! readings of image regions as note heads, stems, beams, accidentals and so on.  Inters become
//! the vertices of a directed graph whose edges, the [`Relation`]s of this crate, express how two
//! interpretations interact: mutual support (a head and a stem reinforce each other), logical
//! exclusion (two readings of the same pixels cannot coexist), or plain structural facts
//! (containment of a note in its chord).
//!
//! # Description
//!
//! The crate covers the edge side of the graph:
//!
//! - a closed set of relation kinds ([`RelationKind`]), each with a fixed behavior profile
//!   (family, cardinality contract, support coefficients, gap maxima and impact weights);
//! - gap-based scoring of candidate connections: measured horizontal/vertical gaps in interline
//!   fractions become normalised impacts, combined into a support grade (see
//!   [`Relation::set_in_out_gaps`]);
//! - geometric feasibility checks building scored relations from raw geometry
//!   ([`head_stem_check`](relation::head_stem_check), [`beam_stem_check`](relation::beam_stem_check));
//! - the graph itself ([`SIGraph`]): arena storage, structural invariants at the insertion
//!   boundary, and edge lifecycle hooks whose cascading edits run through a work queue;
//! - candidate links and their apply/undo semantics ([`Link`], [`Partnership`]);
//! - a compatibility [`registry`] mapping inter kind pairs to the relation kinds a user could
//!   add between them.
//!
//! The crate deliberately stops at the relation layer: it consumes inter identity, classification
//! and geometry but never produces inters, and contracts graded by relations are re-read by the
//! surrounding engine, not interpreted here.

#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links)]

pub mod error;
pub mod grade;
pub mod graph;
pub mod inter;
pub mod link;
pub mod registry;
pub mod relation;
pub mod scale;
pub mod utils;

pub use error::{Error, Result};
pub use grade::{GradeImpacts, Impact};
pub use graph::{ConflictPolicy, InterId, RelationId, SIGraph};
pub use inter::{Inter, InterKind, Shape};
pub use link::{InterPair, Link, Partnership};
pub use relation::{Relation, RelationKind, Tuning};
pub use scale::Scale;

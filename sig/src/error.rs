//! Error types for the different ways that relation handling can fail.

use std::fmt::{Display, Formatter};

use crate::graph::InterId;
use crate::inter::Shape;
use crate::relation::RelationKind;

/// Alias for `Result<T, sigrel::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The different ways that relation handling can fail.
///
/// Everything here is either a configuration/programmer error (bad tuning constants, scoring a
/// relation kind outside its supported branches) or an explicit structural rejection at the graph
/// boundary.  "No relation applies" situations are expressed as empty results, never as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /* CONFIGURATION ERRORS */
    /// A gap maximum used as a divisor in the scoring formula is zero or negative
    ZeroGapMax {
        kind: RelationKind,
        gap: &'static str,
    },
    /// The overlap branch was requested for a kind whose shapes can never overlap
    UnsupportedInGap { kind: RelationKind },
    /// Gap scoring was requested for a kind which carries no measured gaps
    NotGapScored { kind: RelationKind },
    /// A relation was built from a shape outside its expected set
    UnexpectedShape {
        kind: RelationKind,
        shape: Shape,
    },

    /* GRAPH BOUNDARY ERRORS */
    /// Inserting the edge would violate the kind's single-source/single-target contract
    Conflict {
        kind: RelationKind,
        inter: InterId,
    },
    /// An edge of the same kind already connects the two inters
    Duplicate {
        kind: RelationKind,
        source: InterId,
        target: InterId,
    },
    /// An endpoint is already marked removed
    RemovedInter(InterId),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ZeroGapMax { kind, gap } => {
                write!(f, "{} for {} must be > 0", gap, kind.name())
            }
            Error::UnsupportedInGap { kind } => {
                write!(f, "{} never overlaps; no in-gap maximum is defined", kind.name())
            }
            Error::NotGapScored { kind } => {
                write!(f, "{} carries no measured gaps", kind.name())
            }
            Error::UnexpectedShape { kind, shape } => {
                write!(f, "Shape {:?} is not valid for {}", shape, kind.name())
            }
            Error::Conflict { kind, inter } => write!(
                f,
                "Inter #{} already carries a {} edge in that direction",
                inter.index(),
                kind.name()
            ),
            Error::Duplicate {
                kind,
                source,
                target,
            } => write!(
                f,
                "A {} edge already connects #{} to #{}",
                kind.name(),
                source.index(),
                target.index()
            ),
            Error::RemovedInter(id) => write!(f, "Inter #{} is already removed", id.index()),
        }
    }
}

impl std::error::Error for Error {}

//! Error types for interpretation and planning

use thiserror::Error;

/// Errors surfaced by the interpreter and the planner.
///
/// `Ambiguity` doubles as a control-flow signal: the interpreter catches it
/// at the per-parse boundary and keeps trying the remaining parses, folding
/// the carried candidates into an aggregate `AmbiguousReference` when no
/// parse survives. Every other variant propagates to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A candidate list resolved to empty
    #[error("no object matches the description")]
    NoMatch,

    /// `the` bound to more than one candidate at a single nesting level
    #[error("ambiguous reference between {} objects", candidates.len())]
    Ambiguity { candidates: Vec<String> },

    /// `take all X` with more than one X
    #[error("cannot hold more than one object")]
    CannotHoldMany,

    /// `put` issued while nothing is held
    #[error("the arm is not holding anything")]
    ArmEmpty,

    /// More than one parse produced a valid goal
    #[error("ambiguous command: {0} interpretations; try fewer relative descriptions")]
    MultipleInterpretations(usize),

    /// Every parse failed and none raised an ambiguity
    #[error("found no valid interpretation")]
    NoValidInterpretation,

    /// Every parse failed and at least one was ambiguous; lists the
    /// distinct forms the ambiguous candidates could refer to
    #[error("possibly ambiguous command: could mean any of the {}s", forms.join(", "))]
    AmbiguousReference { forms: Vec<String> },

    /// The search exhausted the reachable state space
    #[error("no sequence of actions reaches the goal")]
    NoPath,

    /// The search expanded more states than the configured ceiling
    /// (or ran past the configured deadline)
    #[error("search limit exceeded after {expanded} expansions")]
    SearchLimitExceeded { expanded: usize },

    /// Relation outside the enumerated domain for this operation
    #[error("relation `{0}` is not supported here")]
    UnsupportedRelation(String),

    /// Malformed goal expression text
    #[error("goal syntax error: {0}")]
    GoalSyntax(String),

    /// An action was applied in a state where it is illegal
    #[error("illegal action: {0}")]
    IllegalAction(String),

    /// World snapshot violates a structural invariant
    #[error("invalid world: {0}")]
    InvalidWorld(String),
}

pub type Result<T> = std::result::Result<T, Error>;

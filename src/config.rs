//! This module provides the knobs that control how conflicts are tolerated while building the
//! table and how they are resolved while parsing.
//!
//! A table built without a precedence table or a level automaton is a plain SLR(1) table: any
//! conflict is an error. Supplying either one turns on the matching kind of tolerance.

/// The order in which the parser tries its two conflict-resolution mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionOrder {
    /// Ask the precedence table first, then validate against the tree.
    #[default]
    PrecedenceFirst,
    /// Validate against the tree first, then ask the precedence table.
    AutomatonFirst,
}

/// One step of conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolver {
    Precedence,
    Automaton,
}

impl ResolutionOrder {
    pub(crate) fn resolvers(self) -> [Resolver; 2] {
        match self {
            ResolutionOrder::PrecedenceFirst => [Resolver::Precedence, Resolver::Automaton],
            ResolutionOrder::AutomatonFirst => [Resolver::Automaton, Resolver::Precedence],
        }
    }
}

/// Which conflicts the table builder accepts, and how the parser resolves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConflictPolicy {
    /// Keep shift/reduce cells instead of failing. Needs a precedence table or a level automaton
    /// to resolve them at parse time.
    pub allow_shift_reduce: bool,
    /// Keep reduce/reduce cells instead of failing. Needs a level automaton to resolve them.
    pub allow_reduce_reduce: bool,
    /// Which resolver runs first.
    pub order: ResolutionOrder,
    /// Log every tolerated conflict cell with `log::warn!`.
    pub report_conflicts: bool,
}

impl ConflictPolicy {
    /// No conflicts allowed.
    pub fn strict() -> Self {
        ConflictPolicy::default()
    }

    /// The policy implied by which resolution mechanisms are available: shift/reduce cells need
    /// either of them, reduce/reduce cells need the automaton.
    pub fn for_inputs(has_precedence: bool, has_automaton: bool) -> Self {
        ConflictPolicy {
            allow_shift_reduce: has_precedence || has_automaton,
            allow_reduce_reduce: has_automaton,
            ..ConflictPolicy::default()
        }
    }

    /// Change the resolution order.
    pub fn with_order(self, order: ResolutionOrder) -> Self {
        ConflictPolicy { order, ..self }
    }

    /// Turn conflict reporting on or off.
    pub fn with_reporting(self, report_conflicts: bool) -> Self {
        ConflictPolicy {
            report_conflicts,
            ..self
        }
    }
}

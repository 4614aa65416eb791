//! This crate parses with tree-controlled grammars: context-free grammars whose derivation trees
//! must also have every level (the left-to-right symbols at one depth) accepted by a finite
//! automaton.
//!
//! To use this crate, build a [`Grammar`](struct.Grammar.html), optionally a level
//! [`FiniteAutomaton`](struct.FiniteAutomaton.html) and a
//! [`PrecedenceTable`](struct.PrecedenceTable.html), and call [`build_table`]. Then feed tokens
//! to [`parse`] through a [`TokenSource`](trait.TokenSource.html).
//!
//! The table is an SLR(1) table that may keep conflicting cells. The parser resolves them with
//! the precedence table and by checking which choice keeps the tree levels acceptable to the
//! automaton; see [`ConflictPolicy`](struct.ConflictPolicy.html).

#![deny(missing_docs)]

pub mod config;
pub use config::{ConflictPolicy, ResolutionOrder};

mod automaton;
mod driver;
mod eff;
mod grammar;
mod precedence;
mod symbol;
mod table;
mod token;
mod tree;

pub use automaton::{AutomatonError, AutomatonPosition, FiniteAutomaton, StateId};
pub use driver::{ParseDriver, ParseError, StackFrame};
pub use eff::EmptyFirstFollow;
pub use grammar::{Grammar, GrammarError, Rule};
pub use precedence::{Associativity, PrecedenceAction, PrecedenceError, PrecedenceTable};
pub use symbol::Symbol;
pub use table::{ActionCell, BuildError, Group, Item, LrTable, LrTableBuilder, TableEntry};
pub use token::{Location, SymbolTokens, TokenSource, WhitespaceTokens};
pub use tree::{DerivationTree, DerivationTreeValidator, Node, NodeId, TreeError};

#[cfg(test)]
mod tests;

/// Build a parse table. Supplying a precedence table allows shift/reduce conflicts; supplying a
/// level automaton allows all conflicts and turns on tree-level checks. The automaton is prepared
/// (epsilon-free, deterministic) here.
pub fn build_table(
    grammar: &Grammar,
    precedence: Option<PrecedenceTable>,
    automaton: Option<FiniteAutomaton>,
) -> Result<LrTable, BuildError> {
    let mut builder = LrTableBuilder::new(grammar);
    if let Some(precedence) = precedence {
        builder = builder.precedence(precedence);
    }
    if let Some(automaton) = automaton {
        builder = builder.level_automaton(automaton);
    }
    builder.build()
}

/// Parse one input with a fresh [`ParseDriver`].
pub fn parse<S: TokenSource>(table: &LrTable, tokens: &mut S) -> Result<DerivationTree, ParseError> {
    ParseDriver::new(table).parse(tokens)
}

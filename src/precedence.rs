//! Operator precedence and associativity.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::symbol::Symbol;

/// Associativity of a precedence group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// Equal priority reduces.
    Left,
    /// Equal priority shifts.
    Right,
    /// Equal priority is an error.
    NonAssoc,
}

/// What the precedence table decides for a shift/reduce conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceAction {
    /// Shift the lookahead.
    Shift,
    /// Reduce the stack.
    Reduce,
}

/// An error from the precedence table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrecedenceError {
    /// The symbol already belongs to a group.
    #[error("precedence for '{0}' is defined twice")]
    Duplicate(Symbol),
    /// One of the compared symbols has no entry.
    #[error("no precedence rule for symbols '{0}' and '{1}'")]
    Missing(Symbol, Symbol),
    /// A non-associative symbol met a symbol of the same group.
    #[error("non-associative token '{0}' is on the stack")]
    NonAssociative(Symbol),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PrecedenceItem {
    assoc: Associativity,
    priority: usize,
}

/// A precedence table. Groups declared first bind tightest.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceTable {
    table: BTreeMap<Symbol, PrecedenceItem>,
    groups: usize,
}

impl PrecedenceTable {
    /// An empty table.
    pub fn new() -> PrecedenceTable {
        PrecedenceTable::default()
    }

    /// Declare the next precedence group.
    pub fn add_precedence<I, S>(&mut self, assoc: Associativity, terms: I) -> Result<(), PrecedenceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let priority = self.groups;
        for term in terms {
            let term = term.into();
            if self.table.contains_key(&term) {
                return Err(PrecedenceError::Duplicate(term));
            }
            self.table.insert(term, PrecedenceItem { assoc, priority });
        }
        self.groups += 1;
        Ok(())
    }

    /// Whether `symbol` has a precedence entry.
    pub fn is_defined(&self, symbol: &Symbol) -> bool {
        self.table.contains_key(symbol)
    }

    /// Decide between shifting `lookahead` and reducing with `on_stack` as the
    /// nearest precedence-carrying stack symbol.
    pub fn get_precedence(
        &self,
        on_stack: &Symbol,
        lookahead: &Symbol,
    ) -> Result<PrecedenceAction, PrecedenceError> {
        let (stack, actual) = match (self.table.get(on_stack), self.table.get(lookahead)) {
            (Some(s), Some(a)) => (s, a),
            _ => return Err(PrecedenceError::Missing(on_stack.clone(), lookahead.clone())),
        };
        if stack.priority == actual.priority {
            match stack.assoc {
                Associativity::Right => Ok(PrecedenceAction::Shift),
                Associativity::Left => Ok(PrecedenceAction::Reduce),
                Associativity::NonAssoc => Err(PrecedenceError::NonAssociative(on_stack.clone())),
            }
        } else if stack.priority < actual.priority {
            Ok(PrecedenceAction::Reduce)
        } else {
            Ok(PrecedenceAction::Shift)
        }
    }
}

impl Display for PrecedenceTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (sym, item) in self.table.iter() {
            writeln!(f, "{}: {}, {:?}", sym, item.priority, item.assoc)?;
        }
        Ok(())
    }
}

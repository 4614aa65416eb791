//! Interned grammar and automaton symbols.

use std::borrow::Borrow;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

/// An opaque symbol: a terminal, a nonterminal or an automaton input.
///
/// Symbols compare by their text. The empty symbol doubles as the end-of-input
/// marker for the parser and as the epsilon label inside automata.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Create a symbol from its name.
    pub fn new(name: impl AsRef<str>) -> Symbol {
        Symbol(Arc::from(name.as_ref()))
    }

    /// The empty symbol (end-marker / epsilon).
    pub fn empty() -> Symbol {
        Symbol(Arc::from(""))
    }

    /// Whether this is the empty symbol.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name of the symbol.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Symbol {
    fn default() -> Symbol {
        Symbol::empty()
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Symbol {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Symbol {
        Symbol(Arc::from(s))
    }
}

impl From<&Symbol> for Symbol {
    fn from(s: &Symbol) -> Symbol {
        s.clone()
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            f.write_str("$")
        } else {
            write!(f, "'{}'", self.0)
        }
    }
}

//! Context-free grammar data model.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use crate::symbol::Symbol;

/// An error while defining a grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// Symbols must have a non-empty name.
    #[error("symbol name must not be empty")]
    EmptyName,
    /// The symbol was already declared (as a terminal or a nonterminal).
    #[error("duplicate symbol '{0}'")]
    DuplicateSymbol(Symbol),
    /// A rule's left side must be a nonterminal.
    #[error("left side of a rule must be a nonterminal, got terminal '{0}'")]
    InvalidLeftSide(Symbol),
    /// The symbol was never declared.
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(Symbol),
    /// The start symbol must be a declared nonterminal.
    #[error("start symbol '{0}' is not a nonterminal")]
    StartNotNonterminal(Symbol),
    /// No start symbol was set.
    #[error("grammar has no start symbol")]
    MissingStart,
}

/// A rule `lhs -> rhs` of a context-free grammar.
///
/// Rules are addressed by their index in [`Grammar::rules`]; two rules with the
/// same text are still distinct rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// The nonterminal on the left-hand side.
    pub lhs: Symbol,
    /// The symbols on the right-hand side. Empty for an epsilon rule.
    pub rhs: Vec<Symbol>,
}

impl Rule {
    /// Create a rule. No validation happens here; see [`Grammar::add_rule`].
    pub fn new(lhs: Symbol, rhs: Vec<Symbol>) -> Rule {
        Rule { lhs, rhs }
    }

    /// Whether the right-hand side is empty.
    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        for sym in &self.rhs {
            write!(f, " {}", sym)?;
        }
        Ok(())
    }
}

/// A context-free grammar: disjoint terminal and nonterminal sets, an ordered
/// list of rules and a start nonterminal.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    terminals: BTreeSet<Symbol>,
    nonterminals: BTreeSet<Symbol>,
    rules: Vec<Rule>,
    start: Option<Symbol>,
}

impl Grammar {
    /// Create an empty grammar.
    pub fn new() -> Grammar {
        Grammar::default()
    }

    fn check_new(&self, name: &Symbol) -> Result<(), GrammarError> {
        if name.is_empty() {
            return Err(GrammarError::EmptyName);
        }
        if self.terminals.contains(name) || self.nonterminals.contains(name) {
            return Err(GrammarError::DuplicateSymbol(name.clone()));
        }
        Ok(())
    }

    /// Declare a terminal.
    pub fn add_terminal(&mut self, name: impl Into<Symbol>) -> Result<Symbol, GrammarError> {
        let name = name.into();
        self.check_new(&name)?;
        self.terminals.insert(name.clone());
        Ok(name)
    }

    /// Declare a nonterminal.
    pub fn add_nonterminal(&mut self, name: impl Into<Symbol>) -> Result<Symbol, GrammarError> {
        let name = name.into();
        self.check_new(&name)?;
        self.nonterminals.insert(name.clone());
        Ok(name)
    }

    /// Append a rule and return its index.
    pub fn add_rule<I, S>(&mut self, lhs: impl Into<Symbol>, rhs: I) -> Result<usize, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let lhs = lhs.into();
        if self.terminals.contains(&lhs) {
            return Err(GrammarError::InvalidLeftSide(lhs));
        }
        if !self.nonterminals.contains(&lhs) {
            return Err(GrammarError::UnknownSymbol(lhs));
        }
        let rhs: Vec<Symbol> = rhs.into_iter().map(Into::into).collect();
        if let Some(sym) = rhs.iter().find(|s| !self.is_symbol(s)) {
            return Err(GrammarError::UnknownSymbol(sym.clone()));
        }
        self.rules.push(Rule { lhs, rhs });
        Ok(self.rules.len() - 1)
    }

    /// Set the start nonterminal.
    pub fn set_start(&mut self, name: impl Into<Symbol>) -> Result<(), GrammarError> {
        let name = name.into();
        if !self.nonterminals.contains(&name) {
            return Err(GrammarError::StartNotNonterminal(name));
        }
        self.start = Some(name);
        Ok(())
    }

    /// The start nonterminal, if set.
    pub fn start(&self) -> Option<&Symbol> {
        self.start.as_ref()
    }

    /// All rules, in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule at `index`.
    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Rules whose left-hand side is `lhs`, with their indices.
    pub fn rules_for<'a>(&'a self, lhs: &'a Symbol) -> impl Iterator<Item = (usize, &'a Rule)> + 'a {
        self.rules.iter().enumerate().filter(move |(_, r)| r.lhs == *lhs)
    }

    /// The terminal alphabet.
    pub fn terminals(&self) -> &BTreeSet<Symbol> {
        &self.terminals
    }

    /// The nonterminals.
    pub fn nonterminals(&self) -> &BTreeSet<Symbol> {
        &self.nonterminals
    }

    /// Whether `sym` is a declared terminal.
    pub fn is_terminal(&self, sym: &Symbol) -> bool {
        self.terminals.contains(sym)
    }

    /// Whether `sym` is a declared nonterminal.
    pub fn is_nonterminal(&self, sym: &Symbol) -> bool {
        self.nonterminals.contains(sym)
    }

    /// Whether `sym` is declared at all.
    pub fn is_symbol(&self, sym: &Symbol) -> bool {
        self.is_terminal(sym) || self.is_nonterminal(sym)
    }

    /// Render rule `index` with terminals quoted, e.g. `S -> 'a' S 'b'`.
    pub fn rule_text(&self, index: usize) -> String {
        let rule = match self.rules.get(index) {
            Some(rule) => rule,
            None => return format!("<rule {}>", index),
        };
        let mut s = format!("{} ->", rule.lhs);
        if rule.rhs.is_empty() {
            s.push_str(" ''");
        }
        for sym in &rule.rhs {
            if self.is_terminal(sym) {
                s.push_str(&format!(" '{}'", sym));
            } else {
                s.push_str(&format!(" {}", sym));
            }
        }
        s
    }

    /// A copy of this grammar with a fresh start rule `start' -> start`
    /// prepended as rule 0. Returns the grammar and the new start symbol.
    pub(crate) fn augmented(&self) -> Result<(Grammar, Symbol), GrammarError> {
        let start = self.start.clone().ok_or(GrammarError::MissingStart)?;
        let mut name = format!("{}*", start);
        while self.is_symbol(&Symbol::new(&name)) {
            name.push('*');
        }
        let fresh = Symbol::from(name);
        let mut rules = Vec::with_capacity(self.rules.len() + 1);
        rules.push(Rule::new(fresh.clone(), vec![start]));
        rules.extend(self.rules.iter().cloned());
        let mut nonterminals = self.nonterminals.clone();
        nonterminals.insert(fresh.clone());
        Ok((
            Grammar {
                terminals: self.terminals.clone(),
                nonterminals,
                rules,
                start: Some(fresh.clone()),
            },
            fresh,
        ))
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..self.rules.len() {
            writeln!(f, "{}: {}", i, self.rule_text(i))?;
        }
        Ok(())
    }
}

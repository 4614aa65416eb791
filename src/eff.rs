//! Empty, FIRST and FOLLOW sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::Grammar;
use crate::symbol::Symbol;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PredictRow {
    empty: bool,
    first: BTreeSet<Symbol>,
    follow: BTreeSet<Symbol>,
}

/// The Empty/First/Follow table of a grammar.
///
/// The end-marker (the empty symbol) is in the FOLLOW set of the start symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyFirstFollow {
    rows: BTreeMap<Symbol, PredictRow>,
}

impl EmptyFirstFollow {
    /// Compute the table by iterating to a fixed point.
    pub fn new(grammar: &Grammar) -> EmptyFirstFollow {
        let mut rows: BTreeMap<Symbol, PredictRow> = BTreeMap::new();
        for n in grammar.nonterminals() {
            rows.insert(n.clone(), PredictRow::default());
        }
        for t in grammar.terminals() {
            let mut row = PredictRow::default();
            row.first.insert(t.clone());
            rows.insert(t.clone(), row);
        }
        let mut eff = EmptyFirstFollow { rows };

        let mut passes = 0;
        loop {
            let mut changed = false;
            for rule in grammar.rules() {
                let mut first = BTreeSet::new();
                let mut empty = true;
                for sym in rule.rhs.iter() {
                    first.extend(eff.first_of(sym).iter().cloned());
                    if !eff.is_empty(sym) {
                        empty = false;
                        break;
                    }
                }
                if let Some(row) = eff.rows.get_mut(&rule.lhs) {
                    for t in first {
                        if row.first.insert(t) {
                            changed = true;
                        }
                    }
                    if empty && !row.empty {
                        row.empty = true;
                        changed = true;
                    }
                }
            }
            passes += 1;
            if !changed {
                break;
            }
        }
        log::debug!("empty/first converged after {} passes", passes);

        if let Some(row) = grammar.start().and_then(|s| eff.rows.get_mut(s)) {
            row.follow.insert(Symbol::empty());
        }

        passes = 0;
        loop {
            let mut changed = false;
            for rule in grammar.rules() {
                for (i, sym) in rule.rhs.iter().enumerate() {
                    if !grammar.is_nonterminal(sym) {
                        continue;
                    }
                    let rest = &rule.rhs[i + 1..];
                    let mut gained = eff.first(rest);
                    if eff.empty(rest) {
                        gained.extend(eff.follow(&rule.lhs).iter().cloned());
                    }
                    if let Some(row) = eff.rows.get_mut(sym) {
                        for t in gained {
                            if row.follow.insert(t) {
                                changed = true;
                            }
                        }
                    }
                }
            }
            passes += 1;
            if !changed {
                break;
            }
        }
        log::debug!("follow converged after {} passes", passes);

        eff
    }

    fn first_of(&self, symbol: &Symbol) -> &BTreeSet<Symbol> {
        static NONE: BTreeSet<Symbol> = BTreeSet::new();
        self.rows.get(symbol).map_or(&NONE, |r| &r.first)
    }

    /// Whether `symbol` can derive the empty string.
    pub fn is_empty(&self, symbol: &Symbol) -> bool {
        self.rows.get(symbol).map_or(false, |r| r.empty)
    }

    /// Whether the whole sequence can derive the empty string.
    pub fn empty(&self, symbols: &[Symbol]) -> bool {
        symbols.iter().all(|s| self.is_empty(s))
    }

    /// Terminals that can start a derivation of the sequence.
    pub fn first(&self, symbols: &[Symbol]) -> BTreeSet<Symbol> {
        let mut first = BTreeSet::new();
        for sym in symbols {
            first.extend(self.first_of(sym).iter().cloned());
            if !self.is_empty(sym) {
                break;
            }
        }
        first
    }

    /// Terminals (and possibly the end-marker) that can follow `symbol`.
    pub fn follow(&self, symbol: &Symbol) -> &BTreeSet<Symbol> {
        static NONE: BTreeSet<Symbol> = BTreeSet::new();
        self.rows.get(symbol).map_or(&NONE, |r| &r.follow)
    }
}

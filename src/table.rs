//! LR(0) item sets and the SLR(1) action table built from them.
//!
//! The table is built from the canonical collection of LR(0) groups, with
//! reductions placed on the FOLLOW set of the rule's left-hand side. Cells that
//! hold more than one action are kept only when the [`ConflictPolicy`] allows
//! them; the parse driver resolves them later.

use std::collections::{btree_map, BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Display};
use std::io::{self, Write};

use crate::automaton::{AutomatonError, FiniteAutomaton};
use crate::config::{ConflictPolicy, ResolutionOrder};
use crate::eff::EmptyFirstFollow;
use crate::grammar::{Grammar, GrammarError};
use crate::precedence::PrecedenceTable;
use crate::symbol::Symbol;

/// An error while building the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The grammar is malformed.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    /// The level automaton is malformed.
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
    /// A shift/reduce conflict and no way to resolve it.
    #[error("shift/reduce conflict in state {state} on '{symbol}': shift to {shift} or reduce by {rule}")]
    ShiftReduceConflict {
        /// The state in which the conflict occurs.
        state: usize,
        /// The lookahead symbol; empty for end of input.
        symbol: Symbol,
        /// The shift target.
        shift: usize,
        /// The reduce rule.
        rule: String,
    },
    /// A reduce/reduce conflict and no level automaton to resolve it.
    #[error("reduce/reduce conflict in state {state} on '{symbol}': {first} or {second}")]
    ReduceReduceConflict {
        /// The state in which the conflict occurs.
        state: usize,
        /// The lookahead symbol; empty for end of input.
        symbol: Symbol,
        /// The rule already in the cell.
        first: String,
        /// The competing rule.
        second: String,
    },
    /// Accepting competes with a reduction at the end of input.
    #[error("accept conflicts with reduce by {rule} in state {state}")]
    AcceptConflict {
        /// The state in which the conflict occurs.
        state: usize,
        /// The reduce rule.
        rule: String,
    },
    /// Two different shift targets for one cell.
    #[error("inconsistent shift in state {state} on '{symbol}': {first} and {second}")]
    InconsistentShift {
        /// The state.
        state: usize,
        /// The symbol.
        symbol: Symbol,
        /// The target already in the cell.
        first: usize,
        /// The competing target.
        second: usize,
    },
    /// Two different goto targets for one cell.
    #[error("inconsistent goto in state {state} on '{symbol}': {first} and {second}")]
    InconsistentGoto {
        /// The state.
        state: usize,
        /// The symbol.
        symbol: Symbol,
        /// The target already in the cell.
        first: usize,
        /// The competing target.
        second: usize,
    },
    /// A goto and an action were placed in one cell, or a transition is missing.
    #[error("malformed table cell in state {state} on '{symbol}'")]
    MalformedCell {
        /// The state.
        state: usize,
        /// The symbol.
        symbol: Symbol,
    },
}

/// An item: a rule with a marker showing how much of it has been matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    /// Index of the rule in the augmented grammar.
    pub rule: usize,
    /// Marker position, `0..=rhs.len()`.
    pub marker: usize,
}

/// A group of items: one state of the LR(0) machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The items, closed under the closure rule.
    pub items: BTreeSet<Item>,
    /// Transitions to other groups.
    pub transitions: BTreeMap<Symbol, usize>,
}

/// The candidate actions for one (state, terminal) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionCell {
    shift: Option<usize>,
    reduces: BTreeSet<usize>,
}

impl ActionCell {
    /// The shift target, if shifting is a candidate.
    pub fn shift(&self) -> Option<usize> {
        self.shift
    }

    /// The candidate reduce rules.
    pub fn reduces(&self) -> &BTreeSet<usize> {
        &self.reduces
    }

    /// A shift competes with at least one reduce.
    pub fn is_shift_reduce(&self) -> bool {
        self.shift.is_some() && !self.reduces.is_empty()
    }

    /// Several reduces compete.
    pub fn is_reduce_reduce(&self) -> bool {
        self.reduces.len() > 1
    }

    /// More than one candidate.
    pub fn is_conflict(&self) -> bool {
        self.is_shift_reduce() || self.is_reduce_reduce()
    }
}

impl Display for ActionCell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts = vec![];
        if let Some(s) = self.shift {
            parts.push(format!("{}s", s));
        }
        parts.extend(self.reduces.iter().map(|r| format!("{}r", r)));
        f.write_str(&parts.join("/"))
    }
}

/// One cell of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEntry {
    /// Accept the input.
    Accept,
    /// Go to a state after reducing to a nonterminal.
    Goto(usize),
    /// Shift and/or reduce.
    Action(ActionCell),
}

impl Display for TableEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableEntry::Accept => f.write_str("acc"),
            TableEntry::Goto(s) => write!(f, "{}", s),
            TableEntry::Action(cell) => cell.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Insert {
    Accept,
    Goto(usize),
    Shift(usize),
    Reduce(usize),
}

impl Insert {
    fn into_entry(self) -> TableEntry {
        match self {
            Insert::Accept => TableEntry::Accept,
            Insert::Goto(s) => TableEntry::Goto(s),
            Insert::Shift(s) => TableEntry::Action(ActionCell {
                shift: Some(s),
                reduces: BTreeSet::new(),
            }),
            Insert::Reduce(r) => TableEntry::Action(ActionCell {
                shift: None,
                reduces: Some(r).into_iter().collect(),
            }),
        }
    }
}

/// A built parse table, together with everything the driver needs to resolve
/// the conflicts it contains.
///
/// Read-only after construction; it can be shared between parses.
#[derive(Debug, Clone)]
pub struct LrTable {
    grammar: Grammar,
    groups: Vec<Group>,
    rows: Vec<BTreeMap<Symbol, TableEntry>>,
    precedence: Option<PrecedenceTable>,
    automaton: Option<FiniteAutomaton>,
    policy: ConflictPolicy,
}

impl LrTable {
    /// The augmented grammar; rule 0 is the accepting rule.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The LR(0) groups; group 0 is the start state.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no states.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The cell for `state` and `symbol`.
    pub fn entry(&self, state: usize, symbol: &Symbol) -> Option<&TableEntry> {
        self.rows.get(state).and_then(|row| row.get(symbol))
    }

    /// The goto target for `state` and a nonterminal.
    pub fn goto(&self, state: usize, nonterminal: &Symbol) -> Option<usize> {
        match self.entry(state, nonterminal) {
            Some(TableEntry::Goto(target)) => Some(*target),
            _ => None,
        }
    }

    /// All cells with more than one candidate action.
    pub fn conflicts(&self) -> impl Iterator<Item = (usize, &Symbol, &ActionCell)> {
        self.rows.iter().enumerate().flat_map(|(state, row)| {
            row.iter().filter_map(move |(sym, entry)| match entry {
                TableEntry::Action(cell) if cell.is_conflict() => Some((state, sym, cell)),
                _ => None,
            })
        })
    }

    /// The precedence table, if one was supplied.
    pub fn precedence(&self) -> Option<&PrecedenceTable> {
        self.precedence.as_ref()
    }

    /// The prepared level automaton, if one was supplied.
    pub fn automaton(&self) -> Option<&FiniteAutomaton> {
        self.automaton.as_ref()
    }

    /// The conflict policy the table was built with.
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Render an item, e.g. `S → 'a' • S 'b'`.
    pub fn item_text(&self, item: &Item) -> String {
        let rule = match self.grammar.rule(item.rule) {
            Some(rule) => rule,
            None => return format!("<rule {}>", item.rule),
        };
        let mut s = format!("{} →", rule.lhs);
        for (j, sym) in rule.rhs.iter().enumerate() {
            if j == item.marker {
                s.push_str(" •");
            }
            if self.grammar.is_terminal(sym) {
                s.push_str(&format!(" '{}'", sym));
            } else {
                s.push_str(&format!(" {}", sym));
            }
        }
        if item.marker == rule.rhs.len() {
            s.push_str(" •");
        }
        s
    }

    /// Write the item-set machine in graphviz format.
    pub fn write_graphviz<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            r#"digraph G {{
    node [
        shape="box",
        style="rounded",
        penwidth=1,
        width=2.0
    ];"#
        )?;
        for (i, group) in self.groups.iter().enumerate() {
            write!(out, "s{}[label=<", i)?;
            for item in group.items.iter() {
                let text = self
                    .item_text(item)
                    .replace('&', "&amp;")
                    .replace('<', "&lt;")
                    .replace('>', "&gt;");
                write!(out, "{}<br />", text)?;
            }
            writeln!(out, ">]")?;
            for (sym, &target) in group.transitions.iter() {
                writeln!(out, "s{} -> s{} [label=<{}>]", i, target, sym)?;
            }
        }
        writeln!(out, "}}")
    }
}

impl Display for LrTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let start = self.grammar.rule(0).map(|r| r.lhs.clone());
        let mut columns: Vec<Symbol> = self.grammar.terminals().iter().cloned().collect();
        columns.push(Symbol::empty());
        columns.extend(
            self.grammar
                .nonterminals()
                .iter()
                .filter(|n| Some(*n) != start.as_ref())
                .cloned(),
        );
        let header: Vec<String> = columns
            .iter()
            .map(|c| if c.is_empty() { "$".to_string() } else { c.to_string() })
            .collect();
        writeln!(f, "#\t{}", header.join("\t"))?;
        for (i, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| row.get(c).map(|e| e.to_string()).unwrap_or_default())
                .collect();
            writeln!(f, "{}\t{}", i, cells.join("\t"))?;
        }
        Ok(())
    }
}

/// Builds an [`LrTable`] from a grammar and the optional conflict-resolution inputs.
#[derive(Debug)]
pub struct LrTableBuilder<'g> {
    grammar: &'g Grammar,
    precedence: Option<PrecedenceTable>,
    automaton: Option<FiniteAutomaton>,
    order: ResolutionOrder,
    report_conflicts: bool,
    policy: Option<ConflictPolicy>,
}

impl<'g> LrTableBuilder<'g> {
    /// Start building a table for `grammar`.
    pub fn new(grammar: &'g Grammar) -> Self {
        LrTableBuilder {
            grammar,
            precedence: None,
            automaton: None,
            order: ResolutionOrder::default(),
            report_conflicts: false,
            policy: None,
        }
    }

    /// Use a precedence table; this allows shift/reduce cells.
    pub fn precedence(mut self, precedence: PrecedenceTable) -> Self {
        self.precedence = Some(precedence);
        self
    }

    /// Use a level automaton; this allows all conflicts. The automaton is
    /// prepared (epsilon-free, deterministic) during `build`.
    pub fn level_automaton(mut self, automaton: FiniteAutomaton) -> Self {
        self.automaton = Some(automaton);
        self
    }

    /// Set the order in which conflicts are resolved at parse time.
    pub fn resolution_order(mut self, order: ResolutionOrder) -> Self {
        self.order = order;
        self
    }

    /// Log tolerated conflicts.
    pub fn report_conflicts(mut self, report: bool) -> Self {
        self.report_conflicts = report;
        self
    }

    /// Override the policy derived from the supplied inputs.
    pub fn policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the table.
    pub fn build(self) -> Result<LrTable, BuildError> {
        let (grammar, _) = self.grammar.augmented()?;
        let mut automaton = self.automaton;
        if let Some(automaton) = automaton.as_mut() {
            automaton.prepare()?;
        }
        let policy = self.policy.unwrap_or_else(|| {
            ConflictPolicy::for_inputs(self.precedence.is_some(), automaton.is_some())
                .with_order(self.order)
                .with_reporting(self.report_conflicts)
        });

        let groups = lr0_groups(&grammar);
        log::debug!("{} groups for {} rules", groups.len(), grammar.rules().len());
        let eff = EmptyFirstFollow::new(&grammar);

        let mut filler = Filler {
            grammar: &grammar,
            policy,
            rows: vec![],
        };
        for (i, group) in groups.iter().enumerate() {
            filler.rows.push(BTreeMap::new());
            for item in group.items.iter() {
                let rule = &grammar.rules()[item.rule];
                if item.rule == 0 && item.marker == rule.rhs.len() {
                    filler.insert(i, &Symbol::empty(), Insert::Accept)?;
                    continue;
                }
                match rule.rhs.get(item.marker) {
                    None => {
                        for sym in eff.follow(&rule.lhs) {
                            filler.insert(i, sym, Insert::Reduce(item.rule))?;
                        }
                    }
                    Some(sym) => {
                        let target =
                            group
                                .transitions
                                .get(sym)
                                .copied()
                                .ok_or_else(|| BuildError::MalformedCell {
                                    state: i,
                                    symbol: sym.clone(),
                                })?;
                        if grammar.is_nonterminal(sym) {
                            filler.insert(i, sym, Insert::Goto(target))?;
                        } else {
                            filler.insert(i, sym, Insert::Shift(target))?;
                        }
                    }
                }
            }
        }
        let rows = filler.rows;

        Ok(LrTable {
            grammar,
            groups,
            rows,
            precedence: self.precedence,
            automaton,
            policy,
        })
    }
}

struct Filler<'a> {
    grammar: &'a Grammar,
    policy: ConflictPolicy,
    rows: Vec<BTreeMap<Symbol, TableEntry>>,
}

impl<'a> Filler<'a> {
    fn insert(&mut self, state: usize, symbol: &Symbol, new: Insert) -> Result<(), BuildError> {
        let grammar = self.grammar;
        let policy = self.policy;
        let row = &mut self.rows[state];
        let mut slot = match row.entry(symbol.clone()) {
            btree_map::Entry::Vacant(v) => {
                v.insert(new.into_entry());
                return Ok(());
            }
            btree_map::Entry::Occupied(o) => o,
        };
        match (slot.get_mut(), new) {
            (TableEntry::Accept, Insert::Accept) => Ok(()),
            (TableEntry::Goto(first), Insert::Goto(second)) => {
                if *first == second {
                    Ok(())
                } else {
                    Err(BuildError::InconsistentGoto {
                        state,
                        symbol: symbol.clone(),
                        first: *first,
                        second,
                    })
                }
            }
            (TableEntry::Accept, Insert::Reduce(r)) => Err(BuildError::AcceptConflict {
                state,
                rule: grammar.rule_text(r),
            }),
            (TableEntry::Action(cell), Insert::Accept) => match cell.reduces.iter().next() {
                Some(&r) => Err(BuildError::AcceptConflict {
                    state,
                    rule: grammar.rule_text(r),
                }),
                None => Err(BuildError::MalformedCell {
                    state,
                    symbol: symbol.clone(),
                }),
            },
            (TableEntry::Action(cell), Insert::Shift(target)) => match cell.shift {
                Some(first) if first == target => Ok(()),
                Some(first) => Err(BuildError::InconsistentShift {
                    state,
                    symbol: symbol.clone(),
                    first,
                    second: target,
                }),
                None => {
                    if let Some(&r) = cell.reduces.iter().next() {
                        if !policy.allow_shift_reduce {
                            return Err(BuildError::ShiftReduceConflict {
                                state,
                                symbol: symbol.clone(),
                                shift: target,
                                rule: grammar.rule_text(r),
                            });
                        }
                        if policy.report_conflicts {
                            log::warn!(
                                "tolerating shift/reduce conflict in state {} on {:?}: shift to {} or reduce by {}",
                                state,
                                symbol,
                                target,
                                grammar.rule_text(r)
                            );
                        }
                    }
                    cell.shift = Some(target);
                    Ok(())
                }
            },
            (TableEntry::Action(cell), Insert::Reduce(r)) => {
                if cell.reduces.contains(&r) {
                    return Ok(());
                }
                if let Some(shift) = cell.shift {
                    if !policy.allow_shift_reduce {
                        return Err(BuildError::ShiftReduceConflict {
                            state,
                            symbol: symbol.clone(),
                            shift,
                            rule: grammar.rule_text(r),
                        });
                    }
                    if policy.report_conflicts {
                        log::warn!(
                            "tolerating shift/reduce conflict in state {} on {:?}: shift to {} or reduce by {}",
                            state,
                            symbol,
                            shift,
                            grammar.rule_text(r)
                        );
                    }
                }
                if let Some(&first) = cell.reduces.iter().next() {
                    if !policy.allow_reduce_reduce {
                        return Err(BuildError::ReduceReduceConflict {
                            state,
                            symbol: symbol.clone(),
                            first: grammar.rule_text(first),
                            second: grammar.rule_text(r),
                        });
                    }
                    if policy.report_conflicts {
                        log::warn!(
                            "tolerating reduce/reduce conflict in state {} on {:?}: {} or {}",
                            state,
                            symbol,
                            grammar.rule_text(first),
                            grammar.rule_text(r)
                        );
                    }
                }
                cell.reduces.insert(r);
                Ok(())
            }
            _ => Err(BuildError::MalformedCell {
                state,
                symbol: symbol.clone(),
            }),
        }
    }
}

/// Build the canonical collection of LR(0) groups. Group 0 is the closure of
/// the item `(0, 0)`.
pub(crate) fn lr0_groups(grammar: &Grammar) -> Vec<Group> {
    struct S<'a> {
        grammar: &'a Grammar,
        groups: Vec<Group>,
        item_sets: BTreeMap<BTreeSet<Item>, usize>,
        nubs: BTreeMap<BTreeSet<Item>, usize>,
    }
    impl<'a> S<'a> {
        fn group(&mut self, items: BTreeSet<Item>) -> usize {
            if let Some(&ix) = self.item_sets.get(&items) {
                return ix;
            }
            let ix = self.groups.len();
            self.item_sets.insert(items.clone(), ix);
            self.groups.push(Group {
                items,
                transitions: BTreeMap::new(),
            });
            log::trace!("discovered group {}", ix);
            ix
        }
        fn complete_nub(&mut self, nub: BTreeSet<Item>) -> usize {
            if let Some(&ix) = self.nubs.get(&nub) {
                return ix;
            }
            let ix = self.group(closure(self.grammar, &nub));
            self.nubs.insert(nub, ix);
            ix
        }
    }

    let mut state = S {
        grammar,
        groups: vec![],
        item_sets: BTreeMap::new(),
        nubs: BTreeMap::new(),
    };
    state.complete_nub(Some(Item { rule: 0, marker: 0 }).into_iter().collect());
    let mut finished = 0;
    while finished < state.groups.len() {
        let mut next_nubs: BTreeMap<Symbol, BTreeSet<Item>> = BTreeMap::new();
        for item in state.groups[finished].items.iter() {
            if let Some(sym) = grammar.rules()[item.rule].rhs.get(item.marker) {
                next_nubs.entry(sym.clone()).or_default().insert(Item {
                    rule: item.rule,
                    marker: item.marker + 1,
                });
            }
        }
        for (sym, items) in next_nubs.into_iter() {
            let ix = state.complete_nub(items);
            state.groups[finished].transitions.insert(sym, ix);
        }
        finished += 1;
    }
    state.groups
}

/// Close a set of items: add `(rule, 0)` for every rule of each nonterminal
/// that appears right after a marker.
pub(crate) fn closure(grammar: &Grammar, items: &BTreeSet<Item>) -> BTreeSet<Item> {
    let mut completed = items.clone();
    let mut to_add: VecDeque<Item> = items.iter().copied().collect();
    while let Some(item) = to_add.pop_front() {
        if let Some(sym) = grammar.rules()[item.rule].rhs.get(item.marker) {
            if !grammar.is_nonterminal(sym) {
                continue;
            }
            for (rule, _) in grammar.rules_for(sym) {
                let new_item = Item { rule, marker: 0 };
                if completed.insert(new_item) {
                    to_add.push_back(new_item);
                }
            }
        }
    }
    completed
}

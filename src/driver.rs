//! The shift-reduce parse driver.

use crate::automaton::AutomatonPosition;
use crate::config::{ConflictPolicy, Resolver};
use crate::precedence::{PrecedenceAction, PrecedenceError};
use crate::symbol::Symbol;
use crate::table::{ActionCell, LrTable, TableEntry};
use crate::token::{Location, TokenSource};
use crate::tree::{DerivationTree, DerivationTreeValidator, TreeError};

/// An error while parsing one input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The token is not a terminal of the grammar.
    #[error("{location}: symbol '{symbol}' is not in the grammar")]
    SymbolNotInGrammar {
        /// The token.
        symbol: Symbol,
        /// Where it was read.
        location: Location,
    },
    /// The table has no action for the token in the current state.
    #[error("{location}: no rule for token '{symbol}' in state {state}")]
    NoRuleForToken {
        /// The token; empty at end of input.
        symbol: Symbol,
        /// The parser state.
        state: usize,
        /// Where it was read.
        location: Location,
    },
    /// The stack does not match the rule being reduced.
    #[error("stack does not match rule {rule}: expected '{expected}', found {found:?}")]
    StackMismatch {
        /// The rule.
        rule: String,
        /// The symbol the rule expects.
        expected: Symbol,
        /// The symbol on the stack, if any.
        found: Option<Symbol>,
    },
    /// No goto entry after a reduction.
    #[error("no goto from state {state} on '{symbol}'")]
    MissingGoto {
        /// The state uncovered by the reduction.
        state: usize,
        /// The nonterminal.
        symbol: Symbol,
    },
    /// Neither precedence nor the tree could decide.
    #[error("{location}: unhandled conflict in state {state} on '{symbol}'")]
    UnhandledConflict {
        /// The parser state.
        state: usize,
        /// The lookahead.
        symbol: Symbol,
        /// Where the lookahead was read.
        location: Location,
    },
    /// No reduce candidate keeps the tree levels acceptable.
    #[error("{location}: no tree-consistent rule in state {state} on '{symbol}'")]
    NoTreeConsistentRule {
        /// The parser state.
        state: usize,
        /// The lookahead.
        symbol: Symbol,
        /// Where the lookahead was read.
        location: Location,
    },
    /// More than one reduce candidate keeps the tree levels acceptable.
    #[error("{location}: ambiguous reduce/reduce in state {state} on '{symbol}': {}", rules.join(", "))]
    AmbiguousReduceReduce {
        /// The parser state.
        state: usize,
        /// The lookahead.
        symbol: Symbol,
        /// The rules that all validate.
        rules: Vec<String>,
        /// Where the lookahead was read.
        location: Location,
    },
    /// The precedence table refused to decide.
    #[error("{location}: {source}")]
    Precedence {
        /// What the table reported.
        source: PrecedenceError,
        /// Where the lookahead was read.
        location: Location,
    },
    /// The derivation tree was rejected.
    #[error("{location}: {source}")]
    Tree {
        /// What the validator reported.
        source: TreeError,
        /// Where the last token was read.
        location: Location,
    },
}

/// One parser stack entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// The shifted terminal or reduced nonterminal; empty for the bottom frame.
    pub symbol: Symbol,
    /// The state reached after it.
    pub state: usize,
}

#[derive(Debug)]
enum Decision {
    Shift(usize),
    Reduce(usize, Option<Vec<AutomatonPosition>>),
}

/// Runs one parse over an [`LrTable`]. Each driver owns its stack and tree, so
/// several drivers can share a table.
#[derive(Debug)]
pub struct ParseDriver<'t> {
    table: &'t LrTable,
    policy: ConflictPolicy,
    stack: Vec<StackFrame>,
    tree: DerivationTreeValidator<'t>,
}

impl<'t> ParseDriver<'t> {
    /// A driver using the policy the table was built with.
    pub fn new(table: &'t LrTable) -> Self {
        ParseDriver::with_policy(table, table.policy())
    }

    /// A driver with an explicit policy. Only the resolution order matters
    /// here; which conflicts exist was fixed when the table was built.
    pub fn with_policy(table: &'t LrTable, policy: ConflictPolicy) -> Self {
        ParseDriver {
            table,
            policy,
            stack: vec![StackFrame {
                symbol: Symbol::empty(),
                state: 0,
            }],
            tree: DerivationTreeValidator::new(table.automaton()),
        }
    }

    /// The current stack, bottom first.
    pub fn stack(&self) -> &[StackFrame] {
        &self.stack
    }

    fn state(&self) -> usize {
        self.stack.last().map_or(0, |f| f.state)
    }

    fn next_token<S: TokenSource>(&self, tokens: &mut S) -> Result<Symbol, ParseError> {
        let token = tokens.next_token();
        if !token.is_empty() && !self.table.grammar().is_terminal(&token) {
            return Err(ParseError::SymbolNotInGrammar {
                symbol: token,
                location: tokens.location(),
            });
        }
        Ok(token)
    }

    /// Parse the whole input and return the derivation tree.
    pub fn parse<S: TokenSource>(mut self, tokens: &mut S) -> Result<DerivationTree, ParseError> {
        let table = self.table;
        let mut token = self.next_token(tokens)?;
        loop {
            let state = self.state();
            log::trace!("state {}, lookahead {:?}", state, token);
            let cell = match table.entry(state, &token) {
                Some(TableEntry::Accept) => break,
                Some(TableEntry::Action(cell)) => cell,
                Some(TableEntry::Goto(_)) | None => {
                    return Err(ParseError::NoRuleForToken {
                        symbol: token,
                        state,
                        location: tokens.location(),
                    })
                }
            };
            match self.decide(state, &token, cell, tokens.location())? {
                Decision::Shift(target) => {
                    log::trace!("{:?} -> shift {}", token, target);
                    self.stack.push(StackFrame {
                        symbol: token.clone(),
                        state: target,
                    });
                    self.tree
                        .push_leaf(token)
                        .map_err(|source| ParseError::Tree {
                            source,
                            location: tokens.location(),
                        })?;
                    token = self.next_token(tokens)?;
                }
                Decision::Reduce(rule, states) => {
                    self.reduce(rule, states)
                        .map_err(|e| match e {
                            ReduceError::Parse(e) => e,
                            ReduceError::Tree(source) => ParseError::Tree {
                                source,
                                location: tokens.location(),
                            },
                        })?;
                }
            }
        }
        log::trace!("accept");

        self.tree.final_check().map_err(|source| ParseError::Tree {
            source,
            location: tokens.location(),
        })?;
        self.tree.into_tree().map_err(|source| ParseError::Tree {
            source,
            location: tokens.location(),
        })
    }

    fn reduce(
        &mut self,
        index: usize,
        states: Option<Vec<AutomatonPosition>>,
    ) -> Result<(), ReduceError> {
        let table = self.table;
        let grammar = table.grammar();
        let rule = grammar.rule(index).ok_or_else(|| {
            ReduceError::Parse(ParseError::StackMismatch {
                rule: format!("<rule {}>", index),
                expected: Symbol::empty(),
                found: None,
            })
        })?;
        for expected in rule.rhs.iter().rev() {
            match self.stack.pop() {
                Some(frame) if frame.symbol == *expected && !self.stack.is_empty() => {}
                found => {
                    return Err(ReduceError::Parse(ParseError::StackMismatch {
                        rule: grammar.rule_text(index),
                        expected: expected.clone(),
                        found: found.map(|f| f.symbol),
                    }))
                }
            }
        }
        let uncovered = self.state();
        let target = table.goto(uncovered, &rule.lhs).ok_or_else(|| {
            ReduceError::Parse(ParseError::MissingGoto {
                state: uncovered,
                symbol: rule.lhs.clone(),
            })
        })?;
        log::trace!("{} -> reduce, goto {}", grammar.rule_text(index), target);
        self.stack.push(StackFrame {
            symbol: rule.lhs.clone(),
            state: target,
        });
        self.tree.apply_rule(rule, states).map_err(ReduceError::Tree)
    }

    fn decide(
        &self,
        state: usize,
        token: &Symbol,
        cell: &ActionCell,
        location: Location,
    ) -> Result<Decision, ParseError> {
        if !cell.is_conflict() {
            return match (cell.shift(), cell.reduces().iter().next()) {
                (Some(target), _) => Ok(Decision::Shift(target)),
                (None, Some(&rule)) => Ok(Decision::Reduce(rule, None)),
                (None, None) => Err(ParseError::NoRuleForToken {
                    symbol: token.clone(),
                    state,
                    location,
                }),
            };
        }

        let mut shift = cell.shift();
        let mut reduces: Vec<usize> = cell.reduces().iter().copied().collect();
        // Set when the tree narrowed the reduces but left a shift open.
        let mut undecided = None;
        for resolver in self.policy.order.resolvers() {
            match resolver {
                Resolver::Precedence => {
                    let target = match shift {
                        Some(target) if !reduces.is_empty() => target,
                        _ => continue,
                    };
                    match self.precedence_decision(token, location)? {
                        Some(PrecedenceAction::Shift) => return Ok(Decision::Shift(target)),
                        Some(PrecedenceAction::Reduce) if reduces.len() == 1 => {
                            return Ok(Decision::Reduce(reduces[0], None))
                        }
                        Some(PrecedenceAction::Reduce) => shift = None,
                        None => {}
                    }
                }
                Resolver::Automaton => {
                    if !self.tree.has_automaton() {
                        continue;
                    }
                    match self.tree_decision(state, token, shift, &reduces, location)? {
                        TreeDecision::Decided(decision) => return Ok(decision),
                        TreeDecision::Open { valid, error } => {
                            reduces = valid;
                            undecided = Some(error);
                        }
                    }
                }
            }
        }
        if let Some(error) = undecided {
            return Err(error);
        }
        if shift.is_none() && reduces.len() == 1 {
            return Ok(Decision::Reduce(reduces[0], None));
        }
        Err(ParseError::UnhandledConflict {
            state,
            symbol: token.clone(),
            location,
        })
    }

    /// Compare the lookahead with the nearest stack symbol that has a
    /// precedence. `None` when either side has no entry.
    fn precedence_decision(
        &self,
        token: &Symbol,
        location: Location,
    ) -> Result<Option<PrecedenceAction>, ParseError> {
        let precedence = match self.table.precedence() {
            Some(p) if p.is_defined(token) => p,
            _ => return Ok(None),
        };
        let on_stack = match self
            .stack
            .iter()
            .rev()
            .find(|f| precedence.is_defined(&f.symbol))
        {
            Some(frame) => &frame.symbol,
            None => return Ok(None),
        };
        let action = precedence
            .get_precedence(on_stack, token)
            .map_err(|source| ParseError::Precedence { source, location })?;
        log::trace!("precedence of {:?} against {:?}: {:?}", on_stack, token, action);
        Ok(Some(action))
    }

    /// Keep the reduces whose levels still fit the automaton. Several that fit
    /// next to a shift stay open for precedence to settle.
    fn tree_decision(
        &self,
        state: usize,
        token: &Symbol,
        shift: Option<usize>,
        reduces: &[usize],
        location: Location,
    ) -> Result<TreeDecision, ParseError> {
        let grammar = self.table.grammar();
        let mut valid = vec![];
        for &r in reduces {
            let rule = match grammar.rule(r) {
                Some(rule) => rule,
                None => continue,
            };
            match self.tree.try_apply_rule(rule) {
                Ok(states) => valid.push((r, states)),
                Err(e) => log::trace!("{} rejected: {}", grammar.rule_text(r), e),
            }
        }
        let ambiguous = |valid: &[(usize, Vec<AutomatonPosition>)]| {
            ParseError::AmbiguousReduceReduce {
                state,
                symbol: token.clone(),
                rules: valid.iter().map(|(r, _)| grammar.rule_text(*r)).collect(),
                location,
            }
        };
        match (valid.len(), shift) {
            (1, _) => {
                let (r, states) = valid.remove(0);
                Ok(TreeDecision::Decided(Decision::Reduce(r, Some(states))))
            }
            (0, Some(target)) => Ok(TreeDecision::Decided(Decision::Shift(target))),
            (0, None) => Err(ParseError::NoTreeConsistentRule {
                state,
                symbol: token.clone(),
                location,
            }),
            (_, Some(_)) => Ok(TreeDecision::Open {
                error: ambiguous(&valid),
                valid: valid.into_iter().map(|(r, _)| r).collect(),
            }),
            (_, None) => Err(ambiguous(&valid)),
        }
    }
}

enum TreeDecision {
    Decided(Decision),
    /// More than one reduce fits and a shift is still possible.
    Open {
        valid: Vec<usize>,
        error: ParseError,
    },
}

enum ReduceError {
    Parse(ParseError),
    Tree(TreeError),
}

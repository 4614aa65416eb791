//! Incremental derivation-tree construction with per-level automaton checks.
//!
//! The parser builds the tree bottom-up: every shift pushes a one-node subtree
//! and every reduce merges the topmost subtrees under a new parent. Each
//! subtree keeps its nodes grouped by relative depth, and, when a level
//! automaton is present, the automaton position reached after reading that
//! subtree's part of every level.
//!
//! Positions are exact only for the leftmost subtree, whose levels start at the
//! automaton's start state. Every other subtree starts from
//! [`AutomatonPosition::Unknown`] and is re-read symbol by symbol once it is
//! merged to the right of a sibling.

use std::fmt::{self, Display};

use crate::automaton::{AutomatonError, AutomatonPosition, FiniteAutomaton};
use crate::grammar::Rule;
use crate::symbol::Symbol;

/// Index of a node in a tree arena.
pub type NodeId = usize;

/// An error from the tree validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Tree checks were requested but there is no level automaton.
    #[error("can't check tree levels without a level automaton")]
    NoAutomaton,
    /// A rule needs more subtrees than the stack holds.
    #[error("rule {rule} needs {needed} subtrees but only {available} are on the stack")]
    StackUnderflow {
        /// The rule being applied.
        rule: String,
        /// Right-hand side length.
        needed: usize,
        /// Subtrees on the stack.
        available: usize,
    },
    /// A symbol was rejected by the level automaton.
    #[error("symbol '{symbol}' at depth {depth} is rejected by the level automaton: {source}")]
    Rejected {
        /// Depth relative to the subtree being built.
        depth: usize,
        /// The rejected symbol.
        symbol: Symbol,
        /// What the automaton reported.
        source: AutomatonError,
    },
    /// A tree level did not end in an accepting state.
    #[error("level {depth} ({level}) is not in a final state at column {column}")]
    FinalCheck {
        /// Depth of the level.
        depth: usize,
        /// Number of symbols on the level.
        column: usize,
        /// The level, space separated.
        level: String,
    },
    /// Parsing ended with other than exactly one subtree.
    #[error("expected a single root, found {0} subtrees")]
    NotSingleRoot(usize),
}

/// A node of a derivation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The grammar symbol.
    pub symbol: Symbol,
    /// The children, left to right. Empty for terminals and epsilon rules.
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Subtree {
    root: NodeId,
    levels: Vec<Vec<NodeId>>,
    states: Vec<AutomatonPosition>,
}

/// Builds the derivation tree and checks its levels against an optional
/// level automaton.
#[derive(Debug, Clone)]
pub struct DerivationTreeValidator<'a> {
    automaton: Option<&'a FiniteAutomaton>,
    nodes: Vec<Node>,
    stack: Vec<Subtree>,
}

impl<'a> DerivationTreeValidator<'a> {
    /// Create an empty validator. The automaton must already be prepared.
    pub fn new(automaton: Option<&'a FiniteAutomaton>) -> Self {
        DerivationTreeValidator {
            automaton,
            nodes: vec![],
            stack: vec![],
        }
    }

    /// Whether levels are checked.
    pub fn has_automaton(&self) -> bool {
        self.automaton.is_some()
    }

    /// Number of subtrees on the stack.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn start(automaton: &FiniteAutomaton) -> Result<AutomatonPosition, TreeError> {
        automaton
            .start()
            .map(AutomatonPosition::Known)
            .ok_or(TreeError::Rejected {
                depth: 0,
                symbol: Symbol::empty(),
                source: AutomatonError::MissingStart,
            })
    }

    fn push_node(&mut self, symbol: Symbol, children: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node { symbol, children });
        self.nodes.len() - 1
    }

    /// Push a shifted terminal as a one-node subtree.
    pub fn push_leaf(&mut self, symbol: Symbol) -> Result<(), TreeError> {
        let mut states = vec![];
        if let Some(automaton) = self.automaton {
            let seed = if self.stack.is_empty() {
                Self::start(automaton)?
            } else {
                AutomatonPosition::Unknown
            };
            let state = automaton
                .step(&symbol, &seed)
                .map_err(|source| TreeError::Rejected {
                    depth: 0,
                    symbol: symbol.clone(),
                    source,
                })?;
            states.push(state);
        }
        let root = self.push_node(symbol, vec![]);
        self.stack.push(Subtree {
            root,
            levels: vec![vec![root]],
            states,
        });
        Ok(())
    }

    fn split_point(&self, rule: &Rule) -> Result<usize, TreeError> {
        self.stack
            .len()
            .checked_sub(rule.rhs.len())
            .ok_or_else(|| TreeError::StackUnderflow {
                rule: rule.to_string(),
                needed: rule.rhs.len(),
                available: self.stack.len(),
            })
    }

    /// Check whether reducing by `rule` keeps every level acceptable so far,
    /// without changing anything. Returns the per-level positions of the
    /// subtree the reduction would create.
    pub fn try_apply_rule(&self, rule: &Rule) -> Result<Vec<AutomatonPosition>, TreeError> {
        let automaton = self.automaton.ok_or(TreeError::NoAutomaton)?;
        let k = self.split_point(rule)?;
        let seed = if k == 0 {
            Self::start(automaton)?
        } else {
            AutomatonPosition::Unknown
        };

        let mut states = match self.stack.get(k) {
            Some(first) if !rule.rhs.is_empty() => first.states.clone(),
            _ => vec![],
        };
        for child in self.stack.iter().skip(k + 1) {
            for (depth, level) in child.levels.iter().enumerate() {
                if states.len() <= depth {
                    states.push(seed.clone());
                }
                for &node in level {
                    let symbol = &self.nodes[node].symbol;
                    states[depth] = automaton.step(symbol, &states[depth]).map_err(|source| {
                        TreeError::Rejected {
                            depth: depth + 1,
                            symbol: symbol.clone(),
                            source,
                        }
                    })?;
                }
            }
        }

        let head = automaton
            .step(&rule.lhs, &seed)
            .map_err(|source| TreeError::Rejected {
                depth: 0,
                symbol: rule.lhs.clone(),
                source,
            })?;
        states.insert(0, head);
        Ok(states)
    }

    /// Reduce by `rule`: merge the topmost subtrees under a new parent. The
    /// positions from [`try_apply_rule`](Self::try_apply_rule) can be passed in
    /// to avoid computing them twice.
    pub fn apply_rule(
        &mut self,
        rule: &Rule,
        states: Option<Vec<AutomatonPosition>>,
    ) -> Result<(), TreeError> {
        let states = match (states, self.automaton) {
            (Some(states), _) => states,
            (None, Some(_)) => self.try_apply_rule(rule)?,
            (None, None) => vec![],
        };
        let k = self.split_point(rule)?;
        let children: Vec<Subtree> = self.stack.drain(k..).collect();

        let mut levels: Vec<Vec<NodeId>> = vec![];
        for child in children.iter() {
            for (depth, level) in child.levels.iter().enumerate() {
                if levels.len() <= depth {
                    levels.push(vec![]);
                }
                levels[depth].extend_from_slice(level);
            }
        }
        let root = self.push_node(rule.lhs.clone(), children.iter().map(|c| c.root).collect());
        levels.insert(0, vec![root]);
        log::trace!("reduced by {} into a subtree of depth {}", rule, levels.len());

        self.stack.push(Subtree {
            root,
            levels,
            states,
        });
        Ok(())
    }

    /// Check that every level of the leftmost subtree ends in an accepting
    /// state. Passes trivially without an automaton or without subtrees.
    pub fn final_check(&self) -> Result<(), TreeError> {
        let (automaton, root) = match (self.automaton, self.stack.first()) {
            (Some(automaton), Some(root)) => (automaton, root),
            _ => return Ok(()),
        };
        for (depth, state) in root.states.iter().enumerate() {
            if !automaton.is_accepting(state) {
                let level = root.levels.get(depth).map_or(&[][..], |l| &l[..]);
                return Err(TreeError::FinalCheck {
                    depth,
                    column: level.len(),
                    level: self.level_text(level),
                });
            }
        }
        Ok(())
    }

    fn level_text(&self, level: &[NodeId]) -> String {
        level
            .iter()
            .map(|&n| self.nodes[n].symbol.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The levels of every subtree on the stack, joined left to right.
    pub fn levels(&self) -> Vec<Vec<Symbol>> {
        let mut levels: Vec<Vec<Symbol>> = vec![];
        for subtree in self.stack.iter() {
            for (depth, level) in subtree.levels.iter().enumerate() {
                if levels.len() <= depth {
                    levels.push(vec![]);
                }
                levels[depth].extend(level.iter().map(|&n| self.nodes[n].symbol.clone()));
            }
        }
        levels
    }

    /// Finish: the stack must hold exactly one subtree.
    pub fn into_tree(mut self) -> Result<DerivationTree, TreeError> {
        if self.stack.len() != 1 {
            return Err(TreeError::NotSingleRoot(self.stack.len()));
        }
        match self.stack.pop() {
            Some(subtree) => Ok(DerivationTree {
                nodes: self.nodes,
                root: subtree.root,
                levels: subtree.levels,
            }),
            None => Err(TreeError::NotSingleRoot(0)),
        }
    }
}

/// A finished derivation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationTree {
    nodes: Vec<Node>,
    root: NodeId,
    levels: Vec<Vec<NodeId>>,
}

impl DerivationTree {
    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node with id `id`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// The symbols of every level, top to bottom.
    pub fn levels(&self) -> impl Iterator<Item = Vec<&Symbol>> + '_ {
        self.levels
            .iter()
            .map(move |level| level.iter().map(|&n| &self.nodes[n].symbol).collect())
    }

    /// Every level as a space-separated string.
    pub fn level_strings(&self) -> Vec<String> {
        self.levels()
            .map(|level| {
                level
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// The symbols of childless nodes, left to right: the terminals plus any
    /// nonterminal reduced by an epsilon rule.
    pub fn leaves(&self) -> Vec<&Symbol> {
        let mut leaves = vec![];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.children.is_empty() {
                leaves.push(&node.symbol);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        leaves
    }
}

impl Display for DerivationTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (depth, level) in self.level_strings().into_iter().enumerate() {
            writeln!(f, "{}: {}", depth, level)?;
        }
        Ok(())
    }
}

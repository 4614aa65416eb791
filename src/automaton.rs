//! Finite automata over arbitrary symbols.
//!
//! A [`FiniteAutomaton`] starts out non-deterministic (several targets per
//! symbol, epsilon transitions labelled with the empty symbol). Before it can be
//! stepped it has to be prepared: epsilon transitions are dropped, the subset
//! construction makes it deterministic, and a lookup table for the "unknown
//! predecessor" position is generated. [`FiniteAutomaton::prepare`] does all
//! three.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Display};

use crate::symbol::Symbol;

/// Index of a state inside one automaton.
pub type StateId = usize;

/// An error while defining or running an automaton.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomatonError {
    /// The state name was never added.
    #[error("undefined state '{0}'")]
    UndefinedState(String),
    /// A transition uses a symbol outside the alphabet.
    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(Symbol),
    /// `set_start` was called twice.
    #[error("start state is already set to '{0}'")]
    DuplicateStart(String),
    /// The automaton has no start state.
    #[error("automaton has no start state")]
    MissingStart,
    /// Determinization needs an epsilon-free automaton.
    #[error("state '{0}' still has epsilon transitions")]
    EpsilonTransitions(String),
    /// The symbol is in the alphabet but there is no transition for it.
    #[error("no transition from {state} on '{symbol}'")]
    NoTransition {
        /// The state (or set of states) the step started from.
        state: String,
        /// The rejected symbol.
        symbol: Symbol,
    },
    /// The symbol is not in the alphabet.
    #[error("symbol '{0}' is not in the automaton alphabet")]
    UnknownSymbol(Symbol),
    /// Stepping from an unknown position needs `generate_dict` first.
    #[error("automaton was not prepared (call prepare or generate_dict)")]
    NotPrepared,
}

/// Where a run of the automaton currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomatonPosition {
    /// A single, known state.
    Known(StateId),
    /// No predecessor context has been established yet.
    Unknown,
    /// One of several candidate states.
    Ambiguous(BTreeSet<StateId>),
}

impl AutomatonPosition {
    /// Collapse a set of candidates: one state becomes `Known`.
    pub fn from_set(mut states: BTreeSet<StateId>) -> AutomatonPosition {
        if states.len() == 1 {
            if let Some(s) = states.pop_first() {
                return AutomatonPosition::Known(s);
            }
        }
        AutomatonPosition::Ambiguous(states)
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    name: String,
    terminal: bool,
    rules: BTreeMap<Symbol, BTreeSet<StateId>>,
}

impl State {
    fn new(name: &str) -> State {
        State {
            name: name.to_string(),
            terminal: false,
            rules: BTreeMap::new(),
        }
    }

    fn targets(&self, symbol: &Symbol) -> Option<&BTreeSet<StateId>> {
        self.rules.get(symbol)
    }
}

/// A finite automaton with named states.
#[derive(Debug, Clone, Default)]
pub struct FiniteAutomaton {
    states: Vec<State>,
    names: BTreeMap<String, StateId>,
    alphabet: BTreeSet<Symbol>,
    start: Option<StateId>,
    dict: Option<BTreeMap<Symbol, BTreeSet<StateId>>>,
}

impl FiniteAutomaton {
    /// Create an automaton with no states.
    pub fn new() -> FiniteAutomaton {
        FiniteAutomaton::default()
    }

    /// Add a state; adding an existing name returns the existing id.
    pub fn add_state(&mut self, name: &str) -> StateId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = self.states.len();
        self.states.push(State::new(name));
        self.names.insert(name.to_string(), id);
        self.dict = None;
        id
    }

    /// Add a symbol to the alphabet.
    pub fn add_alpha(&mut self, symbol: impl Into<Symbol>) {
        self.alphabet.insert(symbol.into());
        self.dict = None;
    }

    fn lookup(&self, name: &str) -> Result<StateId, AutomatonError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| AutomatonError::UndefinedState(name.to_string()))
    }

    /// Add a transition `state --symbol--> target`. The empty symbol adds an
    /// epsilon transition and does not need to be in the alphabet.
    pub fn add_rule(
        &mut self,
        state: &str,
        symbol: impl Into<Symbol>,
        target: &str,
    ) -> Result<(), AutomatonError> {
        let symbol = symbol.into();
        let from = self.lookup(state)?;
        let to = self.lookup(target)?;
        if !symbol.is_empty() && !self.alphabet.contains(&symbol) {
            return Err(AutomatonError::UndefinedSymbol(symbol));
        }
        self.states[from].rules.entry(symbol).or_default().insert(to);
        self.dict = None;
        Ok(())
    }

    /// Set the start state. It can be set only once.
    pub fn set_start(&mut self, name: &str) -> Result<(), AutomatonError> {
        if let Some(start) = self.start {
            return Err(AutomatonError::DuplicateStart(self.states[start].name.clone()));
        }
        self.start = Some(self.lookup(name)?);
        Ok(())
    }

    /// Mark a state as accepting.
    pub fn set_terminating(&mut self, name: &str) -> Result<(), AutomatonError> {
        let id = self.lookup(name)?;
        self.states[id].terminal = true;
        Ok(())
    }

    /// The start state, if set.
    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    /// The alphabet.
    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        &self.alphabet
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the automaton has no states.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Id of the state called `name`.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    /// Name of state `id`.
    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.states.get(id).map(|s| s.name.as_str())
    }

    /// Targets of `state` on `symbol`.
    pub fn targets(&self, state: StateId, symbol: &Symbol) -> BTreeSet<StateId> {
        self.states
            .get(state)
            .and_then(|s| s.targets(symbol))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether any transition is labelled with the empty symbol.
    pub fn has_epsilon_rules(&self) -> bool {
        self.states
            .iter()
            .any(|s| s.rules.contains_key(&Symbol::empty()))
    }

    /// Whether every (state, symbol) pair has at most one target.
    pub fn is_deterministic(&self) -> bool {
        self.states
            .iter()
            .all(|s| s.rules.iter().all(|(sym, t)| !sym.is_empty() && t.len() <= 1))
    }

    /// All states reachable from `state` through epsilon transitions only,
    /// `state` included.
    pub fn epsilon_closure(&self, state: StateId) -> BTreeSet<StateId> {
        let epsilon = Symbol::empty();
        let mut closure = BTreeSet::new();
        let mut queue = VecDeque::new();
        closure.insert(state);
        queue.push_back(state);
        while let Some(st) = queue.pop_front() {
            if let Some(targets) = self.states.get(st).and_then(|s| s.targets(&epsilon)) {
                for &t in targets {
                    if closure.insert(t) {
                        queue.push_back(t);
                    }
                }
            }
        }
        closure
    }

    /// Remove every epsilon transition, copying the non-epsilon transitions
    /// and the accepting flag of each state's closure into the state itself.
    pub fn drop_epsilon_rules(&mut self) {
        let closures: Vec<BTreeSet<StateId>> =
            (0..self.states.len()).map(|s| self.epsilon_closure(s)).collect();
        let snapshot = self.states.clone();
        let epsilon = Symbol::empty();
        for (p, closure) in closures.into_iter().enumerate() {
            for q in closure {
                let source = &snapshot[q];
                for (sym, targets) in source.rules.iter() {
                    if sym.is_empty() {
                        continue;
                    }
                    self.states[p]
                        .rules
                        .entry(sym.clone())
                        .or_default()
                        .extend(targets.iter().copied());
                }
                if source.terminal {
                    self.states[p].terminal = true;
                }
            }
            self.states[p].rules.remove(&epsilon);
        }
        self.dict = None;
        log::trace!("dropped epsilon rules from {} states", self.states.len());
    }

    fn composite_name(&self, members: &BTreeSet<StateId>) -> String {
        let mut names: Vec<String> = members
            .iter()
            .map(|&s| match self.states.get(s) {
                Some(state) => state.name.clone(),
                None => format!("#{}", s),
            })
            .collect();
        names.sort_unstable();
        names.join("_")
    }

    /// `base`, primed until no state in `taken` has that name.
    fn fresh_name(base: String, taken: &BTreeMap<String, StateId>) -> String {
        let mut name = base;
        while taken.contains_key(&name) {
            name.push('\'');
        }
        name
    }

    /// Subset construction. Unreachable states are dropped; the start state
    /// keeps its name. A composite name already in use gets a `'` appended.
    pub fn determinize(&mut self) -> Result<(), AutomatonError> {
        let start = self.start.ok_or(AutomatonError::MissingStart)?;
        if let Some(st) = self
            .states
            .iter()
            .find(|s| s.rules.contains_key(&Symbol::empty()))
        {
            return Err(AutomatonError::EpsilonTransitions(st.name.clone()));
        }

        let mut ids: BTreeMap<BTreeSet<StateId>, StateId> = BTreeMap::new();
        let mut subsets: Vec<BTreeSet<StateId>> = vec![];
        let mut states: Vec<State> = vec![];
        let mut names: BTreeMap<String, StateId> = BTreeMap::new();
        let mut queue = VecDeque::new();

        let first: BTreeSet<StateId> = Some(start).into_iter().collect();
        ids.insert(first.clone(), 0);
        subsets.push(first);
        names.insert(self.states[start].name.clone(), 0);
        states.push(State {
            name: self.states[start].name.clone(),
            terminal: self.states[start].terminal,
            rules: BTreeMap::new(),
        });
        queue.push_back(0);

        while let Some(current) = queue.pop_front() {
            let mut union: BTreeMap<&Symbol, BTreeSet<StateId>> = BTreeMap::new();
            for &member in subsets[current].iter() {
                for (sym, targets) in self.states[member].rules.iter() {
                    union.entry(sym).or_default().extend(targets.iter().copied());
                }
            }
            for (sym, targets) in union {
                let target = match ids.get(&targets) {
                    Some(&id) => id,
                    None => {
                        let id = states.len();
                        let name = Self::fresh_name(self.composite_name(&targets), &names);
                        names.insert(name.clone(), id);
                        states.push(State {
                            name,
                            terminal: targets.iter().any(|&t| self.states[t].terminal),
                            rules: BTreeMap::new(),
                        });
                        ids.insert(targets.clone(), id);
                        subsets.push(targets);
                        queue.push_back(id);
                        id
                    }
                };
                states[current]
                    .rules
                    .insert(sym.clone(), Some(target).into_iter().collect());
            }
        }

        log::trace!(
            "determinized automaton: {} states -> {} states",
            self.states.len(),
            states.len()
        );
        self.names = names;
        self.states = states;
        self.start = Some(0);
        self.dict = None;
        Ok(())
    }

    /// Precompute, for each alphabet symbol, every state reachable by that
    /// symbol from anywhere. Used to step from [`AutomatonPosition::Unknown`].
    pub fn generate_dict(&mut self) {
        let mut dict: BTreeMap<Symbol, BTreeSet<StateId>> = self
            .alphabet
            .iter()
            .map(|sym| (sym.clone(), BTreeSet::new()))
            .collect();
        for state in self.states.iter() {
            for (sym, targets) in state.rules.iter() {
                if let Some(entry) = dict.get_mut(sym) {
                    entry.extend(targets.iter().copied());
                }
            }
        }
        self.dict = Some(dict);
    }

    /// Drop epsilon rules, determinize and generate the lookup table.
    pub fn prepare(&mut self) -> Result<(), AutomatonError> {
        self.drop_epsilon_rules();
        self.determinize()?;
        self.generate_dict();
        Ok(())
    }

    fn position_name(&self, position: &AutomatonPosition) -> String {
        match position {
            AutomatonPosition::Known(s) => match self.states.get(*s) {
                Some(state) => format!("state '{}'", state.name),
                None => format!("unknown state #{}", s),
            },
            AutomatonPosition::Unknown => "an unknown state".to_string(),
            AutomatonPosition::Ambiguous(set) => format!("states {{{}}}", self.composite_name(set)),
        }
    }

    fn reject(&self, symbol: &Symbol, position: &AutomatonPosition) -> AutomatonError {
        if self.alphabet.contains(symbol) {
            AutomatonError::NoTransition {
                state: self.position_name(position),
                symbol: symbol.clone(),
            }
        } else {
            AutomatonError::UnknownSymbol(symbol.clone())
        }
    }

    fn step_known(&self, symbol: &Symbol, state: StateId) -> Option<StateId> {
        match self.states.get(state).and_then(|s| s.targets(symbol)) {
            Some(targets) if targets.len() == 1 => targets.iter().next().copied(),
            _ => None,
        }
    }

    /// Make one step on `symbol` from `position`.
    pub fn step(
        &self,
        symbol: &Symbol,
        position: &AutomatonPosition,
    ) -> Result<AutomatonPosition, AutomatonError> {
        match position {
            AutomatonPosition::Known(state) => self
                .step_known(symbol, *state)
                .map(AutomatonPosition::Known)
                .ok_or_else(|| self.reject(symbol, position)),
            AutomatonPosition::Unknown => {
                let dict = self.dict.as_ref().ok_or(AutomatonError::NotPrepared)?;
                match dict.get(symbol) {
                    Some(states) if !states.is_empty() => {
                        Ok(AutomatonPosition::from_set(states.clone()))
                    }
                    _ => Err(self.reject(symbol, position)),
                }
            }
            AutomatonPosition::Ambiguous(states) => {
                let next: BTreeSet<StateId> = states
                    .iter()
                    .filter_map(|&s| self.step_known(symbol, s))
                    .collect();
                if next.is_empty() {
                    Err(self.reject(symbol, position))
                } else {
                    Ok(AutomatonPosition::from_set(next))
                }
            }
        }
    }

    /// Whether `position` is (or may be) an accepting state.
    pub fn is_accepting(&self, position: &AutomatonPosition) -> bool {
        match position {
            AutomatonPosition::Known(s) => self.states.get(*s).map_or(false, |s| s.terminal),
            AutomatonPosition::Unknown => false,
            AutomatonPosition::Ambiguous(set) => set
                .iter()
                .any(|&s| self.states.get(s).map_or(false, |s| s.terminal)),
        }
    }

    /// Run the whole string from the start state. A missing transition is a
    /// rejection; a symbol outside the alphabet is an error.
    pub fn accepts<'a, I>(&self, symbols: I) -> Result<bool, AutomatonError>
    where
        I: IntoIterator<Item = &'a Symbol>,
    {
        let mut state = self.start.ok_or(AutomatonError::MissingStart)?;
        for sym in symbols {
            match self.step_known(sym, state) {
                Some(next) => state = next,
                None if self.alphabet.contains(sym) => return Ok(false),
                None => return Err(AutomatonError::UnknownSymbol(sym.clone())),
            }
        }
        Ok(self.states[state].terminal)
    }

    /// Merge `other` into this automaton: alphabet, states, accepting flags and
    /// rules are copied by name, and an epsilon transition connects this start
    /// state to the other one.
    pub fn join(&mut self, other: &FiniteAutomaton) -> Result<(), AutomatonError> {
        let start = self.start.ok_or(AutomatonError::MissingStart)?;
        let other_start = other.start.ok_or(AutomatonError::MissingStart)?;
        for sym in other.alphabet.iter() {
            self.add_alpha(sym.clone());
        }
        for state in other.states.iter() {
            self.add_state(&state.name);
            if state.terminal {
                self.set_terminating(&state.name)?;
            }
        }
        for state in other.states.iter() {
            for (sym, targets) in state.rules.iter() {
                for &t in targets {
                    self.add_rule(&state.name, sym.clone(), &other.states[t].name)?;
                }
            }
        }
        let from = self.states[start].name.clone();
        let to = other.states[other_start].name.clone();
        self.add_rule(&from, Symbol::empty(), &to)
    }
}

fn quote(sym: &Symbol) -> String {
    sym.as_str().replace('\'', "''")
}

impl Display for FiniteAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let by_name: Vec<&State> = self.names.values().map(|&id| &self.states[id]).collect();
        let names: Vec<&str> = by_name.iter().map(|s| s.name.as_str()).collect();
        writeln!(f, "(")?;
        writeln!(f, "  {{{}}},", names.join(", "))?;
        let alphabet: Vec<String> = self
            .alphabet
            .iter()
            .map(|sym| format!("'{}'", quote(sym)))
            .collect();
        writeln!(f, "  {{{}}},", alphabet.join(", "))?;
        writeln!(f, "  {{")?;
        for state in by_name.iter() {
            for (sym, targets) in state.rules.iter() {
                let mut targets: Vec<&str> =
                    targets.iter().map(|&t| self.states[t].name.as_str()).collect();
                targets.sort_unstable();
                for t in targets {
                    writeln!(f, "    {} '{}' -> {};", state.name, quote(sym), t)?;
                }
            }
        }
        writeln!(f, "  }},")?;
        let start = self.start.map_or("", |s| self.states[s].name.as_str());
        writeln!(f, "  {},", start)?;
        let finals: Vec<&str> = by_name
            .iter()
            .filter(|s| s.terminal)
            .map(|s| s.name.as_str())
            .collect();
        writeln!(f, "  {{{}}}", finals.join(", "))?;
        write!(f, ")")
    }
}

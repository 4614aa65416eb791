use super::*;

macro_rules! map {
    ($($l: expr => $r: expr),*) => ({
        let mut r = std::collections::BTreeMap::new();
        $(r.insert($l, $r);)*
        r
    });
}

macro_rules! coll {
    ($($x: expr),*) => ({
        let v: Vec<Symbol> = vec![$(Symbol::from($x)),*];
        v.into_iter().collect()
    });
}

mod automaton;
mod eff;
mod grammar;
mod precedence;

fn sym(s: &str) -> Symbol {
    Symbol::new(s)
}

/// A rule with a space-separated right-hand side.
fn rule(lhs: &str, rhs: &str) -> Rule {
    Rule::new(sym(lhs), rhs.split_whitespace().map(sym).collect())
}

fn grammar(terminals: &[&str], nonterminals: &[&str], rules: &[(&str, &str)]) -> Grammar {
    let mut g = Grammar::new();
    for &t in terminals {
        g.add_terminal(t).unwrap();
    }
    for &n in nonterminals {
        g.add_nonterminal(n).unwrap();
    }
    for &(lhs, rhs) in rules {
        g.add_rule(lhs, rhs.split_whitespace()).unwrap();
    }
    g.set_start(nonterminals[0]).unwrap();
    g
}

/// S -> a S b | ''
fn anbn() -> Grammar {
    grammar(&["a", "b"], &["S"], &[("S", "a S b"), ("S", "")])
}

/// Levels of a^n b^n trees: `S` at the top, `a S b` below it, then
/// whatever `final_b` allows.
fn anbn_levels(final_b: bool) -> FiniteAutomaton {
    automaton(
        &["S", "a", "b"],
        &["q0", "q1", "q2", "q3", "q4"],
        &[("q0", "S", "q1"), ("q0", "a", "q2"), ("q2", "S", "q3"), ("q3", "b", "q4")],
        if final_b { &["q1", "q4"][..] } else { &["q1"][..] },
    )
}

/// S -> if S | if S else S | x | y
fn dangling_else() -> Grammar {
    grammar(
        &["if", "else", "x", "y"],
        &["S"],
        &[
            ("S", "if S"),
            ("S", "if S else S"),
            ("S", "x"),
            ("S", "y"),
        ],
    )
}

/// S -> A | B, A -> x, B -> x
fn same_rhs() -> Grammar {
    grammar(
        &["x"],
        &["S", "A", "B"],
        &[("S", "A"), ("S", "B"), ("A", "x"), ("B", "x")],
    )
}

/// An automaton whose first state is the start state.
fn automaton(
    alphabet: &[&str],
    states: &[&str],
    rules: &[(&str, &str, &str)],
    finals: &[&str],
) -> FiniteAutomaton {
    let mut aut = FiniteAutomaton::new();
    for &a in alphabet {
        aut.add_alpha(a);
    }
    for &s in states {
        aut.add_state(s);
    }
    for &(from, on, to) in rules {
        aut.add_rule(from, on, to).unwrap();
    }
    aut.set_start(states[0]).unwrap();
    for &f in finals {
        aut.set_terminating(f).unwrap();
    }
    aut
}

/// One accepting state looping on every symbol.
fn accept_all(alphabet: &[&str]) -> FiniteAutomaton {
    let rules: Vec<(&str, &str, &str)> = alphabet.iter().map(|&a| ("z", a, "z")).collect();
    automaton(alphabet, &["z"], &rules, &["z"])
}

fn tokens(input: &str) -> WhitespaceTokens<'_> {
    WhitespaceTokens::new(input)
}

use super::*;
use std::collections::BTreeSet;

/// s0 -ε-> s1 -ε-> s2, s1 loops on a, s2 -b-> s3 (accepting): a* b.
fn with_epsilons() -> FiniteAutomaton {
    automaton(
        &["a", "b"],
        &["s0", "s1", "s2", "s3"],
        &[("s0", "", "s1"), ("s1", "", "s2"), ("s1", "a", "s1"), ("s2", "b", "s3")],
        &["s3"],
    )
}

/// Strings over {a, b} ending in "a b".
fn ends_in_ab() -> FiniteAutomaton {
    automaton(
        &["a", "b"],
        &["n0", "n1", "n2"],
        &[("n0", "a", "n0"), ("n0", "b", "n0"), ("n0", "a", "n1"), ("n1", "b", "n2")],
        &["n2"],
    )
}

fn ids(aut: &FiniteAutomaton, names: &[&str]) -> BTreeSet<StateId> {
    names.iter().map(|n| aut.state_id(n).unwrap()).collect()
}

fn word(s: &str) -> Vec<Symbol> {
    s.split_whitespace().map(sym).collect()
}

#[test]
fn epsilon_closure() {
    let aut = with_epsilons();
    let s = |n| aut.state_id(n).unwrap();
    assert_eq!(aut.epsilon_closure(s("s0")), ids(&aut, &["s0", "s1", "s2"]));
    assert_eq!(aut.epsilon_closure(s("s1")), ids(&aut, &["s1", "s2"]));
    assert_eq!(aut.epsilon_closure(s("s3")), ids(&aut, &["s3"]));
}

#[test]
fn closure_of_cycle() {
    let aut = automaton(
        &["a"],
        &["p", "q"],
        &[("p", "", "q"), ("q", "", "p")],
        &[],
    );
    let p = aut.state_id("p").unwrap();
    assert_eq!(aut.epsilon_closure(p), ids(&aut, &["p", "q"]));
}

#[test]
fn drop_epsilon_rules() {
    let mut aut = with_epsilons();
    assert!(aut.has_epsilon_rules());
    aut.drop_epsilon_rules();
    assert!(!aut.has_epsilon_rules());

    let s = |n| aut.state_id(n).unwrap();
    assert_eq!(aut.targets(s("s0"), &sym("a")), ids(&aut, &["s1"]));
    assert_eq!(aut.targets(s("s0"), &sym("b")), ids(&aut, &["s3"]));
    assert_eq!(aut.targets(s("s1"), &sym("b")), ids(&aut, &["s3"]));
    assert!(!aut.is_accepting(&AutomatonPosition::Known(s("s0"))));
}

#[test]
fn drop_epsilon_rules_copies_accepting() {
    let mut aut = automaton(&["a"], &["p", "q"], &[("p", "", "q")], &["q"]);
    aut.drop_epsilon_rules();
    let p = aut.state_id("p").unwrap();
    assert!(aut.is_accepting(&AutomatonPosition::Known(p)));
}

#[test]
fn determinize_needs_epsilon_free() {
    let mut aut = with_epsilons();
    assert_eq!(
        aut.determinize(),
        Err(AutomatonError::EpsilonTransitions("s0".to_string()))
    );
}

#[test]
fn determinize_needs_start() {
    let mut aut = FiniteAutomaton::new();
    aut.add_state("p");
    assert_eq!(aut.determinize(), Err(AutomatonError::MissingStart));
}

#[test]
fn determinize() {
    let mut aut = ends_in_ab();
    assert!(!aut.is_deterministic());
    aut.determinize().unwrap();
    assert!(aut.is_deterministic());
    assert_eq!(aut.state_name(aut.start().unwrap()), Some("n0"));
    assert!(aut.state_id("n0_n1").is_some());
    assert!(aut.state_id("n0_n2").is_some());
    // n1 and n2 are never reached alone.
    assert_eq!(aut.len(), 3);

    for (input, expected) in [
        ("a b", true),
        ("b a a b", true),
        ("a b a", false),
        ("b", false),
        ("", false),
    ] {
        assert_eq!(aut.accepts(&word(input)), Ok(expected), "{:?}", input);
    }
}

#[test]
fn determinize_keeps_names_distinct() {
    // {s, t} would be called s_t, which is already taken.
    let mut aut = automaton(
        &["a", "b"],
        &["s", "t", "s_t"],
        &[("s", "a", "s"), ("s", "a", "t"), ("s", "b", "s_t")],
        &["s_t"],
    );
    aut.determinize().unwrap();
    assert_eq!(aut.len(), 3);
    let s = aut.start().unwrap();
    let on_a = aut.targets(s, &sym("a"));
    let on_b = aut.targets(s, &sym("b"));
    assert_ne!(on_a, on_b);
    assert_eq!(aut.state_id("s_t"), on_a.iter().next().copied());
    assert_eq!(aut.state_id("s_t'"), on_b.iter().next().copied());
    assert!(aut.to_string().contains("{s, s_t, s_t'}"));
}

#[test]
fn step_from_foreign_state() {
    let mut aut = automaton(&["x"], &["p"], &[("p", "x", "p")], &["p"]);
    aut.prepare().unwrap();
    assert_eq!(
        aut.step(&sym("x"), &AutomatonPosition::Known(999)),
        Err(AutomatonError::NoTransition {
            state: "unknown state #999".to_string(),
            symbol: sym("x"),
        })
    );
    let stray = AutomatonPosition::Ambiguous(vec![998, 999].into_iter().collect());
    assert!(aut.step(&sym("x"), &stray).is_err());
}

#[test]
fn prepare() {
    let mut aut = with_epsilons();
    aut.prepare().unwrap();
    assert!(!aut.has_epsilon_rules());
    assert!(aut.is_deterministic());
    assert_eq!(aut.accepts(&word("a a b")), Ok(true));
    assert_eq!(aut.accepts(&word("b")), Ok(true));
    assert_eq!(aut.accepts(&word("a")), Ok(false));
    assert_eq!(aut.accepts(&word("b b")), Ok(false));
    assert_eq!(
        aut.accepts(&word("a c")),
        Err(AutomatonError::UnknownSymbol(sym("c")))
    );
}

#[test]
fn add_rule_errors() {
    let mut aut = automaton(&["a"], &["p"], &[], &[]);
    assert_eq!(
        aut.add_rule("p", "a", "q"),
        Err(AutomatonError::UndefinedState("q".to_string()))
    );
    assert_eq!(
        aut.add_rule("p", "b", "p"),
        Err(AutomatonError::UndefinedSymbol(sym("b")))
    );
    assert_eq!(
        aut.set_start("p"),
        Err(AutomatonError::DuplicateStart("p".to_string()))
    );
    assert_eq!(
        aut.set_terminating("r"),
        Err(AutomatonError::UndefinedState("r".to_string()))
    );
    assert_eq!(aut.add_state("p"), 0);
}

#[test]
fn step_positions() {
    // x leads to q from p and to r from q.
    let mut aut = automaton(
        &["x", "y"],
        &["p", "q", "r"],
        &[("p", "x", "q"), ("q", "x", "r")],
        &["r"],
    );
    let unknown = AutomatonPosition::Unknown;
    assert_eq!(
        aut.step(&sym("x"), &unknown),
        Err(AutomatonError::NotPrepared)
    );
    aut.prepare().unwrap();
    let q = aut.state_id("q").unwrap();
    let r = aut.state_id("r").unwrap();

    let both = aut.step(&sym("x"), &unknown).unwrap();
    assert_eq!(both, AutomatonPosition::Ambiguous(ids(&aut, &["q", "r"])));
    assert!(aut.is_accepting(&both));
    assert_eq!(aut.step(&sym("x"), &both), Ok(AutomatonPosition::Known(r)));
    assert_eq!(
        aut.step(&sym("x"), &AutomatonPosition::Known(q)),
        Ok(AutomatonPosition::Known(r))
    );

    assert!(matches!(
        aut.step(&sym("x"), &AutomatonPosition::Known(r)),
        Err(AutomatonError::NoTransition { .. })
    ));
    assert!(matches!(
        aut.step(&sym("y"), &unknown),
        Err(AutomatonError::NoTransition { .. })
    ));
    assert_eq!(
        aut.step(&sym("z"), &unknown),
        Err(AutomatonError::UnknownSymbol(sym("z")))
    );
    assert!(!aut.is_accepting(&unknown));
}

#[test]
fn from_set_collapses_singletons() {
    assert_eq!(
        AutomatonPosition::from_set(Some(3).into_iter().collect()),
        AutomatonPosition::Known(3)
    );
    assert_eq!(
        AutomatonPosition::from_set(vec![1, 2].into_iter().collect()),
        AutomatonPosition::Ambiguous(vec![1, 2].into_iter().collect())
    );
}

#[test]
fn join() {
    let mut left = automaton(&["a"], &["l0", "l1"], &[("l0", "a", "l1")], &["l1"]);
    let right = automaton(&["b"], &["r0", "r1"], &[("r0", "b", "r1")], &["r1"]);
    left.join(&right).unwrap();
    let alphabet: BTreeSet<Symbol> = coll!["a", "b"];
    assert_eq!(left.alphabet(), &alphabet);
    assert!(left.has_epsilon_rules());

    left.prepare().unwrap();
    assert_eq!(left.accepts(&word("a")), Ok(true));
    assert_eq!(left.accepts(&word("b")), Ok(true));
    assert_eq!(left.accepts(&word("a b")), Ok(false));
}

#[test]
fn display() {
    let aut = automaton(&["a", "b"], &["p", "q"], &[("p", "a", "q"), ("q", "b", "p")], &["q"]);
    assert_eq!(
        aut.to_string(),
        "(\n  {p, q},\n  {'a', 'b'},\n  {\n    p 'a' -> q;\n    q 'b' -> p;\n  },\n  p,\n  {q}\n)"
    );
}

use super::*;

#[test]
fn declare_symbols() {
    let mut g = Grammar::new();
    assert_eq!(g.add_terminal(""), Err(GrammarError::EmptyName));
    assert_eq!(g.add_terminal("a"), Ok(sym("a")));
    assert_eq!(g.add_terminal("a"), Err(GrammarError::DuplicateSymbol(sym("a"))));
    assert_eq!(g.add_nonterminal("a"), Err(GrammarError::DuplicateSymbol(sym("a"))));
    assert_eq!(g.add_nonterminal("S"), Ok(sym("S")));
    assert!(g.is_terminal(&sym("a")));
    assert!(g.is_nonterminal(&sym("S")));
    assert!(!g.is_symbol(&sym("b")));
}

#[test]
fn add_rules() {
    let mut g = Grammar::new();
    g.add_terminal("a").unwrap();
    g.add_nonterminal("S").unwrap();
    assert_eq!(g.add_rule("a", ["S"]), Err(GrammarError::InvalidLeftSide(sym("a"))));
    assert_eq!(g.add_rule("T", ["a"]), Err(GrammarError::UnknownSymbol(sym("T"))));
    assert_eq!(g.add_rule("S", ["a", "c"]), Err(GrammarError::UnknownSymbol(sym("c"))));
    assert_eq!(g.add_rule("S", ["a", "S"]), Ok(0));
    assert_eq!(g.add_rule("S", Vec::<&str>::new()), Ok(1));
    // The same rule twice is two rules.
    assert_eq!(g.add_rule("S", ["a", "S"]), Ok(2));
    assert_eq!(g.rules().len(), 3);
    assert!(g.rule(1).unwrap().is_epsilon());
    let s = sym("S");
    let indices: Vec<usize> = g.rules_for(&s).map(|(i, _)| i).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn start_symbol() {
    let mut g = Grammar::new();
    g.add_terminal("a").unwrap();
    g.add_nonterminal("S").unwrap();
    assert_eq!(g.start(), None);
    assert!(matches!(g.augmented(), Err(GrammarError::MissingStart)));
    assert_eq!(g.set_start("a"), Err(GrammarError::StartNotNonterminal(sym("a"))));
    assert_eq!(g.set_start("Q"), Err(GrammarError::StartNotNonterminal(sym("Q"))));
    g.set_start("S").unwrap();
    assert_eq!(g.start(), Some(&sym("S")));
}

#[test]
fn rule_text() {
    let g = anbn();
    assert_eq!(g.rule_text(0), "S -> 'a' S 'b'");
    assert_eq!(g.rule_text(1), "S -> ''");
    assert_eq!(g.rule_text(7), "<rule 7>");
    assert_eq!(g.to_string(), "0: S -> 'a' S 'b'\n1: S -> ''\n");
    assert_eq!(rule("S", "a S b").to_string(), "S -> a S b");
    assert_eq!(rule("S", "").to_string(), "S ->");
}

#[test]
fn augmented() {
    let g = anbn();
    let (aug, start) = g.augmented().unwrap();
    assert_eq!(start, sym("S*"));
    assert_eq!(aug.start(), Some(&start));
    assert_eq!(aug.rule(0), Some(&rule("S*", "S")));
    assert_eq!(&aug.rules()[1..], g.rules());
    assert!(aug.is_nonterminal(&start));
    assert_eq!(aug.terminals(), g.terminals());
}

#[test]
fn augmented_start_is_fresh() {
    let g = grammar(&["a"], &["S", "S*"], &[("S", "S* a"), ("S*", "")]);
    let (aug, start) = g.augmented().unwrap();
    assert_eq!(start, sym("S**"));
    assert_eq!(aug.rule(0), Some(&rule("S**", "S")));
}

#[test]
fn symbols() {
    assert!(Symbol::empty().is_empty());
    assert_eq!(Symbol::default(), Symbol::empty());
    assert_eq!(sym("if"), "if");
    assert_eq!(format!("{}", sym("if")), "if");
    assert_eq!(format!("{:?}", sym("if")), "'if'");
    assert_eq!(format!("{:?}", Symbol::empty()), "$");
    assert_eq!(Symbol::from(String::from("x")), Symbol::from(&sym("x")));
}

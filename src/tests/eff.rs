use super::*;
use std::collections::{BTreeMap, BTreeSet};

fn assignments() -> Grammar {
    grammar(
        &["x", "*", "="],
        &["S", "N", "E", "V"],
        &[
            ("S", "N"),
            ("N", "V = E"),
            ("N", "E"),
            ("E", "V"),
            ("V", "x"),
            ("V", "* E"),
        ],
    )
}

fn expressions() -> Grammar {
    grammar(
        &["+", "*", "(", ")", "id"],
        &["E", "E'", "T", "T'", "F"],
        &[
            ("E", "T E'"),
            ("E'", "+ T E'"),
            ("E'", ""),
            ("T", "F T'"),
            ("T'", "* F T'"),
            ("T'", ""),
            ("F", "( E )"),
            ("F", "id"),
        ],
    )
}

fn firsts(g: &Grammar, eff: &EmptyFirstFollow) -> BTreeMap<Symbol, (BTreeSet<Symbol>, bool)> {
    g.nonterminals()
        .iter()
        .map(|n| (n.clone(), (eff.first(&[n.clone()]), eff.is_empty(n))))
        .collect()
}

fn follows(g: &Grammar, eff: &EmptyFirstFollow) -> BTreeMap<Symbol, BTreeSet<Symbol>> {
    g.nonterminals()
        .iter()
        .map(|n| (n.clone(), eff.follow(n).clone()))
        .collect()
}

#[test]
fn first_sets() {
    let g = assignments();
    let eff = EmptyFirstFollow::new(&g);
    assert_eq!(
        firsts(&g, &eff),
        map! {
            sym("S") => (coll!["x", "*"], false),
            sym("N") => (coll!["x", "*"], false),
            sym("E") => (coll!["x", "*"], false),
            sym("V") => (coll!["x", "*"], false)
        }
    );
}

#[test]
fn follow_sets() {
    let g = assignments();
    let eff = EmptyFirstFollow::new(&g);
    assert_eq!(
        follows(&g, &eff),
        map! {
            sym("S") => coll![""],
            sym("N") => coll![""],
            sym("E") => coll!["=", ""],
            sym("V") => coll!["=", ""]
        }
    );
}

#[test]
fn nullable_sets() {
    let g = expressions();
    let eff = EmptyFirstFollow::new(&g);
    assert_eq!(
        firsts(&g, &eff),
        map! {
            sym("E") => (coll!["(", "id"], false),
            sym("E'") => (coll!["+"], true),
            sym("T") => (coll!["(", "id"], false),
            sym("T'") => (coll!["*"], true),
            sym("F") => (coll!["(", "id"], false)
        }
    );
    assert_eq!(
        follows(&g, &eff),
        map! {
            sym("E") => coll![")", ""],
            sym("E'") => coll![")", ""],
            sym("T") => coll!["+", ")", ""],
            sym("T'") => coll!["+", ")", ""],
            sym("F") => coll!["*", "+", ")", ""]
        }
    );
}

#[test]
fn sequences() {
    let g = expressions();
    let eff = EmptyFirstFollow::new(&g);
    let seq = |s: &str| -> Vec<Symbol> { s.split_whitespace().map(sym).collect() };

    let both: BTreeSet<Symbol> = coll!["+", "*"];
    assert_eq!(eff.first(&seq("E' T'")), both);
    assert!(eff.empty(&seq("E' T'")));

    let up_to_f: BTreeSet<Symbol> = coll!["+", "(", "id"];
    assert_eq!(eff.first(&seq("E' F T'")), up_to_f);
    assert!(!eff.empty(&seq("E' F")));

    let plus: BTreeSet<Symbol> = coll!["+"];
    assert_eq!(eff.first(&seq("+")), plus);
    assert!(eff.first(&[]).is_empty());
    assert!(eff.empty(&[]));
    assert!(!eff.is_empty(&sym("id")));
    assert!(eff.follow(&sym("nothing")).is_empty());
}

use super::*;
use rstest::rstest;

/// `*` binds tighter than `+`; `^` is right-associative; `==` does not chain.
fn arithmetic() -> PrecedenceTable {
    let mut p = PrecedenceTable::new();
    p.add_precedence(Associativity::Right, ["^"]).unwrap();
    p.add_precedence(Associativity::Left, ["*", "/"]).unwrap();
    p.add_precedence(Associativity::Left, ["+", "-"]).unwrap();
    p.add_precedence(Associativity::NonAssoc, ["=="]).unwrap();
    p
}

#[rstest]
#[case("+", "*", PrecedenceAction::Shift)]
#[case("*", "+", PrecedenceAction::Reduce)]
#[case("+", "-", PrecedenceAction::Reduce)]
#[case("*", "*", PrecedenceAction::Reduce)]
#[case("^", "^", PrecedenceAction::Shift)]
#[case("^", "*", PrecedenceAction::Reduce)]
#[case("==", "^", PrecedenceAction::Shift)]
fn decides(#[case] on_stack: &str, #[case] lookahead: &str, #[case] expected: PrecedenceAction) {
    assert_eq!(
        arithmetic().get_precedence(&sym(on_stack), &sym(lookahead)),
        Ok(expected)
    );
}

#[test]
fn non_associative() {
    assert_eq!(
        arithmetic().get_precedence(&sym("=="), &sym("==")),
        Err(PrecedenceError::NonAssociative(sym("==")))
    );
}

#[test]
fn missing() {
    let p = arithmetic();
    assert!(!p.is_defined(&sym("(")));
    assert_eq!(
        p.get_precedence(&sym("("), &sym("+")),
        Err(PrecedenceError::Missing(sym("("), sym("+")))
    );
    assert_eq!(
        p.get_precedence(&sym("+"), &Symbol::empty()),
        Err(PrecedenceError::Missing(sym("+"), Symbol::empty()))
    );
}

#[test]
fn duplicate() {
    let mut p = arithmetic();
    assert_eq!(
        p.add_precedence(Associativity::Left, ["%", "*"]),
        Err(PrecedenceError::Duplicate(sym("*")))
    );
}

#[test]
fn display() {
    let mut p = PrecedenceTable::new();
    p.add_precedence(Associativity::Left, ["*"]).unwrap();
    p.add_precedence(Associativity::NonAssoc, ["<"]).unwrap();
    assert_eq!(p.to_string(), "*: 0, Left\n<: 1, NonAssoc\n");
}

use std::io::{self, Read};
use std::process;

use tcgp::*;

fn grammar() -> Result<Grammar, GrammarError> {
    let mut g = Grammar::new();
    g.add_nonterminal("S")?;
    g.add_terminal("a")?;
    g.add_terminal("b")?;
    g.add_rule("S", ["a", "S", "b"])?;
    g.add_rule("S", Vec::<&str>::new())?;
    g.set_start("S")?;
    Ok(g)
}

// Accepts the levels "S" and "a S b".
fn levels() -> Result<FiniteAutomaton, AutomatonError> {
    let mut aut = FiniteAutomaton::new();
    for sym in ["S", "a", "b"] {
        aut.add_alpha(sym);
    }
    for st in ["q0", "q1", "q2", "q3", "q4"] {
        aut.add_state(st);
    }
    aut.add_rule("q0", "S", "q1")?;
    aut.add_rule("q0", "a", "q2")?;
    aut.add_rule("q2", "S", "q3")?;
    aut.add_rule("q3", "b", "q4")?;
    aut.set_start("q0")?;
    aut.set_terminating("q1")?;
    aut.set_terminating("q4")?;
    Ok(aut)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let g = grammar()?;
    let table = LrTableBuilder::new(&g)
        .level_automaton(levels()?)
        .report_conflicts(true)
        .build()?;
    log::debug!("grammar:\n{}", table.grammar());
    log::debug!("table:\n{}", table);

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let tree = parse(&table, &mut WhitespaceTokens::new(&input))?;
    print!("{}", tree);
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}

//! End-to-end scenarios over the public surface: grammar text in, tables,
//! traces and automata out.

use formalang::{
    cyk::CykTable,
    first_follow::FirstFollowTable,
    fsm::{Dfa, MinDfa, Nfa},
    grammar::Grammar,
    ll1::Ll1Table,
    lr::{ActionGotoTable, LrAutomaton, LrError},
    regex::Regex,
    transform, tree,
};

const ARITHMETIC: &str = "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id";

#[test]
fn arithmetic_grammar_classifies_its_symbols() {
    let grammar = Grammar::parse(ARITHMETIC).unwrap();
    for terminal in ["+", "*", "(", ")", "id"] {
        assert!(grammar.is_terminal(terminal), "{}", terminal);
    }
    for non_terminal in ["E", "T", "F"] {
        assert!(grammar.is_non_terminal(non_terminal), "{}", non_terminal);
    }
    assert_eq!(grammar.terminals().len(), 5);
    assert_eq!(grammar.non_terminals().len(), 3);
}

#[test]
fn pretty_printed_grammar_parses_back_to_itself() {
    let grammar = Grammar::parse(ARITHMETIC).unwrap();
    let printed = grammar.to_string();
    let reparsed = Grammar::parse(&printed).unwrap();
    assert_eq!(reparsed.to_string(), printed);
}

#[test]
fn predictive_parsing_after_removing_left_recursion() {
    let grammar = Grammar::parse(ARITHMETIC).unwrap();
    let grammar = transform::eliminate_left_recursion(&grammar).unwrap();
    let sets = FirstFollowTable::new(&grammar);
    let table = Ll1Table::new(&grammar, &sets);
    assert!(!table.has_conflict());

    let steps = table.parse(&grammar, "id + id * id");
    assert!(steps.accepted());
    assert!(tree::from_ll_trace(&grammar, &steps).is_some());

    assert!(!table.parse(&grammar, "id + + id").accepted());
    assert!(!table.parse(&grammar, "( id").accepted());
}

#[test]
fn shared_first_symbol_makes_the_ll1_table_conflict() {
    let grammar = Grammar::parse("S -> a | a b").unwrap();
    let sets = FirstFollowTable::new(&grammar);
    let table = Ll1Table::new(&grammar, &sets);
    assert!(table.has_conflict());
}

#[test]
fn follow_of_the_start_symbol_contains_end_of_input() {
    let grammar = Grammar::parse(ARITHMETIC).unwrap();
    let sets = FirstFollowTable::new(&grammar);
    let start = grammar.start_symbol().unwrap();
    assert_eq!(sets.follow_names(&grammar, start), vec!["$", ")", "+"]);
    assert_eq!(sets.first_names(&grammar, start), vec!["(", "id"]);
    assert!(!sets.is_nullable(start));
}

#[test]
fn cyk_on_a_grammar_already_in_normal_form() {
    let grammar = Grammar::parse("S -> A B\nA -> a\nB -> b").unwrap();
    assert!(transform::is_chomsky_normal_form(&grammar));
    assert!(CykTable::parse(&grammar, "a b").unwrap().accepted());
    assert!(!CykTable::parse(&grammar, "a a").unwrap().accepted());
}

#[test]
fn cyk_on_the_converted_arithmetic_grammar() {
    let grammar = Grammar::parse(ARITHMETIC).unwrap();
    let cnf = transform::to_chomsky_normal_form(&grammar);
    assert!(transform::is_chomsky_normal_form(&cnf));
    let table = CykTable::parse(&cnf, "id + id * id").unwrap();
    assert!(table.accepted());
    assert!(table.parse_tree(&cnf).is_some());
    assert!(!CykTable::parse(&cnf, "id + * id").unwrap().accepted());
}

#[test]
fn left_recursion_without_a_base_case_cannot_be_removed() {
    let grammar = Grammar::parse("A -> A a").unwrap();
    let err = transform::eliminate_left_recursion(&grammar).unwrap_err();
    assert_eq!(
        err.to_string(),
        "left recursion cannot be eliminated for `A'",
    );
}

#[test]
fn regex_pipeline_recognizes_strings_ending_in_abb() {
    let regex = Regex::parse("(a|b)*abb").unwrap();
    let nfa = Nfa::from_regex(&regex);
    let dfa = Dfa::from_nfa(&nfa);
    let min = MinDfa::from_dfa(&dfa);

    for input in ["abb", "aabb", "babb", "bababb"] {
        assert!(dfa.accepts(input), "{}", input);
        assert!(min.accepts(input), "{}", input);
    }
    for input in ["", "ab", "ba", "abbb"] {
        assert!(!dfa.accepts(input), "{}", input);
        assert!(!min.accepts(input), "{}", input);
    }
    assert!(min.len() <= dfa.len());
}

#[test]
fn determinization_and_minimization_preserve_the_language() {
    for pattern in ["(a|b)*abb", "a(b|a)*", "ab|b", "((ε|a)b*)*"] {
        let nfa = Nfa::from_regex(&Regex::parse(pattern).unwrap());
        let dfa = Dfa::from_nfa(&nfa);
        let min = MinDfa::from_dfa(&dfa);
        // every string over {a, b} up to length 5
        let mut inputs = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..5 {
            frontier = frontier
                .iter()
                .flat_map(|prefix| {
                    ['a', 'b'].map(|ch| {
                        let mut next = prefix.clone();
                        next.push(ch);
                        next
                    })
                })
                .collect();
            inputs.extend(frontier.iter().cloned());
        }
        for input in &inputs {
            assert_eq!(dfa.accepts(input), min.accepts(input), "{:?}", input);
        }
    }
}

#[test]
fn one_lookahead_variants_agree_on_a_simple_grammar() {
    let grammar = Grammar::parse("S -> C C\nC -> c C | d").unwrap();
    let builders: [fn(&Grammar) -> Result<LrAutomaton, LrError>; 3] =
        [LrAutomaton::slr1, LrAutomaton::lr1, LrAutomaton::lalr1];
    for build in builders {
        let automaton = build(&grammar).unwrap();
        let table = ActionGotoTable::new(&automaton);
        assert!(!table.has_conflict());

        let steps = table.parse(&grammar, "c d c d");
        assert!(steps.accepted());
        assert!(tree::from_lr_trace(&grammar, &steps).is_some());
        assert!(!table.parse(&grammar, "c d").accepted());
        assert!(!table.parse(&grammar, "d d d").accepted());
    }
}

#[test]
fn lalr_state_count_never_exceeds_lr1() {
    for text in [
        ARITHMETIC,
        "S -> C C\nC -> c C | d",
        "S -> a A d | b B d | a B e | b A e\nA -> c\nB -> c",
    ] {
        let grammar = Grammar::parse(text).unwrap();
        let lr1 = LrAutomaton::lr1(&grammar).unwrap();
        let lalr1 = LrAutomaton::lalr1(&grammar).unwrap();
        assert!(lalr1.len() <= lr1.len(), "{}", text);
    }
}

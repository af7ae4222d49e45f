//! ACTION/GOTO tables and the shift-reduce driver.

use super::{automaton::LrAutomaton, LrVariant};
use crate::{
    first_follow::FirstFollowTable,
    grammar::{Grammar, SymbolID, EOI_NAME},
    trace::{ParseStep, ParseSteps, StepAction},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// One table entry. Reduce carries the production index of the grammar the
/// automaton was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrAction {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// The ACTION and GOTO tables of one automaton.
///
/// An action cell holds every entry admissible at (state, terminal); more
/// than one entry marks a conflict. Building a conflicted table succeeds,
/// only parsing through a conflicted cell rejects.
#[derive(Debug)]
pub struct ActionGotoTable {
    num_states: usize,
    actions: Map<(usize, SymbolID), Vec<LrAction>>,
    gotos: Map<(usize, SymbolID), usize>,
}

impl ActionGotoTable {
    /// Fill the table: shifts and gotos from the transition graph, `accept`
    /// at end-of-input in accept states, and reduces for every completed item
    /// on the lookaheads the automaton's variant permits. Accept states get
    /// no reduce entries.
    pub fn new(automaton: &LrAutomaton) -> Self {
        let grammar = automaton.grammar();
        let mut actions: Map<(usize, SymbolID), Vec<LrAction>> = Map::default();
        let mut gotos: Map<(usize, SymbolID), usize> = Map::default();

        for edge in automaton.edges() {
            if grammar.is_terminal_id(edge.symbol) {
                actions
                    .entry((edge.from, edge.symbol))
                    .or_default()
                    .push(LrAction::Shift(edge.to));
            } else {
                gotos.insert((edge.from, edge.symbol), edge.to);
            }
        }

        let follow =
            matches!(automaton.variant(), LrVariant::Slr1).then(|| FirstFollowTable::new(grammar));
        for (u, state) in automaton.states().iter().enumerate() {
            if state.is_accept() {
                actions
                    .entry((u, SymbolID::EOI))
                    .or_default()
                    .push(LrAction::Accept);
                continue;
            }
            for item in state.grouped(grammar) {
                let production = &grammar.productions()[item.production()];
                if item.dot() != production.body().len()
                    || item.production() == automaton.augmented_index()
                {
                    continue;
                }
                let reduce = LrAction::Reduce(item.production());
                let mut add = |terminal: SymbolID| {
                    actions.entry((u, terminal)).or_default().push(reduce);
                };
                match automaton.variant() {
                    LrVariant::Lr0 => {
                        for terminal in grammar.terminal_ids_sorted() {
                            add(terminal);
                        }
                        add(SymbolID::EOI);
                    }
                    LrVariant::Slr1 => {
                        if let Some(follow) = &follow {
                            for terminal in follow.follow(production.head()).iter() {
                                add(terminal);
                            }
                        }
                    }
                    LrVariant::Lr1 | LrVariant::Lalr1 => {
                        for terminal in item.lookaheads().iter() {
                            add(terminal);
                        }
                    }
                }
            }
        }

        let table = Self {
            num_states: automaton.len(),
            actions,
            gotos,
        };
        if table.has_conflict() {
            tracing::debug!("the {:?} table has conflicts", automaton.variant());
        }
        table
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Entries admissible at (state, terminal).
    pub fn actions_at(&self, state: usize, terminal: SymbolID) -> &[LrAction] {
        self.actions
            .get(&(state, terminal))
            .map_or(&[], Vec::as_slice)
    }

    pub fn goto_at(&self, state: usize, non_terminal: SymbolID) -> Option<usize> {
        self.gotos.get(&(state, non_terminal)).copied()
    }

    /// Action cell rendered as entries joined by `separator`.
    pub fn cell_text(
        &self,
        grammar: &Grammar,
        state: usize,
        terminal: SymbolID,
        separator: &str,
    ) -> String {
        self.actions_at(state, terminal)
            .iter()
            .map(|action| action_text(grammar, action))
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn has_conflict_at(&self, state: usize, terminal: SymbolID) -> bool {
        self.actions_at(state, terminal).len() > 1
    }

    pub fn has_conflict(&self) -> bool {
        self.actions.values().any(|cell| cell.len() > 1)
    }

    /// Markdown rendering: one row per state, terminal columns sorted by name
    /// with end-of-input last, then goto columns in grammar order.
    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            let mut terminals = grammar.terminal_ids_sorted();
            terminals.push(SymbolID::EOI);
            let non_terminals = grammar.non_terminal_ids();

            f.write_str("| State |")?;
            for symbol in terminals.iter().chain(non_terminals) {
                write!(f, " {} |", grammar.symbol_name(*symbol))?;
            }
            writeln!(f)?;
            f.write_str("|:-:|")?;
            for _ in 0..terminals.len() + non_terminals.len() {
                f.write_str(":-:|")?;
            }
            writeln!(f)?;
            for state in 0..self.num_states {
                write!(f, "| {} |", state)?;
                for terminal in &terminals {
                    write!(f, " {} |", self.cell_text(grammar, state, *terminal, " / "))?;
                }
                for non_terminal in non_terminals {
                    match self.goto_at(state, *non_terminal) {
                        Some(next) => write!(f, " {} |", next)?,
                        None => f.write_str("  |")?,
                    }
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }

    /// Simulate the shift-reduce parser over whitespace-separated input
    /// symbols, logging every transition.
    pub fn parse(&self, grammar: &Grammar, input: &str) -> ParseSteps {
        let mut steps = ParseSteps::lr();
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let mut stack: Vec<usize> = vec![0];
        let mut symbols: Vec<String> = Vec::new();
        let mut position = 0;

        loop {
            let Some(&state) = stack.last() else {
                break;
            };
            let snapshot = ParseStep {
                stack: stack.iter().map(|s| s.to_string()).collect(),
                symbols: symbols.clone(),
                remaining: tokens[position..]
                    .iter()
                    .map(|t| (*t).to_owned())
                    .chain([EOI_NAME.to_owned()])
                    .collect(),
                action: StepAction::Accept,
            };
            let lookahead = if position >= tokens.len() {
                Some(SymbolID::EOI)
            } else {
                grammar
                    .symbol_id(tokens[position])
                    .filter(|s| grammar.is_terminal_id(*s))
            };
            let Some(lookahead) = lookahead else {
                steps.push(ParseStep {
                    action: StepAction::Error {
                        message: "invalid symbol".to_owned(),
                    },
                    ..snapshot
                });
                break;
            };

            match self.actions_at(state, lookahead) {
                [] => {
                    steps.push(ParseStep {
                        action: StepAction::Error {
                            message: "invalid symbol".to_owned(),
                        },
                        ..snapshot
                    });
                    break;
                }
                [LrAction::Shift(next)] => {
                    let next = *next;
                    steps.push(ParseStep {
                        action: StepAction::Shift {
                            state: next,
                            terminal: tokens[position].to_owned(),
                        },
                        ..snapshot
                    });
                    stack.push(next);
                    symbols.push(tokens[position].to_owned());
                    position += 1;
                }
                [LrAction::Reduce(index)] => {
                    let index = *index;
                    steps.push(ParseStep {
                        action: StepAction::Reduce {
                            production: index,
                            rendered: grammar.display_production(index).to_string(),
                        },
                        ..snapshot
                    });
                    let production = &grammar.productions()[index];
                    let arity = production.body().len();
                    if stack.len() < arity + 1 || symbols.len() < arity {
                        steps.push(invalid_table_step(&tokens, position));
                        break;
                    }
                    stack.truncate(stack.len() - arity);
                    symbols.truncate(symbols.len() - arity);
                    let top = stack[stack.len() - 1];
                    match self.goto_at(top, production.head()) {
                        Some(next) => {
                            stack.push(next);
                            symbols.push(grammar.symbol_name(production.head()).to_owned());
                        }
                        None => {
                            steps.push(invalid_table_step(&tokens, position));
                            break;
                        }
                    }
                }
                [LrAction::Accept] => {
                    steps.push(snapshot);
                    break;
                }
                _ => {
                    steps.push(ParseStep {
                        action: StepAction::Conflict {
                            rendered: self.cell_text(grammar, state, lookahead, " / "),
                        },
                        ..snapshot
                    });
                    break;
                }
            }
        }
        steps
    }
}

fn action_text(grammar: &Grammar, action: &LrAction) -> String {
    match action {
        LrAction::Shift(state) => format!("shift {}", state),
        LrAction::Reduce(index) => format!("reduce {}", grammar.display_production(*index)),
        LrAction::Accept => "accept".to_owned(),
    }
}

fn invalid_table_step(tokens: &[&str], position: usize) -> ParseStep {
    ParseStep {
        stack: Vec::new(),
        symbols: Vec::new(),
        remaining: tokens[position..]
            .iter()
            .map(|t| (*t).to_owned())
            .chain([EOI_NAME.to_owned()])
            .collect(),
        action: StepAction::Error {
            message: "invalid action/goto table".to_owned(),
        },
    }
}

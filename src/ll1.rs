//! LL(1) predictive table construction and table-driven parsing.

use crate::{
    first_follow::FirstFollowTable,
    grammar::{Grammar, SymbolID, EOI_NAME},
    trace::{ParseStep, ParseSteps, StepAction},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// The predictive table: rows are non-terminals in grammar order, columns are
/// terminals sorted by name with the end-of-input marker last. A cell holds
/// the indices of every production admissible at (row, column); more than one
/// entry marks a conflict.
#[derive(Debug)]
pub struct Ll1Table {
    non_terminals: Vec<SymbolID>,
    terminals: Vec<SymbolID>,
    cells: Map<(SymbolID, SymbolID), Vec<usize>>,
}

impl Ll1Table {
    pub fn new(grammar: &Grammar, sets: &FirstFollowTable) -> Self {
        let non_terminals = grammar.non_terminal_ids().to_vec();
        let mut terminals = grammar.terminal_ids_sorted();
        terminals.push(SymbolID::EOI);

        let mut cells: Map<(SymbolID, SymbolID), Vec<usize>> = Map::default();
        let mut add = |head: SymbolID, terminal: SymbolID, index: usize| {
            let cell = cells.entry((head, terminal)).or_default();
            if !cell.contains(&index) {
                cell.push(index);
            }
        };
        for (index, production) in grammar.productions().iter().enumerate() {
            let (first, nullable) = sets.first_of_body(production.body());
            for terminal in first.iter() {
                add(production.head(), terminal, index);
            }
            if nullable {
                for terminal in sets.follow(production.head()).iter() {
                    add(production.head(), terminal, index);
                }
            }
        }
        Self {
            non_terminals,
            terminals,
            cells,
        }
    }

    pub fn num_non_terminals(&self) -> usize {
        self.non_terminals.len()
    }

    /// Terminal count, end-of-input column included.
    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn non_terminal_at(&self, index: usize) -> SymbolID {
        self.non_terminals[index]
    }

    pub fn terminal_at(&self, index: usize) -> SymbolID {
        self.terminals[index]
    }

    /// Production indices admissible at (non-terminal, terminal).
    pub fn cell(&self, non_terminal: SymbolID, terminal: SymbolID) -> &[usize] {
        self.cells
            .get(&(non_terminal, terminal))
            .map_or(&[], Vec::as_slice)
    }

    /// Cell rendered as production strings joined by `separator`.
    pub fn cell_text(
        &self,
        grammar: &Grammar,
        non_terminal: SymbolID,
        terminal: SymbolID,
        separator: &str,
    ) -> String {
        self.cell(non_terminal, terminal)
            .iter()
            .map(|i| grammar.display_production(*i).to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn has_conflict_at(&self, non_terminal: SymbolID, terminal: SymbolID) -> bool {
        self.cell(non_terminal, terminal).len() > 1
    }

    pub fn has_conflict(&self) -> bool {
        self.cells.values().any(|cell| cell.len() > 1)
    }

    /// Markdown rendering of the whole table.
    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            f.write_str("| |")?;
            for terminal in &self.terminals {
                write!(f, " {} |", grammar.symbol_name(*terminal))?;
            }
            writeln!(f)?;
            f.write_str("|:-:|")?;
            for _ in &self.terminals {
                f.write_str(":-:|")?;
            }
            writeln!(f)?;
            for non_terminal in &self.non_terminals {
                write!(f, "| {} |", grammar.symbol_name(*non_terminal))?;
                for terminal in &self.terminals {
                    write!(
                        f,
                        " {} |",
                        self.cell_text(grammar, *non_terminal, *terminal, " / ")
                    )?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }

    /// Simulate the predictive parser over whitespace-separated input
    /// symbols, logging every transition.
    pub fn parse(&self, grammar: &Grammar, input: &str) -> ParseSteps {
        let mut steps = ParseSteps::ll();
        let Some(start) = grammar.start_symbol() else {
            return steps;
        };
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let mut stack = vec![SymbolID::EOI, start];
        let mut position = 0;

        loop {
            let Some(&top) = stack.last() else {
                break;
            };
            let lookahead = if position >= tokens.len() {
                Some(SymbolID::EOI)
            } else {
                grammar
                    .symbol_id(tokens[position])
                    .filter(|s| grammar.is_terminal_id(*s))
            };
            let snapshot = ParseStep {
                stack: stack.iter().map(|s| grammar.symbol_name(*s).to_owned()).collect(),
                symbols: Vec::new(),
                remaining: tokens[position..]
                    .iter()
                    .map(|t| (*t).to_owned())
                    .chain([EOI_NAME.to_owned()])
                    .collect(),
                action: StepAction::Accept,
            };

            if top == SymbolID::EOI && lookahead == Some(SymbolID::EOI) {
                steps.push(snapshot);
                break;
            }
            if grammar.is_terminal_id(top) {
                if lookahead == Some(top) {
                    steps.push(ParseStep {
                        action: StepAction::Match {
                            terminal: grammar.symbol_name(top).to_owned(),
                        },
                        ..snapshot
                    });
                    stack.pop();
                    position += 1;
                } else {
                    steps.push(ParseStep {
                        action: StepAction::Error {
                            message: format!("expected {}", grammar.symbol_name(top)),
                        },
                        ..snapshot
                    });
                    break;
                }
                continue;
            }

            let Some(lookahead) = lookahead else {
                steps.push(ParseStep {
                    action: StepAction::Error {
                        message: "unexpected symbol".to_owned(),
                    },
                    ..snapshot
                });
                break;
            };
            match self.cell(top, lookahead) {
                [] => {
                    steps.push(ParseStep {
                        action: StepAction::Error {
                            message: "no rule".to_owned(),
                        },
                        ..snapshot
                    });
                    break;
                }
                [index] => {
                    steps.push(ParseStep {
                        action: StepAction::Apply {
                            production: *index,
                            rendered: grammar.display_production(*index).to_string(),
                        },
                        ..snapshot
                    });
                    stack.pop();
                    for symbol in grammar.productions()[*index].body().iter().rev() {
                        stack.push(*symbol);
                    }
                }
                _ => {
                    steps.push(ParseStep {
                        action: StepAction::Conflict {
                            rendered: self.cell_text(grammar, top, lookahead, " / "),
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

//! CYK recognition over grammars in Chomsky normal form.
//!
//! The engine never converts implicitly; callers run
//! [`transform::to_chomsky_normal_form`](crate::transform::to_chomsky_normal_form)
//! first and get an error otherwise.

use crate::{
    grammar::{Grammar, SymbolID, EPSILON_NAME},
    transform,
    tree::ParseTree,
    types::Map,
    util::display_fn,
};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CykError {
    #[error("the grammar is not in Chomsky normal form")]
    NotChomskyNormalForm,
}

/// How a non-terminal came to cover a span; the first derivation found for a
/// (span, non-terminal) pair wins and later ones are ignored.
#[derive(Debug, Clone, Copy)]
enum Derivation {
    /// A unary production matched the single token of the span.
    Leaf { production: usize },
    /// A binary production split the span after `split` tokens.
    Branch { production: usize, split: usize },
}

/// The triangular recognition table of one input, indexed by (start offset,
/// span length). The input is accepted iff the start symbol covers the whole
/// input.
#[derive(Debug)]
pub struct CykTable {
    tokens: Vec<String>,
    cells: Map<(usize, usize), Map<SymbolID, Derivation>>,
    accepted: bool,
    /// `start -> ε`, when present; the only way to accept empty input.
    epsilon_production: Option<usize>,
}

impl CykTable {
    /// Run the recognizer over whitespace-separated input symbols.
    ///
    /// Length-1 spans are filled from unary terminal productions; longer
    /// spans combine two sub-spans through binary productions, shortest left
    /// sub-span first. Input tokens outside the grammar's alphabet match no
    /// production and simply leave their cells empty.
    pub fn parse(grammar: &Grammar, input: &str) -> Result<Self, CykError> {
        if !transform::is_chomsky_normal_form(grammar) {
            return Err(CykError::NotChomskyNormalForm);
        }
        let tokens: Vec<String> = input.split_whitespace().map(str::to_owned).collect();
        let n = tokens.len();
        let start = grammar.start_symbol();

        let epsilon_production = start.and_then(|s| {
            grammar
                .productions_of(s)
                .find(|(_, p)| p.is_epsilon())
                .map(|(i, _)| i)
        });

        let mut cells: Map<(usize, usize), Map<SymbolID, Derivation>> = Map::default();
        for (i, token) in tokens.iter().enumerate() {
            let token_id = grammar.symbol_id(token);
            let cell = cells.entry((i, 1)).or_default();
            for (index, production) in grammar.productions().iter().enumerate() {
                if let [terminal] = production.body() {
                    if grammar.is_terminal_id(*terminal) && Some(*terminal) == token_id {
                        cell.entry(production.head())
                            .or_insert(Derivation::Leaf { production: index });
                    }
                }
            }
        }
        for length in 2..=n {
            for offset in 0..=n - length {
                for split in 1..length {
                    let mut found: Vec<(SymbolID, Derivation)> = Vec::new();
                    let left = cells.get(&(offset, split));
                    let right = cells.get(&(offset + split, length - split));
                    let (Some(left), Some(right)) = (left, right) else {
                        continue;
                    };
                    for (index, production) in grammar.productions().iter().enumerate() {
                        if let [b, c] = production.body() {
                            if left.contains_key(b) && right.contains_key(c) {
                                found.push((
                                    production.head(),
                                    Derivation::Branch {
                                        production: index,
                                        split,
                                    },
                                ));
                            }
                        }
                    }
                    let cell = cells.entry((offset, length)).or_default();
                    for (head, derivation) in found {
                        cell.entry(head).or_insert(derivation);
                    }
                }
            }
        }

        let accepted = match (start, n) {
            (None, _) => false,
            (Some(_), 0) => epsilon_production.is_some(),
            (Some(start), n) => cells
                .get(&(0, n))
                .map_or(false, |cell| cell.contains_key(&start)),
        };
        Ok(Self {
            tokens,
            cells,
            accepted,
            epsilon_production,
        })
    }

    /// Number of input tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Non-terminals covering the span of `length` tokens at `offset`, in
    /// discovery order. Out-of-range spans yield nothing.
    pub fn cell(&self, offset: usize, length: usize) -> Vec<SymbolID> {
        self.cells
            .get(&(offset, length))
            .map(|cell| cell.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Cell rendered as non-terminal names joined by `separator`.
    pub fn cell_text(
        &self,
        grammar: &Grammar,
        offset: usize,
        length: usize,
        separator: &str,
    ) -> String {
        self.cell(offset, length)
            .iter()
            .map(|id| grammar.symbol_name(*id))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Markdown rendering: token columns, one row per span length.
    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            let n = self.tokens.len();
            f.write_str("| |")?;
            for token in &self.tokens {
                write!(f, " {} |", token)?;
            }
            writeln!(f)?;
            f.write_str("|:-:|")?;
            for _ in 0..n {
                f.write_str(":-:|")?;
            }
            writeln!(f)?;
            for length in 1..=n {
                write!(f, "| {} |", length)?;
                for offset in 0..=n - length {
                    write!(f, " {} |", self.cell_text(grammar, offset, length, ", "))?;
                }
                for _ in 0..length - 1 {
                    f.write_str("  |")?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }

    /// Rebuild the derivation tree by walking the recorded (production,
    /// split) choices top-down from the accepting entry.
    pub fn parse_tree(&self, grammar: &Grammar) -> Option<ParseTree> {
        if !self.accepted {
            return None;
        }
        let start = grammar.start_symbol()?;
        if self.tokens.is_empty() {
            self.epsilon_production?;
            return Some(ParseTree::node(
                grammar.symbol_name(start),
                vec![ParseTree::leaf(EPSILON_NAME)],
            ));
        }
        self.build(grammar, start, 0, self.tokens.len())
    }

    fn build(
        &self,
        grammar: &Grammar,
        symbol: SymbolID,
        offset: usize,
        length: usize,
    ) -> Option<ParseTree> {
        let derivation = self.cells.get(&(offset, length))?.get(&symbol)?;
        let name = grammar.symbol_name(symbol);
        match *derivation {
            Derivation::Leaf { production } => {
                let [terminal] = grammar.productions()[production].body() else {
                    return None;
                };
                Some(ParseTree::node(
                    name,
                    vec![ParseTree::leaf(grammar.symbol_name(*terminal))],
                ))
            }
            Derivation::Branch { production, split } => {
                let [b, c] = grammar.productions()[production].body() else {
                    return None;
                };
                let left = self.build(grammar, *b, offset, split)?;
                let right = self.build(grammar, *c, offset + split, length - split)?;
                Some(ParseTree::node(name, vec![left, right]))
            }
        }
    }
}

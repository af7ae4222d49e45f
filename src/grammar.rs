//! Grammar types and the grammar surface-syntax reader.

use crate::{
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

/// Identifier of an interned symbol inside a [`Grammar`].
///
/// Symbols are interned once per grammar, so comparing two IDs compares the
/// symbols themselves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolID {
    raw: u16,
}

impl SymbolID {
    /// Reserved symbol for the end-of-input lookahead sentinel, printed as `$`.
    pub const EOI: Self = Self::from_raw(0);

    /// Reserved symbol for the empty production marker, printed as `ε`.
    pub const EPSILON: Self = Self::from_raw(1);

    const OFFSET: u16 = 2;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

/// Every symbol of a grammar is classified exactly once, when the production
/// set changes: heads of productions are non-terminals, everything else that
/// appears in a body is a terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
}

#[derive(Debug, Clone)]
struct SymbolData {
    name: String,
    kind: SymbolKind,
}

/// A production rule `head -> body`. An empty body denotes ε.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    head: SymbolID,
    body: Vec<SymbolID>,
}

impl Production {
    pub fn head(&self) -> SymbolID {
        self.head
    }

    pub fn body(&self) -> &[SymbolID] {
        &self.body
    }

    pub fn is_epsilon(&self) -> bool {
        self.body.is_empty()
    }
}

/// The name used for the end-of-input sentinel in printed tables and traces.
pub const EOI_NAME: &str = "$";

/// The canonical epsilon spelling; the reader also accepts the lunate `ϵ`.
pub const EPSILON_NAME: &str = "ε";

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("line {line} column {column}: cannot find the head of the production")]
    MissingHead { line: usize, column: usize },

    #[error("line {line} column {column}: found empty alternative for `{head}'")]
    EmptyAlternative {
        line: usize,
        column: usize,
        head: String,
    },

    #[error("line {line} column {column}: `{name}' is a reserved symbol")]
    ReservedSymbol {
        line: usize,
        column: usize,
        name: String,
    },
}

/// An immutable-after-construction context-free grammar.
///
/// The production sequence keeps insertion order; that order drives derivation
/// numbering, table tie-breaks and the pretty-printed form. Transformations
/// never mutate a grammar in place, they build a new one.
#[derive(Debug, Clone)]
pub struct Grammar {
    symbols: Map<SymbolID, SymbolData>,
    names: Map<String, SymbolID>,
    productions: Vec<Production>,
    heads: Vec<SymbolID>,
    terminals: Set<SymbolID>,
    next_symbol_id: u16,
}

impl Grammar {
    /// Parse the `LHS -> alt1 | alt2` surface syntax into a grammar.
    ///
    /// Both `->` and `→` are accepted as the produce sign; a lone `ε` (or `ϵ`)
    /// alternative denotes the empty body. Alternatives may continue on
    /// following lines; a new head starts wherever a symbol is followed by a
    /// produce sign.
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        let tokens = tokenize(text);
        let mut grammar = Grammar::empty();

        let mut head: Option<SymbolID> = None;
        let mut alt: Vec<SymbolID> = Vec::new();
        let mut saw_epsilon = false;
        let mut i = 0;

        let flush =
            |g: &mut Grammar, head: SymbolID, alt: &mut Vec<SymbolID>, saw_epsilon: &mut bool| {
                g.push_production(head, std::mem::take(alt));
                *saw_epsilon = false;
            };

        while i < tokens.len() {
            let token = &tokens[i];
            match &token.kind {
                TokenKind::Symbol(name)
                    if matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::Produce)) =>
                {
                    if let Some(h) = head {
                        if alt.is_empty() && !saw_epsilon {
                            return Err(GrammarError::EmptyAlternative {
                                line: token.line,
                                column: token.column,
                                head: grammar.symbol_name(h).to_owned(),
                            });
                        }
                        flush(&mut grammar, h, &mut alt, &mut saw_epsilon);
                    }
                    let id = grammar.intern_checked(name, token)?;
                    head = Some(id);
                    i += 2;
                }
                TokenKind::Produce => {
                    return Err(GrammarError::MissingHead {
                        line: token.line,
                        column: token.column,
                    });
                }
                TokenKind::Alter => {
                    let Some(h) = head else {
                        return Err(GrammarError::MissingHead {
                            line: token.line,
                            column: token.column,
                        });
                    };
                    if alt.is_empty() && !saw_epsilon {
                        return Err(GrammarError::EmptyAlternative {
                            line: token.line,
                            column: token.column,
                            head: grammar.symbol_name(h).to_owned(),
                        });
                    }
                    flush(&mut grammar, h, &mut alt, &mut saw_epsilon);
                    i += 1;
                }
                TokenKind::Symbol(name) => {
                    if head.is_none() {
                        return Err(GrammarError::MissingHead {
                            line: token.line,
                            column: token.column,
                        });
                    }
                    if name == EPSILON_NAME || name == "ϵ" {
                        saw_epsilon = true;
                    } else {
                        let id = grammar.intern_checked(name, token)?;
                        alt.push(id);
                    }
                    i += 1;
                }
            }
        }

        if let Some(h) = head {
            if alt.is_empty() && !saw_epsilon {
                let (line, column) = end_position(text);
                return Err(GrammarError::EmptyAlternative {
                    line,
                    column,
                    head: grammar.symbol_name(h).to_owned(),
                });
            }
            grammar.push_production(h, alt);
        }

        grammar.reclassify();
        Ok(grammar)
    }

    pub(crate) fn empty() -> Self {
        let mut symbols = Map::default();
        let mut names = Map::default();
        symbols.insert(
            SymbolID::EOI,
            SymbolData {
                name: EOI_NAME.to_owned(),
                kind: SymbolKind::Terminal,
            },
        );
        names.insert(EOI_NAME.to_owned(), SymbolID::EOI);
        symbols.insert(
            SymbolID::EPSILON,
            SymbolData {
                name: EPSILON_NAME.to_owned(),
                kind: SymbolKind::Terminal,
            },
        );
        names.insert(EPSILON_NAME.to_owned(), SymbolID::EPSILON);
        Self {
            symbols,
            names,
            productions: Vec::new(),
            heads: Vec::new(),
            terminals: Set::default(),
            next_symbol_id: SymbolID::OFFSET,
        }
    }

    /// A new grammar sharing this grammar's symbol table but with no
    /// productions yet; the starting point of every transformation.
    pub(crate) fn like(&self) -> Self {
        Self {
            symbols: self.symbols.clone(),
            names: self.names.clone(),
            productions: Vec::new(),
            heads: Vec::new(),
            terminals: Set::default(),
            next_symbol_id: self.next_symbol_id,
        }
    }

    pub(crate) fn intern(&mut self, name: &str) -> SymbolID {
        if let Some(id) = self.names.get(name) {
            return *id;
        }
        let id = SymbolID::from_raw(self.next_symbol_id);
        self.next_symbol_id += 1;
        self.symbols.insert(
            id,
            SymbolData {
                name: name.to_owned(),
                kind: SymbolKind::Terminal,
            },
        );
        self.names.insert(name.to_owned(), id);
        id
    }

    fn intern_checked(&mut self, name: &str, token: &Token) -> Result<SymbolID, GrammarError> {
        if name == EOI_NAME || name == EPSILON_NAME || name == "ϵ" {
            return Err(GrammarError::ReservedSymbol {
                line: token.line,
                column: token.column,
                name: name.to_owned(),
            });
        }
        Ok(self.intern(name))
    }

    pub(crate) fn push_production(&mut self, head: SymbolID, body: Vec<SymbolID>) {
        if !self.heads.contains(&head) {
            self.heads.push(head);
        }
        self.productions.push(Production { head, body });
    }

    /// Recompute the terminal/non-terminal classification from the current
    /// production set. Must be called once after the last `push_production`.
    pub(crate) fn reclassify(&mut self) {
        self.terminals.clear();
        for data in self.symbols.values_mut() {
            data.kind = SymbolKind::Terminal;
        }
        for head in &self.heads {
            self.symbols[head].kind = SymbolKind::NonTerminal;
        }
        for production in &self.productions {
            for symbol in &production.body {
                if self.symbols[symbol].kind == SymbolKind::Terminal {
                    self.terminals.insert(*symbol);
                }
            }
        }
    }

    /// Generate a fresh non-terminal name by appending `'` to `base` until the
    /// name is unused.
    pub(crate) fn fresh_primed(&mut self, base: SymbolID) -> SymbolID {
        let mut name = format!("{}'", self.symbol_name(base));
        while self.names.contains_key(&name) {
            name.push('\'');
        }
        self.intern(&name)
    }

    pub fn start_symbol(&self) -> Option<SymbolID> {
        self.heads.first().copied()
    }

    pub fn symbol_name(&self, id: SymbolID) -> &str {
        &self.symbols[&id].name
    }

    pub fn symbol_kind(&self, id: SymbolID) -> SymbolKind {
        self.symbols[&id].kind
    }

    pub fn is_terminal_id(&self, id: SymbolID) -> bool {
        self.symbols[&id].kind == SymbolKind::Terminal
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn productions_of(
        &self,
        head: SymbolID,
    ) -> impl Iterator<Item = (usize, &Production)> + '_ {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.head == head)
    }

    /// Non-terminals in first-appearance order.
    pub fn non_terminal_ids(&self) -> &[SymbolID] {
        &self.heads
    }

    /// Terminal IDs sorted by name, for deterministic table columns.
    pub fn terminal_ids_sorted(&self) -> Vec<SymbolID> {
        let mut ids: Vec<SymbolID> = self.terminals.iter().copied().collect();
        ids.sort_by(|a, b| self.symbol_name(*a).cmp(self.symbol_name(*b)));
        ids
    }

    /// Terminal names, sorted.
    pub fn terminals(&self) -> Vec<&str> {
        self.terminal_ids_sorted()
            .into_iter()
            .map(|id| self.symbol_name(id))
            .collect()
    }

    /// Non-terminal names in first-appearance order.
    pub fn non_terminals(&self) -> Vec<&str> {
        self.heads.iter().map(|id| self.symbol_name(*id)).collect()
    }

    pub fn is_terminal(&self, name: &str) -> bool {
        self.names
            .get(name)
            .map_or(false, |id| self.terminals.contains(id))
    }

    pub fn is_non_terminal(&self, name: &str) -> bool {
        self.names
            .get(name)
            .map_or(false, |id| self.heads.contains(id))
    }

    /// Look up an interned symbol by name.
    pub fn symbol_id(&self, name: &str) -> Option<SymbolID> {
        self.names.get(name).copied()
    }

    // `"A -> b C"` (ε body printed as `A -> ε`)
    pub fn display_production<'g>(&'g self, index: usize) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = &self.productions[index];
            write!(f, "{} -> ", self.symbol_name(production.head))?;
            write_body(f, self, &production.body)
        })
    }
}

fn write_body(f: &mut fmt::Formatter<'_>, g: &Grammar, body: &[SymbolID]) -> fmt::Result {
    if body.is_empty() {
        return f.write_str(EPSILON_NAME);
    }
    for (i, symbol) in body.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        f.write_str(g.symbol_name(*symbol))?;
    }
    Ok(())
}

impl fmt::Display for Grammar {
    /// Reproduces the surface form: one block per head, heads right-aligned,
    /// further alternatives continued with `|` on their own lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .heads
            .iter()
            .map(|h| self.symbol_name(*h).chars().count())
            .max()
            .unwrap_or(0);
        for head in &self.heads {
            let name = self.symbol_name(*head);
            let pad = width - name.chars().count();
            for (i, (_, production)) in self.productions_of(*head).enumerate() {
                if i == 0 {
                    write!(f, "{:pad$}{} -> ", "", name, pad = pad)?;
                } else {
                    write!(f, "{:pad$}| ", "", pad = width + 2)?;
                }
                write_body(f, self, &production.body)?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
enum TokenKind {
    /// The `->` (or `→`) sign.
    Produce,
    /// The `|` sign.
    Alter,
    Symbol(String),
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

/// Split grammar text into produce signs, alternation signs and symbols,
/// tracking line/column positions for error reporting.
fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut tokens = Vec::new();
    let (mut line, mut column) = (1, 1);
    let mut i = 0;
    while i < n {
        if chars[i] == '\r' && i + 1 < n && chars[i + 1] == '\n' {
            line += 1;
            column = 1;
            i += 2;
        } else if chars[i] == '\n' || chars[i] == '\r' {
            line += 1;
            column = 1;
            i += 1;
        } else if chars[i].is_whitespace() {
            column += 1;
            i += 1;
        } else if chars[i] == '-' && i + 1 < n && chars[i + 1] == '>' {
            tokens.push(Token {
                kind: TokenKind::Produce,
                line,
                column,
            });
            i += 2;
            column += 2;
        } else if chars[i] == '|' {
            tokens.push(Token {
                kind: TokenKind::Alter,
                line,
                column,
            });
            i += 1;
            column += 1;
        } else {
            let start = i;
            let start_column = column;
            while i < n
                && !chars[i].is_whitespace()
                && chars[i] != '|'
                && !(chars[i] == '-' && i + 1 < n && chars[i + 1] == '>')
            {
                i += 1;
                column += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let kind = if word == "→" {
                TokenKind::Produce
            } else {
                TokenKind::Symbol(word)
            };
            tokens.push(Token {
                kind,
                line,
                column: start_column,
            });
        }
    }
    tokens
}

fn end_position(text: &str) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for c in text.chars() {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

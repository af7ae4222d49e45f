//! Canonical item-set collections and their transition graphs.

use super::{LrError, LrVariant};
use crate::{
    first_follow::FirstFollowTable,
    grammar::{Grammar, SymbolID},
    types::{Map, Set, SymbolIDSet},
    util::display_fn,
};
use std::fmt;

/// A production with a marked dot position. `lookaheads` is empty for the
/// LR(0)/SLR(1) collection and holds the reduce lookaheads for LR(1)/LALR(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrItem {
    production: usize,
    dot: usize,
    lookaheads: SymbolIDSet,
}

impl LrItem {
    pub fn production(&self) -> usize {
        self.production
    }

    /// Dot position, `0..=|body|`.
    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn lookaheads(&self) -> &SymbolIDSet {
        &self.lookaheads
    }
}

/// One state of the collection: the kernel items that created it via goto
/// (or the augmented start item for state 0) plus the items added by closure.
#[derive(Debug, Clone)]
pub struct LrState {
    kernel: Vec<LrItem>,
    closure: Vec<LrItem>,
    accept: bool,
}

impl LrState {
    pub fn kernel(&self) -> &[LrItem] {
        &self.kernel
    }

    pub fn closure(&self) -> &[LrItem] {
        &self.closure
    }

    /// Whether this state contains the completed augmented item.
    pub fn is_accept(&self) -> bool {
        self.accept
    }

    /// All items, kernel first, regrouped so that items sharing a head are
    /// adjacent; heads keep first-appearance order. Transition symbols, goto
    /// kernels and reduce entries all follow this order.
    pub(crate) fn grouped<'a>(&'a self, grammar: &Grammar) -> Vec<&'a LrItem> {
        let mut groups: Map<SymbolID, Vec<&LrItem>> = Map::default();
        for item in self.kernel.iter().chain(&self.closure) {
            let head = grammar.productions()[item.production].head();
            groups.entry(head).or_default().push(item);
        }
        groups.into_values().flatten().collect()
    }
}

/// A goto transition between two states.
#[derive(Debug, Clone, Copy)]
pub struct LrEdge {
    pub from: usize,
    pub to: usize,
    pub symbol: SymbolID,
}

/// Dedup key of a state: its kernel as a sorted item list. Lookahead sets are
/// part of the key; they are empty (hence inert) outside the LR(1) build.
type StateKey = Vec<(usize, usize, Vec<u16>)>;

fn state_key(kernel: &[LrItem]) -> StateKey {
    let mut key: Vec<_> = kernel
        .iter()
        .map(|item| {
            let raws: Vec<u16> = item.lookaheads.iter().map(SymbolID::into_raw).collect();
            (item.production, item.dot, raws)
        })
        .collect();
    key.sort_unstable();
    key
}

/// The canonical collection of one grammar under one LR variant.
///
/// Holds a copy of the grammar augmented with `S' -> S`; the augmented
/// production sits at the end of the production sequence, so every other
/// production keeps its original index.
#[derive(Debug)]
pub struct LrAutomaton {
    grammar: Grammar,
    variant: LrVariant,
    augmented: usize,
    states: Vec<LrState>,
    edges: Vec<LrEdge>,
}

impl LrAutomaton {
    pub fn lr0(grammar: &Grammar) -> Result<Self, LrError> {
        Self::build(grammar, LrVariant::Lr0)
    }

    /// Same collection as [`lr0`](Self::lr0); only the table construction
    /// differs.
    pub fn slr1(grammar: &Grammar) -> Result<Self, LrError> {
        Self::build(grammar, LrVariant::Slr1)
    }

    pub fn lr1(grammar: &Grammar) -> Result<Self, LrError> {
        Self::build(grammar, LrVariant::Lr1)
    }

    /// Build the LR(1) collection, then merge states with equal cores.
    pub fn lalr1(grammar: &Grammar) -> Result<Self, LrError> {
        Ok(Self::build(grammar, LrVariant::Lr1)?.merge_cores())
    }

    #[tracing::instrument(skip_all, fields(variant = ?variant))]
    fn build(grammar: &Grammar, variant: LrVariant) -> Result<Self, LrError> {
        let start = grammar.start_symbol().ok_or(LrError::MissingStartSymbol)?;
        let mut grammar = grammar.clone();
        let primed = grammar.fresh_primed(start);
        let augmented = grammar.productions().len();
        grammar.push_production(primed, vec![start]);
        grammar.reclassify();

        let with_lookahead = matches!(variant, LrVariant::Lr1 | LrVariant::Lalr1);
        let sets = with_lookahead.then(|| FirstFollowTable::new(&grammar));

        let mut lookaheads = SymbolIDSet::default();
        if with_lookahead {
            lookaheads.insert(SymbolID::EOI);
        }
        let initial = vec![LrItem {
            production: augmented,
            dot: 0,
            lookaheads,
        }];

        let mut automaton = Self {
            grammar,
            variant,
            augmented,
            states: Vec::new(),
            edges: Vec::new(),
        };
        let mut keys: Map<StateKey, usize> = Map::default();
        automaton.add_state(initial, &mut keys, sets.as_ref());

        // The state list grows while it is scanned.
        let mut u = 0;
        while u < automaton.states.len() {
            let mut targets: Vec<(SymbolID, Vec<LrItem>)> = Vec::new();
            {
                let productions = automaton.grammar.productions();
                let grouped = automaton.states[u].grouped(&automaton.grammar);
                let mut symbols: Vec<SymbolID> = Vec::new();
                for item in &grouped {
                    if let Some(&next) = productions[item.production].body().get(item.dot) {
                        if !symbols.contains(&next) {
                            symbols.push(next);
                        }
                    }
                }
                for symbol in symbols {
                    let kernel: Vec<LrItem> = grouped
                        .iter()
                        .filter(|item| {
                            productions[item.production].body().get(item.dot) == Some(&symbol)
                        })
                        .map(|item| LrItem {
                            production: item.production,
                            dot: item.dot + 1,
                            lookaheads: item.lookaheads.clone(),
                        })
                        .collect();
                    targets.push((symbol, kernel));
                }
            }
            for (symbol, kernel) in targets {
                let v = automaton.add_state(kernel, &mut keys, sets.as_ref());
                automaton.edges.push(LrEdge {
                    from: u,
                    to: v,
                    symbol,
                });
            }
            u += 1;
        }
        tracing::trace!(
            "collected {} states, {} edges",
            automaton.states.len(),
            automaton.edges.len(),
        );
        Ok(automaton)
    }

    /// Intern a state, returning the index of an existing state with the same
    /// kernel if one was built before.
    fn add_state(
        &mut self,
        kernel: Vec<LrItem>,
        keys: &mut Map<StateKey, usize>,
        sets: Option<&FirstFollowTable>,
    ) -> usize {
        let key = state_key(&kernel);
        if let Some(&v) = keys.get(&key) {
            return v;
        }
        let closure = self.close(&kernel, sets);
        let accept = kernel
            .iter()
            .any(|item| item.production == self.augmented && item.dot == 1);
        let v = self.states.len();
        self.states.push(LrState {
            kernel,
            closure,
            accept,
        });
        keys.insert(key, v);
        v
    }

    /// Closure of a kernel. For every item with the dot before a non-terminal
    /// `B`, one item per production of `B` is added with the dot at 0; with
    /// `sets` present the new items gain FIRST(β a) as lookaheads, and the
    /// loop runs to a fixpoint because lookahead sets grow monotonically.
    fn close(&self, kernel: &[LrItem], sets: Option<&FirstFollowTable>) -> Vec<LrItem> {
        let productions = self.grammar.productions();
        let mut items: Vec<LrItem> = kernel.to_vec();
        let mut index: Map<(usize, usize), usize> = Map::default();
        for (i, item) in items.iter().enumerate() {
            index.insert((item.production, item.dot), i);
        }

        let mut changed = true;
        while changed {
            changed = false;
            let mut i = 0;
            while i < items.len() {
                let item = items[i].clone();
                i += 1;
                let production = &productions[item.production];
                let Some(&next) = production.body().get(item.dot) else {
                    continue;
                };
                if self.grammar.is_terminal_id(next) {
                    continue;
                }
                let gained = match sets {
                    Some(sets) => {
                        let beta = &production.body()[item.dot + 1..];
                        let (mut first, nullable) = sets.first_of_body(beta);
                        if nullable {
                            first.union_with(&item.lookaheads);
                        }
                        first
                    }
                    None => SymbolIDSet::default(),
                };
                for (pi, _) in self.grammar.productions_of(next) {
                    match index.get(&(pi, 0)) {
                        Some(&j) => {
                            if sets.is_some() {
                                let before = items[j].lookaheads.len();
                                items[j].lookaheads.union_with(&gained);
                                if items[j].lookaheads.len() != before {
                                    changed = true;
                                }
                            }
                        }
                        None => {
                            index.insert((pi, 0), items.len());
                            items.push(LrItem {
                                production: pi,
                                dot: 0,
                                lookaheads: gained.clone(),
                            });
                            changed = true;
                        }
                    }
                }
            }
        }
        items.split_off(kernel.len())
    }

    /// Merge LR(1) states whose cores (items without lookaheads) coincide,
    /// unioning lookahead sets and remapping edges. State order follows the
    /// first LR(1) occurrence of each core.
    fn merge_cores(self) -> Self {
        let mut keys: Map<Vec<(usize, usize)>, usize> = Map::default();
        let mut remap = vec![0usize; self.states.len()];
        let mut states: Vec<LrState> = Vec::new();

        for (i, state) in self.states.iter().enumerate() {
            let mut core: Vec<(usize, usize)> = state
                .kernel
                .iter()
                .map(|item| (item.production, item.dot))
                .collect();
            core.sort_unstable();
            match keys.get(&core) {
                Some(&m) => {
                    remap[i] = m;
                    let merged = &mut states[m];
                    merge_items(&mut merged.kernel, &state.kernel);
                    merge_items(&mut merged.closure, &state.closure);
                    merged.accept = merged.accept || state.accept;
                }
                None => {
                    remap[i] = states.len();
                    keys.insert(core, states.len());
                    states.push(state.clone());
                }
            }
        }

        let mut seen: Set<(usize, u16, usize)> = Set::default();
        let mut edges = Vec::new();
        for edge in &self.edges {
            let (from, to) = (remap[edge.from], remap[edge.to]);
            if seen.insert((from, edge.symbol.into_raw(), to)) {
                edges.push(LrEdge {
                    from,
                    to,
                    symbol: edge.symbol,
                });
            }
        }

        tracing::trace!("merged {} LR(1) states into {}", remap.len(), states.len());

        Self {
            variant: LrVariant::Lalr1,
            states,
            edges,
            ..self
        }
    }

    pub fn variant(&self) -> LrVariant {
        self.variant
    }

    /// The grammar augmented with `S' -> S`.
    pub(crate) fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Index of the augmented production.
    pub(crate) fn augmented_index(&self) -> usize {
        self.augmented
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, index: usize) -> &LrState {
        &self.states[index]
    }

    pub fn states(&self) -> &[LrState] {
        &self.states
    }

    pub fn edges(&self) -> &[LrEdge] {
        &self.edges
    }

    /// One state in the item-set form, e.g.
    ///
    /// ```text
    /// I₁
    /// ===
    /// E' -> E ·
    ///  E -> E · + T
    /// ---
    /// ```
    ///
    /// Kernel items sit between `===` and `---`, closure items follow.
    /// LR(1)/LALR(1) lookaheads are appended as `, a / b`.
    pub fn display_state(&self, index: usize) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let state = &self.states[index];
            writeln!(f, "I{}", subscript(index))?;
            writeln!(f, "===")?;
            self.write_items(f, &state.kernel)?;
            writeln!(f, "---")?;
            self.write_items(f, &state.closure)
        })
    }

    /// All transitions, one `from -- symbol --> to` line each.
    pub fn display_edges(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            for edge in &self.edges {
                writeln!(
                    f,
                    "{} -- {} --> {}",
                    edge.from,
                    self.grammar.symbol_name(edge.symbol),
                    edge.to
                )?;
            }
            Ok(())
        })
    }

    fn write_items(&self, f: &mut fmt::Formatter<'_>, items: &[LrItem]) -> fmt::Result {
        let mut groups: Map<SymbolID, Vec<&LrItem>> = Map::default();
        for item in items {
            let head = self.grammar.productions()[item.production].head();
            groups.entry(head).or_default().push(item);
        }
        let width = groups
            .keys()
            .map(|h| self.grammar.symbol_name(*h).chars().count())
            .max()
            .unwrap_or(0);
        for (head, items) in &groups {
            let name = self.grammar.symbol_name(*head);
            let pad = width - name.chars().count();
            for (i, item) in items.iter().enumerate() {
                if i == 0 {
                    write!(f, "{:pad$}{} -> ", "", name, pad = pad)?;
                } else {
                    write!(f, "{:pad$}| ", "", pad = width + 2)?;
                }
                self.write_item_body(f, item)?;
                writeln!(f)?;
            }
        }
        Ok(())
    }

    fn write_item_body(&self, f: &mut fmt::Formatter<'_>, item: &LrItem) -> fmt::Result {
        let body = self.grammar.productions()[item.production].body();
        let mut parts: Vec<&str> = Vec::with_capacity(body.len() + 1);
        for (i, symbol) in body.iter().enumerate() {
            if i == item.dot {
                parts.push("·");
            }
            parts.push(self.grammar.symbol_name(*symbol));
        }
        if item.dot == body.len() {
            parts.push("·");
        }
        f.write_str(&parts.join(" "))?;
        if !item.lookaheads.is_empty() {
            let names: Vec<&str> = item
                .lookaheads
                .iter()
                .map(|s| self.grammar.symbol_name(s))
                .collect();
            write!(f, ", {}", names.join(" / "))?;
        }
        Ok(())
    }
}

fn merge_items(into: &mut Vec<LrItem>, from: &[LrItem]) {
    for item in from {
        match into
            .iter_mut()
            .find(|i| i.production == item.production && i.dot == item.dot)
        {
            Some(existing) => existing.lookaheads.union_with(&item.lookaheads),
            None => into.push(item.clone()),
        }
    }
}

fn subscript(n: usize) -> String {
    const DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];
    n.to_string()
        .chars()
        .map(|c| DIGITS[(c as u8 - b'0') as usize])
        .collect()
}

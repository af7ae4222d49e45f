//! Nullability, FIRST and FOLLOW sets, computed by iterated fixpoint.

use crate::{
    grammar::{Grammar, SymbolID},
    types::{Map, Set, SymbolIDSet},
};

/// FIRST/FOLLOW sets of every symbol of one grammar snapshot.
///
/// ε never appears inside a FIRST set; whether a symbol derives the empty
/// string is a separate flag queried with [`is_nullable`](Self::is_nullable).
/// FOLLOW sets may contain [`SymbolID::EOI`].
#[derive(Debug)]
pub struct FirstFollowTable {
    order: Vec<SymbolID>,
    nullable: Set<SymbolID>,
    first: Map<SymbolID, SymbolIDSet>,
    follow: Map<SymbolID, SymbolIDSet>,
    empty: SymbolIDSet,
}

impl FirstFollowTable {
    pub fn new(grammar: &Grammar) -> Self {
        let order = grammar.non_terminal_ids().to_vec();

        let mut nullable: Set<SymbolID> = Set::default();
        loop {
            let mut changed = false;
            for production in grammar.productions() {
                if !nullable.contains(&production.head())
                    && production.body().iter().all(|s| nullable.contains(s))
                {
                    nullable.insert(production.head());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut first: Map<SymbolID, SymbolIDSet> = Map::default();
        first.insert(SymbolID::EOI, [SymbolID::EOI].into_iter().collect());
        for terminal in grammar.terminal_ids_sorted() {
            first.insert(terminal, [terminal].into_iter().collect());
        }
        for head in &order {
            first.entry(*head).or_default();
        }
        loop {
            let mut changed = false;
            for production in grammar.productions() {
                let mut gained = SymbolIDSet::default();
                for symbol in production.body() {
                    if grammar.is_terminal_id(*symbol) {
                        gained.insert(*symbol);
                        break;
                    }
                    if let Some(set) = first.get(symbol) {
                        gained.union_with(set);
                    }
                    if !nullable.contains(symbol) {
                        break;
                    }
                }
                let set = &mut first[&production.head()];
                let before = set.len();
                set.union_with(&gained);
                changed |= set.len() != before;
            }
            if !changed {
                break;
            }
        }

        let mut follow: Map<SymbolID, SymbolIDSet> = Map::default();
        for head in &order {
            follow.insert(*head, SymbolIDSet::default());
        }
        if let Some(start) = order.first() {
            follow[start].insert(SymbolID::EOI);
        }
        loop {
            let mut changed = false;
            for production in grammar.productions() {
                let body = production.body();
                for (i, symbol) in body.iter().enumerate() {
                    if grammar.is_terminal_id(*symbol) {
                        continue;
                    }
                    let mut gained = SymbolIDSet::default();
                    let mut tail_nullable = true;
                    for successor in &body[i + 1..] {
                        if grammar.is_terminal_id(*successor) {
                            gained.insert(*successor);
                            tail_nullable = false;
                            break;
                        }
                        if let Some(set) = first.get(successor) {
                            gained.union_with(set);
                        }
                        if !nullable.contains(successor) {
                            tail_nullable = false;
                            break;
                        }
                    }
                    if tail_nullable {
                        if let Some(set) = follow.get(&production.head()) {
                            let set = set.clone();
                            gained.union_with(&set);
                        }
                    }
                    let set = &mut follow[symbol];
                    let before = set.len();
                    set.union_with(&gained);
                    changed |= set.len() != before;
                }
            }
            if !changed {
                break;
            }
        }

        Self {
            order,
            nullable,
            first,
            follow,
            empty: SymbolIDSet::default(),
        }
    }

    /// Number of non-terminals covered.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Non-terminal at `index`, in grammar order.
    pub fn symbol_at(&self, index: usize) -> SymbolID {
        self.order[index]
    }

    pub fn non_terminals(&self) -> &[SymbolID] {
        &self.order
    }

    /// Terminals are never nullable.
    pub fn is_nullable(&self, symbol: SymbolID) -> bool {
        self.nullable.contains(&symbol)
    }

    pub fn first(&self, symbol: SymbolID) -> &SymbolIDSet {
        self.first.get(&symbol).unwrap_or(&self.empty)
    }

    pub fn follow(&self, symbol: SymbolID) -> &SymbolIDSet {
        self.follow.get(&symbol).unwrap_or(&self.empty)
    }

    /// FIRST of a symbol sequence, with a flag telling whether the whole
    /// sequence is nullable.
    pub fn first_of_body(&self, body: &[SymbolID]) -> (SymbolIDSet, bool) {
        let mut set = SymbolIDSet::default();
        for symbol in body {
            set.union_with(self.first(*symbol));
            if !self.is_nullable(*symbol) {
                return (set, false);
            }
        }
        (set, true)
    }

    /// FIRST set as names, sorted.
    pub fn first_names<'g>(&self, grammar: &'g Grammar, symbol: SymbolID) -> Vec<&'g str> {
        let mut names: Vec<&str> = self
            .first(symbol)
            .iter()
            .map(|s| grammar.symbol_name(s))
            .collect();
        names.sort_unstable();
        names
    }

    /// FOLLOW set as names, sorted; end of input appears as `$`.
    pub fn follow_names<'g>(&self, grammar: &'g Grammar, symbol: SymbolID) -> Vec<&'g str> {
        let mut names: Vec<&str> = self
            .follow(symbol)
            .iter()
            .map(|s| grammar.symbol_name(s))
            .collect();
        names.sort_unstable();
        names
    }
}

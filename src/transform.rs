//! Grammar rewrites: left factoring, left-recursion elimination and
//! conversion to Chomsky Normal Form.
//!
//! Every transformation is a pure function from a grammar to a new grammar;
//! on failure the input is untouched, so callers never observe a partially
//! rewritten production set.

use crate::{
    grammar::{Grammar, SymbolID, EPSILON_NAME},
    types::{Map, Set},
};
use std::cmp::Ordering;
use std::collections::VecDeque;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Every alternative of the head is left recursive, so the recursion has
    /// no base case to bottom out into.
    #[error("left recursion cannot be eliminated for `{head}'")]
    IrremovableLeftRecursion { head: String },
}

/// A grammar unpacked into per-head alternative lists, the working form of
/// every transformation. `order` drives the output ordering; primed heads are
/// inserted right after the head they were derived from.
struct Rules {
    g: Grammar,
    order: Vec<SymbolID>,
    prods: Map<SymbolID, Vec<Vec<SymbolID>>>,
    last_primed: Map<SymbolID, SymbolID>,
}

impl Rules {
    fn new(grammar: &Grammar) -> Self {
        let order = grammar.non_terminal_ids().to_vec();
        let mut prods: Map<SymbolID, Vec<Vec<SymbolID>>> = Map::default();
        for head in &order {
            prods.insert(*head, Vec::new());
        }
        for production in grammar.productions() {
            prods[&production.head()].push(production.body().to_vec());
        }
        Self {
            g: grammar.like(),
            order,
            prods,
            last_primed: Map::default(),
        }
    }

    /// Register a freshly primed head, keeping it adjacent to its base in the
    /// output ordering.
    fn add_primed_head(&mut self, base: SymbolID, head: SymbolID, bodies: Vec<Vec<SymbolID>>) {
        let anchor = self.last_primed.get(&base).copied().unwrap_or(base);
        let position = self
            .order
            .iter()
            .position(|h| *h == anchor)
            .map_or(self.order.len(), |i| i + 1);
        self.order.insert(position, head);
        self.prods.insert(head, bodies);
        self.last_primed.insert(base, head);
    }

    fn is_head(&self, symbol: SymbolID) -> bool {
        self.prods.contains_key(&symbol)
    }

    fn finish(mut self) -> Grammar {
        for head in &self.order {
            if let Some(bodies) = self.prods.swap_remove(head) {
                for body in bodies {
                    self.g.push_production(*head, body);
                }
            }
        }
        self.g.reclassify();
        self.g
    }
}

/// Group alternatives of each head by their longest common symbol prefix,
/// moving the differing suffixes under a fresh primed head, until no head has
/// two alternatives sharing a non-empty prefix.
///
/// In `expand` mode, alternatives consisting of a single non-terminal are
/// first inlined (transitively) into the head's list so that prefixes hidden
/// behind a unit alternative still get factored; heads with an immediate
/// left-recursive alternative are left alone since inlining there does not
/// converge.
pub fn left_factor(grammar: &Grammar, expand: bool) -> Grammar {
    let mut rules = Rules::new(grammar);
    if expand {
        for head in rules.order.clone() {
            expand_unit_alternatives(&mut rules, head);
        }
    }
    loop {
        let mut changed = false;
        for head in rules.order.clone() {
            while factor_once(&mut rules, head) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    rules.finish()
}

fn expand_unit_alternatives(rules: &mut Rules, head: SymbolID) {
    let bodies = rules.prods[&head].clone();
    if bodies.len() < 2 || bodies.iter().any(|b| b.first() == Some(&head)) {
        return;
    }
    let mut visited: Set<SymbolID> = Set::default();
    visited.insert(head);
    let mut seen: Set<Vec<SymbolID>> = Set::default();
    let mut out = Vec::new();
    for body in bodies {
        inline_body(rules, body, &mut visited, &mut seen, &mut out);
    }
    rules.prods[&head] = out;
}

fn inline_body(
    rules: &Rules,
    body: Vec<SymbolID>,
    visited: &mut Set<SymbolID>,
    seen: &mut Set<Vec<SymbolID>>,
    out: &mut Vec<Vec<SymbolID>>,
) {
    if let [target] = body[..] {
        if rules.is_head(target) && visited.insert(target) {
            for inner in rules.prods[&target].clone() {
                inline_body(rules, inner, visited, seen, out);
            }
            return;
        }
    }
    if seen.insert(body.clone()) {
        out.push(body);
    }
}

#[derive(Default)]
struct TrieNode {
    count: usize,
    production_end: bool,
    indices: Vec<usize>,
    children: Map<SymbolID, TrieNode>,
}

impl TrieNode {
    fn insert(&mut self, body: &[SymbolID], index: usize) {
        let mut node = self;
        node.count += 1;
        node.indices.push(index);
        for &symbol in body {
            node = node.children.entry(symbol).or_default();
            node.count += 1;
            node.indices.push(index);
        }
        node.production_end = true;
    }
}

fn names_cmp(g: &Grammar, a: &[SymbolID], b: &[SymbolID]) -> Ordering {
    let left = a.iter().map(|s| g.symbol_name(*s));
    let right = b.iter().map(|s| g.symbol_name(*s));
    left.cmp(right)
}

/// The deepest prefix shared by at least two alternatives; ties prefer the
/// more frequent prefix, then the lexicographically smaller one.
fn find_longest_common_prefix<'t>(
    root: &'t TrieNode,
    g: &Grammar,
) -> Option<(Vec<SymbolID>, &'t TrieNode)> {
    fn search<'t>(
        node: &'t TrieNode,
        prefix: &mut Vec<SymbolID>,
        best: &mut Option<(Vec<SymbolID>, &'t TrieNode)>,
        g: &Grammar,
    ) {
        if node.count < 2 {
            return;
        }
        if !prefix.is_empty() {
            let better = match best {
                None => true,
                Some((best_prefix, best_node)) => {
                    prefix.len() > best_prefix.len()
                        || (prefix.len() == best_prefix.len() && node.count > best_node.count)
                        || (prefix.len() == best_prefix.len()
                            && node.count == best_node.count
                            && names_cmp(g, prefix, best_prefix) == Ordering::Less)
                }
            };
            if better {
                *best = Some((prefix.clone(), node));
            }
        }
        for (&symbol, child) in &node.children {
            prefix.push(symbol);
            search(child, prefix, best, g);
            prefix.pop();
        }
    }

    let mut best = None;
    search(root, &mut Vec::new(), &mut best, g);
    best
}

/// All suffix bodies below a trie node, sorted by symbol names with the empty
/// suffix ranked as ε.
fn suffixes_under(node: &TrieNode, g: &Grammar) -> Vec<Vec<SymbolID>> {
    fn collect(node: &TrieNode, current: &mut Vec<SymbolID>, out: &mut Vec<Vec<SymbolID>>) {
        if node.production_end {
            out.push(current.clone());
        }
        for (&symbol, child) in &node.children {
            current.push(symbol);
            collect(child, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    collect(node, &mut Vec::new(), &mut out);
    out.sort_by(|a, b| {
        let key = |body: &[SymbolID]| -> Vec<&str> {
            if body.is_empty() {
                vec![EPSILON_NAME]
            } else {
                body.iter().map(|s| g.symbol_name(*s)).collect()
            }
        };
        key(a).cmp(&key(b))
    });
    out
}

fn factor_once(rules: &mut Rules, head: SymbolID) -> bool {
    let alternatives = &rules.prods[&head];
    if alternatives.len() < 2 {
        return false;
    }
    let mut trie = TrieNode::default();
    for (i, body) in alternatives.iter().enumerate() {
        trie.insert(body, i);
    }
    let Some((prefix, node)) = find_longest_common_prefix(&trie, &rules.g) else {
        return false;
    };
    let grouped: Set<usize> = node.indices.iter().copied().collect();
    let suffixes = suffixes_under(node, &rules.g);

    let primed = rules.g.fresh_primed(head);
    let alternatives = &mut rules.prods[&head];
    let mut index = 0;
    alternatives.retain(|_| {
        let keep = !grouped.contains(&index);
        index += 1;
        keep
    });
    let mut factored = prefix;
    factored.push(primed);
    alternatives.push(factored);
    rules.add_primed_head(head, primed, suffixes);
    true
}

/// Rewrite every immediately left-recursive head `A -> A α | β` into
/// `A -> β A'` and `A' -> α A' | ε`.
///
/// Recursion through another non-terminal is not resolved. A head whose only
/// recursive alternative is the unit self loop `A -> A` simply drops it.
pub fn eliminate_left_recursion(grammar: &Grammar) -> Result<Grammar, TransformError> {
    let mut rules = Rules::new(grammar);
    for head in rules.order.clone() {
        let mut recursive = Vec::new();
        let mut base = Vec::new();
        let mut seen: Set<Vec<SymbolID>> = Set::default();
        for body in rules.prods[&head].clone() {
            if !seen.insert(body.clone()) {
                continue;
            }
            if body.first() == Some(&head) {
                recursive.push(body);
            } else {
                base.push(body);
            }
        }
        if recursive.is_empty() {
            continue;
        }
        if base.is_empty() {
            return Err(TransformError::IrremovableLeftRecursion {
                head: grammar.symbol_name(head).to_owned(),
            });
        }
        if recursive.len() == 1 && recursive[0].len() == 1 {
            rules.prods[&head] = base;
            continue;
        }
        let primed = rules.g.fresh_primed(head);
        let mut head_bodies = Vec::with_capacity(base.len());
        for mut body in base {
            body.push(primed);
            head_bodies.push(body);
        }
        let mut primed_bodies = Vec::with_capacity(recursive.len() + 1);
        for body in recursive {
            let mut rest = body[1..].to_vec();
            rest.push(primed);
            primed_bodies.push(rest);
        }
        primed_bodies.push(Vec::new());
        rules.prods[&head] = head_bodies;
        rules.add_primed_head(head, primed, primed_bodies);
    }
    Ok(rules.finish())
}

/// Whether every production is `A -> B C` (two non-terminals), `A -> a`
/// (one terminal), or the start symbol's explicit ε.
pub fn is_chomsky_normal_form(grammar: &Grammar) -> bool {
    let start = grammar.start_symbol();
    grammar.productions().iter().all(|p| match p.body() {
        [] => Some(p.head()) == start,
        [s] => grammar.is_terminal_id(*s),
        [a, b] => !grammar.is_terminal_id(*a) && !grammar.is_terminal_id(*b),
        _ => false,
    })
}

/// Convert to Chomsky Normal Form: fresh start symbol if the old one appears
/// on a right-hand side, then ε elimination, unit elimination, binarization
/// of long bodies and terminal wrapping, in that order.
pub fn to_chomsky_normal_form(grammar: &Grammar) -> Grammar {
    let mut rules = Rules::new(grammar);
    if rules.order.is_empty() {
        return rules.finish();
    }
    introduce_fresh_start(&mut rules);
    eliminate_epsilon(&mut rules);
    eliminate_unit(&mut rules);
    binarize(&mut rules);
    wrap_terminals(&mut rules);
    rules.finish()
}

fn introduce_fresh_start(rules: &mut Rules) {
    let start = rules.order[0];
    let start_on_rhs = rules
        .prods
        .values()
        .flatten()
        .any(|body| body.contains(&start));
    if start_on_rhs {
        let fresh = rules.g.fresh_primed(start);
        rules.order.insert(0, fresh);
        rules.prods.insert(fresh, vec![vec![start]]);
    }
}

fn eliminate_epsilon(rules: &mut Rules) {
    let start = rules.order[0];
    let mut nullable: Set<SymbolID> = Set::default();
    loop {
        let mut changed = false;
        for (head, bodies) in &rules.prods {
            if nullable.contains(head) {
                continue;
            }
            if bodies.iter().any(|b| b.iter().all(|s| nullable.contains(s))) {
                nullable.insert(*head);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Replace every body by all variants obtained by omitting nullable
    // occurrences; ε bodies survive only on the start symbol.
    for head in rules.order.clone() {
        let mut out = Vec::new();
        let mut seen: Set<Vec<SymbolID>> = Set::default();
        for body in rules.prods[&head].clone() {
            let positions: Vec<usize> = body
                .iter()
                .enumerate()
                .filter(|(_, s)| nullable.contains(*s))
                .map(|(i, _)| i)
                .collect();
            for mask in 0u64..(1 << positions.len()) {
                let variant: Vec<SymbolID> = body
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| {
                        positions
                            .iter()
                            .position(|p| p == i)
                            .map_or(true, |j| mask & (1 << j) == 0)
                    })
                    .map(|(_, s)| *s)
                    .collect();
                if !variant.is_empty() && seen.insert(variant.clone()) {
                    out.push(variant);
                }
            }
        }
        if head == start && nullable.contains(&start) && seen.insert(Vec::new()) {
            out.push(Vec::new());
        }
        rules.prods[&head] = out;
    }

    // A head that derived only ε now has no bodies at all; drop it and every
    // body that still mentions it.
    loop {
        let unproductive: Vec<SymbolID> = rules
            .order
            .iter()
            .copied()
            .filter(|h| rules.prods[h].is_empty())
            .collect();
        if unproductive.is_empty() {
            break;
        }
        for head in &unproductive {
            rules.prods.swap_remove(head);
        }
        rules.order.retain(|h| !unproductive.contains(h));
        for head in rules.order.clone() {
            rules.prods[&head].retain(|body| body.iter().all(|s| !unproductive.contains(s)));
        }
    }
}

fn eliminate_unit(rules: &mut Rules) {
    for head in rules.order.clone() {
        let mut visited: Set<SymbolID> = Set::default();
        visited.insert(head);
        let mut pending = VecDeque::new();
        pending.push_back(head);
        let mut out = Vec::new();
        let mut seen: Set<Vec<SymbolID>> = Set::default();
        while let Some(current) = pending.pop_front() {
            for body in rules.prods[&current].clone() {
                match body[..] {
                    [target] if rules.is_head(target) => {
                        if visited.insert(target) {
                            pending.push_back(target);
                        }
                    }
                    _ => {
                        if seen.insert(body.clone()) {
                            out.push(body);
                        }
                    }
                }
            }
        }
        rules.prods[&head] = out;
    }
}

fn binarize(rules: &mut Rules) {
    for head in rules.order.clone() {
        let bodies = rules.prods[&head].clone();
        let mut out = Vec::with_capacity(bodies.len());
        for body in bodies {
            let n = body.len();
            if n <= 2 {
                out.push(body);
                continue;
            }
            let links: Vec<SymbolID> = (0..n - 2).map(|_| rules.g.fresh_primed(head)).collect();
            out.push(vec![body[0], links[0]]);
            for i in 0..n - 2 {
                let next = if i == n - 3 { body[n - 1] } else { links[i + 1] };
                rules.add_primed_head(head, links[i], vec![vec![body[i + 1], next]]);
            }
        }
        rules.prods[&head] = out;
    }
}

fn wrap_terminals(rules: &mut Rules) {
    let mut wrappers: Map<SymbolID, SymbolID> = Map::default();
    for head in rules.order.clone() {
        let mut bodies = rules.prods[&head].clone();
        for body in &mut bodies {
            if body.len() != 2 {
                continue;
            }
            for symbol in body.iter_mut() {
                if !rules.prods.contains_key(symbol) {
                    let wrapper = *wrappers
                        .entry(*symbol)
                        .or_insert_with(|| rules.g.fresh_primed(*symbol));
                    *symbol = wrapper;
                }
            }
        }
        rules.prods[&head] = bodies;
    }
    for (terminal, wrapper) in wrappers {
        rules.order.push(wrapper);
        rules.prods.insert(wrapper, vec![vec![terminal]]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(text: &str) -> Grammar {
        Grammar::parse(text).unwrap()
    }

    #[test]
    fn factor_empty_and_trivial() {
        assert_eq!(left_factor(&g(""), true).to_string(), "");
        assert_eq!(left_factor(&g("S->a"), true).to_string(), "S -> a\n");
    }

    #[test]
    fn factor_dangling_else() {
        let out = left_factor(&g("S -> i E t S | i E t S e S | a\nE -> b"), true);
        let expected = " S -> a\n    | i E t S S'\nS' -> e S\n    | ε\n E -> b\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn factor_two_symbol_prefix() {
        let out = left_factor(&g("S -> S S + | S S * | a"), true);
        assert_eq!(out.to_string(), " S -> a\n    | S S S'\nS' -> *\n    | +\n");
    }

    #[test]
    fn factor_prefix_with_epsilon_suffix() {
        let out = left_factor(&g("S -> 0 S 1 | 0 1"), true);
        assert_eq!(out.to_string(), " S -> 0 S'\nS' -> 1\n    | S 1\n");
    }

    #[test]
    fn factor_nothing_in_common() {
        let text = "S -> + S S | * S S | a";
        let out = left_factor(&g(text), true);
        assert_eq!(out.to_string(), "S -> + S S\n   | * S S\n   | a\n");
    }

    #[test]
    fn factor_single_symbol_prefix_wins_by_count() {
        let out = left_factor(&g("S -> S + S | S S | ( S ) | S * | a"), true);
        let expected = " S -> ( S )\n    | a\n    | S S'\nS' -> *\n    | + S\n    | S\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn factor_skips_left_recursive_head_expansion() {
        let out = left_factor(&g("S -> ( L ) | a\nL -> L , S | S"), true);
        assert_eq!(out.to_string(), "S -> ( L )\n   | a\nL -> L , S\n   | S\n");
    }

    #[test]
    fn factor_expands_unit_alternative() {
        let out = left_factor(&g("A -> id | B | a\nB -> id b"), true);
        let expected = " A -> a\n    | id A'\nA' -> b\n    | ε\n B -> id b\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn factor_expansion_deduplicates() {
        let out = left_factor(&g("S -> a b | A\nA -> a b"), true);
        assert_eq!(out.to_string(), "S -> a b\nA -> a b\n");
    }

    #[test]
    fn factor_expands_unit_chain() {
        let out = left_factor(&g("A->id|B|a\nB->C\nC->D\nD->id b"), true);
        let expected =
            " A -> a\n    | id A'\nA' -> b\n    | ε\n B -> C\n C -> D\n D -> id b\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn factor_without_expansion_leaves_units() {
        let out = left_factor(&g("A -> id | B | a\nB -> id b"), false);
        assert_eq!(out.to_string(), "A -> id\n   | B\n   | a\nB -> id b\n");
    }

    #[test]
    fn factor_non_terminal_prefix() {
        let out = left_factor(&g("S -> A c | A d\nA -> a b"), true);
        assert_eq!(out.to_string(), " S -> A S'\nS' -> c\n    | d\n A -> a b\n");
    }

    #[test]
    fn recursion_empty_and_trivial() {
        assert_eq!(eliminate_left_recursion(&g("")).unwrap().to_string(), "");
        assert_eq!(
            eliminate_left_recursion(&g("S->a")).unwrap().to_string(),
            "S -> a\n"
        );
    }

    #[test]
    fn recursion_immediate_only() {
        let out = eliminate_left_recursion(&g("S -> A a | b\nA -> A c | S d | ε")).unwrap();
        let expected = " S -> A a\n    | b\n A -> S d A'\n    | A'\nA' -> c A'\n    | ε\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn recursion_two_recursive_alternatives() {
        let out = eliminate_left_recursion(&g("S -> S S + | S S * | a")).unwrap();
        let expected = " S -> a S'\nS' -> S + S'\n    | S * S'\n    | ε\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn recursion_none_present() {
        let out = eliminate_left_recursion(&g("S -> 0 S 1 | 0 1")).unwrap();
        assert_eq!(out.to_string(), "S -> 0 S 1\n   | 0 1\n");
    }

    #[test]
    fn recursion_epsilon_base_case() {
        let out = eliminate_left_recursion(&g("S -> S ( S ) S | ε")).unwrap();
        assert_eq!(out.to_string(), " S -> S'\nS' -> ( S ) S S'\n    | ε\n");
    }

    #[test]
    fn recursion_mixed_alternatives() {
        let out = eliminate_left_recursion(&g("S -> S + S | S S | ( S ) | S * | a")).unwrap();
        let expected = " S -> ( S ) S'\n    | a S'\nS' -> + S S'\n    | S S'\n    | * S'\n    | ε\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn recursion_boolean_grammar() {
        let out = eliminate_left_recursion(&g(
            "bexpr -> bexpr or bterm | bterm\nbterm -> bterm and bfactor | bfactor\nbfactor -> not bfactor | ( bexpr ) | true | false",
        ))
        .unwrap();
        let expected = "  bexpr -> bterm bexpr'\n bexpr' -> or bterm bexpr'\n         | ε\n  \
                        bterm -> bfactor bterm'\n bterm' -> and bfactor bterm'\n         | ε\n\
                        bfactor -> not bfactor\n         | ( bexpr )\n         | true\n         | false\n";
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn recursion_without_base_case_fails() {
        assert!(matches!(
            eliminate_left_recursion(&g("A -> A a | A b")),
            Err(TransformError::IrremovableLeftRecursion { .. })
        ));
        assert!(matches!(
            eliminate_left_recursion(&g("A -> A a")),
            Err(TransformError::IrremovableLeftRecursion { .. })
        ));
    }

    #[test]
    fn recursion_indirect_is_untouched() {
        let out = eliminate_left_recursion(&g("A -> B\nB -> A")).unwrap();
        assert_eq!(out.to_string(), "A -> B\nB -> A\n");
    }

    #[test]
    fn recursion_drops_unit_self_loop() {
        let out = eliminate_left_recursion(&g("S -> S | a")).unwrap();
        assert_eq!(out.to_string(), "S -> a\n");
    }

    #[test]
    fn cnf_shape_checks() {
        assert!(is_chomsky_normal_form(&g("")));
        assert!(is_chomsky_normal_form(&g("S -> a")));
        assert!(is_chomsky_normal_form(&g("S -> A B\nA -> a\nB -> b")));
        assert!(is_chomsky_normal_form(&g("S -> ε")));
        assert!(!is_chomsky_normal_form(&g("S -> a B\nB -> b")));
        assert!(!is_chomsky_normal_form(&g("S -> A B C\nA -> a\nB -> b\nC -> c")));
        assert!(!is_chomsky_normal_form(&g("S -> A\nA -> a")));
        assert!(!is_chomsky_normal_form(&g("S -> A B\nA -> a | ε\nB -> b")));
    }

    #[test]
    fn cnf_convert_trivial() {
        let out = to_chomsky_normal_form(&g(""));
        assert_eq!(out.to_string(), "");
        assert!(is_chomsky_normal_form(&out));

        let out = to_chomsky_normal_form(&g("S -> a"));
        assert_eq!(out.to_string(), "S -> a\n");
        assert!(is_chomsky_normal_form(&out));
    }

    #[test]
    fn cnf_convert_unit_chain() {
        let out = to_chomsky_normal_form(&g("S -> A\nA -> B\nB -> a"));
        assert_eq!(out.to_string(), "S -> a\nA -> a\nB -> a\n");
        assert!(is_chomsky_normal_form(&out));
    }

    #[test]
    fn cnf_convert_long_body() {
        let out = to_chomsky_normal_form(&g("S -> A B C\nA -> a\nB -> b\nC -> c"));
        let expected = " S -> A S'\nS' -> B C\n A -> a\n B -> b\n C -> c\n";
        assert_eq!(out.to_string(), expected);
        assert!(is_chomsky_normal_form(&out));
    }

    #[test]
    fn cnf_convert_wraps_terminals() {
        let out = to_chomsky_normal_form(&g("S -> a b"));
        assert_eq!(out.to_string(), " S -> a' b'\na' -> a\nb' -> b\n");
        assert!(is_chomsky_normal_form(&out));
    }

    #[test]
    fn cnf_convert_epsilon_productions() {
        let out = to_chomsky_normal_form(&g("S -> A B\nA -> a | ε\nB -> b | ε"));
        let expected = "S -> A B\n   | ε\n   | b\n   | a\nA -> a\nB -> b\n";
        assert_eq!(out.to_string(), expected);
        assert!(is_chomsky_normal_form(&out));
    }

    #[test]
    fn cnf_convert_start_on_rhs() {
        let out = to_chomsky_normal_form(&g("S -> a S b | a b"));
        assert!(is_chomsky_normal_form(&out));
        assert_eq!(out.symbol_name(out.start_symbol().unwrap()), "S'");
    }

    #[test]
    fn cnf_start_keeps_epsilon() {
        let out = to_chomsky_normal_form(&g("S -> A B | ε\nA -> a\nB -> b"));
        assert!(is_chomsky_normal_form(&out));
        assert!(out.productions().iter().any(|p| p.is_epsilon()));
    }

    #[test]
    fn cnf_convert_arithmetic() {
        let out = to_chomsky_normal_form(&g("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id"));
        assert!(is_chomsky_normal_form(&out));
    }

    #[test]
    fn cnf_convert_nullable_everywhere() {
        let out = to_chomsky_normal_form(&g("S -> a S b S | b S a S | ε"));
        assert!(is_chomsky_normal_form(&out));
        // New start derives ε, old start keeps only non-empty bodies.
        assert_eq!(out.symbol_name(out.start_symbol().unwrap()), "S'");
        assert!(out
            .productions()
            .iter()
            .all(|p| !p.is_epsilon() || p.head() == out.start_symbol().unwrap()));
    }
}

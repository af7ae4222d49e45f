//! Parse trees, rebuilt from a completed step trace.

use crate::{
    grammar::{Grammar, EPSILON_NAME},
    trace::{ParseSteps, StepAction},
};
use std::fmt;

/// A derivation-tree node: a symbol name and its ordered children. Leaves are
/// terminals or ε.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    symbol: String,
    children: Vec<ParseTree>,
}

impl ParseTree {
    pub fn leaf(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            children: Vec::new(),
        }
    }

    pub fn node(symbol: impl Into<String>, children: Vec<ParseTree>) -> Self {
        Self {
            symbol: symbol.into(),
            children,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn children(&self) -> &[ParseTree] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.symbol, indent = depth * 2)?;
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Rebuild the derivation tree of an accepted LL trace by replaying its
/// apply/match actions top-down.
pub fn from_ll_trace(grammar: &Grammar, steps: &ParseSteps) -> Option<ParseTree> {
    if !steps.accepted() {
        return None;
    }
    let actions: Vec<&StepAction> = steps.actions().collect();
    let mut cursor = 0;
    let tree = build_ll(grammar, &actions, &mut cursor)?;
    Some(tree)
}

fn build_ll(grammar: &Grammar, actions: &[&StepAction], cursor: &mut usize) -> Option<ParseTree> {
    match actions.get(*cursor)? {
        StepAction::Apply { production, .. } => {
            *cursor += 1;
            let production = &grammar.productions()[*production];
            let mut children = Vec::with_capacity(production.body().len().max(1));
            if production.is_epsilon() {
                children.push(ParseTree::leaf(EPSILON_NAME));
            } else {
                for _ in production.body() {
                    children.push(build_ll(grammar, actions, cursor)?);
                }
            }
            Some(ParseTree::node(
                grammar.symbol_name(production.head()),
                children,
            ))
        }
        StepAction::Match { terminal } => {
            *cursor += 1;
            Some(ParseTree::leaf(terminal.clone()))
        }
        _ => None,
    }
}

/// Rebuild the derivation tree of an accepted LR trace by replaying its
/// shift/reduce actions bottom-up.
pub fn from_lr_trace(grammar: &Grammar, steps: &ParseSteps) -> Option<ParseTree> {
    if !steps.accepted() {
        return None;
    }
    let mut forest: Vec<ParseTree> = Vec::new();
    for action in steps.actions() {
        match action {
            StepAction::Shift { terminal, .. } => forest.push(ParseTree::leaf(terminal.clone())),
            StepAction::Reduce { production, .. } => {
                let production = &grammar.productions()[*production];
                let arity = production.body().len();
                if forest.len() < arity {
                    return None;
                }
                let mut children: Vec<ParseTree> = forest.split_off(forest.len() - arity);
                if children.is_empty() {
                    children.push(ParseTree::leaf(EPSILON_NAME));
                }
                forest.push(ParseTree::node(
                    grammar.symbol_name(production.head()),
                    children,
                ));
            }
            StepAction::Accept => break,
            _ => return None,
        }
    }
    if forest.len() == 1 {
        forest.pop()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::ParseStep;

    fn step(action: StepAction) -> ParseStep {
        ParseStep {
            stack: Vec::new(),
            symbols: Vec::new(),
            remaining: Vec::new(),
            action,
        }
    }

    #[test]
    fn display_indents_by_depth() {
        let tree = ParseTree::node(
            "S",
            vec![ParseTree::leaf("a"), ParseTree::node("B", vec![ParseTree::leaf("b")])],
        );
        assert_eq!(tree.to_string(), "S\n  a\n  B\n    b\n");
    }

    #[test]
    fn ll_replay_builds_depth_first() {
        let grammar = Grammar::parse("S -> a B\nB -> b | ε").unwrap();
        let mut steps = ParseSteps::ll();
        steps.push(step(StepAction::Apply {
            production: 0,
            rendered: String::new(),
        }));
        steps.push(step(StepAction::Match {
            terminal: "a".to_owned(),
        }));
        steps.push(step(StepAction::Apply {
            production: 2,
            rendered: String::new(),
        }));
        steps.push(step(StepAction::Accept));
        let tree = from_ll_trace(&grammar, &steps).unwrap();
        assert_eq!(tree.symbol(), "S");
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[1].children()[0].symbol(), "ε");
    }

    #[test]
    fn lr_replay_builds_bottom_up() {
        let grammar = Grammar::parse("S -> A b\nA -> a").unwrap();
        let mut steps = ParseSteps::lr();
        steps.push(step(StepAction::Shift {
            state: 1,
            terminal: "a".to_owned(),
        }));
        steps.push(step(StepAction::Reduce {
            production: 1,
            rendered: String::new(),
        }));
        steps.push(step(StepAction::Shift {
            state: 2,
            terminal: "b".to_owned(),
        }));
        steps.push(step(StepAction::Reduce {
            production: 0,
            rendered: String::new(),
        }));
        steps.push(step(StepAction::Accept));
        let tree = from_lr_trace(&grammar, &steps).unwrap();
        assert_eq!(tree.symbol(), "S");
        assert_eq!(tree.children()[0].symbol(), "A");
        assert_eq!(tree.children()[1].symbol(), "b");
    }

    #[test]
    fn rejected_traces_yield_no_tree() {
        let grammar = Grammar::parse("S -> a").unwrap();
        let mut steps = ParseSteps::ll();
        steps.push(step(StepAction::Error {
            message: "unexpected symbol".to_owned(),
        }));
        assert!(from_ll_trace(&grammar, &steps).is_none());
        assert!(from_lr_trace(&grammar, &steps).is_none());
    }
}

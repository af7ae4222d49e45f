//! The LR automaton family: canonical item-set collections for LR(0),
//! SLR(1), LR(1) and LALR(1), their ACTION/GOTO tables, and the shift-reduce
//! driver.
//!
//! All four variants share one state representation. LR(0) and SLR(1) build
//! the same collection and differ only in how reduce entries are filled in;
//! LALR(1) is obtained by merging LR(1) states whose cores coincide.

mod automaton;
mod table;

pub use automaton::{LrAutomaton, LrEdge, LrItem, LrState};
pub use table::{ActionGotoTable, LrAction};

/// Which collection was built and which reduce-lookahead rule its table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrVariant {
    Lr0,
    Slr1,
    Lr1,
    Lalr1,
}

#[derive(Debug, thiserror::Error)]
pub enum LrError {
    #[error("cannot find a start symbol")]
    MissingStartSymbol,
}

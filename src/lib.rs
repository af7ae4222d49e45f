//! Formal-language analysis toolkit.
//!
//! Given a context-free grammar in `LHS -> alt1 | alt2` text form, this crate
//! derives the structures that decide or parse strings in the language:
//! FIRST/FOLLOW sets, LL(1) predictive tables, the LR(0)/SLR(1)/LR(1)/LALR(1)
//! automaton family with their ACTION/GOTO tables, and CYK recognition tables.
//! An independent pipeline compiles regular expressions into Thompson NFAs,
//! subset-construction DFAs and partition-refined minimal DFAs.
//!
//! All computation is single-shot and deterministic: tables and automata are
//! immutable snapshots of the grammar they were derived from, and iteration
//! order everywhere observable is insertion order.

pub mod cyk;
pub mod first_follow;
pub mod fsm;
pub mod grammar;
pub mod ll1;
pub mod lr;
pub mod regex;
pub mod trace;
pub mod transform;
pub mod tree;
pub mod types;
pub mod util;

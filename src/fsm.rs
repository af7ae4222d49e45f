//! Finite-state machines compiled from regular expressions.
//!
//! The pipeline has three stages: `Nfa` is the Thompson construction over a
//! parsed [`Regex`](crate::regex::Regex), `Dfa` determinizes it by subset
//! construction, and `MinDfa` merges indistinguishable DFA states by
//! partition refinement. Every stage exposes the full labeled graph and an
//! `accepts` runner, so language equivalence across the stages is directly
//! checkable.

mod dfa;
mod nfa;

pub use dfa::{Dfa, DfaState, MinDfa, MinDfaState};
pub use nfa::{Nfa, NfaState};

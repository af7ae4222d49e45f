use std::fmt;

use crate::{regex::Regex, util::display_fn};

/// A nondeterministic finite automaton built by the Thompson construction.
///
/// State 0 is always the start state and the highest-numbered state the sole
/// accepting one. Numbering follows the construction order: a fragment's
/// entry state is numbered when the fragment is entered, its exit state after
/// the whole fragment has been emitted, so the accept state is numbered last.
#[derive(Debug)]
pub struct Nfa {
    states: Vec<NfaState>,
}

/// One NFA state; an edge label of `None` is an ε-transition.
#[derive(Debug, Default)]
pub struct NfaState {
    edges: Vec<(Option<char>, usize)>,
}

impl NfaState {
    pub fn edges(&self) -> &[(Option<char>, usize)] {
        &self.edges
    }
}

impl Nfa {
    pub fn from_regex(regex: &Regex) -> Self {
        let mut builder = Builder::default();
        let start = builder.fresh();
        let accept = builder.fresh();
        builder.emit(regex, start, accept);
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn start(&self) -> usize {
        0
    }

    pub fn accept(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    pub fn state(&self, index: usize) -> Option<&NfaState> {
        self.states.get(index)
    }

    /// Every distinct non-ε edge label, sorted.
    pub fn alphabet(&self) -> Vec<char> {
        let mut labels: Vec<char> = self
            .states
            .iter()
            .flat_map(|state| state.edges.iter().filter_map(|&(label, _)| label))
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Render one state as `State 0 (start) --a--> 1`, with every outgoing
    /// edge appended in insertion order.
    pub fn display_state(&self, index: usize) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let tag = if index == self.start() {
                "start"
            } else if index == self.accept() {
                "accept"
            } else {
                ""
            };
            write!(f, "State {} ({})", index, tag)?;
            if let Some(state) = self.states.get(index) {
                for &(label, target) in &state.edges {
                    match label {
                        Some(ch) => write!(f, " --{}--> {}", ch, target)?,
                        None => write!(f, " --{}--> {}", crate::regex::EPSILON, target)?,
                    }
                }
            }
            Ok(())
        })
    }
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.states.len() {
            writeln!(f, "{}", self.display_state(index))?;
        }
        Ok(())
    }
}

/// Assembles the graph over provisional slots, then renumbers.
///
/// Slots stand in for states whose final number is not known yet; `emit`
/// assigns numbers with the entry-then-exit discipline described on [`Nfa`].
#[derive(Default)]
struct Builder {
    slots: Vec<Slot>,
    assigned: usize,
}

#[derive(Default)]
struct Slot {
    id: Option<usize>,
    edges: Vec<(Option<char>, usize)>,
}

impl Builder {
    fn fresh(&mut self) -> usize {
        self.slots.push(Slot::default());
        self.slots.len() - 1
    }

    fn connect(&mut self, from: usize, label: Option<char>, to: usize) {
        self.slots[from].edges.push((label, to));
    }

    fn number(&mut self, slot: usize) {
        if self.slots[slot].id.is_none() {
            self.slots[slot].id = Some(self.assigned);
            self.assigned += 1;
        }
    }

    fn emit(&mut self, node: &Regex, start: usize, end: usize) {
        self.number(start);
        match node {
            Regex::Empty => self.connect(start, None, end),
            Regex::Text(ch) => self.connect(start, Some(*ch), end),
            Regex::Cat(parts) => {
                if let Some((tail, init)) = parts.split_last() {
                    let mut last = start;
                    for part in init {
                        let temp = self.fresh();
                        self.emit(part, last, temp);
                        last = temp;
                    }
                    self.emit(tail, last, end);
                }
            }
            Regex::Or(parts) => {
                for part in parts {
                    let sub_start = self.fresh();
                    let sub_end = self.fresh();
                    self.connect(sub_end, None, end);
                    self.connect(start, None, sub_start);
                    self.emit(part, sub_start, sub_end);
                }
            }
            Regex::Star(sub) => {
                let sub_start = self.fresh();
                let sub_end = self.fresh();
                self.connect(sub_end, None, sub_start);
                self.connect(sub_end, None, end);
                self.connect(start, None, sub_start);
                self.connect(start, None, end);
                self.emit(sub, sub_start, sub_end);
            }
        }
        self.number(end);
    }

    fn finish(self) -> Nfa {
        let mut states: Vec<NfaState> = Vec::new();
        states.resize_with(self.assigned, NfaState::default);
        let numbering: Vec<Option<usize>> = self.slots.iter().map(|slot| slot.id).collect();
        for slot in &self.slots {
            let Some(id) = slot.id else { continue };
            states[id].edges = slot
                .edges
                .iter()
                .filter_map(|&(label, target)| Some((label, numbering[target]?)))
                .collect();
        }
        Nfa { states }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> Nfa {
        Nfa::from_regex(&Regex::parse(pattern).unwrap())
    }

    #[test]
    fn epsilon_regex() {
        let nfa = compile("ε");
        assert_eq!(nfa.to_string(), "State 0 (start) --ε--> 1\nState 1 (accept)\n");
    }

    #[test]
    fn single_symbol() {
        let nfa = compile("a");
        assert_eq!(nfa.to_string(), "State 0 (start) --a--> 1\nState 1 (accept)\n");
        assert_eq!(nfa.alphabet(), vec!['a']);
    }

    #[test]
    fn concatenation_chains_through_fresh_states() {
        let nfa = compile("abc");
        assert_eq!(
            nfa.to_string(),
            "State 0 (start) --a--> 1\n\
             State 1 () --b--> 2\n\
             State 2 () --c--> 3\n\
             State 3 (accept)\n",
        );
    }

    #[test]
    fn alternation_fans_out_over_epsilon_edges() {
        let nfa = compile("a|b");
        assert_eq!(
            nfa.to_string(),
            "State 0 (start) --ε--> 1 --ε--> 3\n\
             State 1 () --a--> 2\n\
             State 2 () --ε--> 5\n\
             State 3 () --b--> 4\n\
             State 4 () --ε--> 5\n\
             State 5 (accept)\n",
        );
    }

    #[test]
    fn star_adds_repeat_and_skip_edges() {
        let nfa = compile("a*");
        assert_eq!(
            nfa.to_string(),
            "State 0 (start) --ε--> 1 --ε--> 3\n\
             State 1 () --a--> 2\n\
             State 2 () --ε--> 1 --ε--> 3\n\
             State 3 (accept)\n",
        );
    }

    #[test]
    fn star_over_an_alternation() {
        let nfa = compile("(a|b)*");
        assert_eq!(nfa.len(), 8);
        assert_eq!(nfa.accept(), 7);
        // the star skip edge keeps the empty string accepted
        assert!(nfa
            .state(0)
            .map(|state| state.edges().contains(&(None, 7)))
            .unwrap_or(false));
        assert_eq!(nfa.alphabet(), vec!['a', 'b']);
    }

    #[test]
    fn accept_state_is_numbered_last_and_has_no_exits() {
        for pattern in ["ε", "ab", "a|b", "a*", "(a|b)*abb(a|b)*"] {
            let nfa = compile(pattern);
            let accept = nfa.accept();
            assert_eq!(accept, nfa.len() - 1, "{}", pattern);
            assert!(nfa.state(accept).unwrap().edges().is_empty(), "{}", pattern);
        }
    }
}

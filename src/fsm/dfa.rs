use std::fmt;
use std::hash::Hash;

use crate::{
    fsm::Nfa,
    types::{Map, Set},
    util::display_fn,
};

/// A deterministic automaton derived from an [`Nfa`] by subset construction.
///
/// Each state corresponds to one ε-closed set of NFA states (its `key`);
/// states are discovered breadth-first with edge labels tried in alphabet
/// order, and are conventionally named `A`, `B`, `C`, ... in that order.
#[derive(Debug)]
pub struct Dfa {
    states: Vec<DfaState>,
    alphabet: Vec<char>,
}

#[derive(Debug)]
pub struct DfaState {
    key: Vec<usize>,
    accept: bool,
    edges: Vec<(char, usize)>,
}

impl DfaState {
    /// The ε-closed set of NFA states this state stands for, ascending.
    pub fn key(&self) -> &[usize] {
        &self.key
    }

    pub fn is_accept(&self) -> bool {
        self.accept
    }

    pub fn edges(&self) -> &[(char, usize)] {
        &self.edges
    }
}

impl Dfa {
    pub fn from_nfa(nfa: &Nfa) -> Self {
        let alphabet = nfa.alphabet();
        let mut states: Vec<DfaState> = Vec::new();
        let mut index_of: Map<Vec<usize>, usize> = Map::default();

        let start_key = epsilon_closure(nfa, [nfa.start()]);
        index_of.insert(start_key.clone(), 0);
        states.push(DfaState {
            accept: start_key.binary_search(&nfa.accept()).is_ok(),
            key: start_key,
            edges: Vec::new(),
        });

        let mut u = 0;
        while u < states.len() {
            let key = states[u].key.clone();
            for &label in &alphabet {
                let moved = key
                    .iter()
                    .filter_map(|&index| nfa.state(index))
                    .flat_map(|state| state.edges().iter())
                    .filter(|&&(l, _)| l == Some(label))
                    .map(|&(_, target)| target);
                let successor = epsilon_closure(nfa, moved);
                if successor.is_empty() {
                    continue;
                }
                let target = match index_of.get(&successor) {
                    Some(&target) => target,
                    None => {
                        let target = states.len();
                        index_of.insert(successor.clone(), target);
                        states.push(DfaState {
                            accept: successor.binary_search(&nfa.accept()).is_ok(),
                            key: successor,
                            edges: Vec::new(),
                        });
                        target
                    }
                };
                states[u].edges.push((label, target));
            }
            u += 1;
        }

        tracing::trace!("subset construction produced {} states", states.len());
        Dfa { states, alphabet }
    }

    /// The conventional name of a state index: `A` for 0, `Z` for 25, then
    /// `AA` and so on.
    pub fn name(index: usize) -> String {
        let mut index = index;
        let mut letters = Vec::new();
        loop {
            letters.push(char::from(b'A' + (index % 26) as u8));
            if index < 26 {
                break;
            }
            index = index / 26 - 1;
        }
        letters.iter().rev().collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn state(&self, index: usize) -> Option<&DfaState> {
        self.states.get(index)
    }

    pub fn step(&self, state: usize, label: char) -> Option<usize> {
        self.states
            .get(state)?
            .edges
            .iter()
            .find(|&&(l, _)| l == label)
            .map(|&(_, target)| target)
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut state = 0;
        for ch in input.chars() {
            match self.step(state, ch) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.states.get(state).map(|s| s.accept).unwrap_or(false)
    }

    pub fn display_state(&self, index: usize) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let Some(state) = self.states.get(index) else {
                return Ok(());
            };
            let tag = if state.accept { "accept" } else { "" };
            write!(f, "State {} ({})", Self::name(index), tag)?;
            for &(label, target) in &state.edges {
                write!(f, " --{}--> {}", label, Self::name(target))?;
            }
            Ok(())
        })
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.states.len() {
            writeln!(f, "{}", self.display_state(index))?;
        }
        Ok(())
    }
}

/// The language-minimal quotient of a [`Dfa`].
///
/// States are equivalence classes of DFA states; a class is named by the
/// comma-joined names of its members (`C,D`). Labels leading to the same
/// successor class are bundled into one edge.
#[derive(Debug)]
pub struct MinDfa {
    states: Vec<MinDfaState>,
}

#[derive(Debug)]
pub struct MinDfaState {
    members: Vec<usize>,
    accept: bool,
    edges: Vec<(Vec<char>, usize)>,
}

impl MinDfaState {
    /// Member DFA state indices, ascending.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn is_accept(&self) -> bool {
        self.accept
    }

    pub fn edges(&self) -> &[(Vec<char>, usize)] {
        &self.edges
    }
}

impl MinDfa {
    pub fn from_dfa(dfa: &Dfa) -> Self {
        // Partition refinement. Classes are numbered by first occurrence in
        // state order, so the class of the start state is always 0. A state
        // with no transition on some label is distinguishable from one whose
        // transition leads anywhere, hence the Option in the signature.
        let (mut class, mut count) =
            assign((0..dfa.len()).map(|index| dfa.state(index).map(|s| s.accept)));
        loop {
            let signatures = (0..dfa.len()).map(|index| {
                let successors: Vec<Option<usize>> = dfa
                    .alphabet()
                    .iter()
                    .map(|&label| dfa.step(index, label).map(|target| class[target]))
                    .collect();
                (class[index], successors)
            });
            let (refined, refined_count) = assign(signatures);
            if refined_count == count {
                break;
            }
            class = refined;
            count = refined_count;
        }

        tracing::trace!("refined {} states into {} classes", dfa.len(), count);

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (index, &c) in class.iter().enumerate() {
            members[c].push(index);
        }

        let states = members
            .into_iter()
            .map(|members| {
                let representative = members[0];
                let accept = dfa.state(representative).map(|s| s.accept).unwrap_or(false);
                let mut bundles: Map<usize, Vec<char>> = Map::default();
                for &label in dfa.alphabet() {
                    if let Some(target) = dfa.step(representative, label) {
                        bundles.entry(class[target]).or_default().push(label);
                    }
                }
                let edges = bundles
                    .into_iter()
                    .map(|(target, labels)| (labels, target))
                    .collect();
                MinDfaState {
                    members,
                    accept,
                    edges,
                }
            })
            .collect();

        MinDfa { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<&MinDfaState> {
        self.states.get(index)
    }

    /// The comma-joined member names of a state, `A,B,C` style.
    pub fn key(&self, index: usize) -> String {
        let Some(state) = self.states.get(index) else {
            return String::new();
        };
        let names: Vec<String> = state.members.iter().map(|&m| Dfa::name(m)).collect();
        names.join(",")
    }

    pub fn step(&self, state: usize, label: char) -> Option<usize> {
        self.states
            .get(state)?
            .edges
            .iter()
            .find(|(labels, _)| labels.contains(&label))
            .map(|&(_, target)| target)
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut state = 0;
        for ch in input.chars() {
            match self.step(state, ch) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.states.get(state).map(|s| s.accept).unwrap_or(false)
    }

    pub fn display_state(&self, index: usize) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let Some(state) = self.states.get(index) else {
                return Ok(());
            };
            let tag = if state.accept { "accept" } else { "" };
            write!(f, "State {} ({})", self.key(index), tag)?;
            for (labels, target) in &state.edges {
                let label: String = labels
                    .iter()
                    .map(|ch| ch.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, " --{}--> {}", label, self.key(*target))?;
            }
            Ok(())
        })
    }
}

impl fmt::Display for MinDfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.states.len() {
            writeln!(f, "{}", self.display_state(index))?;
        }
        Ok(())
    }
}

fn epsilon_closure(nfa: &Nfa, seeds: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut closure: Set<usize> = Set::default();
    let mut pending: Vec<usize> = seeds.into_iter().collect();
    while let Some(index) = pending.pop() {
        if !closure.insert(index) {
            continue;
        }
        if let Some(state) = nfa.state(index) {
            for &(label, target) in state.edges() {
                if label.is_none() {
                    pending.push(target);
                }
            }
        }
    }
    let mut sorted: Vec<usize> = closure.into_iter().collect();
    sorted.sort_unstable();
    sorted
}

/// Number distinct keys by first occurrence; returns the per-element class
/// and the class count.
fn assign<K>(keys: impl Iterator<Item = K>) -> (Vec<usize>, usize)
where
    K: Eq + Hash,
{
    let mut ids: Map<K, usize> = Map::default();
    let classes = keys
        .map(|key| {
            let next = ids.len();
            *ids.entry(key).or_insert(next)
        })
        .collect();
    (classes, ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::Regex;

    fn compile(pattern: &str) -> (Dfa, MinDfa) {
        let nfa = Nfa::from_regex(&Regex::parse(pattern).unwrap());
        let dfa = Dfa::from_nfa(&nfa);
        let min = MinDfa::from_dfa(&dfa);
        (dfa, min)
    }

    #[test]
    fn state_names_run_through_the_alphabet_and_beyond() {
        assert_eq!(Dfa::name(0), "A");
        assert_eq!(Dfa::name(25), "Z");
        assert_eq!(Dfa::name(26), "AA");
        assert_eq!(Dfa::name(27), "AB");
    }

    #[test]
    fn single_symbol_dfa() {
        let (dfa, _) = compile("a");
        assert_eq!(dfa.len(), 2);
        assert_eq!(dfa.alphabet(), &['a']);
        assert_eq!(
            dfa.to_string(),
            "State A () --a--> B\nState B (accept)\n",
        );
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("aa"));
    }

    #[test]
    fn epsilon_regex_collapses_to_one_accepting_state() {
        let (_, min) = compile("ε");
        assert_eq!(min.len(), 1);
        assert_eq!(min.key(0), "A");
        assert_eq!(min.to_string(), "State A (accept)\n");
        assert!(min.accepts(""));
        assert!(!min.accepts("a"));
    }

    #[test]
    fn starred_alternation_merges_into_a_self_loop() {
        let (dfa, min) = compile("(a|b)*");
        assert_eq!(dfa.len(), 3);
        assert_eq!(min.len(), 1);
        assert_eq!(min.to_string(), "State A,B,C (accept) --a,b--> A,B,C\n");
        assert!(min.accepts(""));
        assert!(min.accepts("abba"));
    }

    #[test]
    fn plus_keeps_a_separate_start_state() {
        let (_, min) = compile("(a|b)+");
        assert_eq!(min.len(), 2);
        assert_eq!(min.key(0), "A");
        assert_eq!(min.key(1), "B,C,D,E");
        assert_eq!(
            min.to_string(),
            "State A () --a,b--> B,C,D,E\nState B,C,D,E (accept) --a,b--> B,C,D,E\n",
        );
        assert!(!min.accepts(""));
        assert!(min.accepts("a"));
        assert!(min.accepts("ba"));
    }

    #[test]
    fn leading_symbol_before_a_star() {
        let (_, min) = compile("a(b|c)*");
        assert_eq!(min.len(), 2);
        assert_eq!(
            min.to_string(),
            "State A () --a--> B,C,D\nState B,C,D (accept) --b,c--> B,C,D\n",
        );
        assert!(min.accepts("a"));
        assert!(min.accepts("abcb"));
        assert!(!min.accepts("b"));
    }

    #[test]
    fn consecutive_star_blocks() {
        let (_, min) = compile("(a|b)*(c|d)*");
        assert_eq!(min.len(), 2);
        assert_eq!(
            min.to_string(),
            "State A,B,C (accept) --a,b--> A,B,C --c,d--> D,E\n\
             State D,E (accept) --c,d--> D,E\n",
        );
        assert!(min.accepts(""));
        assert!(min.accepts("abcd"));
        assert!(!min.accepts("ca"));
    }

    #[test]
    fn alternatives_with_a_shared_suffix() {
        let (_, min) = compile("ab|b");
        assert_eq!(min.len(), 3);
        assert_eq!(
            min.to_string(),
            "State A () --a--> B --b--> C,D\n\
             State B () --b--> C,D\n\
             State C,D (accept)\n",
        );
        assert!(min.accepts("ab"));
        assert!(min.accepts("b"));
        assert!(!min.accepts("a"));
        assert!(!min.accepts("bb"));
    }

    #[test]
    fn strings_ending_in_abb() {
        let (dfa, min) = compile("(a|b)*abb");
        for input in ["abb", "aabb", "babb", "bababb"] {
            assert!(dfa.accepts(input), "{}", input);
            assert!(min.accepts(input), "{}", input);
        }
        for input in ["", "ab", "ba", "bba", "abbb"] {
            assert!(!dfa.accepts(input), "{}", input);
            assert!(!min.accepts(input), "{}", input);
        }
        assert_eq!(min.len(), 4);
        assert!(min.len() <= dfa.len());
    }

    #[test]
    fn minimization_never_grows_the_machine() {
        for pattern in ["ε", "a", "ab|b", "(a|b)*abb", "((ε|a)b*)*"] {
            let (dfa, min) = compile(pattern);
            assert!(min.len() <= dfa.len(), "{}", pattern);
        }
    }
}

//! Step-by-step parser traces.
//!
//! Drivers append one [`ParseStep`] per transition; the log is read-only once
//! parsing completes. Tree construction replays the logged actions in a
//! separate pass, so the drivers themselves never build trees.

use std::fmt;

/// One parser action, structured so a post-pass can rebuild the derivation
/// without re-running the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// An LL driver replaced the non-terminal on top of the stack by a
    /// production body.
    Apply { production: usize, rendered: String },
    /// An LL driver matched the next input terminal against the stack top.
    Match { terminal: String },
    /// An LR driver shifted the next input terminal and entered `state`.
    Shift { state: usize, terminal: String },
    /// An LR driver reduced by a production.
    Reduce { production: usize, rendered: String },
    Accept,
    /// The consulted table cell held more than one entry.
    Conflict { rendered: String },
    /// The input is not in the language; `message` names the divergence.
    Error { message: String },
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply { rendered, .. } => f.write_str(rendered),
            Self::Match { terminal } => write!(f, "match {}", terminal),
            Self::Shift { state, .. } => write!(f, "shift {}", state),
            Self::Reduce { rendered, .. } => write!(f, "reduce {}", rendered),
            Self::Accept => f.write_str("accept"),
            Self::Conflict { rendered } => write!(f, "conflict: {}", rendered),
            Self::Error { message } => write!(f, "error: {}", message),
        }
    }
}

/// A snapshot of the parser taken just before `action` was applied.
#[derive(Debug, Clone)]
pub struct ParseStep {
    /// Stack rendered bottom to top: grammar symbols for LL, state numbers
    /// for LR.
    pub stack: Vec<String>,
    /// Matched grammar symbols, LR only.
    pub symbols: Vec<String>,
    /// Unconsumed input, end-of-input marker included.
    pub remaining: Vec<String>,
    pub action: StepAction,
}

/// Which columns a trace renders; LL traces have no matched-symbols column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceStyle {
    Ll,
    Lr,
}

/// An append-only log of parser transitions.
#[derive(Debug)]
pub struct ParseSteps {
    steps: Vec<ParseStep>,
    style: TraceStyle,
}

impl ParseSteps {
    pub fn ll() -> Self {
        Self {
            steps: Vec::new(),
            style: TraceStyle::Ll,
        }
    }

    pub fn lr() -> Self {
        Self {
            steps: Vec::new(),
            style: TraceStyle::Lr,
        }
    }

    pub fn push(&mut self, step: ParseStep) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ParseStep> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseStep> {
        self.steps.iter()
    }

    pub fn actions(&self) -> impl Iterator<Item = &StepAction> {
        self.steps.iter().map(|s| &s.action)
    }

    /// True iff the trace ends in `accept`.
    pub fn accepted(&self) -> bool {
        matches!(
            self.steps.last().map(|s| &s.action),
            Some(StepAction::Accept)
        )
    }
}

impl fmt::Display for ParseSteps {
    /// Markdown table, one row per step.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            TraceStyle::Ll => {
                writeln!(f, "| Stack | Input | Action |")?;
                writeln!(f, "|:-:|:-:|:-:|")?;
                for step in &self.steps {
                    writeln!(
                        f,
                        "| {} | {} | {} |",
                        step.stack.join(" "),
                        step.remaining.join(" "),
                        step.action,
                    )?;
                }
            }
            TraceStyle::Lr => {
                writeln!(f, "| Stack | Symbols | Input | Action |")?;
                writeln!(f, "|:-:|:-:|:-:|:-:|")?;
                for step in &self.steps {
                    writeln!(
                        f,
                        "| {} | {} | {} | {} |",
                        step.stack.join(" "),
                        step.symbols.join(" "),
                        step.remaining.join(" "),
                        step.action,
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_rendering() {
        let apply = StepAction::Apply {
            production: 0,
            rendered: "E -> T E'".to_owned(),
        };
        assert_eq!(apply.to_string(), "E -> T E'");
        assert_eq!(
            StepAction::Match {
                terminal: "id".to_owned()
            }
            .to_string(),
            "match id"
        );
        assert_eq!(
            StepAction::Shift {
                state: 3,
                terminal: "a".to_owned()
            }
            .to_string(),
            "shift 3"
        );
        assert_eq!(
            StepAction::Reduce {
                production: 1,
                rendered: "S -> a".to_owned()
            }
            .to_string(),
            "reduce S -> a"
        );
        assert_eq!(StepAction::Accept.to_string(), "accept");
        assert_eq!(
            StepAction::Conflict {
                rendered: "S' -> e S / S' -> ε".to_owned()
            }
            .to_string(),
            "conflict: S' -> e S / S' -> ε"
        );
        assert_eq!(
            StepAction::Error {
                message: "expected b".to_owned()
            }
            .to_string(),
            "error: expected b"
        );
    }

    #[test]
    fn acceptance_looks_at_last_action() {
        let mut steps = ParseSteps::ll();
        assert!(!steps.accepted());
        steps.push(ParseStep {
            stack: vec!["$".into(), "S".into()],
            symbols: Vec::new(),
            remaining: vec!["a".into(), "$".into()],
            action: StepAction::Match {
                terminal: "a".to_owned(),
            },
        });
        assert!(!steps.accepted());
        steps.push(ParseStep {
            stack: vec!["$".into()],
            symbols: Vec::new(),
            remaining: vec!["$".into()],
            action: StepAction::Accept,
        });
        assert!(steps.accepted());
    }

    #[test]
    fn ll_trace_rendering() {
        let mut steps = ParseSteps::ll();
        steps.push(ParseStep {
            stack: vec!["$".into(), "S".into()],
            symbols: Vec::new(),
            remaining: vec!["a".into(), "$".into()],
            action: StepAction::Apply {
                production: 0,
                rendered: "S -> a".to_owned(),
            },
        });
        let expected = "| Stack | Input | Action |\n|:-:|:-:|:-:|\n| $ S | a $ | S -> a |\n";
        assert_eq!(steps.to_string(), expected);
    }

    #[test]
    fn lr_trace_rendering() {
        let mut steps = ParseSteps::lr();
        steps.push(ParseStep {
            stack: vec!["0".into()],
            symbols: Vec::new(),
            remaining: vec!["a".into(), "$".into()],
            action: StepAction::Shift {
                state: 2,
                terminal: "a".to_owned(),
            },
        });
        let expected =
            "| Stack | Symbols | Input | Action |\n|:-:|:-:|:-:|:-:|\n| 0 |  | a $ | shift 2 |\n";
        assert_eq!(steps.to_string(), expected);
    }
}

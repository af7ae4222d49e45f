use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use formalang::{
    cyk::CykTable,
    first_follow::FirstFollowTable,
    fsm::{Dfa, MinDfa, Nfa},
    grammar::Grammar,
    ll1::Ll1Table,
    lr::{ActionGotoTable, LrAutomaton},
    regex::Regex,
    trace::ParseSteps,
    transform, tree,
};
use std::{fs, path::PathBuf};

#[derive(Debug, Parser)]
#[command(name = "formalang", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite a grammar by left factoring, left-recursion elimination
    /// and/or Chomsky normal form conversion, in that order
    Transform {
        /// Path to the grammar file
        grammar: PathBuf,
        /// Left-factor common production prefixes
        #[arg(long)]
        left_factor: bool,
        /// When left-factoring, inline the introduced non-terminal back
        /// into the original production list
        #[arg(long, requires = "left_factor")]
        expand: bool,
        /// Eliminate immediate left recursion
        #[arg(long)]
        eliminate_left_recursion: bool,
        /// Convert to Chomsky normal form
        #[arg(long)]
        cnf: bool,
    },
    /// Print the nullable, FIRST and FOLLOW sets of every non-terminal
    FirstFollow {
        /// Path to the grammar file
        grammar: PathBuf,
    },
    /// Build the LL(1) predictive table, optionally parsing a sentence
    Ll1 {
        /// Path to the grammar file
        grammar: PathBuf,
        /// Space-separated sentence to parse with the table
        #[arg(long)]
        input: Option<String>,
    },
    /// Build an LR automaton and its ACTION/GOTO table
    Lr {
        /// Path to the grammar file
        grammar: PathBuf,
        #[arg(long, value_enum, default_value_t = Variant::Lr0)]
        variant: Variant,
        /// Space-separated sentence to parse with the table
        #[arg(long)]
        input: Option<String>,
    },
    /// Recognize a sentence with the CYK algorithm
    Cyk {
        /// Path to the grammar file; must be in Chomsky normal form
        /// unless `--convert` is given
        grammar: PathBuf,
        /// Space-separated sentence to recognize
        input: String,
        /// Convert the grammar to Chomsky normal form first
        #[arg(long)]
        convert: bool,
    },
    /// Compile a regular expression down to a minimal DFA
    Regex {
        pattern: String,
        /// String to run through the DFA and the minimal DFA
        #[arg(long)]
        input: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Variant {
    Lr0,
    Slr1,
    Lr1,
    Lalr1,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Transform {
            grammar,
            left_factor,
            expand,
            eliminate_left_recursion,
            cnf,
        } => {
            let mut grammar = read_grammar(&grammar)?;
            if left_factor {
                grammar = transform::left_factor(&grammar, expand);
            }
            if eliminate_left_recursion {
                grammar = transform::eliminate_left_recursion(&grammar)?;
            }
            if cnf {
                grammar = transform::to_chomsky_normal_form(&grammar);
            }
            print!("{}", grammar);
        }

        Command::FirstFollow { grammar } => {
            let grammar = read_grammar(&grammar)?;
            let sets = FirstFollowTable::new(&grammar);
            for &symbol in sets.non_terminals() {
                println!(
                    "{}: nullable = {}, FIRST = {{ {} }}, FOLLOW = {{ {} }}",
                    grammar.symbol_name(symbol),
                    sets.is_nullable(symbol),
                    sets.first_names(&grammar, symbol).join(", "),
                    sets.follow_names(&grammar, symbol).join(", "),
                );
            }
        }

        Command::Ll1 { grammar, input } => {
            let grammar = read_grammar(&grammar)?;
            let sets = FirstFollowTable::new(&grammar);
            let table = Ll1Table::new(&grammar, &sets);
            print!("{}", table.display(&grammar));
            if table.has_conflict() {
                println!("\nthe table has conflicts");
            }
            if let Some(input) = input {
                let steps = table.parse(&grammar, &input);
                print!("\n{}", steps);
                report(&grammar, &steps, tree::from_ll_trace);
            }
        }

        Command::Lr {
            grammar,
            variant,
            input,
        } => {
            let grammar = read_grammar(&grammar)?;
            let automaton = match variant {
                Variant::Lr0 => LrAutomaton::lr0(&grammar),
                Variant::Slr1 => LrAutomaton::slr1(&grammar),
                Variant::Lr1 => LrAutomaton::lr1(&grammar),
                Variant::Lalr1 => LrAutomaton::lalr1(&grammar),
            }?;
            for index in 0..automaton.len() {
                println!("{}", automaton.display_state(index));
            }
            print!("{}", automaton.display_edges());
            let table = ActionGotoTable::new(&automaton);
            print!("\n{}", table.display(&grammar));
            if table.has_conflict() {
                println!("\nthe table has conflicts");
            }
            if let Some(input) = input {
                let steps = table.parse(&grammar, &input);
                print!("\n{}", steps);
                report(&grammar, &steps, tree::from_lr_trace);
            }
        }

        Command::Cyk {
            grammar,
            input,
            convert,
        } => {
            let mut grammar = read_grammar(&grammar)?;
            if convert {
                grammar = transform::to_chomsky_normal_form(&grammar);
                print!("{}", grammar);
                println!();
            }
            let table = CykTable::parse(&grammar, &input)?;
            print!("{}", table.display(&grammar));
            if table.accepted() {
                println!("\naccepted");
                if let Some(tree) = table.parse_tree(&grammar) {
                    print!("{}", tree);
                }
            } else {
                println!("\nrejected");
            }
        }

        Command::Regex { pattern, input } => {
            let regex = Regex::parse(&pattern)?;
            println!("{}", regex);
            let nfa = Nfa::from_regex(&regex);
            print!("\n{}", nfa);
            let dfa = Dfa::from_nfa(&nfa);
            print!("\n{}", dfa);
            let min = MinDfa::from_dfa(&dfa);
            print!("\n{}", min);
            if let Some(input) = input {
                println!(
                    "\n{:?}: DFA {}, minimal DFA {}",
                    input,
                    verdict(dfa.accepts(&input)),
                    verdict(min.accepts(&input)),
                );
            }
        }
    }

    Ok(())
}

fn read_grammar(path: &PathBuf) -> anyhow::Result<Grammar> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading grammar from {}", path.display()))?;
    Ok(Grammar::parse(&text)?)
}

fn report(
    grammar: &Grammar,
    steps: &ParseSteps,
    extract: fn(&Grammar, &ParseSteps) -> Option<tree::ParseTree>,
) {
    if steps.accepted() {
        println!("\naccepted");
        if let Some(tree) = extract(grammar, steps) {
            print!("{}", tree);
        }
    } else {
        println!("\nrejected");
    }
}

fn verdict(accepted: bool) -> &'static str {
    if accepted {
        "accepts"
    } else {
        "rejects"
    }
}

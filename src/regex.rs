//! Regular-expression front end.
//!
//! The surface syntax is infix: `|` for alternation, juxtaposition for
//! concatenation, postfix `*` for the Kleene star, `(` `)` for grouping and a
//! lone `ε` for the empty string. `+` and `?` are sugar, rewritten at parse
//! time into `xx*` and `x|ε` so the rest of the pipeline only ever sees the
//! four core node shapes.

use std::fmt;

/// The epsilon literal; the reader also accepts the lunate `ϵ`.
pub const EPSILON: char = 'ε';

#[derive(Debug, thiserror::Error)]
pub enum RegexError {
    #[error("column {column}: empty expression")]
    Empty { column: usize },

    #[error("column {column}: missing right bracket")]
    MissingRightBracket { column: usize },

    #[error("column {column}: unexpected `{operator}'")]
    DanglingOperator { column: usize, operator: char },
}

/// A parsed regular expression.
///
/// `Cat` and `Or` are n-ary and never nest directly inside themselves; a
/// single-part sequence or alternation collapses to the part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    Empty,
    Text(char),
    Cat(Vec<Regex>),
    Or(Vec<Regex>),
    Star(Box<Regex>),
}

impl Regex {
    pub fn parse(pattern: &str) -> Result<Self, RegexError> {
        let chars: Vec<char> = pattern.chars().collect();
        parse_sub(&chars, 0, true)
    }
}

/// Parse one sub-expression.
///
/// `offset` is the absolute column of `chars[0]` in the original pattern so
/// diagnostics point into the full input. With `split_alternation` the slice
/// is first cut at every top-level `|`; each piece (and the whole slice when
/// no bar is found) is then scanned as a sequence of atoms.
fn parse_sub(chars: &[char], offset: usize, split_alternation: bool) -> Result<Regex, RegexError> {
    if chars.is_empty() {
        return Err(RegexError::Empty { column: offset });
    }

    if split_alternation {
        let mut parts = Vec::new();
        let mut last = 0;
        let mut depth = 0i32;
        for i in 0..=chars.len() {
            if i == chars.len() || (chars[i] == '|' && depth == 0) {
                if last == 0 && i == chars.len() {
                    return parse_sub(chars, offset, false);
                }
                parts.push(parse_sub(&chars[last..i], offset + last, true)?);
                last = i + 1;
            } else if chars[i] == '(' {
                depth += 1;
            } else if chars[i] == ')' {
                depth -= 1;
            }
        }
        return Ok(collapse(parts, Regex::Or));
    }

    let mut parts: Vec<Regex> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '(' => {
                let last = i + 1;
                i += 1;
                let mut depth = 1i32;
                while i < chars.len() && depth != 0 {
                    if chars[i] == '(' {
                        depth += 1;
                    } else if chars[i] == ')' {
                        depth -= 1;
                    }
                    i += 1;
                }
                if depth != 0 {
                    return Err(RegexError::MissingRightBracket {
                        column: offset + last,
                    });
                }
                i -= 1;
                parts.push(parse_sub(&chars[last..i], offset + last, true)?);
            }
            operator @ ('*' | '+' | '?') => {
                let Some(atom) = parts.pop() else {
                    return Err(RegexError::DanglingOperator {
                        column: offset + i,
                        operator,
                    });
                };
                parts.push(match operator {
                    '*' => Regex::Star(Box::new(atom)),
                    '+' => Regex::Cat(vec![atom.clone(), Regex::Star(Box::new(atom))]),
                    _ => Regex::Or(vec![atom, Regex::Empty]),
                });
            }
            'ε' | 'ϵ' => parts.push(Regex::Empty),
            ch => parts.push(Regex::Text(ch)),
        }
        i += 1;
    }

    Ok(collapse(parts, Regex::Cat))
}

fn collapse(mut parts: Vec<Regex>, wrap: fn(Vec<Regex>) -> Regex) -> Regex {
    if parts.len() == 1 {
        if let Some(part) = parts.pop() {
            return part;
        }
    }
    wrap(parts)
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Empty => write!(f, "{}", EPSILON),
            Regex::Text(ch) => write!(f, "{}", ch),
            Regex::Cat(parts) => {
                for part in parts {
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            Regex::Or(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
            Regex::Star(sub) => write!(f, "({})*", sub),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(ch: char) -> Regex {
        Regex::Text(ch)
    }

    fn star(sub: Regex) -> Regex {
        Regex::Star(Box::new(sub))
    }

    #[test]
    fn epsilon_literal() {
        assert_eq!(Regex::parse("ε").unwrap(), Regex::Empty);
    }

    #[test]
    fn single_symbol() {
        assert_eq!(Regex::parse("a").unwrap(), text('a'));
    }

    #[test]
    fn concatenation_is_flat() {
        assert_eq!(
            Regex::parse("abc").unwrap(),
            Regex::Cat(vec![text('a'), text('b'), text('c')]),
        );
    }

    #[test]
    fn alternation() {
        assert_eq!(
            Regex::parse("a|b").unwrap(),
            Regex::Or(vec![text('a'), text('b')]),
        );
    }

    #[test]
    fn brackets_collapse_to_the_inner_expression() {
        assert_eq!(Regex::parse("(a)").unwrap(), text('a'));
    }

    #[test]
    fn star_binds_to_the_previous_atom() {
        assert_eq!(Regex::parse("a*").unwrap(), star(text('a')));
        assert_eq!(
            Regex::parse("ab*").unwrap(),
            Regex::Cat(vec![text('a'), star(text('b'))]),
        );
    }

    #[test]
    fn star_over_a_group() {
        assert_eq!(
            Regex::parse("(a|b)*").unwrap(),
            star(Regex::Or(vec![text('a'), text('b')])),
        );
    }

    #[test]
    fn nested_stars() {
        assert_eq!(
            Regex::parse("(a*|b*)*").unwrap(),
            star(Regex::Or(vec![star(text('a')), star(text('b'))])),
        );
    }

    #[test]
    fn epsilon_inside_a_group() {
        assert_eq!(
            Regex::parse("((ε|a)b*)*").unwrap(),
            star(Regex::Cat(vec![
                Regex::Or(vec![Regex::Empty, text('a')]),
                star(text('b')),
            ])),
        );
    }

    #[test]
    fn surrounding_noise() {
        let parsed = Regex::parse("(a|b)*abb(a|b)*").unwrap();
        let noise = star(Regex::Or(vec![text('a'), text('b')]));
        assert_eq!(
            parsed,
            Regex::Cat(vec![noise.clone(), text('a'), text('b'), text('b'), noise]),
        );
    }

    #[test]
    fn plus_desugars_to_a_star_suffix() {
        assert_eq!(
            Regex::parse("a+").unwrap(),
            Regex::Cat(vec![text('a'), star(text('a'))]),
        );
    }

    #[test]
    fn question_mark_desugars_to_an_epsilon_alternative() {
        assert_eq!(
            Regex::parse("a?").unwrap(),
            Regex::Or(vec![text('a'), Regex::Empty]),
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = Regex::parse("").unwrap_err();
        assert_eq!(err.to_string(), "column 0: empty expression");
    }

    #[test]
    fn trailing_bar_leaves_an_empty_alternative() {
        let err = Regex::parse("a|").unwrap_err();
        assert_eq!(err.to_string(), "column 2: empty expression");
    }

    #[test]
    fn unbalanced_bracket() {
        let err = Regex::parse("(a").unwrap_err();
        assert_eq!(err.to_string(), "column 1: missing right bracket");
    }

    #[test]
    fn empty_group() {
        let err = Regex::parse("a()").unwrap_err();
        assert_eq!(err.to_string(), "column 2: empty expression");
    }

    #[test]
    fn leading_postfix_operators_are_rejected() {
        assert_eq!(
            Regex::parse("*").unwrap_err().to_string(),
            "column 0: unexpected `*'",
        );
        assert_eq!(
            Regex::parse("+").unwrap_err().to_string(),
            "column 0: unexpected `+'",
        );
        assert_eq!(
            Regex::parse("a|?b").unwrap_err().to_string(),
            "column 2: unexpected `?'",
        );
    }

    #[test]
    fn display_reproduces_the_canonical_form() {
        let parsed = Regex::parse("(a|b)*abb").unwrap();
        assert_eq!(parsed.to_string(), "((a|b))*abb");
        assert_eq!(Regex::parse("a+").unwrap().to_string(), "a(a)*");
        assert_eq!(Regex::parse("a?").unwrap().to_string(), "(a|ε)");
    }
}

//! The command-language lexer.
//!
//! Lines are split into whitespace-separated atoms, then each atom is
//! classified: punctuation, a number, a chain of names joined by dots
//! (`Determinize.Thompson` yields name-dot-name), a regex literal (an atom
//! built from regex characters), or a bare string (filenames). A `!!` atom
//! is the verbose-logging flag.

use crate::error::{InterpError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Name(String),
    Equals,
    DoubleBang,
    ParL,
    ParR,
    BracketL,
    BracketR,
    Dot,
    Number(i64),
    RegexLit(String),
    StringLit(String),
}

fn is_name(atom: &str) -> bool {
    let mut chars = atom.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_regex_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "|*()^&[]:_".contains(c)
}

/// Splits one line into tokens. Comment lines are handled by the caller.
pub fn lex_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    for atom in line.split_whitespace() {
        match atom {
            "=" => tokens.push(Token::Equals),
            "!!" => tokens.push(Token::DoubleBang),
            "(" => tokens.push(Token::ParL),
            ")" => tokens.push(Token::ParR),
            "[" => tokens.push(Token::BracketL),
            "]" => tokens.push(Token::BracketR),
            "." => tokens.push(Token::Dot),
            _ if atom.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
                let number: i64 = atom.parse().map_err(|_| {
                    InterpError::Lex(format!("malformed number `{}`", atom))
                })?;
                tokens.push(Token::Number(number));
            }
            _ if atom.split('.').all(|part| !part.is_empty() && is_name(part))
                && atom.contains('.') =>
            {
                let mut first = true;
                for part in atom.split('.') {
                    if !first {
                        tokens.push(Token::Dot);
                    }
                    tokens.push(Token::Name(part.to_string()));
                    first = false;
                }
            }
            _ if is_name(atom) => tokens.push(Token::Name(atom.to_string())),
            _ if atom.chars().all(is_regex_char) => {
                tokens.push(Token::RegexLit(atom.to_string()))
            }
            _ => tokens.push(Token::StringLit(atom.to_string())),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_line_tokens() {
        let tokens = lex_line("A = Determinize.Thompson a|b !!").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("A".into()),
                Token::Equals,
                Token::Name("Determinize".into()),
                Token::Dot,
                Token::Name("Thompson".into()),
                Token::RegexLit("a|b".into()),
                Token::DoubleBang,
            ]
        );
    }

    #[test]
    fn plain_words_are_names_not_regexes() {
        let tokens = lex_line("Test ab b 3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("Test".into()),
                Token::Name("ab".into()),
                Token::Name("b".into()),
                Token::Number(3),
            ]
        );
    }

    #[test]
    fn regex_atoms_keep_their_characters() {
        let tokens = lex_line("C = Glushkov (a|b)*abb").unwrap();
        assert_eq!(tokens[3], Token::RegexLit("(a|b)*abb".into()));
    }

    #[test]
    fn malformed_numbers_are_lex_errors() {
        assert!(matches!(lex_line("N = States 12;4"), Err(InterpError::Lex(_))));
        assert!(matches!(lex_line("12ab"), Err(InterpError::Lex(_))));
    }

    #[test]
    fn filenames_fall_through_to_strings() {
        let tokens = lex_line("R = Normalize a|b rules/basic.txt").unwrap();
        assert_eq!(
            tokens.last(),
            Some(&Token::StringLit("rules/basic.txt".into()))
        );
    }
}

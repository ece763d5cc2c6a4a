//! Tokenizer: converts raw source lines into typed token sequences.
//!
//! Lexing is line-oriented. Whitespace separates tokens but is otherwise
//! insignificant; keywords and identifiers are case-insensitive and
//! normalized to upper case. Identifiers may carry a single trailing type
//! suffix (`%` for integer, `$` for string).

use crate::error::{LexError, ParseError};
use std::iter::Peekable;
use std::str::Chars;

/// One lexical unit of a source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // literals and names
    Int(i32),
    Real(f64),
    Str(String),
    Symbol(String),
    // operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Not,
    // punctuation
    Semicolon,
    Comma,
    Colon,
    LParen,
    RParen,
    /// `#` is lexed for dialect compatibility; no grammar rule accepts it.
    Pound,
    Question,
    // keywords
    Let,
    Dim,
    Read,
    Data,
    Restore,
    Print,
    Goto,
    If,
    Then,
    Else,
    For,
    To,
    Step,
    Next,
    While,
    Wend,
    Def,
    Fn,
    Gosub,
    Return,
    On,
    Pop,
    Swap,
    End,
    /// REM with the rest of the line carried opaquely.
    Rem(String),
}

/// Keyword lookup for an upper-cased bare word.
fn keyword(word: &str) -> Option<Token> {
    let token = match word {
        "LET" => Token::Let,
        "DIM" => Token::Dim,
        "READ" => Token::Read,
        "DATA" => Token::Data,
        "RESTORE" => Token::Restore,
        "PRINT" => Token::Print,
        "GOTO" => Token::Goto,
        "IF" => Token::If,
        "THEN" => Token::Then,
        "ELSE" => Token::Else,
        "FOR" => Token::For,
        "TO" => Token::To,
        "STEP" => Token::Step,
        "NEXT" => Token::Next,
        "WHILE" => Token::While,
        "WEND" => Token::Wend,
        "DEF" => Token::Def,
        "FN" => Token::Fn,
        "GOSUB" => Token::Gosub,
        "RETURN" => Token::Return,
        "ON" => Token::On,
        "POP" => Token::Pop,
        "SWAP" => Token::Swap,
        "END" => Token::End,
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        _ => return None,
    };
    Some(token)
}

/// Tokenize one source line (including its leading line number).
pub fn tokenize(source_line: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = source_line.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch == ' ' || ch == '\t' {
            chars.next();
            continue;
        }
        if ch.is_ascii_digit() || ch == '.' {
            tokens.push(lex_number(&mut chars)?);
            continue;
        }
        if ch.is_ascii_alphabetic() {
            tokens.push(lex_word(&mut chars));
            continue;
        }
        if ch == '"' {
            tokens.push(lex_string(&mut chars)?);
            continue;
        }

        chars.next();
        let token = match ch {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '=' => Token::Equal,
            '<' => match chars.peek() {
                Some('=') => {
                    chars.next();
                    Token::LessEqual
                }
                Some('>') => {
                    chars.next();
                    Token::NotEqual
                }
                _ => Token::Less,
            },
            '>' => match chars.peek() {
                Some('=') => {
                    chars.next();
                    Token::GreaterEqual
                }
                _ => Token::Greater,
            },
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '#' => Token::Pound,
            '?' => Token::Question,
            other => return Err(LexError::UnrecognizedChar(other)),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Lex a numeric literal: digits with an optional point and exponent.
/// Integer literals that fit `i32` lex as `Int`; everything else is `Real`.
fn lex_number(chars: &mut Peekable<Chars>) -> Result<Token, LexError> {
    let mut text = String::new();
    let mut seen_point = false;
    let mut seen_exp = false;

    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' => {
                text.push(c);
                chars.next();
            }
            '.' if !seen_point && !seen_exp => {
                seen_point = true;
                text.push(c);
                chars.next();
            }
            'E' | 'e' if !seen_exp && !text.is_empty() && exponent_follows(chars) => {
                seen_exp = true;
                text.push('E');
                chars.next();
                if let Some(&sign) = chars.peek() {
                    if sign == '+' || sign == '-' {
                        text.push(sign);
                        chars.next();
                    }
                }
            }
            _ => break,
        }
    }

    if text == "." {
        return Err(LexError::UnrecognizedChar('.'));
    }
    if !seen_point && !seen_exp {
        if let Ok(n) = text.parse::<i32>() {
            return Ok(Token::Int(n));
        }
    }
    // the state machine only admits strings f64 can parse
    Ok(Token::Real(text.parse().unwrap_or(0.0)))
}

/// True when the character after the current `E` starts a valid exponent.
fn exponent_follows(chars: &Peekable<Chars>) -> bool {
    let mut look = chars.clone();
    look.next();
    match look.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+') | Some('-') => matches!(look.next(), Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}

/// Lex a bare word: keyword, REM comment, or symbol with optional suffix.
fn lex_word(chars: &mut Peekable<Chars>) -> Token {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() {
            word.push(c.to_ascii_uppercase());
            chars.next();
        } else {
            break;
        }
    }

    if word == "REM" {
        let rest: String = chars.collect();
        return Token::Rem(rest.trim().to_string());
    }

    match chars.peek() {
        Some(&suffix) if suffix == '%' || suffix == '$' => {
            word.push(suffix);
            chars.next();
            Token::Symbol(word)
        }
        _ => keyword(&word).unwrap_or(Token::Symbol(word)),
    }
}

/// Lex a double-quoted string literal. No escape sequences.
fn lex_string(chars: &mut Peekable<Chars>) -> Result<Token, LexError> {
    chars.next(); // opening quote
    let mut text = String::new();
    for c in chars {
        if c == '"' {
            return Ok(Token::Str(text));
        }
        text.push(c);
    }
    Err(LexError::UnterminatedString)
}

/// One source line with its mandatory leading line number stripped off.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeLine {
    pub number: u16,
    pub tokens: Vec<Token>,
}

impl CodeLine {
    /// Split the leading line number from a freshly tokenized line.
    pub fn new(tokens: Vec<Token>) -> Result<Self, ParseError> {
        match tokens.first() {
            Some(&Token::Int(n)) if n > 0 && n <= u16::MAX as i32 => Ok(Self {
                number: n as u16,
                tokens: tokens[1..].to_vec(),
            }),
            _ => Err(ParseError::unnumbered(
                "every line must begin with a positive line number",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_assignment() {
        let tokens = tokenize("10 LET A% = 42").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(10),
                Token::Let,
                Token::Symbol("A%".into()),
                Token::Equal,
                Token::Int(42),
            ]
        );
    }

    #[test]
    fn test_tokenize_is_case_insensitive() {
        let tokens = tokenize("10 print a$").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Int(10), Token::Print, Token::Symbol("A$".into())]
        );
    }

    #[test]
    fn test_tokenize_relational_digraphs() {
        let tokens = tokenize("10 IF A <= 5 AND B <> 2 THEN 20").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(10),
                Token::If,
                Token::Symbol("A".into()),
                Token::LessEqual,
                Token::Int(5),
                Token::And,
                Token::Symbol("B".into()),
                Token::NotEqual,
                Token::Int(2),
                Token::Then,
                Token::Int(20),
            ]
        );
    }

    #[test]
    fn test_tokenize_real_literals() {
        let tokens = tokenize("10 X = 2.5E-2 + .5 + 1E3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(10),
                Token::Symbol("X".into()),
                Token::Equal,
                Token::Real(0.025),
                Token::Plus,
                Token::Real(0.5),
                Token::Plus,
                Token::Real(1000.0),
            ]
        );
    }

    #[test]
    fn test_huge_integer_falls_back_to_real() {
        let tokens = tokenize("10 X = 99999999999").unwrap();
        assert_eq!(tokens[3], Token::Real(99999999999.0));
    }

    #[test]
    fn test_symbol_starting_with_e_is_not_an_exponent() {
        // `1E` with no digits after it lexes as the number 1 then symbol E
        let tokens = tokenize("10 X = 1E + 2").unwrap();
        assert_eq!(
            &tokens[3..],
            &[
                Token::Int(1),
                Token::Symbol("E".into()),
                Token::Plus,
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn test_string_literal_keeps_spaces() {
        let tokens = tokenize("10 PRINT \"HELLO, WORLD\"").unwrap();
        assert_eq!(tokens[2], Token::Str("HELLO, WORLD".into()));
    }

    #[test]
    fn test_unterminated_string() {
        let result = tokenize("10 PRINT \"OOPS");
        assert_eq!(result, Err(LexError::UnterminatedString));
    }

    #[test]
    fn test_unrecognized_character() {
        let result = tokenize("10 A = 1 @ 2");
        assert_eq!(result, Err(LexError::UnrecognizedChar('@')));
    }

    #[test]
    fn test_rem_swallows_rest_of_line() {
        let tokens = tokenize("10 REM anything: goes, \"here\"").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Int(10), Token::Rem("anything: goes, \"here\"".into())]
        );
    }

    #[test]
    fn test_question_mark_and_pound() {
        let tokens = tokenize("10 ? 1 # 2").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(10),
                Token::Question,
                Token::Int(1),
                Token::Pound,
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn test_code_line_strips_number() {
        let line = CodeLine::new(tokenize("20 END").unwrap()).unwrap();
        assert_eq!(line.number, 20);
        assert_eq!(line.tokens, vec![Token::End]);
    }

    #[test]
    fn test_code_line_requires_number() {
        assert!(CodeLine::new(tokenize("PRINT 1").unwrap()).is_err());
        assert!(CodeLine::new(tokenize("0 PRINT 1").unwrap()).is_err());
    }

    #[test]
    fn prop_literal_display_relexes_to_equal_value() {
        fn prop(f: f64) -> bool {
            let f = f.abs();
            if !f.is_finite() {
                return true;
            }
            match tokenize(&format!("{}", f)).as_deref() {
                Ok([Token::Int(n)]) => *n as f64 == f,
                Ok([Token::Real(r)]) => *r == f,
                _ => false,
            }
        }
        quickcheck::QuickCheck::new()
            .tests(100)
            .quickcheck(prop as fn(f64) -> bool);
    }
}

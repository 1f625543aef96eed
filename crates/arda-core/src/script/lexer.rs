//! Tokenizer for mapping logic source

use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    LParen,
    RParen,
    Comma,
    Assign,
    Plus,
    Newline,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::Comma => f.write_str("`,`"),
            Token::Assign => f.write_str("`=`"),
            Token::Plus => f.write_str("`+`"),
            Token::Newline => f.write_str("end of line"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with the 1-based position where it starts
#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub(crate) fn syntax_error(line: usize, column: usize, message: impl Into<String>) -> Error {
    Error::LogicSyntax {
        line,
        column,
        message: message.into(),
    }
}

/// Split source into tokens
///
/// Newlines are significant except inside parentheses.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut column = 1;
    let mut depth = 0usize;

    while let Some(&c) = chars.peek() {
        let (start_line, start_column) = (line, column);
        let mut push = |token: Token| {
            tokens.push(Spanned {
                token,
                line: start_line,
                column: start_column,
            })
        };

        match c {
            '\n' => {
                chars.next();
                if depth == 0 {
                    push(Token::Newline);
                }
                line += 1;
                column = 1;
                continue;
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                    column += 1;
                }
                continue;
            }
            '(' => {
                chars.next();
                depth += 1;
                push(Token::LParen);
            }
            ')' => {
                chars.next();
                depth = depth.saturating_sub(1);
                push(Token::RParen);
            }
            ',' => {
                chars.next();
                push(Token::Comma);
            }
            '=' => {
                chars.next();
                push(Token::Assign);
            }
            '+' => {
                chars.next();
                push(Token::Plus);
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    column += 1;
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            let escaped = chars.next().ok_or_else(|| {
                                syntax_error(start_line, start_column, "unterminated string")
                            })?;
                            column += 1;
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                '"' => '"',
                                '\\' => '\\',
                                other => {
                                    return Err(syntax_error(
                                        line,
                                        column - 1,
                                        format!("unknown escape `\\{other}`"),
                                    ))
                                }
                            });
                        }
                        '\n' => {
                            return Err(syntax_error(
                                start_line,
                                start_column,
                                "unterminated string",
                            ))
                        }
                        c => value.push(c),
                    }
                }
                if !closed {
                    return Err(syntax_error(start_line, start_column, "unterminated string"));
                }
                push(Token::Str(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                    column += 1;
                }
                push(Token::Ident(name));
                continue;
            }
            other => {
                return Err(syntax_error(
                    line,
                    column,
                    format!("unexpected character `{other}`"),
                ))
            }
        }
        column += 1;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
        column,
    });
    Ok(tokens)
}

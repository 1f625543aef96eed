//! Parser and name resolution for mapping logic

use super::eval::{Arity, Builtin};
use super::lexer::{syntax_error, tokenize, Spanned, Token};
use crate::error::Result;
use crate::table::OutputField;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    Literal(String),
    Var(usize),
    Concat(Vec<Expr>),
    Call(Builtin, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Stmt {
    Let { slot: usize, expr: Expr },
    Assign { field: OutputField, expr: Expr },
    Dedupe(Expr),
}

/// A compiled mapping program
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Program {
    pub stmts: Vec<Stmt>,
    /// Number of variable slots needed per row
    pub slots: usize,
}

impl Program {
    pub fn has_dedupe(&self) -> bool {
        self.stmts.iter().any(|s| matches!(s, Stmt::Dedupe(_)))
    }
}

pub(crate) fn compile_program(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    Parser {
        tokens,
        pos: 0,
        scope: HashMap::new(),
        slots: 0,
        dedupe_seen: false,
    }
    .program()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    scope: HashMap<String, usize>,
    slots: usize,
    dedupe_seen: bool,
}

impl Parser {
    fn peek(&self) -> &Spanned {
        // tokenize always ends with Eof, and Eof is never consumed
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.peek().clone();
        if tok.token != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<Spanned> {
        let tok = self.advance();
        if tok.token == expected {
            Ok(tok)
        } else {
            Err(syntax_error(
                tok.line,
                tok.column,
                format!("expected {expected}, found {}", tok.token),
            ))
        }
    }

    fn program(mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        loop {
            match self.peek().token {
                Token::Newline => {
                    self.advance();
                }
                Token::Eof => break,
                _ => {
                    stmts.push(self.statement()?);
                    let end = self.advance();
                    if !matches!(end.token, Token::Newline | Token::Eof) {
                        return Err(syntax_error(
                            end.line,
                            end.column,
                            format!("expected end of line, found {}", end.token),
                        ));
                    }
                }
            }
        }
        Ok(Program {
            stmts,
            slots: self.slots,
        })
    }

    fn statement(&mut self) -> Result<Stmt> {
        let start = self.advance();
        match start.token {
            Token::Ident(ref kw) if kw == "let" => {
                let name_tok = self.advance();
                let name = match name_tok.token {
                    Token::Ident(name) if !is_keyword(&name) => name,
                    other => {
                        return Err(syntax_error(
                            name_tok.line,
                            name_tok.column,
                            format!("expected variable name, found {other}"),
                        ))
                    }
                };
                self.expect(Token::Assign)?;
                // bind after the expression so `let x = x + ...` sees the old value
                let expr = self.expr()?;
                let slot = self.slots;
                self.slots += 1;
                self.scope.insert(name, slot);
                Ok(Stmt::Let { slot, expr })
            }
            Token::Ident(ref kw) if kw == "dedupe" => {
                if self.dedupe_seen {
                    return Err(syntax_error(
                        start.line,
                        start.column,
                        "only one `dedupe` statement is allowed",
                    ));
                }
                self.dedupe_seen = true;
                Ok(Stmt::Dedupe(self.expr()?))
            }
            Token::Str(ref name) => {
                let field = OutputField::from_name(name).ok_or_else(|| {
                    syntax_error(
                        start.line,
                        start.column,
                        format!("unknown output field {name:?}"),
                    )
                })?;
                self.expect(Token::Assign)?;
                Ok(Stmt::Assign {
                    field,
                    expr: self.expr()?,
                })
            }
            other => Err(syntax_error(
                start.line,
                start.column,
                format!("expected `let`, `dedupe` or an output field name, found {other}"),
            )),
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut parts = vec![self.term()?];
        while self.peek().token == Token::Plus {
            self.advance();
            parts.push(self.term()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Concat(parts)
        })
    }

    fn term(&mut self) -> Result<Expr> {
        let tok = self.advance();
        match tok.token {
            Token::Str(value) => Ok(Expr::Literal(value)),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if self.peek().token == Token::LParen => {
                let builtin = Builtin::from_name(&name).ok_or_else(|| {
                    syntax_error(tok.line, tok.column, format!("unknown function `{name}`"))
                })?;
                self.advance();
                let args = self.arguments()?;
                check_arity(builtin, args.len()).map_err(|message| {
                    syntax_error(tok.line, tok.column, message)
                })?;
                Ok(Expr::Call(builtin, args))
            }
            Token::Ident(name) => self.scope.get(&name).map(|&slot| Expr::Var(slot)).ok_or_else(
                || syntax_error(tok.line, tok.column, format!("undefined variable `{name}`")),
            ),
            other => Err(syntax_error(
                tok.line,
                tok.column,
                format!("expected expression, found {other}"),
            )),
        }
    }

    /// Comma-separated arguments after an opening parenthesis
    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek().token == Token::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            let tok = self.advance();
            match tok.token {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => {
                    return Err(syntax_error(
                        tok.line,
                        tok.column,
                        format!("expected `,` or `)`, found {other}"),
                    ))
                }
            }
        }
    }
}

fn is_keyword(name: &str) -> bool {
    matches!(name, "let" | "dedupe")
}

fn check_arity(builtin: Builtin, count: usize) -> std::result::Result<(), String> {
    match builtin.arity() {
        Arity::Exact(n) if count != n => Err(format!(
            "`{}` takes {n} argument{}, got {count}",
            builtin.name(),
            if n == 1 { "" } else { "s" }
        )),
        Arity::AtLeast(n) if count < n => Err(format!(
            "`{}` takes at least {n} arguments, got {count}",
            builtin.name()
        )),
        _ => Ok(()),
    }
}

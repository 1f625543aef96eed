//! Built-in functions and per-row evaluation

use super::compile::{Expr, Program, Stmt};
use crate::dedup::{dedup_key, DedupKey};
use crate::error::{Error, Result};
use crate::mapper::MapContext;
use crate::table::{OutputRow, Row};

const TRUE: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
    Exact(usize),
    AtLeast(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Col,
    Raw,
    Trim,
    Lower,
    Upper,
    NanEmpty,
    Remove,
    Replace,
    Join,
    Or,
    If,
    Eq,
    Ieq,
    Contains,
    Not,
    Image,
    Require,
}

impl Builtin {
    const ALL: [Builtin; 17] = [
        Builtin::Col,
        Builtin::Raw,
        Builtin::Trim,
        Builtin::Lower,
        Builtin::Upper,
        Builtin::NanEmpty,
        Builtin::Remove,
        Builtin::Replace,
        Builtin::Join,
        Builtin::Or,
        Builtin::If,
        Builtin::Eq,
        Builtin::Ieq,
        Builtin::Contains,
        Builtin::Not,
        Builtin::Image,
        Builtin::Require,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Col => "col",
            Builtin::Raw => "raw",
            Builtin::Trim => "trim",
            Builtin::Lower => "lower",
            Builtin::Upper => "upper",
            Builtin::NanEmpty => "nan_empty",
            Builtin::Remove => "remove",
            Builtin::Replace => "replace",
            Builtin::Join => "join",
            Builtin::Or => "or",
            Builtin::If => "if",
            Builtin::Eq => "eq",
            Builtin::Ieq => "ieq",
            Builtin::Contains => "contains",
            Builtin::Not => "not",
            Builtin::Image => "image",
            Builtin::Require => "require",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn arity(self) -> Arity {
        match self {
            Builtin::Col
            | Builtin::Raw
            | Builtin::Trim
            | Builtin::Lower
            | Builtin::Upper
            | Builtin::NanEmpty
            | Builtin::Not
            | Builtin::Image => Arity::Exact(1),
            Builtin::Eq | Builtin::Ieq | Builtin::Contains | Builtin::Require => Arity::Exact(2),
            Builtin::Replace | Builtin::If => Arity::Exact(3),
            Builtin::Remove | Builtin::Join => Arity::AtLeast(2),
            Builtin::Or => Arity::AtLeast(1),
        }
    }
}

fn truth(value: bool) -> String {
    if value {
        TRUE.to_string()
    } else {
        String::new()
    }
}

/// Evaluation state for one input row
struct Frame<'r, 'c, 'i> {
    row: &'r Row,
    ctx: &'c MapContext<'i>,
    vars: Vec<String>,
}

impl Frame<'_, '_, '_> {
    fn eval(&self, expr: &Expr) -> std::result::Result<String, String> {
        match expr {
            Expr::Literal(s) => Ok(s.clone()),
            Expr::Var(slot) => Ok(self.vars[*slot].clone()),
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&self.eval(part)?);
                }
                Ok(out)
            }
            Expr::Call(builtin, args) => self.call(*builtin, args),
        }
    }

    fn call(&self, builtin: Builtin, args: &[Expr]) -> std::result::Result<String, String> {
        // arguments are evaluated on demand so `if` and `or` skip unused branches
        let arg = |i: usize| self.eval(&args[i]);
        let rest = |from: usize| {
            args[from..]
                .iter()
                .map(|a| self.eval(a))
                .collect::<std::result::Result<Vec<_>, _>>()
        };

        Ok(match builtin {
            Builtin::Col => self.ctx.value(self.row, &arg(0)?).to_string(),
            Builtin::Raw => self.row.get(&arg(0)?).unwrap_or("").to_string(),
            Builtin::Trim => arg(0)?.trim().to_string(),
            Builtin::Lower => arg(0)?.to_lowercase(),
            Builtin::Upper => arg(0)?.to_uppercase(),
            Builtin::NanEmpty => {
                let value = arg(0)?;
                if value.eq_ignore_ascii_case("nan") {
                    String::new()
                } else {
                    value
                }
            }
            Builtin::Remove => {
                let value = arg(0)?;
                rest(1)?
                    .iter()
                    .filter(|pat| !pat.is_empty())
                    .fold(value, |acc, pat| acc.replace(pat.as_str(), ""))
            }
            Builtin::Replace => {
                let (value, from) = (arg(0)?, arg(1)?);
                if from.is_empty() {
                    value
                } else {
                    value.replace(from.as_str(), &arg(2)?)
                }
            }
            Builtin::Join => {
                let separator = arg(0)?;
                rest(1)?
                    .iter()
                    .filter(|v| !v.is_empty())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(separator.as_str())
            }
            Builtin::Or => {
                let mut found = String::new();
                for a in args {
                    let value = self.eval(a)?;
                    if !value.is_empty() {
                        found = value;
                        break;
                    }
                }
                found
            }
            Builtin::If => {
                if arg(0)?.is_empty() {
                    arg(2)?
                } else {
                    arg(1)?
                }
            }
            Builtin::Eq => truth(arg(0)? == arg(1)?),
            Builtin::Ieq => truth(arg(0)?.to_lowercase() == arg(1)?.to_lowercase()),
            Builtin::Contains => truth(arg(0)?.contains(arg(1)?.as_str())),
            Builtin::Not => truth(arg(0)?.is_empty()),
            Builtin::Image => self.ctx.images.lookup(&arg(0)?).to_string(),
            Builtin::Require => {
                let value = arg(0)?;
                if value.is_empty() {
                    return Err(arg(1)?);
                }
                value
            }
        })
    }

    fn runtime_error(&self, message: String) -> Error {
        Error::LogicRuntime {
            line: self.row.line,
            message,
        }
    }
}

impl Program {
    fn frame<'r, 'c, 'i>(&self, row: &'r Row, ctx: &'c MapContext<'i>) -> Frame<'r, 'c, 'i> {
        Frame {
            row,
            ctx,
            vars: vec![String::new(); self.slots],
        }
    }

    /// Dedup key for a row: runs `let` statements up to the `dedupe` statement
    pub(crate) fn dedup_key(&self, row: &Row, ctx: &MapContext<'_>) -> Result<DedupKey> {
        let mut frame = self.frame(row, ctx);
        for stmt in &self.stmts {
            match stmt {
                Stmt::Let { slot, expr } => {
                    frame.vars[*slot] = frame.eval(expr).map_err(|m| frame.runtime_error(m))?;
                }
                Stmt::Dedupe(expr) => {
                    let key = frame.eval(expr).map_err(|m| frame.runtime_error(m))?;
                    return Ok(dedup_key(row, Some(key.as_str())));
                }
                Stmt::Assign { .. } => {}
            }
        }
        Ok(dedup_key(row, None))
    }

    /// Map one row to the output schema
    pub(crate) fn map_row(&self, row: &Row, ctx: &MapContext<'_>) -> Result<OutputRow> {
        let mut frame = self.frame(row, ctx);
        let mut out = OutputRow::new();
        for stmt in &self.stmts {
            match stmt {
                Stmt::Let { slot, expr } => {
                    frame.vars[*slot] = frame.eval(expr).map_err(|m| frame.runtime_error(m))?;
                }
                Stmt::Assign { field, expr } => {
                    out.set(*field, frame.eval(expr).map_err(|m| frame.runtime_error(m))?);
                }
                Stmt::Dedupe(_) => {}
            }
        }
        Ok(out)
    }
}

// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm),
// reducing straight into an expression tree instead of emitting postfix

use crate::{
    eval::{Associativity, Ident, IdentKey, Idents, OperatorTyp},
    expr::Expr,
    lex::{LexErr, LexErrTyp, Lexer, SubStr, TokTyp},
    stdlib, Number,
};
use core::{cmp::Ordering, fmt, num::ParseFloatError};

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    MissingOperand,
    Empty,
    Leftover { found: usize },
    StrayComma,
    Arity { expected: usize, found: usize },
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::MissingOperand => write!(f, "missing operand"),
            Self::Empty => write!(f, "empty expression"),
            Self::Leftover { found } => {
                write!(f, "expected a single expression but found {found}")
            }
            Self::StrayComma => write!(f, "comma outside of a function call"),
            Self::Arity { expected, found } => write!(
                f,
                "function takes {expected} argument{s} but was given {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.typ.fmt(f)
    }
}

impl std::error::Error for ParseErr {}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun { arity: usize },
    /// `base` is the operand count when the paren opened; `commas` counts
    /// argument separators seen so far.
    OpenParen { call: bool, base: usize, commas: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    /// Whether this operator, sitting on the stack, binds tighter than an
    /// incoming binary operator `o1` and must be reduced first.
    fn yields_to(&self, o1: OperatorTyp) -> bool {
        match self.typ {
            ShuntOpTyp::Operator(o2) => {
                o2.precedence() > o1.precedence()
                    || (o2.precedence() == o1.precedence()
                        && o1.associativity() == Associativity::Left)
            }
            ShuntOpTyp::Fun { .. } | ShuntOpTyp::OpenParen { .. } => false,
        }
    }

    fn reduce(self, out: &mut Vec<Expr>) -> Result<(), ParseErr> {
        let missing = |loc: SubStr| ParseErr {
            typ: ParseErrTyp::MissingOperand,
            loc,
        };
        match self.typ {
            ShuntOpTyp::Operator(OperatorTyp::Neg) => {
                let a = out.pop().ok_or_else(|| missing(self.loc))?;
                out.push(Expr::neg(a));
            }
            ShuntOpTyp::Operator(op) => {
                let (Some(b), Some(a)) = (out.pop(), out.pop()) else {
                    return Err(missing(self.loc));
                };
                out.push(Expr::bin(op, a, b));
            }
            ShuntOpTyp::Fun { arity } => {
                if out.len() < arity {
                    return Err(missing(self.loc));
                }
                let args = out.split_off(out.len() - arity);
                out.push(Expr::Call(self.loc.into(), args));
            }
            ShuntOpTyp::OpenParen { .. } => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ParenMismatch,
                    loc: self.loc,
                })
            }
        }
        Ok(())
    }

    /// Applies a function to the `argc` arguments that closed its parens.
    fn call(self, argc: usize, out: &mut Vec<Expr>) -> Result<(), ParseErr> {
        let ShuntOpTyp::Fun { arity } = self.typ else {
            return self.reduce(out);
        };
        let name: IdentKey = if argc == arity {
            self.loc.into()
        } else if let Some(short) = stdlib::short_form(self.loc.get(), argc) {
            short.into()
        } else {
            return Err(ParseErr {
                typ: ParseErrTyp::Arity {
                    expected: arity,
                    found: argc,
                },
                loc: self.loc,
            });
        };
        let args = out.split_off(out.len() - argc);
        out.push(Expr::Call(name, args));
        Ok(())
    }
}

/// Operands produced inside the paren `paren` so far.
fn operands_since(paren: &ShuntOp, out: &[Expr]) -> Result<usize, ParseErr> {
    let ShuntOpTyp::OpenParen { base, .. } = paren.typ else {
        return Ok(out.len());
    };
    out.len().checked_sub(base).ok_or_else(|| ParseErr {
        typ: ParseErrTyp::MissingOperand,
        loc: paren.loc.clone(),
    })
}

/// Checks that an argument list holds exactly `expected` operands.
fn expect_operands(found: usize, expected: usize, loc: &SubStr) -> Result<(), ParseErr> {
    let typ = match found.cmp(&expected) {
        Ordering::Equal => return Ok(()),
        Ordering::Less => ParseErrTyp::MissingOperand,
        Ordering::Greater => ParseErrTyp::Leftover {
            found: found - expected + 1,
        },
    };
    Err(ParseErr {
        typ,
        loc: loc.clone(),
    })
}

pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Expr, ParseErr> {
    let src = lex.src();
    let mut out: Vec<Expr> = Vec::new(); // operand stack
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack
    let mut fun_pending = false; // previous token named a function

    for tok in lex {
        let tok = tok?;
        let after_fun = core::mem::replace(&mut fun_pending, false);
        match tok.typ {
            TokTyp::Number => {
                let num: Number = tok.loc.get().parse().map_err(|err| ParseErr {
                    typ: ParseErrTyp::ParseNum(err),
                    loc: tok.loc.clone(),
                })?;
                out.push(Expr::Num(num));
            }

            TokTyp::Ident => match idents.get(&tok.loc.clone().into()) {
                Some(Ident::Fun(fun)) => {
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Fun { arity: fun.arity },
                        loc: tok.loc,
                    });
                    fun_pending = true;
                }
                // unknown identifiers are assumed to be variables and only
                // fail once evaluated
                Some(Ident::Var(_) | Ident::Const(_)) | None => {
                    out.push(Expr::Sym(tok.loc.into()))
                }
            },

            TokTyp::Op(o1) => {
                if !o1.is_prefix() {
                    while ops.last().map_or(false, |o2| o2.yields_to(o1)) {
                        if let Some(o2) = ops.pop() {
                            o2.reduce(&mut out)?;
                        }
                    }
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::Comma => {
                while let Some(op) = ops.pop() {
                    if matches!(op.typ, ShuntOpTyp::OpenParen { .. }) {
                        ops.push(op);
                        break;
                    }
                    op.reduce(&mut out)?;
                }

                let stray = || ParseErr {
                    typ: ParseErrTyp::StrayComma,
                    loc: tok.loc.clone(),
                };
                let Some(paren) = ops.last_mut() else {
                    return Err(stray());
                };
                let found = operands_since(paren, &out)?;
                let ShuntOpTyp::OpenParen {
                    call: true,
                    ref mut commas,
                    ..
                } = paren.typ
                else {
                    return Err(stray());
                };
                expect_operands(found, *commas + 1, &tok.loc)?;
                *commas += 1;
            }

            TokTyp::CloseParen => {
                while let Some(op) = ops.pop() {
                    if matches!(op.typ, ShuntOpTyp::OpenParen { .. }) {
                        ops.push(op);
                        break;
                    }
                    op.reduce(&mut out)?;
                }

                let Some(paren) = ops
                    .pop()
                    .filter(|op| matches!(op.typ, ShuntOpTyp::OpenParen { .. }))
                else {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: tok.loc,
                    });
                };
                let found = operands_since(&paren, &out)?;
                if let ShuntOpTyp::OpenParen { call, commas, .. } = paren.typ {
                    expect_operands(found, commas + 1, &tok.loc)?;

                    // handle functions
                    if call {
                        if let Some(fun) = ops.pop() {
                            fun.call(commas + 1, &mut out)?;
                        }
                    }
                }
            }

            TokTyp::OpenParen => {
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen {
                        call: after_fun,
                        base: out.len(),
                        commas: 0,
                    },
                    loc: tok.loc,
                });
            }

            TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XEqual
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => {
                return Err(ParseErr {
                    typ: ParseErrTyp::LexErr(LexErrTyp::Unsupported(tok.typ)),
                    loc: tok.loc,
                })
            }
        }
    }

    while let Some(op) = ops.pop() {
        op.reduce(&mut out)?;
    }

    let found = out.len();
    match (out.pop(), found) {
        (Some(expr), 1) => Ok(expr),
        (None, _) => Err(ParseErr {
            typ: ParseErrTyp::Empty,
            loc: SubStr::all(src),
        }),
        (Some(_), found) => Err(ParseErr {
            typ: ParseErrTyp::Leftover { found },
            loc: SubStr::all(src),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::standard_idents;
    use std::sync::Arc;

    fn try_parse(src: &str) -> Result<Expr, ParseErr> {
        let src = Arc::new(src.to_string());
        parse(Lexer::new(&src), &standard_idents())
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(try_parse("1 + 2*x^2").unwrap().to_string(), "1 + 2*x^2");
        assert_eq!(try_parse("(1 + 2)*x").unwrap().to_string(), "(1 + 2)*x");
        assert_eq!(try_parse("2^3^2").unwrap().to_string(), "2^3^2");
        assert_eq!(try_parse("(2^3)^2").unwrap().to_string(), "(2^3)^2");
        assert_eq!(try_parse("x - 1 - 2").unwrap().to_string(), "x - 1 - 2");
        assert_eq!(try_parse("x - (1 - 2)").unwrap().to_string(), "x - (1 - 2)");
    }

    #[test]
    fn negation_binds_looser_than_power() {
        let expr = try_parse("-x^2").unwrap();
        assert!(matches!(expr, Expr::Neg(ref inner) if matches!(**inner, Expr::Bin(OperatorTyp::Pow, ..))));
        assert_eq!(try_parse("2^-x").unwrap().to_string(), "2^(-x)");
        assert_eq!(try_parse("--x").unwrap().to_string(), "-(-x)");
    }

    #[test]
    fn functions_take_their_arity() {
        let expr = try_parse("log(8, 2) + sin(x)").unwrap();
        let Expr::Bin(OperatorTyp::Add, log, sin) = expr else {
            panic!("expected a sum");
        };
        assert!(matches!(*log, Expr::Call(ref name, ref args) if name.get() == "log" && args.len() == 2));
        assert!(matches!(*sin, Expr::Call(ref name, ref args) if name.get() == "sin" && args.len() == 1));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(try_parse("(1 + 2").unwrap_err().typ, ParseErrTyp::ParenMismatch));
        assert!(matches!(try_parse("1 + 2)").unwrap_err().typ, ParseErrTyp::ParenMismatch));
        assert!(matches!(try_parse("  ").unwrap_err().typ, ParseErrTyp::Empty));
        assert!(matches!(try_parse("1 +").unwrap_err().typ, ParseErrTyp::MissingOperand));
        assert!(matches!(try_parse("1.2.3").unwrap_err().typ, ParseErrTyp::ParseNum(_)));
        assert!(matches!(
            try_parse("2 x").unwrap_err().typ,
            ParseErrTyp::Leftover { found: 2 }
        ));
        assert!(matches!(
            try_parse("x < 2").unwrap_err().typ,
            ParseErrTyp::LexErr(LexErrTyp::Unsupported(TokTyp::XLess))
        ));
    }

    #[test]
    fn one_argument_log_is_natural() {
        let expr = try_parse("log(x)").unwrap();
        assert!(matches!(expr, Expr::Call(ref name, ref args) if name.get() == "ln" && args.len() == 1));
        assert!(matches!(
            try_parse("log(x, 2)").unwrap(),
            Expr::Call(ref name, ref args) if name.get() == "log" && args.len() == 2
        ));
        assert!(matches!(
            try_parse("sin(1, 2)").unwrap_err().typ,
            ParseErrTyp::Arity { expected: 1, found: 2 }
        ));
        assert!(matches!(
            try_parse("log(1, 2, 3)").unwrap_err().typ,
            ParseErrTyp::Arity { expected: 2, found: 3 }
        ));
    }

    #[test]
    fn commas_only_separate_arguments() {
        for src in ["x,", "(x,)", ", x", "(1, 2)", "2*(x, 3)"] {
            let err = try_parse(src).unwrap_err();
            assert!(matches!(err.typ, ParseErrTyp::StrayComma), "{src}: {err}");
            assert_eq!(err.loc.get(), ",");
        }
        for src in ["log(x,)", "log(, x)", "sin()", "log(x 2, 3)"] {
            assert!(try_parse(src).is_err(), "{src}");
        }
        assert!(try_parse("log(-x, 2 + 1)").is_ok());
        assert!(try_parse("sin(log(x, 2))").is_ok());
    }

    #[test]
    fn errors_point_at_the_offending_token() {
        let err = try_parse("x + 1)").unwrap_err();
        assert_eq!(err.loc.start(), 5);
        assert_eq!(err.loc.get(), ")");
    }
}

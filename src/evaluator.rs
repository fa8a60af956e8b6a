// SPDX: CC0-1.0

//! The capability set the plotting core needs from an expression engine,
//! and the built-in engine implementing it.

use crate::{
    eval::{self, EvalErr, Idents, Program},
    expr::{DiffErr, Expr},
    lex::{Lexer, SubStr},
    parse::{self, ParseErr},
    stdlib::{self, X},
    Number,
};
use core::{cell::RefCell, fmt};
use std::sync::Arc;

/// Parses, simplifies, evaluates and differentiates expressions in the
/// single free variable `x`.
///
/// Evaluating outside an expression's domain is not an error: it yields a
/// non-finite [`Number`]. Errors are reserved for expressions that cannot be
/// evaluated at all (malformed input, unknown identifiers).
pub trait Evaluator {
    type Expr;
    type Error: fmt::Display + fmt::Debug;

    fn simplify(&self, src: &str) -> Result<Self::Expr, Self::Error>;

    fn evaluate(&self, expr: &Self::Expr, x: Number) -> Result<Number, Self::Error>;

    fn derivative(&self, expr: &Self::Expr, var: &str) -> Result<Self::Expr, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseErr),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalErr),
    #[error("{0}")]
    Diff(#[from] DiffErr),
}

impl ExprError {
    /// Where in the source the error was detected, if anywhere.
    pub fn loc(&self) -> Option<&SubStr> {
        match self {
            Self::Parse(err) => Some(&err.loc),
            Self::Eval(err) => err.loc(),
            Self::Diff(_) => None,
        }
    }
}

/// A simplified expression together with the program it compiles to.
#[derive(Clone, Debug)]
pub struct Compiled {
    src: Arc<String>,
    expr: Expr,
    prog: Program,
}

impl Compiled {
    fn new(src: Arc<String>, expr: Expr) -> Self {
        let prog = expr.compile();
        Self { src, expr, prog }
    }

    pub fn src(&self) -> &Arc<String> {
        &self.src
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn program(&self) -> &Program {
        &self.prog
    }
}

impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}

/// The built-in engine: shunting-yard parser, tree simplifier and symbolic
/// differentiator over the standard identifier table.
#[derive(Debug)]
pub struct Symbolic {
    idents: Idents,
    stack: RefCell<Vec<Number>>,
}

impl Symbolic {
    pub fn new() -> Self {
        Self::with_idents(stdlib::standard_idents())
    }

    pub fn with_idents(idents: Idents) -> Self {
        Self {
            idents,
            stack: RefCell::new(Vec::new()),
        }
    }

    pub fn idents(&self) -> &Idents {
        &self.idents
    }
}

impl Default for Symbolic {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for Symbolic {
    type Expr = Compiled;
    type Error = ExprError;

    fn simplify(&self, src: &str) -> Result<Compiled, ExprError> {
        let src = Arc::new(src.to_string());
        let expr = parse::parse(Lexer::new(&src), &self.idents)?.simplify(&self.idents);
        Ok(Compiled::new(src, expr))
    }

    fn evaluate(&self, expr: &Compiled, x: Number) -> Result<Number, ExprError> {
        let bindings = [(X, x)];
        let val = match self.stack.try_borrow_mut() {
            Ok(mut stack) => eval::eval(&expr.prog, &self.idents, &bindings, &mut stack),
            Err(_) => eval::eval(&expr.prog, &self.idents, &bindings, &mut Vec::new()),
        }?;
        Ok(val)
    }

    fn derivative(&self, expr: &Compiled, var: &str) -> Result<Compiled, ExprError> {
        let d = expr.expr.derivative(var)?.simplify(&self.idents);
        Ok(Compiled::new(Arc::clone(&expr.src), d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{eval::EvalErrTyp, parse::ParseErrTyp};
    use core::f64::consts;

    #[test]
    fn simplify_evaluate_differentiate() {
        let sym = Symbolic::new();
        let f = sym.simplify("x^2 - 4").unwrap();
        assert_eq!(sym.evaluate(&f, 3.0).unwrap(), 5.0);
        let df = sym.derivative(&f, X).unwrap();
        assert_eq!(df.to_string(), "2*x");
        assert_eq!(sym.evaluate(&df, 3.0).unwrap(), 6.0);
    }

    #[test]
    fn log_with_and_without_base() {
        let sym = Symbolic::new();
        let natural = sym.simplify("log(x)").unwrap();
        assert!((sym.evaluate(&natural, consts::E).unwrap() - 1.0).abs() < 1e-12);
        let d = sym.derivative(&natural, X).unwrap();
        assert!((sym.evaluate(&d, 4.0).unwrap() - 0.25).abs() < 1e-12);

        let binary = sym.simplify("log(x, 2)").unwrap();
        assert!((sym.evaluate(&binary, 8.0).unwrap() - 3.0).abs() < 1e-12);
        let d = sym.derivative(&binary, X).unwrap();
        let expected = 1.0 / (8.0 * consts::LN_2);
        assert!((sym.evaluate(&d, 8.0).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn domain_errors_are_values() {
        let sym = Symbolic::new();
        let f = sym.simplify("ln(x)").unwrap();
        assert!(sym.evaluate(&f, -1.0).unwrap().is_nan());
        let g = sym.simplify("1/x").unwrap();
        assert!(sym.evaluate(&g, 0.0).unwrap().is_infinite());
    }

    #[test]
    fn errors_keep_their_location() {
        let sym = Symbolic::new();
        let err = sym.simplify("x + (2").unwrap_err();
        assert!(matches!(err, ExprError::Parse(ParseErr { typ: ParseErrTyp::ParenMismatch, .. })));
        assert_eq!(err.loc().map(|loc| loc.start()), Some(4));

        let f = sym.simplify("2*y").unwrap();
        let err = sym.evaluate(&f, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ExprError::Eval(EvalErr {
                typ: EvalErrTyp::UndefinedIdent { .. },
                ..
            })
        ));
        assert_eq!(err.loc().map(SubStr::get), Some("y"));
        assert_eq!(err.to_string(), "evaluation error: undefined identifier 'y'");
    }
}

// SPDX: CC0-1.0

use crate::{eval::*, expr::Expr, Number};
use core::f64::consts;
use std::collections::HashMap; // assumes Number = f64

/// The free variable every plotted expression is a function of.
pub const X: &str = "x";

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    // operators
    for op in [
        OperatorTyp::Neg,
        OperatorTyp::Add,
        OperatorTyp::Sub,
        OperatorTyp::Mul,
        OperatorTyp::Div,
        OperatorTyp::Pow,
    ] {
        let (name, fun) = op.fun();
        ret.insert(name.into(), Ident::Fun(fun));
    }

    ret.insert("abs".into(), Ident::Fun(Fun::new(1, abs)));
    ret.insert("sqrt".into(), Ident::Fun(Fun::new(1, sqrt)));
    ret.insert("exp".into(), Ident::Fun(Fun::new(1, exp)));
    ret.insert("ln".into(), Ident::Fun(Fun::new(1, ln)));
    ret.insert("log".into(), Ident::Fun(Fun::new(2, log)));
    ret.insert("log10".into(), Ident::Fun(Fun::new(1, log10)));

    // trig
    ret.insert("sin".into(), Ident::Fun(Fun::new(1, sin)));
    ret.insert("cos".into(), Ident::Fun(Fun::new(1, cos)));
    ret.insert("tan".into(), Ident::Fun(Fun::new(1, tan)));
    ret.insert("asin".into(), Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("acos".into(), Ident::Fun(Fun::new(1, arccos)));
    ret.insert("atan".into(), Ident::Fun(Fun::new(1, arctan)));
    ret.insert("arcsin".into(), Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("arccos".into(), Ident::Fun(Fun::new(1, arccos)));
    ret.insert("arctan".into(), Ident::Fun(Fun::new(1, arctan)));
    ret.insert("sinh".into(), Ident::Fun(Fun::new(1, sinh)));
    ret.insert("cosh".into(), Ident::Fun(Fun::new(1, cosh)));
    ret.insert("tanh".into(), Ident::Fun(Fun::new(1, tanh)));

    ret.insert("pi".into(), Ident::Const(consts::PI));
    ret.insert("tau".into(), Ident::Const(consts::TAU));
    ret.insert("e".into(), Ident::Const(consts::E));

    ret.insert(X.into(), Ident::Var(None));
    ret
}

/// Function that a call to `name` with `argc` arguments stands for, when it
/// differs from the declared arity. `log(u)` is the natural logarithm.
pub fn short_form(name: &str, argc: usize) -> Option<&'static str> {
    match (name, argc) {
        ("log", 1) => Some("ln"),
        _ => None,
    }
}

/// Derivative of the unary function `name` evaluated at `u`, without the
/// trailing `u'` factor of the chain rule.
pub fn outer_derivative(name: &str, arg: &Expr) -> Option<Expr> {
    let u = || arg.clone();
    let one_minus_u2 = || Expr::sub(Expr::Num(1.0), Expr::pow(u(), Expr::Num(2.0)));
    let d = match name {
        "sin" => Expr::call("cos", vec![u()]),
        "cos" => Expr::neg(Expr::call("sin", vec![u()])),
        "tan" => Expr::div(
            Expr::Num(1.0),
            Expr::pow(Expr::call("cos", vec![u()]), Expr::Num(2.0)),
        ),
        "asin" | "arcsin" => Expr::div(Expr::Num(1.0), Expr::call("sqrt", vec![one_minus_u2()])),
        "acos" | "arccos" => Expr::neg(Expr::div(
            Expr::Num(1.0),
            Expr::call("sqrt", vec![one_minus_u2()]),
        )),
        "atan" | "arctan" => Expr::div(
            Expr::Num(1.0),
            Expr::add(Expr::Num(1.0), Expr::pow(u(), Expr::Num(2.0))),
        ),
        "sinh" => Expr::call("cosh", vec![u()]),
        "cosh" => Expr::call("sinh", vec![u()]),
        "tanh" => Expr::sub(
            Expr::Num(1.0),
            Expr::pow(Expr::call("tanh", vec![u()]), Expr::Num(2.0)),
        ),
        "exp" => Expr::call("exp", vec![u()]),
        "ln" => Expr::div(Expr::Num(1.0), u()),
        "log10" => Expr::div(
            Expr::Num(1.0),
            Expr::mul(u(), Expr::call("ln", vec![Expr::Num(10.0)])),
        ),
        "sqrt" => Expr::div(
            Expr::Num(1.0),
            Expr::mul(Expr::Num(2.0), Expr::call("sqrt", vec![u()])),
        ),
        // sign(u), undefined at 0 like the derivative itself
        "abs" => Expr::div(u(), Expr::call("abs", vec![u()])),
        _ => return None,
    };
    Some(d)
}

fn unary(args: &[Number], f: fn(Number) -> Number) -> Number {
    match *args {
        [x] => f(x),
        _ => Number::NAN,
    }
}

fn binary(args: &[Number], f: fn(Number, Number) -> Number) -> Number {
    match *args {
        [x, y] => f(x, y),
        _ => Number::NAN,
    }
}

pub fn neg(args: &[Number]) -> Number {
    unary(args, |x| -x)
}

pub fn add(args: &[Number]) -> Number {
    binary(args, |x, y| x + y)
}

pub fn sub(args: &[Number]) -> Number {
    binary(args, |x, y| x - y)
}

pub fn mul(args: &[Number]) -> Number {
    binary(args, |x, y| x * y)
}

pub fn div(args: &[Number]) -> Number {
    binary(args, |x, y| x / y)
}

pub fn pow(args: &[Number]) -> Number {
    binary(args, Number::powf)
}

pub fn abs(args: &[Number]) -> Number {
    unary(args, Number::abs)
}

pub fn sqrt(args: &[Number]) -> Number {
    unary(args, Number::sqrt)
}

pub fn exp(args: &[Number]) -> Number {
    unary(args, Number::exp)
}

pub fn ln(args: &[Number]) -> Number {
    unary(args, Number::ln)
}

pub fn log(args: &[Number]) -> Number {
    binary(args, Number::log)
}

pub fn log10(args: &[Number]) -> Number {
    unary(args, Number::log10)
}

pub fn sin(args: &[Number]) -> Number {
    unary(args, Number::sin)
}

pub fn cos(args: &[Number]) -> Number {
    unary(args, Number::cos)
}

pub fn tan(args: &[Number]) -> Number {
    unary(args, Number::tan)
}

pub fn arcsin(args: &[Number]) -> Number {
    unary(args, Number::asin)
}

pub fn arccos(args: &[Number]) -> Number {
    unary(args, Number::acos)
}

pub fn arctan(args: &[Number]) -> Number {
    unary(args, Number::atan)
}

pub fn sinh(args: &[Number]) -> Number {
    unary(args, Number::sinh)
}

pub fn cosh(args: &[Number]) -> Number {
    unary(args, Number::cosh)
}

pub fn tanh(args: &[Number]) -> Number {
    unary(args, Number::tanh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_arity_yields_nan() {
        assert!(sin(&[]).is_nan());
        assert!(add(&[1.0]).is_nan());
        assert_eq!(add(&[1.0, 2.0]), 3.0);
    }

    #[test]
    fn log_takes_value_then_base() {
        assert!((log(&[8.0, 2.0]) - 3.0).abs() < 1e-12);
        assert!(ln(&[-1.0]).is_nan());
    }

    #[test]
    fn short_forms_name_known_functions() {
        let idents = standard_idents();
        let target = short_form("log", 1).unwrap();
        assert!(matches!(idents.get(&IdentKey::from(target)), Some(Ident::Fun(fun)) if fun.arity == 1));
        assert_eq!(short_form("log", 2), None);
        assert_eq!(short_form("sin", 2), None);
    }

    #[test]
    fn every_chain_rule_names_a_known_function() {
        let idents = standard_idents();
        let u = Expr::Sym(X.into());
        for (key, ident) in &idents {
            if let Ident::Fun(fun) = ident {
                if fun.arity == 1 && key.get() != "neg" {
                    assert!(
                        outer_derivative(key.get(), &u).is_some(),
                        "no derivative for '{key}'"
                    );
                }
            }
        }
    }
}

// SPDX: CC0-1.0

//! Expression trees: simplification, symbolic differentiation and
//! compilation into postfix [`Program`]s.

use crate::{
    eval::{Associativity, Ident, IdentKey, Idents, Operation, OperationTyp, OperatorTyp, Program},
    stdlib, Number,
};
use core::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(Number),
    Sym(IdentKey),
    Neg(Box<Expr>),
    /// Binary operator application; never holds [`OperatorTyp::Neg`].
    Bin(OperatorTyp, Box<Expr>, Box<Expr>),
    Call(IdentKey, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffErr {
    Unsupported { name: IdentKey },
}

impl fmt::Display for DiffErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { name } => {
                write!(f, "cannot differentiate function '{name}'")
            }
        }
    }
}

impl std::error::Error for DiffErr {}

impl Expr {
    pub fn neg(a: Expr) -> Self {
        Self::Neg(Box::new(a))
    }

    pub fn bin(op: OperatorTyp, a: Expr, b: Expr) -> Self {
        match op {
            OperatorTyp::Neg => Self::neg(a),
            op => Self::Bin(op, Box::new(a), Box::new(b)),
        }
    }

    pub fn add(a: Expr, b: Expr) -> Self {
        Self::bin(OperatorTyp::Add, a, b)
    }

    pub fn sub(a: Expr, b: Expr) -> Self {
        Self::bin(OperatorTyp::Sub, a, b)
    }

    pub fn mul(a: Expr, b: Expr) -> Self {
        Self::bin(OperatorTyp::Mul, a, b)
    }

    pub fn div(a: Expr, b: Expr) -> Self {
        Self::bin(OperatorTyp::Div, a, b)
    }

    pub fn pow(a: Expr, b: Expr) -> Self {
        Self::bin(OperatorTyp::Pow, a, b)
    }

    pub fn call(name: &'static str, args: Vec<Expr>) -> Self {
        Self::Call(name.into(), args)
    }

    pub fn depends_on(&self, var: &str) -> bool {
        match self {
            Self::Num(_) => false,
            Self::Sym(key) => key.get() == var,
            Self::Neg(a) => a.depends_on(var),
            Self::Bin(_, a, b) => a.depends_on(var) || b.depends_on(var),
            Self::Call(_, args) => args.iter().any(|a| a.depends_on(var)),
        }
    }

    /// Folds constants and removes identity operations, bottom-up.
    ///
    /// Like most computer algebra systems this may widen the domain of the
    /// expression: `0*ln(x)` becomes `0` even where `ln(x)` is undefined.
    pub fn simplify(&self, idents: &Idents) -> Expr {
        match self {
            Self::Num(_) | Self::Sym(_) => self.clone(),
            Self::Neg(a) => negate(a.simplify(idents)),
            Self::Bin(op, a, b) => simplify_bin(*op, a.simplify(idents), b.simplify(idents)),
            Self::Call(name, args) => {
                let args: Vec<Expr> = args.iter().map(|a| a.simplify(idents)).collect();
                if let Some(Ident::Fun(fun)) = idents.get(name) {
                    let vals: Option<Vec<Number>> = args
                        .iter()
                        .map(|a| match a {
                            Self::Num(n) => Some(*n),
                            _ => None,
                        })
                        .collect();
                    if let Some(vals) = vals.filter(|vals| vals.len() == fun.arity) {
                        return Self::Num((fun.fun)(&vals));
                    }
                }
                Self::Call(name.clone(), args)
            }
        }
    }

    /// Symbolic derivative with respect to `var`. The result is not
    /// simplified.
    pub fn derivative(&self, var: &str) -> Result<Expr, DiffErr> {
        use OperatorTyp::*;

        let d = match self {
            Self::Num(_) => Self::Num(0.0),
            Self::Sym(key) => Self::Num(if key.get() == var { 1.0 } else { 0.0 }),
            Self::Neg(a) | Self::Bin(Neg, a, _) => Self::neg(a.derivative(var)?),
            Self::Bin(Add, a, b) => Self::add(a.derivative(var)?, b.derivative(var)?),
            Self::Bin(Sub, a, b) => Self::sub(a.derivative(var)?, b.derivative(var)?),
            Self::Bin(Mul, a, b) => Self::add(
                Self::mul(a.derivative(var)?, (**b).clone()),
                Self::mul((**a).clone(), b.derivative(var)?),
            ),
            Self::Bin(Div, a, b) => Self::div(
                Self::sub(
                    Self::mul(a.derivative(var)?, (**b).clone()),
                    Self::mul((**a).clone(), b.derivative(var)?),
                ),
                Self::pow((**b).clone(), Self::Num(2.0)),
            ),
            Self::Bin(Pow, a, b) => {
                let (a, b) = (&**a, &**b);
                if !b.depends_on(var) {
                    // power rule
                    Self::mul(
                        Self::mul(
                            b.clone(),
                            Self::pow(a.clone(), Self::sub(b.clone(), Self::Num(1.0))),
                        ),
                        a.derivative(var)?,
                    )
                } else if !a.depends_on(var) {
                    Self::mul(
                        Self::mul(self.clone(), Self::call("ln", vec![a.clone()])),
                        b.derivative(var)?,
                    )
                } else {
                    // d(a^b) = a^b * (b' ln(a) + b a'/a)
                    Self::mul(
                        self.clone(),
                        Self::add(
                            Self::mul(b.derivative(var)?, Self::call("ln", vec![a.clone()])),
                            Self::div(Self::mul(b.clone(), a.derivative(var)?), a.clone()),
                        ),
                    )
                }
            }
            Self::Call(name, args) => {
                if !args.iter().any(|a| a.depends_on(var)) {
                    return Ok(Self::Num(0.0));
                }
                match args.as_slice() {
                    [u, base] if name.get() == "log" => Self::div(
                        Self::call("ln", vec![u.clone()]),
                        Self::call("ln", vec![base.clone()]),
                    )
                    .derivative(var)?,
                    [u] => match stdlib::outer_derivative(name.get(), u) {
                        Some(outer) => Self::mul(outer, u.derivative(var)?),
                        None => return Err(DiffErr::Unsupported { name: name.clone() }),
                    },
                    _ => return Err(DiffErr::Unsupported { name: name.clone() }),
                }
            }
        };
        Ok(d)
    }

    pub fn compile(&self) -> Program {
        fn emit(expr: &Expr, out: &mut Vec<Operation>) {
            let op = |typ| Operation { typ, loc: None };
            match expr {
                Expr::Num(n) => out.push(op(OperationTyp::Val(*n))),
                Expr::Sym(key) => out.push(Operation::ident(key.clone())),
                Expr::Neg(a) => {
                    emit(a, out);
                    out.push(op(OperationTyp::Operator(OperatorTyp::Neg)));
                }
                Expr::Bin(typ, a, b) => {
                    emit(a, out);
                    emit(b, out);
                    out.push(op(OperationTyp::Operator(*typ)));
                }
                Expr::Call(name, args) => {
                    for a in args {
                        emit(a, out);
                    }
                    out.push(Operation::ident(name.clone()));
                }
            }
        }

        let mut ops = Vec::new();
        emit(self, &mut ops);
        Program::new(ops)
    }

    fn precedence(&self) -> i8 {
        match self {
            Self::Num(n) if n.is_sign_negative() => OperatorTyp::Neg.precedence(),
            Self::Num(_) | Self::Sym(_) | Self::Call(..) => i8::MAX,
            Self::Neg(_) => OperatorTyp::Neg.precedence(),
            Self::Bin(op, ..) => op.precedence(),
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: i8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

fn negate(a: Expr) -> Expr {
    match a {
        Expr::Num(n) => Expr::Num(-n),
        Expr::Neg(inner) => *inner,
        a => Expr::neg(a),
    }
}

fn is_num(e: &Expr, val: Number) -> bool {
    matches!(e, Expr::Num(n) if *n == val)
}

fn simplify_bin(op: OperatorTyp, a: Expr, b: Expr) -> Expr {
    use OperatorTyp::*;

    if let (Expr::Num(x), Expr::Num(y)) = (&a, &b) {
        return Expr::Num(op.apply(&[*x, *y]));
    }

    match op {
        Neg => negate(a),
        Add if is_num(&a, 0.0) => b,
        Add | Sub if is_num(&b, 0.0) => a,
        Sub if is_num(&a, 0.0) => negate(b),
        Sub if a == b => Expr::Num(0.0),
        Add | Sub => match b {
            // a + -b => a - b, a - -b => a + b
            Expr::Neg(b) => Expr::Bin(if op == Add { Sub } else { Add }, Box::new(a), b),
            b => Expr::Bin(op, Box::new(a), Box::new(b)),
        },
        Mul if is_num(&a, 0.0) || is_num(&b, 0.0) => Expr::Num(0.0),
        Mul if is_num(&a, 1.0) => b,
        Mul if is_num(&b, 1.0) => a,
        Mul if is_num(&a, -1.0) => negate(b),
        Mul if is_num(&b, -1.0) => negate(a),
        // keep numeric coefficients in front so they can merge
        Mul if matches!(b, Expr::Num(_)) => simplify_bin(Mul, b, a),
        Mul => match (a, b) {
            (Expr::Num(c), Expr::Bin(Mul, inner, rest)) => match *inner {
                Expr::Num(d) => simplify_bin(Mul, Expr::Num(c * d), *rest),
                inner => Expr::mul(Expr::Num(c), Expr::Bin(Mul, Box::new(inner), rest)),
            },
            (a, b) => Expr::Bin(Mul, Box::new(a), Box::new(b)),
        },
        Div if is_num(&b, 1.0) => a,
        Div if is_num(&a, 0.0) => Expr::Num(0.0),
        Pow if is_num(&b, 0.0) => Expr::Num(1.0),
        Pow if is_num(&b, 1.0) => a,
        Div | Pow => Expr::Bin(op, Box::new(a), Box::new(b)),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Sym(key) => write!(f, "{key}"),
            Self::Neg(a) => {
                f.write_str("-")?;
                a.fmt_operand(f, OperatorTyp::Neg.precedence() + 1)
            }
            Self::Bin(op, a, b) => {
                let p = op.precedence();
                let (left, right) = match op.associativity() {
                    Associativity::Left => (p, p + 1),
                    Associativity::Right => (p + 1, p),
                };
                a.fmt_operand(f, left)?;
                match op {
                    OperatorTyp::Add | OperatorTyp::Sub => write!(f, " {} ", op.symbol())?,
                    _ => f.write_str(op.symbol())?,
                }
                b.fmt_operand(f, right)
            }
            Self::Call(name, args) => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
        }
    }
}

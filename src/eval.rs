// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, Number};
use core::fmt;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Neg => 4,
            Self::Pow => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Pow => Right,
        }
    }

    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg)
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Neg | Self::Sub => "-",
            Self::Add => "+",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::new(1, stdlib::neg)),
            Self::Add => ("add", Fun::new(2, stdlib::add)),
            Self::Sub => ("sub", Fun::new(2, stdlib::sub)),
            Self::Mul => ("mul", Fun::new(2, stdlib::mul)),
            Self::Div => ("div", Fun::new(2, stdlib::div)),
            Self::Pow => ("pow", Fun::new(2, stdlib::pow)),
        }
    }

    pub fn apply(&self, args: &[Number]) -> Number {
        (self.fun().1.fun)(args)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    Ident(IdentKey),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: Option<SubStr>,
}

impl Operation {
    pub fn ident(key: IdentKey) -> Self {
        let loc = match key {
            IdentKey::Arc(ref s) => Some(s.clone()),
            IdentKey::Static(_) => None,
        };
        Self {
            typ: OperationTyp::Ident(key),
            loc,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().0),
            OperationTyp::Ident(key) => write!(f, "load '{key}'"),
        }
    }
}

#[derive(Debug)]
pub enum EvalErrTyp {
    Empty,
    MissingArgs {
        name: IdentKey,
        arity: usize,
        found: usize,
    },
    StackMismatch {
        expected: usize,
        found: usize,
    },
    UndefinedIdent {
        name: IdentKey,
    },
    NullVar {
        name: IdentKey,
    },
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrTyp::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} value{s} on the stack but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),

            EvalErrTyp::UndefinedIdent { name } => write!(f, "undefined identifier '{name}'"),

            EvalErrTyp::NullVar { name } => write!(
                f,
                "variable '{name}' is declared but its value is not defined"
            ),
        }
    }
}

impl std::error::Error for EvalErr {}

#[derive(Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

impl EvalErr {
    pub fn loc(&self) -> Option<&SubStr> {
        self.op.as_ref().and_then(|op| op.loc.as_ref())
    }
}

#[derive(Debug)]
pub struct Fun {
    pub arity: usize,
    pub fun: fn(&[Number]) -> Number,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> Number) -> Self {
        Self { arity, fun }
    }
}

#[derive(Debug)]
pub enum Ident {
    Var(Option<Number>),
    Const(Number),
    Fun(Fun),
}

impl Ident {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Var(_) => "variable",
            Self::Const(_) => "constant",
            Self::Fun(_) => "function",
        }
    }
}

#[derive(Clone, Debug, Eq)]
pub enum IdentKey {
    Arc(SubStr),
    Static(&'static str),
}

impl PartialEq for IdentKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl core::hash::Hash for IdentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl IdentKey {
    pub fn get(&self) -> &str {
        match self {
            Self::Arc(s) => s.get(),
            Self::Static(s) => s,
        }
    }
}

impl fmt::Display for IdentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl From<SubStr> for IdentKey {
    fn from(s: SubStr) -> Self {
        Self::Arc(s)
    }
}

impl From<&'static str> for IdentKey {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

pub type Idents = HashMap<IdentKey, Ident>;

/// Values bound to variables for a single evaluation, looked up before the
/// identifier table.
pub type Bindings<'a> = &'a [(&'a str, Number)];

/// Postfix form of an expression, ready for repeated evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }
}

pub fn eval(
    prog: &Program,
    idents: &Idents,
    bindings: Bindings<'_>,
    stack: &mut Vec<Number>,
) -> Result<Number, EvalErr> {
    fn call(
        stack: &mut Vec<Number>,
        op: &Operation,
        name: impl Into<IdentKey>,
        fun: &Fun,
    ) -> Result<Number, EvalErr> {
        let len = stack.len();
        if len < fun.arity {
            return Err(EvalErr {
                typ: EvalErrTyp::MissingArgs {
                    name: name.into(),
                    arity: fun.arity,
                    found: len,
                },
                op: Some(op.clone()),
            });
        }
        // stack: ...a, b, c, d
        //                 ^^^^ args if arity is 2
        let val = (fun.fun)(&stack[len - fun.arity..]);
        stack.truncate(len - fun.arity);
        Ok(val)
    }

    if prog.ops.is_empty() {
        return Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        });
    }

    stack.clear();

    for op in prog.ops() {
        let val = match &op.typ {
            OperationTyp::Operator(typ) => {
                let (name, fun) = typ.fun();
                call(stack, op, name, &fun)?
            }

            OperationTyp::Val(num) => *num,

            OperationTyp::Ident(key) => {
                if let Some(&(_, val)) = bindings.iter().find(|(name, _)| *name == key.get()) {
                    val
                } else {
                    match idents.get(key) {
                        Some(Ident::Var(Some(val)) | Ident::Const(val)) => *val,
                        Some(Ident::Var(None)) => {
                            return Err(EvalErr {
                                typ: EvalErrTyp::NullVar { name: key.clone() },
                                op: Some(op.clone()),
                            });
                        }
                        Some(Ident::Fun(fun)) => call(stack, op, key.clone(), fun)?,
                        None => {
                            return Err(EvalErr {
                                typ: EvalErrTyp::UndefinedIdent { name: key.clone() },
                                op: Some(op.clone()),
                            });
                        }
                    }
                }
            }
        };
        stack.push(val);
    }

    if stack.len() != 1 {
        return Err(EvalErr {
            typ: EvalErrTyp::StackMismatch {
                expected: 1,
                found: stack.len(),
            },
            op: None,
        });
    }
    Ok(stack[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::{standard_idents, X};

    fn op(typ: OperationTyp) -> Operation {
        Operation { typ, loc: None }
    }

    #[test]
    fn evaluates_postfix_with_bindings() {
        // sin(x) * 2 + pi
        let prog = Program::new(vec![
            Operation::ident(X.into()),
            Operation::ident("sin".into()),
            op(OperationTyp::Val(2.0)),
            op(OperationTyp::Operator(OperatorTyp::Mul)),
            Operation::ident("pi".into()),
            op(OperationTyp::Operator(OperatorTyp::Add)),
        ]);
        let idents = standard_idents();
        let mut stack = Vec::new();
        let x = 0.5;
        let val = eval(&prog, &idents, &[(X, x)], &mut stack).unwrap();
        assert!((val - (x.sin() * 2.0 + core::f64::consts::PI)).abs() < 1e-12);
    }

    #[test]
    fn unbound_variable_is_reported() {
        let prog = Program::new(vec![Operation::ident(X.into())]);
        let err = eval(&prog, &standard_idents(), &[], &mut Vec::new()).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::NullVar { .. }));
    }

    #[test]
    fn undefined_identifier_is_reported() {
        let prog = Program::new(vec![Operation::ident("foo".into())]);
        let err = eval(&prog, &standard_idents(), &[], &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "undefined identifier 'foo'");
    }

    #[test]
    fn stack_must_end_with_one_value() {
        let prog = Program::new(vec![
            op(OperationTyp::Val(1.0)),
            op(OperationTyp::Val(2.0)),
        ]);
        let err = eval(&prog, &standard_idents(), &[], &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::StackMismatch {
                expected: 1,
                found: 2
            }
        ));

        let err = eval(&Program::new(Vec::new()), &standard_idents(), &[], &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::Empty));
    }

    #[test]
    fn function_without_arguments_is_reported() {
        let prog = Program::new(vec![Operation::ident("sin".into())]);
        let err = eval(&prog, &standard_idents(), &[], &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::MissingArgs {
                arity: 1,
                found: 0,
                ..
            }
        ));
    }

    #[test]
    fn nan_is_a_value_not_an_error() {
        let prog = Program::new(vec![
            op(OperationTyp::Val(0.0)),
            op(OperationTyp::Val(0.0)),
            op(OperationTyp::Operator(OperatorTyp::Div)),
        ]);
        let val = eval(&prog, &standard_idents(), &[], &mut Vec::new()).unwrap();
        assert!(val.is_nan());
    }
}

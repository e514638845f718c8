//! # Expression tree
//!
//! [`Expr`] is the parsed form of a chart formula. It keeps the usual
//! expression tree layout: variables and constants as leaves, boxed children
//! for the arithmetic operators, and a `Call` node for the allowed math
//! functions. Function names are resolved while parsing, so a `Call` can only
//! ever hold a function from the registry.
//!
//! Evaluation walks the tree recursively against a [`Scope`]. Symbol lookup
//! checks the scope first and the evaluator constants second.

use std::fmt;

use crate::chart_math::scope::Scope;
use crate::expression::error::EvalError;
use crate::expression::functions::MathFunction;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// symbol resolved from the scope or the constants at evaluation time
    Var(String),
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// modulo, result takes the sign of the divisor
    Mod(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Call(MathFunction, Vec<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Mod(lhs, rhs) => write!(f, "({} % {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Neg(expr) => write!(f, "-{}", expr),
            Expr::Call(func, args) => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Expr {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// names of all symbols in the tree, left to right, duplicates kept
    pub fn symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut Vec<String>) {
        match self {
            Expr::Var(name) => out.push(name.clone()),
            Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Mod(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            Expr::Neg(expr) => expr.collect_symbols(out),
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_symbols(out)),
        }
    }

    /// Evaluates the tree. `constant` resolves the symbols the scope does not bind.
    pub fn eval<C>(&self, scope: &Scope, constant: &C) -> Result<f64, EvalError>
    where
        C: Fn(&str) -> Result<f64, EvalError>,
    {
        match self {
            Expr::Var(name) => match scope.slot(name) {
                Some(Some(val)) => Ok(val),
                Some(None) => Err(EvalError::MissingValue(name.clone())),
                None => constant(name),
            },
            Expr::Const(val) => Ok(*val),
            Expr::Add(lhs, rhs) => Ok(lhs.eval(scope, constant)? + rhs.eval(scope, constant)?),
            Expr::Sub(lhs, rhs) => Ok(lhs.eval(scope, constant)? - rhs.eval(scope, constant)?),
            Expr::Mul(lhs, rhs) => Ok(lhs.eval(scope, constant)? * rhs.eval(scope, constant)?),
            Expr::Div(lhs, rhs) => Ok(lhs.eval(scope, constant)? / rhs.eval(scope, constant)?),
            Expr::Mod(lhs, rhs) => Ok(modulo(
                lhs.eval(scope, constant)?,
                rhs.eval(scope, constant)?,
            )),
            Expr::Pow(base, exp) => Ok(base.eval(scope, constant)?.powf(exp.eval(scope, constant)?)),
            Expr::Neg(expr) => Ok(-expr.eval(scope, constant)?),
            Expr::Call(func, args) => {
                let values = args
                    .iter()
                    .map(|a| a.eval(scope, constant))
                    .collect::<Result<Vec<f64>, EvalError>>()?;
                func.apply(&values)
            }
        }
    }
}

// x mod 0 is x, otherwise the result has the sign of y
fn modulo(x: f64, y: f64) -> f64 {
    if y == 0.0 {
        x
    } else {
        x - y * (x / y).floor()
    }
}

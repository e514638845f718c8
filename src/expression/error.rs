use thiserror::Error;

use crate::expression::functions::DisabledCapability;

/// Errors raised while turning a formula string into an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("unexpected token '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("undefined function '{0}'")]
    UnknownFunction(String),
    #[error("'{0}' is not a function")]
    NotAFunction(String),
    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error(transparent)]
    Disabled(#[from] DisabledCapability),
}

/// Errors raised while evaluating an already parsed expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(String),
    #[error("no value for '{0}' at this datapoint")]
    MissingValue(String),
    #[error("undefined function '{0}'")]
    UnknownFunction(String),
    #[error("'{0}' is not a function")]
    NotAFunction(String),
    #[error("function '{0}' used as a value")]
    FunctionAsValue(String),
    #[error("wrong number of arguments for {function}: expected {expected}, found {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("invalid argument for {function}: {reason}")]
    InvalidArgument {
        function: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Disabled(#[from] DisabledCapability),
}

/// Top level error of the chart calculation API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartMathError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("result is not a finite number: {0}")]
    NonFinite(f64),
    #[error("No data found for variable {variables}")]
    NoSeriesData { variables: String },
}

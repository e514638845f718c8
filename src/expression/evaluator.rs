//! # Restricted evaluator
//!
//! A formula is parsed and evaluated against one [`Namespace`]: a table that
//! maps every name a formula can reach to what it means. The table is built
//! once, when the evaluator is constructed, in three steps:
//!
//! 1. the allowed math functions from the registry
//! 2. the named constants (`pi`, `e`, ...), unless switched off in the config
//! 3. the disabled capabilities (`import`, `createUnit`, `evaluate`, `parse`,
//!    `simplify`, `derivative`), inserted last so they override whatever
//!    was registered under the same name
//!
//! Parser and evaluator read the same table, so a capability that is disabled
//! cannot be reached through either of them. Nothing outside the table can be
//! called at all.
//!
//! [`RestrictedEvaluator::global`] hands out a lazily built, process-wide
//! instance that is never mutated after construction and can be shared across
//! threads. Tests and embedders that need different settings build their own
//! instance with [`RestrictedEvaluator::with_config`].

use std::collections::HashMap;
use std::sync::LazyLock;

use log::trace;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::chart_math::scope::Scope;
use crate::expression::error::{ChartMathError, EvalError, ParseError};
use crate::expression::expr::Expr;
use crate::expression::functions::{DisabledCapability, MathFunction};
use crate::expression::parse_expr::Parser;

static GLOBAL_EVALUATOR: LazyLock<RestrictedEvaluator> = LazyLock::new(RestrictedEvaluator::new);

/// named constants visible to formulas when `constants` is enabled
pub const CONSTANTS: [(&str, f64); 6] = [
    ("pi", std::f64::consts::PI),
    ("PI", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    ("E", std::f64::consts::E),
    ("tau", std::f64::consts::TAU),
    ("phi", 1.618_033_988_749_895),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// accept `2x`, `2(a + b)` and `(a)(b)` as products
    pub implicit_multiplication: bool,
    /// expose the named constants
    pub constants: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            implicit_multiplication: true,
            constants: true,
        }
    }
}

/// what a name in the namespace is bound to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    Function(MathFunction),
    Constant(f64),
    Disabled(DisabledCapability),
}

#[derive(Debug, Clone, Default)]
pub struct Namespace {
    bindings: HashMap<&'static str, Binding>,
}

impl Namespace {
    pub fn new(config: &EvaluatorConfig) -> Self {
        let mut namespace = Namespace::default();
        for function in MathFunction::iter() {
            namespace.bindings.insert(function.name(), Binding::Function(function));
        }
        if config.constants {
            for (name, value) in CONSTANTS {
                namespace.bindings.insert(name, Binding::Constant(value));
            }
        }
        namespace.apply_restrictions();
        namespace
    }

    /// Overrides every disabled capability with a binding that raises on use.
    /// Applying it more than once leaves the table unchanged.
    pub fn apply_restrictions(&mut self) {
        for capability in DisabledCapability::iter() {
            self.bindings
                .insert(capability.name(), Binding::Disabled(capability));
        }
    }

    pub fn get(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// resolves a name used in call position while parsing
    pub fn resolve_call(&self, name: &str) -> Result<MathFunction, ParseError> {
        match self.get(name) {
            Some(Binding::Function(function)) => Ok(function),
            Some(Binding::Disabled(capability)) => Err(ParseError::Disabled(capability)),
            Some(Binding::Constant(_)) => Err(ParseError::NotAFunction(name.to_string())),
            None => Err(ParseError::UnknownFunction(name.to_string())),
        }
    }

    /// resolves a symbol the scope does not bind
    pub fn resolve_symbol(&self, name: &str) -> Result<f64, EvalError> {
        match self.get(name) {
            Some(Binding::Constant(value)) => Ok(value),
            Some(Binding::Function(function)) => {
                Err(EvalError::FunctionAsValue(function.name().to_string()))
            }
            Some(Binding::Disabled(capability)) => Err(EvalError::Disabled(capability)),
            None => Err(EvalError::UndefinedSymbol(name.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestrictedEvaluator {
    namespace: Namespace,
    config: EvaluatorConfig,
}

impl Default for RestrictedEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RestrictedEvaluator {
    pub fn new() -> Self {
        Self::with_config(EvaluatorConfig::default())
    }

    pub fn with_config(config: EvaluatorConfig) -> Self {
        let namespace = Namespace::new(&config);
        trace!("restricted namespace built with {} bindings", namespace.len());
        Self { namespace, config }
    }

    /// the process-wide instance, built on first use
    pub fn global() -> &'static RestrictedEvaluator {
        &GLOBAL_EVALUATOR
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Parses without evaluating; no function is executed.
    pub fn parse(&self, input: &str) -> Result<Expr, ParseError> {
        Parser::new(input, &self.namespace, self.config.implicit_multiplication)?.parse()
    }

    pub fn evaluate_expr(&self, expr: &Expr, scope: &Scope) -> Result<f64, EvalError> {
        expr.eval(scope, &|name: &str| self.namespace.resolve_symbol(name))
    }

    /// parse + evaluate; the value is returned as is, finite or not
    pub fn evaluate(&self, input: &str, scope: &Scope) -> Result<f64, ChartMathError> {
        let expr = self.parse(input)?;
        Ok(self.evaluate_expr(&expr, scope)?)
    }

    /// Calls a namespace entry directly, bypassing the parser.
    pub fn invoke(&self, name: &str, args: &[f64]) -> Result<f64, EvalError> {
        match self.namespace.get(name) {
            Some(Binding::Function(function)) => function.apply(args),
            Some(Binding::Disabled(capability)) => Err(EvalError::Disabled(capability)),
            Some(Binding::Constant(_)) => Err(EvalError::NotAFunction(name.to_string())),
            None => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }
}

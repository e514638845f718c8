//! # Function registry
//!
//! Formulas authored in the chart configuration may only call the functions
//! listed in [`MathFunction`]. The registry is the single source of truth for
//! two things at once:
//! - which identifiers the parser accepts in call position
//! - which identifiers the variable extractor must *not* treat as variables
//!
//! Changing the list changes what counts as a variable everywhere, so the
//! order and spelling are pinned by tests.
//!
//! [`DisabledCapability`] names the features of a general purpose math
//! language that are deliberately switched off. They are registered in the
//! evaluator namespace so that invoking them raises a descriptive error
//! instead of silently falling through to "unknown function".

use std::fmt;

use strum::IntoEnumIterator;
use strum_macros::{EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::expression::error::EvalError;

/// Functions a formula may call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr, EnumCount,
)]
pub enum MathFunction {
    #[strum(serialize = "abs")]
    Abs,
    #[strum(serialize = "cbrt")]
    Cbrt,
    /// x^3
    #[strum(serialize = "cube")]
    Cube,
    #[strum(serialize = "sqrt")]
    Sqrt,
    /// x^2
    #[strum(serialize = "square")]
    Square,
    #[strum(serialize = "pow")]
    Pow,
    #[strum(serialize = "ceil")]
    Ceil,
    #[strum(serialize = "round")]
    Round,
    #[strum(serialize = "floor")]
    Floor,
    /// rounds toward zero
    #[strum(serialize = "fix")]
    Fix,
    #[strum(serialize = "exp")]
    Exp,
    /// natural logarithm, or logarithm to the base given as second argument
    #[strum(serialize = "log")]
    Log,
    #[strum(serialize = "log2")]
    Log2,
    #[strum(serialize = "log10")]
    Log10,
    #[strum(serialize = "sign")]
    Sign,
    #[strum(serialize = "sin")]
    Sin,
    #[strum(serialize = "cos")]
    Cos,
    #[strum(serialize = "tan")]
    Tan,
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// returns all function names a formula may use, in registry order
pub fn allowed_function_names() -> Vec<&'static str> {
    MathFunction::iter().map(MathFunction::name).collect()
}

/// exact, case sensitive membership test against the registry
pub fn is_allowed_function(name: &str) -> bool {
    MathFunction::iter().any(|f| f.name() == name)
}

impl MathFunction {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// minimal and maximal number of arguments
    pub fn arity(self) -> (usize, usize) {
        match self {
            MathFunction::Pow => (2, 2),
            MathFunction::Ceil
            | MathFunction::Round
            | MathFunction::Floor
            | MathFunction::Fix
            | MathFunction::Log => (1, 2),
            _ => (1, 1),
        }
    }

    fn arity_text(self) -> &'static str {
        match self.arity() {
            (2, 2) => "2",
            (1, 2) => "1 or 2",
            _ => "1",
        }
    }

    /// Applies the function to already evaluated arguments.
    ///
    /// Arguments outside the real domain of a function (`sqrt(-1)`, `log(0)`)
    /// produce `NaN`/`inf` rather than an error; deciding what to do with a
    /// non-finite result is left to the caller.
    pub fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        let (min, max) = self.arity();
        if args.len() < min || args.len() > max {
            return Err(EvalError::Arity {
                function: self.name(),
                expected: self.arity_text(),
                found: args.len(),
            });
        }
        let x = args[0];
        let second = args.get(1).copied();
        let res = match self {
            MathFunction::Abs => x.abs(),
            MathFunction::Cbrt => x.cbrt(),
            MathFunction::Cube => x * x * x,
            MathFunction::Sqrt => x.sqrt(),
            MathFunction::Square => x * x,
            MathFunction::Pow => x.powf(args[1]),
            MathFunction::Ceil => round_with_decimals(self, x, second, f64::ceil)?,
            MathFunction::Round => round_with_decimals(self, x, second, f64::round)?,
            MathFunction::Floor => round_with_decimals(self, x, second, f64::floor)?,
            MathFunction::Fix => round_with_decimals(self, x, second, f64::trunc)?,
            MathFunction::Exp => x.exp(),
            MathFunction::Log => match second {
                Some(base) => x.ln() / base.ln(),
                None => x.ln(),
            },
            MathFunction::Log2 => x.log2(),
            MathFunction::Log10 => x.log10(),
            MathFunction::Sign => sign(x),
            MathFunction::Sin => x.sin(),
            MathFunction::Cos => x.cos(),
            MathFunction::Tan => x.tan(),
        };
        Ok(res)
    }
}

// f64::signum maps 0.0 to 1.0
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

fn round_with_decimals(
    function: MathFunction,
    x: f64,
    decimals: Option<f64>,
    op: fn(f64) -> f64,
) -> Result<f64, EvalError> {
    let Some(n) = decimals else {
        return Ok(op(x));
    };
    if n.fract() != 0.0 || !(0.0..=15.0).contains(&n) {
        return Err(EvalError::InvalidArgument {
            function: function.name(),
            reason: format!("number of decimals must be an integer between 0 and 15, got {}", n),
        });
    }
    let factor = 10f64.powi(n as i32);
    let scaled = x * factor;
    // too large to carry any fractional digits
    if !scaled.is_finite() {
        return Ok(x);
    }
    Ok(op(scaled) / factor)
}

/// Capabilities of a general purpose math language that formulas must never reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
pub enum DisabledCapability {
    #[strum(serialize = "import")]
    Import,
    #[strum(serialize = "createUnit")]
    CreateUnit,
    #[strum(serialize = "evaluate")]
    Evaluate,
    #[strum(serialize = "parse")]
    Parse,
    #[strum(serialize = "simplify")]
    Simplify,
    #[strum(serialize = "derivative")]
    Derivative,
}

impl DisabledCapability {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for DisabledCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {} is disabled", self.name())
    }
}

impl std::error::Error for DisabledCapability {}

use std::borrow::Cow;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::chart_math::scope::Scope;
use crate::chart_math::variables::variable_matches;
use crate::expression::error::ChartMathError;
use crate::expression::evaluator::RestrictedEvaluator;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n|\r").expect("line break pattern is valid"));

/// formulas are single line for the evaluator: every line break becomes one space
pub fn remove_line_breaks(expression: &str) -> Cow<'_, str> {
    LINE_BREAK.replace_all(expression, " ")
}

/// Like [`calculate`], but reports why no number could be produced.
pub fn try_calculate(expression: &str, scope: &Scope) -> Result<f64, ChartMathError> {
    let expression = remove_line_breaks(expression);
    let result = RestrictedEvaluator::global().evaluate(&expression, scope)?;
    if result.is_finite() {
        Ok(result)
    } else {
        Err(ChartMathError::NonFinite(result))
    }
}

/// Calculates the result of the expression using the given variable scope.
///
/// Returns `None` whenever no finite number comes out: parse errors, unknown
/// variables, disabled functions, division by zero, `NaN`. Nothing is raised
/// to the caller, a broken formula just leaves a gap in the chart.
pub fn calculate(expression: &str, scope: &Scope) -> Option<f64> {
    match try_calculate(expression, scope) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("calculation of '{}' gave no value: {}", expression, err);
            None
        }
    }
}

/// Checks if the expression can be parsed.
///
/// Every variable occurrence is replaced by `0` and the result is parsed, not
/// evaluated. Replacement happens at the positions the extractor matched, so
/// a name that is part of a longer name is never touched. A name written in
/// call position (`name(`) is left in place: the parser then decides whether
/// it is an allowed function, and disabled or unknown functions make the
/// check fail.
pub fn can_be_parsed(expression: &str) -> bool {
    let substituted = substitute_variables(expression, "0");
    match RestrictedEvaluator::global().parse(&substituted) {
        Ok(_) => true,
        Err(err) => {
            debug!("'{}' cannot be parsed: {}", expression, err);
            false
        }
    }
}

fn substitute_variables(expression: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut cursor = 0;
    for m in variable_matches(expression) {
        if is_call_position(&expression[m.span.end..]) {
            continue;
        }
        out.push_str(&expression[cursor..m.span.start]);
        out.push_str(replacement);
        cursor = m.span.end;
    }
    out.push_str(&expression[cursor..]);
    out
}

fn is_call_position(rest: &str) -> bool {
    rest.trim_start().starts_with('(')
}

/// Takes the given expression and adds the suffix `_<agg>` to each variable.
///
/// `aggregations` is ordered like the variables appear in the expression.
/// The text between variables is copied verbatim. When there are fewer
/// aggregations than variables the remaining variables are left as they are.
pub fn add_aggs_to_expression<A: AsRef<str>>(expression: &str, aggregations: &[A]) -> String {
    let mut out = String::with_capacity(expression.len() + 8 * aggregations.len());
    let mut cursor = 0;
    for (m, agg) in variable_matches(expression).into_iter().zip(aggregations) {
        out.push_str(&expression[cursor..m.span.start]);
        out.push_str(m.name);
        out.push('_');
        out.push_str(agg.as_ref());
        cursor = m.span.end;
    }
    out.push_str(&expression[cursor..]);
    out
}

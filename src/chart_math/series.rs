//! # Derived series
//!
//! A calculated chart series is produced by evaluating one formula at every
//! timestamp of the measured variables it references. The series of the
//! first variable (with its aggregation) defines the timeline; all other
//! series are read at the same index.
//!
//! The formula is rewritten once (`a + b` to `a_avg + b_sum`) and parsed once,
//! then evaluated per datapoint. A datapoint where any referenced value is
//! `null` stays `null` in the result, as does every datapoint when the formula
//! does not parse.

use itertools::Itertools;
use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::chart_math::calculation::{add_aggs_to_expression, remove_line_breaks};
use crate::chart_math::scope::{DataPoint, Series, SeriesTable, get_scope};
use crate::chart_math::variables::get_variable_names;
use crate::expression::error::ChartMathError;
use crate::expression::evaluator::RestrictedEvaluator;
use crate::expression::expr::Expr;

struct SeriesTask<'a, A> {
    names: Vec<String>,
    aggregations: &'a [A],
    variable_values: &'a SeriesTable,
    timeline: &'a Series,
    compiled: Option<Expr>,
    evaluator: &'a RestrictedEvaluator,
}

impl<'a, A: AsRef<str>> SeriesTask<'a, A> {
    fn prepare(
        evaluator: &'a RestrictedEvaluator,
        expression: &str,
        aggregations: &'a [A],
        variable_values: &'a SeriesTable,
    ) -> Result<Self, ChartMathError> {
        let names = get_variable_names(expression);
        let first_key = names
            .first()
            .zip(aggregations.first())
            .map(|(name, agg)| format!("{}_{}", name, agg.as_ref()));
        let timeline = first_key
            .and_then(|key| variable_values.get(&key))
            .ok_or_else(|| ChartMathError::NoSeriesData {
                variables: names.iter().join(", "),
            })?;

        let rewritten = add_aggs_to_expression(expression, aggregations);
        let compiled = match evaluator.parse(&remove_line_breaks(&rewritten)) {
            Ok(expr) => Some(expr),
            Err(err) => {
                warn!("formula '{}' cannot be parsed, series stays empty: {}", rewritten, err);
                None
            }
        };
        debug!(
            "calculating '{}' over {} datapoints",
            rewritten,
            timeline.len()
        );
        Ok(Self {
            names,
            aggregations,
            variable_values,
            timeline,
            compiled,
            evaluator,
        })
    }

    fn point(&self, index: usize) -> DataPoint {
        let timestamp = self.timeline[index].timestamp();
        let Some(expr) = &self.compiled else {
            return DataPoint(timestamp, None);
        };
        let scope = get_scope(index, &self.names, self.aggregations, self.variable_values);
        if scope.has_missing() {
            trace!(
                "no value for {} at {}",
                scope.iter().filter(|(_, v)| v.is_none()).map(|(k, _)| k).join(", "),
                timestamp
            );
            return DataPoint(timestamp, None);
        }
        let value = self
            .evaluator
            .evaluate_expr(expr, &scope)
            .ok()
            .filter(|v| v.is_finite());
        DataPoint(timestamp, value)
    }
}

/// Calculates the derived series for `expression`.
///
/// `aggregations` holds one aggregation per variable occurrence, in order of
/// appearance. Fails only when there is no series for the first variable.
pub fn calculate_series<A: AsRef<str>>(
    expression: &str,
    aggregations: &[A],
    variable_values: &SeriesTable,
) -> Result<Series, ChartMathError> {
    let task = SeriesTask::prepare(
        RestrictedEvaluator::global(),
        expression,
        aggregations,
        variable_values,
    )?;
    Ok((0..task.timeline.len()).map(|i| task.point(i)).collect())
}

/// Same as [`calculate_series`], datapoints are evaluated in parallel.
pub fn calculate_series_par<A: AsRef<str> + Sync>(
    expression: &str,
    aggregations: &[A],
    variable_values: &SeriesTable,
) -> Result<Series, ChartMathError> {
    calculate_series_with(
        RestrictedEvaluator::global(),
        expression,
        aggregations,
        variable_values,
        true,
    )
}

/// Calculates the series with an evaluator built from a custom config.
pub fn calculate_series_with<A: AsRef<str> + Sync>(
    evaluator: &RestrictedEvaluator,
    expression: &str,
    aggregations: &[A],
    variable_values: &SeriesTable,
    parallel: bool,
) -> Result<Series, ChartMathError> {
    let task = SeriesTask::prepare(evaluator, expression, aggregations, variable_values)?;
    let indices = 0..task.timeline.len();
    if parallel {
        Ok(indices.into_par_iter().map(|i| task.point(i)).collect())
    } else {
        Ok(indices.map(|i| task.point(i)).collect())
    }
}

//! # Chart math
//!
//! The API the chart subsystem uses to compute derived series from telemetry:
//!
//! ```
//! use chart_math::chart_math::prelude::*;
//! use std::collections::HashMap;
//!
//! let expression = "a + b";
//! let names = get_variable_names(expression);
//! assert_eq!(names, vec!["a", "b"]);
//! let aggregations = ["avg", "sum"];
//! // `a + b` becomes `a_avg + b_sum`, matching the scope keys
//! let rewritten = add_aggs_to_expression(expression, &aggregations);
//! assert_eq!(rewritten, "a_avg + b_sum");
//!
//! let mut table: SeriesTable = HashMap::new();
//! table.insert("a_avg".to_string(), vec![DataPoint(0, Some(1.0)), DataPoint(60, Some(2.0))]);
//! table.insert("b_sum".to_string(), vec![DataPoint(0, Some(10.0)), DataPoint(60, Some(20.0))]);
//! let scope = get_scope(1, &names, &aggregations, &table);
//! assert_eq!(calculate(&rewritten, &scope), Some(22.0));
//! assert!(can_be_parsed(expression));
//! ```
//! Every operation here is synchronous and free of side effects; failures
//! collapse to `None` / `false` so that a bad formula only leaves a gap in the
//! chart.

/// variable name extraction and counting
pub mod variables;
/// per-datapoint scopes built from the series table
pub mod scope;
/// calculation, parseability check and aggregation suffix rewriting
pub mod calculation;
/// whole derived series computed over a timeline
pub mod series;
mod chart_math_tests;

pub mod prelude {
    pub use crate::chart_math::calculation::{
        add_aggs_to_expression, calculate, can_be_parsed, try_calculate,
    };
    pub use crate::chart_math::scope::{DataPoint, Scope, Series, SeriesTable, get_scope};
    pub use crate::chart_math::series::{calculate_series, calculate_series_par};
    pub use crate::chart_math::variables::{
        get_allowed_math_functions, get_variable_count, get_variable_names,
    };
    pub use crate::expression::error::ChartMathError;
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One `[timestamp, value]` pair as delivered by the chart backend.
/// A `null` value marks a gap in the measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint(pub i64, pub Option<f64>);

impl DataPoint {
    pub fn timestamp(&self) -> i64 {
        self.0
    }

    pub fn value(&self) -> Option<f64> {
        self.1
    }
}

pub type Series = Vec<DataPoint>;

/// series keyed by `<variable>_<aggregation>`
pub type SeriesTable = HashMap<String, Series>;

/// Variable bindings for a single evaluation.
///
/// A key can be bound to a number or marked as missing (the datapoint exists
/// but carries no value). Evaluating a formula that reads a missing key fails,
/// which the calculation API turns into a `null` result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    values: HashMap<String, Option<f64>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), Some(value));
    }

    pub fn insert_missing(&mut self, key: impl Into<String>) {
        self.values.insert(key.into(), None);
    }

    /// value bound to `key`; `None` if the key is absent or missing
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    // outer None: unbound, inner None: bound but missing
    pub(crate) fn slot(&self, key: &str) -> Option<Option<f64>> {
        self.values.get(key).copied()
    }

    pub fn has_missing(&self) -> bool {
        self.values.values().any(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for (key, value) in iter {
            scope.insert(key, value);
        }
        scope
    }
}

impl<K: Into<String>, const N: usize> From<[(K, f64); N]> for Scope {
    fn from(pairs: [(K, f64); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Creates the scope for the datapoint at `index`.
///
/// `variable_names` and `aggregations` are parallel lists; position `k` gives
/// the key `"<variable_names[k]>_<aggregations[k]>"`. A series that is absent
/// from the table or shorter than `index` contributes `0`, a datapoint with
/// a `null` value marks the key as missing. Pairs beyond the shorter of the
/// two lists are ignored.
pub fn get_scope<N, A>(
    index: usize,
    variable_names: &[N],
    aggregations: &[A],
    variable_values: &SeriesTable,
) -> Scope
where
    N: AsRef<str>,
    A: AsRef<str>,
{
    let mut scope = Scope::new();
    for (name, agg) in variable_names.iter().zip(aggregations) {
        let key = format!("{}_{}", name.as_ref(), agg.as_ref());
        let point = variable_values
            .get(&key)
            .and_then(|series| series.get(index));
        match point {
            Some(DataPoint(_, Some(value))) => scope.insert(key, *value),
            Some(DataPoint(_, None)) => scope.insert_missing(key),
            None => scope.insert(key, 0.0),
        }
    }
    scope
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, Series)]) -> SeriesTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_scope_at_index() {
        let values = table(&[
            ("a_avg", vec![DataPoint(0, Some(1.0)), DataPoint(1, Some(2.0))]),
            ("b_sum", vec![DataPoint(0, Some(5.0)), DataPoint(1, Some(6.0))]),
        ]);
        let scope = get_scope(1, &["a", "b"], &["avg", "sum"], &values);
        assert_eq!(scope, Scope::from([("a_avg", 2.0), ("b_sum", 6.0)]));
    }

    #[test]
    fn test_scope_iter_reports_missing_entries() {
        let values = table(&[
            ("a_avg", vec![DataPoint(0, Some(1.0))]),
            ("b_sum", vec![DataPoint(0, None)]),
        ]);
        let scope = get_scope(0, &["a", "b", "c"], &["avg", "sum", "max"], &values);
        let mut entries: Vec<(&str, Option<f64>)> = scope.iter().collect();
        entries.sort_by(|l, r| l.0.cmp(r.0));
        assert_eq!(
            entries,
            vec![("a_avg", Some(1.0)), ("b_sum", None), ("c_max", Some(0.0))]
        );
    }

    #[test]
    fn test_out_of_range_defaults_to_zero() {
        let values = table(&[("x_avg", vec![DataPoint(0, Some(1.0)), DataPoint(1, Some(2.0))])]);
        let scope = get_scope(5, &["x"], &["avg"], &values);
        assert_eq!(scope, Scope::from([("x_avg", 0.0)]));
    }

    #[test]
    fn test_absent_series_defaults_to_zero() {
        let scope = get_scope(0, &["x"], &["last"], &SeriesTable::new());
        assert_eq!(scope.get("x_last"), Some(0.0));
    }

    #[test]
    fn test_null_value_is_missing() {
        let values = table(&[("x_avg", vec![DataPoint(0, None)])]);
        let scope = get_scope(0, &["x"], &["avg"], &values);
        assert!(scope.contains_key("x_avg"));
        assert_eq!(scope.get("x_avg"), None);
        assert!(scope.has_missing());
    }

    #[test]
    fn test_same_variable_with_two_aggregations() {
        let values = table(&[
            ("t_min", vec![DataPoint(0, Some(-3.0))]),
            ("t_max", vec![DataPoint(0, Some(12.0))]),
        ]);
        let scope = get_scope(0, &["t", "t"], &["min", "max"], &values);
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.get("t_min"), Some(-3.0));
        assert_eq!(scope.get("t_max"), Some(12.0));
    }

    #[test]
    fn test_shorter_aggregation_list() {
        let scope = get_scope(0, &["a", "b"], &["avg"], &SeriesTable::new());
        assert_eq!(scope.len(), 1);
        assert!(scope.contains_key("a_avg"));
    }

    #[test]
    fn test_datapoint_deserializes_from_pair() {
        let series: Series = serde_json::from_str("[[1000, 1.5], [2000, null]]").unwrap();
        assert_eq!(series, vec![DataPoint(1000, Some(1.5)), DataPoint(2000, None)]);
        assert_eq!(series[0].timestamp(), 1000);
        assert_eq!(series[1].value(), None);
    }
}

//! Calculation tasks described in a TOML file.
//!
//! ```toml
//! log_level = "info"
//! output = "efficiency.csv"
//! series_file = "series.json"
//!
//! [evaluator]
//! implicit_multiplication = true
//!
//! [calculation]
//! name = "efficiency"
//! expression = "power_out / power_in * 100"
//! aggregations = ["avg", "avg"]
//! parallel = false
//!
//! [series]
//! power_out_avg = [[0, 8.0], [60, nan]]
//! ```
//!
//! TOML has no `null`, so `nan` marks a gap in an inline series. Series read
//! from `series_file` use JSON `null` for the same purpose. Keys present in
//! both places take the inline value.
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart_math::scope::{DataPoint, Series, SeriesTable};
use crate::chart_math::series::calculate_series_with;
use crate::expression::error::ChartMathError;
use crate::expression::evaluator::{EvaluatorConfig, RestrictedEvaluator};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid task file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid series file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Calculation(#[from] ChartMathError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationConfig {
    /// column name used for the output
    #[serde(default = "default_name")]
    pub name: String,
    pub expression: String,
    /// one aggregation per variable occurrence
    #[serde(default)]
    pub aggregations: Vec<String>,
    #[serde(default)]
    pub parallel: bool,
}

fn default_name() -> String {
    "result".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    /// CSV file the derived series is written to
    pub output: Option<PathBuf>,
    pub series_file: Option<PathBuf>,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    pub calculation: CalculationConfig,
    #[serde(default)]
    pub series: SeriesTable,
    // directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl TaskConfig {
    pub fn from_str(content: &str) -> Result<Self, TaskError> {
        let config: TaskConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, TaskError> {
        let content = fs::read_to_string(path).map_err(|source| TaskError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        info!("task loaded from {}", path.display());
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// inline series merged over the ones from `series_file`
    pub fn series_table(&self) -> Result<SeriesTable, TaskError> {
        let mut table = match &self.series_file {
            Some(file) => {
                let path = self.resolve(file);
                let content = fs::read_to_string(&path)
                    .map_err(|source| TaskError::Io { path: path.clone(), source })?;
                let table: SeriesTable = serde_json::from_str(&content)?;
                debug!("{} series read from {}", table.len(), path.display());
                table
            }
            None => SeriesTable::new(),
        };
        for (key, series) in &self.series {
            table.insert(key.clone(), nan_as_gap(series));
        }
        Ok(table)
    }

    /// Runs the calculation described by the task.
    pub fn run(&self) -> Result<Series, TaskError> {
        let table = self.series_table()?;
        let evaluator = RestrictedEvaluator::with_config(self.evaluator.clone());
        let calculation = &self.calculation;
        info!(
            "calculating '{}' = {} ({} series available)",
            calculation.name,
            calculation.expression,
            table.len()
        );
        let series = calculate_series_with(
            &evaluator,
            &calculation.expression,
            &calculation.aggregations,
            &table,
            calculation.parallel,
        )?;
        Ok(series)
    }
}

fn nan_as_gap(series: &Series) -> Series {
    series
        .iter()
        .map(|p| DataPoint(p.timestamp(), p.value().filter(|v| !v.is_nan())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TASK: &str = r#"
log_level = "warn"
output = "out.csv"

[calculation]
name = "efficiency"
expression = "out / inp * 100"
aggregations = ["avg", "avg"]

[series]
out_avg = [[0, 8.0], [60, nan], [120, 9.0]]
inp_avg = [[0, 10.0], [60, 10.0], [120, 0.0]]
"#;

    #[test]
    fn test_parse_task() {
        let task = TaskConfig::from_str(TASK).unwrap();
        assert_eq!(task.log_level.as_deref(), Some("warn"));
        assert_eq!(task.output, Some(PathBuf::from("out.csv")));
        assert_eq!(task.evaluator, EvaluatorConfig::default());
        assert_eq!(task.calculation.name, "efficiency");
        assert!(!task.calculation.parallel);
        assert_eq!(task.series.len(), 2);
    }

    #[test]
    fn test_run_inline_task() {
        let task = TaskConfig::from_str(TASK).unwrap();
        let result = task.run().unwrap();
        assert_eq!(
            result,
            vec![DataPoint(0, Some(80.0)), DataPoint(60, None), DataPoint(120, None)]
        );
    }

    #[test]
    fn test_missing_calculation_section() {
        let err = TaskConfig::from_str("log_level = \"info\"").unwrap_err();
        assert!(matches!(err, TaskError::Toml(_)));
    }

    #[test]
    fn test_load_with_series_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("series.json"),
            r#"{"t_max": [[0, 20.0], [60, null]], "t_min": [[0, 10.0], [60, 12.0]]}"#,
        )
        .unwrap();
        let task_path = dir.path().join("task.toml");
        fs::write(
            &task_path,
            r#"
series_file = "series.json"

[evaluator]
implicit_multiplication = false

[calculation]
expression = "(t - t) / 2"
aggregations = ["max", "min"]
parallel = true

[series]
t_min = [[0, 4.0], [60, 6.0]]
"#,
        )
        .unwrap();

        let task = TaskConfig::load(&task_path).unwrap();
        assert_eq!(task.calculation.name, "result");
        assert!(!task.evaluator.implicit_multiplication);
        let table = task.series_table().unwrap();
        // inline series wins over the file
        assert_eq!(table["t_min"][0], DataPoint(0, Some(4.0)));

        let result = task.run().unwrap();
        assert_eq!(result, vec![DataPoint(0, Some(8.0)), DataPoint(60, None)]);
    }

    #[test]
    fn test_missing_series_file() {
        let task = TaskConfig::from_str(
            "series_file = \"does_not_exist.json\"\n[calculation]\nexpression = \"a\"\n",
        )
        .unwrap();
        assert!(matches!(task.series_table(), Err(TaskError::Io { .. })));
    }

    #[test]
    fn test_run_without_data() {
        let task = TaskConfig::from_str("[calculation]\nexpression = \"a + b\"\naggregations = [\"avg\", \"avg\"]\n").unwrap();
        assert!(matches!(
            task.run(),
            Err(TaskError::Calculation(ChartMathError::NoSeriesData { .. }))
        ));
    }
}

#![allow(non_snake_case)]
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use chart_math::Utils::logger::{default_log_file, init_logger, save_series_to_csv};
use chart_math::Utils::task_config::TaskConfig;
use chart_math::chart_math::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "chart-math")]
#[command(about = "Compute derived chart series from telemetry formulas", long_about = None)]
#[command(version)]
struct Cli {
    /// Calculation task file
    #[arg(value_name = "FILE", default_value = "task.toml")]
    task: PathBuf,

    /// Only check a formula: list its variables and whether it parses
    #[arg(long, value_name = "EXPR")]
    check: Option<String>,

    /// CSV file for the result, overrides `output` from the task
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace), overrides the task
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Also write the log into a timestamped file
    #[arg(long)]
    log_to_file: bool,
}

fn check_formula(expression: &str) {
    let names = get_variable_names(expression);
    println!("formula:    {}", expression);
    println!("variables:  {} {:?}", get_variable_count(expression), names);
    println!("parseable:  {}", can_be_parsed(expression));
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(expression) = &cli.check {
        check_formula(expression);
        return Ok(());
    }

    let task = TaskConfig::load(&cli.task)
        .with_context(|| format!("failed to load task {}", cli.task.display()))?;

    let level = cli.log_level.as_deref().or(task.log_level.as_deref());
    let log_file = match (&task.log_file, cli.log_to_file) {
        (Some(file), _) => Some(task.resolve(file)),
        (None, true) => Some(default_log_file()),
        (None, false) => None,
    };
    init_logger(level, log_file.as_deref()).context("failed to set up logging")?;

    let series = task.run().context("calculation failed")?;
    let name = &task.calculation.name;
    println!("{:>14}  {}", "timestamp", name);
    for point in &series {
        match point.value() {
            Some(value) => println!("{:>14}  {}", point.timestamp(), value),
            None => println!("{:>14}  null", point.timestamp()),
        }
    }

    let output = cli.output.or_else(|| task.output.as_ref().map(|p| task.resolve(p)));
    if let Some(path) = output {
        save_series_to_csv(&series, name, &path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    info!("Program ended");
    Ok(())
}

//! different utility modules used by the command line tool
/// logger setup and saving of calculated series into csv
pub mod logger;
/// calculation task read from a toml file
pub mod task_config;

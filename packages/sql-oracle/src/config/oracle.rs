use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, Environment};
use query_equiv::{Dialect, MatchStrategy};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{LogConfig, DEFAULT_CONFIG_FILE_PATH, SQL_ORACLE_PREFIX};
use crate::compare::RowComparison;
use crate::error::{ConfigError, Error};
use crate::log::CONFIG;
use crate::Args;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub structural: StructuralConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StructuralConfig {
    #[serde(default = "StructuralConfig::default_dialect")]
    pub dialect: String,

    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub ignore_extra_columns: bool,

    /// Stands in for NULL before values are sorted and compared.
    #[serde(default)]
    pub null_sentinel: String,

    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default)]
    pub comparison: RowComparison,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DatabaseConfig {
    /// A SQLite database file, always opened read-only.
    pub path: Option<PathBuf>,

    /// A PostgreSQL connection string. Requires the `postgres` feature.
    pub url: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    #[serde(alias = "Greedy", alias = "greedy", alias = "GREEDY")]
    Greedy,
    #[serde(alias = "Bipartite", alias = "bipartite", alias = "BIPARTITE")]
    Bipartite,
}

impl From<Strategy> for MatchStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Greedy => MatchStrategy::Greedy,
            Strategy::Bipartite => MatchStrategy::Bipartite,
        }
    }
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            dialect: StructuralConfig::default_dialect(),
            strategy: Strategy::default(),
        }
    }
}

impl StructuralConfig {
    pub fn default_dialect() -> String {
        Dialect::default().to_string()
    }

    pub fn dialect(&self) -> Result<Dialect, ConfigError> {
        self.dialect
            .parse()
            .map_err(|_| ConfigError::InvalidParameter {
                name: "structural.dialect".to_string(),
                value: self.dialect.to_owned(),
            })
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            ignore_extra_columns: false,
            null_sentinel: String::new(),
            strategy: Strategy::default(),
            comparison: RowComparison::default(),
        }
    }
}

/// Configuration is read from an optional TOML file, `sql-oracle.toml` by default.
///
/// Environment variables prefixed with `SQL_ORACLE_` override file values. Nested keys are separated
/// by `__`, as in `SQL_ORACLE_EXECUTION__IGNORE_EXTRA_COLUMNS=true`.
impl OracleConfig {
    pub fn default_path() -> String {
        DEFAULT_CONFIG_FILE_PATH.to_string()
    }

    pub fn load(args: &Args) -> Result<OracleConfig, Error> {
        if !Path::new(&args.config_file_path).exists() && args.config_file_path != DEFAULT_CONFIG_FILE_PATH
        {
            eprintln!(
                "Configuration file was not found: {}",
                args.config_file_path
            );
            eprintln!("Loading config values from environment variables.");
        }

        let mut config = OracleConfig::build(&args.config_file_path)?;

        // A default level or format means the user left it unset
        if config.log.level == LogConfig::default_log_level() {
            config.log.level = args.log_level;
        }

        if config.log.format == LogConfig::default_log_format() {
            config.log.format = args.log_format;
        }

        Ok(config)
    }

    pub fn build(path: &str) -> Result<Self, Error> {
        // Top-level values as SQL_ORACLE_KEY, nested ones as SQL_ORACLE_SECTION__KEY
        let env_source = Environment::with_prefix(SQL_ORACLE_PREFIX)
            .try_parsing(true)
            .separator("__")
            .prefix_separator("_");

        let config: Self = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(env_source)
            .build()?
            .try_deserialize()
            .map_err(|err| match err {
                config::ConfigError::Message(ref s) => match s {
                    s if s.contains("missing field") => {
                        let name = extract_field_name(s).unwrap_or_else(|| "unknown".to_string());
                        ConfigError::MissingParameter { name }
                    }
                    s if s.contains("does not have variant constructor") => {
                        let (name, value) = extract_invalid_field(s);
                        ConfigError::InvalidParameter { name, value }
                    }
                    _ => err.into(),
                },
                _ => err.into(),
            })?;

        config.structural.dialect()?;

        debug!(target: CONFIG, msg = "Loaded configuration", path, ?config);

        Ok(config)
    }

    pub fn dialect(&self) -> Dialect {
        self.structural.dialect().unwrap_or_default()
    }
}

/// The field name in a `missing field` message from `config`.
fn extract_field_name(input: &str) -> Option<String> {
    let re = Regex::new(r"`(\w+)`").ok()?;
    re.captures(input)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
}

/// The enum name and rejected value in a message shaped like
/// `enum {name} does not have variant constructor {value}`.
fn extract_invalid_field(input: &str) -> (String, String) {
    if !input.starts_with("enum") {
        return ("unknown".to_string(), String::new());
    }

    let words = input.split(' ').collect::<Vec<_>>();

    let name = words.get(1).map_or("unknown".to_string(), |w| w.to_string());
    let value = words.last().map_or(String::new(), |w| w.to_string());

    (name, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::with_no_oracle_vars;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const TEST_CONFIG: &str = "tests/config/sql-oracle-test.toml";

    #[test]
    fn loads_file_values() {
        with_no_oracle_vars(|| {
            let config = OracleConfig::build(TEST_CONFIG).unwrap();

            assert_eq!(config.dialect(), Dialect::Sqlite);
            assert_eq!(config.structural.strategy, Strategy::Greedy);
            assert!(!config.execution.ignore_extra_columns);
            assert_eq!(config.execution.null_sentinel, "");
            assert_eq!(config.execution.comparison, RowComparison::ColumnWise);
            assert_eq!(
                config.database.path,
                Some(PathBuf::from("tests/fixtures/reference.sqlite"))
            );
            assert_eq!(config.database.url, None);
        });
    }

    #[test]
    fn environment_overrides_file() {
        with_no_oracle_vars(|| {
            temp_env::with_vars(
                [
                    ("SQL_ORACLE_STRUCTURAL__DIALECT", Some("postgres")),
                    ("SQL_ORACLE_STRUCTURAL__STRATEGY", Some("Bipartite")),
                    ("SQL_ORACLE_EXECUTION__IGNORE_EXTRA_COLUMNS", Some("true")),
                    ("SQL_ORACLE_EXECUTION__COMPARISON", Some("RowWise")),
                    ("SQL_ORACLE_EXECUTION__NULL_SENTINEL", Some("<null>")),
                ],
                || {
                    let config = OracleConfig::build(TEST_CONFIG).unwrap();

                    assert_eq!(config.dialect(), Dialect::Postgres);
                    assert_eq!(config.structural.strategy, Strategy::Bipartite);
                    assert!(config.execution.ignore_extra_columns);
                    assert_eq!(config.execution.comparison, RowComparison::RowWise);
                    assert_eq!(config.execution.null_sentinel, "<null>");
                },
            );
        });
    }

    #[test]
    fn missing_file_uses_defaults() {
        with_no_oracle_vars(|| {
            let config = OracleConfig::build("tests/config/does-not-exist.toml").unwrap();

            assert_eq!(config.dialect(), Dialect::Sqlite);
            assert_eq!(config.database.path, None);
        });
    }

    #[test]
    fn unknown_dialect_is_invalid() {
        with_no_oracle_vars(|| {
            temp_env::with_vars([("SQL_ORACLE_STRUCTURAL__DIALECT", Some("cobol"))], || {
                let config = OracleConfig::build(TEST_CONFIG);

                assert!(matches!(
                    config,
                    Err(Error::Config(ConfigError::InvalidParameter { ref value, .. })) if value == "cobol"
                ));
            });
        });
    }

    #[test]
    fn unknown_strategy_is_a_config_error() {
        with_no_oracle_vars(|| {
            temp_env::with_vars([("SQL_ORACLE_EXECUTION__STRATEGY", Some("optimal"))], || {
                let config = OracleConfig::build(TEST_CONFIG);

                assert!(matches!(config, Err(Error::Config(_))));
            });
        });
    }

    #[test]
    fn extracts_names_from_config_messages() {
        assert_eq!(
            extract_field_name("missing field `path` for key `database`"),
            Some("path".to_string())
        );
        assert_eq!(
            extract_invalid_field("enum Strategy does not have variant constructor optimal"),
            ("Strategy".to_string(), "optimal".to_string())
        );
        assert_eq!(
            extract_invalid_field("something else"),
            ("unknown".to_string(), String::new())
        );
    }
}

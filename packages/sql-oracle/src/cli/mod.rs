use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use query_equiv::{referenced_tables, Dialect, StructuralMatcher, Verdict};
use serde::Serialize;
use tracing::debug;

use crate::{
    compare::{ResultComparator, RowComparison},
    config::{LogConfig, LogFormat, LogLevel, Strategy, DEFAULT_CONFIG_FILE_PATH},
    engine::{connect, ExecutionMatcher},
    error::{ConfigError, Error},
    log::DEVELOPMENT,
    OracleConfig,
};

#[derive(Clone, Debug, Parser)]
#[command(version, about, verbatim_doc_comment)]
///
/// SQL Oracle
///
/// Grades a predicted SQL query against a gold query, by structure and by execution.
///
pub struct Args {
    /// Optional path to a configuration file.
    ///
    /// Default is "sql-oracle.toml".
    /// Configuration is loaded from this file, if present.
    /// Environment variables prefixed with SQL_ORACLE_ override any values defined in the file.
    #[arg(short = 'p', long, default_value = DEFAULT_CONFIG_FILE_PATH, verbatim_doc_comment, global = true)]
    pub config_file_path: String,

    ///
    /// Optional log level.
    ///
    #[arg(short, long, value_enum, default_value_t = LogConfig::default_log_level(), env = "SQL_ORACLE_LOG__LEVEL", global = true)]
    pub log_level: LogLevel,

    ///
    /// Optional log format. Default is "pretty" in a terminal session, otherwise "structured".
    ///
    #[arg(short='f', long, value_enum, default_value_t = LogConfig::default_log_format(), env = "SQL_ORACLE_LOG__FORMAT", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Compares the shape of two queries, up to a renaming of aliases.
    Structural(StructuralArgs),
    /// Runs both queries and compares their results.
    Execution(ExecutionArgs),
    /// Runs both comparisons.
    Check(CheckArgs),
    /// Lists the tables a query reads from.
    Tables(TablesArgs),
}

/// SQL arguments starting with `@` name a file holding the SQL.
#[derive(Clone, Debug, ClapArgs)]
pub struct QueryPair {
    /// Predicted SQL, or @path
    pub predicted: String,

    /// Gold SQL, or @path
    pub gold: String,
}

#[derive(Clone, Debug, ClapArgs)]
pub struct StructuralArgs {
    #[command(flatten)]
    pub queries: QueryPair,

    #[command(flatten)]
    pub options: StructuralOptions,
}

#[derive(Clone, Debug, Default, ClapArgs)]
pub struct StructuralOptions {
    /// SQL dialect used to parse both queries. Overrides structural.dialect.
    #[arg(long)]
    pub dialect: Option<String>,

    /// Pairing strategy for unordered lists. Overrides structural.strategy.
    #[arg(long, value_enum)]
    pub structural_strategy: Option<Strategy>,
}

#[derive(Clone, Debug, ClapArgs)]
pub struct ExecutionArgs {
    #[command(flatten)]
    pub queries: QueryPair,

    #[command(flatten)]
    pub options: ExecutionOptions,
}

#[derive(Clone, Debug, Default, ClapArgs)]
pub struct ExecutionOptions {
    /// SQLite database to run both queries on. Overrides database.path.
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Ignore predicted columns that have no counterpart in the gold result.
    #[arg(long)]
    pub ignore_extra_columns: bool,

    /// Result comparison mode. Overrides execution.comparison.
    #[arg(long, value_enum)]
    pub comparison: Option<RowComparison>,
}

#[derive(Clone, Debug, ClapArgs)]
pub struct CheckArgs {
    #[command(flatten)]
    pub queries: QueryPair,

    #[command(flatten)]
    pub structural: StructuralOptions,

    #[command(flatten)]
    pub execution: ExecutionOptions,
}

#[derive(Clone, Debug, ClapArgs)]
pub struct TablesArgs {
    /// SQL, or @path
    pub sql: String,

    /// SQL dialect. Overrides structural.dialect.
    #[arg(long)]
    pub dialect: Option<String>,
}

/// One verdict as printed on stdout.
#[derive(Debug, Serialize, PartialEq)]
pub struct VerdictReport {
    pub equivalent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl From<Verdict> for VerdictReport {
    fn from(verdict: Verdict) -> Self {
        let (equivalent, diagnostic) = verdict.into_parts();
        Self {
            equivalent,
            diagnostic,
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural: Option<VerdictReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<VerdictReport>,
}

impl Report {
    pub fn equivalent(&self) -> bool {
        [&self.structural, &self.execution]
            .into_iter()
            .flatten()
            .all(|verdict| verdict.equivalent)
    }
}

///
/// Runs the command specified on the command line, printing its result as JSON.
/// Returns the process exit code.
///
pub fn run(args: Args, config: OracleConfig) -> Result<i32, Error> {
    debug!(target: DEVELOPMENT, command = ?args.command);

    match args.command {
        Commands::Structural(StructuralArgs { queries, options }) => {
            let (predicted, gold) = queries.read()?;
            let report = Report {
                structural: Some(structural(&config, &options, &predicted, &gold)?.into()),
                ..Default::default()
            };
            print_report(&report)
        }
        Commands::Execution(ExecutionArgs { queries, options }) => {
            let (predicted, gold) = queries.read()?;
            let report = Report {
                execution: Some(execution(&config, &options, &predicted, &gold)?.into()),
                ..Default::default()
            };
            print_report(&report)
        }
        Commands::Check(CheckArgs {
            queries,
            structural: structural_options,
            execution: execution_options,
        }) => {
            let (predicted, gold) = queries.read()?;
            let report = Report {
                structural: Some(structural(&config, &structural_options, &predicted, &gold)?.into()),
                execution: Some(execution(&config, &execution_options, &predicted, &gold)?.into()),
            };
            print_report(&report)
        }
        Commands::Tables(TablesArgs { sql, dialect }) => {
            let sql = read_sql(&sql)?;
            let dialect = dialect_for(&config, dialect.as_deref())?;
            let tables = referenced_tables(&sql, dialect)?;
            println!("{}", serde_json::to_string(&tables).map_err(std::io::Error::other)?);
            Ok(exitcode::OK)
        }
    }
}

fn structural(
    config: &OracleConfig,
    options: &StructuralOptions,
    predicted: &str,
    gold: &str,
) -> Result<Verdict, Error> {
    let dialect = dialect_for(config, options.dialect.as_deref())?;
    let strategy = options
        .structural_strategy
        .unwrap_or(config.structural.strategy);

    Ok(StructuralMatcher::new(dialect)
        .strategy(strategy.into())
        .check(predicted, gold))
}

fn execution(
    config: &OracleConfig,
    options: &ExecutionOptions,
    predicted: &str,
    gold: &str,
) -> Result<Verdict, Error> {
    let execution = &config.execution;

    let comparator = ResultComparator::new()
        .ignore_extra_columns(options.ignore_extra_columns || execution.ignore_extra_columns)
        .strategy(execution.strategy.into())
        .comparison(options.comparison.unwrap_or(execution.comparison))
        .null_sentinel(execution.null_sentinel.as_str());

    let matcher = ExecutionMatcher::new(comparator);

    if let Some(path) = &options.database {
        return Ok(matcher.check_path(path, predicted, gold));
    }

    let mut executor = connect(&config.database)?;
    Ok(matcher.check(&mut executor, predicted, gold))
}

fn dialect_for(config: &OracleConfig, dialect: Option<&str>) -> Result<Dialect, Error> {
    match dialect {
        Some(name) => name.parse().map_err(|_| {
            ConfigError::InvalidParameter {
                name: "dialect".to_string(),
                value: name.to_string(),
            }
            .into()
        }),
        None => Ok(config.dialect()),
    }
}

fn print_report(report: &Report) -> Result<i32, Error> {
    println!("{}", serde_json::to_string(report).map_err(std::io::Error::other)?);

    if report.equivalent() {
        Ok(exitcode::OK)
    } else {
        Ok(exitcode::DATAERR)
    }
}

impl QueryPair {
    fn read(&self) -> Result<(String, String), Error> {
        Ok((read_sql(&self.predicted)?, read_sql(&self.gold)?))
    }
}

fn read_sql(arg: &str) -> Result<String, Error> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|source| Error::SqlFile {
            path: path.to_string(),
            source,
        }),
        None => Ok(arg.to_string()),
    }
}

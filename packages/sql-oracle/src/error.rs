use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Parse(#[from] query_equiv::ParseError),

    #[error("Could not read SQL from {path}: {source}")]
    SqlFile { path: String, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing field {name} from configuration file or environment")]
    MissingParameter { name: String },

    #[error("Invalid value `{value}` for {name}")]
    InvalidParameter { name: String, value: String },

    #[error("No database configured. Set database.path or database.url")]
    MissingDatabase,

    #[error("A database url requires the `postgres` feature")]
    PostgresDisabled,

    #[error(transparent)]
    FileOrEnvironment(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Statement is not read-only")]
    NotReadOnly,

    #[error("Could not start the database runtime: {0}")]
    Runtime(io::Error),
}

/// Why two queries did not produce equivalent results.
///
/// The `Display` output is the diagnostic reported to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMismatch {
    #[error("Error executing SQL query: {0}")]
    PredictedFailed(String),

    #[error("Gold SQL design error: {0}")]
    GoldFailed(String),

    #[error("Predicted SQL query does not contain the required columns.")]
    MissingRequiredColumns,

    #[error("The number of columns in the predicted and gold queries do not match. (predicted {predicted}, gold {gold})")]
    ColumnCount { predicted: usize, gold: usize },

    #[error("The predicted SQL query is incorrect.")]
    Values,
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Execution(e.into())
    }
}

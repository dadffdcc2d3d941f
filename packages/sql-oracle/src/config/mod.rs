mod log;
mod oracle;

pub use log::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use oracle::{DatabaseConfig, ExecutionConfig, OracleConfig, Strategy, StructuralConfig};

pub const SQL_ORACLE_PREFIX: &str = "SQL_ORACLE";
pub const DEFAULT_CONFIG_FILE_PATH: &str = "sql-oracle.toml";

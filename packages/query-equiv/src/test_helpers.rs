use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    ast::Node,
    provider::{lower_statement, AstProvider, Dialect, SqlParserProvider},
};

/// Lowers a single statement without running the optimizer.
pub(crate) fn lower(sql: &str) -> Node {
    let statements = Dialect::Sqlite.parse_statements(sql).unwrap();
    lower_statement(&statements[0]).unwrap()
}

/// Lowers and optimizes a single statement.
pub(crate) fn optimized(sql: &str) -> Node {
    SqlParserProvider
        .parse_and_optimize(sql, Dialect::Sqlite)
        .unwrap()
}

#[allow(dead_code)]
pub(crate) fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

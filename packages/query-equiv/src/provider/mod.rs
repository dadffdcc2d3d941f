//! Turns SQL text into an optimized [`Node`] tree.

mod dialect;
mod lower;

pub use dialect::Dialect;

pub(crate) use lower::{canonical_number, identifier_from_sql, lower_statement};

use sqltk::parser::ast::Statement;
use tracing::debug;

use crate::{ast::Node, optimizer, ParseError, PARSER};

/// Parses and optimizes SQL text into a tree ready for comparison.
pub trait AstProvider {
    fn parse_and_optimize(&self, sql: &str, dialect: Dialect) -> Result<Node, ParseError>;
}

/// The default [`AstProvider`], backed by the `sqlparser` crate re-exported by `sqltk`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlParserProvider;

impl AstProvider for SqlParserProvider {
    fn parse_and_optimize(&self, sql: &str, dialect: Dialect) -> Result<Node, ParseError> {
        let statement = parse(sql, dialect)?;
        let tree = lower_statement(&statement)?;
        let tree = optimizer::optimize(tree)?;

        debug!(target: PARSER, msg = "Optimized query", %dialect, %tree);

        Ok(tree)
    }
}

/// Parses exactly one statement.
pub fn parse(sql: &str, dialect: Dialect) -> Result<Statement, ParseError> {
    if sql.trim().trim_end_matches(';').trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut statements = dialect.parse_statements(sql)?;

    match statements.len() {
        0 => Err(ParseError::Empty),
        1 => Ok(statements.remove(0)),
        count => Err(ParseError::MultipleStatements { count }),
    }
}

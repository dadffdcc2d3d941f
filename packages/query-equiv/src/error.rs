use sqltk::parser::parser::ParserError;
use thiserror::Error;

use crate::ast::NodeKind;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] ParserError),

    #[error("No SQL statement found")]
    Empty,

    #[error("Expected a single SQL statement, found {count}")]
    MultipleStatements { count: usize },

    #[error("Unsupported statement: {0}")]
    Unsupported(String),

    #[error("Unknown dialect `{0}`")]
    UnknownDialect(String),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Rule {rule} expected a {expected} node, found {found}")]
    UnexpectedShape {
        rule: &'static str,
        expected: NodeKind,
        found: NodeKind,
    },
}

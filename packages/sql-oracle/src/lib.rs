//! `sql-oracle` grades a predicted SQL query against a gold query.
//!
//! Structural equivalence comes from [`query_equiv`]. Execution equivalence runs both queries on a
//! read-only reference database and compares their result tables.

pub mod cli;
pub mod compare;
pub mod config;
mod engine;
pub mod error;
pub mod execute;
pub mod log;

#[cfg(test)]
mod test_helpers;

pub use crate::cli::Args;
pub use crate::config::OracleConfig;
pub use crate::engine::*;
pub use crate::error::{Error, ExecutionMismatch};
pub use query_equiv::{
    referenced_tables, structural_equivalence, structural_equivalence_verbose, Dialect,
    StructuralMatcher, Verdict,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

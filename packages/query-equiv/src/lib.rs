//! `query-equiv` decides whether two SQL queries have the same structure up to a consistent renaming
//! of their aliases.
//!
//! Both queries are parsed and optimized into [`ast::Node`] trees. Every alias bound in either query
//! is extracted, aliases denoting structurally equal subtrees are paired up, the first query's
//! aliases are renamed to their partners, and the two trees are compared. Unordered argument
//! positions (projection lists, connective operands, `IN` lists and so on) are compared as
//! multisets.

pub mod alias;
pub mod ast;
pub mod compare;
mod engine;
mod error;
mod normalize;
mod optimizer;
pub mod provider;
mod tables;
mod verdict;

#[cfg(test)]
mod test_helpers;

pub use compare::{Comparator, MatchStrategy};
pub use engine::*;
pub use error::*;
pub use normalize::*;
pub use provider::Dialect;
pub use tables::*;
pub use verdict::*;

/// Log target for parsing, lowering and optimization.
pub const PARSER: &str = "parser";

/// Log target for alias extraction and matching.
pub const ALIAS: &str = "alias";

/// Log target for tree comparison.
pub const COMPARE: &str = "compare";

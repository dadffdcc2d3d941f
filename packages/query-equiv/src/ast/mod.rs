//! The comparable query tree.
//!
//! SQL is lowered into a uniform tree of [`Node`]s so that equality, alias extraction and identifier
//! rewriting can be written once, independent of the shape of the parser's AST.

mod display;
mod index;
mod node;

pub use index::*;
pub use node::*;

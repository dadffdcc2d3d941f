//! Normalization passes applied after lowering.
//!
//! Each pass is a [`Rule`]. They run in a fixed order so that textually different but semantically
//! identical queries converge on one shape before aliases are extracted.

mod eliminate_subqueries;
mod flatten_connectives;
mod fold_literals;
mod qualify_columns;

pub(crate) use eliminate_subqueries::*;
pub(crate) use flatten_connectives::*;
pub(crate) use fold_literals::*;
pub(crate) use qualify_columns::*;

use crate::{ast::Node, OptimizeError};

use impl_trait_for_tuples::*;

pub(crate) trait Rule {
    fn apply(&mut self, tree: Node) -> Result<Node, OptimizeError>;
}

#[impl_for_tuples(1, 8)]
impl Rule for Tuple {
    fn apply(&mut self, tree: Node) -> Result<Node, OptimizeError> {
        for_tuples!( #(let tree = Tuple.apply(tree)?; )*);
        Ok(tree)
    }
}

pub(crate) fn optimize(tree: Node) -> Result<Node, OptimizeError> {
    let mut rules = (
        EliminateSubqueries::default(),
        FlattenConnectives,
        FoldLiterals,
        QualifyColumns,
    );

    rules.apply(tree)
}

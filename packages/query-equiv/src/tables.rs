use std::{collections::BTreeSet, convert::Infallible, ops::ControlFlow};

use sqltk::parser::ast::{Cte, ObjectName, TableFactor};
use sqltk::{Break, Visitable, Visitor};

use crate::{
    provider::{identifier_from_sql, parse, Dialect},
    ParseError,
};

/// The base tables referenced anywhere in `sql`, including inside subqueries and CTE bodies.
///
/// Names bound by a CTE are not tables and are left out. Unquoted names are folded to lower case and
/// qualified names are joined with `.`.
pub fn referenced_tables(sql: &str, dialect: Dialect) -> Result<BTreeSet<String>, ParseError> {
    let statement = parse(sql, dialect)?;

    let mut collector = TableCollector::default();
    let _ = statement.accept(&mut collector);

    Ok(collector
        .tables
        .difference(&collector.ctes)
        .cloned()
        .collect())
}

#[derive(Debug, Default)]
struct TableCollector {
    tables: BTreeSet<String>,
    ctes: BTreeSet<String>,
}

impl<'ast> Visitor<'ast> for TableCollector {
    type Error = Infallible;

    fn enter<N: Visitable>(&mut self, node: &'ast N) -> ControlFlow<Break<Self::Error>> {
        if let Some(cte) = node.downcast_ref::<Cte>() {
            self.ctes.insert(fold(&cte.alias.name.to_string()));
        }

        if let Some(TableFactor::Table { name, .. }) = node.downcast_ref::<TableFactor>() {
            self.tables.insert(object_name(name));
        }

        ControlFlow::Continue(())
    }
}

fn object_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|part| fold(&part.to_string()))
        .collect::<Vec<_>>()
        .join(".")
}

fn fold(sql: &str) -> String {
    identifier_from_sql(sql)
        .name()
        .unwrap_or_default()
        .to_string()
}

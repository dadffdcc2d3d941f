//! Lowers the `sqlparser` AST into the comparable [`Node`] tree.
//!
//! Only the stable core of the AST is matched on directly. Everything else goes through
//! [`lower_generic`], which keeps the operands as child nodes and the remaining syntax as a SQL
//! template with `?` holes.

use std::{convert::Infallible, fmt::Debug, ops::ControlFlow};

use sqltk::parser::ast::{
    BinaryOperator, Cte, Distinct, DuplicateTreatment, Expr, Function, FunctionArg,
    FunctionArgExpr, FunctionArguments, GroupByExpr, Ident, Join, JoinConstraint, ObjectName,
    OrderBy, OrderByExpr, Query, Select, SelectItem, SetExpr, Statement, TableAlias, TableFactor,
    TableWithJoins, Values, WindowSpec, WindowType, With,
};
use sqltk::{Break, Visitable, Visitor};

use crate::ast::{Arg, Node, NodeKind, Scalar};
use crate::ParseError;

pub(crate) fn lower_statement(statement: &Statement) -> Result<Node, ParseError> {
    match statement {
        Statement::Query(query) => Ok(lower_query(query)),
        other => Err(ParseError::Unsupported(format!(
            "expected a query, found {}",
            variant_name(other)
        ))),
    }
}

pub(crate) fn lower_query(query: &Query) -> Node {
    let Query {
        with,
        body,
        order_by,
        ..
    } = query;

    Node::new(NodeKind::Query)
        .with_opt("with", with.as_ref().map(lower_with))
        .with("this", lower_set_expr(body))
        .with_opt("order", order_by.as_ref().map(lower_order_by))
        .with_opt("limit", lower_query_tail(query))
}

fn lower_with(with: &With) -> Node {
    let With {
        recursive,
        cte_tables,
        ..
    } = with;

    Node::new(NodeKind::With)
        .with_flag("recursive", *recursive)
        .with_list("expressions", cte_tables.iter().map(lower_cte).collect())
}

fn lower_cte(cte: &Cte) -> Node {
    let Cte { alias, query, .. } = cte;

    Node::new(NodeKind::Cte)
        .with("this", lower_query(query))
        .with("alias", lower_table_alias(alias))
}

fn lower_table_alias(alias: &TableAlias) -> Node {
    let columns = alias
        .columns
        .iter()
        .map(|column| identifier_from_sql(&column.to_string()))
        .collect();

    Node::new(NodeKind::TableAlias)
        .with("this", identifier(&alias.name))
        .with_seq("columns", columns)
}

fn lower_order_by(order_by: &OrderBy) -> Arg {
    let keys = collect::<OrderByExpr, _>(order_by);

    if keys.is_empty() {
        // Forms such as `ORDER BY ALL` carry no key expressions.
        Arg::Scalar(Scalar::Text(order_by.to_string()))
    } else {
        Arg::Seq(keys.into_iter().map(lower_ordered).collect())
    }
}

fn lower_ordered(ordered: &OrderByExpr) -> Node {
    let rendered = ordered.to_string();
    let expr = ordered.expr.to_string();
    let modifiers = rendered
        .strip_prefix(&expr)
        .unwrap_or_default()
        .trim()
        .to_ascii_uppercase();

    let nulls = if modifiers.contains("NULLS FIRST") {
        Some("first")
    } else if modifiers.contains("NULLS LAST") {
        Some("last")
    } else {
        None
    };

    Node::new(NodeKind::Ordered)
        .with("this", lower_expr(&ordered.expr))
        .with("desc", modifiers.split_whitespace().any(|word| word == "DESC"))
        .with_opt("nulls", nulls)
}

/// LIMIT, OFFSET and FETCH are rendered after the ORDER BY (or the body when unordered). That tail is
/// kept as a template, with its expressions lowered in order.
fn lower_query_tail(query: &Query) -> Option<Node> {
    let rendered = query.to_string();
    let anchor = match &query.order_by {
        Some(order_by) => order_by.to_string(),
        None => query.body.to_string(),
    };

    let start = rendered.rfind(&anchor)? + anchor.len();
    let tail = rendered[start..].trim();
    if tail.is_empty() {
        return None;
    }

    let mut found = collect::<Expr, _>(&query.limit_clause);
    found.extend(collect::<Expr, _>(&query.fetch));

    let holes: Vec<String> = found.iter().map(|expr| expr.to_string()).collect();

    Some(
        Node::new(NodeKind::Limit)
            .with_seq("expressions", found.into_iter().map(lower_expr).collect())
            .with("sql", template(tail, &holes)),
    )
}

fn lower_set_expr(body: &SetExpr) -> Node {
    match body {
        SetExpr::Select(select) => lower_select(select),
        SetExpr::Query(query) => lower_query(query),
        SetExpr::SetOperation {
            op,
            set_quantifier,
            left,
            right,
        } => Node::new(NodeKind::SetOperation)
            .with("op", op.to_string().to_ascii_lowercase())
            .with("quantifier", set_quantifier.to_string().to_ascii_lowercase())
            .with("this", lower_set_expr(left))
            .with("expression", lower_set_expr(right)),
        SetExpr::Values(values) => lower_values(values),
        other => Node::new(NodeKind::Expression)
            .with("operator", variant_name(other))
            .with("sql", other.to_string()),
    }
}

fn lower_values(values: &Values) -> Node {
    let rows = values
        .rows
        .iter()
        .map(|row| {
            Node::new(NodeKind::Tuple).with_seq("expressions", row.iter().map(lower_expr).collect())
        })
        .collect();

    Node::new(NodeKind::Values).with_seq("expressions", rows)
}

fn lower_select(select: &Select) -> Node {
    let Select {
        distinct,
        projection,
        from,
        selection,
        group_by,
        having,
        qualify,
        ..
    } = select;

    let mut node = Node::new(NodeKind::Select);

    match distinct {
        Some(Distinct::Distinct) => node = node.with("distinct", true),
        Some(Distinct::On(exprs)) => {
            node = node.with_list("distinct_on", exprs.iter().map(lower_expr).collect())
        }
        None => {}
    }

    node = node
        .with_list(
            "expressions",
            projection.iter().map(lower_select_item).collect(),
        )
        .with_list("from", from.iter().map(lower_table_with_joins).collect())
        .with_opt("where", selection.as_ref().map(lower_expr));

    node = match group_by {
        GroupByExpr::All(_) => node.with("group_all", true),
        GroupByExpr::Expressions(exprs, _) => {
            node.with_list("group", exprs.iter().map(lower_expr).collect())
        }
    };

    node.with_opt("having", having.as_ref().map(lower_expr))
        .with_opt("qualify", qualify.as_ref().map(lower_expr))
}

fn lower_select_item(item: &SelectItem) -> Node {
    match item {
        SelectItem::UnnamedExpr(expr) => lower_expr(expr),
        SelectItem::ExprWithAlias { expr, alias } => Node::new(NodeKind::Alias)
            .with("this", lower_expr(expr))
            .with("alias", identifier(alias)),
        SelectItem::QualifiedWildcard(qualifier, _) => {
            Node::new(NodeKind::Star).with("table", identifier_from_sql(&qualifier.to_string()))
        }
        SelectItem::Wildcard(_) => Node::new(NodeKind::Star),
    }
}

fn lower_table_with_joins(table: &TableWithJoins) -> Node {
    let TableWithJoins { relation, joins } = table;

    Node::new(NodeKind::From)
        .with("this", lower_table_factor(relation))
        .with_list("joins", joins.iter().map(lower_join).collect())
}

fn lower_join(join: &Join) -> Node {
    let Join {
        relation,
        join_operator,
        ..
    } = join;

    let kind = match variant_name(join_operator).as_str() {
        "Join" | "Inner" => "inner".to_string(),
        "Left" | "LeftOuter" => "left".to_string(),
        "Right" | "RightOuter" => "right".to_string(),
        "FullOuter" => "full".to_string(),
        "CrossJoin" => "cross".to_string(),
        other => other.to_ascii_lowercase(),
    };

    let mut node = Node::new(NodeKind::Join)
        .with("this", lower_table_factor(relation))
        .with("kind", kind);

    if let Some(constraint) = collect::<JoinConstraint, _>(join_operator).first() {
        node = match constraint {
            JoinConstraint::On(expr) => node.with("on", lower_expr(expr)),
            JoinConstraint::Using(columns) => node.with_list(
                "using",
                columns
                    .iter()
                    .map(|column| identifier_from_sql(&column.to_string()))
                    .collect(),
            ),
            JoinConstraint::Natural => node.with("natural", true),
            JoinConstraint::None => node,
        };
    }

    node
}

fn lower_table_factor(factor: &TableFactor) -> Node {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let mut parts = object_name_parts(name);
            let this = parts.pop().unwrap_or_else(|| identifier_from_sql(&name.to_string()));

            Node::new(NodeKind::Table)
                .with("this", this)
                .with_opt("db", parts.pop())
                .with_opt("catalog", parts.pop())
                .with_opt("alias", alias.as_ref().map(lower_table_alias))
        }
        TableFactor::Derived {
            lateral,
            subquery,
            alias,
            ..
        } => Node::new(NodeKind::Subquery)
            .with("this", lower_query(subquery))
            .with_flag("lateral", *lateral)
            .with_opt("alias", alias.as_ref().map(lower_table_alias)),
        TableFactor::NestedJoin {
            table_with_joins,
            alias,
            ..
        } => lower_table_with_joins(table_with_joins)
            .with_opt("alias", alias.as_ref().map(lower_table_alias)),
        other => lower_generic(other),
    }
}

pub(crate) fn lower_expr(expr: &Expr) -> Node {
    match expr {
        Expr::Identifier(ident) => Node::new(NodeKind::Column).with("this", identifier(ident)),
        Expr::CompoundIdentifier(idents) => lower_compound_identifier(idents),
        Expr::Nested(inner) => lower_expr(inner),
        Expr::Value(value) => lower_literal(&value.to_string()),
        Expr::BinaryOp { left, op, right } => match op {
            BinaryOperator::And | BinaryOperator::Or => Node::new(NodeKind::Connective)
                .with("op", op.to_string().to_ascii_lowercase())
                .with(
                    "expressions",
                    Arg::List(vec![lower_expr(left), lower_expr(right)]),
                ),
            _ => Node::new(NodeKind::Binary)
                .with("op", op.to_string().to_ascii_lowercase())
                .with("this", lower_expr(left))
                .with("expression", lower_expr(right)),
        },
        Expr::UnaryOp { op, expr } => Node::new(NodeKind::Unary)
            .with("op", op.to_string().to_ascii_lowercase())
            .with("this", lower_expr(expr)),
        Expr::IsNull(inner) => Node::new(NodeKind::IsNull).with("this", lower_expr(inner)),
        Expr::IsNotNull(inner) => Node::new(NodeKind::IsNull)
            .with("this", lower_expr(inner))
            .with("negated", true),
        Expr::InList {
            expr,
            list,
            negated,
            ..
        } => Node::new(NodeKind::In)
            .with("this", lower_expr(expr))
            .with("expressions", Arg::List(list.iter().map(lower_expr).collect()))
            .with_flag("negated", *negated),
        Expr::InSubquery {
            expr,
            subquery,
            negated,
            ..
        } => Node::new(NodeKind::In)
            .with("this", lower_expr(expr))
            .with("query", lower_subquery(subquery))
            .with_flag("negated", *negated),
        Expr::Between {
            expr,
            negated,
            low,
            high,
            ..
        } => Node::new(NodeKind::Between)
            .with("this", lower_expr(expr))
            .with("low", lower_expr(low))
            .with("high", lower_expr(high))
            .with_flag("negated", *negated),
        Expr::Exists {
            subquery, negated, ..
        } => Node::new(NodeKind::Exists)
            .with("this", lower_query(subquery))
            .with_flag("negated", *negated),
        Expr::Subquery(query) => lower_subquery(query),
        Expr::Function(function) => lower_function(function),
        other => lower_generic(other),
    }
}

fn lower_subquery(query: &Query) -> Node {
    Node::new(NodeKind::Subquery).with("this", lower_query(query))
}

fn lower_compound_identifier(idents: &[Ident]) -> Node {
    let mut parts: Vec<Node> = idents.iter().map(identifier).collect();
    let Some(this) = parts.pop() else {
        return Node::new(NodeKind::Column);
    };

    Node::new(NodeKind::Column)
        .with("this", this)
        .with_opt("table", parts.pop())
        .with_opt("db", parts.pop())
        .with_opt("catalog", parts.pop())
}

/// Literals keep their type: numbers are canonicalised, strings are unquoted and keywords become
/// booleans or NULL. Anything unrecognised (placeholders, typed strings) is kept as written.
fn lower_literal(sql: &str) -> Node {
    let literal = Node::new(NodeKind::Literal);

    if sql.eq_ignore_ascii_case("null") {
        return literal.with("this", Scalar::Null);
    }
    if sql.eq_ignore_ascii_case("true") || sql.eq_ignore_ascii_case("false") {
        return literal.with("this", sql.eq_ignore_ascii_case("true"));
    }
    if let Some(text) = unquote_string(sql) {
        return literal.with("this", text).with("is_string", true);
    }
    if let Some(number) = canonical_number(sql) {
        return literal.with("this", Scalar::Number(number));
    }

    literal.with("this", sql)
}

fn unquote_string(sql: &str) -> Option<String> {
    let inner = sql.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// The canonical text of a numeric literal, so that `1.50` and `1.5` lower identically.
pub(crate) fn canonical_number(sql: &str) -> Option<String> {
    if let Ok(integer) = sql.parse::<i64>() {
        return Some(integer.to_string());
    }
    match sql.parse::<f64>() {
        Ok(float) if float.is_finite() => Some(float.to_string()),
        _ => None,
    }
}

fn lower_function(function: &Function) -> Node {
    let Function {
        name,
        args,
        filter,
        over,
        ..
    } = function;

    let name = object_name_parts(name)
        .iter()
        .filter_map(|part| part.name().map(str::to_string))
        .collect::<Vec<_>>()
        .join(".");

    let mut node = Node::new(NodeKind::Function).with("this", name);

    match args {
        FunctionArguments::None => {}
        FunctionArguments::Subquery(query) => {
            node = node.with("expressions", Arg::Seq(vec![lower_subquery(query)]))
        }
        FunctionArguments::List(list) => {
            let distinct = matches!(list.duplicate_treatment, Some(DuplicateTreatment::Distinct));
            node = node
                .with(
                    "expressions",
                    Arg::Seq(list.args.iter().map(lower_function_arg).collect()),
                )
                .with_flag("distinct", distinct);
            if !list.clauses.is_empty() {
                let clauses: Vec<String> =
                    list.clauses.iter().map(|clause| clause.to_string()).collect();
                node = node.with("clauses", clauses.join(" "));
            }
        }
    }

    node.with_opt("filter", filter.as_deref().map(lower_expr))
        .with_opt("over", over.as_ref().map(lower_window))
}

fn lower_function_arg(arg: &FunctionArg) -> Node {
    match arg {
        FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => lower_expr(expr),
        FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => Node::new(NodeKind::Star),
        FunctionArg::Unnamed(FunctionArgExpr::QualifiedWildcard(name)) => {
            Node::new(NodeKind::Star).with("table", identifier_from_sql(&name.to_string()))
        }
        other => lower_generic(other),
    }
}

fn lower_window(window: &WindowType) -> Node {
    match window {
        WindowType::WindowSpec(spec) => lower_window_spec(spec),
        WindowType::NamedWindow(name) => Node::new(NodeKind::Window).with("name", identifier(name)),
    }
}

fn lower_window_spec(spec: &WindowSpec) -> Node {
    let WindowSpec {
        partition_by,
        order_by,
        window_frame,
        ..
    } = spec;

    Node::new(NodeKind::Window)
        .with_list(
            "partition_by",
            partition_by.iter().map(lower_expr).collect(),
        )
        .with_seq("order", order_by.iter().map(lower_ordered).collect())
        .with_opt(
            "frame",
            window_frame.as_ref().map(|frame| {
                let units = &frame.units;
                let start = &frame.start_bound;
                match &frame.end_bound {
                    Some(end) => format!("{units} BETWEEN {start} AND {end}"),
                    None => format!("{units} {start}"),
                }
                .to_ascii_uppercase()
            }),
        )
}

/// Lowers any AST node without a dedicated kind.
///
/// The immediate sub-expressions and subqueries become an ordered `expressions` sequence, and the
/// rendered SQL with each of them replaced by `?` becomes the `sql` template. Two such nodes are
/// equal when they have the same operator, the same template and equal operands.
fn lower_generic<N: Visitable + Debug + std::fmt::Display>(node: &N) -> Node {
    let mut collector = Operands {
        entered: false,
        depth: 0,
        found: Vec::new(),
    };
    let _ = node.accept(&mut collector);

    let holes: Vec<String> = collector.found.iter().map(Operand::to_sql).collect();
    let operands = collector.found.iter().map(Operand::lower).collect();

    Node::new(NodeKind::Expression)
        .with("operator", variant_name(node))
        .with_seq("expressions", operands)
        .with("sql", template(&node.to_string(), &holes))
}

enum Operand<'ast> {
    Expr(&'ast Expr),
    Query(&'ast Query),
}

impl Operand<'_> {
    fn to_sql(&self) -> String {
        match self {
            Operand::Expr(expr) => expr.to_string(),
            Operand::Query(query) => query.to_string(),
        }
    }

    fn lower(&self) -> Node {
        match self {
            Operand::Expr(expr) => lower_expr(expr),
            Operand::Query(query) => lower_subquery(query),
        }
    }
}

/// Collects the outermost expressions and queries below the node it is accepted by.
///
/// `Break::SkipChildren` from `enter` ends the whole traversal, so nesting is tracked with a depth
/// counter.
struct Operands<'ast> {
    entered: bool,
    depth: usize,
    found: Vec<Operand<'ast>>,
}

fn operand<N: Visitable>(node: &N) -> Option<Operand<'_>> {
    node.downcast_ref::<Expr>()
        .map(Operand::Expr)
        .or_else(|| node.downcast_ref::<Query>().map(Operand::Query))
}

impl<'ast> Visitor<'ast> for Operands<'ast> {
    type Error = Infallible;

    fn enter<N: Visitable>(&mut self, node: &'ast N) -> ControlFlow<Break<Self::Error>> {
        // The first node entered is the root itself.
        if !self.entered {
            self.entered = true;
            return ControlFlow::Continue(());
        }

        if let Some(found) = operand(node) {
            if self.depth == 0 {
                self.found.push(found);
            }
            self.depth += 1;
        }

        ControlFlow::Continue(())
    }

    fn exit<N: Visitable>(&mut self, node: &'ast N) -> ControlFlow<Break<Self::Error>> {
        // The root is exited at depth zero.
        if self.depth > 0 && operand(node).is_some() {
            self.depth -= 1;
        }
        ControlFlow::Continue(())
    }
}

/// Every node of type `T` below `root` that is not itself inside another `T`, in traversal order.
fn collect<'ast, T: Visitable + 'static, V: Visitable>(root: &'ast V) -> Vec<&'ast T> {
    struct Collector<'ast, T> {
        depth: usize,
        found: Vec<&'ast T>,
    }

    impl<'ast, T: Visitable + 'static> Visitor<'ast> for Collector<'ast, T> {
        type Error = Infallible;

        fn enter<N: Visitable>(&mut self, node: &'ast N) -> ControlFlow<Break<Self::Error>> {
            if let Some(found) = node.downcast_ref::<T>() {
                if self.depth == 0 {
                    self.found.push(found);
                }
                self.depth += 1;
            }
            ControlFlow::Continue(())
        }

        fn exit<N: Visitable>(&mut self, node: &'ast N) -> ControlFlow<Break<Self::Error>> {
            if node.is::<T>() {
                self.depth -= 1;
            }
            ControlFlow::Continue(())
        }
    }

    let mut collector = Collector {
        depth: 0,
        found: Vec::new(),
    };
    let _ = root.accept(&mut collector);
    collector.found
}

/// Replaces each hole, in order, with `?`. Holes are searched for from the end of the previous one
/// and must sit on token boundaries, so `a` is never found inside `CAST`.
fn template(sql: &str, holes: &[String]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    for hole in holes.iter().filter(|hole| !hole.is_empty()) {
        if let Some(at) = find_token(rest, hole) {
            out.push_str(&rest[..at]);
            out.push('?');
            rest = &rest[at + hole.len()..];
        }
    }

    out.push_str(rest);
    out
}

fn find_token(haystack: &str, needle: &str) -> Option<usize> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    haystack.match_indices(needle).map(|(at, _)| at).find(|&at| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        let starts_word = needle.chars().next().is_some_and(is_word);
        let ends_word = needle.chars().next_back().is_some_and(is_word);

        !(starts_word && before.is_some_and(is_word)) && !(ends_word && after.is_some_and(is_word))
    })
}

/// The name of an enum variant, taken from its `Debug` rendering.
fn variant_name<T: Debug>(value: &T) -> String {
    let debug = format!("{value:?}");
    debug
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn object_name_parts(name: &ObjectName) -> Vec<Node> {
    name.0
        .iter()
        .map(|part| identifier_from_sql(&part.to_string()))
        .collect()
}

/// Unquoted identifiers are case-insensitive and fold to lower case; quoted ones keep their case.
fn identifier(ident: &Ident) -> Node {
    match ident.quote_style {
        Some(_) => Node::identifier(ident.value.clone()),
        None => Node::identifier(ident.value.to_lowercase()),
    }
}

pub(crate) fn identifier_from_sql(sql: &str) -> Node {
    let quoted = [('"', '"'), ('`', '`'), ('[', ']')]
        .iter()
        .find_map(|(open, close)| sql.strip_prefix(*open)?.strip_suffix(*close));

    match quoted {
        Some(name) => Node::identifier(name),
        None => Node::identifier(sql.to_lowercase()),
    }
}

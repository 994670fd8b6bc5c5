//! Shared AST utilities for the rule checkers.
//!
//! Everything here is a read-only view over `sqlparser` statements:
//! - WHERE extraction for SELECT/UPDATE/DELETE
//! - driving-table extraction
//! - referenced-column collection (lower-cased, table prefixes stripped)
//! - tautology detection
//! - literal LIMIT/OFFSET extraction, including the MySQL comma form
//!
//! Checkers never walk the raw AST themselves; keeping the traversals in one
//! place keeps the ten checkers honest about what "a column reference" or
//! "a constant" means.

use std::collections::BTreeSet;

use sqlparser::ast::{
    BinaryOperator, Delete, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments,
    ObjectName, Query, SetExpr, Statement, TableFactor, Value,
};

/// Literal LIMIT/OFFSET values of a SELECT.
///
/// A position holds `None` when the clause is absent or its value is a bind
/// placeholder; thresholds are only ever compared against literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSpec {
    pub offset: Option<u64>,
    pub row_count: Option<u64>,
}

/// Returns the WHERE expression of a SELECT, UPDATE or DELETE.
///
/// INSERT and statements without a WHERE yield `None`.
pub fn where_clause(statement: &Statement) -> Option<&Expr> {
    match statement {
        Statement::Query(query) => match query.body.as_ref() {
            SetExpr::Select(select) => select.selection.as_ref(),
            _ => None,
        },
        Statement::Update { selection, .. } => selection.as_ref(),
        Statement::Delete(delete) => delete.selection.as_ref(),
        _ => None,
    }
}

/// Returns the primary (driving) table of a SELECT, UPDATE or DELETE.
///
/// For joins this is the first table in FROM; sub-select sources yield
/// `None`.
pub fn primary_table(statement: &Statement) -> Option<String> {
    match statement {
        Statement::Query(query) => match query.body.as_ref() {
            SetExpr::Select(select) => select
                .from
                .first()
                .and_then(|table| table_factor_name(&table.relation)),
            _ => None,
        },
        Statement::Update { table, .. } => table_factor_name(&table.relation),
        Statement::Delete(delete) => delete_target(delete),
        _ => None,
    }
}

fn delete_target(delete: &Delete) -> Option<String> {
    use sqlparser::ast::FromTable;

    let tables = match &delete.from {
        FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
    };
    tables
        .first()
        .and_then(|table| table_factor_name(&table.relation))
}

fn table_factor_name(factor: &TableFactor) -> Option<String> {
    match factor {
        TableFactor::Table { name, .. } => Some(object_name_to_string(name)),
        _ => None,
    }
}

fn object_name_to_string(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

/// Collects every column name referenced anywhere in `expr`.
///
/// Names are lower-cased and table prefixes are stripped (`user.id` → `id`).
/// The walk covers AND/OR chains, comparisons, IN lists, BETWEEN, LIKE,
/// function arguments, nested parentheses and the WHERE clause of top-level
/// subqueries.
pub fn referenced_fields(expr: &Expr) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    collect_fields(expr, &mut fields);
    fields
}

fn collect_fields(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Identifier(ident) => {
            out.insert(ident.value.to_lowercase());
        }
        Expr::CompoundIdentifier(parts) => {
            if let Some(last) = parts.last() {
                out.insert(last.value.to_lowercase());
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_fields(left, out);
            collect_fields(right, out);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::Cast { expr, .. } => {
            collect_fields(expr, out);
        }
        Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::IsTrue(expr)
        | Expr::IsNotTrue(expr)
        | Expr::IsFalse(expr)
        | Expr::IsNotFalse(expr) => collect_fields(expr, out),
        Expr::InList { expr, list, .. } => {
            collect_fields(expr, out);
            for item in list {
                collect_fields(item, out);
            }
        }
        Expr::InSubquery { expr, subquery, .. } => {
            collect_fields(expr, out);
            collect_query_fields(subquery, out);
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_fields(expr, out);
            collect_fields(low, out);
            collect_fields(high, out);
        }
        Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
            collect_fields(expr, out);
            collect_fields(pattern, out);
        }
        Expr::Function(func) => collect_function_fields(func, out),
        Expr::Exists { subquery, .. } | Expr::Subquery(subquery) => {
            collect_query_fields(subquery, out);
        }
        _ => {}
    }
}

fn collect_query_fields(query: &Query, out: &mut BTreeSet<String>) {
    if let SetExpr::Select(select) = query.body.as_ref() {
        if let Some(selection) = &select.selection {
            collect_fields(selection, out);
        }
    }
}

fn collect_function_fields(func: &Function, out: &mut BTreeSet<String>) {
    if let FunctionArguments::List(list) = &func.args {
        for arg in &list.args {
            match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(expr))
                | FunctionArg::Named {
                    arg: FunctionArgExpr::Expr(expr),
                    ..
                } => collect_fields(expr, out),
                _ => {}
            }
        }
    }
}

/// Whether `expr` is a literal: number, string, boolean or NULL.
///
/// Column references and bind placeholders are not constants.
pub fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Value(value) => !matches!(value, Value::Placeholder(_)),
        Expr::Nested(inner) => is_constant(inner),
        _ => false,
    }
}

/// Whether `expr` is a tautology at this node.
///
/// Detected structurally, case-insensitively:
/// - equality between two constants with the same normalized text
///   (`1=1`, `'a'='A'`, `2=2`)
/// - the boolean literal TRUE
/// - a column compared against itself (`id = id`)
pub fn is_dummy_condition(expr: &Expr) -> bool {
    match expr {
        Expr::Nested(inner) => is_dummy_condition(inner),
        Expr::Value(Value::Boolean(true)) => true,
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            if let (Some(l), Some(r)) = (constant_text(left), constant_text(right)) {
                l == r
            } else if let (Some(l), Some(r)) = (column_path(left), column_path(right)) {
                l == r
            } else {
                false
            }
        }
        _ => false,
    }
}

/// Whether any node reachable through AND/OR is a tautology.
pub fn contains_dummy_condition(expr: &Expr) -> bool {
    if is_dummy_condition(expr) {
        return true;
    }
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And | BinaryOperator::Or,
            right,
        } => contains_dummy_condition(left) || contains_dummy_condition(right),
        Expr::Nested(inner) => contains_dummy_condition(inner),
        _ => false,
    }
}

/// Whether the WHERE as a whole filters nothing.
///
/// An AND is unfiltered only when both sides are; an OR is unfiltered as
/// soon as either side is (`x = 1 OR 1=1` matches every row).
pub fn is_effectively_unfiltered(expr: &Expr) -> bool {
    if is_dummy_condition(expr) {
        return true;
    }
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => is_effectively_unfiltered(left) && is_effectively_unfiltered(right),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => is_effectively_unfiltered(left) || is_effectively_unfiltered(right),
        Expr::Nested(inner) => is_effectively_unfiltered(inner),
        _ => false,
    }
}

/// Normalized text of a literal, for tautology comparison.
fn constant_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::Number(n, _)) => Some(n.clone()),
        Expr::Value(Value::SingleQuotedString(s) | Value::DoubleQuotedString(s)) => {
            Some(s.to_lowercase())
        }
        Expr::Value(Value::Boolean(b)) => Some(b.to_string()),
        Expr::Value(Value::Null) => Some("null".to_string()),
        Expr::Nested(inner) => constant_text(inner),
        _ => None,
    }
}

/// Full dotted column path, lower-cased.
///
/// Self-comparison detection keeps the table prefix: `u.id = id` is not
/// treated as a tautology because the two sides may resolve differently.
fn column_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => Some(
            parts
                .iter()
                .map(|ident| ident.value.to_lowercase())
                .collect::<Vec<_>>()
                .join("."),
        ),
        Expr::Nested(inner) => column_path(inner),
        _ => None,
    }
}

/// Whether the statement is a SELECT carrying a LIMIT clause, literal or not.
pub fn has_limit(statement: &Statement) -> bool {
    match statement {
        Statement::Query(query) => query.limit.is_some(),
        _ => false,
    }
}

/// Extracts literal LIMIT/OFFSET values from a SELECT.
///
/// Handles both `LIMIT n OFFSET m` and the MySQL comma form `LIMIT m, n`,
/// where the first number is the offset; the parser normalizes the comma
/// form into the same offset/limit pair. Returns `None` when the statement
/// has neither clause.
pub fn select_limit(statement: &Statement) -> Option<LimitSpec> {
    let Statement::Query(query) = statement else {
        return None;
    };
    if query.limit.is_none() && query.offset.is_none() {
        return None;
    }

    Some(LimitSpec {
        offset: query
            .offset
            .as_ref()
            .and_then(|offset| literal_u64(&offset.value)),
        row_count: query.limit.as_ref().and_then(literal_u64),
    })
}

/// Whether the statement is a SELECT with a non-empty ORDER BY.
pub fn has_order_by(statement: &Statement) -> bool {
    match statement {
        Statement::Query(query) => query
            .order_by
            .as_ref()
            .is_some_and(|order_by| !order_by.exprs.is_empty()),
        _ => false,
    }
}

fn literal_u64(expr: &Expr) -> Option<u64> {
    match expr {
        Expr::Value(Value::Number(n, _)) => n.parse().ok(),
        Expr::Nested(inner) => literal_u64(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;
    use test_case::test_case;

    fn parse(sql: &str) -> Statement {
        let dialect = GenericDialect {};
        Parser::parse_sql(&dialect, sql)
            .expect("test SQL parses")
            .into_iter()
            .next()
            .expect("one statement")
    }

    fn parse_where(sql: &str) -> Expr {
        let statement = parse(sql);
        where_clause(&statement).expect("test SQL has a WHERE").clone()
    }

    #[test]
    fn where_clause_per_statement_kind() {
        assert!(where_clause(&parse("SELECT * FROM t WHERE a = 1")).is_some());
        assert!(where_clause(&parse("SELECT * FROM t")).is_none());
        assert!(where_clause(&parse("UPDATE t SET a = 1 WHERE b = 2")).is_some());
        assert!(where_clause(&parse("UPDATE t SET a = 1")).is_none());
        assert!(where_clause(&parse("DELETE FROM t WHERE a = 1")).is_some());
        assert!(where_clause(&parse("DELETE FROM t")).is_none());
        assert!(where_clause(&parse("INSERT INTO t (a) VALUES (1)")).is_none());
    }

    #[test_case("SELECT * FROM users", Some("users"))]
    #[test_case("SELECT * FROM users u JOIN orders o ON u.id = o.user_id", Some("users"))]
    #[test_case("UPDATE accounts SET balance = 0", Some("accounts"))]
    #[test_case("DELETE FROM audit_log", Some("audit_log"))]
    #[test_case("INSERT INTO t (a) VALUES (1)", None)]
    fn primary_table_extraction(sql: &str, expected: Option<&str>) {
        assert_eq!(primary_table(&parse(sql)).as_deref(), expected);
    }

    #[test]
    fn referenced_fields_strip_prefixes_and_lowercase() {
        let expr = parse_where(
            "SELECT * FROM t WHERE u.ID = 1 AND Name LIKE 'a%' OR status IN (1, 2) \
             AND created BETWEEN 1 AND 2 AND LOWER(email) = 'x'",
        );
        let fields = referenced_fields(&expr);
        let expected: BTreeSet<String> = ["id", "name", "status", "created", "email"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(fields, expected);
    }

    #[test]
    fn referenced_fields_reach_subquery_where() {
        let expr =
            parse_where("SELECT * FROM t WHERE id IN (SELECT user_id FROM orders WHERE total > 5)");
        let fields = referenced_fields(&expr);
        assert!(fields.contains("id"));
        assert!(fields.contains("total"));
    }

    #[test]
    fn constants_are_literals_only() {
        let literals = parse_where("SELECT * FROM t WHERE 1 = 'x'");
        if let Expr::BinaryOp { left, right, .. } = literals {
            assert!(is_constant(&left));
            assert!(is_constant(&right));
        } else {
            panic!("expected a comparison");
        }

        let placeholder = parse_where("SELECT * FROM t WHERE a = ?");
        if let Expr::BinaryOp { left, right, .. } = placeholder {
            assert!(!is_constant(&left));
            assert!(!is_constant(&right));
        } else {
            panic!("expected a comparison");
        }
    }

    #[test_case("1 = 1", true ; "bare_1_1")]
    #[test_case("2=2", true)]
    #[test_case("'a' = 'A'", true)]
    #[test_case("'1' = '1'", true)]
    #[test_case("true", true)]
    #[test_case("id = id", true)]
    #[test_case("(1 = 1)", true ; "parenthesized_1_1")]
    #[test_case("1 = 2", false)]
    #[test_case("a = 1", false)]
    #[test_case("a = b", false)]
    #[test_case("u.id = id", false)]
    #[test_case("a = ?", false)]
    fn dummy_condition_detection(condition: &str, expected: bool) {
        let expr = parse_where(&format!("SELECT * FROM t WHERE {condition}"));
        assert_eq!(is_dummy_condition(&expr), expected, "{condition}");
    }

    #[test]
    fn dummy_conditions_are_found_through_and_or() {
        let expr = parse_where("SELECT * FROM t WHERE a = 1 AND (b = 2 OR 1 = 1)");
        assert!(contains_dummy_condition(&expr));

        let clean = parse_where("SELECT * FROM t WHERE a = 1 AND b = 2");
        assert!(!contains_dummy_condition(&clean));
    }

    #[test]
    fn unfiltered_where_detection() {
        assert!(is_effectively_unfiltered(&parse_where(
            "SELECT * FROM t WHERE 1 = 1"
        )));
        assert!(is_effectively_unfiltered(&parse_where(
            "SELECT * FROM t WHERE 1 = 1 AND 'a' = 'a'"
        )));
        // OR with a tautological arm matches everything
        assert!(is_effectively_unfiltered(&parse_where(
            "SELECT * FROM t WHERE a = 1 OR 1 = 1"
        )));
        // AND with one real predicate still filters
        assert!(!is_effectively_unfiltered(&parse_where(
            "SELECT * FROM t WHERE a = 1 AND 1 = 1"
        )));
        assert!(!is_effectively_unfiltered(&parse_where(
            "SELECT * FROM t WHERE a = 1"
        )));
    }

    #[test]
    fn limit_extraction_offset_keyword_form() {
        let spec = select_limit(&parse("SELECT * FROM t LIMIT 100 OFFSET 100000"))
            .expect("limit present");
        assert_eq!(spec.offset, Some(100_000));
        assert_eq!(spec.row_count, Some(100));
    }

    #[test]
    fn limit_extraction_comma_form_first_number_is_offset() {
        let spec = select_limit(&parse("SELECT * FROM t LIMIT 100000, 100")).expect("limit present");
        assert_eq!(spec.offset, Some(100_000));
        assert_eq!(spec.row_count, Some(100));
    }

    #[test]
    fn limit_placeholders_yield_unknown_positions() {
        let spec = select_limit(&parse("SELECT * FROM t LIMIT ? OFFSET ?")).expect("limit present");
        assert_eq!(spec.offset, None);
        assert_eq!(spec.row_count, None);
        assert!(has_limit(&parse("SELECT * FROM t LIMIT ? OFFSET ?")));
    }

    #[test]
    fn statements_without_limit() {
        assert!(select_limit(&parse("SELECT * FROM t")).is_none());
        assert!(!has_limit(&parse("SELECT * FROM t")));
        assert!(!has_limit(&parse("DELETE FROM t")));
    }

    #[test]
    fn order_by_detection() {
        assert!(has_order_by(&parse("SELECT * FROM t ORDER BY id")));
        assert!(!has_order_by(&parse("SELECT * FROM t")));
        assert!(!has_order_by(&parse("DELETE FROM t")));
    }
}

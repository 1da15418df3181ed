//! End-to-end statement compilation from JSON-shaped input.
//!
//! These tests drive the public builder API the way the facade does:
//! condition trees, column specs and join specs parsed from ordered JSON,
//! compiled per dialect into SQL text and positional parameters.

use serde_json::json;
use sqlweave_core::builder::{Aggregate, Columns, Join, QueryBuilder, Replacements, Values, Where};
use sqlweave_core::{CompileError, DialectKind, SqlValue};

fn text(s: &str) -> SqlValue {
    SqlValue::Text(String::from(s))
}

fn compile(tree: serde_json::Value) -> (String, Vec<SqlValue>) {
    Where::from_json(&tree).unwrap().compile().unwrap()
}

// =============================================================================
// Condition trees
// =============================================================================

#[test]
fn test_sibling_conditions_keep_insertion_order() {
    let (sql, params) = compile(json!({"age[>]": 18, "name[LIKE]": "A%"}));
    assert_eq!(sql, "age > ? AND name LIKE ?");
    assert_eq!(params, vec![SqlValue::Int(18), text("A%")]);
}

#[test]
fn test_and_group_is_parenthesized() {
    let (sql, params) = compile(json!({"AND": {"type": "business", "age[<]": 18}}));
    assert_eq!(sql, "(type = ? AND age < ?)");
    assert_eq!(params, vec![text("business"), SqlValue::Int(18)]);
}

#[test]
fn test_in_list_placeholders() {
    let (sql, params) = compile(json!({"id[IN]": [1, 2, 3]}));
    assert_eq!(sql, "id IN (?, ?, ?)");
    assert_eq!(
        params,
        vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
    );
}

#[test]
fn test_commented_groups_and_nesting() {
    let (sql, params) = compile(json!({
        "OR #price": {"price[<]": 10, "price[>]": 100},
        "OR #status": {
            "status": null,
            "AND": {"status[!=]": "archived", "score[NOT BETWEEN]": [1, 5]}
        }
    }));
    assert_eq!(
        sql,
        "(price < ? OR price > ?) AND (status IS NULL OR (status != ? AND score NOT BETWEEN ? AND ?))"
    );
    assert_eq!(
        params,
        vec![
            SqlValue::Int(10),
            SqlValue::Int(100),
            text("archived"),
            SqlValue::Int(1),
            SqlValue::Int(5),
        ]
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let tree = json!({
        "user_id[>=]": 200,
        "OR": {"email[~]": "gmail", "name[NOT IN]": ["foo", "bar"]},
        "created[BETWEEN]": ["2024-01-01", "2024-12-31"]
    });
    let first = compile(tree.clone());
    let second = compile(tree);
    assert_eq!(first, second);
    assert_eq!(first.0.matches('?').count(), first.1.len());
}

#[test]
fn test_malformed_keys_fail_before_sql() {
    assert!(matches!(
        Where::from_json(&json!({"age[~~]": 1})),
        Err(CompileError::UnknownOperator { .. })
    ));
    assert!(matches!(
        Where::from_json(&json!({"id[IN]": 3})).and_then(|w| w.compile()),
        Err(CompileError::ExpectedList { .. })
    ));
    assert!(matches!(
        Where::from_json(&json!({"AND": 1})),
        Err(CompileError::InvalidGroup(_))
    ));
}

// =============================================================================
// SELECT and aggregates
// =============================================================================

#[test]
fn test_select_from_json_pieces() {
    let builder = QueryBuilder::new(DialectKind::MySql).with_prefix("wp_");
    let joins = Join::from_json(&json!({"[>]account(a)": {"author_id": "user_id"}})).unwrap();
    let columns = Columns::from_json(&json!(["post.title", "a.name(author)"])).unwrap();
    let filter = Where::from_json(&json!({
        "a.active": true,
        "ORDER": {"post.created": "DESC"},
        "LIMIT": [20, 10]
    }))
    .unwrap();

    let stmt = builder.select("post", &joins, &columns, &filter).unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT post.title, a.name AS author FROM `wp_post` LEFT JOIN `wp_account` AS `a` \
         ON `wp_post`.author_id = `a`.user_id WHERE a.active = ? ORDER BY post.created DESC \
         LIMIT 10 OFFSET 20"
    );
    assert_eq!(stmt.params(), &[SqlValue::Int(1)]);
}

#[test]
fn test_limit_per_dialect() {
    let filter = Where::new().limit(5).offset(10);
    let sql = |kind| {
        QueryBuilder::new(kind)
            .select("t", &[], &Columns::All, &filter)
            .unwrap()
            .sql()
            .to_owned()
    };
    assert_eq!(sql(DialectKind::PgSql), "SELECT * FROM \"t\" LIMIT 5 OFFSET 10");
    assert_eq!(
        sql(DialectKind::MsSql),
        "SELECT * FROM \"t\" ORDER BY (SELECT 0) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
    );
    assert_eq!(
        sql(DialectKind::Oracle),
        "SELECT * FROM \"t\" OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
    );
}

#[test]
fn test_count_with_condition() {
    let stmt = QueryBuilder::new(DialectKind::Sqlite)
        .aggregate(
            Aggregate::Count,
            "users",
            &[],
            "*",
            &Where::new().field("age[>]", 30),
        )
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT COUNT(*) AS aggregate FROM `users` WHERE age > ?"
    );
}

#[test]
fn test_join_without_constraint_is_rejected() {
    let err = QueryBuilder::new(DialectKind::PgSql)
        .select("post", &[Join::left("account")], &Columns::All, &Where::new())
        .unwrap_err();
    assert_eq!(err, CompileError::JoinWithoutConstraint(String::from("account")));
}

// =============================================================================
// Mutations
// =============================================================================

#[test]
fn test_multi_row_insert_rejects_mismatched_rows() {
    let rows = [
        Values::new().set("a", 1).set("b", 2),
        Values::new().set("a", 3).set("c", 4),
    ];
    let err = QueryBuilder::new(DialectKind::MySql)
        .insert("t", &rows)
        .unwrap_err();
    assert_eq!(err, CompileError::ColumnSetMismatch { row: 1 });
}

#[test]
fn test_multi_row_insert_binds_in_first_row_order() {
    let rows = [
        Values::new().set("a", 1).set("b", 2),
        Values::new().set("b", 4).set("a", 3),
    ];
    let stmt = QueryBuilder::new(DialectKind::Sqlite).insert("t", &rows).unwrap();
    assert_eq!(stmt.sql(), "INSERT INTO `t` (a, b) VALUES (?, ?), (?, ?)");
    assert_eq!(
        stmt.params(),
        &[
            SqlValue::Int(1),
            SqlValue::Int(2),
            SqlValue::Int(3),
            SqlValue::Int(4)
        ]
    );
}

#[test]
fn test_values_are_never_interpolated() {
    let hostile = "x'); DROP TABLE users; --";
    let builder = QueryBuilder::new(DialectKind::PgSql);
    let statements = [
        builder
            .insert("users", &[Values::new().set("name", hostile)])
            .unwrap(),
        builder
            .update(
                "users",
                &Values::new().set("name", hostile),
                &Where::new().field("name", hostile),
            )
            .unwrap(),
        builder
            .replace(
                "users",
                &Replacements::new().replace("name", hostile, "safe"),
                &Where::new(),
            )
            .unwrap(),
        builder
            .delete("users", &Where::new().field("name[!=]", hostile))
            .unwrap(),
    ];
    for stmt in statements {
        assert!(!stmt.sql().contains("DROP"), "{}", stmt.sql());
        assert!(stmt.params().contains(&text(hostile)));
    }
}

#[test]
fn test_update_arithmetic_and_json_values() {
    let data = Values::from_json(&json!({"age[+]": 1, "meta": {"tags": ["a"]}})).unwrap();
    let stmt = QueryBuilder::new(DialectKind::MySql)
        .update("users", &data, &Where::new())
        .unwrap();
    assert_eq!(stmt.sql(), "UPDATE `users` SET age = age + ?, meta = ?");
    assert_eq!(
        stmt.params(),
        &[SqlValue::Int(1), text(r#"{"tags":["a"]}"#)]
    );
}

#[test]
fn test_inline_rendering_for_logs() {
    let stmt = QueryBuilder::new(DialectKind::Sqlite)
        .select(
            "users",
            &[],
            &Columns::All,
            &Where::new().field("name", "O'Brien").field("age", 40),
        )
        .unwrap();
    assert_eq!(
        stmt.to_inline_sql(),
        "SELECT * FROM `users` WHERE name = 'O''Brien' AND age = 40"
    );
}

// Parser Integration Tests
//
// End-to-end coverage of tokenizing and parsing through the public API.

use anyhow::Result;

use squill::parser::ast::{
    Expression, JoinType, Operator, SelectColumn, TableExpr, Value,
};
use squill::parser::{tokenize, TokenKind};
use squill::{parse, ParseError};

#[test]
fn test_tokenize_select_star() {
    let tokens = tokenize("SELECT * FROM users");

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0].kind, TokenKind::Keyword("SELECT".to_string()));
    assert_eq!(tokens[1].kind, TokenKind::Special('*'));
    assert_eq!(tokens[2].kind, TokenKind::Keyword("FROM".to_string()));
    assert_eq!(tokens[3].kind, TokenKind::Identifier("users".to_string()));
}

#[test]
fn test_tokenizer_never_fails() {
    // Unrecognized characters become opaque special tokens
    let tokens = tokenize("SELECT @ # $");
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[1].kind, TokenKind::Special('@'));
}

#[test]
fn test_parse_where_comparison() -> Result<()> {
    let stmt = parse("SELECT a FROM t WHERE a = 1")?;

    assert_eq!(stmt.columns.len(), 1);
    assert!(matches!(
        &stmt.columns[0],
        SelectColumn::Expression(Expression::Column(_))
    ));

    match &stmt.from[0] {
        TableExpr::Table(table) => assert_eq!(table.name, "t"),
        other => panic!("expected base table, got {:?}", other),
    }

    match stmt.where_clause {
        Some(Expression::BinaryOp { op, left, right }) => {
            assert_eq!(op, Operator::Equals);
            assert!(matches!(*left, Expression::Column(_)));
            assert_eq!(*right, Expression::Literal(Value::Number(1.0)));
        }
        other => panic!("expected comparison in WHERE, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_missing_select_list_error_points_at_from() {
    let err = parse("SELECT FROM t").unwrap_err();

    match err {
        ParseError::UnexpectedToken { kind, position } => {
            assert_eq!(kind, TokenKind::Keyword("FROM".to_string()));
            assert_eq!(position, 7);
        }
        other => panic!("expected UnexpectedToken at FROM, got {:?}", other),
    }
}

#[test]
fn test_parse_full_clause_set() -> Result<()> {
    let stmt = parse(
        "SELECT dept, COUNT(*) FROM employees \
         WHERE salary > 50000 \
         GROUP BY dept \
         HAVING COUNT(*) > 3 \
         ORDER BY dept DESC \
         LIMIT 20;",
    )?;

    assert_eq!(stmt.columns.len(), 2);
    assert!(stmt.where_clause.is_some());
    assert_eq!(stmt.group_by.as_ref().map(Vec::len), Some(1));
    assert!(stmt.having.is_some());
    assert_eq!(stmt.order_by.len(), 1);
    assert_eq!(stmt.limit, Some(20));
    Ok(())
}

#[test]
fn test_parse_join_variants() -> Result<()> {
    for (sql, expected) in [
        ("SELECT * FROM a JOIN b ON a.x = b.x", JoinType::Inner),
        ("SELECT * FROM a INNER JOIN b ON a.x = b.x", JoinType::Inner),
        ("SELECT * FROM a LEFT JOIN b ON a.x = b.x", JoinType::LeftOuter),
        (
            "SELECT * FROM a RIGHT OUTER JOIN b ON a.x = b.x",
            JoinType::RightOuter,
        ),
    ] {
        let stmt = parse(sql)?;
        match &stmt.from[0] {
            TableExpr::Join { join_type, .. } => assert_eq!(*join_type, expected, "{}", sql),
            other => panic!("expected join for {}, got {:?}", sql, other),
        }
    }
    Ok(())
}

#[test]
fn test_parse_string_literals_and_like() -> Result<()> {
    let stmt = parse("SELECT * FROM users WHERE name LIKE 'A%'")?;

    match stmt.where_clause {
        Some(Expression::BinaryOp { op, right, .. }) => {
            assert_eq!(op, Operator::Like);
            assert_eq!(*right, Expression::Literal(Value::String("A%".to_string())));
        }
        other => panic!("expected LIKE, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_operator_precedence_or_over_and() -> Result<()> {
    // a = 1 AND b = 2 OR c = 3 groups as (a = 1 AND b = 2) OR (c = 3)
    let stmt = parse("SELECT * FROM t WHERE a = 1 AND b = 2 OR c = 3")?;

    match stmt.where_clause {
        Some(Expression::BinaryOp { op, left, .. }) => {
            assert_eq!(op, Operator::Or);
            match *left {
                Expression::BinaryOp { op, .. } => assert_eq!(op, Operator::And),
                other => panic!("expected AND on the left, got {:?}", other),
            }
        }
        other => panic!("expected OR at the top, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_parse_rejects_malformed_input() {
    for sql in [
        "",
        "SELECT",
        "SELECT a",
        "SELECT a FROM",
        "SELECT a FROM t WHERE",
        "SELECT a FROM t GROUP dept",
        "SELECT a FROM t LIMIT many",
        "FROM t SELECT a",
    ] {
        assert!(parse(sql).is_err(), "expected failure for {:?}", sql);
    }
}

#[test]
fn test_parsed_ast_serializes() -> Result<()> {
    let stmt = parse("SELECT u.name FROM users u WHERE u.id = 7")?;
    let json = serde_json::to_string(&stmt)?;
    assert!(json.contains("users"));
    Ok(())
}

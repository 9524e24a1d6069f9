// SELECT Statement Parser Implementation
//
// This module implements parsing for the SELECT grammar subset:
// SELECT list FROM tables-and-joins [WHERE] [GROUP BY] [HAVING] [ORDER BY]
// [LIMIT], with the trailing clauses in that fixed order.

use crate::parser::ast::{
    JoinType, OrderByItem, OrderDirection, SelectColumn, SelectStatement, TableExpr, TableRef,
};
use crate::parser::lexer::TokenKind;

use super::parser_core::{ParseResult, Parser};
use super::parser_expressions::parse_expression;

/// Parse a complete SELECT statement, consuming all input
pub fn parse_select(parser: &mut Parser) -> ParseResult<SelectStatement> {
    parser.expect_keyword("SELECT")?;
    let columns = parse_select_columns(parser)?;

    parser.expect_keyword("FROM")?;
    let from = parse_from(parser)?;

    let where_clause = if parser.consume_keyword("WHERE") {
        Some(parse_expression(parser)?)
    } else {
        None
    };

    let group_by = if parser.consume_keyword("GROUP") {
        parser.expect_keyword("BY")?;
        Some(parse_expression_list(parser)?)
    } else {
        None
    };

    let having = if parser.consume_keyword("HAVING") {
        Some(parse_expression(parser)?)
    } else {
        None
    };

    let order_by = if parser.consume_keyword("ORDER") {
        parser.expect_keyword("BY")?;
        parse_order_by_items(parser)?
    } else {
        Vec::new()
    };

    let limit = if parser.consume_keyword("LIMIT") {
        Some(parse_limit_count(parser)?)
    } else {
        None
    };

    // Optional trailing semicolon; anything after it is an error
    parser.consume_special(';');
    if !parser.at_end() {
        return Err(parser.unexpected());
    }

    Ok(SelectStatement {
        columns,
        from,
        where_clause,
        group_by,
        having,
        order_by,
        limit,
    })
}

/// Parse the SELECT column list: `*` or comma-separated expressions
fn parse_select_columns(parser: &mut Parser) -> ParseResult<Vec<SelectColumn>> {
    let mut columns = Vec::new();

    loop {
        if parser.current_is_special('*') {
            parser.advance();
            columns.push(SelectColumn::Wildcard);
        } else {
            columns.push(SelectColumn::Expression(parse_expression(parser)?));
        }

        if parser.consume_special(',') {
            continue;
        }
        break;
    }

    Ok(columns)
}

/// Parse the FROM clause: comma-separated entries, each a table followed by
/// zero or more JOIN clauses folding left-associatively.
fn parse_from(parser: &mut Parser) -> ParseResult<Vec<TableExpr>> {
    let mut entries = Vec::new();

    loop {
        let mut entry = TableExpr::Table(parse_table_ref(parser)?);

        while at_join_keyword(parser) {
            let join_type = parse_join_type(parser)?;
            let right = parse_table_ref(parser)?;

            let condition = if parser.consume_keyword("ON") {
                Some(parse_expression(parser)?)
            } else {
                None
            };

            entry = TableExpr::Join {
                join_type,
                method: None,
                left: Box::new(entry),
                right: Box::new(TableExpr::Table(right)),
                condition,
            };
        }

        entries.push(entry);

        if parser.consume_special(',') {
            continue;
        }
        break;
    }

    Ok(entries)
}

fn at_join_keyword(parser: &Parser) -> bool {
    parser.current_is_keyword("JOIN")
        || parser.current_is_keyword("INNER")
        || parser.current_is_keyword("LEFT")
        || parser.current_is_keyword("RIGHT")
}

/// Parse the JOIN keyword sequence and return the join type. Plain JOIN and
/// INNER JOIN are inner; LEFT/RIGHT take an optional OUTER.
fn parse_join_type(parser: &mut Parser) -> ParseResult<JoinType> {
    if parser.consume_keyword("JOIN") {
        return Ok(JoinType::Inner);
    }
    if parser.consume_keyword("INNER") {
        parser.expect_keyword("JOIN")?;
        return Ok(JoinType::Inner);
    }
    if parser.consume_keyword("LEFT") {
        parser.consume_keyword("OUTER");
        parser.expect_keyword("JOIN")?;
        return Ok(JoinType::LeftOuter);
    }
    if parser.consume_keyword("RIGHT") {
        parser.consume_keyword("OUTER");
        parser.expect_keyword("JOIN")?;
        return Ok(JoinType::RightOuter);
    }
    Err(parser.expectation_error("JOIN"))
}

/// Parse a table reference with an optional alias (explicit AS or a bare
/// trailing identifier).
fn parse_table_ref(parser: &mut Parser) -> ParseResult<TableRef> {
    let name = parser.expect_identifier()?;

    let alias = if parser.consume_keyword("AS") {
        Some(parser.expect_identifier()?)
    } else if let Some(token) = parser.current() {
        // A bare identifier right after the table name is an implicit alias;
        // keywords lex as Keyword tokens so clause boundaries are safe
        if let TokenKind::Identifier(alias) = &token.kind {
            let alias = alias.clone();
            parser.advance();
            Some(alias)
        } else {
            None
        }
    } else {
        None
    };

    Ok(TableRef::new(name, alias))
}

/// Parse a comma-separated expression list (GROUP BY)
fn parse_expression_list(parser: &mut Parser) -> ParseResult<Vec<crate::parser::ast::Expression>> {
    let mut expressions = Vec::new();

    loop {
        expressions.push(parse_expression(parser)?);
        if parser.consume_special(',') {
            continue;
        }
        break;
    }

    Ok(expressions)
}

/// Parse ORDER BY items with optional ASC/DESC per item (default ASC)
fn parse_order_by_items(parser: &mut Parser) -> ParseResult<Vec<OrderByItem>> {
    let mut items = Vec::new();

    loop {
        let expr = parse_expression(parser)?;
        let direction = if parser.consume_keyword("DESC") {
            OrderDirection::Desc
        } else {
            parser.consume_keyword("ASC");
            OrderDirection::Asc
        };
        items.push(OrderByItem { expr, direction });

        if parser.consume_special(',') {
            continue;
        }
        break;
    }

    Ok(items)
}

/// Parse the LIMIT count: a single integer
fn parse_limit_count(parser: &mut Parser) -> ParseResult<u64> {
    match parser.current() {
        Some(token) => {
            if let TokenKind::Number(value) = token.kind {
                if value.fract() == 0.0 && value >= 0.0 {
                    parser.advance();
                    return Ok(value as u64);
                }
            }
            Err(parser.expectation_error("integer LIMIT count"))
        }
        None => Err(parser.unexpected()),
    }
}

// Expression Parser Implementation
//
// This module implements expression parsing for the SELECT grammar subset.
// Precedence is deliberately flat: OR binds loosest, then AND, then a single
// comparison level whose operands are primary expressions. There is no
// chained comparison and no arithmetic precedence ladder; arithmetic
// grouping is expressed with parentheses.

use crate::parser::ast::{ColumnRef, Expression, Operator, Value};
use crate::parser::lexer::TokenKind;

use super::parser_core::{operator_from_str, ParseResult, Parser};

/// Parse an expression (entry point: the OR level)
pub fn parse_expression(parser: &mut Parser) -> ParseResult<Expression> {
    let mut left = parse_and(parser)?;

    while parser.consume_keyword("OR") {
        let right = parse_and(parser)?;
        left = Expression::BinaryOp {
            op: Operator::Or,
            left: Box::new(left),
            right: Box::new(right),
        };
    }

    Ok(left)
}

/// Parse the AND level
fn parse_and(parser: &mut Parser) -> ParseResult<Expression> {
    let mut left = parse_comparison(parser)?;

    while parser.consume_keyword("AND") {
        let right = parse_comparison(parser)?;
        left = Expression::BinaryOp {
            op: Operator::And,
            left: Box::new(left),
            right: Box::new(right),
        };
    }

    Ok(left)
}

/// Parse the single flat comparison level: a primary expression optionally
/// followed by one operator and a second primary expression.
fn parse_comparison(parser: &mut Parser) -> ParseResult<Expression> {
    let left = parse_primary(parser)?;

    let op = match parser.current() {
        Some(token) => match &token.kind {
            TokenKind::Operator(text) => operator_from_str(text),
            // `*` lexes as Special for the wildcard's sake; in operator
            // position it means multiplication
            TokenKind::Special('*') => Some(Operator::Multiply),
            TokenKind::Keyword(k) if k == "LIKE" => Some(Operator::Like),
            TokenKind::Keyword(k) if k == "IN" => Some(Operator::In),
            _ => None,
        },
        None => None,
    };

    match op {
        Some(op) => {
            parser.advance();
            let right = parse_primary(parser)?;
            Ok(Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        None => Ok(left),
    }
}

/// Parse a primary expression: parenthesized sub-expression, function call,
/// dotted column reference, or literal.
fn parse_primary(parser: &mut Parser) -> ParseResult<Expression> {
    match parser.current() {
        Some(token) => match token.kind.clone() {
            TokenKind::Special('(') => {
                parser.advance();
                let expr = parse_expression(parser)?;
                parser.expect_special(')')?;
                Ok(expr)
            }
            TokenKind::Number(value) => {
                parser.advance();
                Ok(Expression::Literal(Value::Number(value)))
            }
            TokenKind::StringLit(value) => {
                parser.advance();
                Ok(Expression::Literal(Value::String(value)))
            }
            TokenKind::Identifier(name) => {
                parser.advance();
                if parser.current_is_special('(') {
                    parse_function_call(parser, name)
                } else {
                    parse_column_reference(parser, name)
                }
            }
            _ => Err(parser.unexpected()),
        },
        None => Err(parser.unexpected()),
    }
}

/// Parse the argument list of a function call; the name has been consumed
/// and the current token is the opening parenthesis.
fn parse_function_call(parser: &mut Parser, name: String) -> ParseResult<Expression> {
    parser.expect_special('(')?;

    let mut args = Vec::new();
    if !parser.current_is_special(')') {
        loop {
            if parser.current_is_special('*') {
                parser.advance();
                args.push(Expression::Wildcard);
            } else {
                args.push(parse_expression(parser)?);
            }

            if parser.consume_special(',') {
                continue;
            }
            break;
        }
    }

    parser.expect_special(')')?;
    Ok(Expression::Function { name, args })
}

/// Parse the remainder of a dotted column reference; the first identifier
/// has been consumed already.
fn parse_column_reference(parser: &mut Parser, first: String) -> ParseResult<Expression> {
    let mut parts = vec![first];

    while parser.current_is_special('.') {
        parser.advance();
        parts.push(parser.expect_identifier()?);
    }

    Ok(Expression::Column(ColumnRef::new(parts)))
}

// SQL Parser Module
//
// This module is responsible for tokenizing SQL queries and converting them
// into an abstract syntax tree (AST) representation.

pub mod ast;
pub mod components;
pub mod lexer;

pub use self::components::parser_core::{ParseError, ParseResult, Parser};
pub use self::lexer::{tokenize, Lexer, Token, TokenKind};

use self::ast::SelectStatement;
use self::components::parser_select::parse_select;

/// Parse a SQL SELECT statement into its AST
pub fn parse(sql: &str) -> ParseResult<SelectStatement> {
    let mut parser = Parser::new(sql);
    parse_select(&mut parser)
}

// Core Parser Implementation
//
// This module implements the shared parser state and token helpers used by
// the grammar productions in parser_select and parser_expressions.

use thiserror::Error;

use crate::parser::ast::Operator;
use crate::parser::lexer::{tokenize, Token, TokenKind};

/// SQL parsing errors. Each variant carries the offending token and its byte
/// offset so callers can point at the failure site.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token {kind:?} at offset {position}")]
    UnexpectedToken { kind: TokenKind, position: usize },
    #[error("expected {expected} but found {kind:?} at offset {position}")]
    Expected {
        expected: String,
        kind: TokenKind,
        position: usize,
    },
    #[error("unexpected end of input")]
    EndOfInput,
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// SQL parser consuming a token sequence
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from a SQL query string
    pub fn new(input: &str) -> Self {
        Parser {
            tokens: tokenize(input),
            pos: 0,
        }
    }

    /// The current token, if any input remains
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Advance past the current token
    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// True when every token has been consumed
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check whether the current token is the given keyword
    pub fn current_is_keyword(&self, keyword: &str) -> bool {
        matches!(self.current(), Some(Token { kind: TokenKind::Keyword(k), .. }) if k == keyword)
    }

    /// Check whether the current token is the given special character
    pub fn current_is_special(&self, ch: char) -> bool {
        matches!(self.current(), Some(Token { kind: TokenKind::Special(c), .. }) if *c == ch)
    }

    /// Consume the current token if it is the given keyword
    pub fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.current_is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it is the given special character
    pub fn consume_special(&mut self, ch: char) -> bool {
        if self.current_is_special(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require the given keyword at the current position
    pub fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.expectation_error(keyword))
        }
    }

    /// Require the given special character at the current position
    pub fn expect_special(&mut self, ch: char) -> ParseResult<()> {
        if self.consume_special(ch) {
            Ok(())
        } else {
            Err(self.expectation_error(&format!("'{}'", ch)))
        }
    }

    /// Require an identifier at the current position and return its text
    pub fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.current() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                ..
            }) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            Some(token) => Err(ParseError::Expected {
                expected: "identifier".to_string(),
                kind: token.kind.clone(),
                position: token.position,
            }),
            None => Err(ParseError::EndOfInput),
        }
    }

    /// Build an error describing what was expected at the current position
    pub fn expectation_error(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(token) => ParseError::Expected {
                expected: expected.to_string(),
                kind: token.kind.clone(),
                position: token.position,
            },
            None => ParseError::EndOfInput,
        }
    }

    /// Build an unexpected-token error for the current position
    pub fn unexpected(&self) -> ParseError {
        match self.current() {
            Some(token) => ParseError::UnexpectedToken {
                kind: token.kind.clone(),
                position: token.position,
            },
            None => ParseError::EndOfInput,
        }
    }
}

/// Map an operator token's text to the AST operator it denotes. `&&` and
/// `||` are accepted as spellings of AND and OR.
pub fn operator_from_str(op: &str) -> Option<Operator> {
    match op {
        "=" => Some(Operator::Equals),
        "<>" | "!=" => Some(Operator::NotEquals),
        "<" => Some(Operator::LessThan),
        ">" => Some(Operator::GreaterThan),
        "<=" => Some(Operator::LessEquals),
        ">=" => Some(Operator::GreaterEquals),
        "+" => Some(Operator::Plus),
        "-" => Some(Operator::Minus),
        "/" => Some(Operator::Divide),
        "%" => Some(Operator::Modulo),
        "&&" => Some(Operator::And),
        "||" => Some(Operator::Or),
        _ => None,
    }
}

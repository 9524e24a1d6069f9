// SQL Lexer Implementation
//
// This module implements a lexer that breaks a SQL query string into a flat
// sequence of typed tokens. The lexer never fails: characters it does not
// recognize become Special tokens and rejection is deferred to the parser.

use std::collections::HashSet;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Reserved words, matched case-insensitively and normalized to uppercase.
static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "AND", "AS", "ASC", "BY", "DESC", "EXISTS", "FROM", "GROUP", "HAVING",
        "IN", "INNER", "JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "ON", "OR",
        "ORDER", "OUTER", "RIGHT", "SELECT", "WHERE",
    ]
    .into_iter()
    .collect()
});

/// SQL token categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    /// Reserved word, normalized to uppercase
    Keyword(String),
    /// Identifier, original case preserved
    Identifier(String),
    /// Numeric literal (integer or decimal)
    Number(f64),
    /// Single-quoted string literal (quotes stripped)
    StringLit(String),
    /// Comparison or arithmetic operator
    Operator(String),
    /// Any other single character: punctuation, `*`, and anything the lexer
    /// does not recognize
    Special(char),
    /// End of input
    Eof,
}

/// A token together with its byte offset into the source text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.kind, self.position)
    }
}

/// SQL lexer over a query string
pub struct Lexer<'a> {
    input: Peekable<CharIndices<'a>>,
    len: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from a SQL query string
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.input.peek() {
            if c.is_whitespace() {
                self.input.next();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword starting with `first`
    fn read_identifier(&mut self, first: char) -> String {
        let mut ident = String::new();
        ident.push(first);
        while let Some(&(_, c)) = self.input.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.input.next();
            } else {
                break;
            }
        }
        ident
    }

    /// Read a number (integer or decimal) starting with `first`
    fn read_number(&mut self, first: char) -> String {
        let mut number = String::new();
        let mut has_dot = false;
        number.push(first);
        while let Some(&(_, c)) = self.input.peek() {
            if c.is_ascii_digit() {
                number.push(c);
                self.input.next();
            } else if c == '.' && !has_dot {
                has_dot = true;
                number.push(c);
                self.input.next();
            } else {
                break;
            }
        }
        number
    }

    /// Read a single-quoted string literal. The opening quote has already
    /// been consumed. Reads up to the next `'` with no escape handling;
    /// embedded quotes (`''` or `\'`) are a known limitation of the grammar.
    fn read_string(&mut self) -> String {
        let mut string = String::new();
        while let Some((_, c)) = self.input.next() {
            if c == '\'' {
                break;
            }
            string.push(c);
        }
        string
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let (position, ch) = match self.input.next() {
            Some(pair) => pair,
            None => {
                return Token {
                    kind: TokenKind::Eof,
                    position: self.len,
                }
            }
        };

        let kind = match ch {
            '\'' => TokenKind::StringLit(self.read_string()),
            '<' => match self.peek_char() {
                Some('=') => {
                    self.input.next();
                    TokenKind::Operator("<=".to_string())
                }
                Some('>') => {
                    self.input.next();
                    TokenKind::Operator("<>".to_string())
                }
                _ => TokenKind::Operator("<".to_string()),
            },
            '>' => match self.peek_char() {
                Some('=') => {
                    self.input.next();
                    TokenKind::Operator(">=".to_string())
                }
                _ => TokenKind::Operator(">".to_string()),
            },
            '!' if self.peek_char() == Some('=') => {
                self.input.next();
                TokenKind::Operator("!=".to_string())
            }
            '|' if self.peek_char() == Some('|') => {
                self.input.next();
                TokenKind::Operator("||".to_string())
            }
            '&' if self.peek_char() == Some('&') => {
                self.input.next();
                TokenKind::Operator("&&".to_string())
            }
            '=' | '+' | '-' | '/' | '%' => TokenKind::Operator(ch.to_string()),
            _ => {
                if ch.is_alphabetic() || ch == '_' {
                    let ident = self.read_identifier(ch);
                    let upper = ident.to_uppercase();
                    if KEYWORDS.contains(upper.as_str()) {
                        TokenKind::Keyword(upper)
                    } else {
                        TokenKind::Identifier(ident)
                    }
                } else if ch.is_ascii_digit() {
                    let number = self.read_number(ch);
                    match number.parse::<f64>() {
                        Ok(value) => TokenKind::Number(value),
                        // Only reachable if the scan produced a malformed
                        // number; pass it through for the parser to reject.
                        Err(_) => TokenKind::Special(ch),
                    }
                } else {
                    // `*`, parentheses, commas, dots and anything else
                    TokenKind::Special(ch)
                }
            }
        };

        Token { kind, position }
    }
}

/// Tokenize a SQL string into a flat token sequence (EOF excluded)
pub fn tokenize(sql: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(sql);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    tokens
}

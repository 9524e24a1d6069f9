// SQL Abstract Syntax Tree (AST) Implementation
//
// This module defines the AST nodes for representing parsed SELECT queries.
// Each optimization phase consumes a statement and produces a fresh one;
// trees are never shared between concurrent optimizations.

use std::fmt;

use serde::Serialize;

/// SELECT statement representation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectStatement {
    /// Columns in the SELECT clause
    pub columns: Vec<SelectColumn>,
    /// FROM clause entries: comma-separated tables and/or join trees. The
    /// join order optimizer may collapse this into a single join tree.
    pub from: Vec<TableExpr>,
    /// WHERE clause (optional)
    pub where_clause: Option<Expression>,
    /// GROUP BY expressions (optional)
    pub group_by: Option<Vec<Expression>>,
    /// HAVING clause (optional)
    pub having: Option<Expression>,
    /// ORDER BY items, empty when absent
    pub order_by: Vec<OrderByItem>,
    /// LIMIT row count (optional)
    pub limit: Option<u64>,
}

/// Column in a SELECT list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SelectColumn {
    /// All columns (*)
    Wildcard,
    /// Expression (column reference, function call, ...)
    Expression(Expression),
}

/// Base table reference in the FROM clause
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
    /// Predicates pushed down onto this table's scan. Empty after parsing;
    /// populated by the predicate pushdown phase.
    pub filters: Vec<Expression>,
}

impl TableRef {
    pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        TableRef {
            name: name.into(),
            alias,
            filters: Vec::new(),
        }
    }

    /// The name this table is referenced by in column qualifiers: its alias
    /// when present, the table name otherwise.
    pub fn binding_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A FROM clause entry: a base table or a join tree. The parser builds
/// left-deep trees (the right side of every join is a base table); the
/// optimizer may replace a FROM list with a tree of arbitrary shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableExpr {
    Table(TableRef),
    Join {
        join_type: JoinType,
        /// Physical join strategy chosen by the join order optimizer.
        /// None until optimization has run.
        method: Option<JoinMethod>,
        left: Box<TableExpr>,
        right: Box<TableExpr>,
        condition: Option<Expression>,
    },
}

/// Type of JOIN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
}

/// Physical join strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinMethod {
    NestedLoop,
    Hash,
    Merge,
}

/// ORDER BY item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderByItem {
    pub expr: Expression,
    pub direction: OrderDirection,
}

/// Sort direction, ascending unless DESC is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Expression in SQL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    /// Literal value
    Literal(Value),
    /// Column reference (dotted path)
    Column(ColumnRef),
    /// Binary operation (e.g. a + b, x = y)
    BinaryOp {
        op: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Function call
    Function { name: String, args: Vec<Expression> },
    /// `*` inside a function argument list, e.g. COUNT(*)
    Wildcard,
}

/// Column reference as a dotted path, e.g. `users.id` is `["users", "id"]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRef {
    pub parts: Vec<String>,
}

impl ColumnRef {
    pub fn new(parts: Vec<String>) -> Self {
        ColumnRef { parts }
    }

    /// The qualifying prefix (table name or alias), if the reference is dotted
    pub fn qualifier(&self) -> Option<&str> {
        if self.parts.len() > 1 {
            self.parts.first().map(|s| s.as_str())
        } else {
            None
        }
    }

    /// The final path segment: the column name itself
    pub fn column_name(&self) -> &str {
        self.parts.last().map(|s| s.as_str()).unwrap_or("")
    }
}

/// Literal values: the grammar subset only has numeric and string literals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Number(f64),
    String(String),
}

/// SQL operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    // Comparison
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessEquals,
    GreaterEquals,
    Like,
    In,
    // Logical
    And,
    Or,
    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl Operator {
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Equals)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equals => "=",
            Operator::NotEquals => "<>",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessEquals => "<=",
            Operator::GreaterEquals => ">=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Value::Number(n)) => write!(f, "{}", n),
            Expression::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Expression::Column(col) => write!(f, "{}", col.parts.join(".")),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
            Expression::Function { name, args } => {
                let args = args
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}({})", name, args)
            }
            Expression::Wildcard => write!(f, "*"),
        }
    }
}

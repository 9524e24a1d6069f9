// Physical Query Plan Representation
//
// This module defines the tree of physical operators the plan generator
// lowers an optimized statement into. Plans are built once per optimization
// and never mutated afterwards; an execution engine is expected to walk
// them.

use std::fmt;

use serde::Serialize;

use crate::catalog::IndexInfo;
use crate::parser::ast::{Expression, OrderByItem};

/// A node in the physical query plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PhysicalPlan {
    /// Full table scan
    TableScan {
        table: String,
        alias: Option<String>,
        /// Predicates pushed down onto this scan
        predicates: Vec<Expression>,
    },
    /// B-tree index scan
    IndexScan {
        table: String,
        alias: Option<String>,
        index: IndexInfo,
        predicates: Vec<Expression>,
    },
    /// Nested loop join
    NestedLoopJoin {
        left: Box<PhysicalPlan>,
        right: Box<PhysicalPlan>,
        condition: Option<Expression>,
    },
    /// Hash join (build left, probe right)
    HashJoin {
        left: Box<PhysicalPlan>,
        right: Box<PhysicalPlan>,
        condition: Option<Expression>,
    },
    /// Sort-merge join
    MergeJoin {
        left: Box<PhysicalPlan>,
        right: Box<PhysicalPlan>,
        condition: Option<Expression>,
    },
    /// Residual filter
    Filter {
        input: Box<PhysicalPlan>,
        predicate: Expression,
    },
    /// Grouping (GROUP BY, with the HAVING clause when present)
    Group {
        input: Box<PhysicalPlan>,
        expressions: Vec<Expression>,
        having: Option<Expression>,
    },
    /// Sort (ORDER BY)
    Sort {
        input: Box<PhysicalPlan>,
        keys: Vec<OrderByItem>,
    },
    /// Row limit
    Limit { input: Box<PhysicalPlan>, count: u64 },
}

impl PhysicalPlan {
    /// Child operators, in left-to-right order
    pub fn children(&self) -> Vec<&PhysicalPlan> {
        match self {
            PhysicalPlan::TableScan { .. } | PhysicalPlan::IndexScan { .. } => Vec::new(),
            PhysicalPlan::NestedLoopJoin { left, right, .. }
            | PhysicalPlan::HashJoin { left, right, .. }
            | PhysicalPlan::MergeJoin { left, right, .. } => vec![left, right],
            PhysicalPlan::Filter { input, .. }
            | PhysicalPlan::Group { input, .. }
            | PhysicalPlan::Sort { input, .. }
            | PhysicalPlan::Limit { input, .. } => vec![input],
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            PhysicalPlan::TableScan {
                table,
                alias,
                predicates,
            } => {
                write!(f, "{}TableScan: {}", pad, table)?;
                if let Some(a) = alias {
                    write!(f, " as {}", a)?;
                }
                if !predicates.is_empty() {
                    let preds = predicates
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(" AND ");
                    write!(f, " [{}]", preds)?;
                }
                Ok(())
            }
            PhysicalPlan::IndexScan { table, index, .. } => {
                write!(f, "{}IndexScan: {} using {}", pad, table, index.name)
            }
            PhysicalPlan::NestedLoopJoin {
                left,
                right,
                condition,
            } => {
                write_join(f, &pad, "NestedLoopJoin", condition)?;
                left.fmt_indented(f, indent + 1)?;
                writeln!(f)?;
                right.fmt_indented(f, indent + 1)
            }
            PhysicalPlan::HashJoin {
                left,
                right,
                condition,
            } => {
                write_join(f, &pad, "HashJoin", condition)?;
                left.fmt_indented(f, indent + 1)?;
                writeln!(f)?;
                right.fmt_indented(f, indent + 1)
            }
            PhysicalPlan::MergeJoin {
                left,
                right,
                condition,
            } => {
                write_join(f, &pad, "MergeJoin", condition)?;
                left.fmt_indented(f, indent + 1)?;
                writeln!(f)?;
                right.fmt_indented(f, indent + 1)
            }
            PhysicalPlan::Filter { input, predicate } => {
                writeln!(f, "{}Filter: {}", pad, predicate)?;
                input.fmt_indented(f, indent + 1)
            }
            PhysicalPlan::Group {
                input, expressions, ..
            } => {
                let exprs = expressions
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "{}Group: {}", pad, exprs)?;
                input.fmt_indented(f, indent + 1)
            }
            PhysicalPlan::Sort { input, keys } => {
                writeln!(f, "{}Sort: {} key(s)", pad, keys.len())?;
                input.fmt_indented(f, indent + 1)
            }
            PhysicalPlan::Limit { input, count } => {
                writeln!(f, "{}Limit: {}", pad, count)?;
                input.fmt_indented(f, indent + 1)
            }
        }
    }
}

fn write_join(
    f: &mut fmt::Formatter<'_>,
    pad: &str,
    name: &str,
    condition: &Option<Expression>,
) -> fmt::Result {
    match condition {
        Some(cond) => writeln!(f, "{}{}: {}", pad, name, cond),
        None => writeln!(f, "{}{}", pad, name),
    }
}

impl fmt::Display for PhysicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Root wrapper around the top plan operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub root: PhysicalPlan,
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

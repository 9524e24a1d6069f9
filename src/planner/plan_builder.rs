// Physical Plan Generation
//
// Lowers an optimized statement plus the selected indexes into a physical
// operator tree: scans at the leaves, joins per the chosen method, then
// Filter, Group, Sort and Limit wrapping outward in that order.

use crate::catalog::IndexInfo;
use crate::parser::ast::{JoinMethod, SelectStatement, TableExpr, TableRef};
use crate::planner::physical_plan::{PhysicalPlan, QueryPlan};

/// Build the physical plan for an optimized statement. Selected indexes
/// are keyed by binding name so each applies to exactly one scan.
pub fn build_plan(stmt: &SelectStatement, indexes: &[(String, IndexInfo)]) -> QueryPlan {
    let mut plan = build_from(&stmt.from, indexes);

    if let Some(predicate) = &stmt.where_clause {
        plan = PhysicalPlan::Filter {
            input: Box::new(plan),
            predicate: predicate.clone(),
        };
    }

    if let Some(group_by) = &stmt.group_by {
        plan = PhysicalPlan::Group {
            input: Box::new(plan),
            expressions: group_by.clone(),
            having: stmt.having.clone(),
        };
    }

    if !stmt.order_by.is_empty() {
        plan = PhysicalPlan::Sort {
            input: Box::new(plan),
            keys: stmt.order_by.clone(),
        };
    }

    if let Some(count) = stmt.limit {
        plan = PhysicalPlan::Limit {
            input: Box::new(plan),
            count,
        };
    }

    QueryPlan { root: plan }
}

/// Lower the FROM entries. A FROM list the join order search did not
/// collapse (or a statement it never saw) folds into cross nested loops.
fn build_from(from: &[TableExpr], indexes: &[(String, IndexInfo)]) -> PhysicalPlan {
    let mut entries = from.iter().map(|entry| build_table_expr(entry, indexes));

    let first = match entries.next() {
        Some(plan) => plan,
        // An empty FROM list cannot be parsed; scan a zero-row placeholder
        None => PhysicalPlan::TableScan {
            table: String::new(),
            alias: None,
            predicates: Vec::new(),
        },
    };

    entries.fold(first, |acc, next| PhysicalPlan::NestedLoopJoin {
        left: Box::new(acc),
        right: Box::new(next),
        condition: None,
    })
}

fn build_table_expr(expr: &TableExpr, indexes: &[(String, IndexInfo)]) -> PhysicalPlan {
    match expr {
        TableExpr::Table(table) => build_scan(table, indexes),
        TableExpr::Join {
            method,
            left,
            right,
            condition,
            ..
        } => {
            let left = Box::new(build_table_expr(left, indexes));
            let right = Box::new(build_table_expr(right, indexes));
            let condition = condition.clone();
            match method.unwrap_or(JoinMethod::NestedLoop) {
                JoinMethod::NestedLoop => PhysicalPlan::NestedLoopJoin {
                    left,
                    right,
                    condition,
                },
                JoinMethod::Hash => PhysicalPlan::HashJoin {
                    left,
                    right,
                    condition,
                },
                JoinMethod::Merge => PhysicalPlan::MergeJoin {
                    left,
                    right,
                    condition,
                },
            }
        }
    }
}

/// Scan leaf: an index scan when one was selected for this binding, a full
/// table scan otherwise. Matching on the binding name (not the table name)
/// keeps a self-join from indexing both aliases. Pushed predicates ride on
/// the scan either way.
fn build_scan(table: &TableRef, indexes: &[(String, IndexInfo)]) -> PhysicalPlan {
    let chosen = indexes
        .iter()
        .find(|(binding, _)| binding.as_str() == table.binding_name())
        .map(|(_, index)| index);

    match chosen {
        Some(index) => PhysicalPlan::IndexScan {
            table: table.name.clone(),
            alias: table.alias.clone(),
            index: index.clone(),
            predicates: table.filters.clone(),
        },
        None => PhysicalPlan::TableScan {
            table: table.name.clone(),
            alias: table.alias.clone(),
            predicates: table.filters.clone(),
        },
    }
}

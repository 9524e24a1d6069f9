// Cost Model for Query Optimization
//
// Pure recursive cost and cardinality estimation over physical plan trees,
// used both by the join order search and for final plan costing. The
// selectivity defaults are intentionally simplistic (independence
// assumption for ANDed predicates); they are part of the model's contract,
// not placeholders.

use crate::catalog::Catalog;
use crate::parser::ast::{Expression, Operator};
use crate::planner::physical_plan::PhysicalPlan;

/// Cost charged per page of I/O
pub const IO_COST_PER_PAGE: f64 = 1.0;
/// CPU cost charged per tuple processed
pub const CPU_COST_PER_TUPLE: f64 = 0.01;
/// CPU overhead per tuple scanned by a residual filter
pub const FILTER_CPU_FACTOR: f64 = 0.1;
/// Join selectivity assumed when a join has no condition
pub const DEFAULT_JOIN_SELECTIVITY: f64 = 0.1;

/// Cost of a full table scan over `rows` rows
pub fn table_scan_cost(rows: f64) -> f64 {
    rows * IO_COST_PER_PAGE
}

/// Cost of a B-tree index scan: tree traversal plus matched-tuple retrieval
pub fn index_scan_cost(rows: f64, selectivity: f64) -> f64 {
    rows.max(1.0).log2().ceil() * IO_COST_PER_PAGE + rows * selectivity * CPU_COST_PER_TUPLE
}

/// n * log2(n), zero for degenerate inputs
pub fn nlogn(n: f64) -> f64 {
    if n > 1.0 {
        n * n.log2()
    } else {
        0.0
    }
}

/// Estimate the total cost of a physical plan
pub fn estimate_plan_cost(plan: &PhysicalPlan, catalog: &Catalog) -> f64 {
    match plan {
        PhysicalPlan::TableScan { table, .. } => {
            table_scan_cost(catalog.table_row_count(table) as f64)
        }
        PhysicalPlan::IndexScan { table, index, .. } => {
            index_scan_cost(catalog.table_row_count(table) as f64, index.selectivity)
        }
        PhysicalPlan::NestedLoopJoin { left, right, .. } => {
            estimate_plan_cost(left, catalog)
                + estimate_plan_cost(right, catalog)
                + estimate_cardinality(left, catalog) * estimate_cardinality(right, catalog)
        }
        PhysicalPlan::HashJoin { left, right, .. } => {
            estimate_plan_cost(left, catalog)
                + estimate_plan_cost(right, catalog)
                + estimate_cardinality(left, catalog)
                + estimate_cardinality(right, catalog)
        }
        PhysicalPlan::MergeJoin { left, right, .. } => {
            estimate_plan_cost(left, catalog)
                + estimate_plan_cost(right, catalog)
                + nlogn(estimate_cardinality(left, catalog))
                + nlogn(estimate_cardinality(right, catalog))
        }
        PhysicalPlan::Filter { input, .. } => {
            estimate_plan_cost(input, catalog)
                + estimate_cardinality(input, catalog) * FILTER_CPU_FACTOR
        }
        PhysicalPlan::Sort { input, .. } => {
            estimate_plan_cost(input, catalog) + nlogn(estimate_cardinality(input, catalog))
        }
        // Grouping and limiting add no modeled overhead
        PhysicalPlan::Group { input, .. } | PhysicalPlan::Limit { input, .. } => {
            estimate_plan_cost(input, catalog)
        }
    }
}

/// Estimate the number of rows a plan produces
pub fn estimate_cardinality(plan: &PhysicalPlan, catalog: &Catalog) -> f64 {
    match plan {
        PhysicalPlan::TableScan { table, .. } => catalog.table_row_count(table) as f64,
        PhysicalPlan::IndexScan { table, index, .. } => {
            catalog.table_row_count(table) as f64 * index.selectivity
        }
        PhysicalPlan::NestedLoopJoin {
            left,
            right,
            condition,
        }
        | PhysicalPlan::HashJoin {
            left,
            right,
            condition,
        }
        | PhysicalPlan::MergeJoin {
            left,
            right,
            condition,
        } => {
            let join_selectivity = condition
                .as_ref()
                .map(predicate_selectivity)
                .unwrap_or(DEFAULT_JOIN_SELECTIVITY);
            estimate_cardinality(left, catalog)
                * estimate_cardinality(right, catalog)
                * join_selectivity
        }
        PhysicalPlan::Filter { input, predicate } => {
            estimate_cardinality(input, catalog) * predicate_selectivity(predicate)
        }
        PhysicalPlan::Group { input, .. } | PhysicalPlan::Sort { input, .. } => {
            estimate_cardinality(input, catalog)
        }
        PhysicalPlan::Limit { input, count } => {
            estimate_cardinality(input, catalog).min(*count as f64)
        }
    }
}

/// Estimated fraction of rows satisfying a predicate. ANDed predicates
/// multiply under an independence assumption.
pub fn predicate_selectivity(expr: &Expression) -> f64 {
    match expr {
        Expression::BinaryOp { op, left, right } => match op {
            Operator::And => predicate_selectivity(left) * predicate_selectivity(right),
            Operator::Equals => 0.1,
            Operator::LessThan
            | Operator::GreaterThan
            | Operator::LessEquals
            | Operator::GreaterEquals => 0.3,
            Operator::Like => 0.25,
            Operator::In => 0.2,
            _ => 0.5,
        },
        _ => 0.5,
    }
}

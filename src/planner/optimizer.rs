// Query Optimizer Pipeline
//
// Ties the phases together: rewrite, subquery flattening, join order
// search, predicate pushdown, index selection, plan generation and final
// costing. The catalog is injected read-only, so independent statements
// can be optimized concurrently against one shared catalog.

use log::debug;

use crate::catalog::{Catalog, IndexInfo};
use crate::parser::ast::SelectStatement;
use crate::parser::{parse, ParseResult};
use crate::planner::cost_model::estimate_plan_cost;
use crate::planner::join_order::optimize_join_order;
use crate::planner::plan_builder::build_plan;
use crate::planner::physical_plan::QueryPlan;
use crate::planner::pushdown::{push_down_predicates, select_indexes};
use crate::planner::rewriter::rewrite;
use crate::planner::subquery::flatten_subqueries;

/// The result of optimizing one statement
#[derive(Debug, Clone)]
pub struct OptimizedQuery {
    /// The rewritten and reordered statement
    pub statement: SelectStatement,
    /// The physical plan lowered from it
    pub plan: QueryPlan,
    /// Estimated total cost of the plan
    pub cost: f64,
    /// Indexes chosen for the plan's scans
    pub indexes: Vec<IndexInfo>,
}

/// Cost-based query optimizer over an injected statistics catalog
pub struct Optimizer<'a> {
    catalog: &'a Catalog,
}

impl<'a> Optimizer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Optimizer { catalog }
    }

    /// Parse and optimize a SQL SELECT statement
    pub fn optimize_sql(&self, sql: &str) -> ParseResult<OptimizedQuery> {
        let stmt = parse(sql)?;
        Ok(self.optimize(stmt))
    }

    /// Run the optimization pipeline over a parsed statement. Total: any
    /// well-formed statement produces a plan, with default statistics
    /// standing in for unregistered tables.
    pub fn optimize(&self, stmt: SelectStatement) -> OptimizedQuery {
        let stmt = rewrite(stmt);
        let stmt = flatten_subqueries(stmt);
        let stmt = optimize_join_order(stmt, self.catalog);
        let stmt = push_down_predicates(stmt);

        let selected = select_indexes(&stmt, self.catalog);
        let plan = build_plan(&stmt, &selected);
        let cost = estimate_plan_cost(&plan.root, self.catalog);
        debug!("optimized plan with estimated cost {:.2}", cost);

        OptimizedQuery {
            statement: stmt,
            plan,
            cost,
            indexes: selected.into_iter().map(|(_, index)| index).collect(),
        }
    }
}

// Query Planner Module
//
// Cost-based optimization of parsed SELECT statements: rewriting, join
// order search, predicate pushdown, index selection and physical plan
// generation, all costed against an injected statistics catalog.

pub mod cost_model;
pub mod join_order;
pub mod optimizer;
pub mod physical_plan;
pub mod plan_builder;
pub mod pushdown;
pub mod rewriter;
pub mod subquery;

pub use self::optimizer::{OptimizedQuery, Optimizer};
pub use self::physical_plan::{PhysicalPlan, QueryPlan};

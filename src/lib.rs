// squill: a cost-based SQL query optimizer
//
// Takes a SELECT statement as text, parses it, and produces an optimized
// physical plan with an estimated cost. Statistics and index metadata are
// supplied through a read-only catalog; execution of the resulting plan
// belongs to the surrounding system.

pub mod catalog;
pub mod parser;
pub mod planner;

pub use catalog::{Catalog, IndexInfo, TableStatistics};
pub use parser::ast::SelectStatement;
pub use parser::{parse, ParseError};
pub use planner::{OptimizedQuery, Optimizer, PhysicalPlan, QueryPlan};

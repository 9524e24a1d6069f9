// Join Order Optimization
//
// System-R-style join enumeration: bitmask dynamic programming over the
// set of join units, building minimum-cost join trees bottom-up from
// singletons to the full set. A unit is a base table, or an outer-join
// subtree kept whole so its semantics survive reordering. Each DP entry
// records the best plan, its cost, and its estimated cardinality for one
// subset of units.

use std::collections::HashMap;

use log::debug;

use crate::catalog::Catalog;
use crate::parser::ast::{
    ColumnRef, Expression, JoinMethod, JoinType, SelectStatement, TableExpr,
};
use crate::planner::cost_model::{
    nlogn, predicate_selectivity, table_scan_cost, DEFAULT_JOIN_SELECTIVITY,
};
use crate::planner::pushdown::{combine_conjuncts, split_conjuncts};

/// Largest unit set the exhaustive DP will search. The enumeration is
/// O(3^n); beyond this the optimizer keeps the written join order.
pub const MAX_DP_TABLES: usize = 20;

/// Width of the subset bitmasks. Units past this many in a FROM list stay
/// in written order with their predicates left in the WHERE clause.
const MASK_BITS: usize = 64;

/// One DP table entry: the best plan found for a subset of units
struct DpEntry {
    cost: f64,
    cardinality: f64,
    plan: TableExpr,
}

/// A join predicate with the bitmask of units it references
struct JoinPredicate {
    expr: Expression,
    mask: u64,
    used: bool,
}

/// Reorder the FROM clause into a minimum-cost join tree. Runs only when
/// the FROM list has more than one entry; a single entry (base table or
/// already-built join tree) passes through unchanged, which also makes
/// reoptimization of an optimized statement a no-op.
pub fn optimize_join_order(mut stmt: SelectStatement, catalog: &Catalog) -> SelectStatement {
    if stmt.from.len() <= 1 {
        return stmt;
    }

    let mut units = Vec::new();
    let mut conditions = Vec::new();
    for entry in std::mem::take(&mut stmt.from) {
        collect_units(entry, &mut units, &mut conditions);
    }

    let bindings: Vec<Vec<String>> = units.iter().map(unit_bindings).collect();

    // Pool join predicates from inner ON conditions and from WHERE
    // conjuncts spanning several units. Everything else stays in WHERE.
    let mut predicates = Vec::new();
    let mut residual = Vec::new();
    let conjuncts = conditions
        .into_iter()
        .flat_map(split_conjuncts)
        .chain(stmt.where_clause.take().into_iter().flat_map(split_conjuncts));
    for conjunct in conjuncts {
        match expression_mask(&conjunct, &bindings) {
            Some(mask) if mask.count_ones() >= 2 => predicates.push(JoinPredicate {
                expr: conjunct,
                mask,
                used: false,
            }),
            _ => residual.push(conjunct),
        }
    }

    let plan = if units.len() > MAX_DP_TABLES {
        debug!(
            "join order search skipped for {} units (limit {})",
            units.len(),
            MAX_DP_TABLES
        );
        left_deep_fallback(units, predicates)
    } else {
        search(units, &bindings, &predicates, catalog)
    };

    stmt.from = vec![plan];
    stmt.where_clause = combine_conjuncts(residual);
    stmt
}

/// Flatten a FROM entry into join units, pooling inner ON conditions.
/// Outer joins are not flattened: reordering through them would strengthen
/// their semantics, so the whole subtree travels as one unit.
fn collect_units(entry: TableExpr, units: &mut Vec<TableExpr>, conditions: &mut Vec<Expression>) {
    match entry {
        TableExpr::Table(_) => units.push(entry),
        TableExpr::Join {
            join_type: JoinType::Inner,
            left,
            right,
            condition,
            ..
        } => {
            collect_units(*left, units, conditions);
            collect_units(*right, units, conditions);
            conditions.extend(condition);
        }
        outer => units.push(outer),
    }
}

/// The binding names of every base table inside a unit
fn unit_bindings(unit: &TableExpr) -> Vec<String> {
    let mut names = Vec::new();
    collect_binding_names(unit, &mut names);
    names
}

fn collect_binding_names(expr: &TableExpr, names: &mut Vec<String>) {
    match expr {
        TableExpr::Table(table) => names.push(table.binding_name().to_string()),
        TableExpr::Join { left, right, .. } => {
            collect_binding_names(left, names);
            collect_binding_names(right, names);
        }
    }
}

/// Bitmask of the units an expression references, None when any column
/// cannot be resolved to a known binding.
fn expression_mask(expr: &Expression, bindings: &[Vec<String>]) -> Option<u64> {
    match expr {
        Expression::Column(column) => column_bit(column, bindings),
        Expression::BinaryOp { left, right, .. } => {
            Some(expression_mask(left, bindings)? | expression_mask(right, bindings)?)
        }
        Expression::Function { args, .. } => {
            let mut mask = 0;
            for arg in args {
                mask |= expression_mask(arg, bindings)?;
            }
            Some(mask)
        }
        Expression::Literal(_) | Expression::Wildcard => Some(0),
    }
}

fn column_bit(column: &ColumnRef, bindings: &[Vec<String>]) -> Option<u64> {
    let qualifier = column.qualifier()?;
    let position = bindings
        .iter()
        .position(|unit| unit.iter().any(|b| b == qualifier))?;
    // Units past the mask width cannot be tracked; their predicates stay
    // in the WHERE clause
    if position >= MASK_BITS {
        return None;
    }
    Some(1 << position)
}

/// Estimated cost and output rows of a leaf unit. Base tables come from
/// the catalog; outer-join units recurse with the same per-method step
/// formulas the DP uses.
fn unit_estimates(unit: &TableExpr, catalog: &Catalog) -> (f64, f64) {
    match unit {
        TableExpr::Table(table) => {
            let rows = catalog.table_row_count(&table.name) as f64;
            (table_scan_cost(rows), rows)
        }
        TableExpr::Join {
            method,
            left,
            right,
            condition,
            ..
        } => {
            let (left_cost, left_card) = unit_estimates(left, catalog);
            let (right_cost, right_card) = unit_estimates(right, catalog);
            let step = match method.unwrap_or(JoinMethod::NestedLoop) {
                JoinMethod::NestedLoop => left_card * right_card,
                JoinMethod::Hash => left_card + right_card,
                JoinMethod::Merge => nlogn(left_card) + nlogn(right_card),
            };
            let selectivity = condition
                .as_ref()
                .map(predicate_selectivity)
                .unwrap_or(DEFAULT_JOIN_SELECTIVITY);
            (
                left_cost + right_cost + step,
                left_card * right_card * selectivity,
            )
        }
    }
}

/// Exhaustive bitmask DP over the unit set
fn search(
    units: Vec<TableExpr>,
    bindings: &[Vec<String>],
    predicates: &[JoinPredicate],
    catalog: &Catalog,
) -> TableExpr {
    let n = units.len();
    let full: u64 = (1 << n) - 1;
    let mut dp: HashMap<u64, DpEntry> = HashMap::with_capacity(1 << n);

    for (i, unit) in units.into_iter().enumerate() {
        let (cost, cardinality) = unit_estimates(&unit, catalog);
        dp.insert(
            1 << i,
            DpEntry {
                cost,
                cardinality,
                plan: unit,
            },
        );
    }

    for size in 2..=n as u32 {
        for mask in 1..=full {
            if mask.count_ones() != size {
                continue;
            }

            let mut best: Option<DpEntry> = None;

            // Enumerate bipartitions; `sub < complement` skips mirrors
            let mut sub = (mask - 1) & mask;
            while sub > 0 {
                let complement = mask ^ sub;
                if sub < complement {
                    if let (Some(left), Some(right)) = (dp.get(&sub), dp.get(&complement)) {
                        let candidate = join_candidate(
                            left, right, sub, complement, bindings, predicates, catalog,
                        );
                        if best.as_ref().map_or(true, |b| candidate.cost < b.cost) {
                            best = Some(candidate);
                        }
                    }
                }
                sub = (sub - 1) & mask;
            }

            if let Some(entry) = best {
                dp.insert(mask, entry);
            }
        }
    }

    // A best plan always exists: every bipartition admits a nested loop
    // join, so the full mask is populated whenever n >= 1.
    let entry = dp.remove(&full).unwrap_or_else(|| unreachable!());
    debug!(
        "join order search finished: cost {:.2}, cardinality {:.0}",
        entry.cost, entry.cardinality
    );
    entry.plan
}

/// Build the candidate plan joining two DP entries, choosing the cheapest
/// applicable join method.
fn join_candidate(
    left: &DpEntry,
    right: &DpEntry,
    left_mask: u64,
    right_mask: u64,
    bindings: &[Vec<String>],
    predicates: &[JoinPredicate],
    catalog: &Catalog,
) -> DpEntry {
    let mask = left_mask | right_mask;
    let spanning: Vec<&JoinPredicate> = predicates
        .iter()
        .filter(|p| {
            p.mask & mask == p.mask && p.mask & left_mask != 0 && p.mask & right_mask != 0
        })
        .collect();

    let condition = combine_conjuncts(spanning.iter().map(|p| p.expr.clone()).collect());
    let (method, step_cost) = choose_method(left, right, left_mask, bindings, &spanning, catalog);

    let selectivity = condition
        .as_ref()
        .map(predicate_selectivity)
        .unwrap_or(DEFAULT_JOIN_SELECTIVITY);

    DpEntry {
        cost: left.cost + right.cost + step_cost,
        cardinality: left.cardinality * right.cardinality * selectivity,
        plan: TableExpr::Join {
            join_type: JoinType::Inner,
            method: Some(method),
            left: Box::new(left.plan.clone()),
            right: Box::new(right.plan.clone()),
            condition,
        },
    }
}

/// Pick the join method by incremental cost. Nested loop is always legal;
/// hash needs an equality predicate across the two sides; merge further
/// needs both equality columns indexed. Ties keep the earlier method.
fn choose_method(
    left: &DpEntry,
    right: &DpEntry,
    left_mask: u64,
    bindings: &[Vec<String>],
    spanning: &[&JoinPredicate],
    catalog: &Catalog,
) -> (JoinMethod, f64) {
    let mut method = JoinMethod::NestedLoop;
    let mut cost = left.cardinality * right.cardinality;

    let equality = spanning
        .iter()
        .find_map(|p| cross_equality(&p.expr, left_mask, bindings));

    if let Some((left_col, right_col)) = equality {
        let hash_cost = left.cardinality + right.cardinality;
        if hash_cost < cost {
            method = JoinMethod::Hash;
            cost = hash_cost;
        }

        let left_indexed = column_indexed(&left.plan, left_col, catalog);
        let right_indexed = column_indexed(&right.plan, right_col, catalog);
        if left_indexed && right_indexed {
            let merge_cost = nlogn(left.cardinality) + nlogn(right.cardinality);
            if merge_cost < cost {
                method = JoinMethod::Merge;
                cost = merge_cost;
            }
        }
    }

    (method, cost)
}

/// For an equality predicate between two columns on opposite sides of the
/// bipartition, the (left-side, right-side) column pair.
fn cross_equality<'a>(
    expr: &'a Expression,
    left_mask: u64,
    bindings: &[Vec<String>],
) -> Option<(&'a ColumnRef, &'a ColumnRef)> {
    let Expression::BinaryOp { op, left, right } = expr else {
        return None;
    };
    if !op.is_equality() {
        return None;
    }
    let (Expression::Column(a), Expression::Column(b)) = (left.as_ref(), right.as_ref()) else {
        return None;
    };

    let a_bit = column_bit(a, bindings)?;
    let b_bit = column_bit(b, bindings)?;
    if a_bit & left_mask != 0 && b_bit & left_mask == 0 {
        Some((a, b))
    } else if b_bit & left_mask != 0 && a_bit & left_mask == 0 {
        Some((b, a))
    } else {
        None
    }
}

/// Whether the base table owning `column` inside `plan` has an index on it
fn column_indexed(plan: &TableExpr, column: &ColumnRef, catalog: &Catalog) -> bool {
    match plan {
        TableExpr::Table(table) => {
            let owns = column
                .qualifier()
                .map_or(true, |q| q == table.binding_name());
            owns && catalog.has_index_on(&table.name, column.column_name())
        }
        TableExpr::Join { left, right, .. } => {
            column_indexed(left, column, catalog) || column_indexed(right, column, catalog)
        }
    }
}

/// Left-deep nested loop fallback for unit sets past the DP limit
fn left_deep_fallback(units: Vec<TableExpr>, mut predicates: Vec<JoinPredicate>) -> TableExpr {
    let mut iter = units.into_iter().enumerate();
    // Callers guarantee at least two units
    let (_, first) = iter.next().unwrap_or_else(|| unreachable!());
    let mut plan = first;
    let mut covered: u64 = 1;

    for (i, unit) in iter {
        // Positions past the mask width have no bit; their predicates were
        // already left residual by column_bit
        if i < MASK_BITS {
            covered |= 1 << i;
        }

        let mut applicable = Vec::new();
        for predicate in predicates.iter_mut() {
            if !predicate.used && predicate.mask & covered == predicate.mask {
                predicate.used = true;
                applicable.push(predicate.expr.clone());
            }
        }

        plan = TableExpr::Join {
            join_type: JoinType::Inner,
            method: Some(JoinMethod::NestedLoop),
            left: Box::new(plan),
            right: Box::new(unit),
            condition: combine_conjuncts(applicable),
        };
    }

    plan
}

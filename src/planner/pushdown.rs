// Predicate Pushdown and Index Selection
//
// Splits the WHERE clause into top-level AND conjuncts, attaches
// single-table conjuncts to their owning table's scan, and picks the
// cheapest access path (table scan vs. index scan) per base table.

use std::collections::HashMap;

use crate::catalog::{Catalog, IndexInfo};
use crate::parser::ast::{ColumnRef, Expression, Operator, SelectStatement, TableExpr, TableRef};
use crate::planner::cost_model::table_scan_cost;

/// Split an expression into its top-level AND conjuncts. Splits only on
/// AND; OR trees stay whole. Never returns an empty list.
pub fn split_conjuncts(expr: Expression) -> Vec<Expression> {
    match expr {
        Expression::BinaryOp {
            op: Operator::And,
            left,
            right,
        } => {
            let mut conjuncts = split_conjuncts(*left);
            conjuncts.extend(split_conjuncts(*right));
            conjuncts
        }
        other => vec![other],
    }
}

/// Rebuild a conjunction from a list of conjuncts, left-associatively.
/// Returns None for an empty list.
pub fn combine_conjuncts(conjuncts: Vec<Expression>) -> Option<Expression> {
    conjuncts.into_iter().reduce(|acc, next| Expression::BinaryOp {
        op: Operator::And,
        left: Box::new(acc),
        right: Box::new(next),
    })
}

/// Push single-table WHERE conjuncts down onto their owning table's scan.
/// Conjuncts referencing several tables (or none resolvable) stay in the
/// WHERE clause as join conditions or residual filters.
pub fn push_down_predicates(mut stmt: SelectStatement) -> SelectStatement {
    let Some(where_clause) = stmt.where_clause.take() else {
        return stmt;
    };

    let bindings = binding_names(&stmt.from);

    let mut pushed: HashMap<String, Vec<Expression>> = HashMap::new();
    let mut residual = Vec::new();

    for conjunct in split_conjuncts(where_clause) {
        match owning_table(&conjunct, &bindings) {
            Some(binding) => pushed.entry(binding).or_default().push(conjunct),
            None => residual.push(conjunct),
        }
    }

    stmt.from = stmt
        .from
        .into_iter()
        .map(|entry| attach_filters(entry, &mut pushed))
        .collect();
    stmt.where_clause = combine_conjuncts(residual);
    stmt
}

/// The binding names of every base table reachable from the FROM entries
fn binding_names(from: &[TableExpr]) -> Vec<String> {
    let mut names = Vec::new();
    for entry in from {
        collect_bindings(entry, &mut names);
    }
    names
}

fn collect_bindings(expr: &TableExpr, names: &mut Vec<String>) {
    match expr {
        TableExpr::Table(table) => names.push(table.binding_name().to_string()),
        TableExpr::Join { left, right, .. } => {
            collect_bindings(left, names);
            collect_bindings(right, names);
        }
    }
}

/// The single table a conjunct refers to, or None when it references
/// multiple tables, no tables, or an unresolvable column.
fn owning_table(conjunct: &Expression, bindings: &[String]) -> Option<String> {
    let mut columns = Vec::new();
    collect_columns(conjunct, &mut columns);
    if columns.is_empty() {
        return None;
    }

    let mut owner: Option<&str> = None;
    for column in columns {
        let binding = match column.qualifier() {
            Some(qualifier) => bindings.iter().find(|b| b.as_str() == qualifier)?,
            // An unqualified column is only attributable with one table in scope
            None if bindings.len() == 1 => &bindings[0],
            None => return None,
        };
        match owner {
            None => owner = Some(binding),
            Some(existing) if existing == binding.as_str() => {}
            Some(_) => return None,
        }
    }
    owner.map(str::to_string)
}

fn collect_columns<'a>(expr: &'a Expression, out: &mut Vec<&'a ColumnRef>) {
    match expr {
        Expression::Column(column) => out.push(column),
        Expression::BinaryOp { left, right, .. } => {
            collect_columns(left, out);
            collect_columns(right, out);
        }
        Expression::Function { args, .. } => {
            for arg in args {
                collect_columns(arg, out);
            }
        }
        Expression::Literal(_) | Expression::Wildcard => {}
    }
}

fn attach_filters(expr: TableExpr, pushed: &mut HashMap<String, Vec<Expression>>) -> TableExpr {
    match expr {
        TableExpr::Table(mut table) => {
            if let Some(filters) = pushed.remove(table.binding_name()) {
                table.filters.extend(filters);
            }
            TableExpr::Table(table)
        }
        TableExpr::Join {
            join_type,
            method,
            left,
            right,
            condition,
        } => TableExpr::Join {
            join_type,
            method,
            left: Box::new(attach_filters(*left, pushed)),
            right: Box::new(attach_filters(*right, pushed)),
            condition,
        },
    }
}

/// Pick, independently per base table, the index minimizing estimated
/// access cost against a full table scan. An index is a candidate only
/// when its leading column appears in a predicate pushed onto that table.
/// Selections are keyed by binding name so a self-join with one filtered
/// alias indexes only that alias. Tables where no index beats a scan
/// contribute nothing.
pub fn select_indexes(stmt: &SelectStatement, catalog: &Catalog) -> Vec<(String, IndexInfo)> {
    let mut tables = Vec::new();
    for entry in &stmt.from {
        collect_tables(entry, &mut tables);
    }

    let mut selected = Vec::new();
    for table in tables {
        if let Some(index) = best_index_for(table, catalog) {
            selected.push((table.binding_name().to_string(), index));
        }
    }
    selected
}

/// Cheapest applicable index for one table, when one beats a full scan
pub fn best_index_for(table: &TableRef, catalog: &Catalog) -> Option<IndexInfo> {
    let mut filter_columns = Vec::new();
    for filter in &table.filters {
        collect_columns(filter, &mut filter_columns);
    }
    if filter_columns.is_empty() {
        return None;
    }

    let scan_cost = table_scan_cost(catalog.table_row_count(&table.name) as f64);

    let mut best: Option<(f64, IndexInfo)> = None;
    for index in catalog.indexes_for(&table.name) {
        let Some(leading) = index.columns.first() else {
            continue;
        };
        if !filter_columns.iter().any(|c| c.column_name() == leading) {
            continue;
        }

        let cost = scan_cost * index.selectivity;
        if cost < scan_cost && best.as_ref().map_or(true, |(b, _)| cost < *b) {
            best = Some((cost, index));
        }
    }

    best.map(|(_, index)| index)
}

fn collect_tables<'a>(expr: &'a TableExpr, out: &mut Vec<&'a TableRef>) {
    match expr {
        TableExpr::Table(table) => out.push(table),
        TableExpr::Join { left, right, .. } => {
            collect_tables(left, out);
            collect_tables(right, out);
        }
    }
}

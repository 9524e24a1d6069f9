// Query Rewriter
//
// Pure AST-to-AST rewrites applied before cost-based planning: constant
// folding over literal arithmetic and elimination of duplicate WHERE
// conjuncts. Shapes with no applicable rule pass through unchanged.

use crate::parser::ast::{
    Expression, OrderByItem, Operator, SelectColumn, SelectStatement, TableExpr, Value,
};
use crate::planner::pushdown::{combine_conjuncts, split_conjuncts};

/// Rewrite a statement. Total over any well-formed AST; never fails.
pub fn rewrite(stmt: SelectStatement) -> SelectStatement {
    SelectStatement {
        columns: stmt
            .columns
            .into_iter()
            .map(|col| match col {
                SelectColumn::Wildcard => SelectColumn::Wildcard,
                SelectColumn::Expression(expr) => SelectColumn::Expression(fold_constants(expr)),
            })
            .collect(),
        from: stmt.from.into_iter().map(rewrite_table_expr).collect(),
        where_clause: stmt
            .where_clause
            .map(fold_constants)
            .map(dedup_conjuncts),
        group_by: stmt
            .group_by
            .map(|exprs| exprs.into_iter().map(fold_constants).collect()),
        having: stmt.having.map(fold_constants),
        order_by: stmt
            .order_by
            .into_iter()
            .map(|item| OrderByItem {
                expr: fold_constants(item.expr),
                direction: item.direction,
            })
            .collect(),
        limit: stmt.limit,
    }
}

fn rewrite_table_expr(expr: TableExpr) -> TableExpr {
    match expr {
        TableExpr::Table(table) => TableExpr::Table(table),
        TableExpr::Join {
            join_type,
            method,
            left,
            right,
            condition,
        } => TableExpr::Join {
            join_type,
            method,
            left: Box::new(rewrite_table_expr(*left)),
            right: Box::new(rewrite_table_expr(*right)),
            condition: condition.map(fold_constants),
        },
    }
}

/// Fold arithmetic over numeric literals bottom-up. Division by zero folds
/// to infinity/NaN like any other f64 arithmetic; that result is kept.
pub fn fold_constants(expr: Expression) -> Expression {
    match expr {
        Expression::BinaryOp { op, left, right } => {
            let left = fold_constants(*left);
            let right = fold_constants(*right);

            if let (
                Expression::Literal(Value::Number(a)),
                Expression::Literal(Value::Number(b)),
            ) = (&left, &right)
            {
                let folded = match op {
                    Operator::Plus => Some(a + b),
                    Operator::Minus => Some(a - b),
                    Operator::Multiply => Some(a * b),
                    Operator::Divide => Some(a / b),
                    _ => None,
                };
                if let Some(value) = folded {
                    return Expression::Literal(Value::Number(value));
                }
            }

            Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        Expression::Function { name, args } => Expression::Function {
            name,
            args: args.into_iter().map(fold_constants).collect(),
        },
        other => other,
    }
}

/// Drop structurally identical top-level AND conjuncts, keeping first
/// occurrences in order.
fn dedup_conjuncts(expr: Expression) -> Expression {
    let conjuncts = split_conjuncts(expr);
    let mut kept: Vec<Expression> = Vec::with_capacity(conjuncts.len());
    for conjunct in conjuncts {
        if !kept.contains(&conjunct) {
            kept.push(conjunct);
        }
    }
    // split_conjuncts never yields an empty list
    combine_conjuncts(kept).unwrap_or(Expression::Wildcard)
}

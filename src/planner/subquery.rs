// Subquery Flattening
//
// Extension point for rewriting EXISTS/IN subqueries into joins and for
// scalar subquery optimization. The SELECT grammar subset cannot yet nest
// statements inside expressions, so today this pass returns its input
// unchanged; downstream phases must stay correct regardless of whether
// flattening did anything.

use crate::parser::ast::SelectStatement;

/// Flatten subqueries into joins where possible. Best-effort: statements
/// with no flattenable shape pass through unchanged.
pub fn flatten_subqueries(stmt: SelectStatement) -> SelectStatement {
    stmt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_flattening_preserves_statements() {
        let stmt = parse("SELECT a FROM t WHERE a IN (1)").unwrap();
        let before = stmt.clone();
        assert_eq!(flatten_subqueries(stmt), before);
    }
}

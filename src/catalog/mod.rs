// Statistics Catalog
//
// This module holds the per-table statistics and index metadata the
// optimizer plans against. The catalog is supplied by the surrounding
// system and is read-only from the optimizer's perspective; interior locks
// exist only so registration and concurrent planning can share one
// instance.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Row count assumed for tables with no registered statistics. Unknown
/// tables still produce a plan, just a poorly-costed one.
pub const DEFAULT_ROW_COUNT: u64 = 1000;

/// Per-table statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableStatistics {
    pub row_count: u64,
    pub avg_row_size: Option<u32>,
    /// Distinct-value counts per column, when known
    pub column_cardinality: HashMap<String, u64>,
}

impl TableStatistics {
    pub fn with_row_count(row_count: u64) -> Self {
        TableStatistics {
            row_count,
            ..Default::default()
        }
    }
}

/// Metadata for one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
    /// Fraction of rows a point lookup is expected to match, in [0, 1]
    pub selectivity: f64,
}

/// Read-only statistics and index catalog. Safe to share across threads;
/// planning only takes read locks.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<HashMap<String, TableStatistics>>,
    indexes: RwLock<HashMap<String, Vec<IndexInfo>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Register (or replace) statistics for a table
    pub fn register_table(&self, name: &str, stats: TableStatistics) {
        self.tables.write().insert(name.to_string(), stats);
    }

    /// Register an index, keyed by its table
    pub fn register_index(&self, index: IndexInfo) {
        self.indexes
            .write()
            .entry(index.table.clone())
            .or_default()
            .push(index);
    }

    /// Row count for a table, defaulting when the table is unknown
    pub fn table_row_count(&self, name: &str) -> u64 {
        self.tables
            .read()
            .get(name)
            .map(|s| s.row_count)
            .unwrap_or(DEFAULT_ROW_COUNT)
    }

    /// Full statistics for a table, if registered
    pub fn table_statistics(&self, name: &str) -> Option<TableStatistics> {
        self.tables.read().get(name).cloned()
    }

    /// All indexes registered for a table
    pub fn indexes_for(&self, table: &str) -> Vec<IndexInfo> {
        self.indexes.read().get(table).cloned().unwrap_or_default()
    }

    /// Whether any index on the table covers the given column
    pub fn has_index_on(&self, table: &str, column: &str) -> bool {
        self.indexes.read().get(table).is_some_and(|indexes| {
            indexes
                .iter()
                .any(|idx| idx.columns.iter().any(|c| c == column))
        })
    }
}

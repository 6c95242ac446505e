use crate::dialect::DialectBehavior;

/// SQLite-backed variant. The most restrictive of the three: no table-valued
/// FROM roots, single-argument DISTINCT counting only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl DialectBehavior for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}

use crate::dialect::DialectBehavior;

#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbDialect;

impl DialectBehavior for DuckDbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn bind_marker(&self, name: &str) -> String {
        format!("${name}")
    }

    fn supports_from_function(&self) -> bool {
        true
    }

    fn tuple_distinct_count(&self) -> bool {
        true
    }
}

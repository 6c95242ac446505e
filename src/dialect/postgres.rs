use crate::dialect::DialectBehavior;

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl DialectBehavior for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn supports_from_function(&self) -> bool {
        true
    }

    fn tuple_distinct_count(&self) -> bool {
        true
    }
}

//! Query-language variants.
//!
//! The three supported backends share the statement structure but differ in
//! detail. Behavior differences live behind [`DialectBehavior`]; the [`Dialect`]
//! enum is the tagged-variant dispatch point at the crate boundary.

pub mod sqlite;
pub use sqlite::*;

pub mod postgres;
pub use postgres::*;

pub mod duckdb;
pub use duckdb::*;

/// Dialect-specific behavior hooks.
pub trait DialectBehavior {
    fn name(&self) -> &'static str;

    /// Spelling of a named bind placeholder.
    fn bind_marker(&self, name: &str) -> String {
        format!(":{name}")
    }

    /// Whether table-valued functions may appear as FROM roots.
    fn supports_from_function(&self) -> bool {
        false
    }

    /// Whether `COUNT(DISTINCT a, b)` accepts more than one argument. When it
    /// does not, a multi-item DISTINCT projection is counted through the
    /// primary alias instead.
    fn tuple_distinct_count(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
    DuckDb,
}

impl Dialect {
    pub fn behavior(&self) -> &'static dyn DialectBehavior {
        match self {
            Dialect::Sqlite => &SqliteDialect,
            Dialect::Postgres => &PostgresDialect,
            Dialect::DuckDb => &DuckDbDialect,
        }
    }

    pub fn name(&self) -> &'static str {
        self.behavior().name()
    }
}

use serde::{Deserialize, Serialize};

use crate::analyzer::StatementType;

/// Structural facts about one statement, frozen after a single introspection
/// pass. The repository layer reads these to pick execution and hydration
/// strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInformation {
    /// Alias bound to the outermost statement's first FROM root, when one was
    /// declared. Subqueries and non-first set-operation members never
    /// contribute here.
    pub primary_alias: Option<String>,
    /// Rendered select items of the primary SELECT clause, aliases included.
    pub projection: Vec<String>,
    /// A constructor expression occurs anywhere in the statement.
    pub has_constructor: bool,
    pub statement_type: StatementType,
    /// A common-table-expression block is declared anywhere.
    pub has_cte: bool,
    /// A table-valued function appears as a FROM root anywhere.
    pub has_from_function: bool,
}

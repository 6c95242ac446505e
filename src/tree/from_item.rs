use crate::tree::{FunctionCall, SelectStatement};

/// A FROM root: a named collection, a derived table, or a table-valued
/// function (dialects that support it).
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    Collection { name: String, alias: Option<String> },
    Subquery { query: Box<SelectStatement>, alias: Option<String> },
    Function { call: FunctionCall, alias: Option<String> },
}

impl FromItem {
    pub fn collection(name: impl Into<String>) -> Self {
        FromItem::Collection { name: name.into(), alias: None }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        FromItem::Collection { name: name.into(), alias: Some(alias.into()) }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            FromItem::Collection { alias, .. }
            | FromItem::Subquery { alias, .. }
            | FromItem::Function { alias, .. } => alias.as_deref(),
        }
    }

    /// The name this root is visible under in the statement scope: the alias
    /// when declared, otherwise the collection name itself.
    pub fn visible_name(&self) -> Option<&str> {
        match self {
            FromItem::Collection { name, alias } => Some(alias.as_deref().unwrap_or(name)),
            FromItem::Subquery { alias, .. } | FromItem::Function { alias, .. } => alias.as_deref(),
        }
    }
}

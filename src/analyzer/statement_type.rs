use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    Select,
    Update,
    Delete,
    Insert,
    Other,
}

impl StatementType {
    pub fn is_select(&self) -> bool {
        matches!(self, StatementType::Select)
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementType::Select => "SELECT",
            StatementType::Update => "UPDATE",
            StatementType::Delete => "DELETE",
            StatementType::Insert => "INSERT",
            StatementType::Other => "OTHER",
        };
        write!(f, "{}", name)
    }
}

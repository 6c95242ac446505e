use crate::tree::Expression;

/// One existing ORDER BY term as parsed. `ascending` is `None` when the
/// source text wrote no direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expression: Expression,
    pub ascending: Option<bool>,
}

impl OrderItem {
    pub fn new(expression: Expression) -> Self {
        Self { expression, ascending: None }
    }

    pub fn asc(expression: Expression) -> Self {
        Self { expression, ascending: Some(true) }
    }

    pub fn desc(expression: Expression) -> Self {
        Self { expression, ascending: Some(false) }
    }
}

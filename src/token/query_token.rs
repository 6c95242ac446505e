use std::fmt;

/// One fragment of rewritten query text. Expression tokens are joined to the
/// following token with a single space; inline tokens join tight, which is
/// what `(`, `)` and `,` need on their tight side.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct QueryToken {
    pub value: String,
    pub expression: bool,
}

impl QueryToken {
    pub fn expression(value: impl Into<String>) -> Self {
        Self { value: value.into(), expression: true }
    }

    pub fn inline(value: impl Into<String>) -> Self {
        Self { value: value.into(), expression: false }
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Debug for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expression {
            write!(f, "Token({})", self.value)
        } else {
            write!(f, "Inline({})", self.value)
        }
    }
}

use std::fmt;

use crate::token::QueryToken;

/// Ordered, immutable sequence of tokens produced by one visitor pass.
///
/// `expression` reports whether the stream as a whole should be treated as a
/// single expression when embedded into a larger stream.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct QueryTokenStream {
    tokens: Vec<QueryToken>,
    expression: bool,
}

impl QueryTokenStream {
    /// No tokens produced for a grammar node. Absence, not null.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_tokens(tokens: Vec<QueryToken>, expression: bool) -> Self {
        Self { tokens, expression }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_expression(&self) -> bool {
        self.expression
    }

    pub fn tokens(&self) -> &[QueryToken] {
        &self.tokens
    }

    pub(crate) fn into_tokens(self) -> Vec<QueryToken> {
        self.tokens
    }

    /// Concatenates token values, inserting exactly one space where the
    /// preceding token is an expression token. No token is duplicated or
    /// dropped.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let last = self.tokens.len().saturating_sub(1);
        for (index, token) in self.tokens.iter().enumerate() {
            out.push_str(&token.value);
            if index < last && token.expression {
                out.push(' ');
            }
        }
        out
    }
}

impl fmt::Display for QueryTokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl fmt::Debug for QueryTokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryTokenStream({:?})", self.tokens)
    }
}

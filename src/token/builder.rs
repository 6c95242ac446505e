use crate::token::{QueryToken, QueryTokenStream};

/// Mutable token accumulator. Owned by the visitor invocation that created
/// it; `build` freezes the buffer into a [`QueryTokenStream`].
pub struct TokenStreamBuilder {
    tokens: Vec<QueryToken>,
    expression: bool,
}

impl TokenStreamBuilder {
    pub fn new() -> Self {
        Self { tokens: vec![], expression: true }
    }

    /// Builder for a stream that joins tight when embedded elsewhere.
    pub fn inline() -> Self {
        Self { tokens: vec![], expression: false }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn append(&mut self, token: QueryToken) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Concatenates without a separator between the current content and the
    /// start of `stream`. Used for syntactically adjacent fragments.
    pub fn append_inline(&mut self, stream: QueryTokenStream) -> &mut Self {
        if stream.is_empty() {
            return self;
        }
        if let Some(last) = self.tokens.last_mut() {
            last.expression = false;
        }
        self.tokens.extend(stream.into_tokens());
        self
    }

    /// Always inserts a separating boundary, regardless of the inline state
    /// of the current content. Used when joining independent clauses.
    pub fn append_expression(&mut self, stream: QueryTokenStream) -> &mut Self {
        if stream.is_empty() {
            return self;
        }
        if let Some(last) = self.tokens.last_mut() {
            last.expression = true;
        }
        self.tokens.extend(stream.into_tokens());
        self
    }

    /// Appends by the stream's own nature: expression streams get a boundary,
    /// inline streams join tight.
    pub fn append_stream(&mut self, stream: QueryTokenStream) -> &mut Self {
        if stream.is_expression() {
            self.append_expression(stream)
        } else {
            self.append_inline(stream)
        }
    }

    /// Wraps `stream` in parentheses: `(` and `)` join tight against the
    /// wrapped content, the closing paren stays an expression token so a
    /// following clause keeps its separating space.
    pub fn group(&mut self, stream: QueryTokenStream) -> &mut Self {
        self.append(QueryToken::inline("("));
        self.tokens.extend(stream.into_tokens());
        if let Some(last) = self.tokens.last_mut() {
            last.expression = false;
        }
        self.append(QueryToken::expression(")"));
        self
    }

    /// Tight-left, spaced-right list separator.
    pub fn comma(&mut self) -> &mut Self {
        if let Some(last) = self.tokens.last_mut() {
            last.expression = false;
        }
        self.append(QueryToken::expression(","));
        self
    }

    /// Renders `name(arg, arg, …)` as a stream.
    pub fn function(name: &str, args: impl IntoIterator<Item = QueryTokenStream>) -> QueryTokenStream {
        let mut inner = TokenStreamBuilder::new();
        for (index, arg) in args.into_iter().enumerate() {
            if index > 0 {
                inner.comma();
            }
            inner.append_expression(arg);
        }

        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::inline(name));
        builder.group(inner.build());
        builder.build()
    }

    pub fn build(self) -> QueryTokenStream {
        QueryTokenStream::from_tokens(self.tokens, self.expression)
    }
}

#[cfg(test)]
mod tests {
    use crate::token::{QueryToken, TokenStreamBuilder};

    #[test]
    pub fn test_append_spaces_expression_tokens() {
        let mut builder = TokenStreamBuilder::new();
        builder
            .append(QueryToken::expression("SELECT"))
            .append(QueryToken::expression("e"))
            .append(QueryToken::expression("FROM"))
            .append(QueryToken::expression("users"));

        assert_eq!(builder.build().render(), "SELECT e FROM users");
    }

    #[test]
    pub fn test_append_inline_suppresses_separator() {
        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("e.name"));

        let mut tail = TokenStreamBuilder::new();
        tail.append(QueryToken::expression(","));

        let mut merged = builder;
        merged.append_inline(tail.build());

        assert_eq!(merged.build().render(), "e.name,");
    }

    #[test]
    pub fn test_append_expression_forces_boundary() {
        let mut head = TokenStreamBuilder::new();
        head.append(QueryToken::inline("e.id"));

        let mut tail = TokenStreamBuilder::new();
        tail.append(QueryToken::expression("FROM"));

        let mut merged = head;
        merged.append_expression(tail.build());

        assert_eq!(merged.build().render(), "e.id FROM");
    }

    #[test]
    pub fn test_group_wraps_tight() {
        let mut inner = TokenStreamBuilder::new();
        inner
            .append(QueryToken::expression("SELECT"))
            .append(QueryToken::expression("u.id"))
            .append(QueryToken::expression("FROM"))
            .append(QueryToken::expression("users"))
            .append(QueryToken::expression("u"));

        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("EXISTS"));
        builder.group(inner.build());

        assert_eq!(builder.build().render(), "EXISTS (SELECT u.id FROM users u)");
    }

    #[test]
    pub fn test_group_keeps_space_before_following_clause() {
        let mut inner = TokenStreamBuilder::new();
        inner.append(QueryToken::expression("e"));

        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::inline("COUNT"));
        builder.group(inner.build());
        builder.append(QueryToken::expression("FROM"));

        assert_eq!(builder.build().render(), "COUNT(e) FROM");
    }

    #[test]
    pub fn test_function_stream() {
        let mut first = TokenStreamBuilder::new();
        first.append(QueryToken::expression("e.first"));
        let mut second = TokenStreamBuilder::new();
        second.append(QueryToken::expression("e.last"));

        let stream = TokenStreamBuilder::function("concat", [first.build(), second.build()]);

        assert_eq!(stream.render(), "concat(e.first, e.last)");
    }

    #[test]
    pub fn test_empty_streams_are_ignored() {
        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("WHERE"));
        builder.append_expression(crate::token::QueryTokenStream::empty());
        builder.append_inline(crate::token::QueryTokenStream::empty());

        assert_eq!(builder.build().render(), "WHERE");
    }
}

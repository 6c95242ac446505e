use tracing::debug;

use crate::{
    analyzer::QueryInformation,
    dialect::DialectBehavior,
    rewriter::{
        render::{expression_stream, StatementRenderer},
        RewriteError,
    },
    token::{QueryToken, QueryTokenStream, TokenStreamBuilder},
    tree::{SelectCore, Statement},
};

/// Derives the row-counting variant of a SELECT statement: the clauses that
/// determine the row set are reproduced, the projection is wrapped in a
/// counting aggregate, ORDER BY / LIMIT / OFFSET and trailing set-operation
/// members are dropped. The primary alias arrives from introspection; this
/// transformer never re-derives it.
pub struct CountRewriter<'a> {
    dialect: &'a dyn DialectBehavior,
}

impl<'a> CountRewriter<'a> {
    pub fn new(dialect: &'a dyn DialectBehavior) -> Self {
        Self { dialect }
    }

    pub fn rewrite(
        &self,
        statement: &Statement,
        info: &QueryInformation,
        count_projection: Option<&str>,
    ) -> Result<QueryTokenStream, RewriteError> {
        let select = match statement {
            Statement::Select(select) => select,
            other => {
                return RewriteError::Unsupported {
                    operation: "count derivation",
                    construct: other.kind_name().to_string(),
                }
                .err()
            }
        };
        let Some(core) = select.members.first() else {
            return RewriteError::Unsupported {
                operation: "count derivation",
                construct: "select statement without members".to_string(),
            }
            .err();
        };

        let mut renderer = StatementRenderer::plain();
        let mut builder = TokenStreamBuilder::new();

        if let Some(with) = &select.with {
            builder.append_expression(renderer.with_clause(with));
        }

        builder.append(QueryToken::expression("SELECT"));
        let argument = self.count_argument(core, info, count_projection)?;
        let mut count = TokenStreamBuilder::new();
        count.append(QueryToken::inline("COUNT"));
        count.group(argument);
        builder.append_expression(count.build());

        builder.append_expression(renderer.core_body(core, false, false));

        if select.is_compound() {
            debug!(
                dialect = self.dialect.name(),
                dropped_members = select.members.len() - 1,
                "count derivation covers the first set-operation member only"
            );
        }

        Ok(builder.build())
    }

    fn count_argument(
        &self,
        core: &SelectCore,
        info: &QueryInformation,
        count_projection: Option<&str>,
    ) -> Result<QueryTokenStream, RewriteError> {
        let mut builder = TokenStreamBuilder::new();

        if let Some(projection) = count_projection {
            if core.distinct {
                builder.append(QueryToken::expression("DISTINCT"));
            }
            builder.append(QueryToken::expression(projection.to_string()));
            return Ok(builder.build());
        }

        if core.distinct {
            builder.append(QueryToken::expression("DISTINCT"));
            let has_constructor = core.projection.iter().any(|item| item.expression.is_constructor());
            let needs_alias_fallback = has_constructor
                || (core.projection.len() > 1 && !self.dialect.tuple_distinct_count());

            if needs_alias_fallback {
                // Constructors are not valid DISTINCT count targets; count
                // entity identity through the primary alias instead.
                let alias = info
                    .primary_alias
                    .as_deref()
                    .ok_or(RewriteError::MissingPrimaryAlias)?;
                builder.append(QueryToken::expression(alias.to_string()));
            } else {
                for (index, item) in core.projection.iter().enumerate() {
                    if index > 0 {
                        builder.comma();
                    }
                    // Bare expression form: any `AS alias` is stripped.
                    builder.append_expression(expression_stream(&item.expression));
                }
            }
            return Ok(builder.build());
        }

        let alias = info
            .primary_alias
            .as_deref()
            .ok_or(RewriteError::MissingPrimaryAlias)?;
        builder.append(QueryToken::expression(alias.to_string()));
        Ok(builder.build())
    }
}

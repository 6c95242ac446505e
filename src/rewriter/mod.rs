pub mod error;
pub use error::*;

pub mod alias_registry;
pub use alias_registry::*;

pub mod sort;
pub use sort::*;

pub mod count;
pub use count::*;

pub mod keyset;
pub use keyset::*;

pub(crate) mod render;

use tracing::debug;

use crate::{
    analyzer::{Introspector, QueryInformation},
    dialect::Dialect,
    rewriter::render::{KeysetSplice, StatementRenderer},
    tree::Statement,
};

/// Rewritten query text plus the synthesized bindings the caller must pass
/// to its execution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenQuery {
    pub text: String,
    pub bindings: Vec<ParameterBinding>,
}

/// The crate boundary: one rewriter bound to one dialect. Every call is a
/// pure function of (tree, request); instances hold no per-query state and
/// are freely shareable.
#[derive(Debug, Clone, Copy)]
pub struct QueryRewriter {
    dialect: Dialect,
}

impl QueryRewriter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Structural facts from one read-only pass.
    pub fn introspect(&self, statement: &Statement) -> QueryInformation {
        Introspector::introspect(statement)
    }

    /// Reproduces the tree with no rewriting applied. Whitespace is
    /// normalized; everything else round-trips.
    pub fn reproduce(&self, statement: &Statement) -> String {
        StatementRenderer::plain().statement(statement).render()
    }

    /// Reproduces the statement with the sort specification merged into its
    /// trailing ORDER BY position.
    pub fn apply_sort(&self, statement: &Statement, sort: &Sort) -> Result<String, RewriteError> {
        let stream = SortRewriter::rewrite(statement, sort)?;
        debug!(dialect = self.dialect.name(), sort = %sort.fingerprint(), "applied sort rewrite");
        Ok(stream.render())
    }

    /// Derives the row-counting variant. An explicit `count_projection`
    /// always wins over the derived selection.
    pub fn count_query(
        &self,
        statement: &Statement,
        count_projection: Option<&str>,
    ) -> Result<String, RewriteError> {
        let info = self.introspect(statement);
        let stream =
            CountRewriter::new(self.dialect.behavior()).rewrite(statement, &info, count_projection)?;
        debug!(dialect = self.dialect.name(), "derived count query");
        Ok(stream.render())
    }

    /// Reproduces the statement with the sort applied and the seek predicate
    /// spliced into WHERE. An empty position means first page: the text is
    /// just the sorted query and no bindings are produced.
    pub fn keyset_query(
        &self,
        statement: &Statement,
        sort: &Sort,
        position: &KeysetPosition,
        direction: ScrollDirection,
    ) -> Result<RewrittenQuery, RewriteError> {
        sort.validate()?;
        if !sort.is_sorted() {
            return RewriteError::EmptyKeysetSort.err();
        }

        let select = match statement {
            Statement::Select(select) => select,
            other => {
                return RewriteError::Unsupported {
                    operation: "keyset pagination",
                    construct: other.kind_name().to_string(),
                }
                .err()
            }
        };
        if select.is_compound() {
            return RewriteError::Unsupported {
                operation: "keyset pagination",
                construct: "set operations".to_string(),
            }
            .err();
        }
        if !position.is_empty() {
            for key in &sort.keys {
                if position.get(&key.property).is_none() {
                    return RewriteError::MissingKeysetValue(key.property.clone()).err();
                }
            }
        }

        let splice = KeysetSplice { dialect: self.dialect.behavior(), position, direction };
        let mut renderer = StatementRenderer::with_keyset(sort, splice);
        let stream = renderer.select_statement(select, true);
        let bindings = std::mem::take(&mut renderer.bindings);
        debug!(
            dialect = self.dialect.name(),
            sort = %sort.fingerprint(),
            bindings = bindings.len(),
            "spliced keyset predicate"
        );
        Ok(RewrittenQuery { text: stream.render(), bindings })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        dialect::Dialect,
        rewriter::{KeysetPosition, QueryRewriter, RewriteError, ScrollDirection, Sort, SortKey},
        tree::{
            Expression, FromItem, OrderItem, SelectCore, SelectItem, SelectStatement,
            SetOperator, Statement,
        },
    };

    fn entity_statement() -> Statement {
        Statement::Select(SelectStatement::new(SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme("e"))],
            collections: vec![FromItem::aliased("Entity", "e")],
            ..Default::default()
        }))
    }

    #[test]
    pub fn test_sort_injects_qualified_order_by() {
        let rewriter = QueryRewriter::new(Dialect::Sqlite);

        let text = rewriter
            .apply_sort(&entity_statement(), &Sort::asc("name"))
            .expect("Failed to apply sort");

        assert_eq!(text, "SELECT e FROM Entity e ORDER BY e.name ASC");
    }

    #[test]
    pub fn test_sort_merges_after_existing_order_by() {
        let statement = Statement::Select(SelectStatement::new(SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme("e"))],
            collections: vec![FromItem::aliased("Entity", "e")],
            order_by: vec![OrderItem::desc(Expression::lexeme("e.age"))],
            ..Default::default()
        }));

        let text = QueryRewriter::new(Dialect::Sqlite)
            .apply_sort(&statement, &Sort::asc("name"))
            .expect("Failed to apply sort");

        assert_eq!(text, "SELECT e FROM Entity e ORDER BY e.age DESC, e.name ASC");
    }

    #[test]
    pub fn test_sort_keeps_registered_alias_unqualified() {
        let statement = Statement::Select(SelectStatement::new(SelectCore {
            projection: vec![SelectItem::aliased(Expression::lexeme("e.full_name"), "name")],
            collections: vec![FromItem::aliased("Entity", "e")],
            ..Default::default()
        }));

        let text = QueryRewriter::new(Dialect::Sqlite)
            .apply_sort(&statement, &Sort::asc("name"))
            .expect("Failed to apply sort");

        assert_eq!(text, "SELECT e.full_name AS name FROM Entity e ORDER BY name ASC");
    }

    #[test]
    pub fn test_empty_sort_reproduces_statement() {
        let statement = Statement::Select(SelectStatement::new(SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme("e"))],
            collections: vec![FromItem::aliased("Entity", "e")],
            order_by: vec![OrderItem::asc(Expression::lexeme("e.id"))],
            ..Default::default()
        }));

        let text = QueryRewriter::new(Dialect::Sqlite)
            .apply_sort(&statement, &Sort::unsorted())
            .expect("Failed to apply sort");

        assert_eq!(text, "SELECT e FROM Entity e ORDER BY e.id ASC");
    }

    #[test]
    pub fn test_sort_targets_final_set_member_only() {
        let first = SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme("e.id"))],
            collections: vec![FromItem::aliased("events", "e")],
            order_by: vec![OrderItem::asc(Expression::lexeme("e.id"))],
            ..Default::default()
        };
        let second = SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme("a.id"))],
            collections: vec![FromItem::aliased("archived", "a")],
            ..Default::default()
        };
        let statement = Statement::Select(
            SelectStatement::new(first).push_member(SetOperator::UnionAll, second),
        );

        let text = QueryRewriter::new(Dialect::Sqlite)
            .apply_sort(&statement, &Sort::desc("created_at"))
            .expect("Failed to apply sort");

        assert_eq!(
            text,
            "SELECT e.id FROM events e ORDER BY e.id ASC \
             UNION ALL \
             SELECT a.id FROM archived a ORDER BY e.created_at DESC"
        );
    }

    #[test]
    pub fn test_unsafe_sort_property_rejected() {
        let result = QueryRewriter::new(Dialect::Sqlite)
            .apply_sort(&entity_statement(), &Sort::asc("name; DROP TABLE users"));

        assert_eq!(
            result,
            Err(RewriteError::UnsafeSortProperty("name; DROP TABLE users".into()))
        );
    }

    #[test]
    pub fn test_sort_rejects_update_statements() {
        let statement = Statement::Update(crate::tree::UpdateStatement {
            collection: "users".into(),
            alias: None,
            assignments: vec![],
            criteria: None,
        });

        let result = QueryRewriter::new(Dialect::Sqlite).apply_sort(&statement, &Sort::asc("name"));

        assert!(matches!(result, Err(RewriteError::Unsupported { .. })));
    }

    #[test]
    pub fn test_keyset_query_splices_predicate_and_sorts() {
        let statement = Statement::Select(SelectStatement::new(SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme("e"))],
            collections: vec![FromItem::aliased("Entity", "e")],
            criteria: Some(Expression::lexemes(["e.active", "=", "true"])),
            ..Default::default()
        }));
        let sort = Sort::desc("age").and(SortKey::asc("id"));
        let position = KeysetPosition::new().with("age", 30).with("id", 5);

        let rewritten = QueryRewriter::new(Dialect::Sqlite)
            .keyset_query(&statement, &sort, &position, ScrollDirection::Forward)
            .expect("Failed to rewrite for keyset pagination");

        assert_eq!(
            rewritten.text,
            "SELECT e FROM Entity e \
             WHERE (e.active = true) \
             AND ((e.age < :keyset_age) OR (e.age = :keyset_age AND e.id > :keyset_id)) \
             ORDER BY e.age DESC, e.id ASC"
        );
        assert_eq!(rewritten.bindings.len(), 2);
        assert_eq!(rewritten.bindings[0].name, "keyset_age");
        assert_eq!(rewritten.bindings[1].name, "keyset_id");
    }

    #[test]
    pub fn test_keyset_first_page_has_no_predicate() {
        let rewritten = QueryRewriter::new(Dialect::Sqlite)
            .keyset_query(
                &entity_statement(),
                &Sort::asc("id"),
                &KeysetPosition::new(),
                ScrollDirection::Forward,
            )
            .expect("Failed to rewrite for keyset pagination");

        assert_eq!(rewritten.text, "SELECT e FROM Entity e ORDER BY e.id ASC");
        assert!(rewritten.bindings.is_empty());
    }

    #[test]
    pub fn test_keyset_rejects_set_operations() {
        let statement = Statement::Select(
            SelectStatement::new(SelectCore {
                projection: vec![SelectItem::new(Expression::lexeme("e"))],
                collections: vec![FromItem::aliased("events", "e")],
                ..Default::default()
            })
            .push_member(
                SetOperator::Union,
                SelectCore {
                    projection: vec![SelectItem::new(Expression::lexeme("a"))],
                    collections: vec![FromItem::aliased("archived", "a")],
                    ..Default::default()
                },
            ),
        );

        let result = QueryRewriter::new(Dialect::Sqlite).keyset_query(
            &statement,
            &Sort::asc("id"),
            &KeysetPosition::new().with("id", 5),
            ScrollDirection::Forward,
        );

        assert!(matches!(result, Err(RewriteError::Unsupported { .. })));
    }

    #[test]
    pub fn test_keyset_without_sort_fails() {
        let result = QueryRewriter::new(Dialect::Sqlite).keyset_query(
            &entity_statement(),
            &Sort::unsorted(),
            &KeysetPosition::new().with("id", 5),
            ScrollDirection::Forward,
        );

        assert_eq!(result, Err(RewriteError::EmptyKeysetSort));
    }

    #[test]
    pub fn test_count_query_via_facade() {
        let text = QueryRewriter::new(Dialect::Sqlite)
            .count_query(&entity_statement(), None)
            .expect("Failed to derive count");

        assert_eq!(text, "SELECT COUNT(e) FROM Entity e");
    }
}

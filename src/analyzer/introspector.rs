use tracing::trace;

use crate::{
    analyzer::{InfoHolder, QueryInformation, StatementType},
    rewriter::render::select_item_stream,
    tree::{Expression, ExprSegment, FromItem, SelectCore, SelectStatement, Statement},
};

/// Read-only, single-pass walk populating an [`InfoHolder`]. Primary facts
/// (alias, projection, statement type) are taken from the outermost
/// statement only; subqueries, CTE bodies and non-first set-operation
/// members are walked with the primary flag off so they can only contribute
/// existential feature flags.
pub struct Introspector {
    holder: InfoHolder,
}

impl Introspector {
    pub fn introspect(statement: &Statement) -> QueryInformation {
        let mut walker = Self { holder: InfoHolder::new() };

        match statement {
            Statement::Select(select) => {
                walker.holder.set_statement_type(StatementType::Select);
                walker.visit_select(select, true);
            }
            Statement::Update(update) => {
                walker.holder.set_statement_type(StatementType::Update);
                if let Some(alias) = &update.alias {
                    walker.holder.set_primary_alias(alias);
                }
                for assignment in &update.assignments {
                    walker.scan_expression(&assignment.value);
                }
                if let Some(criteria) = &update.criteria {
                    walker.scan_expression(criteria);
                }
            }
            Statement::Delete(delete) => {
                walker.holder.set_statement_type(StatementType::Delete);
                if let Some(alias) = &delete.alias {
                    walker.holder.set_primary_alias(alias);
                }
                if let Some(criteria) = &delete.criteria {
                    walker.scan_expression(criteria);
                }
            }
            Statement::Insert(insert) => {
                walker.holder.set_statement_type(StatementType::Insert);
                match &insert.source {
                    crate::tree::InsertSource::Values(rows) => {
                        for row in rows {
                            for value in row {
                                walker.scan_expression(value);
                            }
                        }
                    }
                    crate::tree::InsertSource::Query(query) => walker.visit_select(query, false),
                }
            }
        }

        let info = walker.holder.freeze();
        trace!(
            statement = statement.kind_name(),
            alias = info.primary_alias.as_deref().unwrap_or(""),
            "introspected statement"
        );
        info
    }

    fn visit_select(&mut self, select: &SelectStatement, primary: bool) {
        if let Some(with) = &select.with {
            self.holder.mark_cte();
            // CTE bodies carry feature flags only; their SELECT clauses must
            // never override the outer statement's facts.
            for table in &with.tables {
                self.visit_select(&table.query, false);
            }
        }

        for (index, member) in select.members.iter().enumerate() {
            self.visit_core(member, primary && index == 0);
        }
    }

    fn visit_core(&mut self, core: &SelectCore, primary: bool) {
        if primary {
            let rendered = core
                .projection
                .iter()
                .map(|item| select_item_stream(item).render())
                .collect();
            self.holder.set_projection(rendered);
        }

        for item in &core.projection {
            self.scan_expression(&item.expression);
        }

        for (index, root) in core.collections.iter().enumerate() {
            if primary && index == 0 {
                if let Some(alias) = root.alias() {
                    self.holder.set_primary_alias(alias);
                }
            }
            self.visit_from_item(root);
        }

        for join in &core.joins {
            self.visit_from_item(&join.item);
            if let Some(constraint) = &join.constraint {
                self.scan_expression(constraint);
            }
        }

        if let Some(criteria) = &core.criteria {
            self.scan_expression(criteria);
        }
        for expression in &core.group_by {
            self.scan_expression(expression);
        }
        if let Some(having) = &core.having {
            self.scan_expression(having);
        }
        for item in &core.order_by {
            self.scan_expression(&item.expression);
        }
    }

    fn visit_from_item(&mut self, item: &FromItem) {
        match item {
            FromItem::Collection { .. } => {}
            FromItem::Subquery { query, .. } => self.visit_select(query, false),
            FromItem::Function { .. } => self.holder.mark_from_function(),
        }
    }

    fn scan_expression(&mut self, expression: &Expression) {
        for segment in &expression.segments {
            match segment {
                ExprSegment::Lexeme(_) => {}
                ExprSegment::Nested(inner) => self.scan_expression(inner),
                ExprSegment::Subquery(query) => self.visit_select(query, false),
                ExprSegment::Constructor(ctor) => {
                    self.holder.mark_constructor();
                    for arg in &ctor.args {
                        self.scan_expression(arg);
                    }
                }
                ExprSegment::Call(call) => {
                    for arg in &call.args {
                        self.scan_expression(arg);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analyzer::{Introspector, StatementType},
        tree::{
            Expression, FromItem, FunctionCall, SelectCore, SelectItem, SelectStatement,
            SetOperator, Statement, WithClause,
        },
    };

    fn entity_select(collection: &str, alias: &str) -> SelectCore {
        SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme(alias))],
            collections: vec![FromItem::aliased(collection, alias)],
            ..Default::default()
        }
    }

    #[test]
    pub fn test_simple_select_facts() {
        let statement = Statement::Select(SelectStatement::new(entity_select("users", "u")));

        let info = Introspector::introspect(&statement);

        assert_eq!(info.statement_type, StatementType::Select);
        assert_eq!(info.primary_alias.as_deref(), Some("u"));
        assert_eq!(info.projection, vec!["u".to_string()]);
        assert!(!info.has_constructor);
        assert!(!info.has_cte);
    }

    #[test]
    pub fn test_introspection_is_idempotent() {
        let statement = Statement::Select(SelectStatement::new(entity_select("users", "u")));

        let first = Introspector::introspect(&statement);
        let second = Introspector::introspect(&statement);

        assert_eq!(first, second);
    }

    #[test]
    pub fn test_subquery_alias_never_wins() {
        let subquery = SelectStatement::new(entity_select("orders", "o"));
        let mut outer = entity_select("users", "u");
        outer.criteria = Some(Expression {
            segments: vec![
                crate::tree::ExprSegment::Lexeme("u.id".into()),
                crate::tree::ExprSegment::Lexeme("IN".into()),
                crate::tree::ExprSegment::Subquery(Box::new(subquery)),
            ],
        });

        let info = Introspector::introspect(&Statement::Select(SelectStatement::new(outer)));

        assert_eq!(info.primary_alias.as_deref(), Some("u"));
        assert_eq!(info.projection, vec!["u".to_string()]);
    }

    #[test]
    pub fn test_cte_body_sets_flag_but_not_projection() {
        let cte_body = SelectStatement::new(entity_select("events", "ev"));
        let statement = SelectStatement::new(entity_select("users", "u"))
            .with_clause(WithClause::single("recent", cte_body));

        let info = Introspector::introspect(&Statement::Select(statement));

        assert!(info.has_cte);
        assert_eq!(info.primary_alias.as_deref(), Some("u"));
        assert_eq!(info.projection, vec!["u".to_string()]);
    }

    #[test]
    pub fn test_set_operation_captures_first_member_only() {
        let statement = SelectStatement::new(entity_select("users", "u"))
            .push_member(SetOperator::UnionAll, entity_select("archived_users", "a"));

        let info = Introspector::introspect(&Statement::Select(statement));

        assert_eq!(info.primary_alias.as_deref(), Some("u"));
        assert_eq!(info.projection, vec!["u".to_string()]);
    }

    #[test]
    pub fn test_constructor_flag_is_existential() {
        let subquery_core = SelectCore {
            projection: vec![SelectItem::new(Expression::constructor(
                "OrderDto",
                vec![Expression::lexeme("o.id")],
            ))],
            collections: vec![FromItem::aliased("orders", "o")],
            ..Default::default()
        };
        let mut outer = entity_select("users", "u");
        outer.criteria = Some(Expression {
            segments: vec![
                crate::tree::ExprSegment::Lexeme("EXISTS".into()),
                crate::tree::ExprSegment::Subquery(Box::new(SelectStatement::new(subquery_core))),
            ],
        });

        let info = Introspector::introspect(&Statement::Select(SelectStatement::new(outer)));

        assert!(info.has_constructor);
        assert!(!info.projection.iter().any(|item| item.contains("OrderDto")));
    }

    #[test]
    pub fn test_from_function_flag() {
        let core = SelectCore {
            projection: vec![SelectItem::new(Expression::lexeme("g"))],
            collections: vec![FromItem::Function {
                call: FunctionCall {
                    name: "generate_series".into(),
                    args: vec![Expression::lexeme("1"), Expression::lexeme("10")],
                },
                alias: Some("g".into()),
            }],
            ..Default::default()
        };

        let info = Introspector::introspect(&Statement::Select(SelectStatement::new(core)));

        assert!(info.has_from_function);
        assert_eq!(info.primary_alias.as_deref(), Some("g"));
    }

    #[test]
    pub fn test_update_statement_facts() {
        let statement = Statement::Update(crate::tree::UpdateStatement {
            collection: "users".into(),
            alias: Some("u".into()),
            assignments: vec![crate::tree::Assignment {
                target: "u.active".into(),
                value: Expression::lexeme("false"),
            }],
            criteria: Some(Expression::lexemes(["u.last_seen", "<", "'2024-01-01'"])),
        });

        let info = Introspector::introspect(&statement);

        assert_eq!(info.statement_type, StatementType::Update);
        assert_eq!(info.primary_alias.as_deref(), Some("u"));
        assert!(info.projection.is_empty());
    }
}

use crate::{
    dialect::DialectBehavior,
    rewriter::{
        keyset::{expand_predicate, BindingTable},
        AliasRegistry, KeysetPosition, ParameterBinding, ScrollDirection, Sort, SortKey,
    },
    token::{QueryToken, QueryTokenStream, TokenStreamBuilder},
    tree::{
        DeleteStatement, ExprSegment, Expression, FromItem, InsertSource, InsertStatement,
        SelectCore, SelectItem, SelectStatement, Statement, UpdateStatement, WithClause,
    },
};

/// Renders one expression node back to tokens. Subqueries inside get their
/// own renderer scope: their aliases stay local and they never receive
/// sort or keyset injection.
pub(crate) fn expression_stream(expression: &Expression) -> QueryTokenStream {
    let mut builder = TokenStreamBuilder::new();
    for segment in &expression.segments {
        match segment {
            ExprSegment::Lexeme(lexeme) => {
                builder.append(QueryToken::expression(lexeme.clone()));
            }
            ExprSegment::Nested(inner) => {
                builder.group(expression_stream(inner));
            }
            ExprSegment::Subquery(query) => {
                let mut sub = StatementRenderer::plain();
                builder.group(sub.select_statement(query, false));
            }
            ExprSegment::Constructor(ctor) => {
                builder.append(QueryToken::expression("NEW"));
                builder.append_expression(TokenStreamBuilder::function(
                    &ctor.type_name,
                    ctor.args.iter().map(expression_stream),
                ));
            }
            ExprSegment::Call(call) => {
                builder.append_expression(TokenStreamBuilder::function(
                    &call.name,
                    call.args.iter().map(expression_stream),
                ));
            }
        }
    }
    builder.build()
}

/// One select item with its `AS` alias.
pub(crate) fn select_item_stream(item: &SelectItem) -> QueryTokenStream {
    let mut builder = TokenStreamBuilder::new();
    builder.append_expression(expression_stream(&item.expression));
    if let Some(alias) = &item.alias {
        builder.append(QueryToken::expression("AS"));
        builder.append(QueryToken::expression(alias.clone()));
    }
    builder.build()
}

fn from_item_stream(item: &FromItem) -> QueryTokenStream {
    let mut builder = TokenStreamBuilder::new();
    match item {
        FromItem::Collection { name, alias } => {
            builder.append(QueryToken::expression(name.clone()));
            if let Some(alias) = alias {
                builder.append(QueryToken::expression(alias.clone()));
            }
        }
        FromItem::Subquery { query, alias } => {
            let mut sub = StatementRenderer::plain();
            builder.group(sub.select_statement(query, false));
            if let Some(alias) = alias {
                builder.append(QueryToken::expression(alias.clone()));
            }
        }
        FromItem::Function { call, alias } => {
            builder.append_expression(TokenStreamBuilder::function(
                &call.name,
                call.args.iter().map(expression_stream),
            ));
            if let Some(alias) = alias {
                builder.append(QueryToken::expression(alias.clone()));
            }
        }
    }
    builder.build()
}

/// Keyset splice configuration carried by one rewrite pass.
pub(crate) struct KeysetSplice<'a> {
    pub dialect: &'a dyn DialectBehavior,
    pub position: &'a KeysetPosition,
    pub direction: ScrollDirection,
}

/// Reproduces a statement as a token stream, registering declared aliases as
/// it walks. The sort and keyset fields make it the shared chassis of the
/// rewrite visitors; with both unset it is the plain round-trip pass.
pub(crate) struct StatementRenderer<'a> {
    pub aliases: AliasRegistry,
    pub primary_alias: Option<String>,
    sort: Option<&'a Sort>,
    keyset: Option<KeysetSplice<'a>>,
    pub bindings: Vec<ParameterBinding>,
}

impl<'a> StatementRenderer<'a> {
    pub fn plain() -> Self {
        Self {
            aliases: AliasRegistry::new(),
            primary_alias: None,
            sort: None,
            keyset: None,
            bindings: vec![],
        }
    }

    pub fn with_sort(sort: &'a Sort) -> Self {
        Self { sort: Some(sort), ..Self::plain() }
    }

    pub fn with_keyset(sort: &'a Sort, splice: KeysetSplice<'a>) -> Self {
        Self { sort: Some(sort), keyset: Some(splice), ..Self::plain() }
    }

    pub fn statement(&mut self, statement: &Statement) -> QueryTokenStream {
        match statement {
            Statement::Select(select) => self.select_statement(select, true),
            Statement::Update(update) => self.update_statement(update),
            Statement::Delete(delete) => self.delete_statement(delete),
            Statement::Insert(insert) => self.insert_statement(insert),
        }
    }

    pub fn select_statement(&mut self, select: &SelectStatement, outermost: bool) -> QueryTokenStream {
        let mut builder = TokenStreamBuilder::new();

        if let Some(with) = &select.with {
            builder.append_expression(self.with_clause(with));
        }

        let last = select.members.len().saturating_sub(1);
        for (index, member) in select.members.iter().enumerate() {
            if index > 0 {
                if let Some(operator) = select.operators.get(index - 1) {
                    builder.append(QueryToken::expression(operator.keywords()));
                }
            }
            // Sorting applies to the combined result: only the final member's
            // trailing order position is eligible for injection.
            let stream = self.select_core(member, outermost && index == 0, outermost && index == last);
            builder.append_expression(stream);
        }

        builder.build()
    }

    pub fn with_clause(&mut self, with: &WithClause) -> QueryTokenStream {
        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("WITH"));
        if with.recursive {
            builder.append(QueryToken::expression("RECURSIVE"));
        }

        for (index, table) in with.tables.iter().enumerate() {
            if index > 0 {
                builder.comma();
            }
            if table.columns.is_empty() {
                builder.append(QueryToken::expression(table.name.clone()));
            } else {
                builder.append(QueryToken::inline(table.name.clone()));
                let mut columns = TokenStreamBuilder::new();
                for (offset, column) in table.columns.iter().enumerate() {
                    if offset > 0 {
                        columns.comma();
                    }
                    columns.append(QueryToken::expression(column.clone()));
                }
                builder.group(columns.build());
            }
            builder.append(QueryToken::expression("AS"));
            let mut body = StatementRenderer::plain();
            builder.group(body.select_statement(&table.query, false));
        }

        builder.build()
    }

    fn select_core(&mut self, core: &SelectCore, primary: bool, inject: bool) -> QueryTokenStream {
        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("SELECT"));
        if core.distinct {
            builder.append(QueryToken::expression("DISTINCT"));
        }

        for (index, item) in core.projection.iter().enumerate() {
            if index > 0 {
                builder.comma();
            }
            if let Some(alias) = &item.alias {
                self.aliases.register(alias);
            }
            builder.append_expression(select_item_stream(item));
        }

        builder.append_expression(self.core_body(core, primary, inject));

        let inject_sort = inject && self.sort.map(Sort::is_sorted).unwrap_or(false);
        if !core.order_by.is_empty() || inject_sort {
            builder.append(QueryToken::expression("ORDER"));
            builder.append(QueryToken::expression("BY"));
            let mut first = true;
            for item in &core.order_by {
                if !first {
                    builder.comma();
                }
                first = false;
                builder.append_expression(expression_stream(&item.expression));
                if let Some(ascending) = item.ascending {
                    builder.append(QueryToken::expression(if ascending { "ASC" } else { "DESC" }));
                }
            }
            if inject_sort {
                if let Some(sort) = self.sort {
                    for key in &sort.keys {
                        if !first {
                            builder.comma();
                        }
                        first = false;
                        let path = self.order_path(key);
                        builder.append(QueryToken::expression(path));
                        builder.append(QueryToken::expression(if key.ascending { "ASC" } else { "DESC" }));
                    }
                }
            }
        }

        if let Some(limit) = core.limit {
            builder.append(QueryToken::expression("LIMIT"));
            builder.append(QueryToken::expression(limit.to_string()));
        }
        if let Some(offset) = core.offset {
            builder.append(QueryToken::expression("OFFSET"));
            builder.append(QueryToken::expression(offset.to_string()));
        }

        builder.build()
    }

    /// FROM through HAVING: the clauses that determine the row set. The
    /// count transformer reuses exactly this body under its own projection.
    pub(crate) fn core_body(&mut self, core: &SelectCore, primary: bool, inject: bool) -> QueryTokenStream {
        let mut builder = TokenStreamBuilder::new();

        if !core.collections.is_empty() {
            builder.append(QueryToken::expression("FROM"));
            for (index, root) in core.collections.iter().enumerate() {
                if index > 0 {
                    builder.comma();
                }
                if primary && index == 0 && self.primary_alias.is_none() {
                    if let Some(alias) = root.alias() {
                        self.primary_alias = Some(alias.to_string());
                    }
                }
                if let Some(visible) = root.visible_name() {
                    self.aliases.register(visible);
                }
                builder.append_expression(from_item_stream(root));
            }
        }

        for join in &core.joins {
            if let Some(visible) = join.item.visible_name() {
                self.aliases.register(visible);
            }
            builder.append(QueryToken::expression(join.join_type.keywords()));
            builder.append_expression(from_item_stream(&join.item));
            if let Some(constraint) = &join.constraint {
                builder.append(QueryToken::expression("ON"));
                builder.append_expression(expression_stream(constraint));
            }
        }

        let splice = if inject { self.keyset_predicate() } else { QueryTokenStream::empty() };
        if core.criteria.is_some() || !splice.is_empty() {
            builder.append(QueryToken::expression("WHERE"));
            match &core.criteria {
                Some(criteria) if !splice.is_empty() => {
                    builder.group(expression_stream(criteria));
                    builder.append(QueryToken::expression("AND"));
                    builder.group(splice);
                }
                Some(criteria) => {
                    builder.append_expression(expression_stream(criteria));
                }
                None => {
                    builder.append_expression(splice);
                }
            }
        }

        if !core.group_by.is_empty() {
            builder.append(QueryToken::expression("GROUP"));
            builder.append(QueryToken::expression("BY"));
            for (index, expression) in core.group_by.iter().enumerate() {
                if index > 0 {
                    builder.comma();
                }
                builder.append_expression(expression_stream(expression));
            }
        }

        if let Some(having) = &core.having {
            builder.append(QueryToken::expression("HAVING"));
            builder.append_expression(expression_stream(having));
        }

        builder.build()
    }

    /// Seek predicate for the splice point. Callers validated the request
    /// up front, so a sort key without a position value is simply skipped.
    fn keyset_predicate(&mut self) -> QueryTokenStream {
        let Some(splice) = &self.keyset else {
            return QueryTokenStream::empty();
        };
        let Some(sort) = self.sort else {
            return QueryTokenStream::empty();
        };
        if splice.position.is_empty() {
            return QueryTokenStream::empty();
        }

        let mut table = BindingTable::default();
        let predicate = expand_predicate(
            splice.dialect,
            sort,
            splice.position,
            splice.direction,
            &|key| self.order_path(key),
            &mut table,
        );
        self.bindings.extend(table.into_bindings());
        predicate
    }

    /// Bare when the path (or its head segment) already resolves through a
    /// declared alias, qualified with the primary alias otherwise. Raw keys
    /// pass through untouched.
    fn order_path(&self, key: &SortKey) -> String {
        if key.raw {
            return key.property.clone();
        }
        if self.aliases.contains(&key.property) {
            return key.property.clone();
        }
        if let Some((head, _)) = key.property.split_once('.') {
            if self.aliases.contains(head) {
                return key.property.clone();
            }
        }
        match &self.primary_alias {
            Some(alias) => format!("{}.{}", alias, key.property),
            None => key.property.clone(),
        }
    }

    fn update_statement(&mut self, update: &UpdateStatement) -> QueryTokenStream {
        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("UPDATE"));
        builder.append(QueryToken::expression(update.collection.clone()));
        if let Some(alias) = &update.alias {
            self.aliases.register(alias);
            builder.append(QueryToken::expression(alias.clone()));
        }
        builder.append(QueryToken::expression("SET"));
        for (index, assignment) in update.assignments.iter().enumerate() {
            if index > 0 {
                builder.comma();
            }
            builder.append(QueryToken::expression(assignment.target.clone()));
            builder.append(QueryToken::expression("="));
            builder.append_expression(expression_stream(&assignment.value));
        }
        if let Some(criteria) = &update.criteria {
            builder.append(QueryToken::expression("WHERE"));
            builder.append_expression(expression_stream(criteria));
        }
        builder.build()
    }

    fn delete_statement(&mut self, delete: &DeleteStatement) -> QueryTokenStream {
        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("DELETE"));
        builder.append(QueryToken::expression("FROM"));
        builder.append(QueryToken::expression(delete.collection.clone()));
        if let Some(alias) = &delete.alias {
            self.aliases.register(alias);
            builder.append(QueryToken::expression(alias.clone()));
        }
        if let Some(criteria) = &delete.criteria {
            builder.append(QueryToken::expression("WHERE"));
            builder.append_expression(expression_stream(criteria));
        }
        builder.build()
    }

    fn insert_statement(&mut self, insert: &InsertStatement) -> QueryTokenStream {
        let mut builder = TokenStreamBuilder::new();
        builder.append(QueryToken::expression("INSERT"));
        builder.append(QueryToken::expression("INTO"));
        if insert.columns.is_empty() {
            builder.append(QueryToken::expression(insert.collection.clone()));
        } else {
            builder.append(QueryToken::inline(insert.collection.clone()));
            let mut columns = TokenStreamBuilder::new();
            for (index, column) in insert.columns.iter().enumerate() {
                if index > 0 {
                    columns.comma();
                }
                columns.append(QueryToken::expression(column.clone()));
            }
            builder.group(columns.build());
        }
        match &insert.source {
            InsertSource::Values(rows) => {
                builder.append(QueryToken::expression("VALUES"));
                for (index, row) in rows.iter().enumerate() {
                    if index > 0 {
                        builder.comma();
                    }
                    let mut values = TokenStreamBuilder::new();
                    for (offset, value) in row.iter().enumerate() {
                        if offset > 0 {
                            values.comma();
                        }
                        values.append_expression(expression_stream(value));
                    }
                    builder.group(values.build());
                }
            }
            InsertSource::Query(query) => {
                let mut sub = StatementRenderer::plain();
                builder.append_expression(sub.select_statement(query, false));
            }
        }
        builder.build()
    }
}

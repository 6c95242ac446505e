use crate::analyzer::{QueryInformation, StatementType};

/// Single-use accumulator for one introspection pass. Primary facts follow
/// first-occurrence-wins: each setter reports whether it took, so "already
/// captured" is an explicit outcome at the call site. Feature flags are
/// existential and never cleared.
#[derive(Debug, Default)]
pub struct InfoHolder {
    primary_alias: Option<String>,
    projection: Option<Vec<String>>,
    statement_type: Option<StatementType>,
    has_constructor: bool,
    has_cte: bool,
    has_from_function: bool,
}

impl InfoHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_primary_alias(&mut self, alias: impl Into<String>) -> bool {
        if self.primary_alias.is_some() {
            return false;
        }
        self.primary_alias = Some(alias.into());
        true
    }

    pub fn set_projection(&mut self, items: Vec<String>) -> bool {
        if self.projection.is_some() {
            return false;
        }
        self.projection = Some(items);
        true
    }

    pub fn set_statement_type(&mut self, statement_type: StatementType) -> bool {
        if self.statement_type.is_some() {
            return false;
        }
        self.statement_type = Some(statement_type);
        true
    }

    pub fn has_primary_alias(&self) -> bool {
        self.primary_alias.is_some()
    }

    pub fn mark_constructor(&mut self) {
        self.has_constructor = true;
    }

    pub fn mark_cte(&mut self) {
        self.has_cte = true;
    }

    pub fn mark_from_function(&mut self) {
        self.has_from_function = true;
    }

    pub fn freeze(self) -> QueryInformation {
        QueryInformation {
            primary_alias: self.primary_alias,
            projection: self.projection.unwrap_or_default(),
            has_constructor: self.has_constructor,
            statement_type: self.statement_type.unwrap_or(StatementType::Other),
            has_cte: self.has_cte,
            has_from_function: self.has_from_function,
        }
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    rewriter::{render::StatementRenderer, RewriteError},
    token::QueryTokenStream,
    tree::Statement,
};

/// Dotted property paths only. Anything else is rejected before rewriting so
/// caller-supplied sort input can never smuggle text into the query.
static SAFE_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub property: String,
    pub ascending: bool,
    /// Trusted caller text: skips the safety check and is emitted verbatim,
    /// never alias-qualified.
    pub raw: bool,
}

impl SortKey {
    pub fn asc(property: impl Into<String>) -> Self {
        Self { property: property.into(), ascending: true, raw: false }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self { property: property.into(), ascending: false, raw: false }
    }

    pub fn raw(property: impl Into<String>, ascending: bool) -> Self {
        Self { property: property.into(), ascending, raw: true }
    }

    pub fn is_safe(&self) -> bool {
        SAFE_PROPERTY.is_match(&self.property)
    }
}

/// Ordered sort specification supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Sort {
    pub keys: Vec<SortKey>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self { keys: vec![SortKey::asc(property)] }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self { keys: vec![SortKey::desc(property)] }
    }

    pub fn and(mut self, key: SortKey) -> Self {
        self.keys.push(key);
        self
    }

    pub fn is_sorted(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn validate(&self) -> Result<(), RewriteError> {
        for key in &self.keys {
            if !key.raw && !key.is_safe() {
                return RewriteError::UnsafeSortProperty(key.property.clone()).err();
            }
        }
        Ok(())
    }

    /// Stable text form of the specification, value-free. Cache keys hang off
    /// this.
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for (index, key) in self.keys.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push_str(&key.property);
            out.push(if key.ascending { '+' } else { '-' });
        }
        out
    }
}

/// Reproduces a SELECT statement while merging the sort specification into
/// its trailing ORDER BY position. Only the outermost statement is eligible;
/// for set operations only the final member receives new terms.
pub struct SortRewriter;

impl SortRewriter {
    pub fn rewrite(statement: &Statement, sort: &Sort) -> Result<QueryTokenStream, RewriteError> {
        sort.validate()?;

        let select = match statement {
            Statement::Select(select) => select,
            other => {
                return RewriteError::Unsupported {
                    operation: "sort rewriting",
                    construct: other.kind_name().to_string(),
                }
                .err()
            }
        };

        let mut renderer = StatementRenderer::with_sort(sort);
        Ok(renderer.select_statement(select, true))
    }
}

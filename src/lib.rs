pub mod tree;

pub mod token;

pub mod dialect;
pub use dialect::Dialect;

pub mod analyzer;
pub use analyzer::{QueryInformation, StatementType};

pub mod rewriter;
pub use rewriter::{
    BindingRole, KeysetPosition, KeysetPredicate, ParamValue, ParameterBinding, QueryRewriter,
    RewriteError, RewrittenQuery, ScrollDirection, Sort, SortKey,
};

pub mod cache;
pub use cache::{RewriteCache, RewriteCacheKey};

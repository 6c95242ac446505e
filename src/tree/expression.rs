use crate::tree::SelectStatement;

/// An expression as the external parser hands it over: an ordered run of
/// segments. Terminals stay raw lexemes; only the constructs the rewriters
/// must recognize (subqueries, constructors, calls, groups) are typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub segments: Vec<ExprSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprSegment {
    /// One raw terminal lexeme: an identifier path, operator, literal or
    /// keyword, exactly as the parser produced it.
    Lexeme(String),
    /// Parenthesized sub-expression.
    Nested(Expression),
    /// Parenthesized subquery.
    Subquery(Box<SelectStatement>),
    /// Typed-projection constructor, `NEW Type(args…)`.
    Constructor(ConstructorExpr),
    /// Function call, `name(args…)`.
    Call(FunctionCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorExpr {
    pub type_name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

impl Expression {
    /// Single-lexeme expression, the common case for paths and literals.
    pub fn lexeme(value: impl Into<String>) -> Self {
        Self { segments: vec![ExprSegment::Lexeme(value.into())] }
    }

    /// Flat run of lexemes, e.g. `["e.age", ">", "16"]`.
    pub fn lexemes<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: values.into_iter().map(|v| ExprSegment::Lexeme(v.into())).collect(),
        }
    }

    pub fn subquery(query: SelectStatement) -> Self {
        Self { segments: vec![ExprSegment::Subquery(Box::new(query))] }
    }

    pub fn constructor(type_name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            segments: vec![ExprSegment::Constructor(ConstructorExpr {
                type_name: type_name.into(),
                args,
            })],
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self { segments: vec![ExprSegment::Call(FunctionCall { name: name.into(), args })] }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether this expression is a constructor at its top level. Nested
    /// constructors (inside calls or groups) do not count here; those only
    /// matter for the existential introspection flag.
    pub fn is_constructor(&self) -> bool {
        self.segments.iter().any(|segment| matches!(segment, ExprSegment::Constructor(_)))
    }
}

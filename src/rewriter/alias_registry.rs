use indexmap::IndexSet;

/// Aliases declared so far in the current statement scope: FROM roots,
/// joins, and `AS` select items, in insertion order. Lookup is
/// case-insensitive, matching how the query language resolves identifiers.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    names: IndexSet<String>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl AsRef<str>) {
        self.names.insert(name.as_ref().to_ascii_lowercase());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

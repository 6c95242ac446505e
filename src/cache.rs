use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;

use crate::rewriter::{ParamValue, RewrittenQuery, Sort};

/// Cache key for a compiled rewrite. Rewrite output depends only on the sort
/// specification and on which bound arguments are null, never on concrete
/// values, so two calls agreeing on those two facts are cache-equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RewriteCacheKey {
    sort: String,
    null_pattern: u64,
}

impl RewriteCacheKey {
    pub fn new(sort: &Sort, null_flags: impl IntoIterator<Item = bool>) -> Self {
        let mut pattern = 0u64;
        for (index, is_null) in null_flags.into_iter().take(64).enumerate() {
            if is_null {
                pattern |= 1 << index;
            }
        }
        Self { sort: sort.fingerprint(), null_pattern: pattern }
    }

    pub fn from_values(sort: &Sort, values: &[ParamValue]) -> Self {
        Self::new(sort, values.iter().map(ParamValue::is_null))
    }
}

/// Bounded cache of compiled rewrites for the calling repository layer.
/// Insertion-ordered so reaching capacity evicts the oldest entry; the
/// interior lock makes it shareable across calling threads.
pub struct RewriteCache {
    entries: Mutex<IndexMap<RewriteCacheKey, Arc<RewrittenQuery>>>,
    max_entries: usize,
}

impl RewriteCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<RewriteCacheKey, Arc<RewrittenQuery>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, key: &RewriteCacheKey) -> Option<Arc<RewrittenQuery>> {
        self.lock().get(key).map(Arc::clone)
    }

    /// Returns the cached rewrite for `key`, building and storing it on a
    /// miss. The oldest entry is evicted once the cache is full.
    pub fn get_or_insert_with(
        &self,
        key: RewriteCacheKey,
        build: impl FnOnce() -> RewrittenQuery,
    ) -> Arc<RewrittenQuery> {
        let mut entries = self.lock();
        if let Some(hit) = entries.get(&key) {
            return Arc::clone(hit);
        }

        let value = Arc::new(build());
        if entries.len() >= self.max_entries {
            entries.shift_remove_index(0);
        }
        entries.insert(key, Arc::clone(&value));
        value
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        cache::{RewriteCache, RewriteCacheKey},
        rewriter::{ParamValue, RewrittenQuery, Sort},
    };

    fn rewrite(text: &str) -> RewrittenQuery {
        RewrittenQuery { text: text.to_string(), bindings: vec![] }
    }

    #[test]
    pub fn test_same_null_pattern_is_cache_equivalent() {
        let sort = Sort::asc("name");
        let first_call = [ParamValue::Int(1), ParamValue::Text("a".into())];
        let second_call = [ParamValue::Int(99), ParamValue::Text("z".into())];

        assert_eq!(
            RewriteCacheKey::from_values(&sort, &first_call),
            RewriteCacheKey::from_values(&sort, &second_call)
        );
    }

    #[test]
    pub fn test_null_pattern_differentiates() {
        let sort = Sort::asc("name");
        let with_value = [ParamValue::Int(1)];
        let with_null = [ParamValue::Null];

        assert_ne!(
            RewriteCacheKey::from_values(&sort, &with_value),
            RewriteCacheKey::from_values(&sort, &with_null)
        );
    }

    #[test]
    pub fn test_hit_reuses_compiled_rewrite() {
        let cache = RewriteCache::new(8);
        let sort = Sort::asc("name");
        let key = RewriteCacheKey::new(&sort, [false]);

        let first = cache.get_or_insert_with(key.clone(), || rewrite("SELECT e FROM Entity e"));
        let second = cache.get_or_insert_with(key, || rewrite("should not be built"));

        assert_eq!(first.text, second.text);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    pub fn test_capacity_evicts_oldest() {
        let cache = RewriteCache::new(2);
        let oldest = RewriteCacheKey::new(&Sort::asc("a"), [false]);
        let middle = RewriteCacheKey::new(&Sort::asc("b"), [false]);
        let newest = RewriteCacheKey::new(&Sort::asc("c"), [false]);

        cache.get_or_insert_with(oldest.clone(), || rewrite("a"));
        cache.get_or_insert_with(middle, || rewrite("b"));
        cache.get_or_insert_with(newest, || rewrite("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&oldest).is_none());
    }
}

//! Compiled module cache.
//!
//! The only state shared between estimations. Entries are immutable
//! compiled modules keyed by the blake3 digest of their bytecode.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use wasmtime::Module;
use wavelet_types::Hash;

/// LRU cache of compiled modules.
pub struct ModuleCache {
    modules: Mutex<LruCache<Hash, Module>>,
}

impl ModuleCache {
    /// Create cache holding at most `capacity` modules (minimum one).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            modules: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Get a compiled module.
    pub fn get(&self, key: &Hash) -> Option<Module> {
        self.modules.lock().get(key).cloned()
    }

    /// Insert a compiled module.
    pub fn insert(&self, key: Hash, module: Module) {
        self.modules.lock().put(key, module);
    }

    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.modules.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::Engine;

    fn module(engine: &Engine, name: &str) -> Module {
        let wat = format!(r#"(module (func (export "{}")))"#, name);
        Module::new(engine, wat::parse_str(wat).unwrap()).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let engine = Engine::default();
        let cache = ModuleCache::new(4);
        let key = Hash::compute(b"a");

        assert!(cache.get(&key).is_none());
        cache.insert(key, module(&engine, "a"));
        assert!(cache.get(&key).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let engine = Engine::default();
        let cache = ModuleCache::new(2);
        let (a, b, c) = (Hash::compute(b"a"), Hash::compute(b"b"), Hash::compute(b"c"));

        cache.insert(a, module(&engine, "a"));
        cache.insert(b, module(&engine, "b"));
        let _ = cache.get(&a);
        cache.insert(c, module(&engine, "c"));

        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let engine = Engine::default();
        let cache = ModuleCache::new(0);
        cache.insert(Hash::compute(b"a"), module(&engine, "a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}

//! Per-leaf-path cache entries.
//!
//! Every path that has been `set<T>` or read through `get<T>` gets a
//! [`PathCache`] slot: the last value in its native shape, lazily
//! materialized conversions to the other scalar types, and a pointer-stable
//! double view that downstream expression slots can hold onto indefinitely.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::value::Scalar;

/// A cloneable handle to a single `f64` slot, safe to share across the
/// rayon pair-evaluation threads. Cloning shares the underlying atomic, so
/// all clones observe writes made through any of them - this is the
/// document's answer to "a stable pointer to a double" without a lock.
#[derive(Debug, Clone)]
pub struct StableDouble(Arc<AtomicU64>);

impl StableDouble {
    fn new(initial: f64) -> Self {
        StableDouble(Arc::new(AtomicU64::new(initial.to_bits())))
    }

    /// Reads the current value.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::SeqCst);
    }
}

pub fn new_stable_double(initial: f64) -> StableDouble {
    StableDouble::new(initial)
}

#[derive(Debug, Clone, Default)]
struct Derived {
    bool_v: Option<bool>,
    i64_v: Option<i64>,
    u64_v: Option<u64>,
    f64_v: Option<f64>,
    string_v: Option<String>,
}

/// Cached state for one document path.
#[derive(Debug, Clone)]
pub struct PathCache {
    pub last: Scalar,
    derived: Derived,
    pub stable: StableDouble,
    /// `true` once `last` has been written to the tree. `flush` clears it.
    pub dirty: bool,
}

impl PathCache {
    pub fn new(last: Scalar) -> Self {
        let initial = last.as_f64().unwrap_or(0.0);
        PathCache {
            last,
            derived: Derived::default(),
            stable: new_stable_double(initial),
            dirty: true,
        }
    }

    /// Overwrite the cached value (a fresh `set<T>`), clearing every
    /// derived conversion and refreshing the stable double if the new
    /// value can be represented as one.
    pub fn overwrite(&mut self, last: Scalar) {
        self.derived = Derived::default();
        if let Some(f) = last.as_f64() {
            self.stable.set(f);
        }
        self.last = last;
        self.dirty = true;
    }

    pub fn cached_bool(&self) -> Option<bool> {
        self.derived.bool_v
    }
    pub fn cache_bool(&mut self, v: bool) {
        self.derived.bool_v = Some(v);
    }
    pub fn cached_i64(&self) -> Option<i64> {
        self.derived.i64_v
    }
    pub fn cache_i64(&mut self, v: i64) {
        self.derived.i64_v = Some(v);
    }
    pub fn cached_u64(&self) -> Option<u64> {
        self.derived.u64_v
    }
    pub fn cache_u64(&mut self, v: u64) {
        self.derived.u64_v = Some(v);
    }
    pub fn cached_f64(&self) -> Option<f64> {
        self.derived.f64_v
    }
    pub fn cache_f64(&mut self, v: f64) {
        self.derived.f64_v = Some(v);
    }
    pub fn cached_string(&self) -> Option<&str> {
        self.derived.string_v.as_deref()
    }
    pub fn cache_string(&mut self, v: String) {
        self.derived.string_v = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_double_survives_overwrite() {
        let mut cache = PathCache::new(Scalar::F64(1.0));
        let handle = cache.stable.clone();
        assert_eq!(handle.get(), 1.0);
        cache.overwrite(Scalar::F64(2.0));
        assert_eq!(handle.get(), 2.0);
    }

    #[test]
    fn overwrite_clears_derived_cache() {
        let mut cache = PathCache::new(Scalar::I64(1));
        cache.cache_string("one".into());
        assert_eq!(cache.cached_string(), Some("one"));
        cache.overwrite(Scalar::I64(2));
        assert_eq!(cache.cached_string(), None);
    }

    #[test]
    fn non_numeric_overwrite_keeps_prior_stable_value() {
        let mut cache = PathCache::new(Scalar::F64(5.0));
        let handle = cache.stable.clone();
        cache.overwrite(Scalar::Str("not a number".into()));
        assert_eq!(handle.get(), 5.0);
    }
}

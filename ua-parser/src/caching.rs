//! The caching resolver decorator, plus two cache decorators: a
//! per-thread cache factory and an additional-mutex wrapper for
//! composing with it.

use std::cell::RefCell;
use std::sync::Mutex;
use std::thread::LocalKey;

use crate::cache::Cache;
use crate::resolver::Resolver;
use crate::{Domain, Error, PartialResult};

/// Decorator composing a [`Cache`] with an inner [`Resolver`]: on each
/// call, looks up the cached entry for `ua`, asks the inner resolver only
/// for the domains not already resolved, merges the two, and writes the
/// merged result back.
///
/// The cached entry for a given `ua` is monotone — its `domains` bitset
/// only grows over its lifetime — so two concurrent requests racing on
/// the same key may both compute and write, but the last writer's value
/// is always at least as complete as what it overwrote.
pub struct CachingResolver<R, C> {
    resolver: R,
    cache: C,
}

impl<R: Resolver, C: Cache> CachingResolver<R, C> {
    /// Wraps `resolver` with `cache`.
    pub fn new(resolver: R, cache: C) -> Self {
        Self { resolver, cache }
    }

    /// Exposes the underlying cache, e.g. so a caller can inspect its
    /// hit/miss bookkeeping (as `examples/bench.rs` does) without the
    /// `Cache` trait itself needing to expose a hit rate.
    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<R: Resolver, C: Cache> Resolver for CachingResolver<R, C> {
    fn resolve(&self, ua: &str, domains: Domain) -> Result<PartialResult, Error> {
        let entry = self.cache.get(ua);

        if let Some(entry) = &entry {
            if domains.difference(entry.domains).is_empty() {
                return Ok(entry.clone());
            }
        }

        let needed = match &entry {
            Some(e) => domains.difference(e.domains),
            None => domains,
        };
        let fresh = self.resolver.resolve(ua, needed)?;

        let merged = match entry {
            Some(entry) => PartialResult {
                domains: entry.domains.union(fresh.domains),
                user_agent: entry.user_agent.or(fresh.user_agent),
                os: entry.os.or(fresh.os),
                device: entry.device.or(fresh.device),
                string: ua.to_string(),
            },
            None => fresh,
        };

        self.cache.put(ua, merged.clone());
        Ok(merged)
    }
}

/// Wraps a cache that already does its own internal locking (every cache
/// in [`crate::cache`] does) with an *additional* outer mutex. Mostly
/// useful when composing with [`ThreadLocal`], whose factory closure
/// returns a cache that must itself be `Send` but need not be `Sync`.
pub struct Locking<C> {
    inner: Mutex<C>,
}

impl<C> Locking<C> {
    /// Wraps `cache` with an additional mutex.
    pub fn new(cache: C) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }
}

impl<C: Cache> Cache for Locking<C> {
    fn get(&self, key: &str) -> Option<PartialResult> {
        self.inner.lock().unwrap().get(key)
    }

    fn put(&self, key: &str, value: PartialResult) {
        self.inner.lock().unwrap().put(key, value)
    }
}

/// Thread-local cache decorator: wraps a zero-argument factory producing
/// an inner cache, and gives each OS thread that calls [`Cache::get`] or
/// [`Cache::put`] its own lazily-created instance. No cross-thread
/// sharing, no contention, at the cost of `thread_count × maxsize` memory.
pub struct ThreadLocal<C: 'static> {
    local: &'static LocalKey<RefCell<Option<C>>>,
    factory: fn() -> C,
}

impl<C: 'static> ThreadLocal<C> {
    /// Wraps `factory`, used to lazily build each thread's own cache
    /// instance on first access. `local` must be a `thread_local!` cell
    /// declared alongside the call site (see the macro-generated pattern
    /// in [`crate::caching::thread_local_cache`]).
    pub fn new(local: &'static LocalKey<RefCell<Option<C>>>, factory: fn() -> C) -> Self {
        Self { local, factory }
    }
}

impl<C: Cache + 'static> Cache for ThreadLocal<C> {
    fn get(&self, key: &str) -> Option<PartialResult> {
        self.local.with(|cell| {
            let mut slot = cell.borrow_mut();
            slot.get_or_insert_with(self.factory).get(key)
        })
    }

    fn put(&self, key: &str, value: PartialResult) {
        self.local.with(|cell| {
            let mut slot = cell.borrow_mut();
            slot.get_or_insert_with(self.factory).put(key, value)
        })
    }
}

/// Declares a `thread_local!` cell suitable for use with [`ThreadLocal`],
/// and a constructor function returning a `ThreadLocal` bound to it.
///
/// ```ignore
/// thread_local_cache!(my_lru_cache, LruCache, || LruCache::new(1024));
/// let cache = my_lru_cache();
/// ```
#[macro_export]
macro_rules! thread_local_cache {
    ($name:ident, $ty:ty, $factory:expr) => {
        mod $name {
            ::std::thread_local! {
                static CELL: ::std::cell::RefCell<Option<$ty>> = ::std::cell::RefCell::new(None);
            }
            pub(crate) fn make() -> $crate::ThreadLocal<$ty> {
                $crate::ThreadLocal::new(&CELL, $factory)
            }
        }
        use $name::make as $name;
    };
}

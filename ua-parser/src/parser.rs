//! The convenience wrapper tying a [`Resolver`] to a fixed-domain call
//! surface, plus a lazily initialised, replaceable process-wide default.
//!
//! [`Parser`] is a thin façade over a [`Resolver`]: [`Parser::call`] is the
//! raw contract, [`Parser::parse`]/[`Parser::parse_user_agent`]/
//! [`Parser::parse_os`]/[`Parser::parse_device`] are convenience methods
//! requesting exactly the domain(s) they name. The free functions at the
//! bottom of this module (`parse`, `parse_user_agent`, `parse_os`,
//! `parse_device`) delegate to a process-wide default instance.

use std::sync::{OnceLock, RwLock};

use crate::cache::LruCache;
use crate::caching::{CachingResolver, Locking};
use crate::resolver::{PrefilteredResolver, Resolver};
use crate::{Device, Domain, Error, ParseResult, PartialResult, Regexes, UserAgent, OS};

/// Size of the `LRU` cache backing [`Parser::from_matchers`] and the
/// process-wide default.
const DEFAULT_CACHE_SIZE: usize = 200;

/// Resolver stack built by [`Parser::from_matchers`]: a prefiltered
/// (regex-set) resolver behind an `LRU(200)` cache guarded by an
/// additional mutex, so it can be shared across threads without requiring
/// its own internal locking beyond what [`crate::cache::LruCache`] already
/// provides.
type DefaultStack<'a> = CachingResolver<PrefilteredResolver<'a>, Locking<LruCache>>;

/// Exposes `parse`, `parse_user_agent`, `parse_os`, `parse_device` on top
/// of any [`Resolver`]. Holds no state beyond the resolver itself — all of
/// `Parser`'s behavior is a thin restriction of [`Resolver::resolve`] to a
/// fixed [`Domain`].
pub struct Parser<R> {
    resolver: R,
}

impl<R> Parser<R> {
    /// Wraps an arbitrary resolver, giving it the convenience surface.
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }
}

impl<'a> Parser<DefaultStack<'a>> {
    /// Builds the default resolver stack for a rule set: a
    /// [`PrefilteredResolver`] (the fast path) behind a 200-entry LRU
    /// cache.
    ///
    /// Prefer [`Parser::new`] directly when a different resolver stack
    /// (e.g. a [`crate::LinearResolver`], a different cache policy, or no
    /// cache at all) is wanted instead.
    pub fn from_matchers(r: Regexes<'a>) -> Result<Self, Error> {
        let resolver = PrefilteredResolver::try_from(r)?;
        let cache = Locking::new(LruCache::new(DEFAULT_CACHE_SIZE));
        Ok(Self::new(CachingResolver::new(resolver, cache)))
    }
}

impl<R: Resolver> Parser<R> {
    /// Classifies `ua`, resolving at least `domains`. The raw contract
    /// underlying every other method on this type.
    pub fn call(&self, ua: &str, domains: Domain) -> Result<PartialResult, Error> {
        self.resolver.resolve(ua, domains)
    }

    /// Resolves every domain and requires completion.
    pub fn parse(&self, ua: &str) -> Result<ParseResult, Error> {
        self.call(ua, Domain::ALL)?.complete()
    }

    /// Resolves only [`Domain::USER_AGENT`].
    pub fn parse_user_agent(&self, ua: &str) -> Result<Option<UserAgent>, Error> {
        Ok(self.call(ua, Domain::USER_AGENT)?.user_agent)
    }

    /// Resolves only [`Domain::OS`].
    pub fn parse_os(&self, ua: &str) -> Result<Option<OS>, Error> {
        Ok(self.call(ua, Domain::OS)?.os)
    }

    /// Resolves only [`Domain::DEVICE`].
    pub fn parse_device(&self, ua: &str) -> Result<Option<Device>, Error> {
        Ok(self.call(ua, Domain::DEVICE)?.device)
    }
}

/// Type-erased resolver backing the process-wide default [`Parser`], so
/// [`set_default`] can install any resolver stack, not just
/// [`DefaultStack`].
type BoxedResolver = Box<dyn Resolver + Send + Sync>;

fn empty_stack() -> DefaultStack<'static> {
    let empty = Regexes {
        user_agent_parsers: Vec::new(),
        os_parsers: Vec::new(),
        device_parsers: Vec::new(),
    };
    // An empty rule set has no regex to fail compiling, so this cannot
    // actually fail; it exists purely so the process-wide default always
    // has *something* to resolve against before a caller supplies real
    // rule data via `set_default`.
    Parser::from_matchers(empty)
        .expect("empty rule set always builds")
        .resolver
}

static DEFAULT: OnceLock<RwLock<Parser<BoxedResolver>>> = OnceLock::new();

/// Returns the process-wide default [`Parser`], lazily building it (with
/// no rules loaded, see [`empty_stack`]) on first access. Guarded by a
/// [`RwLock`] around an [`OnceLock`]-initialised cell, giving
/// mutex-guarded double-checked initialization while still allowing
/// [`set_default`] to swap the instance afterwards.
fn default_parser() -> &'static RwLock<Parser<BoxedResolver>> {
    DEFAULT.get_or_init(|| RwLock::new(Parser::new(Box::new(empty_stack()))))
}

/// Replaces the process-wide default parser used by [`parse`],
/// [`parse_user_agent`], [`parse_os`], and [`parse_device`]. Rule loading
/// is out of this crate's scope, so callers who want the default to
/// resolve anything beyond "no match" must call this once at startup
/// with a resolver built from their own loaded rule set, e.g.
/// `Parser::from_matchers(regexes)?.resolver` wrapped here, or any other
/// [`Resolver`] implementation.
pub fn set_default(resolver: impl Resolver + Send + Sync + 'static) {
    *default_parser().write().unwrap() = Parser::new(Box::new(resolver));
}

/// Parses every domain using the process-wide default parser. See
/// [`set_default`] to install real rule data before relying on this.
pub fn parse(ua: &str) -> Result<ParseResult, Error> {
    default_parser().read().unwrap().parse(ua)
}

/// Parses [`Domain::USER_AGENT`] using the process-wide default parser.
pub fn parse_user_agent(ua: &str) -> Result<Option<UserAgent>, Error> {
    default_parser().read().unwrap().parse_user_agent(ua)
}

/// Parses [`Domain::OS`] using the process-wide default parser.
pub fn parse_os(ua: &str) -> Result<Option<OS>, Error> {
    default_parser().read().unwrap().parse_os(ua)
}

/// Parses [`Domain::DEVICE`] using the process-wide default parser.
pub fn parse_device(ua: &str) -> Result<Option<Device>, Error> {
    default_parser().read().unwrap().parse_device(ua)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::LinearResolver;
    use crate::{device, os, user_agent};

    fn sample() -> Regexes<'static> {
        Regexes {
            user_agent_parsers: vec![user_agent::Parser {
                regex: "Firefox/(\\d+)".into(),
                ..Default::default()
            }],
            os_parsers: vec![os::Parser {
                regex: "Windows".into(),
                os_replacement: Some("Windows".into()),
                ..Default::default()
            }],
            device_parsers: vec![device::Parser {
                regex: "Mobile".into(),
                device_replacement: Some("Phone".into()),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn trivial_match() {
        // A UA-only match leaves OS/device at their "no match" defaults
        // once completed.
        let resolver = LinearResolver::eager(sample()).unwrap();
        let parser = Parser::new(resolver);

        let r = parser.parse("Firefox/99").unwrap();
        assert_eq!(r.user_agent.unwrap().major.as_deref(), Some("99"));
        assert!(r.os.is_none());
        assert!(r.device.is_none());

        let r = parser.parse("nothing here").unwrap();
        assert!(r.user_agent.is_none());
        assert!(r.os.is_none());
        assert!(r.device.is_none());
    }

    #[test]
    fn domain_specific_helpers_request_exactly_one_domain() {
        let resolver = LinearResolver::eager(sample()).unwrap();
        let parser = Parser::new(resolver);

        assert!(parser.parse_user_agent("Firefox/12").unwrap().is_some());
        assert_eq!(
            parser.parse_os("Windows").unwrap().unwrap().family,
            "Windows"
        );
        assert_eq!(
            parser.parse_device("Mobile").unwrap().unwrap().family,
            "Phone"
        );
    }

    #[test]
    fn from_matchers_builds_caching_prefiltered_stack() {
        let parser = Parser::from_matchers(sample()).unwrap();
        let r = parser.parse("Firefox/7 Windows Mobile").unwrap();
        assert_eq!(r.user_agent.unwrap().major.as_deref(), Some("7"));
        assert_eq!(r.os.unwrap().family, "Windows");
        assert_eq!(r.device.unwrap().family, "Phone");
    }

    #[test]
    fn global_default_starts_empty_and_is_replaceable() {
        // The process-wide default has no rules until `set_default` is
        // called, so every input resolves to "no match" across all three
        // domains (not an error).
        let r = parse("anything at all").unwrap();
        assert!(r.user_agent.is_none());

        set_default(LinearResolver::eager(sample()).unwrap());
        let r = parse_user_agent("Firefox/3").unwrap();
        assert!(r.is_some());

        // restore so other tests in this process observe a clean default
        set_default(LinearResolver::eager(Regexes {
            user_agent_parsers: Vec::new(),
            os_parsers: Vec::new(),
            device_parsers: Vec::new(),
        })
        .unwrap());
    }
}

//! End-to-end tests exercising the public resolver/cache/`Parser` surface
//! together, rather than any one module in isolation.
//!
//! These tests build small representative rule sets inline rather than
//! reading fixture YAML from an external `uap-core` checkout: rule
//! loading is out of this crate's scope, so a self-contained test suite
//! should not depend on fixture data that lives in another repository.

use ua_parser::{
    device, os, user_agent, CachingResolver, Domain, Error, LinearResolver, LruCache, Parser,
    PrefilteredResolver, Regexes, Resolver, S3FifoCache, SieveCache,
};

fn sample_rules() -> Regexes<'static> {
    Regexes {
        user_agent_parsers: vec![
            user_agent::Parser {
                regex: "Firefox/(\\d+)\\.(\\d+)".into(),
                ..Default::default()
            },
            user_agent::Parser {
                regex: "Chrome/(\\d+)".into(),
                family_replacement: Some("Chrome".into()),
                ..Default::default()
            },
        ],
        os_parsers: vec![
            os::Parser {
                regex: "Windows NT (\\d+)\\.(\\d+)".into(),
                os_replacement: Some("Windows".into()),
                ..Default::default()
            },
            os::Parser {
                regex: "Mac OS X (\\d+)[._](\\d+)".into(),
                ..Default::default()
            },
        ],
        device_parsers: vec![
            device::Parser {
                regex: "iPhone".into(),
                device_replacement: Some("iPhone".into()),
                brand_replacement: Some("Apple".into()),
                model_replacement: Some("iPhone".into()),
                ..Default::default()
            },
            device::Parser {
                regex: "(?i)mobile".into(),
                regex_flag: Some(device::Flag::IgnoreCase),
                device_replacement: Some("Generic Phone".into()),
                ..Default::default()
            },
        ],
    }
}

const SAMPLE_UAS: &[&str] = &[
    "Mozilla/5.0 Firefox/117.0 Windows NT 10.0",
    "Mozilla/5.0 Chrome/119 Mac OS X 14.2",
    "Mozilla/5.0 (iPhone) Mobile Safari",
    "Something with MOBILE but no browser or os match",
    "Completely unrecognizable string",
];

/// A matching input resolves the domain it matches and leaves the
/// others at "no match"; a non-matching input resolves to "no match"
/// everywhere.
#[test]
fn trivial_match_and_no_match() {
    let resolver = LinearResolver::eager(sample_rules()).unwrap();

    let r = resolver
        .resolve("Mozilla/5.0 Firefox/117.0 Windows NT 10.0", Domain::ALL)
        .unwrap();
    let ua = r.user_agent.unwrap();
    assert_eq!(ua.major.as_deref(), Some("117"));
    assert_eq!(ua.minor.as_deref(), Some("0"));
    assert_eq!(r.os.unwrap().family, "Windows");
    assert!(r.device.is_none());

    let r = resolver
        .resolve("Completely unrecognizable string", Domain::ALL)
        .unwrap();
    assert!(r.user_agent.is_none());
    assert!(r.os.is_none());
    assert!(r.device.is_none());
}

/// Partial resolution then backfill through an LRU-backed
/// `CachingResolver` must never change already-resolved fields, and the
/// cached entry's `domains` only grows.
#[test]
fn partial_then_backfill() {
    let inner = LinearResolver::eager(sample_rules()).unwrap();
    let cache = LruCache::new(2);
    let resolver = CachingResolver::new(inner, cache);
    let ua = "Mozilla/5.0 (iPhone) Mobile Safari";

    let r1 = resolver.resolve(ua, Domain::USER_AGENT).unwrap();
    assert_eq!(r1.domains, Domain::USER_AGENT);

    let r2 = resolver.resolve(ua, Domain::DEVICE).unwrap();
    assert_eq!(r2.domains, Domain::USER_AGENT | Domain::DEVICE);
    assert_eq!(r2.user_agent, r1.user_agent);
    assert_eq!(r2.device.as_ref().unwrap().family, "iPhone");

    let r3 = resolver.resolve(ua, Domain::ALL).unwrap();
    assert_eq!(r3.domains, Domain::ALL);
    assert_eq!(r3.user_agent, r1.user_agent);
    assert_eq!(r3.device, r2.device);
    assert!(r3.os.is_none());
}

/// The returned domains always cover at least what was requested.
#[test]
fn resolved_domains_superset_of_requested() {
    let resolver = LinearResolver::eager(sample_rules()).unwrap();
    for &ua in SAMPLE_UAS {
        for domains in [
            Domain::USER_AGENT,
            Domain::OS,
            Domain::DEVICE,
            Domain::USER_AGENT | Domain::OS,
            Domain::ALL,
        ] {
            let r = resolver.resolve(ua, domains).unwrap();
            assert!(r.domains.contains(domains), "{ua} / {domains:?}");
        }
    }
}

/// Splitting a request across two calls must agree field-by-field with
/// a single combined call, exercised through the caching resolver
/// (where this is the interesting case — a bare
/// `LinearResolver`/`PrefilteredResolver` call is stateless and trivially
/// satisfies this).
#[test]
fn split_calls_agree_with_combined_call() {
    let cached = CachingResolver::new(LinearResolver::eager(sample_rules()).unwrap(), LruCache::new(8));
    let combined = LinearResolver::eager(sample_rules()).unwrap();

    for &ua in SAMPLE_UAS {
        cached.resolve(ua, Domain::USER_AGENT).unwrap();
        cached.resolve(ua, Domain::OS).unwrap();
        let split = cached.resolve(ua, Domain::DEVICE).unwrap();
        let direct = combined.resolve(ua, Domain::ALL).unwrap();

        assert_eq!(split.user_agent, direct.user_agent, "{ua}");
        assert_eq!(split.os, direct.os, "{ua}");
        assert_eq!(split.device, direct.device, "{ua}");
    }
}

/// The linear and prefiltered resolvers must agree on every field for
/// every input.
#[test]
fn resolver_equivalence_linear_vs_prefiltered() {
    let linear = LinearResolver::eager(sample_rules()).unwrap();
    let prefiltered = PrefilteredResolver::try_from(sample_rules()).unwrap();

    for &ua in SAMPLE_UAS {
        let a = linear.resolve(ua, Domain::ALL).unwrap();
        let b = prefiltered.resolve(ua, Domain::ALL).unwrap();
        assert_eq!(a.user_agent, b.user_agent, "{ua}");
        assert_eq!(a.os, b.os, "{ua}");
        assert_eq!(a.device, b.device, "{ua}");
    }
}

/// `complete()` both requires and enforces `domains == ALL`.
#[test]
fn complete_requires_all_domains() {
    let resolver = LinearResolver::eager(sample_rules()).unwrap();
    let partial = resolver.resolve("Firefox/1.0", Domain::USER_AGENT).unwrap();
    assert!(matches!(
        partial.complete(),
        Err(Error::CompletionRequiredAll)
    ));

    let full = resolver.resolve("Firefox/1.0", Domain::ALL).unwrap();
    assert!(full.complete().is_ok());
}

/// Device template substitution, both the `$1 $2` and
/// bare-`$1`-with-empty-model forms.
#[test]
fn device_template_substitution() {
    let rules = Regexes {
        user_agent_parsers: vec![],
        os_parsers: vec![],
        device_parsers: vec![device::Parser {
            regex: "(Foo) (\\d+)".into(),
            device_replacement: Some("$1 $2".into()),
            ..Default::default()
        }],
    };
    let resolver = LinearResolver::eager(rules).unwrap();
    let r = resolver.resolve("Foo 42", Domain::DEVICE).unwrap();
    assert_eq!(r.device.unwrap().family, "Foo 42");

    let rules = Regexes {
        user_agent_parsers: vec![],
        os_parsers: vec![],
        device_parsers: vec![device::Parser {
            regex: "(Foo) (\\d+)".into(),
            device_replacement: Some("$1".into()),
            model_replacement: Some("".into()),
            ..Default::default()
        }],
    };
    let resolver = LinearResolver::eager(rules).unwrap();
    let r = resolver.resolve("Foo 42", Domain::DEVICE).unwrap();
    let device = r.device.unwrap();
    assert_eq!(device.family, "Foo");
    assert!(device.brand.is_none());
    assert!(device.model.is_none());
}

/// Exercises the full `Parser` convenience surface, including the default
/// `from_matchers` stack (prefiltered resolver behind a locking LRU
/// cache), end to end.
#[test]
fn parser_convenience_surface() {
    let parser = Parser::from_matchers(sample_rules()).unwrap();

    let result = parser
        .parse("Mozilla/5.0 Chrome/119 Mac OS X 14.2")
        .unwrap();
    assert_eq!(result.user_agent.unwrap().family, "Chrome");
    assert_eq!(result.os.unwrap().family, "Mac OS X");
    assert!(result.device.is_none());

    assert_eq!(
        parser
            .parse_device("Mozilla/5.0 (iPhone) Mobile Safari")
            .unwrap()
            .unwrap()
            .family,
        "iPhone"
    );
    assert!(parser
        .parse_os("nothing recognizable")
        .unwrap()
        .is_none());
}

/// Every cache policy, composed with the same inner resolver, must agree
/// on resolved fields — only eviction behavior differs between them.
#[test]
fn all_cache_policies_agree_on_resolved_fields() {
    let ua = "Mozilla/5.0 Firefox/117.0 Windows NT 10.0";
    let direct = LinearResolver::eager(sample_rules())
        .unwrap()
        .resolve(ua, Domain::ALL)
        .unwrap();

    let lru = CachingResolver::new(LinearResolver::eager(sample_rules()).unwrap(), LruCache::new(4))
        .resolve(ua, Domain::ALL)
        .unwrap();
    let s3fifo = CachingResolver::new(
        LinearResolver::eager(sample_rules()).unwrap(),
        S3FifoCache::new(4),
    )
    .resolve(ua, Domain::ALL)
    .unwrap();
    let sieve = CachingResolver::new(
        LinearResolver::eager(sample_rules()).unwrap(),
        SieveCache::new(4),
    )
    .resolve(ua, Domain::ALL)
    .unwrap();

    for other in [lru, s3fifo, sieve] {
        assert_eq!(direct.user_agent, other.user_agent);
        assert_eq!(direct.os, other.os);
        assert_eq!(direct.device, other.device);
    }
}

/// Rule data may be loaded from either YAML or JSON, same field names
/// either way. The rest of this suite exercises the YAML shape
/// implicitly (it's what `Regexes` derives `Deserialize` for via the
/// field names themselves); this test locks in the JSON encoding.
#[test]
fn external_interface_accepts_json_wire_format() {
    let json = r#"{
        "user_agent_parsers": [
            {"regex": "Firefox/(\\d+)"}
        ],
        "os_parsers": [
            {"regex": "Windows", "os_replacement": "Windows"}
        ],
        "device_parsers": [
            {"regex": "Mobile", "regex_flag": "i", "device_replacement": "Phone"}
        ]
    }"#;
    let rules: Regexes<'_> = serde_json::from_str(json).unwrap();
    let resolver = LinearResolver::eager(rules).unwrap();

    let r = resolver
        .resolve("Firefox/42 Windows mobile", Domain::ALL)
        .unwrap();
    assert_eq!(r.user_agent.unwrap().major.as_deref(), Some("42"));
    assert_eq!(r.os.unwrap().family, "Windows");
    assert_eq!(r.device.unwrap().family, "Phone");
}

//! The linear resolver: reference semantics for matching a user agent
//! string against an ordered list of independently-compiled regexes.
//!
//! Unlike [`crate::PrefilteredResolver`], every rule is tried in turn (no
//! regex-set prefilter), so the linear resolver is the one every other
//! resolver's output is checked against — it is the simplest possible
//! reading of "try the rules in the order they were declared".

use crate::resolver::Resolver;
use crate::{device, os, user_agent, Device, Domain, Error, PartialResult, Regexes, UserAgent, OS};

/// Resolver that tries each domain's rules in declared order, returning
/// the first match. Holds one [`Vec`] of matchers per domain; construct
/// with [`Self::eager`] to compile every regex up front, or [`Self::lazy`]
/// to defer each rule's compilation to its first use.
pub struct LinearResolver<'a> {
    ua: Vec<user_agent::LinearMatcher<'a>>,
    os: Vec<os::LinearMatcher<'a>>,
    device: Vec<device::LinearMatcher<'a>>,
}

impl<'a> LinearResolver<'a> {
    /// Builds a resolver compiling every rule's regex immediately, so
    /// construction cost is paid up front and every call after that is
    /// compilation-free.
    pub fn eager(r: Regexes<'a>) -> Result<Self, Error> {
        Ok(Self {
            ua: r
                .user_agent_parsers
                .into_iter()
                .map(user_agent::LinearMatcher::eager)
                .collect::<Result<_, _>>()?,
            os: r
                .os_parsers
                .into_iter()
                .map(os::LinearMatcher::eager)
                .collect::<Result<_, _>>()?,
            device: r
                .device_parsers
                .into_iter()
                .map(device::LinearMatcher::eager)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Builds a resolver deferring each rule's compilation to its first
    /// use, trading a small synchronization cost on first access (an
    /// `OnceLock`) for faster startup when most rules are never exercised.
    pub fn lazy(r: Regexes<'a>) -> Result<Self, Error> {
        Ok(Self {
            ua: r
                .user_agent_parsers
                .into_iter()
                .map(user_agent::LinearMatcher::lazy)
                .collect::<Result<_, _>>()?,
            os: r
                .os_parsers
                .into_iter()
                .map(os::LinearMatcher::lazy)
                .collect::<Result<_, _>>()?,
            device: r
                .device_parsers
                .into_iter()
                .map(device::LinearMatcher::lazy)
                .collect::<Result<_, _>>()?,
        })
    }

    fn resolve_ua(&self, ua: &str) -> Result<Option<UserAgent>, Error> {
        for m in &self.ua {
            if let Some(v) = m.apply(ua)? {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    fn resolve_os(&self, ua: &str) -> Result<Option<OS>, Error> {
        for m in &self.os {
            if let Some(v) = m.apply(ua)? {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    fn resolve_device(&self, ua: &str) -> Result<Option<Device>, Error> {
        for m in &self.device {
            if let Some(v) = m.apply(ua)? {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }
}

impl<'a> Resolver for LinearResolver<'a> {
    fn resolve(&self, ua: &str, domains: Domain) -> Result<PartialResult, Error> {
        let user_agent = domains
            .contains(Domain::USER_AGENT)
            .then(|| self.resolve_ua(ua))
            .transpose()?
            .flatten();
        let os = domains
            .contains(Domain::OS)
            .then(|| self.resolve_os(ua))
            .transpose()?
            .flatten();
        let device = domains
            .contains(Domain::DEVICE)
            .then(|| self.resolve_device(ua))
            .transpose()?
            .flatten();

        Ok(PartialResult {
            domains,
            user_agent,
            os,
            device,
            string: ua.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn resolves_only_requested_domains() {
        let r = LinearResolver::eager(sample()).unwrap();
        let result = r
            .resolve("Mozilla Firefox/99 Windows Mobile", Domain::USER_AGENT)
            .unwrap();
        assert_eq!(result.domains, Domain::USER_AGENT);
        assert!(result.user_agent.is_some());
        assert!(result.os.is_none());
        assert!(result.device.is_none());
    }

    #[test]
    fn resolves_all_domains() {
        let r = LinearResolver::lazy(sample()).unwrap();
        let result = r
            .resolve("Mozilla Firefox/99 Windows Mobile", Domain::ALL)
            .unwrap();
        assert_eq!(result.user_agent.unwrap().major.as_deref(), Some("99"));
        assert_eq!(result.os.unwrap().family, "Windows");
        assert_eq!(result.device.unwrap().family, "Phone");
    }

    #[test]
    fn no_match_is_none_not_error() {
        let r = LinearResolver::eager(sample()).unwrap();
        let result = r.resolve("nothing matches here", Domain::ALL).unwrap();
        assert!(result.user_agent.is_none());
        assert!(result.os.is_none());
        assert!(result.device.is_none());
    }

    #[test]
    fn lazy_defers_regex_and_repl_errors_past_construction() {
        // A family template referencing `$1` with no capture group in the
        // regex is a `MissingGroup` error. `eager` must fail immediately,
        // at construction; `lazy` must defer that failure to the first
        // `apply`, since building the matcher's field resolvers is no
        // longer part of construction at all for the lazy variant.
        let bad = Regexes {
            user_agent_parsers: vec![user_agent::Parser {
                regex: "nogroups".into(),
                family_replacement: Some("$1".into()),
                ..Default::default()
            }],
            os_parsers: vec![],
            device_parsers: vec![],
        };
        assert!(LinearResolver::eager(Regexes {
            user_agent_parsers: vec![user_agent::Parser {
                regex: "nogroups".into(),
                family_replacement: Some("$1".into()),
                ..Default::default()
            }],
            os_parsers: vec![],
            device_parsers: vec![],
        })
        .is_err());

        let r = LinearResolver::lazy(bad).unwrap();
        let err = r.resolve("nogroups", Domain::USER_AGENT).unwrap_err();
        assert!(matches!(err, Error::MissingGroup(1)));
    }
}

//! The resolver contract shared by every component that turns a user agent
//! string plus a requested [`Domain`] set into a [`PartialResult`].

use crate::{device, os, user_agent, Device, Domain, Error, PartialResult, Regexes, UserAgent, OS};

/// `(string, requested domains) -> PartialResult`, the single contract
/// every resolver in this crate implements: the [`LinearResolver`]
/// (`crate::linear`), the [`PrefilteredResolver`] below, and the
/// [`CachingResolver`](crate::CachingResolver) decorator that wraps either.
///
/// Implementations must resolve *at least* every domain bit set in
/// `domains`; they may resolve more, but the caller is only guaranteed
/// those bits are present in the returned [`PartialResult::domains`].
pub trait Resolver {
    /// Classify `ua`, resolving at least the domains requested.
    fn resolve(&self, ua: &str, domains: Domain) -> Result<PartialResult, Error>;
}

impl<T: Resolver + ?Sized> Resolver for Box<T> {
    fn resolve(&self, ua: &str, domains: Domain) -> Result<PartialResult, Error> {
        (**self).resolve(ua, domains)
    }
}

/// Resolver backed by the `regex-filtered` regex-set engine: compiles every
/// rule of a domain into one prefiltered set, and on a call asks the set
/// for the lowest-index matching rule.
///
/// Only touches the domains actually requested, so that asking for
/// `Domain::USER_AGENT` alone does not pay for the OS/device prefilters.
pub struct PrefilteredResolver<'a> {
    ua: user_agent::Extractor<'a>,
    os: os::Extractor<'a>,
    device: device::Extractor<'a>,
}

impl<'a> TryFrom<Regexes<'a>> for PrefilteredResolver<'a> {
    type Error = Error;

    fn try_from(r: Regexes<'a>) -> Result<Self, Error> {
        let ua = r
            .user_agent_parsers
            .into_iter()
            .try_fold(user_agent::Builder::new(), |b, p| b.push(p))?
            .build()?;
        let os = r
            .os_parsers
            .into_iter()
            .try_fold(os::Builder::new(), |b, p| b.push(p))?
            .build()?;
        let device = r
            .device_parsers
            .into_iter()
            .try_fold(device::Builder::new(), |b, p| b.push(p))?
            .build()?;
        Ok(Self { ua, os, device })
    }
}

impl<'a> Resolver for PrefilteredResolver<'a> {
    fn resolve(&self, ua: &str, domains: Domain) -> Result<PartialResult, Error> {
        let user_agent: Option<UserAgent> = domains
            .contains(Domain::USER_AGENT)
            .then(|| self.ua.extract(ua))
            .flatten();
        let os: Option<OS> = domains
            .contains(Domain::OS)
            .then(|| self.os.extract(ua))
            .transpose()?
            .flatten();
        let device: Option<Device> = domains
            .contains(Domain::DEVICE)
            .then(|| self.device.extract(ua))
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

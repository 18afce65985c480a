//! User agent (browser) module.
//!
//! The user agent is the representation of the browser, in UAP lingo
//! the user agent is composed of a *family* (the browser project) and
//! a *version* of up to 4 segments.

use serde::Deserialize;
use std::borrow::Cow;

use crate::groups::Groups;
use crate::matcher::Compiled;
use crate::resolvers::{FallbackResolver, FamilyResolver};
use crate::{Error, UserAgent};
use regex_filtered::BuildError;

/// Individual user agent parser description. Plain data which can
/// be deserialized from serde-compatible storage, or created
/// literally (e.g. using a conversion or build script).
#[derive(Deserialize, Default)]
pub struct Parser<'a> {
    /// Regex to check the UA against, if the regex matches the
    /// parser applies.
    pub regex: Cow<'a, str>,
    /// If set, used for the [`UserAgent::family`] field. If it
    /// contains a `$1` placeholder, that is replaced by the value
    /// of the first match group.
    ///
    /// If unset, the first match group is used directly.
    pub family_replacement: Option<Cow<'a, str>>,
    /// If set, provides the value of the major version number,
    /// otherwise the second match group is used.
    pub v1_replacement: Option<Cow<'a, str>>,
    /// If set, provides the value of the minor version number,
    /// otherwise the third match group is used.
    pub v2_replacement: Option<Cow<'a, str>>,
    /// If set, provides the value of the patch version number,
    /// otherwise the fourth match group is used.
    pub v3_replacement: Option<Cow<'a, str>>,
    /// If set, provides the value of the minor patch version
    /// number, otherwise the fifth match group is used.
    pub v4_replacement: Option<Cow<'a, str>>,
}

type Repl<'a> = (
    FamilyResolver<'a>,
    // TODO: should actually be restrict-templated (same as family
    // but for indexes 2-5 instead of 1).
    FallbackResolver<'a>,
    FallbackResolver<'a>,
    FallbackResolver<'a>,
    FallbackResolver<'a>,
);

fn repl_for<'a>(ua: &Parser<'a>, groups: usize) -> Result<Repl<'a>, Error> {
    Ok((
        FamilyResolver::new(ua.family_replacement.clone(), groups)?,
        FallbackResolver::new(ua.v1_replacement.clone(), groups, 2),
        FallbackResolver::new(ua.v2_replacement.clone(), groups, 3),
        FallbackResolver::new(ua.v3_replacement.clone(), groups, 4),
        FallbackResolver::new(ua.v4_replacement.clone(), groups, 5),
    ))
}

fn extract_with<'a, G: Groups>(repl: &Repl<'a>, c: &G) -> UserAgent {
    let (f, v1, v2, v3, v4) = repl;
    UserAgent {
        family: f.resolve(c).into_owned(),
        major: v1.resolve(c).map(Cow::into_owned),
        minor: v2.resolve(c).map(Cow::into_owned),
        patch: v3.resolve(c).map(Cow::into_owned),
        patch_minor: v4.resolve(c).map(Cow::into_owned),
    }
}

/// Extractor builder, used to `push` parsers into before building
/// the (prefiltered) extractor.
#[derive(Default)]
pub struct Builder<'a> {
    builder: regex_filtered::Builder,
    repl: Vec<Repl<'a>>,
}
impl<'a> Builder<'a> {
    /// Initialise an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the extractor, may be called without pushing any
    /// parser in though that is not very useful.
    pub fn build(self) -> Result<Extractor<'a>, BuildError> {
        let Self { builder, repl } = self;

        Ok(Extractor {
            matcher: builder.build()?,
            repl,
        })
    }

    /// Pushes a parser into the builder, may fail if the
    /// [`Parser::regex`] is invalid.
    pub fn push(mut self, ua: Parser<'a>) -> Result<Self, Error> {
        self.builder = self.builder.push(&crate::rewrite_regex(&ua.regex))?;
        let r = &self.builder.regexes()[self.builder.regexes().len() - 1];
        // number of groups in regex, excluding implicit entire match group
        let groups = r.captures_len() - 1;
        self.repl.push(repl_for(&ua, groups)?);
        Ok(self)
    }

    /// Bulk loading of parsers into the builder.
    pub fn push_all<I>(self, ua: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Parser<'a>>,
    {
        ua.into_iter().try_fold(self, |s, p| s.push(p))
    }
}

/// User Agent extractor, backed by the prefiltered regex-set engine.
pub struct Extractor<'a> {
    matcher: regex_filtered::Regexes,
    repl: Vec<Repl<'a>>,
}
impl<'a> Extractor<'a> {
    /// Tries the loaded [`Parser`]s in declared order, returning the data
    /// extracted by the first one that matches `ua`.
    ///
    /// Returns [`None`] if no parser matches.
    pub fn extract(&self, ua: &str) -> Option<UserAgent> {
        let (idx, re) = self.matcher.matching(ua).next()?;
        let c = re.captures(ua)?;
        Some(extract_with(&self.repl[idx], &c))
    }
}

/// Either the field resolvers built up front (eager), or the raw parser
/// description held onto until the first `apply` (lazy), at which point
/// group count becomes known for free from the regex that was just
/// compiled anyway.
enum LinearRepl<'a> {
    Cached(Repl<'a>),
    Deferred(Parser<'a>),
}

/// A single rule for the linear (reference-semantics) resolver: one
/// independently-compiled [`regex_lite::Regex`] plus its field resolvers.
/// Eager and lazy variants behave identically from the caller's
/// perspective, but only the eager variant does any work — regex
/// compilation or field-resolver construction — before the first `apply`.
pub(crate) struct LinearMatcher<'a> {
    compiled: Compiled,
    repl: LinearRepl<'a>,
}
impl<'a> LinearMatcher<'a> {
    pub(crate) fn eager(ua: Parser<'a>) -> Result<Self, Error> {
        let pattern = crate::rewrite_regex(&ua.regex).into_owned();
        let compiled = Compiled::eager(&pattern, false)?;
        let groups = compiled.regex()?.captures_len() - 1;
        let repl = repl_for(&ua, groups)?;
        Ok(Self {
            compiled,
            repl: LinearRepl::Cached(repl),
        })
    }

    /// Builds a matcher that compiles its regex, and resolves its field
    /// templates against the group count that compilation reveals, only on
    /// the first `apply` call — construction itself does no fallible work.
    pub(crate) fn lazy(ua: Parser<'a>) -> Result<Self, Error> {
        let pattern = crate::rewrite_regex(&ua.regex).into_owned();
        let compiled = Compiled::lazy(&pattern, false);
        Ok(Self {
            compiled,
            repl: LinearRepl::Deferred(ua),
        })
    }

    pub(crate) fn pattern(&self) -> &str {
        self.compiled.pattern()
    }

    pub(crate) fn apply(&self, ua: &str) -> Result<Option<UserAgent>, Error> {
        let re = self.compiled.regex()?;
        let Some(c) = re.captures(ua) else {
            return Ok(None);
        };
        match &self.repl {
            LinearRepl::Cached(repl) => Ok(Some(extract_with(repl, &c))),
            LinearRepl::Deferred(parser) => {
                let groups = re.captures_len() - 1;
                let repl = repl_for(parser, groups)?;
                Ok(Some(extract_with(&repl, &c)))
            }
        }
    }
}

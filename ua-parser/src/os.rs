//! Operating system module.

use serde::Deserialize;
use std::borrow::Cow;

use crate::groups::Groups;
use crate::matcher::Compiled;
use crate::resolvers::OptResolver;
use crate::{Error, OS};
use regex_filtered::BuildError;

/// Individual OS parser description.
#[derive(Deserialize, Default)]
pub struct Parser<'a> {
    pub regex: Cow<'a, str>,
    pub os_replacement: Option<Cow<'a, str>>,
    pub os_v1_replacement: Option<Cow<'a, str>>,
    pub os_v2_replacement: Option<Cow<'a, str>>,
    pub os_v3_replacement: Option<Cow<'a, str>>,
    pub os_v4_replacement: Option<Cow<'a, str>>,
}

type Repl<'a> = (
    OptResolver<'a>,
    OptResolver<'a>,
    OptResolver<'a>,
    OptResolver<'a>,
    OptResolver<'a>,
);

fn repl_for<'a>(os: &Parser<'a>, groups: usize) -> Repl<'a> {
    (
        OptResolver::new(os.os_replacement.clone(), groups, 1),
        OptResolver::new(os.os_v1_replacement.clone(), groups, 2),
        OptResolver::new(os.os_v2_replacement.clone(), groups, 3),
        OptResolver::new(os.os_v3_replacement.clone(), groups, 4),
        OptResolver::new(os.os_v4_replacement.clone(), groups, 5),
    )
}

/// Resolves `repl` against `c`, returning [`Error::MalformedRule`] if the
/// `family` field (the first resolver) resolves to `None` — a rule that
/// matched but has no way to name the family it matched is malformed.
fn extract_with<G: Groups>(repl: &Repl<'_>, c: &G) -> Result<OS, Error> {
    let (family, v1, v2, v3, v4) = repl;
    Ok(OS {
        family: family.resolve(c).ok_or(Error::MalformedRule)?.into_owned(),
        major: v1.resolve(c).map(Cow::into_owned),
        minor: v2.resolve(c).map(Cow::into_owned),
        patch: v3.resolve(c).map(Cow::into_owned),
        patch_minor: v4.resolve(c).map(Cow::into_owned),
    })
}

/// Extractor builder for OS parsers.
#[derive(Default)]
pub struct Builder<'a> {
    builder: regex_filtered::Builder,
    repl: Vec<Repl<'a>>,
}
impl<'a> Builder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Result<Extractor<'a>, BuildError> {
        let Self { builder, repl } = self;
        Ok(Extractor {
            matcher: builder.build()?,
            repl,
        })
    }

    pub fn push(mut self, os: Parser<'a>) -> Result<Self, Error> {
        self.builder = self.builder.push(&crate::rewrite_regex(&os.regex))?;
        let r = &self.builder.regexes()[self.builder.regexes().len() - 1];
        let groups = r.captures_len() - 1;
        self.repl.push(repl_for(&os, groups));
        Ok(self)
    }

    pub fn push_all<I>(self, os: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Parser<'a>>,
    {
        os.into_iter().try_fold(self, |s, p| s.push(p))
    }
}

/// OS extractor, backed by the prefiltered regex-set engine.
pub struct Extractor<'a> {
    matcher: regex_filtered::Regexes,
    repl: Vec<Repl<'a>>,
}
impl<'a> Extractor<'a> {
    /// Tries the loaded [`Parser`]s in declared order.
    ///
    /// Returns `Ok(None)` if no parser matches, and
    /// [`Error::MalformedRule`] if a parser matches but cannot resolve a
    /// family.
    pub fn extract(&self, os: &str) -> Result<Option<OS>, Error> {
        match self.matcher.matching(os).next() {
            None => Ok(None),
            Some((idx, re)) => {
                // `matching` already filters by `is_match`, so this is
                // never actually `None`; treated as "no match" rather
                // than `Error::MalformedRule` (which means something
                // else: a rule that matched but resolved no family).
                let Some(c) = re.captures(os) else {
                    return Ok(None);
                };
                extract_with(&self.repl[idx], &c).map(Some)
            }
        }
    }
}

/// Either the field resolvers built up front (eager), or the raw parser
/// description held onto until the first `apply` (lazy).
enum LinearRepl<'a> {
    Cached(Repl<'a>),
    Deferred(Parser<'a>),
}

/// One rule of the linear OS resolver. Only the eager variant does any
/// work — regex compilation or field-resolver construction — before the
/// first `apply` call.
pub(crate) struct LinearMatcher<'a> {
    compiled: Compiled,
    repl: LinearRepl<'a>,
}
impl<'a> LinearMatcher<'a> {
    pub(crate) fn eager(os: Parser<'a>) -> Result<Self, Error> {
        let pattern = crate::rewrite_regex(&os.regex).into_owned();
        let compiled = Compiled::eager(&pattern, false)?;
        let groups = compiled.regex()?.captures_len() - 1;
        let repl = repl_for(&os, groups);
        Ok(Self {
            compiled,
            repl: LinearRepl::Cached(repl),
        })
    }

    /// Defers regex compilation and field-resolver construction to the
    /// first `apply` call.
    pub(crate) fn lazy(os: Parser<'a>) -> Result<Self, Error> {
        let pattern = crate::rewrite_regex(&os.regex).into_owned();
        let compiled = Compiled::lazy(&pattern, false);
        Ok(Self {
            compiled,
            repl: LinearRepl::Deferred(os),
        })
    }

    pub(crate) fn pattern(&self) -> &str {
        self.compiled.pattern()
    }

    pub(crate) fn apply(&self, os: &str) -> Result<Option<OS>, Error> {
        let re = self.compiled.regex()?;
        let Some(c) = re.captures(os) else {
            return Ok(None);
        };
        match &self.repl {
            LinearRepl::Cached(repl) => extract_with(repl, &c).map(Some),
            LinearRepl::Deferred(parser) => {
                let groups = re.captures_len() - 1;
                let repl = repl_for(parser, groups);
                extract_with(&repl, &c).map(Some)
            }
        }
    }
}

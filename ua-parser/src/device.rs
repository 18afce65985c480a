//! Device module.

use serde::Deserialize;
use std::borrow::Cow;

use crate::groups::Groups;
use crate::matcher::Compiled;
use crate::resolvers::OptResolver;
use crate::{Device, Error};
use regex_filtered::BuildError;

/// Regex matching flag for device rules.
#[derive(Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Flag {
    /// Enables case-insensitive regex matching, deserializes from the
    /// string `"i"`.
    #[serde(rename = "i")]
    IgnoreCase,
}

/// Individual device parser description.
#[derive(Deserialize, Default)]
pub struct Parser<'a> {
    pub regex: Cow<'a, str>,
    pub regex_flag: Option<Flag>,
    pub device_replacement: Option<Cow<'a, str>>,
    pub brand_replacement: Option<Cow<'a, str>>,
    pub model_replacement: Option<Cow<'a, str>>,
}

type Repl<'a> = (OptResolver<'a>, OptResolver<'a>, OptResolver<'a>);

fn repl_for<'a>(d: &Parser<'a>, groups: usize) -> Repl<'a> {
    (
        OptResolver::new(d.device_replacement.clone(), groups, 1),
        // no capture-group fallback for brand: `groups: 0, idx: 999` can
        // never satisfy `groups >= idx`, so this only ever resolves via
        // an explicit replacement, or `None`.
        OptResolver::new(d.brand_replacement.clone(), 0, 999),
        OptResolver::new(d.model_replacement.clone(), groups, 1),
    )
}

fn extract_with<G: Groups>(repl: &Repl<'_>, c: &G) -> Result<Device, Error> {
    let (family, brand, model) = repl;
    Ok(Device {
        family: family.resolve(c).ok_or(Error::MalformedRule)?.into_owned(),
        brand: brand.resolve(c).map(Cow::into_owned),
        model: model.resolve(c).map(Cow::into_owned),
    })
}

fn case_insensitive(flag: Option<Flag>) -> bool {
    flag == Some(Flag::IgnoreCase)
}

/// Extractor builder for device parsers.
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

    pub fn push(mut self, d: Parser<'a>) -> Result<Self, Error> {
        let pattern = crate::rewrite_regex(&d.regex);
        self.builder = self.builder.push_opt(
            &pattern,
            regex_filtered::Options::new().case_insensitive(case_insensitive(d.regex_flag)),
        )?;
        let r = &self.builder.regexes()[self.builder.regexes().len() - 1];
        let groups = r.captures_len() - 1;
        self.repl.push(repl_for(&d, groups));
        Ok(self)
    }

    pub fn push_all<I>(self, d: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Parser<'a>>,
    {
        d.into_iter().try_fold(self, |s, p| s.push(p))
    }
}

/// Device extractor, backed by the prefiltered regex-set engine.
pub struct Extractor<'a> {
    matcher: regex_filtered::Regexes,
    repl: Vec<Repl<'a>>,
}
impl<'a> Extractor<'a> {
    pub fn extract(&self, ua: &str) -> Result<Option<Device>, Error> {
        match self.matcher.matching(ua).next() {
            None => Ok(None),
            Some((idx, re)) => {
                // `matching` already filters by `is_match`, so this is
                // never actually `None`; treated as "no match" rather
                // than `Error::MalformedRule` (which means something
                // else: a rule that matched but resolved no family).
                let Some(c) = re.captures(ua) else {
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

/// One rule of the linear device resolver. Only the eager variant does any
/// work — regex compilation or field-resolver construction — before the
/// first `apply` call.
pub(crate) struct LinearMatcher<'a> {
    compiled: Compiled,
    repl: LinearRepl<'a>,
}
impl<'a> LinearMatcher<'a> {
    pub(crate) fn eager(d: Parser<'a>) -> Result<Self, Error> {
        let pattern = crate::rewrite_regex(&d.regex).into_owned();
        let ci = case_insensitive(d.regex_flag);
        let compiled = Compiled::eager(&pattern, ci)?;
        let groups = compiled.regex()?.captures_len() - 1;
        let repl = repl_for(&d, groups);
        Ok(Self {
            compiled,
            repl: LinearRepl::Cached(repl),
        })
    }

    /// Defers regex compilation and field-resolver construction to the
    /// first `apply` call.
    pub(crate) fn lazy(d: Parser<'a>) -> Result<Self, Error> {
        let pattern = crate::rewrite_regex(&d.regex).into_owned();
        let ci = case_insensitive(d.regex_flag);
        let compiled = Compiled::lazy(&pattern, ci);
        Ok(Self {
            compiled,
            repl: LinearRepl::Deferred(d),
        })
    }

    pub(crate) fn pattern(&self) -> &str {
        self.compiled.pattern()
    }

    pub(crate) fn apply(&self, ua: &str) -> Result<Option<Device>, Error> {
        let re = self.compiled.regex()?;
        let Some(c) = re.captures(ua) else {
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

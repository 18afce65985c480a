// TODO: what happens in case of optional groups?
//
// Sadly regex offers no way to actually query that nicely: via
// static_captures_len it only specifies whether all groups are
// required, if any group is optional that returns `None`.

use crate::groups::{expand, has_substitution, Groups};
use std::borrow::Cow;

fn get<'s, G: Groups>(g: &'s G, group: usize) -> Option<&'s str> {
    g.group(group)
}

/// Resolver with full templating: the template string can contain
/// $1-9 markers which get replaced by the corresponding regex capture
/// group.
///
/// - if there is a non-null replacement pattern, then it must be used with
///   match groups as template parameters (at indices 1+)
///   - the result is stripped
///   - if it is an empty string, then it's replaced by a null
/// - otherwise fallback to a (possibly optional) match group
/// - or null (e.g. device brand has no fallback)
///
/// Used for every OS and device field, including `family`: resolving
/// `family` is allowed to produce `None` here — the matcher that owns
/// this resolver turns that into a [`crate::Error::MalformedRule`] once
/// a rule has actually matched, instead of silently falling back to an
/// empty string.
///
/// Generic over [`Groups`] so the same logic serves both the
/// `regex`-backed prefiltered resolver and the `regex-lite`-backed linear
/// resolver.
pub(crate) enum OptResolver<'a> {
    None,
    Replacement(Cow<'a, str>),
    Capture(usize),
    Template(Cow<'a, str>),
}
impl<'a> OptResolver<'a> {
    /// An explicitly blank/empty template resolves to `None` outright —
    /// it does *not* fall back to the bare capture group, that fallback
    /// is reserved for a replacement field that is absent entirely
    /// (`repl: None`), which is what the "default template" (`$1`..`$5`)
    /// amounts to.
    pub(crate) fn new(repl: Option<Cow<'a, str>>, groups: usize, idx: usize) -> Self {
        match repl {
            Some(s) if s.trim().is_empty() => Self::None,
            Some(s) if has_substitution(&s) => Self::Template(s),
            Some(s) => Self::Replacement(s),
            None if groups >= idx => Self::Capture(idx),
            None => Self::None,
        }
    }

    pub(crate) fn resolve<G: Groups>(&self, c: &G) -> Option<Cow<'a, str>> {
        match self {
            Self::None => None,
            Self::Replacement(s) => Some(s.clone()),
            Self::Capture(i) => get(c, *i).map(|s| s.to_string().into()),
            Self::Template(t) => {
                let r = expand(t, c);
                let trimmed = r.trim();
                if trimmed.is_empty() {
                    None
                } else if trimmed.len() == r.len() {
                    Some(r.into())
                } else {
                    Some(trimmed.to_string().into())
                }
            }
        }
    }
}

/// Dedicated restrict-templated resolver for UserAgent#family:
/// supports templating in the replacement, but only for the `$1`
/// value / group. Never resolves to `None`: an empty family is
/// represented as `""`, not a lookup failure (only OS/device have a
/// notion of a malformed rule).
pub(crate) enum FamilyResolver<'a> {
    Capture,
    Replacement(Cow<'a, str>),
    Template(Cow<'a, str>),
}
impl<'a> FamilyResolver<'a> {
    pub(crate) fn new(repl: Option<Cow<'a, str>>, groups: usize) -> Result<Self, crate::Error> {
        match repl {
            Some(s) if s.contains("$1") => {
                if groups < 1 {
                    Err(crate::Error::MissingGroup(1))
                } else {
                    Ok(FamilyResolver::Template(s))
                }
            }
            Some(s) if !s.is_empty() => Ok(FamilyResolver::Replacement(s)),
            _ if groups >= 1 => Ok(FamilyResolver::Capture),
            _ => Ok(FamilyResolver::Replacement("".into())),
        }
    }

    pub(crate) fn resolve<G: Groups>(&self, c: &G) -> Cow<'a, str> {
        match self {
            FamilyResolver::Capture => get(c, 1).unwrap_or("").to_string().into(),
            FamilyResolver::Replacement(s) => s.clone(),
            FamilyResolver::Template(t) => t.replace("$1", get(c, 1).unwrap_or("")).into(),
        }
    }
}

/// Untemplated resolver, the replacement value is used as-is if
/// present, otherwise falls back to a capture group, otherwise `None`.
/// Used for UserAgent's major/minor/patch/patch_minor fields.
pub(crate) enum FallbackResolver<'a> {
    None,
    Capture(usize),
    Replacement(Cow<'a, str>),
}
impl<'a> FallbackResolver<'a> {
    pub(crate) fn new(repl: Option<Cow<'a, str>>, groups: usize, idx: usize) -> Self {
        if let Some(s) = repl.filter(|s| !s.is_empty()) {
            Self::Replacement(s)
        } else if groups >= idx {
            Self::Capture(idx)
        } else {
            Self::None
        }
    }
    pub(crate) fn resolve<G: Groups>(&self, c: &G) -> Option<Cow<'a, str>> {
        match self {
            FallbackResolver::None => None,
            FallbackResolver::Capture(n) => get(c, *n).map(|s| s.to_string().into()),
            FallbackResolver::Replacement(r) => Some(r.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_resolver_template_restricted_to_dollar1() {
        let re = regex_lite::Regex::new("(Foo) (Bar)").unwrap();
        let c = re.captures("Foo Bar").unwrap();
        let r = FamilyResolver::new(Some("prefix-$1".into()), 2).unwrap();
        assert_eq!(r.resolve(&c), "prefix-Foo");
    }

    #[test]
    fn opt_resolver_explicit_blank_template_is_none() {
        let re = regex_lite::Regex::new("(a)").unwrap();
        let c = re.captures("a").unwrap();
        // An explicit (even all-whitespace) template is None outright —
        // it must not fall back to the capture group.
        let r = OptResolver::new(Some("   ".into()), 1, 1);
        assert_eq!(r.resolve(&c), None);

        // An *absent* replacement field does fall back to the capture
        // group — that's the "default template" behavior.
        let r = OptResolver::new(None, 1, 1);
        assert_eq!(r.resolve(&c).as_deref(), Some("a"));

        let r = OptResolver::new(Some("$9".into()), 1, 1);
        assert_eq!(r.resolve(&c), None);
    }
}

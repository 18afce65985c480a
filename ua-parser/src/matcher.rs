//! One regex plus a substitution template, applied to a string to yield
//! a typed record or `None`. Backs the [`crate::linear::LinearResolver`],
//! which needs a lightweight, independently-compilable regex per rule
//! (unlike the prefiltered resolver, which compiles every rule of a
//! domain into one [`regex_filtered::Regexes`] set).
//!
//! Two variants exist, both satisfying the same contract: [`Compiled::Eager`]
//! compiles the pattern at construction time, [`Compiled::Lazy`] defers
//! compilation to the first [`Compiled::regex`] call, caching the result in
//! a [`std::sync::OnceLock`] so repeated calls (and calls from multiple
//! threads) don't recompile.

use std::sync::OnceLock;

/// A compiled (or not-yet-compiled) regex backing one rule.
pub(crate) enum Compiled {
    Eager {
        regex: regex_lite::Regex,
        case_insensitive: bool,
    },
    Lazy {
        pattern: String,
        case_insensitive: bool,
        cell: OnceLock<regex_lite::Regex>,
    },
}

impl Compiled {
    pub(crate) fn eager(pattern: &str, case_insensitive: bool) -> Result<Self, regex_lite::Error> {
        Ok(Self::Eager {
            regex: regex_lite::RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()?,
            case_insensitive,
        })
    }

    /// Builds a lazily-compiled matcher. The pattern is *not* validated at
    /// construction time — a malformed pattern only surfaces as an error
    /// on the first [`Self::regex`] call, which is the whole point of
    /// deferring compilation.
    pub(crate) fn lazy(pattern: &str, case_insensitive: bool) -> Self {
        Self::Lazy {
            pattern: pattern.to_string(),
            case_insensitive,
            cell: OnceLock::new(),
        }
    }

    pub(crate) fn pattern(&self) -> &str {
        match self {
            Self::Eager { regex, .. } => regex.as_str(),
            Self::Lazy { pattern, .. } => pattern,
        }
    }

    pub(crate) fn case_insensitive(&self) -> bool {
        match self {
            Self::Eager {
                case_insensitive, ..
            } => *case_insensitive,
            Self::Lazy {
                case_insensitive, ..
            } => *case_insensitive,
        }
    }

    /// Returns the compiled regex, compiling it on first use for
    /// [`Self::Lazy`] matchers.
    pub(crate) fn regex(&self) -> Result<&regex_lite::Regex, regex_lite::Error> {
        match self {
            Self::Eager { regex, .. } => Ok(regex),
            Self::Lazy {
                pattern,
                case_insensitive,
                cell,
            } => {
                if let Some(re) = cell.get() {
                    return Ok(re);
                }
                let re = regex_lite::RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .build()?;
                Ok(cell.get_or_init(|| re))
            }
        }
    }
}

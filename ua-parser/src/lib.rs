#![deny(unsafe_code)]
#![warn(missing_docs)]

//! User agent string classification: three independent domains (browser,
//! OS, device), each driven by an ordered list of regex rules, behind a
//! composable [`Resolver`] stack (linear, prefiltered, caching).

use serde::Deserialize;

pub use regex_filtered::{BuildError, ParseError};

mod cache;
mod caching;
mod domain;
mod groups;
mod linear;
mod matcher;
mod parser;
mod resolver;
mod resolvers;
mod types;

pub mod device;
pub mod os;
pub mod user_agent;

pub use cache::{Cache, ClearingCache, LruCache, S3FifoCache, SieveCache};
pub use caching::{CachingResolver, Locking, ThreadLocal};
pub use domain::Domain;
pub use linear::LinearResolver;
pub use parser::{parse, parse_device, parse_os, parse_user_agent, Parser};
pub use resolver::{PrefilteredResolver, Resolver};
pub use types::{DefaultedParseResult, Device, ParseResult, PartialResult, UserAgent, OS};

/// Error type covering every fallible operation in this crate: building a
/// [`Resolver`] from rule descriptors, and resolving a user agent string.
#[derive(Debug)]
pub enum Error {
    /// Compilation failed because one of the input regexes could not be
    /// parsed or processed by the prefiltered (regex-set) engine.
    ParseError(ParseError),
    /// Compilation failed because one of the prefilters could not be built.
    BuildError(BuildError),
    /// Compilation failed because one of the input regexes could not be
    /// parsed by the lightweight (`regex-lite`) engine used by the linear
    /// resolver.
    LiteParseError(regex_lite::Error),
    /// A replacement template requires a capture group missing from the
    /// regex it is attached to.
    MissingGroup(usize),
    /// An OS or device rule matched but its family template resolved to no
    /// value at all — a malformed rule, not a "no match".
    MalformedRule,
    /// [`PartialResult::complete`] was called on a result that does not
    /// cover every domain.
    CompletionRequiredAll,
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ParseError(p) => Some(p),
            Error::BuildError(b) => Some(b),
            Error::LiteParseError(e) => Some(e),
            Error::MissingGroup(_) => None,
            Error::MalformedRule => None,
            Error::CompletionRequiredAll => None,
        }
    }
}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ParseError(_) | Error::BuildError(_) | Error::LiteParseError(_) => {
                write!(f, "{self:?}")
            }
            Error::MissingGroup(n) => write!(f, "replacement template requires group {n}"),
            Error::MalformedRule => write!(f, "rule matched but resolved no family value"),
            Error::CompletionRequiredAll => {
                write!(f, "complete() requires every domain to be resolved")
            }
        }
    }
}
impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::ParseError(value)
    }
}
impl From<BuildError> for Error {
    fn from(value: BuildError) -> Self {
        Self::BuildError(value)
    }
}
impl From<regex_lite::Error> for Error {
    fn from(value: regex_lite::Error) -> Self {
        Self::LiteParseError(value)
    }
}

/// Deserialization target for the three rule lists, can be used with the
/// relevant serde implementation to load from `regexes.yaml` or a conversion
/// thereof. Wire-compatible with `uap-core`'s `regexes.yaml`.
#[allow(missing_docs)]
#[derive(Deserialize)]
pub struct Regexes<'a> {
    pub user_agent_parsers: Vec<user_agent::Parser<'a>>,
    pub os_parsers: Vec<os::Parser<'a>>,
    pub device_parsers: Vec<device::Parser<'a>>,
}

/// Rewrites a regex's character classes to ascii and bounded repetitions to
/// unbounded, the second to reduce regex memory requirements, and the first
/// for both that and to better match the (inferred) semantics intended for
/// ua-parser.
pub(crate) fn rewrite_regex(re: &str) -> std::borrow::Cow<'_, str> {
    let mut from = 0;
    let mut out = String::new();

    let mut it = re.char_indices();
    let mut escape = false;
    let mut inclass = 0;
    'main: while let Some((idx, c)) = it.next() {
        match c {
            '\\' if !escape => {
                escape = true;
                continue;
            }
            '{' if !escape && inclass == 0 => {
                if idx == 0 {
                    // we're repeating nothing, this regex is broken, bail
                    return re.into();
                }
                // we don't need to loop, we only want to replace {0, ...} and {1, ...}
                let Some((_, start)) = it.next() else {
                    continue;
                };
                if start != '0' && start != '1' {
                    continue;
                }

                if !matches!(it.next(), Some((_, ','))) {
                    continue;
                }

                let mut digits = 0;
                for (ri, rc) in it.by_ref() {
                    match rc {
                        '}' if digits > 2 => {
                            // here idx is the index of the start of
                            // the range and ri is the end of range
                            out.push_str(&re[from..idx]);
                            from = ri + 1;
                            out.push_str(if start == '0' { "*" } else { "+" });
                            break;
                        }
                        c if c.is_ascii_digit() => {
                            digits += 1;
                        }
                        _ => continue 'main,
                    }
                }
            }
            '[' if !escape => {
                inclass += 1;
            }
            ']' if !escape => {
                inclass += 1;
            }
            // no need for special cases because regex allows nesting
            // character classes, whereas js or python don't \o/
            'd' if escape => {
                // idx is d so idx-1 is \\, and we want to exclude it
                out.push_str(&re[from..idx - 1]);
                from = idx + 1;
                out.push_str("[0-9]");
            }
            'D' if escape => {
                out.push_str(&re[from..idx - 1]);
                from = idx + 1;
                out.push_str("[^0-9]");
            }
            'w' if escape => {
                out.push_str(&re[from..idx - 1]);
                from = idx + 1;
                out.push_str("[A-Za-z0-9_]");
            }
            'W' if escape => {
                out.push_str(&re[from..idx - 1]);
                from = idx + 1;
                out.push_str("[^A-Za-z0-9_]");
            }
            _ => (),
        }
        escape = false;
    }

    if from == 0 {
        re.into()
    } else {
        out.push_str(&re[from..]);
        out.into()
    }
}

#[cfg(test)]
mod test_rewrite_regex {
    use super::rewrite_regex as rewrite;

    #[test]
    fn ignore_small_repetition() {
        assert_eq!(rewrite(".{0,2}x"), ".{0,2}x");
        assert_eq!(rewrite(".{0,}"), ".{0,}");
        assert_eq!(rewrite(".{1,}"), ".{1,}");
    }

    #[test]
    fn rewrite_large_repetitions() {
        assert_eq!(rewrite(".{0,20}x"), ".{0,20}x");
        assert_eq!(rewrite("(.{0,100})"), "(.*)");
        assert_eq!(rewrite("(.{1,50})"), "(.{1,50})");
        assert_eq!(rewrite(".{1,300}x"), ".+x");
    }

    #[test]
    fn ignore_non_repetitions() {
        assert_eq!(
            rewrite(r"\{1,2}"),
            r"\{1,2}",
            "if the opening brace is escaped it's not a repetition"
        );
        assert_eq!(
            rewrite("[.{1,100}]"),
            "[.{1,100}]",
            "inside a set it's not a repetition"
        );
    }

    #[test]
    fn rewrite_classes() {
        assert_eq!(rewrite(r"\dx"), "[0-9]x");
        assert_eq!(rewrite(r"\wx"), "[A-Za-z0-9_]x");
        assert_eq!(rewrite(r"[\d]x"), r"[[0-9]]x");
    }
}

use crate::{Domain, Error};

/// Browser ("user agent", the software issuing the request) information
/// parsed out of a user agent string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAgent {
    /// The browser family, e.g. `"Firefox"`. Defaults to `"Other"` when no
    /// rule matched (via [`UserAgent::default`]), matching the convention
    /// used throughout `uap-core`.
    pub family: String,
    /// Major version component, if any.
    pub major: Option<String>,
    /// Minor version component, if any.
    pub minor: Option<String>,
    /// Patch version component, if any.
    pub patch: Option<String>,
    /// Patch-minor version component, if any.
    pub patch_minor: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            family: "Other".to_string(),
            major: None,
            minor: None,
            patch: None,
            patch_minor: None,
        }
    }
}

/// Operating system information parsed out of a user agent string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OS {
    /// The OS family, e.g. `"Mac OS X"`. Defaults to `"Other"`.
    pub family: String,
    /// Major version component, if any.
    pub major: Option<String>,
    /// Minor version component, if any.
    pub minor: Option<String>,
    /// Patch version component, if any.
    pub patch: Option<String>,
    /// Patch-minor version component, if any.
    pub patch_minor: Option<String>,
}

impl Default for OS {
    fn default() -> Self {
        Self {
            family: "Other".to_string(),
            major: None,
            minor: None,
            patch: None,
            patch_minor: None,
        }
    }
}

/// Device information parsed out of a user agent string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    /// The device family, e.g. `"iPhone"`. Defaults to `"Other"`.
    pub family: String,
    /// The device brand, if any.
    pub brand: Option<String>,
    /// The device model, if any.
    pub model: Option<String>,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            family: "Other".to_string(),
            brand: None,
            model: None,
        }
    }
}

/// A fully resolved classification of a user agent string: every domain has
/// either succeeded (`Some`) or failed to match any rule (`None`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseResult {
    /// Browser classification, or `None` if no rule matched.
    pub user_agent: Option<UserAgent>,
    /// OS classification, or `None` if no rule matched.
    pub os: Option<OS>,
    /// Device classification, or `None` if no rule matched.
    pub device: Option<Device>,
    /// The original input string.
    pub string: String,
}

/// Variant of [`ParseResult`] where every failed domain is replaced by its
/// default value, matching pre-1.0 `uap-core` semantics for callers who
/// don't care to distinguish "no match" from "default".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultedParseResult {
    /// Browser classification, defaulted.
    pub user_agent: UserAgent,
    /// OS classification, defaulted.
    pub os: OS,
    /// Device classification, defaulted.
    pub device: Device,
    /// The original input string.
    pub string: String,
}

impl ParseResult {
    /// Replaces every failed domain by its default value.
    pub fn with_defaults(self) -> DefaultedParseResult {
        DefaultedParseResult {
            user_agent: self.user_agent.unwrap_or_default(),
            os: self.os.unwrap_or_default(),
            device: self.device.unwrap_or_default(),
            string: self.string,
        }
    }
}

/// Potentially partial (incomplete) result of classifying a user agent
/// string.
///
/// For every domain bit set in [`Self::domains`], the corresponding field is
/// defined: `Some` for a match, `None` for "no rule matched". For every
/// domain bit *not* set, the field must not be read — it was never resolved
/// and carries no meaningful value (by construction it is always `None`, but
/// that `None` does not mean "no match", it means "not looked up yet").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialResult {
    /// Which domains have been resolved so far.
    pub domains: Domain,
    /// Browser classification, meaningful only if `domains` contains
    /// [`Domain::USER_AGENT`].
    pub user_agent: Option<UserAgent>,
    /// OS classification, meaningful only if `domains` contains
    /// [`Domain::OS`].
    pub os: Option<OS>,
    /// Device classification, meaningful only if `domains` contains
    /// [`Domain::DEVICE`].
    pub device: Option<Device>,
    /// The original input string.
    pub string: String,
}

impl PartialResult {
    /// Requires that every domain has been resolved, and converts to a
    /// [`ParseResult`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CompletionRequiredAll`] if `self.domains !=
    /// Domain::ALL`.
    pub fn complete(self) -> Result<ParseResult, Error> {
        if self.domains != Domain::ALL {
            return Err(Error::CompletionRequiredAll);
        }
        Ok(ParseResult {
            user_agent: self.user_agent,
            os: self.os,
            device: self.device,
            string: self.string,
        })
    }
}

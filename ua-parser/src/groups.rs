//! Small abstraction over capture groups so the replacement/resolver logic
//! in [`crate::resolvers`] can be written once and shared between the
//! `regex`-backed prefiltered resolver and the `regex-lite`-backed linear
//! resolver.

/// A source of numbered capture groups, implemented for both
/// [`regex::Captures`] and [`regex_lite::Captures`] so the substitution
/// rules only need to be written once.
pub(crate) trait Groups {
    fn group(&self, i: usize) -> Option<&str>;
}

impl Groups for regex::Captures<'_> {
    fn group(&self, i: usize) -> Option<&str> {
        self.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty())
    }
}

impl Groups for regex_lite::Captures<'_> {
    fn group(&self, i: usize) -> Option<&str> {
        self.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty())
    }
}

/// Whether `s` contains a `$N` marker (N a single ASCII digit), i.e. whether
/// it needs full template expansion rather than being usable as-is.
pub(crate) fn has_substitution(s: &str) -> bool {
    debug_assert!(!s.is_empty());
    std::iter::zip(s.as_bytes(), &s.as_bytes()[1..]).any(|(&d, n)| d == b'$' && n.is_ascii_digit())
}

/// Expands every `$N` (N in 1..=9) in `template` using `groups`, substituting
/// the empty string for undefined or empty groups.
pub(crate) fn expand<G: Groups>(template: &str, groups: &G) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(&d) = chars.peek() {
                if let Some(n) = d.to_digit(10) {
                    chars.next();
                    if let Some(g) = groups.group(n as usize) {
                        out.push_str(g);
                    }
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_substitution_markers() {
        assert!(has_substitution("$1"));
        assert!(has_substitution("prefix $2 suffix"));
        assert!(!has_substitution("plain"));
        assert!(!has_substitution("$"));
        assert!(!has_substitution("$a"));
    }

    #[test]
    fn expand_against_regex_lite() {
        let re = regex_lite::Regex::new("(Foo) (\\d+)").unwrap();
        let c = re.captures("Foo 42").unwrap();
        assert_eq!(expand("$1 $2", &c), "Foo 42");
        assert_eq!(expand("$1", &c), "Foo");
        assert_eq!(expand("literal", &c), "literal");
        assert_eq!(expand("$9", &c), "");
    }
}

use std::fmt;

use serde::Serialize;

/// `major.minor.patch` reported by an external tool.
///
/// Ordering is the derived field-by-field comparison, so `1.20.0` is newer
/// than `1.19.3` regardless of the patch level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ToolVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ToolVersion {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Find the first dotted version in free-form `--version` output.
    ///
    /// Accepts `1.19`, `v0.16.1`, and `1.23.1-dev`; missing components are
    /// zero.
    #[must_use]
    pub fn find_in(output: &str) -> Option<Self> {
        output
            .split(|ch: char| ch.is_whitespace() || matches!(ch, ',' | '(' | ')' | '"'))
            .find_map(Self::parse_token)
    }

    fn parse_token(token: &str) -> Option<Self> {
        let token = token.strip_prefix('v').unwrap_or(token);
        if !token.contains('.') || !token.starts_with(|ch: char| ch.is_ascii_digit()) {
            return None;
        }
        let mut parts = token.split('.').map(leading_number);
        let major = parts.next()??;
        let minor = parts.next()??;
        let patch = match parts.next() {
            Some(value) => value?,
            None => 0,
        };
        Some(Self::new(major, minor, patch))
    }
}

fn leading_number(part: &str) -> Option<u64> {
    let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

//! Server version tokens.
//!
//! The artifact repository reports its version as a dotted string
//! (e.g. "7.49.3"). Feature gates compare against a threshold version,
//! so the token only needs ordered comparison, not full semver.

use std::cmp::Ordering;
use std::str::FromStr;

/// A comparable server version, parsed from a dotted numeric string.
///
/// Non-numeric trailing fragments (e.g. "7.4.0-m001") are ignored from
/// the first fragment that fails to parse.
#[derive(Debug, Clone)]
pub struct ServerVersion {
    parts: Vec<u32>,
}

impl ServerVersion {
    /// Parse a version string. Never fails; an unparsable string becomes
    /// the zero version, which is below every real threshold.
    pub fn new(version: &str) -> Self {
        let parts = version
            .split('.')
            .map_while(|p| {
                let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u32>().ok()
            })
            .collect();
        Self { parts }
    }

    /// Whether this version is at least `other`.
    pub fn is_at_least(&self, other: &ServerVersion) -> bool {
        self >= other
    }
}

// Equality follows the ordering: missing fragments compare as zero, so
// "4.8" and "4.8.0" are the same version.
impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ServerVersion {}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl FromStr for ServerVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", text.join("."))
    }
}

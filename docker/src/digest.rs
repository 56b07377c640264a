//! Content digests.
//!
//! Layer and manifest digests are strings of the form `algorithm:hex`.
//! The algorithm decides how a layer is searched for: sha1 digests match
//! the repository's checksum column directly, every other algorithm is
//! content-addressed and only appears as a prefix of the stored file
//! name (`algorithm__hex<ext>`).

use std::fmt;
use std::str::FromStr;

use buildinfo_core::{Error, Result};

/// Digest algorithm, split by how layers carrying it are located.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// Checksum-style: matches the repository's actual_sha1 column.
    Sha1,
    /// Content-addressed: the storage file name embeds the digest.
    Sha256,
    /// Any other content-addressed algorithm.
    Other(String),
}

impl DigestAlgorithm {
    fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "sha1" => Self::Sha1,
            "sha256" => Self::Sha256,
            other => Self::Other(other.to_string()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Other(name) => name,
        }
    }
}

/// A parsed content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Digest {
    /// Parse an `algorithm:hex` digest string.
    pub fn parse(digest: &str) -> Result<Self> {
        let (algorithm, hex) = digest
            .split_once(':')
            .ok_or_else(|| Error::InvalidDigest(digest.to_string()))?;
        if algorithm.is_empty() || hex.is_empty() {
            return Err(Error::InvalidDigest(digest.to_string()));
        }
        Ok(Self {
            algorithm: DigestAlgorithm::parse(algorithm),
            hex: hex.to_string(),
        })
    }

    /// Build a sha1 digest from a bare checksum value.
    pub fn from_sha1(hex: impl Into<String>) -> Self {
        Self {
            algorithm: DigestAlgorithm::Sha1,
            hex: hex.into(),
        }
    }

    pub fn algorithm(&self) -> &DigestAlgorithm {
        &self.algorithm
    }

    /// The hex value without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Whether this digest matches the repository checksum column.
    pub fn is_checksum(&self) -> bool {
        self.algorithm == DigestAlgorithm::Sha1
    }

    /// The storage file-name form: `algorithm__hex`.
    pub fn to_file_name(&self) -> String {
        format!("{}__{}", self.algorithm.as_str(), self.hex)
    }

    /// Rebuild a digest from a storage file name (`algorithm__hex`, with
    /// an optional `.marker` suffix for placeholder layers).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.strip_suffix(".marker").unwrap_or(name);
        let (algorithm, hex) = name.split_once("__")?;
        if algorithm.is_empty() || hex.is_empty() {
            return None;
        }
        Some(Self {
            algorithm: DigestAlgorithm::parse(algorithm),
            hex: hex.to_string(),
        })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.hex)
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sha256() {
        let d = Digest::parse("sha256:abc123").unwrap();
        assert_eq!(d.algorithm(), &DigestAlgorithm::Sha256);
        assert_eq!(d.hex(), "abc123");
        assert!(!d.is_checksum());
    }

    #[test]
    fn test_parse_sha1_case_insensitive() {
        let d = Digest::parse("SHA1:ff00").unwrap();
        assert_eq!(d.algorithm(), &DigestAlgorithm::Sha1);
        assert!(d.is_checksum());
    }

    #[test]
    fn test_parse_other_algorithm() {
        let d = Digest::parse("sha512:0011").unwrap();
        assert_eq!(d.algorithm(), &DigestAlgorithm::Other("sha512".to_string()));
        assert!(!d.is_checksum());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Digest::parse("no-colon").is_err());
        assert!(Digest::parse(":abc").is_err());
        assert!(Digest::parse("sha256:").is_err());
    }

    #[test]
    fn test_file_name_form() {
        let d = Digest::parse("sha256:abc123").unwrap();
        assert_eq!(d.to_file_name(), "sha256__abc123");
    }

    #[test]
    fn test_from_file_name() {
        let d = Digest::from_file_name("sha256__abc123").unwrap();
        assert_eq!(d.to_string(), "sha256:abc123");
    }

    #[test]
    fn test_from_file_name_marker() {
        let d = Digest::from_file_name("sha256__abc123.marker").unwrap();
        assert_eq!(d.to_string(), "sha256:abc123");
    }

    #[test]
    fn test_from_file_name_not_digest_shaped() {
        assert!(Digest::from_file_name("manifest.json").is_none());
        assert!(Digest::from_file_name("__abc").is_none());
    }

    #[test]
    fn test_display_roundtrip() {
        let d: Digest = "sha256:deadbeef".parse().unwrap();
        assert_eq!(d.to_string(), "sha256:deadbeef");
    }
}

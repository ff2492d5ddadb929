//! Asset GUID parsing and validation primitives.
//!
//! An asset GUID is the 32-hex-digit token an editor assigns to every asset and
//! writes into the asset's `.meta` sidecar. Other assets (atlases, prefabs,
//! materials) refer to it with a `guid: <token>` marker in their serialized text.
//!
//! This crate is the single source of truth for what a well-formed GUID looks
//! like; scanners and resolvers both go through [`AssetGuid::parse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hex digits in a GUID.
pub const GUID_LEN: usize = 32;

/// Regex that finds a GUID marker and captures the token in group 1.
pub const GUID_MARKER_PATTERN: &str = r"guid:\s*([a-fA-F0-9]{32})";

/// Errors from GUID validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuidError {
    /// The token does not have exactly [`GUID_LEN`] characters.
    #[error("GUID must be 32 hex digits, got {len} characters")]
    Length {
        /// Character count of the rejected token.
        len: usize,
    },

    /// The token contains a character outside `[0-9a-fA-F]`.
    #[error("GUID has non-hex character {found:?} at position {position}")]
    InvalidChar {
        /// 0-based character position.
        position: usize,
        /// The offending character.
        found: char,
    },
}

/// A validated asset GUID, stored in lowercase.
///
/// Two GUIDs that differ only in letter case compare equal once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetGuid(String);

impl AssetGuid {
    /// Parse and normalize a raw GUID token.
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    /// Returns [`GuidError`] if the token is not exactly 32 ASCII hex digits.
    pub fn parse(raw: &str) -> Result<Self, GuidError> {
        let token = raw.trim();
        let len = token.chars().count();
        if len != GUID_LEN {
            return Err(GuidError::Length { len });
        }
        if let Some((position, found)) = token
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_hexdigit())
        {
            return Err(GuidError::InvalidChar { position, found });
        }
        Ok(Self(token.to_ascii_lowercase()))
    }

    /// The normalized (lowercase) token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether every digit is zero.
    ///
    /// The all-zero GUID is used by serializers as a "no asset" placeholder.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }
}

impl fmt::Display for AssetGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetGuid {
    type Err = GuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetGuid {
    type Error = GuidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetGuid> for String {
    fn from(guid: AssetGuid) -> Self {
        guid.0
    }
}

impl AsRef<str> for AssetGuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "6e1f2c3b4a5d49e8b7a6c5d4e3f2a1b0";

    #[test]
    fn test_parse_valid() {
        let guid = AssetGuid::parse(SAMPLE).unwrap();
        assert_eq!(guid.as_str(), SAMPLE);
        assert_eq!(guid.to_string(), SAMPLE);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper = AssetGuid::parse(&SAMPLE.to_uppercase()).unwrap();
        let lower = AssetGuid::parse(SAMPLE).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), SAMPLE);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let guid = AssetGuid::parse(&format!("  {SAMPLE}\n")).unwrap();
        assert_eq!(guid.as_str(), SAMPLE);
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            AssetGuid::parse("abc"),
            Err(GuidError::Length { len: 3 })
        );
        assert_eq!(AssetGuid::parse(""), Err(GuidError::Length { len: 0 }));
        let too_long = format!("{SAMPLE}0");
        assert_eq!(
            AssetGuid::parse(&too_long),
            Err(GuidError::Length { len: 33 })
        );
    }

    #[test]
    fn test_parse_non_hex() {
        let bad = "6e1f2c3b4a5d49e8b7a6c5d4e3f2a1bz";
        assert_eq!(
            AssetGuid::parse(bad),
            Err(GuidError::InvalidChar {
                position: 31,
                found: 'z'
            })
        );
    }

    #[test]
    fn test_parse_multibyte_counts_chars() {
        // 31 ASCII digits plus one two-byte char: length check passes, hex check fails
        let bad = format!("{}\u{e9}", &SAMPLE[..31]);
        assert!(matches!(
            AssetGuid::parse(&bad),
            Err(GuidError::InvalidChar { position: 31, .. })
        ));
    }

    #[test]
    fn test_is_nil() {
        assert!(AssetGuid::parse(&"0".repeat(32)).unwrap().is_nil());
        assert!(!AssetGuid::parse(SAMPLE).unwrap().is_nil());
    }

    #[test]
    fn test_error_messages() {
        let err = AssetGuid::parse("xyz").unwrap_err();
        assert_eq!(
            err.to_string(),
            "GUID must be 32 hex digits, got 3 characters"
        );
    }

    #[test]
    fn test_serde_roundtrip_and_reject() {
        let guid = AssetGuid::parse(SAMPLE).unwrap();
        let json = serde_json::to_string(&guid).unwrap();
        assert_eq!(json, format!("\"{SAMPLE}\""));

        let bad: Result<AssetGuid, _> = serde_json::from_str("\"not-a-guid\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = AssetGuid::parse(&"0".repeat(32)).unwrap();
        let b = AssetGuid::parse(SAMPLE).unwrap();
        assert!(a < b);
    }
}

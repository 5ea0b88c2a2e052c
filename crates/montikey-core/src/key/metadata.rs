//! Provenance and algorithm metadata attached to every key

use std::{collections::BTreeMap, fmt, str::FromStr};

use thiserror::Error;

/// Text did not match any canonical tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} tag: {tag}")]
pub struct UnknownTag {
    /// Which enum was being parsed
    pub kind: &'static str,
    /// The rejected text
    pub tag: String,
}

/// Where a key's raw material came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySource {
    /// Intercepted short-range wireless payload
    WirelessIntercept,
    /// Cellular identifiers or signal readings
    Cellular,
    /// Mix of a derived key and random injection
    Hybrid,
    /// Supplied by an operator or imported
    Manual,
    /// Generated from environment randomness
    Generated,
}

impl KeySource {
    /// Every source, in declaration order.
    pub const ALL: [Self; 5] =
        [Self::WirelessIntercept, Self::Cellular, Self::Hybrid, Self::Manual, Self::Generated];

    /// Canonical tag used on the wire and in the CLI.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WirelessIntercept => "WIRELESS_INTERCEPT",
            Self::Cellular => "CELLULAR",
            Self::Hybrid => "HYBRID",
            Self::Manual => "MANUAL",
            Self::Generated => "GENERATED",
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeySource {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| UnknownTag { kind: "source", tag: s.to_string() })
    }
}

/// Cipher a key is intended for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmType {
    /// AES with a 128-bit key
    Aes128,
    /// AES with a 256-bit key
    Aes256,
    /// Single DES
    Des,
    /// Triple DES (EDE)
    TripleDes,
    /// MIFARE Classic sector key (6 bytes, no cipher here)
    MifareClassic,
}

impl AlgorithmType {
    /// Every algorithm, in declaration order.
    pub const ALL: [Self; 5] =
        [Self::Aes128, Self::Aes256, Self::Des, Self::TripleDes, Self::MifareClassic];

    /// Canonical tag used on the wire and in the CLI.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes128 => "AES_128",
            Self::Aes256 => "AES_256",
            Self::Des => "DES",
            Self::TripleDes => "TRIPLE_DES",
            Self::MifareClassic => "MIFARE_CLASSIC",
        }
    }

    /// Nominal key length in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes256 => 32,
            Self::Des => 8,
            Self::TripleDes => 24,
            Self::MifareClassic => 6,
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmType {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == s)
            .ok_or_else(|| UnknownTag { kind: "algorithm", tag: s.to_string() })
    }
}

/// Provenance, intended algorithm and free-form info for a key.
///
/// The info map only grows: [`add_info`](Self::add_info) inserts or
/// overwrites, nothing removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMetadata {
    source: KeySource,
    algorithm: AlgorithmType,
    description: String,
    version: u32,
    info: BTreeMap<String, String>,
}

impl KeyMetadata {
    /// Create metadata. New keys start at version 1.
    pub fn new(
        source: KeySource,
        algorithm: AlgorithmType,
        description: impl Into<String>,
        version: u32,
    ) -> Self {
        Self { source, algorithm, description: description.into(), version, info: BTreeMap::new() }
    }

    /// Where the key material came from
    pub fn source(&self) -> KeySource {
        self.source
    }

    /// Intended cipher
    pub fn algorithm(&self) -> AlgorithmType {
        self.algorithm
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Version, incremented on rotation and enhancement
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Insert or overwrite an info entry.
    pub fn add_info(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.info.insert(key.into(), value.into());
    }

    /// Look up one info entry.
    pub fn info(&self, key: &str) -> Option<&str> {
        self.info.get(key).map(String::as_str)
    }

    /// All info entries, ordered by key.
    pub fn all_info(&self) -> &BTreeMap<String, String> {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip() {
        for source in KeySource::ALL {
            assert_eq!(source.to_string().parse::<KeySource>(), Ok(source));
        }
        for algorithm in AlgorithmType::ALL {
            assert_eq!(algorithm.to_string().parse::<AlgorithmType>(), Ok(algorithm));
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "AES_512".parse::<AlgorithmType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown algorithm tag: AES_512");
        assert!("wireless".parse::<KeySource>().is_err());
    }

    #[test]
    fn nominal_key_lengths() {
        assert_eq!(AlgorithmType::Aes128.key_len(), 16);
        assert_eq!(AlgorithmType::MifareClassic.key_len(), 6);
    }

    #[test]
    fn add_info_overwrites_never_removes() {
        let mut metadata =
            KeyMetadata::new(KeySource::Manual, AlgorithmType::Aes128, "operator key", 1);
        metadata.add_info("owner", "alice");
        metadata.add_info("site", "lab");
        metadata.add_info("owner", "bob");

        assert_eq!(metadata.info("owner"), Some("bob"));
        assert_eq!(metadata.info("site"), Some("lab"));
        assert_eq!(metadata.info("missing"), None);
        assert_eq!(metadata.all_info().len(), 2);
    }
}

//! Hex-encoded ledger identifiers.

use std::fmt;
use std::str::FromStr;

/// Errors produced when parsing an [`Address`] or [`TxHash`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address cannot be empty")]
    Empty,
    #[error("expected {expected} hex characters, found {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("address contains non-hex characters")]
    InvalidHex,
}

fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], AddressError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != N * 2 {
        return Err(AddressError::InvalidLength {
            expected: N * 2,
            found: digits.len(),
        });
    }

    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).map_err(|_| AddressError::InvalidHex)?;
    Ok(out)
}

/// A 20-byte account or service address.
///
/// Parsing accepts any letter case (checksummed or not) with or without the `0x`
/// prefix. Equality is on the raw bytes, so two addresses that differ only in case
/// compare equal. Display is always lowercase with a `0x` prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Identifier of a submitted state-changing call.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Address);
string_serde!(TxHash);

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = "0x15a3a036654e09c251783ef6db20b291c2f1f4ae";

    #[test]
    fn parse_is_case_insensitive() {
        let lower: Address = SERVICE.parse().unwrap();
        let upper: Address = "0x15A3A036654E09C251783EF6DB20B291C2F1F4AE".parse().unwrap();
        let unprefixed: Address = "15a3a036654e09c251783ef6db20b291c2f1f4ae".parse().unwrap();

        assert_eq!(lower, upper);
        assert_eq!(lower, unprefixed);
        assert_eq!(upper.to_string(), SERVICE);
    }

    #[test]
    fn rejects_wrong_length_and_bad_digits() {
        assert_eq!(
            "0xabc".parse::<Address>(),
            Err(AddressError::InvalidLength {
                expected: 40,
                found: 3
            })
        );
        assert_eq!(
            format!("0x{}", "zz".repeat(20)).parse::<Address>(),
            Err(AddressError::InvalidHex)
        );
        assert_eq!("   ".parse::<Address>(), Err(AddressError::Empty));
    }

    #[test]
    fn tx_hash_requires_64_digits() {
        let hash = format!("0x{}", "ab".repeat(32));
        let parsed: TxHash = hash.parse().unwrap();
        assert_eq!(parsed.to_string(), hash);
        assert!(SERVICE.parse::<TxHash>().is_err());
    }

    #[test]
    fn address_serializes_as_lowercase_string() {
        let address: Address = "0x15A3A036654E09C251783EF6DB20B291C2F1F4AE".parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{SERVICE}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}

//! Pool identifier
//!
//! A pool is addressed by its 32-byte id (keccak of the pool key on v4-style pool
//! managers). Rendered and parsed as `0x`-prefixed lowercase hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypesError;
use crate::H256;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PoolId(pub [u8; 32]);

impl PoolId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_h256(self) -> H256 {
        H256(self.0)
    }
}

impl From<H256> for PoolId {
    fn from(value: H256) -> Self {
        Self(value.0)
    }
}

impl FromStr for PoolId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidHex {
            kind: "pool id",
            input: s.to_string(),
            expected_len: 32,
        };
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|_| invalid())?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({})", self)
    }
}

impl Serialize for PoolId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PoolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip_and_rejects_short_ids() {
        let id: PoolId = "0x0101010101010101010101010101010101010101010101010101010101010101"
            .parse()
            .unwrap();
        assert_eq!(id, PoolId([1u8; 32]));
        assert_eq!(id.to_string().parse::<PoolId>().unwrap(), id);

        assert!("0x1234".parse::<PoolId>().is_err());
        assert!("not-hex".parse::<PoolId>().is_err());
    }
}

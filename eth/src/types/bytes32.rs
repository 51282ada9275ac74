use ethers::types::H256;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::str::FromStr;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes32(pub H256);

impl Serialize for Bytes32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:#x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&text), &"a 0x-prefixed 32-byte hash"))
    }
}

impl Bytes32 {
    pub fn zero() -> Self {
        Self(H256::zero())
    }
}

impl From<H256> for Bytes32 {
    fn from(value: H256) -> Self {
        Self(value)
    }
}

impl From<Bytes32> for H256 {
    fn from(value: Bytes32) -> Self {
        value.0
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(value: [u8; 32]) -> Self {
        Bytes32(H256(value))
    }
}

impl FromStr for Bytes32 {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        H256::from_str(s.trim_start_matches("0x"))
            .map(Bytes32)
            .map_err(|err| anyhow::anyhow!("invalid hash {s}: {err}"))
    }
}

/// This is only useful for testing!
impl From<u64> for Bytes32 {
    fn from(value: u64) -> Self {
        let mut new_array: [u8; 32] = [0; 32];
        new_array[24..].copy_from_slice(&value.to_be_bytes());
        Self(H256(new_array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string() {
        let hash = Bytes32::from(42u64);
        let text = format!("{:#x}", H256::from(hash));
        assert_eq!(Bytes32::from_str(&text).unwrap(), hash);
    }
}

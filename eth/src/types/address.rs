use ethers::types::H160;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

/// An address. Can be an EOA or a smart contract address.
///
/// Canonical textual form is lower-case hex with a `0x` prefix (§3); this
/// is the only representation that ever reaches `store`, so address
/// equality there reduces to string/row-id equality rather than
/// case-insensitive comparison.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct Address(pub H160);

/// Burn addresses: tokens sent here are conventionally considered retired.
pub const BURN_ADDRESSES: [Address; 2] = [
    Address(H160([0u8; 20])),
    Address(H160([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
    ])),
];

/// Sentinel standing in for "no recipient" (contract-creation transactions),
/// so that store-level joins use plain equality instead of NULL-aware
/// three-valued logic. Never produced by a real deployment's trace.
pub const ABSENT_RECIPIENT: Address = Address(H160([0xff; 20]));

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Address")
            .field(&format_args!("{}", self))
            .finish()
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Address {
    pub fn zero() -> Self {
        Self(H160::zero())
    }

    pub fn is_burn(&self) -> bool {
        BURN_ADDRESSES.contains(self)
    }

    pub fn is_absent(&self) -> bool {
        *self == ABSENT_RECIPIENT
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<H160> for Address {
    fn from(value: H160) -> Self {
        Self(value)
    }
}

impl From<Address> for H160 {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(value: [u8; 20]) -> Self {
        Self(H160(value))
    }
}

/// This is a lazy constructor only for testing.
impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(H160::from_low_u64_be(value))
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        H160::from_str(s.trim_start_matches("0x"))
            .map(Address)
            .map_err(|err| anyhow::anyhow!("invalid address {s}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_display_is_lowercase() {
        let addr = Address::from_str("0x57F1887A8BF19B14FC0DF6FD9B2ACC9AF147EA85").unwrap();
        assert_eq!(
            addr.to_string(),
            "0x57f1887a8bf19b14fc0df6fd9b2acc9af147ea85"
        );
    }

    #[test]
    fn burn_and_absent_are_distinct() {
        assert!(Address::zero().is_burn());
        assert!(!ABSENT_RECIPIENT.is_burn());
        assert!(ABSENT_RECIPIENT.is_absent());
        assert!(!Address::zero().is_absent());
    }
}

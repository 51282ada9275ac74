use bigdecimal::{BigDecimal, Num, Zero};
use ethers::types::U256 as EthersU256;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A 256-bit unsigned integer, losslessly round-tripped through decimal
/// strings at every persistence and wire boundary (§3, §9: "Big integers").
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256(pub EthersU256);

impl Display for U256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct U256Visitor;

        impl<'de> de::Visitor<'de> for U256Visitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string representing U256")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map(U256)
                    .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_str(U256Visitor)
    }
}

impl From<EthersU256> for U256 {
    fn from(value: EthersU256) -> Self {
        Self(value)
    }
}

impl From<U256> for EthersU256 {
    fn from(value: U256) -> Self {
        value.0
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        U256(EthersU256::from(value))
    }
}

impl U256 {
    pub fn zero() -> Self {
        Self(EthersU256::zero())
    }

    pub fn from_dec_str(value: &str) -> Result<Self, anyhow::Error> {
        EthersU256::from_dec_str(value)
            .map(U256)
            .map_err(|err| anyhow::anyhow!("invalid decimal u256 {value}: {err}"))
    }

    /// A signed, arbitrary-precision view used for net-balance arithmetic
    /// (SilentMint needs to observe negative balances).
    pub fn to_big_decimal(self) -> BigDecimal {
        BigDecimal::from_str_radix(&self.0.to_string(), 10).expect("u256 is decimal")
    }
}

impl FromStr for U256 {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dec_str(s)
    }
}

pub fn signed_zero() -> BigDecimal {
    BigDecimal::zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trip() {
        let big = "111122223333444455556666777788889999";
        let value = U256::from_dec_str(big).unwrap();
        assert_eq!(value.to_string(), big);
        assert_eq!(U256::from_str(&value.to_string()).unwrap(), value);
    }

    #[test]
    fn serde_round_trip() {
        let value = U256::from(12345u64);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"12345\"");
        let back: U256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn max_value_round_trips() {
        let max = U256(EthersU256::MAX);
        assert_eq!(U256::from_dec_str(&max.to_string()).unwrap(), max);
    }
}

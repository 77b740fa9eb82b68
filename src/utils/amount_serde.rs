//! Serde adapter for amounts written as decimal or `0x` hex strings in TOML.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let raw = String::deserialize(deserializer)?;
    U256::from_str(raw.trim()).map_err(|e| serde::de::Error::custom(format!("invalid amount {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        amount: U256,
    }

    #[test]
    fn test_decimal_and_hex() {
        let parsed: Wrapper = toml::from_str(r#"amount = "100000000000000000""#).unwrap();
        assert_eq!(parsed.amount, U256::from(100_000_000_000_000_000u64));

        let parsed: Wrapper = toml::from_str(r#"amount = "0x10""#).unwrap();
        assert_eq!(parsed.amount, U256::from(16));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(toml::from_str::<Wrapper>(r#"amount = "ten""#).is_err());
    }

    #[test]
    fn test_serializes_as_decimal() {
        let out = toml::to_string(&Wrapper { amount: U256::from(42) }).unwrap();
        assert_eq!(out.trim(), r#"amount = "42""#);
    }
}

//! Build options
//!
//! What to build comes from the payload; these options say how:
//! explicit nonce and fee override what would otherwise be inferred.

use crate::codec::parse_uint;
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer};

/// Deserialize an optional big integer from a number or decimal string
fn deserialize_opt_biguint<'de, D>(deserializer: D) -> Result<Option<BigUint>, D::Error>
where
    D: Deserializer<'de>,
{
    struct BigUintVisitor;

    impl<'de> de::Visitor<'de> for BigUintVisitor {
        type Value = Option<BigUint>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a non-negative integer as number or string")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(BigUintVisitor)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(BigUint::from(value)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(value)
                .map(|v| Some(BigUint::from(v)))
                .map_err(|_| E::custom("negative values not allowed"))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            // JS numbers arrive as f64 through serde-wasm-bindgen
            if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
                Ok(Some(BigUint::from(value as u64)))
            } else {
                Err(E::custom(format!("not a non-negative integer: {}", value)))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_uint(value, 10)
                .map(Some)
                .ok_or_else(|| E::custom(format!("invalid integer: {}", value)))
        }
    }

    deserializer.deserialize_option(BigUintVisitor)
}

/// How to build: explicit values instead of node-inferred ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOptions {
    /// Explicit nonce; inferred from the node when absent
    #[serde(default, deserialize_with = "deserialize_opt_biguint")]
    pub nonce: Option<BigUint>,
    /// Explicit fee in micro-STX; estimated from the node when absent
    #[serde(default, deserialize_with = "deserialize_opt_biguint")]
    pub fee: Option<BigUint>,
}

impl TxOptions {
    pub fn with_nonce(mut self, nonce: impl Into<BigUint>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_fee(mut self, fee: impl Into<BigUint>) -> Self {
        self.fee = Some(fee.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_numbers_and_strings() {
        let opts: TxOptions = serde_json::from_str(r#"{ "nonce": 5, "fee": "180" }"#).unwrap();
        assert_eq!(opts.nonce, Some(BigUint::from(5u32)));
        assert_eq!(opts.fee, Some(BigUint::from(180u32)));
    }

    #[test]
    fn test_options_absent_and_null() {
        let opts: TxOptions = serde_json::from_str(r#"{ "nonce": null }"#).unwrap();
        assert_eq!(opts, TxOptions::default());
    }

    #[test]
    fn test_lenient_integer_strings_rejected() {
        assert!(serde_json::from_str::<TxOptions>(r#"{ "fee": "1_000" }"#).is_err());
        assert!(serde_json::from_str::<TxOptions>(r#"{ "nonce": "+5" }"#).is_err());
    }

    #[test]
    fn test_negative_nonce_rejected() {
        assert!(serde_json::from_str::<TxOptions>(r#"{ "nonce": -1 }"#).is_err());
    }
}

//! 256-bit unsigned token amounts.
//!
//! Every monetary quantity in OTCSwap is an integer in the token's smallest
//! native unit. Arithmetic on the money path goes through the `checked_*`
//! helpers below so an overflow surfaces as [`OtcError::ArithmeticOverflow`]
//! instead of wrapping.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{OtcError, Result};

pub use wide::U256;

// construct_uint! expands to code that names `Result<T, E>`, so it lives
// apart from the crate's one-parameter alias.
#[allow(unsafe_code)]
#[allow(clippy::manual_div_ceil)]
#[allow(clippy::assign_op_pattern)]
#[allow(clippy::pedantic)]
mod wide {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer.
        pub struct U256(4);
    }
}

/// A token amount in the token's smallest unit.
pub type Amount = U256;

/// Overflow-checked addition, tagged with the operation name for the error.
pub fn checked_add(a: Amount, b: Amount, op: &'static str) -> Result<Amount> {
    a.checked_add(b).ok_or(OtcError::ArithmeticOverflow { op })
}

/// Overflow-checked multiplication.
pub fn checked_mul(a: Amount, b: Amount, op: &'static str) -> Result<Amount> {
    a.checked_mul(b).ok_or(OtcError::ArithmeticOverflow { op })
}

/// `floor(a * b / c)`, truncating toward zero.
///
/// Returns `None` when `c` is zero so callers can pick a domain error.
pub fn mul_div_floor(a: Amount, b: Amount, c: Amount, op: &'static str) -> Result<Option<Amount>> {
    if c.is_zero() {
        return Ok(None);
    }
    let product = checked_mul(a, b, op)?;
    Ok(Some(product / c))
}

// Amounts travel as decimal strings so JSON consumers never lose precision.
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw)
            .map_err(|e| serde::de::Error::custom(format!("invalid amount {raw:?}: {e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_detects_overflow() {
        let err = checked_add(Amount::MAX, Amount::one(), "test").unwrap_err();
        assert!(matches!(err, OtcError::ArithmeticOverflow { op: "test" }));
        assert_eq!(
            checked_add(Amount::from(2u64), Amount::from(3u64), "test").unwrap(),
            Amount::from(5u64)
        );
    }

    #[test]
    fn mul_div_truncates_toward_zero() {
        // 1000 * 333 / 500 = 666.0 exactly; 1000 * 333 / 501 = 664.67 -> 664
        let q = mul_div_floor(
            Amount::from(1000u64),
            Amount::from(333u64),
            Amount::from(501u64),
            "fill",
        )
        .unwrap();
        assert_eq!(q, Some(Amount::from(664u64)));
    }

    #[test]
    fn mul_div_zero_divisor_is_none() {
        let q = mul_div_floor(Amount::one(), Amount::one(), Amount::zero(), "fill").unwrap();
        assert_eq!(q, None);
    }

    #[test]
    fn mul_div_overflowing_product_errors() {
        let err = mul_div_floor(Amount::MAX, Amount::from(2u64), Amount::from(2u64), "fill")
            .unwrap_err();
        assert!(matches!(err, OtcError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let big = Amount::from(u128::MAX) * Amount::from(10u64);
        let json = serde_json::to_string(&big).unwrap();
        assert_eq!(json, format!("\"{big}\""));
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, big);
    }

    #[test]
    fn serde_rejects_garbage() {
        assert!(serde_json::from_str::<Amount>("\"12ab\"").is_err());
    }
}

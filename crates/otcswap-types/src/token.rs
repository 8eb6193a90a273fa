//! Allowlist entries.
//!
//! An [`AllowedToken`] is created by the administrator and only ever toggled
//! to disabled afterwards; its ledger handle and decimals never change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, TokenId, TokenRef};

/// A token permitted to appear on either side of an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedToken {
    pub id: TokenId,
    pub name: String,
    /// Ledger the token lives in. Immutable once created.
    pub ledger: TokenRef,
    /// Display metadata only; never used in arithmetic.
    pub decimals: u8,
    pub enabled: bool,
}

impl AllowedToken {
    /// Render `amount` in whole-token units, e.g. `1500` at 3 decimals is `1.500`.
    ///
    /// Returns `None` when the amount does not fit a `Decimal` (96-bit
    /// mantissa) or `decimals` exceeds its maximum scale.
    #[must_use]
    pub fn to_decimal(&self, amount: Amount) -> Option<Decimal> {
        if amount.bits() > 96 {
            return None;
        }
        let raw = i128::try_from(amount.low_u128()).ok()?;
        Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals)).ok()
    }
}

impl std::fmt::Display for AllowedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.enabled { "enabled" } else { "disabled" };
        write!(f, "{} {} @ {} ({state})", self.id, self.name, self.ledger)
    }
}

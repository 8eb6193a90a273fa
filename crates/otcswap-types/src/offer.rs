//! Offer model.
//!
//! ## State Machine
//!
//! ```text
//!   partial fill / update (lister)
//!        ┌──────────┐
//!        ▼          │
//!   ┌────────┐──────┘  fill to zero  ┌───────────┐
//!   │ ACTIVE ├───────────────────────▶│ COMPLETED │
//!   └───┬────┘                        └───────────┘
//!       │ cancel (lister)
//!       ▼
//!   ┌─────────┐
//!   │ REVOKED │
//!   └─────────┘
//! ```
//!
//! Terminal states never change again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, OfferId, OtcError, Result, TokenId, mul_div_floor};

/// Lifecycle status of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferStatus {
    Active,
    Completed,
    Revoked,
}

impl OfferStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Can an offer in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Active | Self::Completed | Self::Revoked)
        )
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Revoked => write!(f, "REVOKED"),
        }
    }
}

/// Terms a lister submits when making an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub send_token: TokenId,
    pub send_amount: Amount,
    pub receive_token: TokenId,
    pub receive_amount: Amount,
    pub min_receive_amount: Amount,
}

/// A standing, partially fillable offer to swap `send_amount` of one token
/// for `receive_amount` of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub send_token: TokenId,
    /// Escrowed amount still available to fillers.
    pub send_amount: Amount,
    pub receive_token: TokenId,
    /// Amount the lister still wants to receive.
    pub receive_amount: Amount,
    /// Smallest fill accepted.
    pub min_receive_amount: Amount,
    pub lister: Identity,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    #[must_use]
    pub fn new(id: OfferId, terms: &OfferTerms, lister: Identity) -> Self {
        let now = Utc::now();
        Self {
            id,
            send_token: terms.send_token,
            send_amount: terms.send_amount,
            receive_token: terms.receive_token,
            receive_amount: terms.receive_amount,
            min_receive_amount: terms.min_receive_amount,
            lister,
            status: OfferStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == OfferStatus::Active
    }

    /// Send-token amount a filler receives for paying `amount`:
    /// `floor(send_amount * amount / receive_amount)`.
    ///
    /// Truncation favours the lister; it is never rounded to nearest.
    ///
    /// # Errors
    /// - `EmptyOffer` if `receive_amount` is zero
    /// - `ArithmeticOverflow` if the product overflows 256 bits
    pub fn proportional_send(&self, amount: Amount) -> Result<Amount> {
        mul_div_floor(self.send_amount, amount, self.receive_amount, "proportional fill")?
            .ok_or(OtcError::EmptyOffer(self.id))
    }

    /// Apply a fill of `amount` that pays out `filled_send`.
    ///
    /// Completes the offer when nothing is left to receive; otherwise lowers
    /// the minimum to the remainder if the remainder dropped below it, so a
    /// dust-sized tail stays fillable.
    ///
    /// Callers must have checked `amount <= receive_amount`.
    pub fn apply_fill(&mut self, amount: Amount, filled_send: Amount) {
        self.send_amount -= filled_send;
        self.receive_amount -= amount;
        if self.receive_amount.is_zero() {
            self.status = OfferStatus::Completed;
        } else if self.receive_amount < self.min_receive_amount {
            self.min_receive_amount = self.receive_amount;
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Offer {
    pub fn dummy(send_amount: u64, receive_amount: u64, min_receive_amount: u64) -> Self {
        Self::new(
            OfferId(0),
            &OfferTerms {
                send_token: TokenId(0),
                send_amount: Amount::from(send_amount),
                receive_token: TokenId(1),
                receive_amount: Amount::from(receive_amount),
                min_receive_amount: Amount::from(min_receive_amount),
            },
            Identity::from_label("lister"),
        )
    }
}

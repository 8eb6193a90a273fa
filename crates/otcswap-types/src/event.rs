//! Notifications emitted for external indexers.
//!
//! Events are published only after the whole operation succeeded; a rolled
//! back operation emits nothing.

use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, OfferId, TokenId, TokenRef};

/// A committed change to the allowlist or to an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferEvent {
    TokenAllowed {
        token_id: TokenId,
        name: String,
        ledger: TokenRef,
        decimals: u8,
    },
    TokenDisabled {
        token_id: TokenId,
    },
    OfferCreated {
        offer_id: OfferId,
        creator: Identity,
        send_token: TokenId,
        send_amount: Amount,
        receive_token: TokenId,
        receive_amount: Amount,
        min_receive_amount: Amount,
    },
    OfferAccepted {
        offer_id: OfferId,
        filler: Identity,
        amount: Amount,
        filled_send: Amount,
        fee: Amount,
    },
    OfferCompleted {
        offer_id: OfferId,
    },
    OfferRevoked {
        offer_id: OfferId,
        refunded: Amount,
    },
    OfferUpdated {
        offer_id: OfferId,
        receive_amount: Amount,
        min_receive_amount: Amount,
    },
}

impl OfferEvent {
    /// The offer this event concerns, if any.
    #[must_use]
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            Self::TokenAllowed { .. } | Self::TokenDisabled { .. } => None,
            Self::OfferCreated { offer_id, .. }
            | Self::OfferAccepted { offer_id, .. }
            | Self::OfferCompleted { offer_id }
            | Self::OfferRevoked { offer_id, .. }
            | Self::OfferUpdated { offer_id, .. } => Some(*offer_id),
        }
    }

    /// Short, stable name used as a log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenAllowed { .. } => "token_allowed",
            Self::TokenDisabled { .. } => "token_disabled",
            Self::OfferCreated { .. } => "offer_created",
            Self::OfferAccepted { .. } => "offer_accepted",
            Self::OfferCompleted { .. } => "offer_completed",
            Self::OfferRevoked { .. } => "offer_revoked",
            Self::OfferUpdated { .. } => "offer_updated",
        }
    }
}

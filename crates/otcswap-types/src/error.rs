//! Error types for the OTCSwap offer escrow.
//!
//! All errors use the `OTC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Allowlist / authorization errors
//! - 2xx: Offer lifecycle errors
//! - 3xx: Funding (balance / allowance) errors
//! - 4xx: Ledger errors
//! - 5xx: Arithmetic errors
//! - 9xx: General / internal errors
//!
//! Every precondition failure aborts the operation with no partial effect.

use thiserror::Error;

use crate::{Amount, Identity, OfferId, OfferStatus, TokenId, TokenRef};

/// Rejection reported by a token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger balance too low: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("ledger allowance too low: need {needed}, have {available}")]
    InsufficientAllowance { needed: Amount, available: Amount },

    #[error("ledger credit would overflow")]
    Overflow,

    /// The ledger (or a hook attached to it) refused the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Central error enum for all OTCSwap operations.
#[derive(Debug, Error)]
pub enum OtcError {
    // =================================================================
    // Allowlist / Authorization Errors (1xx)
    // =================================================================
    /// One side of an offer references a token that is not enabled.
    #[error("OTC_ERR_100: Token not allowed: {0}")]
    TokenNotAllowed(TokenId),

    /// The token id is out of range, or already disabled.
    #[error("OTC_ERR_101: Invalid token: {0}")]
    InvalidToken(TokenId),

    /// The caller does not hold the administrator capability.
    #[error("OTC_ERR_102: Unauthorized caller {caller}")]
    Unauthorized { caller: Identity },

    // =================================================================
    // Offer Errors (2xx)
    // =================================================================
    /// The offer id was never assigned.
    #[error("OTC_ERR_200: Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// The offer exists but is no longer Active.
    #[error("OTC_ERR_201: Offer {offer_id} unavailable (status {status})")]
    OfferUnavailable { offer_id: OfferId, status: OfferStatus },

    /// `minReceiveAmount` exceeds `receiveAmount` at creation.
    #[error("OTC_ERR_202: Invalid minimum: min {min_receive} > receive {receive}")]
    InvalidMinimum { min_receive: Amount, receive: Amount },

    /// Fill amount exceeds what the offer still wants to receive.
    #[error("OTC_ERR_203: Amount {amount} exceeds offer remainder {remaining}")]
    AmountExceedsOffer { amount: Amount, remaining: Amount },

    /// Fill amount is below the offer's minimum fill.
    #[error("OTC_ERR_204: Amount {amount} below minimum {minimum}")]
    BelowMinimum { amount: Amount, minimum: Amount },

    /// Only the lister may cancel or update an offer.
    #[error("OTC_ERR_205: {caller} is not the lister of {offer_id}")]
    NotLister { offer_id: OfferId, caller: Identity },

    /// An Active offer with nothing left to receive cannot be filled.
    #[error("OTC_ERR_206: Offer {0} has a zero receive amount")]
    EmptyOffer(OfferId),

    // =================================================================
    // Funding Errors (3xx)
    // =================================================================
    /// The caller's ledger balance does not cover amount + fee.
    #[error("OTC_ERR_300: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The caller's allowance to the escrow does not cover amount + fee.
    #[error("OTC_ERR_301: Insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: Amount, available: Amount },

    // =================================================================
    // Ledger Errors (4xx)
    // =================================================================
    /// A ledger transfer failed; the operation was rolled back.
    #[error("OTC_ERR_400: Ledger {token} failed: {source}")]
    Ledger {
        token: TokenRef,
        #[source]
        source: LedgerError,
    },

    /// No ledger is registered under this handle.
    #[error("OTC_ERR_401: Unknown ledger: {0}")]
    UnknownLedger(TokenRef),

    /// A mutating call re-entered the engine from inside a ledger callback.
    #[error("OTC_ERR_402: Re-entrant call rejected")]
    ReentrantCall,

    // =================================================================
    // Arithmetic Errors (5xx)
    // =================================================================
    /// A checked addition or multiplication overflowed 256 bits.
    #[error("OTC_ERR_500: Arithmetic overflow in {op}")]
    ArithmeticOverflow { op: &'static str },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OTC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OTC_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, inconsistent values, etc.).
    #[error("OTC_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OtcError>;

impl From<serde_json::Error> for OtcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = OtcError::OfferNotFound(OfferId(4));
        let msg = format!("{err}");
        assert!(msg.starts_with("OTC_ERR_200"), "Got: {msg}");
        assert!(msg.contains("offer:4"));
    }

    #[test]
    fn insufficient_balance_display() {
        let err = OtcError::InsufficientBalance {
            needed: Amount::from(1002u64),
            available: Amount::from(1000u64),
        };
        let msg = format!("{err}");
        assert!(msg.contains("OTC_ERR_300"));
        assert!(msg.contains("1002"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn ledger_error_keeps_source() {
        let err = OtcError::Ledger {
            token: TokenRef::new("TKA"),
            source: LedgerError::Rejected("hook said no".into()),
        };
        let msg = format!("{err}");
        assert!(msg.contains("TKA"));
        assert!(msg.contains("hook said no"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn all_errors_have_otc_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(OtcError::TokenNotAllowed(TokenId(1))),
            Box::new(OtcError::OfferUnavailable {
                offer_id: OfferId(0),
                status: OfferStatus::Revoked,
            }),
            Box::new(OtcError::ReentrantCall),
            Box::new(OtcError::ArithmeticOverflow { op: "fee" }),
            Box::new(OtcError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OTC_ERR_"),
                "Error missing OTC_ERR_ prefix: {msg}"
            );
        }
    }
}

//! Configuration types for an OTCSwap desk.

use serde::{Deserialize, Serialize};

use crate::{Identity, OtcError, Result, constants};

/// Protocol fee as a rational `numerator / denominator`, applied with floor
/// division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub numerator: u64,
    pub denominator: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            numerator: constants::FEE_NUMERATOR,
            denominator: constants::FEE_DENOMINATOR,
        }
    }
}

/// Configuration for a single desk (engine instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Holder of the administrator capability (allowlist mutations).
    pub admin: Identity,
    /// Account that custodies escrowed send tokens; spender of all pulls.
    pub escrow: Identity,
    /// Destination of every protocol fee.
    pub fee_recipient: Identity,
    #[serde(default)]
    pub fee: FeeSchedule,
}

impl DeskConfig {
    #[must_use]
    pub fn new(admin: Identity, escrow: Identity, fee_recipient: Identity) -> Self {
        Self {
            admin,
            escrow,
            fee_recipient,
            fee: FeeSchedule::default(),
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Configuration` for a zero denominator, a fee above 100%, or
    /// an escrow that doubles as fee recipient.
    pub fn validate(&self) -> Result<()> {
        if self.fee.denominator == 0 {
            return Err(OtcError::Configuration("fee denominator must be > 0".into()));
        }
        if self.fee.numerator > self.fee.denominator {
            return Err(OtcError::Configuration(format!(
                "fee {}/{} exceeds 100%",
                self.fee.numerator, self.fee.denominator
            )));
        }
        if self.escrow == self.fee_recipient {
            return Err(OtcError::Configuration(
                "escrow and fee recipient must be distinct accounts".into(),
            ));
        }
        Ok(())
    }
}

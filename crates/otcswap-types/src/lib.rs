//! # otcswap-types
//!
//! Shared types, errors, and configuration for the **OTCSwap** offer escrow.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Amounts**: [`Amount`] (256-bit unsigned, overflow-checked on the money path)
//! - **Identifiers**: [`TokenId`], [`OfferId`], [`Identity`], [`TokenRef`]
//! - **Allowlist model**: [`AllowedToken`]
//! - **Offer model**: [`Offer`], [`OfferStatus`], [`OfferTerms`]
//! - **Notifications**: [`OfferEvent`]
//! - **Configuration**: [`DeskConfig`], [`FeeSchedule`]
//! - **Errors**: [`OtcError`] with `OTC_ERR_` prefix codes, [`LedgerError`]
//! - **Constants**: fee defaults and engine metadata

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod offer;
pub mod token;

// Re-export all primary types at crate root for ergonomic imports:
//   use otcswap_types::{Amount, Offer, OfferStatus, OtcError, ...};

pub use amount::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use offer::*;
pub use token::*;

// Constants are accessed via `otcswap_types::constants::FOO`
// (not re-exported to avoid name collisions).

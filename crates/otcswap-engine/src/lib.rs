//! # otcswap-engine
//!
//! The **offer escrow engine**: listers escrow a send token and name a price
//! in a receive token; fillers take any slice between the offer's minimum and
//! its remainder and receive a proportional share of the escrow.
//!
//! ## Architecture
//!
//! 1. **[`AllowlistRegistry`]**: admin-managed, append-only token allowlist
//! 2. **[`FeeCalculator`]**: `floor(amount * 25 / 10_000)` protocol fee
//! 3. **[`OfferStore`]**: append-only offers, all-or-nothing mutation
//! 4. **[`OfferMatcher`]**: make / accept / cancel / update, planned as
//!    state change first, ledger legs second
//! 5. **[`OtcDesk`]**: thread-safe facade with re-entrancy rejection and
//!    rollback of failed legs
//! 6. **[`NotificationSink`]**: receives events of committed operations
//!
//! ```text
//! caller ──▶ OtcDesk ──▶ OfferMatcher::plan_* ──▶ Settlement legs ──▶ Ledger
//!                                                       │
//!                               finish / abort ◀────────┘
//! ```

pub mod allowlist;
pub mod desk;
pub mod fee;
pub mod matcher;
pub mod notify;
pub mod offer_store;
pub mod settlement;

pub use allowlist::AllowlistRegistry;
pub use desk::OtcDesk;
pub use fee::{Charge, FeeCalculator};
pub use matcher::{Fill, OfferMatcher};
pub use notify::{MemorySink, NotificationSink, NullSink, TracingSink};
pub use offer_store::{Committed, OfferStore};
pub use settlement::{LegKind, Settlement, TransferLeg};

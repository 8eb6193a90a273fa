//! # otcswap-ledger
//!
//! The **token ledger** collaborator the escrow engine settles against.
//!
//! ## Architecture
//!
//! 1. **[`Ledger`]**: balance / allowance / transfer contract of one token
//! 2. **[`LedgerDirectory`]**: resolves a [`TokenRef`] to a live ledger
//! 3. **[`InMemoryLedger`]**: reference ledger with mint/approve, transfer
//!    history, supply conservation and an optional transfer hook
//!
//! All amounts are integers in the token's smallest unit.

pub mod directory;
pub mod memory;

pub use directory::LedgerDirectory;
pub use memory::{InMemoryLedger, TransferHook, TransferRecord};

use otcswap_types::{Amount, Identity, LedgerError, TokenRef};

/// Balance and transfer contract of a single token.
///
/// The account on whose behalf a call is made (`spender` for pulls, `from`
/// for direct transfers) is explicit. Implementations may call back into
/// arbitrary code while transferring; callers must treat every transfer as
/// a potential re-entry point.
pub trait Ledger: Send + Sync {
    /// Handle this ledger is registered under.
    fn token_ref(&self) -> TokenRef;

    fn balance_of(&self, who: &Identity) -> Amount;

    /// Amount `spender` may still pull from `owner`.
    fn allowance(&self, owner: &Identity, spender: &Identity) -> Amount;

    /// Move `amount` from `owner` to `to`, consuming `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Identity,
        owner: &Identity,
        to: &Identity,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Move `amount` of `from`'s own balance to `to`.
    fn transfer(&self, from: &Identity, to: &Identity, amount: Amount) -> Result<(), LedgerError>;
}

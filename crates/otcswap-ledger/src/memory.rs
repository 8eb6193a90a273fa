//! In-memory reference ledger.
//!
//! Tracks per-account balances and per-(owner, spender) allowances for a
//! single token. Every mutation is atomic: either the full transfer applies
//! or the book is unchanged.
//!
//! Supply conservation holds after every operation:
//! ```text
//! Σ balances == Σ minted
//! ```
//!
//! An optional [`TransferHook`] runs before each transfer is applied, with the
//! book lock released, so it may call back into whatever issued the transfer.
//! Returning an error from the hook vetoes the transfer.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use otcswap_types::{Amount, Identity, LedgerError, TokenRef};

use crate::Ledger;

/// One applied transfer, in ledger order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub token: TokenRef,
    /// Set for `transfer_from` pulls.
    pub spender: Option<Identity>,
    pub from: Identity,
    pub to: Identity,
    pub amount: Amount,
}

/// Callback run before a transfer is applied.
pub type TransferHook = Arc<dyn Fn(&TransferRecord) -> Result<(), LedgerError> + Send + Sync>;

struct Book {
    balances: HashMap<Identity, Amount>,
    allowances: HashMap<(Identity, Identity), Amount>,
    minted: Amount,
    history: Vec<TransferRecord>,
}

impl Book {
    fn new() -> Self {
        Self {
            balances: HashMap::new(),
            allowances: HashMap::new(),
            minted: Amount::zero(),
            history: Vec::new(),
        }
    }

    fn balance(&self, who: &Identity) -> Amount {
        self.balances.get(who).copied().unwrap_or(Amount::zero())
    }

    fn allowance(&self, owner: &Identity, spender: &Identity) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Amount::zero())
    }

    fn check_debit(&self, from: &Identity, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    fn check_allowance(
        &self,
        owner: &Identity,
        spender: &Identity,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.allowance(owner, spender);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Debit `from` and credit `to`. Validates before touching anything.
    fn move_funds(&mut self, from: &Identity, to: &Identity, amount: Amount) -> Result<(), LedgerError> {
        self.check_debit(from, amount)?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let debited = self.balance(from) - amount;
        self.balances.insert(*from, debited);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

/// Single-token ledger held entirely in memory.
pub struct InMemoryLedger {
    token: TokenRef,
    book: Mutex<Book>,
    hook: Mutex<Option<TransferHook>>,
}

impl InMemoryLedger {
    /// Create an empty ledger registered under `handle`.
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            token: TokenRef::new(handle),
            book: Mutex::new(Book::new()),
            hook: Mutex::new(None),
        }
    }

    // The book is updated in single validated steps, so a panic elsewhere
    // cannot leave it half-written.
    fn book(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `amount` new tokens in `to`'s balance.
    ///
    /// # Errors
    /// Returns `Overflow` if the balance or total supply would exceed 256 bits.
    pub fn mint(&self, to: &Identity, amount: Amount) -> Result<(), LedgerError> {
        let mut book = self.book();
        let minted = book.minted.checked_add(amount).ok_or(LedgerError::Overflow)?;
        let balance = book.balance(to).checked_add(amount).ok_or(LedgerError::Overflow)?;
        book.minted = minted;
        book.balances.insert(*to, balance);
        Ok(())
    }

    /// Set (not add to) the amount `spender` may pull from `owner`.
    pub fn approve(&self, owner: &Identity, spender: &Identity, amount: Amount) {
        self.book().allowances.insert((*owner, *spender), amount);
    }

    /// Install a hook run before every transfer; replaces any previous hook.
    pub fn set_hook(&self, hook: TransferHook) {
        *self.hook.lock().unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    pub fn clear_hook(&self) {
        *self.hook.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Total minted supply.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.book().minted
    }

    /// Whether the sum of all balances still equals the minted supply.
    #[must_use]
    pub fn supply_conserved(&self) -> bool {
        let book = self.book();
        let circulating = book
            .balances
            .values()
            .try_fold(Amount::zero(), |acc, b| acc.checked_add(*b));
        circulating == Some(book.minted)
    }

    /// Applied transfers, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<TransferRecord> {
        self.book().history.clone()
    }

    fn run_hook(&self, record: &TransferRecord) -> Result<(), LedgerError> {
        // Clone out so the hook runs with no ledger lock held.
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match hook {
            Some(hook) => hook(record),
            None => Ok(()),
        }
    }
}

impl Ledger for InMemoryLedger {
    fn token_ref(&self) -> TokenRef {
        self.token.clone()
    }

    fn balance_of(&self, who: &Identity) -> Amount {
        self.book().balance(who)
    }

    fn allowance(&self, owner: &Identity, spender: &Identity) -> Amount {
        self.book().allowance(owner, spender)
    }

    fn transfer_from(
        &self,
        spender: &Identity,
        owner: &Identity,
        to: &Identity,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let record = TransferRecord {
            token: self.token.clone(),
            spender: Some(*spender),
            from: *owner,
            to: *to,
            amount,
        };
        {
            let book = self.book();
            book.check_allowance(owner, spender, amount)?;
            book.check_debit(owner, amount)?;
        }

        self.run_hook(&record)?;

        // The hook may have moved funds; validate again under the lock.
        let mut book = self.book();
        book.check_allowance(owner, spender, amount)?;
        book.move_funds(owner, to, amount)?;
        let remaining = book.allowance(owner, spender) - amount;
        book.allowances.insert((*owner, *spender), remaining);
        book.history.push(record);
        tracing::debug!(
            token = %self.token,
            from = %owner,
            to = %to,
            amount = %amount,
            "Ledger transfer_from applied"
        );
        Ok(())
    }

    fn transfer(&self, from: &Identity, to: &Identity, amount: Amount) -> Result<(), LedgerError> {
        let record = TransferRecord {
            token: self.token.clone(),
            spender: None,
            from: *from,
            to: *to,
            amount,
        };
        self.book().check_debit(from, amount)?;

        self.run_hook(&record)?;

        let mut book = self.book();
        book.move_funds(from, to, amount)?;
        book.history.push(record);
        tracing::debug!(
            token = %self.token,
            from = %from,
            to = %to,
            amount = %amount,
            "Ledger transfer applied"
        );
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("token", &self.token)
            .field("supply", &self.total_supply())
            .finish_non_exhaustive()
    }
}

//! Ledger legs of a settled operation.
//!
//! The matcher plans every operation as a list of [`TransferLeg`]s plus a
//! state change that has either already been committed (accept, cancel,
//! update) or is held back until the legs succeed (make). Legs run in order
//! with no engine lock held, because a ledger may call back into the desk.
//!
//! If a leg fails, the legs that already ran and moved funds *into* escrow
//! are reversed by pushing them back from escrow. Legs that paid a third
//! party cannot be pulled back by the engine; they are reported with
//! `tracing::error!` so an operator can reconcile.

use std::sync::Arc;

use otcswap_ledger::Ledger;
use otcswap_types::{Amount, Identity, Offer, OfferEvent, OtcError, Result, TokenRef};

/// Direction of a leg relative to escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    /// `transfer_from(escrow, owner, to)`: consumes `owner`'s allowance.
    Pull { owner: Identity },
    /// `transfer(escrow, to)`: pays out of escrowed funds.
    Push,
}

/// One token movement.
#[derive(Clone)]
pub struct TransferLeg {
    pub ledger: Arc<dyn Ledger>,
    pub kind: LegKind,
    pub to: Identity,
    pub amount: Amount,
}

impl TransferLeg {
    #[must_use]
    pub fn pull(ledger: &Arc<dyn Ledger>, owner: Identity, to: Identity, amount: Amount) -> Self {
        Self {
            ledger: Arc::clone(ledger),
            kind: LegKind::Pull { owner },
            to,
            amount,
        }
    }

    #[must_use]
    pub fn push(ledger: &Arc<dyn Ledger>, to: Identity, amount: Amount) -> Self {
        Self {
            ledger: Arc::clone(ledger),
            kind: LegKind::Push,
            to,
            amount,
        }
    }

    #[must_use]
    pub fn token(&self) -> TokenRef {
        self.ledger.token_ref()
    }

    fn run(&self, escrow: &Identity) -> Result<()> {
        let outcome = match self.kind {
            LegKind::Pull { owner } => self
                .ledger
                .transfer_from(escrow, &owner, &self.to, self.amount),
            LegKind::Push => self.ledger.transfer(escrow, &self.to, self.amount),
        };
        outcome.map_err(|source| OtcError::Ledger {
            token: self.token(),
            source,
        })
    }

    /// Undo a completed leg, if the engine is able to.
    fn compensate(&self, escrow: &Identity) {
        match self.kind {
            LegKind::Pull { owner } if self.to == *escrow => {
                if let Err(e) = self.ledger.transfer(escrow, &owner, self.amount) {
                    tracing::error!(
                        token = %self.token(),
                        owner = %owner,
                        amount = %self.amount,
                        error = %e,
                        "Failed to return escrowed funds during rollback"
                    );
                }
            }
            _ => {
                tracing::error!(
                    token = %self.token(),
                    to = %self.to,
                    amount = %self.amount,
                    kind = ?self.kind,
                    "Completed transfer cannot be reversed by the engine"
                );
            }
        }
    }
}

impl std::fmt::Debug for TransferLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferLeg")
            .field("token", &self.token())
            .field("kind", &self.kind)
            .field("to", &self.to)
            .field("amount", &self.amount)
            .finish()
    }
}

/// State change to apply or undo once the legs have run.
#[derive(Debug, Clone)]
pub(crate) enum Stage {
    /// Offer not yet stored; insert it after the legs succeed.
    Insert(Box<Offer>),
    /// Offer already updated; restore this snapshot if a leg fails.
    Committed(Box<Offer>),
}

/// A planned operation: ledger legs, the state change they belong to, and
/// the events to publish once everything succeeded.
#[derive(Debug)]
#[must_use = "a settlement does nothing until it is run"]
pub struct Settlement<T> {
    pub(crate) value: T,
    pub(crate) legs: Vec<TransferLeg>,
    pub(crate) stage: Stage,
    pub(crate) events: Vec<OfferEvent>,
}

impl<T> Settlement<T> {
    pub(crate) fn new(value: T, stage: Stage) -> Self {
        Self {
            value,
            legs: Vec::new(),
            stage,
            events: Vec::new(),
        }
    }

    /// Queue a leg. Zero-amount legs are dropped.
    pub(crate) fn leg(&mut self, leg: TransferLeg) {
        if !leg.amount.is_zero() {
            self.legs.push(leg);
        }
    }

    pub(crate) fn event(&mut self, event: OfferEvent) {
        self.events.push(event);
    }

    #[must_use]
    pub fn legs(&self) -> &[TransferLeg] {
        &self.legs
    }

    #[must_use]
    pub fn events(&self) -> &[OfferEvent] {
        &self.events
    }

    /// Run every leg in order.
    ///
    /// On the first failure the completed legs are compensated in reverse
    /// order and the failing leg's error is returned.
    pub(crate) fn execute(&self, escrow: &Identity) -> Result<()> {
        for (done, leg) in self.legs.iter().enumerate() {
            if let Err(e) = leg.run(escrow) {
                tracing::warn!(
                    leg = done,
                    token = %leg.token(),
                    amount = %leg.amount,
                    error = %e,
                    "Settlement leg failed, unwinding"
                );
                for completed in self.legs[..done].iter().rev() {
                    completed.compensate(escrow);
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

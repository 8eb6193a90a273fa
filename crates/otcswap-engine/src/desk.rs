//! Thread-safe escrow desk.
//!
//! [`OtcDesk`] wraps an [`OfferMatcher`] for shared use:
//!
//! - **Op gate**: mutating calls are serialized across threads, so each one
//!   runs as if it had the engine to itself.
//! - **Call guard**: a mutating call made while the same thread is already
//!   inside a mutating call on this desk (i.e. from a ledger callback) fails
//!   with `ReentrantCall` instead of deadlocking or interleaving.
//! - **State lock**: held only while planning and finishing. Ledger legs run
//!   without it, so read-only views stay available to ledger callbacks on
//!   the calling thread and show the already-committed offer state.
//! - **Views** from other threads take the op gate too, so they never see an
//!   offer change whose legs have not settled yet.
//!
//! Events are published to the [`NotificationSink`] only after the whole
//! operation succeeded.

use std::{
    cell::RefCell,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use otcswap_ledger::Ledger;
use otcswap_types::{
    AllowedToken, Amount, DeskConfig, Identity, Offer, OfferEvent, OfferId, OfferTerms, OtcError,
    Result, TokenId, TokenRef,
};

use crate::{
    matcher::{Fill, OfferMatcher},
    notify::{NotificationSink, TracingSink},
    settlement::Settlement,
};

static NEXT_DESK_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Desks this thread is currently inside a mutating call on.
    static ACTIVE_DESKS: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks the current thread as inside a mutating call until dropped.
struct CallGuard {
    desk: u64,
}

impl CallGuard {
    fn enter(desk: u64) -> Result<Self> {
        ACTIVE_DESKS.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&desk) {
                tracing::warn!(desk, "Rejected re-entrant call");
                return Err(OtcError::ReentrantCall);
            }
            active.push(desk);
            Ok(Self { desk })
        })
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        ACTIVE_DESKS.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|d| *d == self.desk) {
                active.remove(pos);
            }
        });
    }
}

/// Shared handle to one escrow engine instance.
pub struct OtcDesk {
    id: u64,
    gate: Mutex<()>,
    state: Mutex<OfferMatcher>,
    sink: Arc<dyn NotificationSink>,
}

impl OtcDesk {
    /// Desk that logs its events through `tracing`.
    ///
    /// # Errors
    /// Returns `Configuration` if the config does not validate.
    pub fn new(config: DeskConfig) -> Result<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// # Errors
    /// Returns `Configuration` if the config does not validate.
    pub fn with_sink(config: DeskConfig, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        let matcher = OfferMatcher::new(config)?;
        let id = NEXT_DESK_ID.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            desk = id,
            admin = %matcher.config().admin,
            escrow = %matcher.config().escrow,
            "Desk started"
        );
        Ok(Self {
            id,
            gate: Mutex::new(()),
            state: Mutex::new(matcher),
            sink,
        })
    }

    fn state(&self) -> Result<MutexGuard<'_, OfferMatcher>> {
        self.state
            .lock()
            .map_err(|_| OtcError::Internal("desk state lock poisoned".into()))
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        // The gate guards no data, so a poisoned gate is still usable.
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn inside_call(&self) -> bool {
        ACTIVE_DESKS.with(|active| active.borrow().contains(&self.id))
    }

    /// Read under the state lock. Threads outside a mutating call on this
    /// desk wait for the op gate first.
    fn read<T>(&self, f: impl FnOnce(&OfferMatcher) -> Result<T>) -> Result<T> {
        let _gate = (!self.inside_call()).then(|| self.gate());
        let state = self.state()?;
        f(&state)
    }

    fn publish(&self, events: &[OfferEvent]) {
        for event in events {
            self.sink.publish(event);
        }
    }

    /// Run a planned operation: plan under the state lock, legs without it,
    /// then finish or abort under the state lock again.
    fn run<T, P>(&self, plan: P) -> Result<T>
    where
        P: FnOnce(&mut OfferMatcher) -> Result<Settlement<T>>,
    {
        let _call = CallGuard::enter(self.id)?;
        let _gate = self.gate();

        let (settlement, escrow) = {
            let mut state = self.state()?;
            let escrow = state.config().escrow;
            (plan(&mut *state)?, escrow)
        };

        match settlement.execute(&escrow) {
            Ok(()) => {
                let (value, events) = self.state()?.finish(settlement)?;
                self.publish(&events);
                Ok(value)
            }
            Err(e) => {
                match self.state() {
                    Ok(mut state) => state.abort(settlement),
                    Err(poisoned) => {
                        tracing::error!(error = %poisoned, "Could not roll back offer state");
                    }
                }
                Err(e)
            }
        }
    }

    /// Run a mutation that has no ledger legs.
    fn run_local<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut OfferMatcher) -> Result<(T, OfferEvent)>,
    {
        let _call = CallGuard::enter(self.id)?;
        let _gate = self.gate();
        let (value, event) = f(&mut *self.state()?)?;
        self.publish(std::slice::from_ref(&event));
        Ok(value)
    }

    // ---- allowlist ----

    /// # Errors
    /// `Unauthorized` unless `caller` is the administrator.
    pub fn allow_token(
        &self,
        caller: &Identity,
        name: impl Into<String>,
        ledger: Arc<dyn Ledger>,
        decimals: u8,
    ) -> Result<TokenId> {
        self.run_local(|m| m.allow_token(caller, name, ledger, decimals))
    }

    /// # Errors
    /// `Unauthorized`, or `InvalidToken` if out of range or already disabled.
    pub fn disable_token(&self, caller: &Identity, token_id: TokenId) -> Result<()> {
        self.run_local(|m| m.disable_token(caller, token_id).map(|event| ((), event)))
    }

    /// Make a ledger resolvable without allowlisting it.
    pub fn register_ledger(&self, ledger: Arc<dyn Ledger>) -> Result<TokenRef> {
        let _call = CallGuard::enter(self.id)?;
        let _gate = self.gate();
        Ok(self.state()?.register_ledger(ledger))
    }

    // ---- offers ----

    /// Escrow `terms.send_amount` plus fee from `caller` and open an offer.
    ///
    /// # Errors
    /// Any precondition error of the matcher, `Ledger` if a transfer fails,
    /// or `ReentrantCall` when invoked from a ledger callback.
    pub fn make_offer(&self, caller: &Identity, terms: &OfferTerms) -> Result<OfferId> {
        self.run(|m| m.plan_make(caller, terms))
    }

    /// Pay `amount` (plus fee) of the receive token for a proportional share
    /// of the escrowed send token.
    ///
    /// # Errors
    /// As for [`Self::make_offer`].
    pub fn accept_offer(&self, caller: &Identity, offer_id: OfferId, amount: Amount) -> Result<Fill> {
        self.run(|m| m.plan_accept(caller, offer_id, amount))
    }

    /// Revoke an Active offer and refund its escrow. Returns the refund.
    ///
    /// # Errors
    /// As for [`Self::make_offer`].
    pub fn cancel_offer(&self, caller: &Identity, offer_id: OfferId) -> Result<Amount> {
        self.run(|m| m.plan_cancel(caller, offer_id))
    }

    /// Overwrite an Active offer's receive amount and minimum.
    ///
    /// # Errors
    /// As for [`Self::make_offer`].
    pub fn update_offer(
        &self,
        caller: &Identity,
        offer_id: OfferId,
        receive_amount: Amount,
        min_receive_amount: Amount,
    ) -> Result<()> {
        self.run(|m| m.plan_update(caller, offer_id, receive_amount, min_receive_amount))
    }

    // ---- views ----

    pub fn offer(&self, offer_id: OfferId) -> Result<Offer> {
        self.read(|m| m.store().get(offer_id).cloned())
    }

    pub fn offers(&self) -> Result<Vec<Offer>> {
        self.read(|m| Ok(m.store().iter().cloned().collect()))
    }

    pub fn active_offers(&self) -> Result<Vec<Offer>> {
        self.read(|m| Ok(m.store().active().cloned().collect()))
    }

    pub fn offers_by_lister(&self, lister: &Identity) -> Result<Vec<Offer>> {
        self.read(|m| Ok(m.store().by_lister(lister).cloned().collect()))
    }

    pub fn token(&self, token_id: TokenId) -> Result<AllowedToken> {
        self.read(|m| m.registry().get(token_id).cloned())
    }

    pub fn tokens(&self) -> Result<Vec<AllowedToken>> {
        self.read(|m| Ok(m.registry().tokens().to_vec()))
    }

    pub fn is_token_enabled(&self, token_id: TokenId) -> Result<bool> {
        self.read(|m| m.registry().is_enabled(token_id))
    }

    /// Fee the desk charges on `amount`.
    pub fn fee_for(&self, amount: Amount) -> Result<Amount> {
        self.read(|m| m.fees().fee(amount))
    }

    pub fn config(&self) -> Result<DeskConfig> {
        self.read(|m| Ok(m.config().clone()))
    }

    /// Hex digest of all offers; equal across desks that processed the same
    /// operations in the same order.
    pub fn state_root(&self) -> Result<String> {
        self.read(|m| Ok(hex::encode(m.store().state_root())))
    }
}

impl std::fmt::Debug for OtcDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtcDesk").field("id", &self.id).finish_non_exhaustive()
    }
}

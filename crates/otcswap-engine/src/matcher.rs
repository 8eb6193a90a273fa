//! Offer matcher: make, accept, cancel and update.
//!
//! Each operation is split in two:
//!
//! 1. **Plan** (`plan_*`): validate every precondition, commit the offer
//!    state change (or draft it, for `make`), and describe the ledger legs.
//! 2. **Settle**: run the legs, then either finish (insert the drafted
//!    offer, release the events) or abort (restore the snapshot).
//!
//! Planning commits state before any ledger leg runs, so a ledger that
//! calls back in already observes the post-operation offer. [`OtcDesk`]
//! runs the legs between the two halves with its state lock released;
//! the public methods here run both halves back to back for
//! single-threaded use.
//!
//! [`OtcDesk`]: crate::OtcDesk

use std::sync::Arc;

use otcswap_ledger::{Ledger, LedgerDirectory};
use otcswap_types::{
    Amount, DeskConfig, Identity, Offer, OfferEvent, OfferId, OfferStatus, OfferTerms, OtcError,
    Result, TokenId, TokenRef,
};

use crate::{
    allowlist::AllowlistRegistry,
    fee::FeeCalculator,
    offer_store::OfferStore,
    settlement::{Settlement, Stage, TransferLeg},
};

/// Outcome of a successful fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub offer_id: OfferId,
    /// Receive-token amount paid to the lister.
    pub amount: Amount,
    /// Send-token amount paid out of escrow to the filler.
    pub filled_send: Amount,
    /// Receive-token fee paid by the filler on top of `amount`.
    pub fee: Amount,
    /// Offer status after the fill.
    pub status: OfferStatus,
}

/// Single-owner engine state.
#[derive(Debug)]
pub struct OfferMatcher {
    config: DeskConfig,
    registry: AllowlistRegistry,
    store: OfferStore,
    fees: FeeCalculator,
    ledgers: LedgerDirectory,
}

impl OfferMatcher {
    /// # Errors
    /// Returns `Configuration` if the config does not validate.
    pub fn new(config: DeskConfig) -> Result<Self> {
        config.validate()?;
        let fees = FeeCalculator::new(config.fee)?;
        Ok(Self {
            registry: AllowlistRegistry::new(config.admin),
            store: OfferStore::new(),
            fees,
            ledgers: LedgerDirectory::new(),
            config,
        })
    }

    // ---- accessors ----

    #[must_use]
    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &AllowlistRegistry {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &OfferStore {
        &self.store
    }

    #[must_use]
    pub fn fees(&self) -> &FeeCalculator {
        &self.fees
    }

    #[must_use]
    pub fn ledgers(&self) -> &LedgerDirectory {
        &self.ledgers
    }

    /// Make a ledger resolvable without allowlisting it.
    pub fn register_ledger(&mut self, ledger: Arc<dyn Ledger>) -> TokenRef {
        self.ledgers.register(ledger)
    }

    // ---- allowlist ----

    /// Allowlist `ledger` under a fresh token id.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the administrator
    pub fn allow_token(
        &mut self,
        caller: &Identity,
        name: impl Into<String>,
        ledger: Arc<dyn Ledger>,
        decimals: u8,
    ) -> Result<(TokenId, OfferEvent)> {
        let name = name.into();
        let token_ref = ledger.token_ref();
        let token_id = self
            .registry
            .add(caller, name.clone(), token_ref.clone(), decimals)?;
        self.ledgers.register(ledger);

        tracing::info!(token = %token_id, ledger = %token_ref, name = %name, "Token allowed");
        Ok((
            token_id,
            OfferEvent::TokenAllowed {
                token_id,
                name,
                ledger: token_ref,
                decimals,
            },
        ))
    }

    /// # Errors
    /// - `Unauthorized` if `caller` is not the administrator
    /// - `InvalidToken` if the id is out of range or already disabled
    pub fn disable_token(&mut self, caller: &Identity, token_id: TokenId) -> Result<OfferEvent> {
        self.registry.disable(caller, token_id)?;
        tracing::info!(token = %token_id, "Token disabled");
        Ok(OfferEvent::TokenDisabled { token_id })
    }

    // ---- offer lifecycle (plan + settle) ----

    /// Escrow `send_amount` and open a new offer.
    ///
    /// # Errors
    /// See [`Self::plan_make`], plus `Ledger` if a transfer fails.
    pub fn make_offer(
        &mut self,
        caller: &Identity,
        terms: &OfferTerms,
    ) -> Result<(OfferId, Vec<OfferEvent>)> {
        let plan = self.plan_make(caller, terms)?;
        self.settle(plan)
    }

    /// Fill `amount` of an offer's receive side.
    ///
    /// # Errors
    /// See [`Self::plan_accept`], plus `Ledger` if a transfer fails.
    pub fn accept_offer(
        &mut self,
        caller: &Identity,
        offer_id: OfferId,
        amount: Amount,
    ) -> Result<(Fill, Vec<OfferEvent>)> {
        let plan = self.plan_accept(caller, offer_id, amount)?;
        self.settle(plan)
    }

    /// Revoke an offer and refund its remaining escrow to the lister.
    ///
    /// # Errors
    /// See [`Self::plan_cancel`], plus `Ledger` if the refund fails.
    pub fn cancel_offer(
        &mut self,
        caller: &Identity,
        offer_id: OfferId,
    ) -> Result<(Amount, Vec<OfferEvent>)> {
        let plan = self.plan_cancel(caller, offer_id)?;
        self.settle(plan)
    }

    /// Replace an offer's receive terms.
    ///
    /// # Errors
    /// See [`Self::plan_update`].
    pub fn update_offer(
        &mut self,
        caller: &Identity,
        offer_id: OfferId,
        receive_amount: Amount,
        min_receive_amount: Amount,
    ) -> Result<Vec<OfferEvent>> {
        let plan = self.plan_update(caller, offer_id, receive_amount, min_receive_amount)?;
        self.settle(plan).map(|((), events)| events)
    }

    fn settle<T>(&mut self, plan: Settlement<T>) -> Result<(T, Vec<OfferEvent>)> {
        let escrow = self.config.escrow;
        match plan.execute(&escrow) {
            Ok(()) => self.finish(plan),
            Err(e) => {
                self.abort(plan);
                Err(e)
            }
        }
    }

    // ---- planning ----

    fn ledger_for(&self, token: TokenId) -> Result<Arc<dyn Ledger>> {
        let entry = self.registry.get(token)?;
        self.ledgers.resolve(&entry.ledger)
    }

    /// Check that `payer` can cover `needed` from balance and allowance to
    /// escrow.
    fn ensure_funded(&self, ledger: &Arc<dyn Ledger>, payer: &Identity, needed: Amount) -> Result<()> {
        let available = ledger.balance_of(payer);
        if available < needed {
            return Err(OtcError::InsufficientBalance { needed, available });
        }
        let allowance = ledger.allowance(payer, &self.config.escrow);
        if allowance < needed {
            return Err(OtcError::InsufficientAllowance {
                needed,
                available: allowance,
            });
        }
        Ok(())
    }

    /// # Errors
    /// - `InvalidToken` / `TokenNotAllowed` for a bad token on either side
    /// - `InvalidMinimum` if `min_receive_amount > receive_amount`
    /// - `ArithmeticOverflow` if `send_amount + fee` overflows
    /// - `InsufficientBalance` / `InsufficientAllowance` on the send token
    pub(crate) fn plan_make(
        &self,
        caller: &Identity,
        terms: &OfferTerms,
    ) -> Result<Settlement<OfferId>> {
        self.registry.require_enabled(terms.send_token)?;
        self.registry.require_enabled(terms.receive_token)?;
        if terms.min_receive_amount > terms.receive_amount {
            return Err(OtcError::InvalidMinimum {
                min_receive: terms.min_receive_amount,
                receive: terms.receive_amount,
            });
        }

        let charge = self.fees.charge(terms.send_amount)?;
        let send_ledger = self.ledger_for(terms.send_token)?;
        self.ensure_funded(&send_ledger, caller, charge.total)?;

        let offer = self.store.draft(terms, *caller);
        let offer_id = offer.id;
        tracing::debug!(
            offer = %offer_id,
            lister = %caller,
            send = %terms.send_amount,
            receive = %terms.receive_amount,
            fee = %charge.fee,
            "Planned offer creation"
        );

        let mut plan = Settlement::new(offer_id, Stage::Insert(Box::new(offer)));
        plan.leg(TransferLeg::pull(
            &send_ledger,
            *caller,
            self.config.escrow,
            terms.send_amount,
        ));
        plan.leg(TransferLeg::pull(
            &send_ledger,
            *caller,
            self.config.fee_recipient,
            charge.fee,
        ));
        plan.event(OfferEvent::OfferCreated {
            offer_id,
            creator: *caller,
            send_token: terms.send_token,
            send_amount: terms.send_amount,
            receive_token: terms.receive_token,
            receive_amount: terms.receive_amount,
            min_receive_amount: terms.min_receive_amount,
        });
        Ok(plan)
    }

    /// # Errors
    /// - `OfferNotFound` / `OfferUnavailable`
    /// - `AmountExceedsOffer` if `amount > receive_amount`
    /// - `BelowMinimum` if `amount < min_receive_amount`
    /// - `ArithmeticOverflow` on the fee, total or proportional product
    /// - `InsufficientBalance` / `InsufficientAllowance` on the receive token
    /// - `EmptyOffer` if the offer has nothing left to receive
    pub(crate) fn plan_accept(
        &mut self,
        caller: &Identity,
        offer_id: OfferId,
        amount: Amount,
    ) -> Result<Settlement<Fill>> {
        let offer = self.store.get_active(offer_id)?;
        check_fill_bounds(offer, amount)?;
        let charge = self.fees.charge(amount)?;
        let receive_ledger = self.ledger_for(offer.receive_token)?;
        let send_ledger = self.ledger_for(offer.send_token)?;
        let lister = offer.lister;
        self.ensure_funded(&receive_ledger, caller, charge.total)?;

        let committed = self.store.mutate_active(offer_id, |offer| {
            check_fill_bounds(offer, amount)?;
            let filled_send = offer.proportional_send(amount)?;
            offer.apply_fill(amount, filled_send);
            Ok(filled_send)
        })?;
        let filled_send = committed.value;
        let status = committed.current.status;
        tracing::debug!(
            offer = %offer_id,
            filler = %caller,
            amount = %amount,
            filled_send = %filled_send,
            fee = %charge.fee,
            remaining = %committed.current.receive_amount,
            "Planned fill"
        );

        let fill = Fill {
            offer_id,
            amount,
            filled_send,
            fee: charge.fee,
            status,
        };
        let mut plan = Settlement::new(fill, Stage::Committed(Box::new(committed.previous)));
        // The filler's payment lands in escrow first, where a failed payout
        // can still return it. Third parties are paid last.
        plan.leg(TransferLeg::pull(
            &receive_ledger,
            *caller,
            self.config.escrow,
            charge.total,
        ));
        plan.leg(TransferLeg::push(&send_ledger, *caller, filled_send));
        plan.leg(TransferLeg::push(&receive_ledger, lister, amount));
        plan.leg(TransferLeg::push(
            &receive_ledger,
            self.config.fee_recipient,
            charge.fee,
        ));
        plan.event(OfferEvent::OfferAccepted {
            offer_id,
            filler: *caller,
            amount,
            filled_send,
            fee: charge.fee,
        });
        if status == OfferStatus::Completed {
            plan.event(OfferEvent::OfferCompleted { offer_id });
        }
        Ok(plan)
    }

    /// # Errors
    /// - `OfferNotFound` / `OfferUnavailable`
    /// - `NotLister` if `caller` did not create the offer
    pub(crate) fn plan_cancel(
        &mut self,
        caller: &Identity,
        offer_id: OfferId,
    ) -> Result<Settlement<Amount>> {
        let offer = self.store.get_active(offer_id)?;
        ensure_lister(offer, caller)?;
        let send_ledger = self.ledger_for(offer.send_token)?;

        let committed = self.store.mutate_active(offer_id, |offer| {
            offer.status = OfferStatus::Revoked;
            Ok(offer.send_amount)
        })?;
        let refunded = committed.value;
        tracing::debug!(offer = %offer_id, refunded = %refunded, "Planned revocation");

        let mut plan = Settlement::new(refunded, Stage::Committed(Box::new(committed.previous)));
        plan.leg(TransferLeg::push(&send_ledger, *caller, refunded));
        plan.event(OfferEvent::OfferRevoked { offer_id, refunded });
        Ok(plan)
    }

    /// Overwrites both receive fields as given. Unlike creation, this does
    /// not require `min_receive_amount <= receive_amount`.
    ///
    /// # Errors
    /// - `OfferNotFound` / `OfferUnavailable`
    /// - `NotLister` if `caller` did not create the offer
    pub(crate) fn plan_update(
        &mut self,
        caller: &Identity,
        offer_id: OfferId,
        receive_amount: Amount,
        min_receive_amount: Amount,
    ) -> Result<Settlement<()>> {
        ensure_lister(self.store.get_active(offer_id)?, caller)?;

        let committed = self.store.mutate_active(offer_id, |offer| {
            offer.receive_amount = receive_amount;
            offer.min_receive_amount = min_receive_amount;
            Ok(())
        })?;
        if min_receive_amount > receive_amount {
            tracing::warn!(
                offer = %offer_id,
                receive = %receive_amount,
                min = %min_receive_amount,
                "Offer minimum now exceeds its receive amount"
            );
        }

        let mut plan = Settlement::new((), Stage::Committed(Box::new(committed.previous)));
        plan.event(OfferEvent::OfferUpdated {
            offer_id,
            receive_amount,
            min_receive_amount,
        });
        Ok(plan)
    }

    // ---- settlement halves ----

    /// Apply the deferred half of a plan whose legs all succeeded.
    pub(crate) fn finish<T>(&mut self, plan: Settlement<T>) -> Result<(T, Vec<OfferEvent>)> {
        let Settlement {
            value,
            stage,
            events,
            ..
        } = plan;
        if let Stage::Insert(offer) = stage {
            self.store.insert(*offer)?;
        }
        for event in &events {
            tracing::info!(kind = event.kind(), offer = ?event.offer_id(), "Operation committed");
        }
        Ok((value, events))
    }

    /// Undo the committed half of a plan whose legs failed.
    pub(crate) fn abort<T>(&mut self, plan: Settlement<T>) {
        match plan.stage {
            Stage::Insert(offer) => {
                tracing::debug!(offer = %offer.id, "Dropped offer draft");
            }
            Stage::Committed(previous) => {
                let offer_id = previous.id;
                match self.store.restore(*previous) {
                    Ok(()) => tracing::warn!(offer = %offer_id, "Offer state rolled back"),
                    Err(e) => tracing::error!(offer = %offer_id, error = %e, "Rollback failed"),
                }
            }
        }
    }
}

fn check_fill_bounds(offer: &Offer, amount: Amount) -> Result<()> {
    if amount > offer.receive_amount {
        return Err(OtcError::AmountExceedsOffer {
            amount,
            remaining: offer.receive_amount,
        });
    }
    if amount < offer.min_receive_amount {
        return Err(OtcError::BelowMinimum {
            amount,
            minimum: offer.min_receive_amount,
        });
    }
    Ok(())
}

fn ensure_lister(offer: &Offer, caller: &Identity) -> Result<()> {
    if offer.lister != *caller {
        return Err(OtcError::NotLister {
            offer_id: offer.id,
            caller: *caller,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use otcswap_ledger::{InMemoryLedger, TransferRecord};
    use otcswap_types::LedgerError;

    use super::*;

    fn amt(n: u64) -> Amount {
        Amount::from(n)
    }

    fn who(label: &str) -> Identity {
        Identity::from_label(label)
    }

    struct Setup {
        matcher: OfferMatcher,
        a: Arc<InMemoryLedger>,
        b: Arc<InMemoryLedger>,
        token_a: TokenId,
        token_b: TokenId,
    }

    fn setup() -> Setup {
        let config = DeskConfig::new(who("admin"), who("escrow"), who("fees"));
        let mut matcher = OfferMatcher::new(config).unwrap();
        let a = Arc::new(InMemoryLedger::new("TKA"));
        let b = Arc::new(InMemoryLedger::new("TKB"));
        let (token_a, _) = matcher
            .allow_token(&who("admin"), "Token A", a.clone(), 18)
            .unwrap();
        let (token_b, _) = matcher
            .allow_token(&who("admin"), "Token B", b.clone(), 18)
            .unwrap();

        a.mint(&who("alice"), amt(10_000)).unwrap();
        a.approve(&who("alice"), &who("escrow"), amt(10_000));
        b.mint(&who("bob"), amt(10_000)).unwrap();
        b.approve(&who("bob"), &who("escrow"), amt(10_000));

        Setup {
            matcher,
            a,
            b,
            token_a,
            token_b,
        }
    }

    fn terms(s: &Setup, send: u64, receive: u64, min: u64) -> OfferTerms {
        OfferTerms {
            send_token: s.token_a,
            send_amount: amt(send),
            receive_token: s.token_b,
            receive_amount: amt(receive),
            min_receive_amount: amt(min),
        }
    }

    #[test]
    fn make_escrows_and_charges_fee() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 100);
        let (id, events) = s.matcher.make_offer(&who("alice"), &t).unwrap();

        assert_eq!(id, OfferId(0));
        assert_eq!(s.a.balance_of(&who("escrow")), amt(1000));
        assert_eq!(s.a.balance_of(&who("fees")), amt(2));
        assert_eq!(s.a.balance_of(&who("alice")), amt(8998));
        assert_eq!(events.len(), 1);
        assert!(s.matcher.store().get(id).unwrap().is_active());
    }

    #[test]
    fn make_rejects_min_above_receive() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 501);
        let err = s.matcher.make_offer(&who("alice"), &t).unwrap_err();
        assert!(matches!(err, OtcError::InvalidMinimum { .. }));
        assert!(s.matcher.store().is_empty());
        assert_eq!(s.a.balance_of(&who("alice")), amt(10_000));
    }

    #[test]
    fn make_rejects_disabled_token() {
        let mut s = setup();
        s.matcher.disable_token(&who("admin"), s.token_b).unwrap();
        let t = terms(&s, 1000, 500, 100);
        let err = s.matcher.make_offer(&who("alice"), &t).unwrap_err();
        assert!(matches!(err, OtcError::TokenNotAllowed(id) if id == s.token_b));
    }

    #[test]
    fn make_checks_balance_then_allowance() {
        let mut s = setup();
        let t = terms(&s, 20_000, 500, 100);
        assert!(matches!(
            s.matcher.make_offer(&who("alice"), &t),
            Err(OtcError::InsufficientBalance { .. })
        ));

        s.a.approve(&who("alice"), &who("escrow"), amt(1001));
        let t = terms(&s, 1000, 500, 100);
        assert!(matches!(
            s.matcher.make_offer(&who("alice"), &t),
            Err(OtcError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn accept_settles_through_escrow() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 100);
        let (id, _) = s.matcher.make_offer(&who("alice"), &t).unwrap();

        let (fill, events) = s.matcher.accept_offer(&who("bob"), id, amt(250)).unwrap();
        assert_eq!(fill.filled_send, amt(500));
        assert_eq!(fill.fee, amt(0));
        assert_eq!(fill.status, OfferStatus::Active);
        assert_eq!(events.len(), 1);

        assert_eq!(s.b.balance_of(&who("alice")), amt(250));
        assert_eq!(s.b.balance_of(&who("escrow")), amt(0));
        assert_eq!(s.a.balance_of(&who("bob")), amt(500));
        assert_eq!(s.a.balance_of(&who("escrow")), amt(500));

        let history = s.b.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to, who("escrow"));
        assert_eq!(history[1].to, who("alice"));
    }

    #[test]
    fn accept_with_fee_pays_recipient_from_escrow() {
        let mut s = setup();
        let t = terms(&s, 4000, 4000, 400);
        let (id, _) = s.matcher.make_offer(&who("alice"), &t).unwrap();

        let (fill, _) = s.matcher.accept_offer(&who("bob"), id, amt(4000)).unwrap();
        assert_eq!(fill.fee, amt(10));
        assert_eq!(s.b.balance_of(&who("bob")), amt(5990));
        assert_eq!(s.b.balance_of(&who("alice")), amt(4000));
        assert_eq!(s.b.balance_of(&who("fees")), amt(10));
        assert_eq!(s.b.balance_of(&who("escrow")), amt(0));
    }

    #[test]
    fn accept_bounds_checked() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 100);
        let (id, _) = s.matcher.make_offer(&who("alice"), &t).unwrap();

        assert!(matches!(
            s.matcher.accept_offer(&who("bob"), id, amt(501)),
            Err(OtcError::AmountExceedsOffer { .. })
        ));
        assert!(matches!(
            s.matcher.accept_offer(&who("bob"), id, amt(99)),
            Err(OtcError::BelowMinimum { .. })
        ));
        assert_eq!(s.matcher.store().get(id).unwrap().receive_amount, amt(500));
    }

    #[test]
    fn accept_emits_completed_on_final_fill() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 100);
        let (id, _) = s.matcher.make_offer(&who("alice"), &t).unwrap();

        let (fill, events) = s.matcher.accept_offer(&who("bob"), id, amt(500)).unwrap();
        assert_eq!(fill.status, OfferStatus::Completed);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind(), "offer_completed");
    }

    #[test]
    fn cancel_only_by_lister() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 100);
        let (id, _) = s.matcher.make_offer(&who("alice"), &t).unwrap();

        assert!(matches!(
            s.matcher.cancel_offer(&who("bob"), id),
            Err(OtcError::NotLister { .. })
        ));
        let (refunded, _) = s.matcher.cancel_offer(&who("alice"), id).unwrap();
        assert_eq!(refunded, amt(1000));
        assert_eq!(s.a.balance_of(&who("alice")), amt(9998));
        assert_eq!(
            s.matcher.store().get(id).unwrap().status,
            OfferStatus::Revoked
        );
    }

    #[test]
    fn update_skips_minimum_validation() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 100);
        let (id, _) = s.matcher.make_offer(&who("alice"), &t).unwrap();

        s.matcher
            .update_offer(&who("alice"), id, amt(50), amt(80))
            .unwrap();
        let offer = s.matcher.store().get(id).unwrap();
        assert_eq!(offer.receive_amount, amt(50));
        assert_eq!(offer.min_receive_amount, amt(80));

        // Unfillable now: every amount is either above 50 or below 80.
        assert!(s.matcher.accept_offer(&who("bob"), id, amt(50)).is_err());
        assert!(s.matcher.accept_offer(&who("bob"), id, amt(80)).is_err());
    }

    #[test]
    fn failed_payout_restores_offer_and_refunds_filler() {
        let mut s = setup();
        let t = terms(&s, 1000, 500, 100);
        let (id, _) = s.matcher.make_offer(&who("alice"), &t).unwrap();
        let root = s.matcher.store().state_root();

        s.a.set_hook(Arc::new(|record: &TransferRecord| {
            if record.spender.is_none() {
                Err(LedgerError::Rejected("payout frozen".into()))
            } else {
                Ok(())
            }
        }));
        let err = s.matcher.accept_offer(&who("bob"), id, amt(400)).unwrap_err();
        assert!(matches!(err, OtcError::Ledger { .. }));
        assert_eq!(s.matcher.store().state_root(), root);
        assert!(s.matcher.store().get(id).unwrap().is_active());

        // Nobody on the receive side was paid.
        assert_eq!(s.b.balance_of(&who("bob")), amt(10_000));
        assert_eq!(s.b.balance_of(&who("alice")), amt(0));
        assert_eq!(s.b.balance_of(&who("fees")), amt(0));
        assert_eq!(s.b.balance_of(&who("escrow")), amt(0));
        assert_eq!(s.a.balance_of(&who("bob")), amt(0));
        assert!(s.b.supply_conserved());
    }

    #[test]
    fn failed_make_stores_nothing() {
        let mut s = setup();
        s.a.set_hook(Arc::new(|record: &TransferRecord| {
            if record.to == Identity::from_label("fees") {
                Err(LedgerError::Rejected("fee account closed".into()))
            } else {
                Ok(())
            }
        }));
        let t = terms(&s, 1000, 500, 100);
        assert!(s.matcher.make_offer(&who("alice"), &t).is_err());
        assert!(s.matcher.store().is_empty());
        assert_eq!(s.a.balance_of(&who("alice")), amt(10_000));
        assert_eq!(s.a.balance_of(&who("escrow")), amt(0));
    }

    #[test]
    fn unknown_ledger_surfaces() {
        let config = DeskConfig::new(who("admin"), who("escrow"), who("fees"));
        let mut matcher = OfferMatcher::new(config).unwrap();
        let a: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new("TKA"));
        matcher.allow_token(&who("admin"), "A", a, 18).unwrap();
        // Allowlisted directly, never registered.
        matcher
            .registry
            .add(&who("admin"), "Ghost", TokenRef::new("GHOST"), 18)
            .unwrap();
        let t = OfferTerms {
            send_token: TokenId(1),
            send_amount: amt(1),
            receive_token: TokenId(0),
            receive_amount: amt(1),
            min_receive_amount: amt(1),
        };
        assert!(matches!(
            matcher.make_offer(&who("alice"), &t),
            Err(OtcError::UnknownLedger(_))
        ));
    }
}

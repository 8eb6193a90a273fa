//! Offer storage.
//!
//! Offers are never deleted and ids are assigned densely from zero, so the
//! id doubles as the index into the backing vector.
//!
//! Every mutation of an existing offer goes through [`OfferStore::mutate_active`]:
//! the closure runs against a draft copy and the draft replaces the stored
//! offer only if the closure succeeds. Terminal offers are never handed to a
//! closure, which keeps Completed/Revoked immutable.

use chrono::Utc;
use otcswap_types::{Identity, Offer, OfferId, OfferTerms, OtcError, Result};
use sha2::{Digest, Sha256};

/// Result of a committed [`OfferStore::mutate_active`].
#[derive(Debug, Clone)]
pub struct Committed<T> {
    /// The offer as it was before the closure ran.
    pub previous: Offer,
    /// The offer as now stored.
    pub current: Offer,
    pub value: T,
}

#[derive(Debug, Clone, Default)]
pub struct OfferStore {
    offers: Vec<Offer>,
}

impl OfferStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created offer will receive.
    #[must_use]
    pub fn next_id(&self) -> OfferId {
        OfferId(self.offers.len() as u64)
    }

    /// Build (but do not store) an Active offer under the next id.
    #[must_use]
    pub fn draft(&self, terms: &OfferTerms, lister: Identity) -> Offer {
        Offer::new(self.next_id(), terms, lister)
    }

    /// Store a drafted offer.
    ///
    /// # Errors
    /// Returns `Internal` if the draft's id is no longer the next id, i.e.
    /// another offer was inserted since it was drafted.
    pub fn insert(&mut self, offer: Offer) -> Result<OfferId> {
        let expected = self.next_id();
        if offer.id != expected {
            return Err(OtcError::Internal(format!(
                "offer draft {} is stale, next id is {expected}",
                offer.id
            )));
        }
        self.offers.push(offer);
        Ok(expected)
    }

    /// Create and store an Active offer in one step.
    pub fn create(&mut self, terms: &OfferTerms, lister: Identity) -> OfferId {
        let offer = self.draft(terms, lister);
        let id = offer.id;
        self.offers.push(offer);
        id
    }

    /// # Errors
    /// Returns `OfferNotFound` for an id that was never assigned.
    pub fn get(&self, id: OfferId) -> Result<&Offer> {
        self.offers
            .get(id.index())
            .ok_or(OtcError::OfferNotFound(id))
    }

    /// Fetch an offer that must still be Active.
    ///
    /// # Errors
    /// - `OfferNotFound` for an unknown id
    /// - `OfferUnavailable` if the offer is Completed or Revoked
    pub fn get_active(&self, id: OfferId) -> Result<&Offer> {
        let offer = self.get(id)?;
        if !offer.is_active() {
            return Err(OtcError::OfferUnavailable {
                offer_id: id,
                status: offer.status,
            });
        }
        Ok(offer)
    }

    /// Apply `f` to an Active offer, all-or-nothing.
    ///
    /// # Errors
    /// - `OfferNotFound` / `OfferUnavailable` as for [`Self::get_active`]
    /// - whatever `f` returns; the stored offer is then untouched
    /// - `Internal` if `f` moved the offer along an illegal status edge
    pub fn mutate_active<T, F>(&mut self, id: OfferId, f: F) -> Result<Committed<T>>
    where
        F: FnOnce(&mut Offer) -> Result<T>,
    {
        let previous = self.get_active(id)?.clone();
        let mut draft = previous.clone();
        let value = f(&mut draft)?;

        if draft.status != previous.status && !previous.status.can_transition_to(draft.status) {
            return Err(OtcError::Internal(format!(
                "offer {id}: illegal transition {} -> {}",
                previous.status, draft.status
            )));
        }
        draft.updated_at = Utc::now();

        let slot = self
            .offers
            .get_mut(id.index())
            .ok_or(OtcError::OfferNotFound(id))?;
        *slot = draft.clone();

        Ok(Committed {
            previous,
            current: draft,
            value,
        })
    }

    /// Put back a snapshot taken by [`Self::mutate_active`].
    ///
    /// Only used to unwind an operation whose ledger legs failed, so the
    /// snapshot is always the pre-operation Active state.
    pub(crate) fn restore(&mut self, snapshot: Offer) -> Result<()> {
        let id = snapshot.id;
        let slot = self
            .offers
            .get_mut(id.index())
            .ok_or(OtcError::OfferNotFound(id))?;
        *slot = snapshot;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.offers.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Offer> {
        self.offers.iter().filter(|offer| offer.is_active())
    }

    pub fn by_lister<'a>(&'a self, lister: &'a Identity) -> impl Iterator<Item = &'a Offer> {
        self.offers.iter().filter(move |offer| offer.lister == *lister)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Deterministic digest of every offer's economic state.
    ///
    /// Timestamps are excluded, so two stores that processed the same
    /// operations in the same order produce the same root.
    #[must_use]
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"otcswap:offer_root:v1:");
        hasher.update((self.offers.len() as u64).to_le_bytes());

        for offer in &self.offers {
            hasher.update(offer.id.0.to_le_bytes());
            hasher.update(offer.send_token.0.to_le_bytes());
            hasher.update(offer.send_amount.to_string().as_bytes());
            hasher.update(offer.receive_token.0.to_le_bytes());
            hasher.update(offer.receive_amount.to_string().as_bytes());
            hasher.update(offer.min_receive_amount.to_string().as_bytes());
            hasher.update(offer.lister.as_bytes());
            hasher.update(offer.status.to_string().as_bytes());
        }

        let result = hasher.finalize();
        let mut root = [0u8; 32];
        root.copy_from_slice(&result);
        root
    }
}

//! Shared fixtures for otcswap-engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use otcswap_engine::{MemorySink, OtcDesk};
use otcswap_ledger::InMemoryLedger;
use otcswap_types::{Amount, DeskConfig, Identity, OfferTerms, TokenId};

pub fn amt(n: u64) -> Amount {
    Amount::from(n)
}

pub fn who(label: &str) -> Identity {
    Identity::from_label(label)
}

pub fn admin() -> Identity {
    who("admin")
}

pub fn escrow() -> Identity {
    who("escrow")
}

pub fn fees() -> Identity {
    who("fees")
}

/// A desk with two allowlisted in-memory tokens, A (id 0) and B (id 1).
pub struct Harness {
    pub desk: Arc<OtcDesk>,
    pub sink: Arc<MemorySink>,
    pub a: Arc<InMemoryLedger>,
    pub b: Arc<InMemoryLedger>,
    pub token_a: TokenId,
    pub token_b: TokenId,
}

impl Harness {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let sink = Arc::new(MemorySink::new());
        let config = DeskConfig::new(admin(), escrow(), fees());
        let desk = Arc::new(OtcDesk::with_sink(config, sink.clone()).unwrap());

        let a = Arc::new(InMemoryLedger::new("TKA"));
        let b = Arc::new(InMemoryLedger::new("TKB"));
        let token_a = desk.allow_token(&admin(), "Token A", a.clone(), 18).unwrap();
        let token_b = desk.allow_token(&admin(), "Token B", b.clone(), 6).unwrap();

        Self {
            desk,
            sink,
            a,
            b,
            token_a,
            token_b,
        }
    }

    /// Mint `amount` to `owner` and approve the escrow for all of it.
    pub fn fund(ledger: &InMemoryLedger, owner: &Identity, amount: u64) {
        ledger.mint(owner, amt(amount)).unwrap();
        ledger.approve(owner, &escrow(), amt(amount));
    }

    /// Offer selling token A for token B.
    pub fn a_for_b(&self, send: u64, receive: u64, min: u64) -> OfferTerms {
        OfferTerms {
            send_token: self.token_a,
            send_amount: amt(send),
            receive_token: self.token_b,
            receive_amount: amt(receive),
            min_receive_amount: amt(min),
        }
    }

    pub fn event_kinds(&self) -> Vec<&'static str> {
        self.sink.events().iter().map(|e| e.kind()).collect()
    }
}

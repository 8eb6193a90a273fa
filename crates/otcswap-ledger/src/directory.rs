//! Ledger directory: resolves token handles to live ledgers.

use std::{collections::HashMap, sync::Arc};

use otcswap_types::{OtcError, Result, TokenRef};

use crate::Ledger;

/// Maps each [`TokenRef`] to the ledger that holds the token.
#[derive(Default, Clone)]
pub struct LedgerDirectory {
    ledgers: HashMap<TokenRef, Arc<dyn Ledger>>,
}

impl LedgerDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ledger under its own handle. Re-registering replaces the
    /// previous entry for that handle.
    pub fn register(&mut self, ledger: Arc<dyn Ledger>) -> TokenRef {
        let token_ref = ledger.token_ref();
        self.ledgers.insert(token_ref.clone(), ledger);
        token_ref
    }

    /// # Errors
    /// Returns `UnknownLedger` if nothing is registered under `token_ref`.
    pub fn resolve(&self, token_ref: &TokenRef) -> Result<Arc<dyn Ledger>> {
        self.ledgers
            .get(token_ref)
            .cloned()
            .ok_or_else(|| OtcError::UnknownLedger(token_ref.clone()))
    }

    #[must_use]
    pub fn contains(&self, token_ref: &TokenRef) -> bool {
        self.ledgers.contains_key(token_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }
}

impl std::fmt::Debug for LedgerDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handles: Vec<_> = self.ledgers.keys().collect();
        handles.sort();
        f.debug_struct("LedgerDirectory")
            .field("ledgers", &handles)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryLedger;

    #[test]
    fn register_and_resolve() {
        let mut dir = LedgerDirectory::new();
        let handle = dir.register(Arc::new(InMemoryLedger::new("TKA")));
        assert_eq!(handle, TokenRef::new("TKA"));
        assert!(dir.contains(&handle));
        assert_eq!(dir.resolve(&handle).unwrap().token_ref(), handle);
    }

    #[test]
    fn duplicate_registration_is_idempotent() {
        let mut dir = LedgerDirectory::new();
        let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new("TKA"));
        dir.register(Arc::clone(&ledger));
        dir.register(ledger);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn unknown_handle_errors() {
        let dir = LedgerDirectory::new();
        assert!(dir.is_empty());
        let Err(err) = dir.resolve(&TokenRef::new("NOPE")) else {
            panic!("unregistered handle resolved");
        };
        assert!(matches!(err, OtcError::UnknownLedger(r) if r.as_str() == "NOPE"));
    }
}

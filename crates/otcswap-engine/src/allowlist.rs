//! Token allowlist.
//!
//! Entries are append-only: removal only flips `enabled` off, so token ids
//! stay valid foreign keys for every offer that references them.
//!
//! `add` performs no de-duplication. Adding the same ledger handle twice
//! yields two independent ids backed by the same balances and allowances.

use otcswap_types::{AllowedToken, Identity, OtcError, Result, TokenId, TokenRef};

/// Which tokens may appear on either side of an offer.
#[derive(Debug, Clone)]
pub struct AllowlistRegistry {
    admin: Identity,
    tokens: Vec<AllowedToken>,
}

impl AllowlistRegistry {
    #[must_use]
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            tokens: Vec::new(),
        }
    }

    #[must_use]
    pub fn admin(&self) -> Identity {
        self.admin
    }

    fn ensure_admin(&self, caller: &Identity) -> Result<()> {
        if *caller != self.admin {
            return Err(OtcError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Append a new enabled entry.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the administrator
    pub fn add(
        &mut self,
        caller: &Identity,
        name: impl Into<String>,
        ledger: TokenRef,
        decimals: u8,
    ) -> Result<TokenId> {
        self.ensure_admin(caller)?;
        let id = u32::try_from(self.tokens.len())
            .map(TokenId)
            .map_err(|_| OtcError::Internal("allowlist id space exhausted".into()))?;
        self.tokens.push(AllowedToken {
            id,
            name: name.into(),
            ledger,
            decimals,
            enabled: true,
        });
        Ok(id)
    }

    /// Disable an entry. The entry itself is kept.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the administrator
    /// - `InvalidToken` if the id is out of range or already disabled
    pub fn disable(&mut self, caller: &Identity, id: TokenId) -> Result<()> {
        self.ensure_admin(caller)?;
        match self.tokens.get_mut(id.index()) {
            Some(token) if token.enabled => {
                token.enabled = false;
                Ok(())
            }
            _ => Err(OtcError::InvalidToken(id)),
        }
    }

    /// # Errors
    /// Returns `InvalidToken` if the id is out of range.
    pub fn get(&self, id: TokenId) -> Result<&AllowedToken> {
        self.tokens
            .get(id.index())
            .ok_or(OtcError::InvalidToken(id))
    }

    /// # Errors
    /// Returns `InvalidToken` if the id is out of range.
    pub fn is_enabled(&self, id: TokenId) -> Result<bool> {
        self.get(id).map(|token| token.enabled)
    }

    /// Resolve an id that must be tradable right now.
    ///
    /// # Errors
    /// - `InvalidToken` if the id is out of range
    /// - `TokenNotAllowed` if the entry is disabled
    pub fn require_enabled(&self, id: TokenId) -> Result<&AllowedToken> {
        let token = self.get(id)?;
        if !token.enabled {
            return Err(OtcError::TokenNotAllowed(id));
        }
        Ok(token)
    }

    #[must_use]
    pub fn tokens(&self) -> &[AllowedToken] {
        &self.tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

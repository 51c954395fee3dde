//! Confidential token ledger acting as the payment escrow.
//!
//! Balances are ciphertext handles. A pull never fails on insufficient
//! funds: like a confidential token, it obliviously transfers either the
//! requested amount or zero, so that the outcome leaks nothing. The caller
//! learns only the encrypted amount that moved.

use auction_types::{Address, Euint64};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::coprocessor::{FheCoprocessor, PaymentEscrow};
use crate::error::EscrowError;

/// Multi-token ledger of encrypted balances.
#[derive(Debug, Default)]
pub struct ConfidentialLedger {
    tokens: HashSet<Address>,
    balances: HashMap<(Address, Address), Euint64>,
}

impl ConfidentialLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token so it can be minted and pulled.
    pub fn register_token(&mut self, token: Address) {
        self.tokens.insert(token);
    }

    pub fn is_registered(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }

    /// Encrypted balance of `owner`, if it ever held `token`.
    pub fn balance_of(&self, token: &Address, owner: &Address) -> Option<Euint64> {
        self.balances.get(&(*token, *owner)).copied()
    }

    /// Credit `owner` with a public amount of `token`.
    pub fn mint<C: FheCoprocessor + ?Sized>(
        &mut self,
        fhe: &mut C,
        token: Address,
        owner: Address,
        amount: u64,
    ) -> Result<Euint64, EscrowError> {
        if !self.is_registered(&token) {
            return Err(EscrowError::UnknownToken(token));
        }
        let minted = fhe.trivial_encrypt(amount)?;
        let balance = match self.balance_of(&token, &owner) {
            Some(current) => fhe.add(current, minted)?,
            None => minted,
        };
        fhe.allow(balance.handle(), owner);
        self.balances.insert((token, owner), balance);
        Ok(balance)
    }

    fn balance_or_zero<C: FheCoprocessor + ?Sized>(
        &self,
        fhe: &mut C,
        token: &Address,
        owner: &Address,
    ) -> Result<Euint64, EscrowError> {
        match self.balance_of(token, owner) {
            Some(balance) => Ok(balance),
            None => Ok(fhe.trivial_encrypt(0)?),
        }
    }
}

impl<C: FheCoprocessor + ?Sized> PaymentEscrow<C> for ConfidentialLedger {
    fn pull(
        &mut self,
        fhe: &mut C,
        token: Address,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, EscrowError> {
        if !self.is_registered(&token) {
            return Err(EscrowError::UnknownToken(token));
        }
        if !fhe.is_allowed(amount.handle(), token) {
            return Err(EscrowError::Unauthorized(amount.handle()));
        }

        let from_balance = self.balance_or_zero(fhe, &token, &from)?;
        let to_balance = self.balance_or_zero(fhe, &token, &to)?;

        let zero = fhe.trivial_encrypt(0)?;
        let can_pay = fhe.le(amount, from_balance)?;
        let moved = fhe.select(can_pay, amount, zero)?;
        let from_after = fhe.sub(from_balance, moved)?;
        let to_after = fhe.add(to_balance, moved)?;

        fhe.allow(from_after.handle(), from);
        fhe.allow(to_after.handle(), to);
        self.balances.insert((token, from), from_after);
        self.balances.insert((token, to), to_after);

        debug!(
            token = %hex::encode(token),
            amount = %amount.handle(),
            "Pulled confidential payment"
        );
        Ok(moved)
    }
}

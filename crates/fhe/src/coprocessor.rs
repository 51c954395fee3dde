//! Encrypted arithmetic over opaque 64-bit ciphertext handles.

use auction_types::{Address, Ebool, Euint64, Handle, InputCiphertext};
use std::ops::{Deref, DerefMut};

use crate::error::{EscrowError, FheError};

/// Result type for coprocessor operations.
pub type FheResult<T> = Result<T, FheError>;

/// Homomorphic operations exposed by an FHE coprocessor.
///
/// Arithmetic wraps modulo 2^64, so `sub` underflows silently when the
/// minuend is smaller. Callers must make underflow unobservable, typically by
/// discarding the wrapped result with [`FheCoprocessor::select`].
///
/// None of these operations reveal a plaintext.
pub trait FheCoprocessor {
    /// Encrypt a public constant.
    fn trivial_encrypt(&mut self, value: u64) -> FheResult<Euint64>;

    fn add(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Euint64>;

    fn sub(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Euint64>;

    fn mul(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Euint64>;

    /// Encrypted `lhs < rhs`.
    fn lt(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Ebool>;

    /// Encrypted `lhs <= rhs`.
    fn le(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Ebool>;

    /// Oblivious ternary: `condition ? if_true : if_false`.
    fn select(&mut self, condition: Ebool, if_true: Euint64, if_false: Euint64)
        -> FheResult<Euint64>;

    /// Grant `account` lasting use of `handle`.
    fn allow(&mut self, handle: Handle, account: Address);

    /// Grant `account` use of `handle` until [`FheCoprocessor::clear_transient`].
    fn allow_transient(&mut self, handle: Handle, account: Address);

    fn is_allowed(&self, handle: Handle, account: Address) -> bool;

    /// Drop every transient grant.
    fn clear_transient(&mut self);

    /// Position in the ciphertext allocation order.
    fn checkpoint(&self) -> u64;

    /// Discard every ciphertext created after `mark`, with its grants.
    fn discard_since(&mut self, mark: u64);
}

/// Converts a client-submitted ciphertext and its proof of well-formedness
/// into a handle the coprocessor can operate on.
pub trait InputVerifier {
    /// Verify `input` against `proof`, which must bind it to `caller`
    /// submitting to `contract`.
    fn verify_input(
        &mut self,
        input: &InputCiphertext,
        proof: &[u8],
        caller: Address,
        contract: Address,
    ) -> FheResult<Euint64>;
}

/// Custody of payments pulled from bidders.
pub trait PaymentEscrow<C: FheCoprocessor + ?Sized> {
    /// Move up to `amount` of `token` from `from` into `to` and return the
    /// encrypted amount actually moved.
    ///
    /// The escrow may only move `amount` if the coprocessor reports it as
    /// allowed for the token's address. Implementations must leave their
    /// balances untouched when returning an error.
    fn pull(
        &mut self,
        fhe: &mut C,
        token: Address,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, EscrowError>;
}

/// Borrow of a coprocessor for the duration of one call.
///
/// Transient grants made through the scope are cleared when it drops,
/// whether the call succeeded or not. Ciphertexts created through a scope
/// that is dropped without [`TransientScope::commit`] are discarded.
pub struct TransientScope<'a, C: FheCoprocessor + ?Sized> {
    inner: &'a mut C,
    mark: u64,
    committed: bool,
}

impl<'a, C: FheCoprocessor + ?Sized> TransientScope<'a, C> {
    pub fn new(inner: &'a mut C) -> Self {
        let mark = inner.checkpoint();
        Self {
            inner,
            mark,
            committed: false,
        }
    }

    /// Keep the ciphertexts created in this scope.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl<C: FheCoprocessor + ?Sized> Deref for TransientScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.inner
    }
}

impl<C: FheCoprocessor + ?Sized> DerefMut for TransientScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.inner
    }
}

impl<C: FheCoprocessor + ?Sized> Drop for TransientScope<'_, C> {
    fn drop(&mut self) {
        if !self.committed {
            self.inner.discard_since(self.mark);
        }
        self.inner.clear_transient();
    }
}

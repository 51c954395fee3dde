//! Collaborator interfaces for confidential auctions.
//!
//! The auction module never sees a plaintext bid. It relies on three
//! external services, each modelled here as a trait:
//!
//! 1. **Coprocessor** ([`FheCoprocessor`]): homomorphic add, subtract,
//!    multiply, compare and select over opaque 64-bit ciphertext handles,
//!    plus an access list that controls who may use a handle.
//!
//! 2. **Input verification** ([`InputVerifier`]): turns a client ciphertext
//!    and its proof of well-formedness into a handle.
//!
//! 3. **Escrow** ([`PaymentEscrow`]): pulls an encrypted payment from a
//!    bidder into custody, provided the amount was granted to it.
//!
//! The [`simulator`] and [`ledger`] modules provide in-memory
//! implementations for development chains and tests.

pub mod coprocessor;
pub mod error;
pub mod ledger;
pub mod simulator;

pub use coprocessor::{FheCoprocessor, FheResult, InputVerifier, PaymentEscrow, TransientScope};
pub use error::{EscrowError, FheError};
pub use ledger::ConfidentialLedger;
pub use simulator::MockCoprocessor;

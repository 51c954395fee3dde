//! Error types for coprocessor and escrow operations.

use auction_types::Handle;
use thiserror::Error;

/// Errors surfaced by the FHE coprocessor or the input verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FheError {
    #[error("Unknown ciphertext handle {0}")]
    UnknownHandle(Handle),

    #[error("Ciphertext type mismatch for handle {0}")]
    TypeMismatch(Handle),

    #[error("Malformed input ciphertext")]
    MalformedInput,

    #[error("Input proof rejected")]
    ProofRejected,

    #[error("Input not covered by proof")]
    InputNotInProof,
}

/// Errors surfaced by the payment escrow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    #[error("Escrow not authorized to move ciphertext {0}")]
    Unauthorized(Handle),

    #[error("Unknown payment token {}", hex::encode(.0))]
    UnknownToken([u8; 32]),

    #[error("Transfer rejected: {0}")]
    Rejected(String),

    #[error("Coprocessor failure: {0}")]
    Fhe(#[from] FheError),
}

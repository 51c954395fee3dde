//! Auction module error types.

use auction_fhe::{EscrowError, FheError};
use auction_types::AuctionPhase;
use thiserror::Error;

/// Errors that can occur in the auction module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("Auction {auction_id} is not active ({phase})")]
    AuctionNotActive {
        auction_id: u64,
        phase: AuctionPhase,
    },

    #[error("Invalid encrypted input: {0}")]
    InvalidInput(FheError),

    #[error("Coprocessor error: {0}")]
    Fhe(#[from] FheError),

    #[error("Escrow error: {0}")]
    Escrow(#[from] EscrowError),
}

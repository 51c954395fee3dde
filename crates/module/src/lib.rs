//! Sovereign SDK auction module with confidential, FHE-encrypted bids.
//!
//! This module implements on-chain logic for sealed-bid auctions whose bid
//! quantities and prices never leave ciphertext form:
//!
//! - Auction creation with a bidding window and a payment medium
//! - Encrypted bid submission with proofs of well-formedness
//! - Oblivious bid updates: the incremental payment is computed without
//!   learning whether the new bid is larger
//! - Incremental escrow of payments through a confidential ledger
//!
//! # Architecture
//!
//! The module follows Sovereign SDK patterns:
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `engine`: The oblivious bid-update computation
//! - `queries`: Read-only state access
//! - `state`: On-chain state structures
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use auction_module::{handlers, state::AuctionState};
//!
//! let mut state = AuctionState::new();
//! let ctx = handlers::CallContext { ... };
//!
//! // Create an auction
//! let auction_id = handlers::handle_create_auction(&mut state, &ctx, ...)?;
//!
//! // Place an encrypted bid
//! handlers::handle_place_bid(&mut state, &ctx, &mut fhe, &mut escrow, auction_id, ...)?;
//! ```

pub mod call;
pub mod engine;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;

pub use call::AuctionCall;
pub use engine::{update_bid, BidUpdate};
pub use error::AuctionError;
pub use genesis::{AuctionGenesisConfig, GenesisValidationError};
pub use handlers::{BidReceipt, CallContext, CallOutcome, HandlerResult};
pub use queries::{AuctionQuery, AuctionQueryResponse, AuctionSummary};
pub use state::AuctionState;

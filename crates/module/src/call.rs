//! Call message types for the auction module.

use auction_types::{Address, InputCiphertext};
use borsh::{BorshDeserialize, BorshSerialize};

/// Call messages for the auction module.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    /// Create a new auction.
    CreateAuction {
        start_time: u64,
        end_time: u64,
        asset_token: Address,
        asset_amount: u128,
        /// Token address, or the native currency sentinel
        payment_token: Address,
    },

    /// Place or raise an encrypted bid.
    PlaceBid {
        auction_id: u64,
        encrypted_amount: InputCiphertext,
        encrypted_price: InputCiphertext,
        /// Proof of well-formedness covering both inputs
        proof: Vec<u8>,
    },
}

//! RPC-compatible types for the mock chain.
//!
//! These types are JSON-serializable versions of the core auction types,
//! with addresses, handles and ciphertexts hex-encoded.

use auction_module::BidReceipt;
use auction_types::{Auction, Bid, PaymentMedium};
use serde::{Deserialize, Serialize};

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for crediting a confidential balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintParams {
    pub token: String,
    pub owner: String,
    pub amount: u64,
}

/// Parameters for encrypting bid inputs on the simulated coprocessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptInputsParams {
    pub sender: String,
    pub values: Vec<u64>,
}

/// Encrypted inputs and the proof covering them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedInputsRpc {
    /// Hex-encoded input ciphertexts, in request order
    pub inputs: Vec<String>,
    /// Hex-encoded proof
    pub proof: String,
}

/// Parameters for creating an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionParams {
    pub sender: String,
    pub start_time: u64,
    pub end_time: u64,
    pub asset_token: String,
    pub asset_amount: u128,
    /// Token address; all zeroes for the native currency
    pub payment_token: String,
}

/// Parameters for placing a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidParams {
    pub sender: String,
    pub auction_id: u64,
    /// Hex-encoded input ciphertext
    pub encrypted_amount: String,
    /// Hex-encoded input ciphertext
    pub encrypted_price: String,
    /// Hex-encoded proof
    pub proof: String,
    /// Native currency attached to the call
    #[serde(default)]
    pub value: u128,
}

/// Auction for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRpc {
    pub auction_id: u64,
    pub creator: String,
    pub start_time: u64,
    pub end_time: u64,
    pub asset_token: String,
    pub asset_amount: u128,
    pub payment_token: String,
    pub native_payment: bool,
    pub settled: bool,
}

impl From<&Auction> for AuctionRpc {
    fn from(a: &Auction) -> Self {
        Self {
            auction_id: a.auction_id,
            creator: hex::encode(a.creator),
            start_time: a.start_time,
            end_time: a.end_time,
            asset_token: hex::encode(a.asset_token),
            asset_amount: a.asset_amount,
            payment_token: hex::encode(a.payment_token.to_address()),
            native_payment: matches!(a.payment_token, PaymentMedium::Native),
            settled: a.settled,
        }
    }
}

/// Encrypted bid for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRpc {
    pub at: u64,
    /// Hex-encoded ciphertext handles
    pub amount: String,
    pub price_per_token: String,
    pub deposit: String,
}

impl From<&Bid> for BidRpc {
    fn from(b: &Bid) -> Self {
        Self {
            at: b.at,
            amount: b.amount.handle().to_hex(),
            price_per_token: b.price_per_token.handle().to_hex(),
            deposit: b.deposit.handle().to_hex(),
        }
    }
}

/// Receipt for an accepted bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidReceiptRpc {
    pub auction_id: u64,
    pub bidder: String,
    pub first_bid: bool,
    pub stored: bool,
    /// Hex-encoded handle of the escrowed amount
    pub transfer: Option<String>,
}

impl From<BidReceipt> for BidReceiptRpc {
    fn from(r: BidReceipt) -> Self {
        Self {
            auction_id: r.auction_id,
            bidder: hex::encode(r.bidder),
            first_bid: r.first_bid,
            stored: r.stored,
            transfer: r.transfer.map(|t| t.handle().to_hex()),
        }
    }
}

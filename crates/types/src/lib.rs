//! Core type definitions for confidential sealed-bid auctions.
//!
//! This crate provides the shared data structures used across the auction
//! system: ciphertext handles, auction records, encrypted bids and the
//! notifications emitted by the auction module.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::fmt;

// =========================
// CIPHERTEXT HANDLES
// =========================

/// Opaque reference to a ciphertext held by the FHE coprocessor (32 bytes).
///
/// A handle carries no information about the value it refers to.
#[serde_as]
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Handle(#[serde_as(as = "Hex")] pub [u8; 32]);

impl Handle {
    /// Derive a handle from a domain tag and a sequence number.
    pub fn derive(domain: &[u8], sequence: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"FHE_HANDLE_V1:");
        hasher.update(domain);
        hasher.update(sequence.to_le_bytes());
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Encrypted 64-bit unsigned integer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Euint64(pub Handle);

impl Euint64 {
    pub fn handle(&self) -> Handle {
        self.0
    }
}

/// Encrypted boolean.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Ebool(pub Handle);

impl Ebool {
    pub fn handle(&self) -> Handle {
        self.0
    }
}

/// Raw encrypted input as submitted by a client, before proof validation.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct InputCiphertext(#[serde_as(as = "Hex")] pub Vec<u8>);

// =========================
// AUCTION TYPES
// =========================

/// Generic address type (32 bytes)
pub type Address = [u8; 32];

/// Reserved address denoting the native currency as a payment medium.
pub const NATIVE_CURRENCY: Address = [0u8; 32];

/// Medium accepted as payment for an auction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum PaymentMedium {
    /// The chain's base currency
    Native,
    /// A confidential token held in an external ledger
    Token(Address),
}

impl PaymentMedium {
    /// Interpret an address, mapping the reserved sentinel to `Native`.
    pub fn from_address(address: Address) -> Self {
        if address == NATIVE_CURRENCY {
            Self::Native
        } else {
            Self::Token(address)
        }
    }

    pub fn to_address(&self) -> Address {
        match self {
            Self::Native => NATIVE_CURRENCY,
            Self::Token(address) => *address,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl From<Address> for PaymentMedium {
    fn from(address: Address) -> Self {
        Self::from_address(address)
    }
}

/// Activity phase of an auction, derived from the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// Before start_time
    Pending,
    /// Accepting bids
    Active,
    /// After end_time
    Ended,
}

impl fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Active => f.write_str("active"),
            Self::Ended => f.write_str("ended"),
        }
    }
}

/// Auction record.
///
/// Every field except `settled` is fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Auction {
    pub auction_id: u64,
    pub creator: Address,

    // Timing
    pub start_time: u64,
    pub end_time: u64,

    // Lot
    pub asset_token: Address,
    pub asset_amount: u128,

    // Payment
    pub payment_token: PaymentMedium,

    pub settled: bool,
}

impl Auction {
    /// Phase of the auction at `now`.
    pub fn phase(&self, now: u64) -> AuctionPhase {
        if now < self.start_time {
            AuctionPhase::Pending
        } else if now > self.end_time {
            AuctionPhase::Ended
        } else {
            AuctionPhase::Active
        }
    }

    pub fn is_active(&self, now: u64) -> bool {
        self.phase(now) == AuctionPhase::Active
    }
}

/// A bidder's running encrypted bid (stored on-chain).
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Bid {
    /// Timestamp of the last accepted submission
    pub at: u64,
    /// Token quantity of the bid that set the current deposit
    pub amount: Euint64,
    /// Unit price of the latest submission
    pub price_per_token: Euint64,
    /// Cumulative total price paid into escrow. Native-currency bids hold
    /// the total of the first submission.
    pub deposit: Euint64,
}

/// Notifications emitted by the auction module.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionEvent {
    AuctionCreated {
        auction_id: u64,
        creator: Address,
        asset_token: Address,
        asset_amount: u128,
        payment_token: PaymentMedium,
    },
    BidPlaced {
        auction_id: u64,
        bidder: Address,
        at: u64,
        first_bid: bool,
    },
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}

/// Parse a hex address, tolerating a `0x` prefix and short input.
pub fn parse_address(s: &str) -> Option<Address> {
    let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
    if bytes.len() > 32 {
        return None;
    }
    let mut addr = [0u8; 32];
    addr[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auction(start_time: u64, end_time: u64) -> Auction {
        Auction {
            auction_id: 0,
            creator: [1u8; 32],
            start_time,
            end_time,
            asset_token: [2u8; 32],
            asset_amount: 10,
            payment_token: PaymentMedium::Token([3u8; 32]),
            settled: false,
        }
    }

    #[test]
    fn test_phase_boundaries_are_inclusive() {
        let a = auction(100, 200);
        assert_eq!(a.phase(99), AuctionPhase::Pending);
        assert_eq!(a.phase(100), AuctionPhase::Active);
        assert_eq!(a.phase(150), AuctionPhase::Active);
        assert_eq!(a.phase(200), AuctionPhase::Active);
        assert_eq!(a.phase(201), AuctionPhase::Ended);
    }

    #[test]
    fn test_zero_length_window() {
        let a = auction(50, 50);
        assert!(!a.is_active(49));
        assert!(a.is_active(50));
        assert!(!a.is_active(51));
    }

    #[test]
    fn test_payment_medium_sentinel() {
        assert_eq!(PaymentMedium::from_address(NATIVE_CURRENCY), PaymentMedium::Native);
        assert_eq!(
            PaymentMedium::from([7u8; 32]),
            PaymentMedium::Token([7u8; 32])
        );
        assert_eq!(PaymentMedium::Native.to_address(), NATIVE_CURRENCY);
        assert!(!PaymentMedium::Token([7u8; 32]).is_native());
    }

    #[test]
    fn test_handle_derivation_is_domain_separated() {
        let a = Handle::derive(b"coproc-a", 1);
        let b = Handle::derive(b"coproc-a", 2);
        let c = Handle::derive(b"coproc-b", 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Handle::derive(b"coproc-a", 1));
    }

    #[test]
    fn test_handle_serializes_as_hex() {
        let handle = Handle([0xabu8; 32]);
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let decoded: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, handle);
    }

    #[test]
    fn test_auction_borsh_serialization() {
        let a = auction(1, 2);
        let encoded = borsh::to_vec(&a).unwrap();
        let decoded: Auction = borsh::from_slice(&encoded).unwrap();
        assert_eq!(a, decoded);
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("0x01").unwrap();
        assert_eq!(addr[31], 1);
        assert!(addr[..31].iter().all(|b| *b == 0));
        assert!(parse_address("zz").is_none());
        assert!(parse_address(&"00".repeat(33)).is_none());
    }
}

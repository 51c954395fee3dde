//! On-chain state structures for the auction module.

use auction_types::{Address, Auction, AuctionEvent, Bid};
use std::collections::{BTreeMap, HashMap};

use crate::genesis::{AuctionGenesisConfig, GenesisValidationError};

/// Auction module state.
///
/// In a real Sovereign SDK implementation, these would be StateMap/StateValue types.
/// This is a simplified in-memory representation for development.
#[derive(Debug)]
pub struct AuctionState {
    /// Address the module acts under
    pub module_address: Address,

    /// Account receiving pulled payments
    pub escrow_account: Address,

    /// Next auction ID to assign
    pub next_auction_id: u64,

    /// All auctions by ID
    pub auctions: BTreeMap<u64, Auction>,

    /// Encrypted bids: (auction_id, bidder) -> bid
    pub bids: HashMap<(u64, Address), Bid>,

    /// Bidders per auction, in order of first bid
    pub auction_bidders: HashMap<u64, Vec<Address>>,

    /// Emitted notifications
    pub events: Vec<AuctionEvent>,
}

/// Writes made during one call, so they can be undone if the call aborts.
#[derive(Debug, Default)]
pub struct Journal {
    bids: Vec<((u64, Address), Option<Bid>)>,
    events_len: usize,
}

impl Default for AuctionState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuctionState {
    /// Create a new auction state with the default genesis configuration.
    pub fn new() -> Self {
        Self::with_config(&AuctionGenesisConfig::default())
    }

    /// Create state from a validated genesis configuration.
    pub fn from_genesis(config: &AuctionGenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: &AuctionGenesisConfig) -> Self {
        Self {
            module_address: config.module_address,
            escrow_account: config.escrow_account(),
            next_auction_id: config.first_auction_id,
            auctions: BTreeMap::new(),
            bids: HashMap::new(),
            auction_bidders: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&mut self) -> u64 {
        let id = self.next_auction_id;
        self.next_auction_id += 1;
        id
    }

    /// Get auction by ID.
    pub fn get_auction(&self, auction_id: u64) -> Option<&Auction> {
        self.auctions.get(&auction_id)
    }

    /// Get a bidder's current bid.
    pub fn get_bid(&self, auction_id: u64, bidder: &Address) -> Option<&Bid> {
        self.bids.get(&(auction_id, *bidder))
    }

    /// Bidders of an auction, in order of first bid.
    pub fn bidders(&self, auction_id: u64) -> &[Address] {
        self.auction_bidders
            .get(&auction_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn bid_count(&self, auction_id: u64) -> usize {
        self.bidders(auction_id).len()
    }

    /// Start recording writes.
    pub fn checkpoint(&self) -> Journal {
        Journal {
            bids: Vec::new(),
            events_len: self.events.len(),
        }
    }

    /// Store a bid, recording the entry it replaces.
    pub fn put_bid(&mut self, journal: &mut Journal, auction_id: u64, bidder: Address, bid: Bid) {
        let key = (auction_id, bidder);
        let previous = self.bids.insert(key, bid);
        if previous.is_none() {
            self.auction_bidders
                .entry(auction_id)
                .or_default()
                .push(bidder);
        }
        journal.bids.push((key, previous));
    }

    pub fn emit(&mut self, event: AuctionEvent) {
        self.events.push(event);
    }

    /// Undo every write recorded in `journal`.
    pub fn revert(&mut self, journal: Journal) {
        for (key, previous) in journal.bids.into_iter().rev() {
            match previous {
                Some(bid) => {
                    self.bids.insert(key, bid);
                }
                None => {
                    self.bids.remove(&key);
                    let (auction_id, bidder) = key;
                    if let Some(bidders) = self.auction_bidders.get_mut(&auction_id) {
                        bidders.retain(|b| *b != bidder);
                    }
                }
            }
        }
        self.events.truncate(journal.events_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_types::{Euint64, Handle};

    fn bid(seed: u8, at: u64) -> Bid {
        Bid {
            at,
            amount: Euint64(Handle([seed; 32])),
            price_per_token: Euint64(Handle([seed + 1; 32])),
            deposit: Euint64(Handle([seed + 2; 32])),
        }
    }

    #[test]
    fn test_allocate_auction_id() {
        let mut state = AuctionState::new();
        assert_eq!(state.allocate_auction_id(), 0);
        assert_eq!(state.allocate_auction_id(), 1);
        assert_eq!(state.allocate_auction_id(), 2);
    }

    #[test]
    fn test_genesis_first_auction_id() {
        let config = AuctionGenesisConfig {
            first_auction_id: 40,
            ..Default::default()
        };
        let mut state = AuctionState::from_genesis(&config).unwrap();
        assert_eq!(state.allocate_auction_id(), 40);
    }

    #[test]
    fn test_put_bid_tracks_bidders_once() {
        let mut state = AuctionState::new();
        let bidder = [1u8; 32];
        let mut journal = state.checkpoint();

        state.put_bid(&mut journal, 0, bidder, bid(10, 1));
        state.put_bid(&mut journal, 0, bidder, bid(20, 2));

        assert_eq!(state.bidders(0), &[bidder]);
        assert_eq!(state.get_bid(0, &bidder), Some(&bid(20, 2)));
        assert_eq!(state.bid_count(1), 0);
    }

    #[test]
    fn test_revert_restores_previous_entries() {
        let mut state = AuctionState::new();
        let alice = [1u8; 32];
        let bob = [2u8; 32];

        let mut setup = state.checkpoint();
        state.put_bid(&mut setup, 0, alice, bid(10, 1));

        let mut journal = state.checkpoint();
        state.put_bid(&mut journal, 0, alice, bid(20, 2));
        state.put_bid(&mut journal, 0, bob, bid(30, 3));
        state.emit(AuctionEvent::BidPlaced {
            auction_id: 0,
            bidder: bob,
            at: 3,
            first_bid: true,
        });

        state.revert(journal);

        assert_eq!(state.get_bid(0, &alice), Some(&bid(10, 1)));
        assert!(state.get_bid(0, &bob).is_none());
        assert_eq!(state.bidders(0), &[alice]);
        assert!(state.events.is_empty());
    }
}

//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state. Bids are
//! returned as ciphertext handles only.

use crate::state::AuctionState as ModuleState;
use auction_types::{Address, Auction, AuctionEvent, AuctionPhase, Bid, PaymentMedium};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get auction details by ID.
    GetAuction { auction_id: u64 },

    /// Get all auctions (paginated).
    ListAuctions { offset: u64, limit: u64 },

    /// Get a specific bid.
    GetBid { auction_id: u64, bidder: Address },

    /// Get bidders of an auction.
    GetBidders { auction_id: u64 },

    /// Get the phase of an auction at a given time.
    GetAuctionPhase { auction_id: u64, now: u64 },

    /// Get emitted notifications (paginated).
    GetEvents { offset: u64, limit: u64 },
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    /// Auction details.
    Auction(Option<Auction>),

    /// List of auctions.
    AuctionList(Vec<Auction>),

    /// Single bid.
    Bid(Option<Bid>),

    /// Bidders in order of first bid.
    Bidders(Vec<Address>),

    /// Auction phase.
    Phase(Option<AuctionPhase>),

    /// Notifications.
    Events(Vec<AuctionEvent>),
}

/// Handle a query.
pub fn handle_query(state: &ModuleState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetAuction { auction_id } => {
            AuctionQueryResponse::Auction(state.get_auction(auction_id).cloned())
        }

        AuctionQuery::ListAuctions { offset, limit } => {
            let auctions: Vec<Auction> = state
                .auctions
                .values()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect();
            AuctionQueryResponse::AuctionList(auctions)
        }

        AuctionQuery::GetBid { auction_id, bidder } => {
            AuctionQueryResponse::Bid(state.get_bid(auction_id, &bidder).cloned())
        }

        AuctionQuery::GetBidders { auction_id } => {
            AuctionQueryResponse::Bidders(state.bidders(auction_id).to_vec())
        }

        AuctionQuery::GetAuctionPhase { auction_id, now } => {
            AuctionQueryResponse::Phase(state.get_auction(auction_id).map(|a| a.phase(now)))
        }

        AuctionQuery::GetEvents { offset, limit } => {
            let events = state
                .events
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect();
            AuctionQueryResponse::Events(events)
        }
    }
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub creator: Address,
    pub payment_token: PaymentMedium,
    pub phase: AuctionPhase,
    pub start_time: u64,
    pub end_time: u64,
    pub num_bids: usize,
}

impl AuctionSummary {
    /// Create summary from an auction at the given time.
    pub fn from_auction(auction: &Auction, now: u64, num_bids: usize) -> Self {
        Self {
            auction_id: auction.auction_id,
            creator: auction.creator,
            payment_token: auction.payment_token,
            phase: auction.phase(now),
            start_time: auction.start_time,
            end_time: auction.end_time,
            num_bids,
        }
    }
}

/// Get auction summaries for listing.
pub fn get_auction_summaries(
    state: &ModuleState,
    now: u64,
    offset: usize,
    limit: usize,
) -> Vec<AuctionSummary> {
    state
        .auctions
        .values()
        .skip(offset)
        .take(limit)
        .map(|auction| AuctionSummary::from_auction(auction, now, state.bid_count(auction.auction_id)))
        .collect()
}

/// Get active auctions (currently accepting bids).
pub fn get_active_auctions(state: &ModuleState, now: u64) -> Vec<AuctionSummary> {
    state
        .auctions
        .values()
        .filter(|auction| auction.is_active(now))
        .map(|auction| AuctionSummary::from_auction(auction, now, state.bid_count(auction.auction_id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{handle_create_auction, CallContext};

    fn state_with_auctions() -> ModuleState {
        let mut state = ModuleState::new();
        let ctx = CallContext {
            sender: [1u8; 32],
            block_height: 1,
            timestamp: 0,
            value: 0,
        };
        handle_create_auction(&mut state, &ctx, 100, 200, [2u8; 32], 1, [3u8; 32]).unwrap();
        handle_create_auction(&mut state, &ctx, 300, 400, [2u8; 32], 1, [0u8; 32]).unwrap();
        handle_create_auction(&mut state, &ctx, 150, 350, [2u8; 32], 1, [3u8; 32]).unwrap();
        state
    }

    #[test]
    fn test_get_auction_query() {
        let state = state_with_auctions();
        let response = handle_query(&state, AuctionQuery::GetAuction { auction_id: 1 });
        let AuctionQueryResponse::Auction(Some(auction)) = response else {
            panic!("expected auction");
        };
        assert_eq!(auction.payment_token, PaymentMedium::Native);

        let response = handle_query(&state, AuctionQuery::GetAuction { auction_id: 7 });
        assert_eq!(response, AuctionQueryResponse::Auction(None));
    }

    #[test]
    fn test_list_auctions_paginates_in_id_order() {
        let state = state_with_auctions();
        let response = handle_query(&state, AuctionQuery::ListAuctions { offset: 1, limit: 5 });
        let AuctionQueryResponse::AuctionList(auctions) = response else {
            panic!("expected list");
        };
        let ids: Vec<u64> = auctions.iter().map(|a| a.auction_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_phase_query() {
        let state = state_with_auctions();
        assert_eq!(
            handle_query(&state, AuctionQuery::GetAuctionPhase { auction_id: 0, now: 250 }),
            AuctionQueryResponse::Phase(Some(AuctionPhase::Ended))
        );
        assert_eq!(
            handle_query(&state, AuctionQuery::GetAuctionPhase { auction_id: 9, now: 250 }),
            AuctionQueryResponse::Phase(None)
        );
    }

    #[test]
    fn test_missing_bid_and_bidders() {
        let state = state_with_auctions();
        assert_eq!(
            handle_query(
                &state,
                AuctionQuery::GetBid {
                    auction_id: 0,
                    bidder: [9u8; 32]
                }
            ),
            AuctionQueryResponse::Bid(None)
        );
        assert_eq!(
            handle_query(&state, AuctionQuery::GetBidders { auction_id: 0 }),
            AuctionQueryResponse::Bidders(vec![])
        );
    }

    #[test]
    fn test_events_query() {
        let state = state_with_auctions();
        let response = handle_query(&state, AuctionQuery::GetEvents { offset: 2, limit: 10 });
        let AuctionQueryResponse::Events(events) = response else {
            panic!("expected events");
        };
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            AuctionEvent::AuctionCreated { auction_id: 2, .. }
        ));
    }

    #[test]
    fn test_active_auctions() {
        let state = state_with_auctions();
        let ids: Vec<u64> = get_active_auctions(&state, 175)
            .into_iter()
            .map(|s| s.auction_id)
            .collect();
        assert_eq!(ids, vec![0, 2]);

        let summaries = get_auction_summaries(&state, 50, 0, 10);
        assert_eq!(summaries.len(), 3);
        assert!(summaries.iter().all(|s| s.phase == AuctionPhase::Pending));
    }
}

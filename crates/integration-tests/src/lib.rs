//! End-to-end integration tests for the confidential auction system.
//!
//! These tests exercise the full bidding lifecycle against the simulated
//! coprocessor and confidential ledger:
//! 1. Token registration and funding
//! 2. Auction creation
//! 3. Client-side input encryption
//! 4. Bid submission, re-bids and escrow
//! 5. Window enforcement

#![cfg(test)]

use auction_fhe::{ConfidentialLedger, MockCoprocessor};
use auction_module::{handlers, AuctionError, AuctionState, BidReceipt, CallContext, HandlerResult};
use auction_types::{Address, AuctionEvent, AuctionPhase, NATIVE_CURRENCY};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CREATOR: Address = [0x11; 32];
const ALICE: Address = [0xa1; 32];
const BOB: Address = [0xb0; 32];
const CAROL: Address = [0xc0; 32];
const ASSET: Address = [0x33; 32];
const TOKEN: Address = [0x44; 32];

const FUNDING: u64 = 1_000_000_000;

/// A chain in miniature: module state, coprocessor and payment ledger.
struct Chain {
    state: AuctionState,
    fhe: MockCoprocessor,
    ledger: ConfidentialLedger,
    height: u64,
}

impl Chain {
    fn new() -> Self {
        let mut chain = Self {
            state: AuctionState::new(),
            fhe: MockCoprocessor::new(),
            ledger: ConfidentialLedger::new(),
            height: 0,
        };
        chain.ledger.register_token(TOKEN);
        for owner in [ALICE, BOB] {
            chain
                .ledger
                .mint(&mut chain.fhe, TOKEN, owner, FUNDING)
                .unwrap();
        }
        chain
    }

    fn ctx(&mut self, sender: Address, timestamp: u64) -> CallContext {
        self.height += 1;
        CallContext {
            sender,
            block_height: self.height,
            timestamp,
            value: 0,
        }
    }

    fn create(&mut self, start: u64, end: u64, payment_token: Address) -> u64 {
        let ctx = self.ctx(CREATOR, 0);
        handlers::handle_create_auction(&mut self.state, &ctx, start, end, ASSET, 1_000, payment_token)
            .unwrap()
    }

    fn bid(
        &mut self,
        bidder: Address,
        auction_id: u64,
        at: u64,
        amount: u64,
        price: u64,
    ) -> HandlerResult<BidReceipt> {
        let (inputs, proof) =
            self.fhe
                .encrypt_inputs(&[amount, price], bidder, self.state.module_address);
        let ctx = self.ctx(bidder, at);
        handlers::handle_place_bid(
            &mut self.state,
            &ctx,
            &mut self.fhe,
            &mut self.ledger,
            auction_id,
            &inputs[0],
            &inputs[1],
            &proof,
        )
    }

    fn balance(&self, owner: &Address) -> u64 {
        self.ledger
            .balance_of(&TOKEN, owner)
            .map(|b| self.fhe.decrypt(b).unwrap())
            .unwrap_or(0)
    }

    fn escrowed(&self) -> u64 {
        self.balance(&self.state.escrow_account)
    }

    /// Decrypted (amount, price, deposit, at) of a stored bid.
    fn revealed(&self, auction_id: u64, bidder: &Address) -> (u64, u64, u64, u64) {
        let bid = self.state.get_bid(auction_id, bidder).unwrap();
        (
            self.fhe.decrypt(bid.amount).unwrap(),
            self.fhe.decrypt(bid.price_per_token).unwrap(),
            self.fhe.decrypt(bid.deposit).unwrap(),
            bid.at,
        )
    }
}

/// Raise, then shrink, then bid after the window.
#[test]
fn test_bid_raise_shrink_and_close() {
    let mut chain = Chain::new();

    // ========================================
    // Phase 1: Create auction
    // ========================================

    let auction_id = chain.create(100, 200, TOKEN);
    assert_eq!(chain.state.get_auction(auction_id).unwrap().phase(150), AuctionPhase::Active);

    println!("Auction {} created", auction_id);

    // ========================================
    // Phase 2: First bid
    // ========================================

    let receipt = chain.bid(ALICE, auction_id, 150, 5, 10).unwrap();
    assert!(receipt.first_bid);
    assert_eq!(chain.escrowed(), 50);
    assert_eq!(chain.revealed(auction_id, &ALICE), (5, 10, 50, 150));

    println!("First bid escrowed 50");

    // ========================================
    // Phase 3: Raise
    // ========================================

    let receipt = chain.bid(ALICE, auction_id, 160, 5, 20).unwrap();
    assert!(!receipt.first_bid);
    assert_eq!(chain.fhe.decrypt(receipt.transfer.unwrap()).unwrap(), 50);
    assert_eq!(chain.escrowed(), 100);
    assert_eq!(chain.revealed(auction_id, &ALICE), (5, 20, 100, 160));

    println!("Raise escrowed a further 50");

    // ========================================
    // Phase 4: Shrink
    // ========================================

    let receipt = chain.bid(ALICE, auction_id, 170, 2, 10).unwrap();
    assert_eq!(chain.fhe.decrypt(receipt.transfer.unwrap()).unwrap(), 0);
    assert_eq!(chain.escrowed(), 100);
    let (amount, price, deposit, at) = chain.revealed(auction_id, &ALICE);
    assert_eq!((amount, price, deposit, at), (5, 10, 100, 170));
    assert_eq!(chain.balance(&ALICE), FUNDING - 100);

    println!("Shrink moved nothing");

    // ========================================
    // Phase 5: Window closed
    // ========================================

    let events_before = chain.state.events.len();
    assert_eq!(
        chain.bid(ALICE, auction_id, 201, 50, 50),
        Err(AuctionError::AuctionNotActive {
            auction_id,
            phase: AuctionPhase::Ended,
        })
    );
    assert_eq!(chain.escrowed(), 100);
    assert_eq!(chain.revealed(auction_id, &ALICE).3, 170);
    assert_eq!(chain.state.events.len(), events_before);

    println!("Late bid rejected");
}

#[test]
fn test_window_boundaries_are_inclusive() {
    let mut chain = Chain::new();
    let auction_id = chain.create(100, 200, TOKEN);

    assert!(matches!(
        chain.bid(ALICE, auction_id, 99, 1, 1),
        Err(AuctionError::AuctionNotActive {
            phase: AuctionPhase::Pending,
            ..
        })
    ));
    assert_eq!(chain.balance(&ALICE), FUNDING);
    assert!(chain.state.get_bid(auction_id, &ALICE).is_none());

    chain.bid(ALICE, auction_id, 100, 1, 1).unwrap();
    chain.bid(BOB, auction_id, 200, 1, 1).unwrap();
    assert_eq!(chain.escrowed(), 2);
}

#[test]
fn test_auction_ids_strictly_increase() {
    let mut chain = Chain::new();
    let ids: Vec<u64> = (0..5).map(|i| chain.create(i, i + 10, TOKEN)).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(chain.state.auctions.len(), 5);
}

#[test]
fn test_identical_rebid_moves_nothing() {
    let mut chain = Chain::new();
    let auction_id = chain.create(100, 200, TOKEN);

    chain.bid(ALICE, auction_id, 120, 7, 3).unwrap();
    chain.bid(ALICE, auction_id, 130, 7, 3).unwrap();
    chain.bid(ALICE, auction_id, 140, 7, 3).unwrap();

    assert_eq!(chain.escrowed(), 21);
    assert_eq!(chain.revealed(auction_id, &ALICE), (7, 3, 21, 140));
}

#[test]
fn test_bidders_are_independent() {
    let mut chain = Chain::new();
    let first = chain.create(100, 200, TOKEN);
    let second = chain.create(100, 200, TOKEN);

    chain.bid(ALICE, first, 150, 4, 25).unwrap();
    chain.bid(BOB, first, 151, 1, 10).unwrap();
    chain.bid(ALICE, second, 152, 2, 2).unwrap();
    chain.bid(BOB, first, 153, 3, 10).unwrap();

    assert_eq!(chain.revealed(first, &ALICE), (4, 25, 100, 150));
    assert_eq!(chain.revealed(first, &BOB), (3, 10, 30, 153));
    assert_eq!(chain.revealed(second, &ALICE), (2, 2, 4, 152));
    assert!(chain.state.get_bid(second, &BOB).is_none());

    assert_eq!(chain.balance(&ALICE), FUNDING - 104);
    assert_eq!(chain.balance(&BOB), FUNDING - 30);
    assert_eq!(chain.escrowed(), 134);
    assert_eq!(chain.state.bidders(first), &[ALICE, BOB]);
}

#[test]
fn test_native_currency_auction() {
    let mut chain = Chain::new();
    let auction_id = chain.create(100, 200, NATIVE_CURRENCY);

    let receipt = chain.bid(ALICE, auction_id, 150, 5, 10).unwrap();
    assert!(receipt.first_bid);
    assert!(receipt.transfer.is_none());
    assert_eq!(chain.revealed(auction_id, &ALICE), (5, 10, 50, 150));

    let receipt = chain.bid(ALICE, auction_id, 160, 9, 9).unwrap();
    assert!(!receipt.stored);
    assert_eq!(chain.revealed(auction_id, &ALICE), (5, 10, 50, 150));

    assert_eq!(chain.escrowed(), 0);
    assert_eq!(chain.balance(&ALICE), FUNDING);
}

#[test]
fn test_events_follow_accepted_calls() {
    let mut chain = Chain::new();
    let auction_id = chain.create(100, 200, TOKEN);

    chain.bid(ALICE, auction_id, 150, 1, 1).unwrap();
    chain.bid(ALICE, auction_id, 250, 1, 1).unwrap_err();
    chain.bid(ALICE, auction_id, 160, 2, 1).unwrap();

    let placed: Vec<(u64, bool)> = chain
        .state
        .events
        .iter()
        .filter_map(|event| match event {
            AuctionEvent::BidPlaced { at, first_bid, .. } => Some((*at, *first_bid)),
            _ => None,
        })
        .collect();
    assert_eq!(placed, vec![(150, true), (160, false)]);
}

#[test]
fn test_underfunded_bidder_deposits_only_what_was_paid() {
    let mut chain = Chain::new();
    chain.ledger.mint(&mut chain.fhe, TOKEN, CAROL, 10).unwrap();
    let auction_id = chain.create(100, 200, TOKEN);

    let receipt = chain.bid(CAROL, auction_id, 150, 5, 10).unwrap();
    assert!(receipt.first_bid);
    assert_eq!(chain.fhe.decrypt(receipt.transfer.unwrap()).unwrap(), 0);

    let (amount, price, deposit, _) = chain.revealed(auction_id, &CAROL);
    assert_eq!((amount, price), (5, 10));
    assert_eq!(deposit, chain.escrowed());
    assert_eq!(deposit, 0);
    assert_eq!(chain.balance(&CAROL), 10);

    // Once funded, the next raise is measured against what was really paid.
    chain.ledger.mint(&mut chain.fhe, TOKEN, CAROL, 100).unwrap();
    let receipt = chain.bid(CAROL, auction_id, 160, 2, 4).unwrap();
    assert_eq!(chain.fhe.decrypt(receipt.transfer.unwrap()).unwrap(), 8);
    assert_eq!(chain.revealed(auction_id, &CAROL).2, 8);
    assert_eq!(chain.escrowed(), 8);
    assert_eq!(chain.balance(&CAROL), 102);
}

/// Random bid sequences: escrow always equals the highest total seen.
#[test]
fn test_escrow_tracks_highest_total() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for round in 0..20 {
        let mut chain = Chain::new();
        let auction_id = chain.create(0, u64::MAX, TOKEN);
        let mut highest = 0u64;

        for step in 0..rng.gen_range(1..12) {
            let amount = rng.gen_range(0..1_000u64);
            let price = rng.gen_range(0..1_000u64);
            chain.bid(ALICE, auction_id, step, amount, price).unwrap();
            highest = highest.max(amount * price);

            let (_, stored_price, deposit, _) = chain.revealed(auction_id, &ALICE);
            assert_eq!(stored_price, price, "round {round} step {step}");
            assert_eq!(deposit, highest, "round {round} step {step}");
            assert_eq!(chain.escrowed(), highest, "round {round} step {step}");
            assert_eq!(chain.balance(&ALICE), FUNDING - highest);
        }
    }
}

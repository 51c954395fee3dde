//! Call handlers for the auction module.
//!
//! These functions implement the business logic for each call type. Every
//! handler runs to completion or leaves the module state as it found it.

use auction_fhe::{FheCoprocessor, InputVerifier, PaymentEscrow, TransientScope};
use auction_types::{
    Address, Auction, AuctionEvent, AuctionPhase, Euint64, InputCiphertext, PaymentMedium,
};
use tracing::{debug, info, warn};

use crate::call::AuctionCall;
use crate::engine;
use crate::error::AuctionError;
use crate::state::AuctionState as ModuleState;

/// Context provided by the runtime for each call.
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp
    pub timestamp: u64,
    /// Native currency attached to the call
    pub value: u128,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Receipt for an accepted bid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidReceipt {
    pub auction_id: u64,
    pub bidder: Address,
    pub first_bid: bool,
    /// Whether the ledger entry was written
    pub stored: bool,
    /// Encrypted amount the escrow moved, if it was called
    pub transfer: Option<Euint64>,
}

/// Result of a dispatched call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    AuctionCreated(u64),
    BidPlaced(BidReceipt),
}

/// Route a call message to its handler.
pub fn dispatch<F, E>(
    state: &mut ModuleState,
    ctx: &CallContext,
    fhe: &mut F,
    escrow: &mut E,
    call: AuctionCall,
) -> HandlerResult<CallOutcome>
where
    F: FheCoprocessor + InputVerifier,
    E: PaymentEscrow<F>,
{
    match call {
        AuctionCall::CreateAuction {
            start_time,
            end_time,
            asset_token,
            asset_amount,
            payment_token,
        } => handle_create_auction(
            state,
            ctx,
            start_time,
            end_time,
            asset_token,
            asset_amount,
            payment_token,
        )
        .map(CallOutcome::AuctionCreated),

        AuctionCall::PlaceBid {
            auction_id,
            encrypted_amount,
            encrypted_price,
            proof,
        } => handle_place_bid(
            state,
            ctx,
            fhe,
            escrow,
            auction_id,
            &encrypted_amount,
            &encrypted_price,
            &proof,
        )
        .map(CallOutcome::BidPlaced),
    }
}

/// Handle CreateAuction call.
///
/// Timing and amount are stored as given.
pub fn handle_create_auction(
    state: &mut ModuleState,
    ctx: &CallContext,
    start_time: u64,
    end_time: u64,
    asset_token: Address,
    asset_amount: u128,
    payment_token: Address,
) -> HandlerResult<u64> {
    let auction_id = state.allocate_auction_id();
    let payment_token = PaymentMedium::from_address(payment_token);

    let auction = Auction {
        auction_id,
        creator: ctx.sender,
        start_time,
        end_time,
        asset_token,
        asset_amount,
        payment_token,
        settled: false,
    };

    state.auctions.insert(auction_id, auction);
    state.emit(AuctionEvent::AuctionCreated {
        auction_id,
        creator: ctx.sender,
        asset_token,
        asset_amount,
        payment_token,
    });

    info!(
        auction_id,
        creator = %hex::encode(ctx.sender),
        start_time,
        end_time,
        "Created auction"
    );
    Ok(auction_id)
}

/// Handle PlaceBid call.
///
/// Ledger writes happen before the escrow pull and are reverted if the pull
/// fails. The stored deposit grows by the amount the escrow reports as moved,
/// which is zero when the bidder cannot cover the increment. Transient grants
/// end with the call, and ciphertexts of a failed call are discarded.
pub fn handle_place_bid<F, E>(
    state: &mut ModuleState,
    ctx: &CallContext,
    fhe: &mut F,
    escrow: &mut E,
    auction_id: u64,
    encrypted_amount: &InputCiphertext,
    encrypted_price: &InputCiphertext,
    proof: &[u8],
) -> HandlerResult<BidReceipt>
where
    F: FheCoprocessor + InputVerifier,
    E: PaymentEscrow<F>,
{
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    let phase = auction.phase(ctx.timestamp);
    if phase != AuctionPhase::Active {
        return Err(AuctionError::AuctionNotActive { auction_id, phase });
    }
    let payment = auction.payment_token;
    let contract = state.module_address;
    let prior_deposit = state.get_bid(auction_id, &ctx.sender).map(|bid| bid.deposit);

    let mut fhe = TransientScope::new(fhe);

    let new_amount = fhe
        .verify_input(encrypted_amount, proof, ctx.sender, contract)
        .map_err(AuctionError::InvalidInput)?;
    let new_price = fhe
        .verify_input(encrypted_price, proof, ctx.sender, contract)
        .map_err(AuctionError::InvalidInput)?;

    let update = engine::update_bid(
        &mut *fhe,
        payment,
        state.get_bid(auction_id, &ctx.sender),
        ctx.timestamp,
        new_amount,
        new_price,
    )?;

    let mut journal = state.checkpoint();
    let mut stored = update.bid;
    if let Some(bid) = &stored {
        state.put_bid(&mut journal, auction_id, ctx.sender, bid.clone());
        state.emit(AuctionEvent::BidPlaced {
            auction_id,
            bidder: ctx.sender,
            at: ctx.timestamp,
            first_bid: update.first_bid,
        });
    }

    let mut transfer = update.transfer;
    if let (Some(amount), PaymentMedium::Token(token)) = (update.transfer, payment) {
        fhe.allow_transient(amount.handle(), token);
        let escrow_account = state.escrow_account;
        let moved = match escrow.pull(&mut *fhe, token, ctx.sender, escrow_account, amount) {
            Ok(moved) => moved,
            Err(err) => {
                warn!(auction_id, error = %err, "Escrow pull failed, reverting bid");
                state.revert(journal);
                return Err(err.into());
            }
        };

        // The deposit counts what the escrow moved, not what was owed.
        let deposit = match prior_deposit {
            Some(prior) => fhe.add(prior, moved),
            None => Ok(moved),
        };
        let deposit = match deposit {
            Ok(deposit) => deposit,
            Err(err) => {
                state.revert(journal);
                return Err(err.into());
            }
        };
        if let Some(bid) = stored.as_mut() {
            bid.deposit = deposit;
            state.put_bid(&mut journal, auction_id, ctx.sender, bid.clone());
        }
        transfer = Some(moved);
    }

    // The call can no longer fail; hand the stored ciphertexts to their owners.
    if let Some(bid) = &stored {
        for handle in [bid.amount, bid.price_per_token, bid.deposit].map(|c| c.handle()) {
            fhe.allow(handle, contract);
            fhe.allow(handle, ctx.sender);
        }
    }
    fhe.commit();

    if payment.is_native() && ctx.value > 0 {
        debug!(auction_id, value = ctx.value, "Native value attached to bid");
    }

    info!(
        auction_id,
        bidder = %hex::encode(ctx.sender),
        first_bid = update.first_bid,
        "Bid placed"
    );

    Ok(BidReceipt {
        auction_id,
        bidder: ctx.sender,
        first_bid: update.first_bid,
        stored: stored.is_some(),
        transfer,
    })
}

//! Oblivious bid update.
//!
//! Given a bidder's stored bid and a freshly submitted (amount, price) pair,
//! computes the bid to store and the payment to pull without learning which
//! bid is larger. Plaintext control flow depends only on whether a prior bid
//! exists and on the auction's payment medium, both of which are public.
//!
//! For a re-bid the increment is computed for both orderings:
//!
//! ```text
//! is_higher   = deposit < new_total
//! raw_delta   = new_total - deposit        (wraps when the bid shrank)
//! to_transfer = is_higher ? raw_delta : 0
//! deposit'    = deposit + to_transfer
//! ```
//!
//! `select` discards the wrapped value, so the stored deposit never
//! decreases and never absorbs an underflow.

use auction_fhe::{FheCoprocessor, FheResult};
use auction_types::{Bid, Euint64, PaymentMedium};

/// Outcome of an oblivious update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidUpdate {
    /// Bid to store; `None` leaves the ledger entry untouched.
    /// Its deposit assumes `transfer` is paid in full.
    pub bid: Option<Bid>,
    /// Amount to pull into escrow; `None` means no escrow interaction
    pub transfer: Option<Euint64>,
    /// Whether this was the bidder's first accepted submission
    pub first_bid: bool,
}

/// Compute the new stored bid and the incremental payment.
pub fn update_bid<C: FheCoprocessor + ?Sized>(
    fhe: &mut C,
    payment: PaymentMedium,
    existing: Option<&Bid>,
    now: u64,
    new_amount: Euint64,
    new_price: Euint64,
) -> FheResult<BidUpdate> {
    let new_total = fhe.mul(new_amount, new_price)?;

    let Some(existing) = existing else {
        let bid = Bid {
            at: now,
            amount: new_amount,
            price_per_token: new_price,
            deposit: new_total,
        };
        // Native-currency first bids record the bid but never reach escrow.
        let transfer = (!payment.is_native()).then_some(new_total);
        return Ok(BidUpdate {
            bid: Some(bid),
            transfer,
            first_bid: true,
        });
    };

    if payment.is_native() {
        // Native-currency re-bids are accepted without any effect.
        return Ok(BidUpdate {
            bid: None,
            transfer: None,
            first_bid: false,
        });
    }

    let current_total = existing.deposit;
    let is_higher = fhe.lt(current_total, new_total)?;
    let raw_delta = fhe.sub(new_total, current_total)?;
    let zero = fhe.trivial_encrypt(0)?;
    let to_transfer = fhe.select(is_higher, raw_delta, zero)?;

    let bid = Bid {
        at: now,
        amount: fhe.select(is_higher, new_amount, existing.amount)?,
        price_per_token: new_price,
        deposit: fhe.add(existing.deposit, to_transfer)?,
    };

    Ok(BidUpdate {
        bid: Some(bid),
        transfer: Some(to_transfer),
        first_bid: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_fhe::MockCoprocessor;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOKEN: PaymentMedium = PaymentMedium::Token([5u8; 32]);

    struct Plain {
        amount: u64,
        price: u64,
        deposit: u64,
    }

    fn encrypt(fhe: &mut MockCoprocessor, amount: u64, price: u64) -> (Euint64, Euint64) {
        (
            fhe.trivial_encrypt(amount).unwrap(),
            fhe.trivial_encrypt(price).unwrap(),
        )
    }

    fn reveal(fhe: &MockCoprocessor, bid: &Bid) -> Plain {
        Plain {
            amount: fhe.decrypt(bid.amount).unwrap(),
            price: fhe.decrypt(bid.price_per_token).unwrap(),
            deposit: fhe.decrypt(bid.deposit).unwrap(),
        }
    }

    fn first_bid(fhe: &mut MockCoprocessor, amount: u64, price: u64) -> Bid {
        let (a, p) = encrypt(fhe, amount, price);
        update_bid(fhe, TOKEN, None, 150, a, p).unwrap().bid.unwrap()
    }

    #[test]
    fn test_first_bid_owes_full_total() {
        let mut fhe = MockCoprocessor::with_key([1u8; 32]);
        let (amount, price) = encrypt(&mut fhe, 5, 10);

        let update = update_bid(&mut fhe, TOKEN, None, 150, amount, price).unwrap();
        assert!(update.first_bid);

        let bid = update.bid.unwrap();
        let plain = reveal(&fhe, &bid);
        assert_eq!(bid.at, 150);
        assert_eq!((plain.amount, plain.price, plain.deposit), (5, 10, 50));
        assert_eq!(fhe.decrypt(update.transfer.unwrap()).unwrap(), 50);
    }

    #[test]
    fn test_higher_rebid_pays_difference() {
        let mut fhe = MockCoprocessor::with_key([1u8; 32]);
        let existing = first_bid(&mut fhe, 5, 10);
        let (amount, price) = encrypt(&mut fhe, 5, 20);

        let update = update_bid(&mut fhe, TOKEN, Some(&existing), 160, amount, price).unwrap();
        assert!(!update.first_bid);
        assert_eq!(fhe.decrypt(update.transfer.unwrap()).unwrap(), 50);

        let bid = update.bid.unwrap();
        let plain = reveal(&fhe, &bid);
        assert_eq!(bid.at, 160);
        assert_eq!((plain.amount, plain.price, plain.deposit), (5, 20, 100));
    }

    #[test]
    fn test_lower_rebid_pays_nothing_but_overwrites_price() {
        let mut fhe = MockCoprocessor::with_key([1u8; 32]);
        let existing = first_bid(&mut fhe, 5, 20);
        let (amount, price) = encrypt(&mut fhe, 2, 10);

        let update = update_bid(&mut fhe, TOKEN, Some(&existing), 170, amount, price).unwrap();
        assert_eq!(fhe.decrypt(update.transfer.unwrap()).unwrap(), 0);

        let plain = reveal(&fhe, &update.bid.unwrap());
        assert_eq!(plain.deposit, 100);
        assert_eq!(plain.amount, 5);
        assert_eq!(plain.price, 10);
    }

    #[test]
    fn test_identical_rebid_is_idempotent() {
        let mut fhe = MockCoprocessor::with_key([1u8; 32]);
        let existing = first_bid(&mut fhe, 7, 3);
        let (amount, price) = encrypt(&mut fhe, 7, 3);

        let update = update_bid(&mut fhe, TOKEN, Some(&existing), 151, amount, price).unwrap();
        assert_eq!(fhe.decrypt(update.transfer.unwrap()).unwrap(), 0);
        assert_eq!(reveal(&fhe, &update.bid.unwrap()).deposit, 21);
    }

    #[test]
    fn test_native_first_bid_records_without_transfer() {
        let mut fhe = MockCoprocessor::with_key([1u8; 32]);
        let (amount, price) = encrypt(&mut fhe, 4, 4);

        let update =
            update_bid(&mut fhe, PaymentMedium::Native, None, 150, amount, price).unwrap();
        assert!(update.first_bid);
        assert!(update.transfer.is_none());
        assert_eq!(reveal(&fhe, &update.bid.unwrap()).deposit, 16);
    }

    #[test]
    fn test_native_rebid_is_a_no_op() {
        let mut fhe = MockCoprocessor::with_key([1u8; 32]);
        let existing = first_bid(&mut fhe, 4, 4);
        let (amount, price) = encrypt(&mut fhe, 9, 9);

        let update = update_bid(
            &mut fhe,
            PaymentMedium::Native,
            Some(&existing),
            160,
            amount,
            price,
        )
        .unwrap();
        assert_eq!(
            update,
            BidUpdate {
                bid: None,
                transfer: None,
                first_bid: false,
            }
        );
    }

    #[test]
    fn test_random_rebid_sequences_keep_deposit_at_running_max() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut fhe = MockCoprocessor::with_key([2u8; 32]);

        for _ in 0..50 {
            let mut stored: Option<Bid> = None;
            let mut expected_deposit = 0u64;
            let mut pulled = 0u64;

            for step in 0..8u64 {
                let amount = rng.gen_range(0..1_000u64);
                let price = rng.gen_range(0..1_000u64);
                let total = amount * price;
                let (a, p) = encrypt(&mut fhe, amount, price);

                let update = update_bid(&mut fhe, TOKEN, stored.as_ref(), step, a, p).unwrap();
                let transfer = fhe.decrypt(update.transfer.unwrap()).unwrap();

                let expected_transfer = total.saturating_sub(expected_deposit);
                assert_eq!(transfer, expected_transfer);
                expected_deposit = expected_deposit.max(total);
                pulled += transfer;

                let bid = update.bid.unwrap();
                let plain = reveal(&fhe, &bid);
                assert_eq!(plain.deposit, expected_deposit);
                assert_eq!(plain.price, price);
                stored = Some(bid);
            }

            assert_eq!(pulled, expected_deposit);
        }
    }
}

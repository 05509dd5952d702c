//! Bounded-round swap matching against a pool.
//!
//! ```text
//! match_swaps(&mut Pool, &mut [SwapRequest], &Params) -> SwapOutcome
//! ```
//!
//! Each round rebuilds the swap book from the remaining offers, finds the
//! clearing price against the pool's current reserves and fills every
//! eligible order at that single price. The next round starts from the
//! reserves the previous round left behind. Matching stops when nothing is
//! left to fill, a round fills nothing, a round would breach the pool's
//! exposure cap, or after [`MAX_MATCHING_ROUNDS`].
//!
//! ## Fees
//!
//! Half the swap fee is prepaid in the offer denom and moves into the pool
//! with each fill, proportionally to the filled share. The other half is
//! withheld from the delivered demand coins and stays in the pool.

use liquidity_types::constants::MAX_MATCHING_ROUNDS;
use liquidity_types::{
    AccountId, Coin, LiquidityEvent, Params, Pool, RequestStatus, Result, SwapDirection,
    SwapRequest, Transfer,
};
use rust_decimal::Decimal;

use crate::clearing::{ClearingResult, PoolCurve, compute_clearing_price};
use crate::orderbook::SwapBook;
use crate::pool_math::{checked_mul, half_fee, mul_div_floor};
use crate::price_level::PriceLevel;

/// What a full matching pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Rounds that filled at least one order.
    pub rounds: u32,
    /// Clearing price of the last filled round.
    pub last_price: Option<Decimal>,
    pub transfers: Vec<Transfer>,
    pub events: Vec<LiquidityEvent>,
}

/// One order's share of a round, before it is applied.
#[derive(Debug, Clone, Copy)]
struct Fill {
    swap_index: usize,
    offer: Decimal,
    offer_fee: Decimal,
    exchanged_fee: Decimal,
    received: Decimal,
}

/// Match `swaps` against `pool` in place.
///
/// `pool` and `swaps` are updated with every round that is kept. Swaps that
/// fill completely are marked executed; partially filled ones keep their
/// reduced remainder.
pub fn match_swaps(
    pool: &mut Pool,
    swaps: &mut [SwapRequest],
    params: &Params,
) -> Result<SwapOutcome> {
    let mut outcome = SwapOutcome::default();

    // The pool's net payout over the whole batch may not exceed
    // `max_order_amount_ratio` of the reserves it started with.
    let floor_x = pool.reserve_x - checked_mul(pool.reserve_x, params.max_order_amount_ratio)?.floor();
    let floor_y = pool.reserve_y - checked_mul(pool.reserve_y, params.max_order_amount_ratio)?.floor();

    for round in 1..=MAX_MATCHING_ROUNDS {
        let book = SwapBook::from_swaps(swaps);
        if book.is_empty() {
            break;
        }
        let curve = PoolCurve {
            reserve_x: pool.reserve_x,
            reserve_y: pool.reserve_y,
            cap_x: (pool.reserve_x - floor_x).max(Decimal::ZERO),
            cap_y: (pool.reserve_y - floor_y).max(Decimal::ZERO),
        };
        let Some(clearing) = compute_clearing_price(&book, &curve)? else {
            break;
        };

        let fills = price_fills(&book, &clearing, swaps, params)?;
        if fills.is_empty() {
            break;
        }

        let (new_x, new_y) = reserves_after(pool, swaps, &fills);
        if new_x < floor_x || new_y < floor_y || new_x <= Decimal::ZERO || new_y <= Decimal::ZERO {
            tracing::warn!(
                pool = %pool.id,
                round,
                price = %clearing.price,
                "Round would breach pool exposure cap, discarded"
            );
            break;
        }

        for fill in &fills {
            apply_fill(pool, &mut swaps[fill.swap_index], fill, clearing.price, round, &mut outcome);
        }
        pool.reserve_x = new_x;
        pool.reserve_y = new_y;
        outcome.rounds = round;
        outcome.last_price = Some(clearing.price);

        tracing::debug!(
            pool = %pool.id,
            round,
            price = %clearing.price,
            fills = fills.len(),
            "Matching round complete"
        );
    }

    Ok(outcome)
}

/// Fill amounts per order at the round's price, with fees, in sequence
/// order. Orders whose fill would deliver nothing are left out.
fn price_fills(
    book: &SwapBook,
    clearing: &ClearingResult,
    swaps: &[SwapRequest],
    params: &Params,
) -> Result<Vec<Fill>> {
    let price = clearing.price;
    let mut allocations: Vec<(usize, Decimal)> = Vec::new();

    for level in book.sell_levels() {
        if level.price < price {
            allocations.extend(level.entries.iter().map(|e| (e.swap_index, e.remaining)));
        } else if level.price == price {
            allocations.extend(pro_rata(level, clearing.marginal_sell_x.floor())?);
        }
    }
    for level in book.buy_levels() {
        if level.price > price {
            allocations.extend(level.entries.iter().map(|e| (e.swap_index, e.remaining)));
        } else if level.price == price {
            allocations.extend(pro_rata(level, clearing.marginal_buy_y.floor())?);
        }
    }
    allocations.sort_unstable_by_key(|(index, _)| *index);

    let mut fills = Vec::with_capacity(allocations.len());
    for (swap_index, offer) in allocations {
        if offer.is_zero() {
            continue;
        }
        let swap = &swaps[swap_index];
        let gross = match swap.direction {
            SwapDirection::XToY => checked_mul(offer, price)?.floor(),
            SwapDirection::YToX => mul_div_floor(offer, Decimal::ONE, price)?,
        };
        if gross.is_zero() {
            continue;
        }
        let offer_fee = if offer == swap.remaining_offer {
            swap.remaining_offer_fee
        } else {
            mul_div_floor(swap.remaining_offer_fee, offer, swap.remaining_offer)?
        };
        let exchanged_fee = half_fee(gross, params)?;
        fills.push(Fill {
            swap_index,
            offer,
            offer_fee,
            exchanged_fee,
            received: gross - exchanged_fee,
        });
    }
    Ok(fills)
}

/// Split `amount` across a marginal level by remaining offer.
///
/// Each order gets the floor of its proportional share; leftover units go
/// to the oldest orders first, never beyond what they still offer.
fn pro_rata(level: &PriceLevel, amount: Decimal) -> Result<Vec<(usize, Decimal)>> {
    let total = level.total_offer();
    let amount = amount.min(total);
    if amount <= Decimal::ZERO {
        return Ok(Vec::new());
    }
    if amount == total {
        return Ok(level.entries.iter().map(|e| (e.swap_index, e.remaining)).collect());
    }

    let mut shares = Vec::with_capacity(level.len());
    let mut allocated = Decimal::ZERO;
    for entry in &level.entries {
        let share = mul_div_floor(amount, entry.remaining, total)?;
        allocated += share;
        shares.push((entry.swap_index, share));
    }
    let mut leftover = amount - allocated;
    for (entry, share) in level.entries.iter().zip(shares.iter_mut()) {
        if leftover.is_zero() {
            break;
        }
        let extra = leftover.min(entry.remaining - share.1);
        share.1 += extra;
        leftover -= extra;
    }
    Ok(shares)
}

/// Reserves after a round's fills.
fn reserves_after(pool: &Pool, swaps: &[SwapRequest], fills: &[Fill]) -> (Decimal, Decimal) {
    let mut x = pool.reserve_x;
    let mut y = pool.reserve_y;
    for fill in fills {
        let paid_in = fill.offer + fill.offer_fee;
        match swaps[fill.swap_index].direction {
            SwapDirection::XToY => {
                x += paid_in;
                y -= fill.received;
            }
            SwapDirection::YToX => {
                y += paid_in;
                x -= fill.received;
            }
        }
    }
    (x, y)
}

fn apply_fill(
    pool: &Pool,
    swap: &mut SwapRequest,
    fill: &Fill,
    price: Decimal,
    round: u32,
    outcome: &mut SwapOutcome,
) {
    swap.remaining_offer -= fill.offer;
    swap.remaining_offer_fee -= fill.offer_fee;
    swap.received_amount += fill.received;
    swap.exchanged_fee_paid += fill.exchanged_fee;
    if swap.is_fully_filled() {
        swap.status = RequestStatus::done(true);
    }

    outcome.transfers.push(Transfer::send(
        AccountId::escrow(),
        pool.reserve_account.clone(),
        Coin::new(swap.offer_denom.clone(), fill.offer + fill.offer_fee),
        Some(swap.seq),
    ));
    if !fill.received.is_zero() {
        outcome.transfers.push(Transfer::send(
            pool.reserve_account.clone(),
            swap.requester.clone(),
            Coin::new(swap.demand_denom.clone(), fill.received),
            Some(swap.seq),
        ));
    }
    outcome.events.push(LiquidityEvent::SwapFilled {
        seq: swap.seq,
        pool_id: pool.id,
        round,
        price,
        offer_filled: fill.offer,
        offer_fee: fill.offer_fee,
        received: fill.received,
        exchanged_fee: fill.exchanged_fee,
    });

    tracing::debug!(
        seq = %swap.seq,
        direction = %swap.direction,
        offer = %fill.offer,
        received = %fill.received,
        "Swap filled"
    );
}

#[cfg(test)]
mod tests {
    use liquidity_types::{LiquidityEvent, Pool, SwapDirection, SwapRequest};

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn sell(seq: u64, amount: i64, limit: Decimal, fee: i64) -> SwapRequest {
        SwapRequest::dummy_with_fee(seq, SwapDirection::XToY, amount, limit, fee)
    }

    fn buy(seq: u64, amount: i64, limit: Decimal, fee: i64) -> SwapRequest {
        SwapRequest::dummy_with_fee(seq, SwapDirection::YToX, amount, limit, fee)
    }

    #[test]
    fn no_swaps_no_rounds() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let outcome = match_swaps(&mut pool, &mut [], &Params::default()).unwrap();
        assert_eq!(outcome.rounds, 0);
        assert!(outcome.transfers.is_empty());
    }

    #[test]
    fn opposite_orders_clear_at_one() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![
            sell(1, 10_000, Decimal::new(95, 2), 15),
            buy(2, 10_000, Decimal::new(105, 2), 15),
        ];
        let outcome = match_swaps(&mut pool, &mut swaps, &Params::default()).unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.last_price, Some(Decimal::ONE));
        for swap in &swaps {
            assert!(swap.is_fully_filled());
            assert!(swap.status.executed);
            assert_eq!(swap.received_amount, dec(9_985));
            assert_eq!(swap.exchanged_fee_paid, dec(15));
            assert_eq!(swap.remaining_offer_fee, Decimal::ZERO);
        }
        assert_eq!(pool.reserve_x, dec(1_000_030));
        assert_eq!(pool.reserve_y, dec(1_000_030));
    }

    #[test]
    fn lone_sell_trades_with_pool() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![sell(1, 10_000, Decimal::new(9, 1), 15)];
        let outcome = match_swaps(&mut pool, &mut swaps, &Params::default()).unwrap();

        assert_eq!(outcome.rounds, 1);
        assert!(outcome.last_price.unwrap() >= Decimal::new(9, 1));
        assert_eq!(swaps[0].received_amount, dec(9_789));
        assert_eq!(swaps[0].exchanged_fee_paid, dec(14));
        assert_eq!(pool.reserve_x, dec(1_010_015));
        assert_eq!(pool.reserve_y, dec(990_211));
    }

    #[test]
    fn marginal_sell_is_partially_filled() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![sell(1, 20_000, Decimal::ONE, 30), buy(2, 10_000, Decimal::ONE, 15)];
        let outcome = match_swaps(&mut pool, &mut swaps, &Params::default()).unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(swaps[0].remaining_offer, dec(10_000));
        assert_eq!(swaps[0].remaining_offer_fee, dec(15));
        assert!(!swaps[0].status.executed);
        assert_eq!(swaps[0].received_amount, dec(9_985));
        assert!(swaps[1].status.executed);
        assert_eq!(swaps[1].received_amount, dec(9_985));
        assert_eq!(pool.reserve_x, dec(1_000_030));
        assert_eq!(pool.reserve_y, dec(1_000_030));
    }

    #[test]
    fn marginal_remainder_fills_in_a_later_round() {
        // Rounding leaves the pool just above 0.97 after the first round,
        // so the marginal sell trades again at the same price.
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![
            sell(1, 7_777, Decimal::new(9, 1), 11),
            sell(2, 7_777, Decimal::new(97, 2), 11),
        ];
        let outcome = match_swaps(&mut pool, &mut swaps, &Params::default()).unwrap();

        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.last_price, Some(Decimal::new(97, 2)));
        let fills: Vec<(u64, u32, Decimal, Decimal)> = outcome
            .events
            .iter()
            .filter_map(|e| match e {
                LiquidityEvent::SwapFilled {
                    seq,
                    round,
                    price,
                    offer_filled,
                    ..
                } => Some((seq.0, *round, *price, *offer_filled)),
                _ => None,
            })
            .collect();
        let limit = Decimal::new(97, 2);
        assert_eq!(
            fills,
            vec![
                (1, 1, limit, dec(7_777)),
                (2, 1, limit, dec(7_686)),
                (2, 2, limit, dec(2)),
            ]
        );

        assert!(swaps[0].status.executed);
        assert_eq!(swaps[0].received_amount, dec(7_532));
        assert!(!swaps[1].status.executed);
        assert_eq!(swaps[1].remaining_offer, dec(89));
        assert_eq!(swaps[1].remaining_offer_fee, dec(1));
        assert_eq!(swaps[1].received_amount, dec(7_445));
        assert_eq!(pool.reserve_x, dec(1_015_486));
        assert_eq!(pool.reserve_y, dec(985_023));
    }

    #[test]
    fn pro_rata_leftover_goes_to_oldest() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![
            sell(1, 10_000, Decimal::ONE, 15),
            sell(2, 5_000, Decimal::ONE, 7),
            buy(3, 7_001, Decimal::ONE, 10),
        ];
        match_swaps(&mut pool, &mut swaps, &Params::default()).unwrap();

        assert_eq!(swaps[0].filled_offer(), dec(4_668));
        assert_eq!(swaps[1].filled_offer(), dec(2_333));
        assert!(swaps[2].is_fully_filled());
    }

    #[test]
    fn limits_are_respected() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![
            sell(1, 10_000, Decimal::new(11, 1), 15),
            buy(2, 10_000, Decimal::new(9, 1), 15),
        ];
        let outcome = match_swaps(&mut pool, &mut swaps, &Params::default()).unwrap();
        assert_eq!(outcome.rounds, 0);
        assert_eq!(pool.reserve_x, dec(1_000_000));
        assert!(swaps.iter().all(|s| s.filled_offer().is_zero()));
    }

    #[test]
    fn fill_events_carry_the_round_price() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![
            sell(1, 10_000, Decimal::new(95, 2), 15),
            buy(2, 10_000, Decimal::new(105, 2), 15),
        ];
        let outcome = match_swaps(&mut pool, &mut swaps, &Params::default()).unwrap();
        let prices: Vec<Decimal> = outcome
            .events
            .iter()
            .filter_map(|e| match e {
                LiquidityEvent::SwapFilled { price, .. } => Some(*price),
                _ => None,
            })
            .collect();
        assert_eq!(prices, vec![Decimal::ONE, Decimal::ONE]);
        // escrow -> reserve and reserve -> requester per fill
        assert_eq!(outcome.transfers.len(), 4);
    }

    #[test]
    fn exposure_cap_holds_across_rounds() {
        let params = Params::default();
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        let mut swaps = vec![
            sell(1, 100_000, Decimal::new(5, 1), 150),
            sell(2, 100_000, Decimal::new(5, 1), 150),
        ];
        match_swaps(&mut pool, &mut swaps, &params).unwrap();
        assert!(pool.reserve_y >= dec(900_000));
        assert!(pool.is_healthy());
    }

    #[test]
    fn random_batches_respect_limits_and_caps() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        use rust_decimal::prelude::ToPrimitive;

        let params = Params::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
            let start = pool.clone();
            let mut swaps: Vec<SwapRequest> = (1..=20)
                .map(|seq| {
                    let amount = rng.gen_range(10..=50_000);
                    let limit = Decimal::new(rng.gen_range(80..=120), 2);
                    let fee = half_fee(dec(amount), &params).unwrap().to_i64().unwrap();
                    if rng.gen_bool(0.5) {
                        sell(seq, amount, limit, fee)
                    } else {
                        buy(seq, amount, limit, fee)
                    }
                })
                .collect();
            let outcome = match_swaps(&mut pool, &mut swaps, &params).unwrap();

            assert!(pool.is_healthy());
            assert!(pool.reserve_x >= dec(900_000));
            assert!(pool.reserve_y >= dec(900_000));
            assert!(outcome.rounds <= MAX_MATCHING_ROUNDS);
            for event in &outcome.events {
                if let LiquidityEvent::SwapFilled { seq, price, .. } = event {
                    let swap = swaps.iter().find(|s| s.seq == *seq).unwrap();
                    assert!(swap.accepts_price(*price), "{seq} filled beyond its limit");
                }
            }
            for swap in &swaps {
                assert!(swap.remaining_offer >= Decimal::ZERO);
                assert!(swap.remaining_offer_fee >= Decimal::ZERO);
            }
            // offer coins moved into the pool equal what the orders gave up
            let paid_x: Decimal = swaps
                .iter()
                .filter(|s| s.direction == SwapDirection::XToY)
                .map(|s| s.filled_offer() + s.offer_fee_paid())
                .sum();
            let got_x: Decimal = swaps
                .iter()
                .filter(|s| s.direction == SwapDirection::YToX)
                .map(|s| s.received_amount)
                .sum();
            assert_eq!(pool.reserve_x, start.reserve_x + paid_x - got_x);
        }
    }
}

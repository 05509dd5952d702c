//! End-to-end tests across all three planes.
//!
//! These drive the module the way a host does:
//! `on_block_begin` -> `deliver`* -> `on_block_end`
//!
//! and check pool accounting, swap clearing, conservation, determinism and
//! genesis round trips on the committed state.

use std::collections::BTreeMap;

use liquidity_ingress::{Bank, MsgResponse};
use liquidity_settlement::{BlockOutcome, LiquidityModule};
use liquidity_types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}

fn small_pool_params() -> Params {
    Params {
        min_init_deposit_amount: dec(100),
        ..Params::default()
    }
}

fn fund(module: &mut LiquidityModule, who: &str, a: i64, b: i64) {
    for (denom, amount) in [("A", a), ("B", b)] {
        if amount > 0 {
            module.fund(&acct(who), &Coin::new(denom, dec(amount))).unwrap();
        }
    }
}

fn create_pool(module: &mut LiquidityModule, params: &Params, x: i64, y: i64, height: u64) -> PoolId {
    let response = module
        .deliver(
            Msg::CreatePool(MsgCreatePool {
                creator: acct("creator"),
                deposit_x: Coin::new("A", dec(x)),
                deposit_y: Coin::new("B", dec(y)),
            }),
            params,
            height,
        )
        .unwrap();
    match response {
        MsgResponse::PoolCreated { pool_id, .. } => pool_id,
        other @ MsgResponse::Queued { .. } => panic!("unexpected response {other:?}"),
    }
}

fn swap_msg(
    requester: &str,
    pool_id: PoolId,
    direction: SwapDirection,
    offer: Decimal,
    price: Decimal,
    params: &Params,
) -> Msg {
    let (offer_denom, demand) = match direction {
        SwapDirection::XToY => ("A", "B"),
        SwapDirection::YToX => ("B", "A"),
    };
    Msg::SwapWithinBatch(MsgSwapWithinBatch {
        requester: acct(requester),
        pool_id,
        direction,
        offer_coin: Coin::new(offer_denom, offer),
        demand_coin_denom: demand.into(),
        offer_coin_fee: Coin::new(offer_denom, (offer * params.half_swap_fee_rate()).floor()),
        order_price: price,
        swap_fee_rate: params.swap_fee_rate,
    })
}

fn run_block(
    module: &mut LiquidityModule,
    params: &Params,
    height: u64,
    msgs: Vec<Msg>,
) -> BlockOutcome {
    module.on_block_begin(height, params).unwrap();
    for msg in msgs {
        module.deliver(msg, params, height).unwrap();
    }
    module.on_block_end(height, params).unwrap()
}

fn balance(module: &LiquidityModule, who: &str, denom: &str) -> Decimal {
    module.bank().balance(&acct(who), denom)
}

// ---------------------------------------------------------------------------
// Pool accounting
// ---------------------------------------------------------------------------

#[test]
fn e2e_create_pool() {
    init_tracing();
    let params = small_pool_params();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000, 1_000);
    let pool_id = create_pool(&mut module, &params, 100, 100, 1);

    let pool = module.state().registry.get(pool_id).unwrap();
    assert_eq!(pool.reserve_x, dec(100));
    assert_eq!(pool.reserve_y, dec(100));
    assert_eq!(pool.pool_coin_supply, dec(1_000_000));
    assert_eq!(
        balance(&module, "creator", &pool.pool_coin_denom),
        dec(1_000_000)
    );
    module.check_invariants().unwrap();
}

#[test]
fn e2e_withdraw_half_with_fee() {
    init_tracing();
    let params = Params {
        withdraw_fee_rate: Decimal::new(3, 3),
        ..small_pool_params()
    };
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000, 1_000);
    let pool_id = create_pool(&mut module, &params, 100, 100, 1);
    let denom = module.state().registry.get(pool_id).unwrap().pool_coin_denom.clone();

    let outcome = run_block(
        &mut module,
        &params,
        2,
        vec![Msg::WithdrawWithinBatch(MsgWithdrawWithinBatch {
            withdrawer: acct("creator"),
            pool_id,
            pool_coin: Coin::new(denom.clone(), dec(500_000)),
        })],
    );

    // floor(100 * 0.5 * 0.997) = 49 per side, the fee part stays
    let pool = module.state().registry.get(pool_id).unwrap();
    assert_eq!(pool.reserve_x, dec(51));
    assert_eq!(pool.reserve_y, dec(51));
    assert_eq!(pool.pool_coin_supply, dec(500_000));
    assert_eq!(balance(&module, "creator", "A"), dec(949));
    assert_eq!(balance(&module, "creator", &denom), dec(500_000));
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        LiquidityEvent::WithdrawExecuted { withdrawn_x, .. } if *withdrawn_x == dec(49)
    )));
}

#[test]
fn e2e_withdraw_whole_supply_is_refunded() {
    init_tracing();
    let params = small_pool_params();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000, 1_000);
    let pool_id = create_pool(&mut module, &params, 100, 100, 1);
    let denom = module.state().registry.get(pool_id).unwrap().pool_coin_denom.clone();

    let outcome = run_block(
        &mut module,
        &params,
        2,
        vec![Msg::WithdrawWithinBatch(MsgWithdrawWithinBatch {
            withdrawer: acct("creator"),
            pool_id,
            pool_coin: Coin::new(denom.clone(), dec(1_000_000)),
        })],
    );

    assert!(outcome
        .events
        .iter()
        .any(|e| matches!(e, LiquidityEvent::RequestRefunded { .. })));
    assert_eq!(balance(&module, "creator", &denom), dec(1_000_000));
    assert!(module.state().registry.get(pool_id).unwrap().is_healthy());
}

#[test]
fn e2e_mismatched_deposit_refunds_excess() {
    init_tracing();
    let params = small_pool_params();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000, 1_000);
    fund(&mut module, "lp", 10, 5);
    let pool_id = create_pool(&mut module, &params, 100, 100, 1);

    run_block(
        &mut module,
        &params,
        2,
        vec![Msg::DepositWithinBatch(MsgDepositWithinBatch {
            depositor: acct("lp"),
            pool_id,
            deposit_x: Coin::new("A", dec(10)),
            deposit_y: Coin::new("B", dec(5)),
        })],
    );

    let pool = module.state().registry.get(pool_id).unwrap();
    assert_eq!(pool.reserve_x, dec(105));
    assert_eq!(pool.reserve_y, dec(105));
    assert_eq!(pool.pool_coin_supply, dec(1_050_000));
    assert_eq!(balance(&module, "lp", "A"), dec(5));
    assert_eq!(balance(&module, "lp", "B"), Decimal::ZERO);
    assert_eq!(balance(&module, "lp", &pool.pool_coin_denom), dec(50_000));
}

// ---------------------------------------------------------------------------
// Swaps
// ---------------------------------------------------------------------------

#[test]
fn e2e_opposite_swaps_clear_at_parity() {
    init_tracing();
    let params = Params::default();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000_000, 1_000_000);
    fund(&mut module, "alice", 20_000, 0);
    fund(&mut module, "bob", 0, 20_000);
    let pool_id = create_pool(&mut module, &params, 1_000_000, 1_000_000, 1);

    let outcome = run_block(
        &mut module,
        &params,
        2,
        vec![
            swap_msg("alice", pool_id, SwapDirection::XToY, dec(10_000), Decimal::new(95, 2), &params),
            swap_msg("bob", pool_id, SwapDirection::YToX, dec(10_000), Decimal::new(105, 2), &params),
        ],
    );

    assert_eq!(outcome.reports[0].last_price, Some(Decimal::ONE));
    // 10000 at 1.0 minus the 0.15% exchanged-side fee
    assert_eq!(balance(&module, "alice", "B"), dec(9_985));
    assert_eq!(balance(&module, "alice", "A"), dec(20_000 - 10_015));
    assert_eq!(balance(&module, "bob", "A"), dec(9_985));

    let pool = module.state().registry.get(pool_id).unwrap();
    assert_eq!(pool.reserve_x, dec(1_000_030));
    assert_eq!(pool.reserve_y, dec(1_000_030));
    assert!(module.state().lifecycle.get(pool_id).unwrap().swaps.is_empty());
    assert_eq!(module.state().escrow.count(), 0);
}

#[test]
fn e2e_unreachable_limit_waits_for_next_batch() {
    init_tracing();
    let params = Params::default();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000_000, 1_000_000);
    fund(&mut module, "alice", 20_000, 0);
    let pool_id = create_pool(&mut module, &params, 1_000_000, 1_000_000, 1);

    // selling A for at least 2 B each cannot clear against a 1:1 pool
    run_block(
        &mut module,
        &params,
        2,
        vec![swap_msg("alice", pool_id, SwapDirection::XToY, dec(10_000), dec(2), &params)],
    );

    let batch = module.state().lifecycle.get(pool_id).unwrap();
    assert_eq!(batch.swaps.len(), 1);
    assert_eq!(batch.swaps[0].remaining_offer, dec(10_000));
    assert_eq!(module.state().escrow.total_locked("A"), dec(10_015));
    assert_eq!(balance(&module, "alice", "B"), Decimal::ZERO);

    run_block(&mut module, &params, 3, Vec::new());
    assert_eq!(
        module.state().lifecycle.get(pool_id).unwrap().swaps.len(),
        1
    );
}

#[test]
fn e2e_rejected_submission_moves_nothing() {
    init_tracing();
    let params = Params::default();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000_000, 1_000_000);
    fund(&mut module, "alice", 20_000, 0);
    let pool_id = create_pool(&mut module, &params, 1_000_000, 1_000_000, 1);

    let mut msg = swap_msg("alice", pool_id, SwapDirection::XToY, dec(10_000), dec(1), &params);
    if let Msg::SwapWithinBatch(m) = &mut msg {
        m.swap_fee_rate = Decimal::new(1, 2);
    }
    let err = module.deliver(msg, &params, 1).unwrap_err();
    assert!(matches!(err, LiquidityError::SwapFeeRateMismatch { .. }));
    assert_eq!(balance(&module, "alice", "A"), dec(20_000));
    module.check_invariants().unwrap();
}

#[test]
fn e2e_far_limit_is_refused_and_blocks_keep_settling() {
    init_tracing();
    let params = Params::default();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000_000, 1_000_000);
    fund(&mut module, "alice", 20_000, 0);
    fund(&mut module, "bob", 20_000, 0);
    let pool_id = create_pool(&mut module, &params, 1_000_000, 1_000_000, 1);

    module.on_block_begin(2, &params).unwrap();
    let near = swap_msg("alice", pool_id, SwapDirection::XToY, dec(10_000), Decimal::new(9, 1), &params);
    module.deliver(near, &params, 2).unwrap();
    let far = swap_msg("bob", pool_id, SwapDirection::XToY, dec(10_000), Decimal::new(1, 25), &params);
    let err = module.deliver(far, &params, 2).unwrap_err();
    assert!(matches!(err, LiquidityError::InvalidPrice(_)));
    assert_eq!(balance(&module, "bob", "A"), dec(20_000));

    module.on_block_end(2, &params).unwrap();
    assert_eq!(balance(&module, "alice", "B"), dec(9_789));
    run_block(&mut module, &params, 3, Vec::new());
    module.check_invariants().unwrap();
}

#[test]
fn e2e_unknown_message_kind() {
    let err = Msg::from_json(r#"{"type":"CancelSwap","value":{}}"#).unwrap_err();
    assert!(matches!(err, LiquidityError::UnrecognizedRequest(_)));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Submit a random block of requests, returning the limit of every swap.
fn random_block(
    rng: &mut StdRng,
    module: &mut LiquidityModule,
    params: &Params,
    pool_id: PoolId,
    height: u64,
    limits: &mut Limits,
) -> BlockOutcome {
    module.on_block_begin(height, params).unwrap();
    let pool = module.state().registry.get(pool_id).unwrap().clone();
    let price = pool.reserve_y / pool.reserve_x;

    for _ in 0..rng.gen_range(1..=6) {
        let direction = if rng.gen_bool(0.5) {
            SwapDirection::XToY
        } else {
            SwapDirection::YToX
        };
        let (offered, _) = pool.reserves_for(direction);
        let max = (offered * params.max_order_amount_ratio).floor();
        let offer = Decimal::from(rng.gen_range(1_000..=max.try_into().unwrap_or(1_000_i64)));
        let limit = (price * Decimal::new(rng.gen_range(90..=110), 2)).round_dp(4);
        let trader = format!("trader-{}", rng.gen_range(0..4));
        let msg = swap_msg(&trader, pool_id, direction, offer, limit, params);
        if let Ok(MsgResponse::Queued { seq, .. }) = module.deliver(msg, params, height) {
            limits.insert(seq, (direction, limit));
        }
    }
    if rng.gen_bool(0.3) {
        let denom = pool.pool_coin_denom.clone();
        let _ = module.deliver(
            Msg::WithdrawWithinBatch(MsgWithdrawWithinBatch {
                withdrawer: acct("creator"),
                pool_id,
                pool_coin: Coin::new(denom, dec(rng.gen_range(1_000..50_000))),
            }),
            params,
            height,
        );
    }
    if rng.gen_bool(0.3) {
        let x = rng.gen_range(1_000..20_000);
        let _ = module.deliver(
            Msg::DepositWithinBatch(MsgDepositWithinBatch {
                depositor: acct("creator"),
                pool_id,
                deposit_x: Coin::new("A", dec(x)),
                deposit_y: Coin::new("B", (dec(x) * price).ceil()),
            }),
            params,
            height,
        );
    }
    module.on_block_end(height, params).unwrap()
}

type Limits = BTreeMap<RequestSeq, (SwapDirection, Decimal)>;

fn random_module(seed: u64, blocks: u64) -> (LiquidityModule, Vec<BlockOutcome>, Limits) {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 100_000_000, 100_000_000);
    for i in 0..4 {
        fund(&mut module, &format!("trader-{i}"), 100_000_000, 100_000_000);
    }
    let pool_id = create_pool(&mut module, &params, 10_000_000, 12_000_000, 1);
    let mut limits = BTreeMap::new();
    let outcomes = (2..2 + blocks)
        .map(|h| random_block(&mut rng, &mut module, &params, pool_id, h, &mut limits))
        .collect();
    (module, outcomes, limits)
}

#[test]
fn e2e_random_blocks_conserve_supply() {
    init_tracing();
    for seed in 0..5 {
        let (module, outcomes, _) = random_module(seed, 12);
        module.check_invariants().unwrap();
        let pool = module.state().registry.get(PoolId(1)).unwrap();
        assert!(pool.is_healthy());
        assert_eq!(outcomes.len(), 12);
        for denom in ["A", "B"] {
            assert_eq!(module.bank().total_supply(denom), dec(500_000_000));
        }
    }
}

#[test]
fn e2e_random_fills_respect_limits() {
    init_tracing();
    for seed in 10..15 {
        let (_, outcomes, limits) = random_module(seed, 10);
        for event in outcomes.iter().flat_map(|o| &o.events) {
            if let LiquidityEvent::SwapFilled { seq, price, .. } = event {
                let (direction, limit) = limits[seq];
                match direction {
                    SwapDirection::XToY => assert!(*price >= limit, "{seq} sold below {limit}"),
                    SwapDirection::YToX => assert!(*price <= limit, "{seq} bought above {limit}"),
                }
            }
        }
    }
}

#[test]
fn e2e_identical_inputs_identical_results() {
    init_tracing();
    let (first, first_outcomes, _) = random_module(99, 8);
    let (second, second_outcomes, _) = random_module(99, 8);
    assert_eq!(first_outcomes, second_outcomes);
    assert_eq!(first.state(), second.state());
    assert_eq!(first.bank(), second.bank());
    let hashes: Vec<&str> = first_outcomes
        .iter()
        .flat_map(|o| o.reports.iter().map(|r| r.result_hash.as_str()))
        .collect();
    assert!(hashes.iter().all(|h| h.len() == 64));
}

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

#[test]
fn e2e_genesis_roundtrip_with_pending_requests() {
    init_tracing();
    let params = Params::default();
    let mut module: LiquidityModule = LiquidityModule::default();
    fund(&mut module, "creator", 1_000_000, 1_000_000);
    fund(&mut module, "alice", 20_000, 20_000);
    let pool_id = create_pool(&mut module, &params, 1_000_000, 1_000_000, 1);
    module
        .deliver(
            swap_msg("alice", pool_id, SwapDirection::XToY, dec(10_000), dec(2), &params),
            &params,
            1,
        )
        .unwrap();

    let json = module.export_genesis(&params).unwrap().to_json().unwrap();
    let genesis = GenesisState::from_json(&json).unwrap();
    let mut restored =
        LiquidityModule::from_genesis(&genesis, module.bank().clone(), ["A", "B"]).unwrap();

    assert_eq!(restored.state(), module.state());
    assert_eq!(restored.export_genesis(&params).unwrap(), genesis);
    restored.check_invariants().unwrap();

    let msgs = || {
        vec![swap_msg("alice", pool_id, SwapDirection::YToX, dec(5_000), dec(1), &params)]
    };
    let original = run_block(&mut module, &params, 2, msgs());
    let replayed = run_block(&mut restored, &params, 2, msgs());
    assert_eq!(original, replayed);
    assert_eq!(restored.bank(), module.bank());
}

use alloy::primitives::Address;
use async_trait::async_trait;
use num_bigint::BigUint;
use tracing::debug;

use crate::{errors::SimulationError, spot_price::PoolSnapshot, token::Pair, venue::ArbitrageDirection};

/// Quote surface of one venue's router.
///
/// Both queries follow constant-product AMM semantics and return the full
/// two-element amounts vector the router computes for the path.
#[async_trait]
pub trait RouterQuotes: Send + Sync {
    /// How much of `path[0]` must go in for `amount_out` of `path[1]` to come
    /// out.
    async fn amounts_in(
        &self,
        amount_out: &BigUint,
        path: [Address; 2],
    ) -> Result<(BigUint, BigUint), SimulationError>;

    /// How much of `path[1]` comes out when `amount_in` of `path[0]` goes in.
    async fn amounts_out(
        &self,
        amount_in: &BigUint,
        path: [Address; 2],
    ) -> Result<(BigUint, BigUint), SimulationError>;
}

/// One simulated buy-then-sell round trip, in base units of the base token.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub amount_in: BigUint,
    pub amount_out: BigUint,
    pub estimated_gas_cost: BigUint,
}

impl RoundTrip {
    /// Base-token surplus of the round trip. Non-negative by construction:
    /// a `RoundTrip` only exists once the profitability rule passed.
    pub fn surplus(&self) -> BigUint {
        &self.amount_out - &self.amount_in
    }
}

#[derive(Debug, Clone)]
pub enum SimulationOutcome {
    Profitable(RoundTrip),
    NotProfitable {
        amount_in: BigUint,
        amount_out: BigUint,
    },
}

/// Sizes and prices a round trip for a candidate direction.
#[derive(Debug, Clone)]
pub struct Simulator {
    pub fee_buffer_bps: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl Simulator {
    /// The sell-side pool's token0 reserve figure anchors the round-trip
    /// size; the buy router prices acquiring that much quote token and the
    /// sell router prices unwinding it.
    ///
    /// Gas cost is estimated and reported but does not enter the pass/fail
    /// decision; only the fee buffer does.
    pub async fn simulate<R: RouterQuotes>(
        &self,
        direction: ArbitrageDirection,
        buy_router: &R,
        sell_router: &R,
        sell_side_pool: &PoolSnapshot,
        pair: &Pair,
    ) -> Result<SimulationOutcome, SimulationError> {
        let base = pair.base().address;
        let quote = pair.quote().address;
        let target = sell_side_pool.reserve0.clone();

        let (amount_in, quote_leg) = buy_router.amounts_in(&target, [base, quote]).await?;
        let (_, amount_out) = sell_router.amounts_out(&quote_leg, [quote, base]).await?;

        let estimated_gas_cost = BigUint::from(self.gas_limit) * BigUint::from(self.gas_price);

        debug!(
            %direction,
            amount_in = %amount_in,
            quote_leg = %quote_leg,
            amount_out = %amount_out,
            estimated_gas_cost = %estimated_gas_cost,
            "priced round trip"
        );

        if is_profitable(&amount_in, &amount_out, self.fee_buffer_bps) {
            Ok(SimulationOutcome::Profitable(RoundTrip {
                amount_in,
                amount_out,
                estimated_gas_cost,
            }))
        } else {
            Ok(SimulationOutcome::NotProfitable {
                amount_in,
                amount_out,
            })
        }
    }
}

/// The output must beat the input plus the fee buffer outright.
fn is_profitable(amount_in: &BigUint, amount_out: &BigUint, fee_buffer_bps: u64) -> bool {
    amount_out * BigUint::from(10_000u64) > amount_in * BigUint::from(10_000 + fee_buffer_bps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        token::Token,
        venue::{VenueId, ArbitrageDirection},
    };
    use std::sync::Mutex;

    #[derive(Debug)]
    enum Call {
        AmountsIn { amount_out: BigUint, path: [Address; 2] },
        AmountsOut { amount_in: BigUint, path: [Address; 2] },
    }

    /// Canned router: answers from fixed quotes and records every query.
    struct StubRouter {
        amounts_in: Result<(u64, u64), String>,
        amounts_out: Result<(u64, u64), String>,
        calls: Mutex<Vec<Call>>,
    }

    impl StubRouter {
        fn new(
            amounts_in: Result<(u64, u64), &str>,
            amounts_out: Result<(u64, u64), &str>,
        ) -> Self {
            Self {
                amounts_in: amounts_in.map_err(String::from),
                amounts_out: amounts_out.map_err(String::from),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RouterQuotes for StubRouter {
        async fn amounts_in(
            &self,
            amount_out: &BigUint,
            path: [Address; 2],
        ) -> Result<(BigUint, BigUint), SimulationError> {
            self.calls.lock().unwrap().push(Call::AmountsIn {
                amount_out: amount_out.clone(),
                path,
            });
            match &self.amounts_in {
                Ok((input, output)) => Ok((BigUint::from(*input), BigUint::from(*output))),
                Err(reason) => Err(SimulationError::new(reason.clone())),
            }
        }

        async fn amounts_out(
            &self,
            amount_in: &BigUint,
            path: [Address; 2],
        ) -> Result<(BigUint, BigUint), SimulationError> {
            self.calls.lock().unwrap().push(Call::AmountsOut {
                amount_in: amount_in.clone(),
                path,
            });
            match &self.amounts_out {
                Ok((input, output)) => Ok((BigUint::from(*input), BigUint::from(*output))),
                Err(reason) => Err(SimulationError::new(reason.clone())),
            }
        }
    }

    fn base_token() -> Token {
        Token {
            address: Address::repeat_byte(0x01),
            symbol: "WETH".to_string(),
            decimals: 18,
        }
    }

    fn quote_token() -> Token {
        Token {
            address: Address::repeat_byte(0x02),
            symbol: "UNI".to_string(),
            decimals: 18,
        }
    }

    fn pair() -> Pair {
        Pair::new(base_token(), quote_token())
    }

    fn sell_pool(reserve0: u64) -> PoolSnapshot {
        PoolSnapshot {
            venue: VenueId::A,
            address: Address::repeat_byte(0xaa),
            reserve0: BigUint::from(reserve0),
            reserve1: BigUint::from(5_000_000u64),
        }
    }

    fn simulator(fee_buffer_bps: u64) -> Simulator {
        Simulator {
            fee_buffer_bps,
            gas_limit: 400_000,
            gas_price: 25_000_000_000,
        }
    }

    #[tokio::test]
    async fn profitable_when_output_clears_the_buffer() {
        // 100 in, 102 out clears a 1% buffer
        let buy = StubRouter::new(Ok((100, 900)), Ok((0, 0)));
        let sell = StubRouter::new(Ok((0, 0)), Ok((900, 102)));

        let outcome = simulator(100)
            .simulate(
                ArbitrageDirection::buy_on(VenueId::B),
                &buy,
                &sell,
                &sell_pool(1_000_000),
                &pair(),
            )
            .await
            .unwrap();

        match outcome {
            SimulationOutcome::Profitable(round_trip) => {
                assert_eq!(round_trip.amount_in, BigUint::from(100u64));
                assert_eq!(round_trip.amount_out, BigUint::from(102u64));
                assert_eq!(round_trip.surplus(), BigUint::from(2u64));
            }
            other => panic!("expected a profitable outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn the_buffer_boundary_is_exclusive() {
        // exactly amount_in * 1.01 must NOT pass
        let buy = StubRouter::new(Ok((10_000, 900)), Ok((0, 0)));
        let sell = StubRouter::new(Ok((0, 0)), Ok((900, 10_100)));

        let outcome = simulator(100)
            .simulate(
                ArbitrageDirection::buy_on(VenueId::B),
                &buy,
                &sell,
                &sell_pool(1_000_000),
                &pair(),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, SimulationOutcome::NotProfitable { .. }));

        // one base unit past the boundary passes
        let buy = StubRouter::new(Ok((10_000, 900)), Ok((0, 0)));
        let sell = StubRouter::new(Ok((0, 0)), Ok((900, 10_101)));

        let outcome = simulator(100)
            .simulate(
                ArbitrageDirection::buy_on(VenueId::B),
                &buy,
                &sell,
                &sell_pool(1_000_000),
                &pair(),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, SimulationOutcome::Profitable(_)));
    }

    #[tokio::test]
    async fn queries_follow_the_round_trip_paths() {
        let buy = StubRouter::new(Ok((100, 900)), Ok((0, 0)));
        let sell = StubRouter::new(Ok((0, 0)), Ok((900, 150)));
        let pair = pair();

        simulator(100)
            .simulate(
                ArbitrageDirection::buy_on(VenueId::B),
                &buy,
                &sell,
                &sell_pool(777),
                &pair,
            )
            .await
            .unwrap();

        let buy_calls = buy.calls.lock().unwrap();
        match buy_calls.as_slice() {
            [Call::AmountsIn { amount_out, path }] => {
                // sized to absorb the sell pool's token0 reserve figure
                assert_eq!(amount_out, &BigUint::from(777u64));
                assert_eq!(*path, [pair.base().address, pair.quote().address]);
            }
            other => panic!("unexpected buy router calls: {other:?}"),
        }

        let sell_calls = sell.calls.lock().unwrap();
        match sell_calls.as_slice() {
            [Call::AmountsOut { amount_in, path }] => {
                // unwinds exactly the quote leg the buy quote produced
                assert_eq!(amount_in, &BigUint::from(900u64));
                assert_eq!(*path, [pair.quote().address, pair.base().address]);
            }
            other => panic!("unexpected sell router calls: {other:?}"),
        }
    }

    #[tokio::test]
    async fn gas_cost_is_limit_times_price_and_does_not_gate() {
        // barely profitable despite a gas cost dwarfing the surplus
        let buy = StubRouter::new(Ok((100, 900)), Ok((0, 0)));
        let sell = StubRouter::new(Ok((0, 0)), Ok((900, 102)));

        let outcome = simulator(100)
            .simulate(
                ArbitrageDirection::buy_on(VenueId::B),
                &buy,
                &sell,
                &sell_pool(1_000_000),
                &pair(),
            )
            .await
            .unwrap();

        match outcome {
            SimulationOutcome::Profitable(round_trip) => {
                let expected = BigUint::from(400_000u64) * BigUint::from(25_000_000_000u128);
                assert_eq!(round_trip.estimated_gas_cost, expected);
            }
            other => panic!("expected a profitable outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn router_revert_surfaces_as_simulation_error() {
        let buy = StubRouter::new(Err("execution reverted: INSUFFICIENT_LIQUIDITY"), Ok((0, 0)));
        let sell = StubRouter::new(Ok((0, 0)), Ok((0, 0)));

        let err = simulator(100)
            .simulate(
                ArbitrageDirection::buy_on(VenueId::B),
                &buy,
                &sell,
                &sell_pool(1_000_000),
                &pair(),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("INSUFFICIENT_LIQUIDITY"));
        // the sell leg is never queried once the buy leg reverts
        assert!(sell.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn bare_comparison_would_differ_from_the_buffered_rule() {
        // with a zero buffer any positive surplus passes
        assert!(is_profitable(
            &BigUint::from(100u64),
            &BigUint::from(101u64),
            0
        ));
        // the configured 1% buffer rejects the same trade
        assert!(!is_profitable(
            &BigUint::from(100u64),
            &BigUint::from(101u64),
            100
        ));
    }
}

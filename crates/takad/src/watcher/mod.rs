//! Watches both venues' pools for swaps and drives the detection pipeline.

use std::{pin::Pin, sync::Arc};

use alloy::{
    eips::BlockNumberOrTag,
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder, WsConnect},
    rpc::types::Filter,
    signers::local::PrivateKeySigner,
    sol_types::SolEvent as _,
};
use color_eyre::eyre::{self, WrapErr as _, eyre};
use futures::{
    FutureExt as _,
    future::{Fuse, FusedFuture as _},
};
use tokio::select;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use taka_core::{
    config::Config,
    direction,
    errors::DataUnavailable,
    execution::{AccountBalances, OnchainSettlement, TradeExecutor},
    gate::{ExecutionGate, GatePass},
    market::{self, IUniswapV2Pair, OnchainRouter},
    simulation::{SimulationOutcome, Simulator},
    spot_price::{self, PriceSample},
    token::{Pair, format_units},
    venue::{Venue, VenueId},
};

pub use builder::Builder;
mod builder;

pub struct Handle {
    pub(super) shutdown_token: CancellationToken,
    pub(super) worker_handle: Option<tokio::task::JoinHandle<eyre::Result<()>>>,
}

impl Handle {
    pub async fn shutdown(&mut self) -> eyre::Result<()> {
        self.shutdown_token.cancel();
        if let Err(e) = self
            .worker_handle
            .take()
            .expect("shutdown must not be called twice")
            .await
        {
            error!("swap watcher worker failed: {}", e);
            return Err(e.into());
        }
        Ok(())
    }
}

// Awaiting the handle deals with the Worker's result
impl Future for Handle {
    type Output = eyre::Result<()>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        use futures::future::FutureExt as _;

        let task = self
            .worker_handle
            .as_mut()
            .expect("watcher handle must not be polled after shutdown");

        task.poll_unpin(cx).map(|result| match result {
            Ok(worker_res) => match worker_res {
                Ok(()) => Ok(()),
                Err(e) => Err(e).wrap_err("watcher task returned with err"),
            },
            Err(e) => Err(e).wrap_err("watcher task panicked"),
        })
    }
}

pub(super) struct Worker {
    pub(super) config: Config,
    pub(super) gate: ExecutionGate,
    pub(super) shutdown_token: CancellationToken,
}

impl Worker {
    #[instrument(name = "swap_watcher", skip(self))]
    pub(super) async fn run(self) -> eyre::Result<()> {
        let Self {
            config,
            gate,
            shutdown_token,
        } = self;

        let ws = WsConnect::new(config.rpc_url.clone());
        let provider = ProviderBuilder::new().connect_ws(ws).await?;

        // the signing account is also the account whose balances are reported
        let key = std::env::var("TAKA_PRIVATE_KEY")
            .wrap_err("TAKA_PRIVATE_KEY must be set to the signing key")?;
        let signer: PrivateKeySigner = key.trim().parse().wrap_err("failed to parse signing key")?;
        let account = signer.address();

        let wallet = EthereumWallet::from(signer);
        let submitter = ProviderBuilder::new()
            .wallet(wallet)
            .connect_ws(WsConnect::new(config.rpc_url.clone()))
            .await?;

        let base = market::resolve_token(provider.clone(), config.arb_for).await?;
        let quote = market::resolve_token(provider.clone(), config.arb_against).await?;
        let pair = Pair::new(base, quote);
        info!(pair = %pair, account = %account, "🪙 resolved token pair");

        let venues: [Venue; 2] = config.venues.clone();
        let pools = [
            market::resolve_pair_address(provider.clone(), venues[0].factory, &pair).await?,
            market::resolve_pair_address(provider.clone(), venues[1].factory, &pair).await?,
        ];
        for (venue, pool) in venues.iter().zip(&pools) {
            info!(
                venue.name = %venue.name,
                pool.address = %pool,
                "resolved pair contract"
            );
        }

        let routers = [
            OnchainRouter::new(venues[0].router, provider.clone()),
            OnchainRouter::new(venues[1].router, provider.clone()),
        ];

        let simulator = Simulator {
            fee_buffer_bps: config.fee_buffer_bps,
            gas_limit: config.gas_limit,
            gas_price: config.gas_price,
        };
        let executor = TradeExecutor::new(
            Arc::new(OnchainSettlement::new(config.arbitrage_address, submitter)),
            Arc::new(AccountBalances::new(account, provider.clone())),
            config.execution_mode,
        );

        let filter_a = Filter::new()
            .address(pools[0])
            .event(IUniswapV2Pair::Swap::SIGNATURE)
            .from_block(BlockNumberOrTag::Latest);
        let filter_b = Filter::new()
            .address(pools[1])
            .event(IUniswapV2Pair::Swap::SIGNATURE)
            .from_block(BlockNumberOrTag::Latest);

        let mut swaps_a = provider.subscribe_logs(&filter_a).await?.into_stream();
        let mut swaps_b = provider.subscribe_logs(&filter_b).await?.into_stream();

        info!("waiting for swap events");

        // in-flight detection cycle; terminated whenever the gate is open
        let mut cycle = Box::pin(Fuse::terminated());

        loop {
            select! {
                biased;

                () = shutdown_token.cancelled() => {
                    info!("swap watcher received shutdown signal");
                    break Ok(());
                }

                res = &mut cycle, if !cycle.is_terminated() => {
                    if let Err(e) = res {
                        // cycle-local by policy: log, release happened on drop,
                        // keep monitoring
                        error!(error = %e, "detection cycle aborted");
                    }
                }

                Some(log) = swaps_a.next() => {
                    debug!(pool.address = %log.address(), "swap event received");
                    match gate.try_enter() {
                        Some(pass) => {
                            cycle = Box::pin(
                                run_cycle(
                                    pass,
                                    VenueId::A,
                                    provider.clone(),
                                    &venues,
                                    pools,
                                    &pair,
                                    &routers,
                                    &simulator,
                                    &executor,
                                    config.units,
                                    config.price_difference,
                                )
                                .fuse(),
                            );
                        }
                        None => info!(venue.name = %venues[0].name, "cycle in flight, no action"),
                    }
                }

                Some(log) = swaps_b.next() => {
                    debug!(pool.address = %log.address(), "swap event received");
                    match gate.try_enter() {
                        Some(pass) => {
                            cycle = Box::pin(
                                run_cycle(
                                    pass,
                                    VenueId::B,
                                    provider.clone(),
                                    &venues,
                                    pools,
                                    &pair,
                                    &routers,
                                    &simulator,
                                    &executor,
                                    config.units,
                                    config.price_difference,
                                )
                                .fuse(),
                            );
                        }
                        None => info!(venue.name = %venues[1].name, "cycle in flight, no action"),
                    }
                }

                else => break Err(eyre!("swap subscriptions ended")),
            }
        }
    }
}

/// One detection cycle: fresh snapshots, prices, direction, profitability,
/// and (when everything lines up) the settlement trade.
///
/// Holding `pass` keeps the gate closed for the whole cycle; dropping it on
/// any exit path reopens it.
#[allow(clippy::too_many_arguments)]
async fn run_cycle<P: Provider + Clone + 'static>(
    pass: GatePass,
    triggered: VenueId,
    provider: P,
    venues: &[Venue; 2],
    pools: [Address; 2],
    pair: &Pair,
    routers: &[OnchainRouter<P>; 2],
    simulator: &Simulator,
    executor: &TradeExecutor,
    units: u32,
    threshold_percent: f64,
) -> eyre::Result<()> {
    let _pass = pass;

    info!(
        venue.name = %venues[triggered.index()].name,
        "👀 swap observed, checking prices"
    );

    let block = provider
        .get_block_number()
        .await
        .map_err(|e| DataUnavailable::new(format!("could not read block number: {e}")))?;

    let snapshots = [
        market::read_snapshot(provider.clone(), VenueId::A, pools[0]).await?,
        market::read_snapshot(provider.clone(), VenueId::B, pools[1]).await?,
    ];
    let prices = [
        PriceSample {
            venue: VenueId::A,
            price: spot_price::spot_price(&snapshots[0], units)?,
            block,
        },
        PriceSample {
            venue: VenueId::B,
            price: spot_price::spot_price(&snapshots[1], units)?,
            block,
        },
    ];

    let diff_percent = direction::divergence_percent(&prices[0], &prices[1])?;
    info!(
        block.height = block,
        pair = %pair,
        venue_a.name = %venues[0].name,
        venue_a.price = prices[0].price,
        venue_b.name = %venues[1].name,
        venue_b.price = prices[1].price,
        diff_percent,
        "📊 checked prices"
    );

    let Some(direction) = direction::resolve(&prices[0], &prices[1], threshold_percent)? else {
        info!("no arbitrage currently available");
        return Ok(());
    };
    info!(
        buy.venue = %venues[direction.buy().index()].name,
        sell.venue = %venues[direction.sell().index()].name,
        "🎯 potential arbitrage direction"
    );

    let sell_side_pool = &snapshots[direction.sell().index()];
    let outcome = match simulator
        .simulate(
            direction,
            &routers[direction.buy().index()],
            &routers[direction.sell().index()],
            sell_side_pool,
            pair,
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            // this can typically happen because of liquidity issues
            warn!(error = %e, "could not determine profitability, skipping cycle");
            return Ok(());
        }
    };

    let round_trip = match outcome {
        SimulationOutcome::Profitable(round_trip) => round_trip,
        SimulationOutcome::NotProfitable {
            amount_in,
            amount_out,
        } => {
            info!(
                amount_in = format_units(&amount_in, pair.base().decimals),
                amount_out = format_units(&amount_out, pair.base().decimals),
                "no arbitrage currently available"
            );
            return Ok(());
        }
    };
    info!(
        amount_in = format_units(&round_trip.amount_in, pair.base().decimals),
        amount_out = format_units(&round_trip.amount_out, pair.base().decimals),
        surplus = format_units(&round_trip.surplus(), pair.base().decimals),
        estimated_gas_cost = format_units(&round_trip.estimated_gas_cost, 18),
        "✅ round trip clears the fee buffer, attempting arbitrage"
    );

    let report = executor
        .execute(direction, pair, &round_trip.amount_in)
        .await?;

    info!(
        tx_hash = ?report.tx_hash,
        native_before = format_units(&report.native_before, 18),
        native_after = format_units(&report.native_after, 18),
        token_before = format_units(&report.token_before, pair.base().decimals),
        token_after = format_units(&report.token_after, pair.base().decimals),
        token_delta = %report.token_delta(),
        native_spent = %report.native_spent(),
        "🏁 trade complete"
    );

    Ok(())
}

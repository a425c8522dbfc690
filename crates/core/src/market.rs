//! On-chain access to the venues' factory, pair, and router contracts.

use alloy::{
    primitives::{Address, U256, Uint},
    providers::Provider,
    sol,
};
use async_trait::async_trait;
use color_eyre::eyre::{self, WrapErr as _, bail};
use num_bigint::BigUint;

use crate::{
    errors::{DataUnavailable, SimulationError},
    simulation::RouterQuotes,
    spot_price::PoolSnapshot,
    token::{Pair, Token},
    venue::VenueId,
};

sol!(
    #[sol(rpc)]
    contract IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }
);

sol!(
    #[sol(rpc)]
    contract IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
        event Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to);
    }
);

sol!(
    #[sol(rpc)]
    contract IUniswapV2Router02 {
        function getAmountsIn(uint256 amountOut, address[] calldata path) external view returns (uint256[] memory amounts);
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
    }
);

sol!(
    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
);

pub fn to_biguint<const BITS: usize, const LIMBS: usize>(value: Uint<BITS, LIMBS>) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes_vec())
}

pub fn to_u256(value: &BigUint) -> U256 {
    U256::from_be_slice(&value.to_bytes_be())
}

/// Resolves a token descriptor from its ERC-20 metadata.
pub async fn resolve_token<P: Provider + Clone>(provider: P, address: Address) -> eyre::Result<Token> {
    let erc20 = IERC20::new(address, provider);

    let symbol = erc20
        .symbol()
        .call()
        .await
        .wrap_err_with(|| format!("failed to read symbol of token {address}"))?;
    let decimals = erc20
        .decimals()
        .call()
        .await
        .wrap_err_with(|| format!("failed to read decimals of token {address}"))?;

    Ok(Token {
        address,
        symbol,
        decimals,
    })
}

/// Looks up one venue's pair contract for the monitored tokens.
pub async fn resolve_pair_address<P: Provider + Clone>(
    provider: P,
    factory: Address,
    pair: &Pair,
) -> eyre::Result<Address> {
    let factory = IUniswapV2Factory::new(factory, provider);

    let address = factory
        .getPair(pair.token0().address, pair.token1().address)
        .call()
        .await
        .wrap_err_with(|| format!("failed to query factory for the {pair} pair"))?;

    if address == Address::ZERO {
        bail!("factory {} has no pair for {pair}", factory.address());
    }

    Ok(address)
}

/// Reads a fresh reserve snapshot of one venue's pool.
pub async fn read_snapshot<P: Provider + Clone>(
    provider: P,
    venue: VenueId,
    pool: Address,
) -> Result<PoolSnapshot, DataUnavailable> {
    let pair = IUniswapV2Pair::new(pool, provider);

    let reserves = pair.getReserves().call().await.map_err(|e| {
        DataUnavailable::new(format!("could not read reserves of pool {pool}: {e}"))
    })?;

    Ok(PoolSnapshot {
        venue,
        address: pool,
        reserve0: to_biguint(reserves.reserve0),
        reserve1: to_biguint(reserves.reserve1),
    })
}

/// Router quotes served by a venue's on-chain V2 router.
#[derive(Debug, Clone)]
pub struct OnchainRouter<P> {
    address: Address,
    provider: P,
}

impl<P: Provider + Clone> OnchainRouter<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self { address, provider }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> RouterQuotes for OnchainRouter<P> {
    async fn amounts_in(
        &self,
        amount_out: &BigUint,
        path: [Address; 2],
    ) -> Result<(BigUint, BigUint), SimulationError> {
        let router = IUniswapV2Router02::new(self.address, self.provider.clone());

        let amounts = router
            .getAmountsIn(to_u256(amount_out), path.to_vec())
            .call()
            .await
            .map_err(|e| SimulationError::new(format!("getAmountsIn reverted: {e}")))?;

        two_amounts(&amounts)
    }

    async fn amounts_out(
        &self,
        amount_in: &BigUint,
        path: [Address; 2],
    ) -> Result<(BigUint, BigUint), SimulationError> {
        let router = IUniswapV2Router02::new(self.address, self.provider.clone());

        let amounts = router
            .getAmountsOut(to_u256(amount_in), path.to_vec())
            .call()
            .await
            .map_err(|e| SimulationError::new(format!("getAmountsOut reverted: {e}")))?;

        two_amounts(&amounts)
    }
}

fn two_amounts(amounts: &[U256]) -> Result<(BigUint, BigUint), SimulationError> {
    match amounts {
        [input, output] => Ok((to_biguint(*input), to_biguint(*output))),
        _ => Err(SimulationError::new(format!(
            "router returned {} amounts for a two-hop path",
            amounts.len()
        ))),
    }
}

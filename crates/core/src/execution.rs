use std::sync::Arc;

use alloy::{
    primitives::{Address, TxHash},
    providers::Provider,
    sol,
};
use async_trait::async_trait;
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    errors::ExecutionError,
    market,
    token::Pair,
    venue::{ArbitrageDirection, VenueId},
};

sol!(
    #[sol(rpc)]
    contract IArbitrage {
        function executeTrade(bool startOnFirstExchange, address tokenA, address tokenB, uint256 flashAmount) external;
    }
);

/// Whether profitable trades are submitted on-chain or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Dry,
    Live,
}

/// Submission seam to the settlement contract.
#[async_trait]
pub trait Settlement: Send + Sync {
    /// Submits the round trip and blocks until it is mined.
    async fn execute_trade(
        &self,
        start_on_first: bool,
        token_a: Address,
        token_b: Address,
        amount: &BigUint,
    ) -> Result<TxHash, ExecutionError>;
}

/// Account balances used for before/after trade reporting.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn native_balance(&self) -> Result<BigUint, ExecutionError>;
    async fn token_balance(&self, token: Address) -> Result<BigUint, ExecutionError>;
}

/// Balances observed around one trade, plus the transaction that moved them.
#[derive(Debug, Clone)]
pub struct TradeReport {
    pub tx_hash: Option<TxHash>,
    pub native_before: BigUint,
    pub native_after: BigUint,
    pub token_before: BigUint,
    pub token_after: BigUint,
}

impl TradeReport {
    /// Realized base-token gain (positive) or loss (negative).
    pub fn token_delta(&self) -> BigInt {
        BigInt::from(self.token_after.clone()) - BigInt::from(self.token_before.clone())
    }

    /// Native currency spent on the trade, gas included.
    pub fn native_spent(&self) -> BigInt {
        BigInt::from(self.native_before.clone()) - BigInt::from(self.native_after.clone())
    }
}

/// Carries one profitable round trip to the settlement contract.
pub struct TradeExecutor {
    settlement: Arc<dyn Settlement>,
    balances: Arc<dyn BalanceSource>,
    mode: ExecutionMode,
}

impl TradeExecutor {
    pub fn new(
        settlement: Arc<dyn Settlement>,
        balances: Arc<dyn BalanceSource>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            settlement,
            balances,
            mode,
        }
    }

    /// Executes the trade in the resolved direction and reports the balance
    /// movement. In dry mode the settlement contract is never touched and the
    /// report shows unchanged balances.
    pub async fn execute(
        &self,
        direction: ArbitrageDirection,
        pair: &Pair,
        amount: &BigUint,
    ) -> Result<TradeReport, ExecutionError> {
        let start_on_first = direction.buy() == VenueId::A;

        let native_before = self.balances.native_balance().await?;
        let token_before = self.balances.token_balance(pair.base().address).await?;

        let tx_hash = match self.mode {
            ExecutionMode::Dry => {
                info!(%direction, "dry mode, skipping settlement submission");
                None
            }
            ExecutionMode::Live => Some(
                self.settlement
                    .execute_trade(
                        start_on_first,
                        pair.base().address,
                        pair.quote().address,
                        amount,
                    )
                    .await?,
            ),
        };

        let native_after = self.balances.native_balance().await?;
        let token_after = self.balances.token_balance(pair.base().address).await?;

        Ok(TradeReport {
            tx_hash,
            native_before,
            native_after,
            token_before,
            token_after,
        })
    }
}

/// Settlement served by the deployed arbitrage contract through a provider
/// that carries the signing wallet.
#[derive(Debug, Clone)]
pub struct OnchainSettlement<P> {
    address: Address,
    provider: P,
}

impl<P: Provider + Clone> OnchainSettlement<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self { address, provider }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> Settlement for OnchainSettlement<P> {
    async fn execute_trade(
        &self,
        start_on_first: bool,
        token_a: Address,
        token_b: Address,
        amount: &BigUint,
    ) -> Result<TxHash, ExecutionError> {
        let arbitrage = IArbitrage::new(self.address, self.provider.clone());

        let pending = arbitrage
            .executeTrade(start_on_first, token_a, token_b, market::to_u256(amount))
            .send()
            .await
            .map_err(|e| ExecutionError::new(format!("settlement submission failed: {e}")))?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ExecutionError::new(format!("settlement transaction not mined: {e}")))?;

        if !receipt.status() {
            return Err(ExecutionError::new(format!(
                "settlement transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(receipt.transaction_hash)
    }
}

/// Balances read straight from the node.
#[derive(Debug, Clone)]
pub struct AccountBalances<P> {
    account: Address,
    provider: P,
}

impl<P: Provider + Clone> AccountBalances<P> {
    pub fn new(account: Address, provider: P) -> Self {
        Self { account, provider }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> BalanceSource for AccountBalances<P> {
    async fn native_balance(&self) -> Result<BigUint, ExecutionError> {
        let balance = self
            .provider
            .get_balance(self.account)
            .await
            .map_err(|e| ExecutionError::new(format!("could not read native balance: {e}")))?;
        Ok(market::to_biguint(balance))
    }

    async fn token_balance(&self, token: Address) -> Result<BigUint, ExecutionError> {
        let erc20 = market::IERC20::new(token, self.provider.clone());
        let balance = erc20
            .balanceOf(self.account)
            .call()
            .await
            .map_err(|e| ExecutionError::new(format!("could not read balance of {token}: {e}")))?;
        Ok(market::to_biguint(balance))
    }
}

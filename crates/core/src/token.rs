use std::fmt::Display;

use alloy::primitives::Address;
use num_bigint::BigUint;
use num_traits::ToPrimitive as _;
use serde::{Deserialize, Serialize};

/// An ERC-20 token resolved from its on-chain metadata at startup.
/// Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// The monitored token pair, normalized to Uniswap's zero2one direction so
/// that (token0, token1) matches the ordering of the on-chain pair contracts.
///
/// The pair also remembers which side is the base token (the one the strategy
/// accumulates) and which is the quote token it trades against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    token0: Token,
    token1: Token,
    base_is_token0: bool,
}

impl Pair {
    pub fn new(base: Token, quote: Token) -> Self {
        let zero2one = base.address < quote.address;
        if zero2one {
            Self {
                token0: base,
                token1: quote,
                base_is_token0: true,
            }
        } else {
            Self {
                token0: quote,
                token1: base,
                base_is_token0: false,
            }
        }
    }

    pub fn token0(&self) -> &Token {
        &self.token0
    }

    pub fn token1(&self) -> &Token {
        &self.token1
    }

    pub fn base(&self) -> &Token {
        if self.base_is_token0 {
            &self.token0
        } else {
            &self.token1
        }
    }

    pub fn quote(&self) -> &Token {
        if self.base_is_token0 {
            &self.token1
        } else {
            &self.token0
        }
    }
}

impl Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.token0.symbol, self.token1.symbol)
    }
}

/// Renders a base-unit amount in display units of a token with `decimals`.
/// Only used for log output; all decisions stay in base units.
pub fn format_units(amount: &BigUint, decimals: u8) -> f64 {
    amount.to_f64().unwrap_or(f64::INFINITY) / 10f64.powi(i32::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    fn weth() -> Token {
        Token {
            address: Address::from_str("0x0000000000000000000000000000000000000002").unwrap(),
            symbol: "WETH".to_string(),
            decimals: 18,
        }
    }

    fn usdc() -> Token {
        Token {
            address: Address::from_str("0x0000000000000000000000000000000000000001").unwrap(),
            symbol: "USDC".to_string(),
            decimals: 6,
        }
    }

    #[test]
    fn pair_normalizes_to_address_order() {
        let pair = Pair::new(weth(), usdc());
        assert_eq!(pair.token0(), &usdc());
        assert_eq!(pair.token1(), &weth());

        // same ordering regardless of which side is the base
        let flipped = Pair::new(usdc(), weth());
        assert_eq!(flipped.token0(), &usdc());
        assert_eq!(flipped.token1(), &weth());
    }

    #[test]
    fn pair_remembers_base_and_quote_roles() {
        let pair = Pair::new(weth(), usdc());
        assert_eq!(pair.base(), &weth());
        assert_eq!(pair.quote(), &usdc());

        let flipped = Pair::new(usdc(), weth());
        assert_eq!(flipped.base(), &usdc());
        assert_eq!(flipped.quote(), &weth());
    }

    #[test]
    fn format_units_scales_by_decimals() {
        let one_and_a_half_eth = BigUint::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_units(&one_and_a_half_eth, 18), 1.5);
    }
}

use std::fmt::Display;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Identifies one of the two monitored venues. `A` is the first venue in the
/// configuration, `B` the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueId {
    A,
    B,
}

impl VenueId {
    pub fn other(self) -> Self {
        match self {
            VenueId::A => VenueId::B,
            VenueId::B => VenueId::A,
        }
    }

    /// Index into per-venue arrays held in configured order.
    pub fn index(self) -> usize {
        match self {
            VenueId::A => 0,
            VenueId::B => 1,
        }
    }
}

impl Display for VenueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VenueId::A => write!(f, "A"),
            VenueId::B => write!(f, "B"),
        }
    }
}

/// One AMM venue: a display label plus its factory and router endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub factory: Address,
    pub router: Address,
}

/// Which venue to buy the quote token on and which to unwind it on.
/// The two sides are distinct by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrageDirection {
    buy: VenueId,
}

impl ArbitrageDirection {
    pub fn buy_on(buy: VenueId) -> Self {
        Self { buy }
    }

    pub fn buy(&self) -> VenueId {
        self.buy
    }

    pub fn sell(&self) -> VenueId {
        self.buy.other()
    }
}

impl Display for ArbitrageDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buy on {}, sell on {}", self.buy(), self.sell())
    }
}

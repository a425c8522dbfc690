use alloy::primitives::Address;
use num_bigint::BigUint;
use num_traits::{ToPrimitive as _, Zero as _};
use serde::{Deserialize, Serialize};

use crate::{errors::DataUnavailable, venue::VenueId};

/// Reserve state of one venue's pool, read fresh at the start of a detection
/// cycle and never mutated locally.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub venue: VenueId,
    pub address: Address,
    pub reserve0: BigUint,
    pub reserve1: BigUint,
}

/// One venue's spot price at the block it was observed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceSample {
    pub venue: VenueId,
    pub price: f64,
    pub block: u64,
}

/// The token1-per-token0 spot price implied by `snapshot`, rounded to
/// `units` fractional digits.
///
/// An empty token0 side means the node handed us an unusable snapshot, so it
/// is rejected before the division rather than producing infinity.
pub fn spot_price(snapshot: &PoolSnapshot, units: u32) -> Result<f64, DataUnavailable> {
    if snapshot.reserve0.is_zero() {
        return Err(DataUnavailable::new(format!(
            "pool {} has no token0 reserves",
            snapshot.address
        )));
    }

    let reserve0 = snapshot
        .reserve0
        .to_f64()
        .ok_or_else(|| DataUnavailable::new("reserve0 does not fit a float"))?;
    let reserve1 = snapshot
        .reserve1
        .to_f64()
        .ok_or_else(|| DataUnavailable::new("reserve1 does not fit a float"))?;

    let scale = 10f64.powi(units as i32);
    Ok((reserve1 / reserve0 * scale).round() / scale)
}

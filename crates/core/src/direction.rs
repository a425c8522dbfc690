use crate::{
    errors::DataUnavailable,
    spot_price::PriceSample,
    venue::{ArbitrageDirection, VenueId},
};

/// Percentage divergence of venue A's price relative to venue B's.
pub fn divergence_percent(a: &PriceSample, b: &PriceSample) -> Result<f64, DataUnavailable> {
    if b.price == 0.0 {
        return Err(DataUnavailable::new(format!(
            "venue {} reports a zero price",
            b.venue
        )));
    }
    Ok(100.0 * (a.price - b.price) / b.price)
}

/// Picks the venue to buy on and the venue to sell on, or `None` when the
/// divergence stays inside `threshold_percent`.
///
/// A divergence at or above the threshold means A trades rich relative to B:
/// buy where the quote token is cheap and unwind where it is expensive.
pub fn resolve(
    a: &PriceSample,
    b: &PriceSample,
    threshold_percent: f64,
) -> Result<Option<ArbitrageDirection>, DataUnavailable> {
    let diff = divergence_percent(a, b)?;

    if diff >= threshold_percent {
        Ok(Some(ArbitrageDirection::buy_on(VenueId::B)))
    } else if diff <= -threshold_percent {
        Ok(Some(ArbitrageDirection::buy_on(VenueId::A)))
    } else {
        Ok(None)
    }
}

// Heuristic success-probability model for harvested candidates.
use crate::model::Source;

/// Sales-volume threshold treated as a strong demand signal.
pub const VOLUME_THRESHOLD: u32 = 500;

/// Inclusive impulse-buy price band in R$.
const PRICE_BAND: (f64, f64) = (15.0, 89.0);

const BESTSELLER_BASE: f64 = 0.6;
const VOLUME_BONUS: f64 = 0.2;
const PRICE_BONUS: f64 = 0.2;

/// Clamps a probability into [0, 1]; NaN collapses to 0.
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Computes the harvest-time success probability. A bestseller source alone
/// clears the base (monotonic max, not additive); volume and price band each
/// add a bonus when their data is present. Missing data skips the bonus.
pub fn success_probability(source: Source, volume_signal: u32, price: Option<f64>) -> f64 {
    let mut prob: f64 = 0.0;
    if source.is_bestseller() {
        prob = prob.max(BESTSELLER_BASE);
    }
    if volume_signal >= VOLUME_THRESHOLD {
        prob += VOLUME_BONUS;
    }
    if let Some(price) = price
        && price >= PRICE_BAND.0
        && price <= PRICE_BAND.1
    {
        prob += PRICE_BONUS;
    }
    clamp_probability(prob)
}

//! Fuel price labels for search results.
//!
//! No live price feed is wired in. [`UniformPriceSource`] produces a
//! placeholder per station; swap in another [`PriceSource`] for real data.

use crate::sdk::PlaceRecord;
use rand::Rng;
use std::cmp::Ordering;
use truckstop_core::config::PricingConfig;

/// Supplies a fuel price for a place, if one is known.
pub trait PriceSource: Send + Sync {
    /// Price per unit for `place`.
    fn price_for(&self, place: &PlaceRecord) -> Option<f64>;
}

/// Draws a price uniformly from `[min, max)` for every place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformPriceSource {
    min: f64,
    max: f64,
}

impl UniformPriceSource {
    /// A source over `[min, max)`. An empty or inverted range yields `min`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range taken from the `[pricing]` section.
    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.min, config.max)
    }
}

impl Default for UniformPriceSource {
    fn default() -> Self {
        Self::from_config(&PricingConfig::default())
    }
}

impl PriceSource for UniformPriceSource {
    fn price_for(&self, _place: &PlaceRecord) -> Option<f64> {
        if self.min.partial_cmp(&self.max) != Some(Ordering::Less) {
            return Some(self.min);
        }
        Some(rand::rng().random_range(self.min..self.max))
    }
}

/// Formats a price with two decimals.
pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(15.0), "15.00");
        assert_eq!(format_price(16.456), "16.46");
    }

    #[test]
    fn test_degenerate_range() {
        let source = UniformPriceSource::new(16.0, 16.0);
        assert_eq!(source.price_for(&PlaceRecord::default()), Some(16.0));
    }

    proptest! {
        #[test]
        fn prices_stay_in_range(_seed in 0u32..64) {
            let source = UniformPriceSource::default();
            let price = source.price_for(&PlaceRecord::default()).unwrap();
            prop_assert!((15.0..17.0).contains(&price));
        }
    }
}

//! Order computation for the final signup step. Nothing is charged here.

use serde::{Deserialize, Serialize};

use onboard_core::validation::parse_clamped_int;

/// Upper bound on extra plates per order.
pub const MAX_EXTRA_PLATES: i64 = 99;

/// Price list, in euro cents excluding VAT.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub startup_fee_cents: u64,
    pub extra_plate_price_cents: u64,
    pub monthly_fee_cents: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            startup_fee_cents: 14_900,
            extra_plate_price_cents: 2_500,
            monthly_fee_cents: 3_900,
        }
    }
}

/// Computed order, in euro cents excluding VAT.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub startup_fee_cents: u64,
    pub extra_plates_qty: u32,
    pub extra_plate_price_cents: u64,
    pub total_today_cents: u64,
    pub monthly_cents: u64,
}

impl PricingConfig {
    /// Price an order from the raw extra-plate quantity as submitted.
    ///
    /// The quantity is parsed leniently and clamped to `0..=MAX_EXTRA_PLATES`.
    /// The total saturates at `u64::MAX` rather than wrapping.
    pub fn quote(&self, raw_extra_plates: &str) -> OrderSummary {
        let qty = parse_clamped_int(raw_extra_plates, 0, 0..=MAX_EXTRA_PLATES) as u32;
        OrderSummary {
            startup_fee_cents: self.startup_fee_cents,
            extra_plates_qty: qty,
            extra_plate_price_cents: self.extra_plate_price_cents,
            total_today_cents: self
                .startup_fee_cents
                .saturating_add(u64::from(qty).saturating_mul(self.extra_plate_price_cents)),
            monthly_cents: self.monthly_fee_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_startup_plus_plates() {
        let pricing = PricingConfig::default();
        let order = pricing.quote("2");
        assert_eq!(order.extra_plates_qty, 2);
        assert_eq!(order.total_today_cents, 14_900 + 2 * 2_500);
        assert_eq!(order.monthly_cents, 3_900);
    }

    #[test]
    fn quantity_is_clamped() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.quote("150").extra_plates_qty, 99);
        assert_eq!(pricing.quote("-5").extra_plates_qty, 0);
        assert_eq!(pricing.quote("lots").extra_plates_qty, 0);
        assert_eq!(pricing.quote("-5").total_today_cents, pricing.startup_fee_cents);
    }

    #[test]
    fn oversized_quantity_saturates_to_the_cap() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.quote("99999999999999999999999").extra_plates_qty, 99);
        assert_eq!(pricing.quote("-99999999999999999999999").extra_plates_qty, 0);
    }

    #[test]
    fn huge_prices_saturate_instead_of_wrapping() {
        let pricing = PricingConfig {
            startup_fee_cents: u64::MAX - 1,
            extra_plate_price_cents: u64::MAX,
            monthly_fee_cents: 0,
        };
        assert_eq!(pricing.quote("2").total_today_cents, u64::MAX);
        assert_eq!(pricing.quote("0").total_today_cents, u64::MAX - 1);
    }
}

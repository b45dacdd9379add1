//! Cost computation from units and a pricing record

use crate::record::PricingRecord;
use lens_types::domain::PricingModel;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of units in a single request above which a batch discount,
/// when configured, applies.
const BATCH_DISCOUNT_THRESHOLD_UNITS: i64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub vendor: String,
    pub model: String,
    pub pricing_model: PricingModel,
    pub input_units: i64,
    pub output_units: i64,
    pub input_cost: Decimal,
    pub output_cost: Decimal,
    pub volume_discount_applied: Decimal,
    pub batch_discount_applied: bool,
    pub total_cost: Decimal,
    pub currency: String,
}

/// Cost is monotonic non-decreasing in each of `input_units` and
/// `output_units` holding the other fixed, per the pricing record's
/// per-unit prices — discounts only ever scale the subtotal down, never
/// flip its direction of change.
pub fn calculate(record: &PricingRecord, input_units: i64, output_units: i64, current_monthly_cost: Decimal) -> CostBreakdown {
    let input_cost = record.input_price * Decimal::from(input_units);
    let output_cost = record.output_price * Decimal::from(output_units);
    let subtotal = input_cost + output_cost;

    let volume_discount = record.volume_discount_for(current_monthly_cost);
    let after_volume = apply_discount_pct(subtotal, volume_discount);

    let total_units = input_units + output_units;
    let batch_eligible = record.batch_discount.is_some() && total_units >= BATCH_DISCOUNT_THRESHOLD_UNITS;
    let total_cost = if batch_eligible {
        apply_discount_pct(after_volume, record.batch_discount.unwrap())
    } else {
        after_volume
    };

    CostBreakdown {
        vendor: record.vendor.clone(),
        model: record.model.clone(),
        pricing_model: record.pricing_model,
        input_units,
        output_units,
        input_cost,
        output_cost,
        volume_discount_applied: volume_discount,
        batch_discount_applied: batch_eligible,
        total_cost: round_significant(total_cost, 10),
        currency: record.currency.clone(),
    }
}

fn apply_discount_pct(amount: Decimal, discount_pct: Decimal) -> Decimal {
    if discount_pct <= Decimal::ZERO {
        return amount;
    }
    amount - (amount * discount_pct / Decimal::from(100))
}

/// Round to `digits` significant digits, matching the source's
/// `getcontext().prec = 10` decimal-context precision. The magnitude
/// estimate goes through `f64` since `rust_decimal`'s own `log10` needs
/// the `maths` feature this workspace doesn't enable — fine here since
/// only the floor of the exponent is needed, not the value itself.
fn round_significant(amount: Decimal, digits: u32) -> Decimal {
    if amount.is_zero() {
        return amount;
    }
    let magnitude = amount.abs().to_f64().map(|f| f.log10().floor() as i64).unwrap_or(0);
    let scale = (digits as i64 - 1) - magnitude;
    if scale <= 0 {
        amount.round_dp(0)
    } else {
        amount.round_dp(scale as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn token_record() -> PricingRecord {
        PricingRecord {
            vendor: "openai".to_string(),
            model: "gpt-4".to_string(),
            pricing_model: PricingModel::PerToken,
            input_price: dec!(0.00003),
            output_price: dec!(0.00006),
            currency: "USD".to_string(),
            effective_from: Utc::now(),
            version: 1,
            batch_discount: None,
            volume_tiers: None,
        }
    }

    #[test]
    fn computes_input_and_output_cost_separately() {
        let record = token_record();
        let breakdown = calculate(&record, 1000, 500, Decimal::ZERO);
        assert_eq!(breakdown.input_cost, dec!(0.03));
        assert_eq!(breakdown.output_cost, dec!(0.03));
        assert_eq!(breakdown.total_cost, dec!(0.06));
    }

    #[test]
    fn batch_discount_applies_at_or_above_1000_total_units() {
        let mut record = token_record();
        record.batch_discount = Some(dec!(10));
        let below = calculate(&record, 400, 400, Decimal::ZERO);
        let at_threshold = calculate(&record, 500, 500, Decimal::ZERO);
        assert!(!below.batch_discount_applied);
        assert!(at_threshold.batch_discount_applied);
        assert!(at_threshold.total_cost < below.total_cost.max(at_threshold.total_cost));
    }

    #[test]
    fn volume_discount_scales_down_the_subtotal() {
        let mut record = token_record();
        let mut tiers = crate::record::VolumeTiers::new();
        tiers.insert("100".to_string(), dec!(20));
        record.volume_tiers = Some(tiers);

        let undiscounted = calculate(&record, 1000, 0, Decimal::ZERO);
        let discounted = calculate(&record, 1000, 0, dec!(500));
        assert_eq!(discounted.volume_discount_applied, dec!(20));
        assert!(discounted.total_cost < undiscounted.total_cost);
    }

    #[test]
    fn cost_is_monotonic_in_input_units_holding_output_fixed() {
        let record = token_record();
        let low = calculate(&record, 100, 100, Decimal::ZERO);
        let high = calculate(&record, 200, 100, Decimal::ZERO);
        assert!(high.total_cost >= low.total_cost);
    }
}

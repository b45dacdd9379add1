//! A vendor/model pricing record

use chrono::{DateTime, Utc};
use lens_types::domain::PricingModel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Volume discount tiers, keyed by a monthly-cost threshold and mapping
/// to a discount fraction. `BTreeMap` keeps thresholds sorted by bit
/// pattern, which for monotonically ordered tier keys (we store the
/// threshold as a zero-padded decimal string) walks lowest-to-highest.
pub type VolumeTiers = BTreeMap<String, Decimal>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingRecord {
    pub vendor: String,
    pub model: String,
    pub pricing_model: PricingModel,
    pub input_price: Decimal,
    pub output_price: Decimal,
    pub currency: String,
    pub effective_from: DateTime<Utc>,
    pub version: u32,
    pub batch_discount: Option<Decimal>,
    pub volume_tiers: Option<VolumeTiers>,
}

impl PricingRecord {
    pub(crate) fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Highest threshold at or below `monthly_cost`, or zero if none
    /// apply. Tier keys parse as `Decimal`; unparsable keys are skipped.
    pub fn volume_discount_for(&self, monthly_cost: Decimal) -> Decimal {
        let Some(tiers) = &self.volume_tiers else {
            return Decimal::ZERO;
        };
        tiers
            .iter()
            .filter_map(|(threshold, rate)| threshold.parse::<Decimal>().ok().map(|t| (t, *rate)))
            .filter(|(threshold, _)| *threshold <= monthly_cost)
            .max_by_key(|(threshold, _)| *threshold)
            .map(|(_, rate)| rate)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record_with_tiers() -> PricingRecord {
        let mut tiers = VolumeTiers::new();
        tiers.insert("100".to_string(), dec!(5));
        tiers.insert("1000".to_string(), dec!(10));
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
            volume_tiers: Some(tiers),
        }
    }

    #[test]
    fn picks_highest_threshold_at_or_below_monthly_cost() {
        let record = record_with_tiers();
        assert_eq!(record.volume_discount_for(dec!(50)), Decimal::ZERO);
        assert_eq!(record.volume_discount_for(dec!(500)), dec!(5));
        assert_eq!(record.volume_discount_for(dec!(5000)), dec!(10));
    }

    #[test]
    fn no_tiers_means_no_discount() {
        let mut record = record_with_tiers();
        record.volume_tiers = None;
        assert_eq!(record.volume_discount_for(dec!(99999)), Decimal::ZERO);
    }
}

//! Normalized usage extracted from a vendor response envelope

use lens_types::domain::{PricingModel, VendorTag};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How much the caller should trust `input_units`/`output_units`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

/// Vendor-agnostic usage extracted from one response, ready for
/// pricing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedUsage {
    pub vendor: VendorTag,
    pub model: String,
    pub input_units: i64,
    pub output_units: i64,
    pub pricing_model: PricingModel,
    pub confidence: Confidence,
    /// Set when no usage object was present at all and the parser fell
    /// back to estimating from response text.
    pub estimated: bool,
    /// Parser-specific extras that never feed a pricing calculation —
    /// e.g. Anthropic's token-to-character estimate, kept only for
    /// observability. Empty object when a parser has nothing to add.
    #[serde(default)]
    pub metadata: Value,
}

impl NormalizedUsage {
    pub fn total_units(&self) -> i64 {
        self.input_units + self.output_units
    }
}

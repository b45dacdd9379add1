//! Vendor parser registry: one parser per known vendor tag,
//! resolved once at startup and shared via `Arc`, with a generic
//! fallback always present for unrecognized vendors.

use crate::parser::{AnthropicParser, GenericParser, GoogleParser, OpenAiParser, UsageParser};
use crate::types::NormalizedUsage;
use lens_types::domain::VendorTag;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

pub struct VendorRegistry {
    parsers: HashMap<VendorTag, Box<dyn UsageParser>>,
    generic: GenericParser,
}

impl VendorRegistry {
    pub fn new() -> Self {
        let mut parsers: HashMap<VendorTag, Box<dyn UsageParser>> = HashMap::new();
        parsers.insert(VendorTag::OpenAi, Box::new(OpenAiParser));
        parsers.insert(VendorTag::Anthropic, Box::new(AnthropicParser));
        parsers.insert(VendorTag::Google, Box::new(GoogleParser));
        Self { parsers, generic: GenericParser }
    }

    /// Parse `response` using the vendor's specific parser, or the
    /// generic fallback when the vendor has no dedicated one.
    pub fn parse(&self, vendor: &VendorTag, model_hint: &str, response: &Value) -> NormalizedUsage {
        match self.parsers.get(vendor) {
            Some(parser) => parser.parse(model_hint, response),
            None => {
                warn!(%vendor, "no dedicated usage parser, using generic fallback");
                self.generic.parse(model_hint, response)
            }
        }
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_vendor_routes_to_its_specific_parser() {
        let registry = VendorRegistry::new();
        let response = json!({"model": "gpt-4o", "usage": {"prompt_tokens": 10, "completion_tokens": 5}});
        let usage = registry.parse(&VendorTag::OpenAi, "gpt-4o", &response);
        assert_eq!(usage.vendor, VendorTag::OpenAi);
        assert_eq!(usage.input_units, 10);
    }

    #[test]
    fn unknown_vendor_falls_back_to_generic() {
        let registry = VendorRegistry::new();
        let response = json!({"model": "mystery", "usage": {"prompt_tokens": 1, "completion_tokens": 1}});
        let usage = registry.parse(&VendorTag::Other("cohere".to_string()), "mystery", &response);
        assert_eq!(usage.vendor, VendorTag::Other("generic".to_string()));
    }
}

//! The `UsageParser` trait and its four implementations

use crate::types::{Confidence, NormalizedUsage};
use lens_types::domain::{PricingModel, VendorTag};
use serde_json::{json, Value};

/// Extracts normalized usage from a vendor's raw JSON response. Never
/// fails — a missing or malformed field degrades to a zero count and a
/// low-confidence marker rather than an error.
pub trait UsageParser: Send + Sync {
    fn parse(&self, model_hint: &str, response: &Value) -> NormalizedUsage;
}

fn as_i64(v: &Value, key: &str) -> Option<i64> {
    v.get(key).and_then(Value::as_i64)
}

pub struct OpenAiParser;

impl UsageParser for OpenAiParser {
    fn parse(&self, model_hint: &str, response: &Value) -> NormalizedUsage {
        let model = response
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(model_hint)
            .to_string();
        let usage = response.get("usage");
        let input_units = usage.and_then(|u| as_i64(u, "prompt_tokens")).unwrap_or(0);
        let output_units = usage.and_then(|u| as_i64(u, "completion_tokens")).unwrap_or(0);

        NormalizedUsage {
            vendor: VendorTag::OpenAi,
            model,
            input_units,
            output_units,
            pricing_model: PricingModel::PerToken,
            confidence: if usage.is_some() { Confidence::High } else { Confidence::Low },
            estimated: usage.is_none(),
            metadata: Value::Null,
        }
    }
}

pub struct AnthropicParser;

impl AnthropicParser {
    /// Rough character-per-token ratio for the metadata-only estimate —
    /// never consulted for pricing, since Anthropic bills per token.
    const CHARS_PER_TOKEN: i64 = 4;
}

impl UsageParser for AnthropicParser {
    fn parse(&self, model_hint: &str, response: &Value) -> NormalizedUsage {
        let model = response
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(model_hint)
            .to_string();
        let usage = response.get("usage");
        let input_units = usage.and_then(|u| as_i64(u, "input_tokens")).unwrap_or(0);
        let output_units = usage.and_then(|u| as_i64(u, "output_tokens")).unwrap_or(0);

        NormalizedUsage {
            vendor: VendorTag::Anthropic,
            model,
            input_units,
            output_units,
            pricing_model: PricingModel::PerToken,
            confidence: if usage.is_some() { Confidence::High } else { Confidence::Low },
            estimated: usage.is_none(),
            metadata: json!({
                "estimated_input_characters": input_units * Self::CHARS_PER_TOKEN,
                "estimated_output_characters": output_units * Self::CHARS_PER_TOKEN,
            }),
        }
    }
}

pub struct GoogleParser;

impl GoogleParser {
    /// Model name substrings billed per character rather than per token.
    const CHARACTER_MODEL_FAMILIES: &'static [&'static str] = &["text-bison", "chat-bison"];
    /// Rough character-per-token ratio used both for model-family
    /// conversion and for the text-estimation fallback.
    const CHARS_PER_TOKEN: i64 = 4;

    fn is_character_billed(model: &str) -> bool {
        let lower = model.to_ascii_lowercase();
        Self::CHARACTER_MODEL_FAMILIES.iter().any(|f| lower.contains(f))
    }

    fn estimate_from_candidates(response: &Value) -> i64 {
        response
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .and_then(|p| p.first())
            .and_then(|p| p.get("text"))
            .and_then(Value::as_str)
            .map(|text| (text.split_whitespace().count() as f64 * 1.3) as i64)
            .unwrap_or(0)
    }
}

impl UsageParser for GoogleParser {
    fn parse(&self, model_hint: &str, response: &Value) -> NormalizedUsage {
        let model = response
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(model_hint)
            .to_string();
        let usage = response.get("usage");

        let (mut input_units, mut output_units, estimated) = match usage {
            Some(u) => (
                as_i64(u, "prompt_tokens").or_else(|| as_i64(u, "input_tokens")).unwrap_or(0),
                as_i64(u, "completion_tokens").or_else(|| as_i64(u, "output_tokens")).unwrap_or(0),
                false,
            ),
            None => (0, Self::estimate_from_candidates(response), true),
        };

        let character_billed = Self::is_character_billed(&model);
        if character_billed {
            input_units *= Self::CHARS_PER_TOKEN;
            output_units *= Self::CHARS_PER_TOKEN;
        }

        NormalizedUsage {
            vendor: VendorTag::Google,
            model,
            input_units,
            output_units,
            pricing_model: if character_billed { PricingModel::PerCharacter } else { PricingModel::PerToken },
            confidence: if usage.is_some() { Confidence::High } else { Confidence::Low },
            estimated,
            metadata: Value::Null,
        }
    }
}

pub struct GenericParser;

impl GenericParser {
    const USAGE_FIELDS: &'static [&'static str] = &["usage", "token_usage", "consumption", "billing"];
    const INPUT_FIELDS: &'static [&'static str] = &["prompt_tokens", "input_tokens", "input_units", "request_tokens"];
    const OUTPUT_FIELDS: &'static [&'static str] =
        &["completion_tokens", "output_tokens", "output_units", "response_tokens"];
    const CONTENT_FIELDS: &'static [&'static str] = &["content", "text", "response", "completion", "answer"];
    /// Whitespace-token-count multiplier used to estimate output tokens
    /// from raw response text when no usage object is present at all.
    pub const TOKEN_ESTIMATE_FACTOR: f64 = 1.3;

    fn first_present<'a>(v: &'a Value, fields: &[&str]) -> Option<i64> {
        fields.iter().find_map(|f| as_i64(v, f))
    }
}

impl UsageParser for GenericParser {
    fn parse(&self, model_hint: &str, response: &Value) -> NormalizedUsage {
        let model = response
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(model_hint)
            .to_string();

        let usage_data = Self::USAGE_FIELDS.iter().find_map(|f| response.get(*f));
        let mut input_units = usage_data.and_then(|u| Self::first_present(u, Self::INPUT_FIELDS)).unwrap_or(0);
        let mut output_units = usage_data.and_then(|u| Self::first_present(u, Self::OUTPUT_FIELDS)).unwrap_or(0);

        if input_units == 0 && output_units == 0 {
            if let Some(text) = Self::CONTENT_FIELDS.iter().find_map(|f| response.get(*f)).and_then(Value::as_str) {
                output_units = (text.split_whitespace().count() as f64 * Self::TOKEN_ESTIMATE_FACTOR) as i64;
            }
        }
        // never negative — a malformed field containing a negative number
        // must not flip the sign of a downstream cost calculation.
        input_units = input_units.max(0);
        output_units = output_units.max(0);

        NormalizedUsage {
            vendor: VendorTag::Other("generic".to_string()),
            model,
            input_units,
            output_units,
            pricing_model: PricingModel::PerToken,
            confidence: Confidence::Low,
            estimated: true,
            metadata: Value::Null,
        }
    }
}

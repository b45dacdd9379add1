//! Shared domain vocabulary used across every metering component.
//!
//! Keeping these as sum types (rather than stringly-typed tags, as the
//! system this gateway replaces does) lets the compiler catch an unknown
//! vendor or tier at the boundary instead of at a `match` deep inside the
//! pricing engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer tier, governing default rate limits and quotas when a tenant
/// has no explicit configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Basic,
    Premium,
    Enterprise,
    Unlimited,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Premium => "premium",
            Tier::Enterprise => "enterprise",
            Tier::Unlimited => "unlimited",
        };
        write!(f, "{s}")
    }
}

/// Unit of billing for a vendor/model pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    PerToken,
    PerCharacter,
    PerRequest,
    PerImage,
    PerAudioSecond,
    PerVideoSecond,
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PricingModel::PerToken => "per_token",
            PricingModel::PerCharacter => "per_character",
            PricingModel::PerRequest => "per_request",
            PricingModel::PerImage => "per_image",
            PricingModel::PerAudioSecond => "per_audio_second",
            PricingModel::PerVideoSecond => "per_video_second",
        };
        write!(f, "{s}")
    }
}

/// Supported upstream vendors. `Other` carries an arbitrary tag so a
/// not-yet-specialized vendor still routes through the generic parser
/// instead of failing closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorTag {
    OpenAi,
    Anthropic,
    Google,
    Other(String),
}

impl fmt::Display for VendorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorTag::OpenAi => write!(f, "openai"),
            VendorTag::Anthropic => write!(f, "anthropic"),
            VendorTag::Google => write!(f, "google"),
            VendorTag::Other(tag) => write!(f, "{tag}"),
        }
    }
}

impl From<&str> for VendorTag {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "openai" => VendorTag::OpenAi,
            "anthropic" => VendorTag::Anthropic,
            "google" | "google-vertex" | "vertex" | "gemini" => VendorTag::Google,
            other => VendorTag::Other(other.to_string()),
        }
    }
}

/// Rate-limiting time granularity, with its span in seconds.
///
/// `Month` uses the fixed 2629746s (30.44 day) approximation for sliding-
/// window math — this is deliberately distinct from the calendar-month
/// reset boundary `lens-quota` uses for billing periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowClass {
    Minute,
    Hour,
    Day,
    Month,
    Burst,
}

impl WindowClass {
    /// Window span in seconds.
    pub const fn span_secs(self) -> i64 {
        match self {
            WindowClass::Minute => 60,
            WindowClass::Hour => 3600,
            WindowClass::Day => 86_400,
            WindowClass::Month => 2_629_746,
            WindowClass::Burst => 60,
        }
    }
}

impl fmt::Display for WindowClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WindowClass::Minute => "minute",
            WindowClass::Hour => "hour",
            WindowClass::Day => "day",
            WindowClass::Month => "month",
            WindowClass::Burst => "burst",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_tag_parses_case_insensitively() {
        assert_eq!(VendorTag::from("OpenAI"), VendorTag::OpenAi);
        assert_eq!(VendorTag::from("anthropic"), VendorTag::Anthropic);
        assert_eq!(VendorTag::from("gemini"), VendorTag::Google);
    }

    #[test]
    fn unknown_vendor_falls_back_to_other() {
        assert_eq!(
            VendorTag::from("cohere"),
            VendorTag::Other("cohere".to_string())
        );
    }

    #[test]
    fn month_span_matches_spec_constant() {
        assert_eq!(WindowClass::Month.span_secs(), 2_629_746);
    }

    #[test]
    fn burst_and_minute_share_span() {
        assert_eq!(WindowClass::Burst.span_secs(), WindowClass::Minute.span_secs());
    }
}

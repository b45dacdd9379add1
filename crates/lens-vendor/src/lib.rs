pub mod parser;
pub mod registry;
pub mod types;

pub use parser::{AnthropicParser, GenericParser, GoogleParser, OpenAiParser, UsageParser};
pub use registry::VendorRegistry;
pub use types::{Confidence, NormalizedUsage};

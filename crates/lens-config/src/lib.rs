mod env;
mod error;
mod surface;

pub use error::ConfigError;
pub use surface::{LensConfig, LogFormat};

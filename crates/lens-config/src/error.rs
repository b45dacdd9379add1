use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {var}")]
    MissingRequired { var: String },

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

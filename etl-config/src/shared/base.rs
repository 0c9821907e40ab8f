use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The publisher would spin without pausing between samples.
    #[error("`publisher.interval_ms` cannot be zero")]
    PublishIntervalZero,
    /// A setting that must be positive is zero.
    #[error("`{0}` cannot be zero")]
    ZeroValue(&'static str),
}

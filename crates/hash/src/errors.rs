use thiserror::Error;

/// Errors from selecting or configuring a hash backend.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum HashError {
    /// The algorithm selector does not name a supported backend.
    #[error("unsupported hash type (selector {0})")]
    InvalidHashType(u8),

    /// The algorithm name does not name a supported backend.
    #[error("unsupported hash name")]
    UnknownName,

    /// BLAKE2b output length outside of `1..=64`.
    #[error("invalid output length {0}")]
    InvalidOutputLength(usize),
}

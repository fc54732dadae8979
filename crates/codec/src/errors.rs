use thiserror::Error;

/// Errors from spi-codec.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum CodecError {
    /// If we read a container length that does not fit in memory.
    #[error("overflow container")]
    OverflowContainer,

    /// If we tried to read past the end of the underlying buffer.
    #[error("would overrun end of input")]
    OverrunInput,

    /// If there was extra data in a buffer than we didn't consume reading a
    /// message.
    #[error("extra unnecessary input leftover")]
    ExtraInput,

    /// A tag byte did not match any variant of the named type.
    #[error("invalid variant for {0}")]
    InvalidVariant(&'static str),

    /// A field decoded fine on its own but is inconsistent with the rest.
    #[error("malformed field {0}")]
    MalformedField(&'static str),

    /// A fixed output buffer cannot hold the encoding.
    #[error("buffer too small (needed {needed}, available {available})")]
    BufferTooSmall {
        /// Bytes needed so far.
        needed: usize,

        /// Size of the output buffer.
        available: usize,
    },
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

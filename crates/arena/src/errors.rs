use thiserror::Error;

/// Errors from creating or allocating out of an [`crate::Arena`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ArenaError {
    /// Arenas need a non-zero block capacity.
    #[error("arena block capacity must be non-zero")]
    ZeroCapacity,

    /// Block capacity does not fit the 32-bit offsets used by [`crate::Slot`].
    #[error("arena block capacity {0} exceeds the addressable range")]
    CapacityTooLarge(usize),

    /// A request could not be satisfied, either because it is larger than a
    /// block or because the backing allocation failed.
    #[error("out of memory (requested {requested} bytes, block capacity {capacity})")]
    OutOfMemory {
        /// Aligned size of the request.
        requested: usize,

        /// Capacity of each block.
        capacity: usize,
    },
}

/// Result alias for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;

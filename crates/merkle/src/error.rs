//! Error types for tree construction, proofs and verification.

use spi_arena::ArenaError;
use spi_codec::CodecError;
use spi_hash::HashError;
use thiserror::Error;

/// Errors from the Merkle tree core.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MerkleError {
    /// Leaf count, leaf size, depth or buffer length out of range.
    #[error("invalid size: {0}")]
    InvalidSize(&'static str),

    /// Unsupported hash algorithm selector or name.
    #[error("invalid hash type: {0}")]
    InvalidHashType(#[from] HashError),

    /// Arena exhaustion or a failed backing allocation.
    #[error("out of memory (requested {requested} bytes)")]
    OutOfMemory {
        /// Size of the request that failed.
        requested: usize,
    },

    /// Leaf index not below the leaf count.
    #[error("leaf index {index} out of bounds for {num_leaves} leaves")]
    LeafOutOfBounds {
        /// Requested index.
        index: u64,

        /// Leaves in the tree.
        num_leaves: u64,
    },

    /// Serialized proof is malformed or truncated.
    #[error("invalid proof: {0}")]
    InvalidProof(CodecError),

    /// Operation not valid for the tree's current state.
    #[error("invalid tree: {0}")]
    InvalidTree(&'static str),

    /// Caller-provided output buffer is too small.
    #[error("buffer too small (needed {needed}, available {available})")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,

        /// Bytes provided.
        available: usize,
    },

    /// Batch inputs have different lengths.
    #[error("batch length mismatch ({proofs} proofs, {records} records, {roots} roots)")]
    BatchLengthMismatch {
        /// Number of proofs.
        proofs: usize,

        /// Number of leaf records.
        records: usize,

        /// Number of expected roots.
        roots: usize,
    },
}

impl From<ArenaError> for MerkleError {
    fn from(value: ArenaError) -> Self {
        match value {
            ArenaError::ZeroCapacity => Self::InvalidSize("zero arena block capacity"),
            ArenaError::CapacityTooLarge(_) => Self::InvalidSize("arena block capacity too large"),
            ArenaError::OutOfMemory { requested, .. } => Self::OutOfMemory { requested },
        }
    }
}

impl From<CodecError> for MerkleError {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::BufferTooSmall { needed, available } => {
                Self::BufferTooSmall { needed, available }
            }
            e => Self::InvalidProof(e),
        }
    }
}

/// Result alias for Merkle operations.
pub type MerkleResult<T> = Result<T, MerkleError>;

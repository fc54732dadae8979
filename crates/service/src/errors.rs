use spi_codec::CodecError;
use spi_merkle::MerkleError;
use thiserror::Error;

use crate::types::{Status, TreeId};

/// Errors originating in the command worker plumbing.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// For when the worker task has exited when we try to send a message.
    #[error("command worker exited")]
    WorkerExited,

    /// For when we send a message but then the worker task exits before it
    /// handles it.
    #[error("command worker exited without us receiving response")]
    WorkerExitedWithoutResponse,
}

/// Why a single request failed.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Rejected before dispatch, or a field out of range.
    #[error("invalid request: {0}")]
    Invalid(&'static str),

    /// No tree registered under this id.
    #[error("unknown {0}")]
    UnknownTree(TreeId),

    /// A request payload failed to decode.
    #[error("malformed payload: {0}")]
    Payload(#[from] CodecError),

    /// Error from the tree or proof layer.
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// The request deadline passed.
    #[error("deadline exceeded")]
    Timeout,

    /// A tree lock was poisoned by a panicking writer.
    #[error("{0} lock poisoned")]
    Poisoned(TreeId),
}

impl RequestError {
    /// Maps the error to the status reported to the caller.
    pub fn status(&self) -> Status {
        match self {
            Self::Invalid(_) | Self::Payload(_) => Status::InvalidRequest,
            Self::UnknownTree(_) | Self::Poisoned(_) => Status::InvalidTree,
            Self::Timeout => Status::Timeout,
            Self::Merkle(e) => merkle_status(e),
        }
    }
}

fn merkle_status(e: &MerkleError) -> Status {
    match e {
        MerkleError::InvalidSize(_)
        | MerkleError::InvalidHashType(_)
        | MerkleError::LeafOutOfBounds { .. }
        | MerkleError::BatchLengthMismatch { .. } => Status::InvalidRequest,
        MerkleError::InvalidTree(_) => Status::InvalidTree,
        MerkleError::OutOfMemory { .. } => Status::OutOfMemory,
        MerkleError::InvalidProof(_) | MerkleError::BufferTooSmall { .. } => Status::InvalidProof,
    }
}

/// Result alias for request handlers.
pub type RequestResult<T> = Result<T, RequestError>;

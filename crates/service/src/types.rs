//! Request/response envelope types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Caller-chosen request identifier, echoed in the response.  Zero is not a
/// valid id.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u32);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a tree registered in a [`crate::SpiContext`].  Ids start at
/// 1 and are never reused within a context.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(pub u64);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// Operation a request asks for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Operation {
    /// Prove one leaf.
    GenerateProof = 1,

    /// Check one proof against the tree's root.
    VerifyProof = 2,

    /// Prove several leaves.
    BatchGenerate = 3,

    /// Check several proofs against the tree's root.
    BatchVerify = 4,

    /// Describe a tree.
    TreeInfo = 5,

    /// Register a new, unbuilt tree.
    CreateTree = 6,

    /// Build a tree from its full leaf data.
    BuildTree = 7,

    /// Replace one leaf and rebuild.
    UpdateLeaf = 8,

    /// Drop a tree.
    DestroyTree = 9,
}

impl Operation {
    /// Returns the numeric code.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Parses a numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            1 => Self::GenerateProof,
            2 => Self::VerifyProof,
            3 => Self::BatchGenerate,
            4 => Self::BatchVerify,
            5 => Self::TreeInfo,
            6 => Self::CreateTree,
            7 => Self::BuildTree,
            8 => Self::UpdateLeaf,
            9 => Self::DestroyTree,
            _ => return None,
        })
    }

    /// Returns if the operation addresses an existing tree.
    pub fn needs_tree(self) -> bool {
        !matches!(self, Self::CreateTree)
    }
}

/// Outcome of a request.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    /// The operation succeeded.
    Success = 0,

    /// The request was malformed or out of range.
    InvalidRequest = 1,

    /// The tree doesn't exist or is in the wrong state.
    InvalidTree = 2,

    /// An allocation failed.
    OutOfMemory = 3,

    /// A proof could not be decoded.
    InvalidProof = 4,

    /// The deadline passed before the operation finished.
    Timeout = 5,

    /// The operation is not supported.
    NotImplemented = 6,
}

impl Status {
    /// Returns the numeric code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parses a numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Success,
            1 => Self::InvalidRequest,
            2 => Self::InvalidTree,
            3 => Self::OutOfMemory,
            4 => Self::InvalidProof,
            5 => Self::Timeout,
            6 => Self::NotImplemented,
            _ => return None,
        })
    }

    /// Human-readable description.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidTree => "Invalid tree",
            Self::OutOfMemory => "Out of memory",
            Self::InvalidProof => "Invalid proof",
            Self::Timeout => "Timeout",
            Self::NotImplemented => "Not implemented",
        }
    }

    /// Returns if this is [`Status::Success`].
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as handed over by a transport.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Echoed in the response.
    pub request_id: RequestId,

    /// What to do.
    pub operation: Operation,

    /// Target tree, ignored by [`Operation::CreateTree`].
    #[serde(default)]
    pub tree_id: TreeId,

    /// Leaf for single-leaf operations.
    #[serde(default)]
    pub leaf_index: u64,

    /// Leaves for batch generation.
    #[serde(default)]
    pub leaf_indices: Vec<u64>,

    /// Operation-specific input, see [`crate::payload`].
    #[serde(default)]
    pub payload: Vec<u8>,

    /// Time budget measured from when processing starts.
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl Request {
    /// Creates a request with no target, payload or timeout.
    pub fn new(request_id: u32, operation: Operation) -> Self {
        Self {
            request_id: RequestId(request_id),
            operation,
            tree_id: TreeId::default(),
            leaf_index: 0,
            leaf_indices: Vec::new(),
            payload: Vec::new(),
            timeout: None,
        }
    }

    /// Sets the target tree.
    pub fn with_tree(mut self, tree_id: TreeId) -> Self {
        self.tree_id = tree_id;
        self
    }

    /// Sets the leaf index.
    pub fn with_leaf_index(mut self, leaf_index: u64) -> Self {
        self.leaf_index = leaf_index;
        self
    }

    /// Sets the batch leaf indices.
    pub fn with_leaf_indices(mut self, leaf_indices: Vec<u64>) -> Self {
        self.leaf_indices = leaf_indices;
        self
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of processing a [`Request`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Copied from the request.
    pub request_id: RequestId,

    /// Outcome.
    pub status: Status,

    /// Operation-specific output, empty unless successful.
    pub payload: Vec<u8>,

    /// Wall time spent processing.
    pub processing_time: Duration,
}

//! Tree configuration.

use spi_arena::Arena;
use spi_hash::HashAlgorithm;

use crate::error::{MerkleError, MerkleResult};
use crate::node::NODE_LEN;

/// Default size of each leaf record in bytes.
pub const DEFAULT_LEAF_SIZE: usize = 32;

/// Default arena block capacity, 1 MiB.
pub const DEFAULT_ARENA_BLOCK_CAPACITY: usize = 1 << 20;

/// Largest depth a tree may be configured for, bounding leaves at `2^32`.
pub const MAX_TREE_DEPTH: u8 = 32;

/// Parameters a tree is created with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    /// Hash used for leaves and internal nodes.
    pub hash_algorithm: HashAlgorithm,

    /// Size of every leaf record in bytes.
    pub leaf_size: usize,

    /// Capacity of each arena block holding tree nodes.
    pub arena_block_capacity: usize,

    /// Cap on arena blocks per tree, bounding node memory at
    /// `arena_max_blocks * arena_block_capacity`.  Unbounded if `None`.
    pub arena_max_blocks: Option<usize>,

    /// Deepest tree accepted, so `num_leaves <= 2^max_depth`.
    pub max_depth: u8,
}

impl TreeConfig {
    /// Sets the hash algorithm.
    pub fn with_hash_algorithm(mut self, alg: HashAlgorithm) -> Self {
        self.hash_algorithm = alg;
        self
    }

    /// Sets the leaf record size.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Sets the arena block capacity.
    pub fn with_arena_block_capacity(mut self, cap: usize) -> Self {
        self.arena_block_capacity = cap;
        self
    }

    /// Caps the number of arena blocks.
    pub fn with_arena_max_blocks(mut self, max_blocks: usize) -> Self {
        self.arena_max_blocks = Some(max_blocks);
        self
    }

    /// Sets the maximum depth.
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Checks the configuration is usable.
    pub fn validate(&self) -> MerkleResult<()> {
        if self.leaf_size == 0 {
            return Err(MerkleError::InvalidSize("zero leaf size"));
        }
        if self.max_depth > MAX_TREE_DEPTH {
            return Err(MerkleError::InvalidSize("max depth above 32"));
        }
        if self.arena_block_capacity < NODE_LEN {
            return Err(MerkleError::InvalidSize("arena block smaller than a node"));
        }
        if self.arena_max_blocks == Some(0) {
            return Err(MerkleError::InvalidSize("zero arena block cap"));
        }
        Ok(())
    }

    /// Creates an empty arena for a tree built with this config.
    pub(crate) fn new_arena(&self) -> MerkleResult<Arena> {
        let arena = match self.arena_max_blocks {
            Some(max) => Arena::with_max_blocks(self.arena_block_capacity, max)?,
            None => Arena::new(self.arena_block_capacity)?,
        };
        Ok(arena)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Sha256,
            leaf_size: DEFAULT_LEAF_SIZE,
            arena_block_capacity: DEFAULT_ARENA_BLOCK_CAPACITY,
            arena_max_blocks: None,
            max_depth: MAX_TREE_DEPTH,
        }
    }
}

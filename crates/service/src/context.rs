//! Caller-owned registry of trees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use spi_hash::HashAlgorithm;
use spi_merkle::{MerkleTree, TreeConfig};
use tracing::*;

use crate::errors::{RequestError, RequestResult};
use crate::payload::TreeInfo;
use crate::types::TreeId;

/// Largest tree a context accepts by default, `2^24` leaves.
pub const DEFAULT_MAX_TREE_SIZE: u64 = 1 << 24;

/// Most entries a batch request may carry by default.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Limits and defaults for a [`SpiContext`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Most leaves a tree may have, also bounding leaf indices.
    pub max_tree_size: u64,

    /// Most entries in a batch request.
    pub max_batch_size: usize,

    /// Config new trees start from.  The hash algorithm and, if given, the
    /// leaf size are overridden per request.
    #[serde(skip)]
    pub default_tree: TreeConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tree_size: DEFAULT_MAX_TREE_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            default_tree: TreeConfig::default(),
        }
    }
}

/// Shared handle to a registered tree.
pub type SharedTree = Arc<RwLock<MerkleTree>>;

/// Owns a set of trees and dispatches requests against them.
///
/// Each tree sits behind its own lock, so proofs against one tree can be
/// generated concurrently while another is being rebuilt.
#[derive(Debug)]
pub struct SpiContext {
    config: ContextConfig,
    trees: RwLock<HashMap<TreeId, SharedTree>>,
    next_id: AtomicU64,
}

impl SpiContext {
    /// Creates an empty context.
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            trees: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the context's config.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Bitmask of hash selectors this context can build trees with.
    pub fn supported_hash_types(&self) -> u64 {
        HashAlgorithm::supported_mask()
    }

    /// Number of registered trees.
    ///
    /// Still counts when the registry lock is poisoned, map inserts and
    /// removals can't leave it half-updated.
    pub fn num_trees(&self) -> usize {
        let trees = self.trees.read().unwrap_or_else(|e| {
            warn!("tree registry lock poisoned");
            PoisonError::into_inner(e)
        });
        trees.len()
    }

    /// Creates an unbuilt tree and registers it under a fresh id.
    pub fn create_tree(
        &self,
        num_leaves: u64,
        alg: HashAlgorithm,
        leaf_size: Option<usize>,
    ) -> RequestResult<TreeId> {
        if num_leaves > self.config.max_tree_size {
            return Err(RequestError::Invalid("tree larger than context limit"));
        }

        let mut config = self.config.default_tree.with_hash_algorithm(alg);
        if let Some(leaf_size) = leaf_size {
            config = config.with_leaf_size(leaf_size);
        }
        // Tree info reports the leaf size as a u32.
        if u32::try_from(config.leaf_size).is_err() {
            return Err(RequestError::Invalid("leaf size above u32::MAX"));
        }
        let tree = MerkleTree::create(num_leaves, config)?;

        let id = TreeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.trees
            .write()
            .map_err(|_| RequestError::Poisoned(id))?
            .insert(id, Arc::new(RwLock::new(tree)));
        debug!(tree = %id, %num_leaves, %alg, "registered tree");
        Ok(id)
    }

    /// Unregisters a tree and frees it.
    ///
    /// Requests already holding the tree finish first, the memory is released
    /// when the last of them drops its handle.
    pub fn destroy_tree(&self, id: TreeId) -> RequestResult<()> {
        let shared = self
            .trees
            .write()
            .map_err(|_| RequestError::Poisoned(id))?
            .remove(&id)
            .ok_or(RequestError::UnknownTree(id))?;

        match Arc::try_unwrap(shared) {
            Ok(lock) => {
                let tree = lock.into_inner().map_err(|_| RequestError::Poisoned(id))?;
                tree.destroy();
                debug!(tree = %id, "destroyed tree");
            }
            Err(_) => {
                debug!(tree = %id, "unregistered tree still in use, deferring free");
            }
        }
        Ok(())
    }

    /// Looks up a tree.
    pub fn tree(&self, id: TreeId) -> RequestResult<SharedTree> {
        self.trees
            .read()
            .map_err(|_| RequestError::Poisoned(id))?
            .get(&id)
            .cloned()
            .ok_or(RequestError::UnknownTree(id))
    }

    /// Describes a tree.
    pub fn tree_info(&self, id: TreeId) -> RequestResult<TreeInfo> {
        let shared = self.tree(id)?;
        let tree = read_tree(&shared, id)?;
        Ok(describe(id, &tree))
    }
}

pub(crate) fn read_tree(shared: &SharedTree, id: TreeId) -> RequestResult<RwLockReadGuard<'_, MerkleTree>> {
    shared.read().map_err(|_| RequestError::Poisoned(id))
}

pub(crate) fn write_tree(shared: &SharedTree, id: TreeId) -> RequestResult<RwLockWriteGuard<'_, MerkleTree>> {
    shared.write().map_err(|_| RequestError::Poisoned(id))
}

pub(crate) fn describe(id: TreeId, tree: &MerkleTree) -> TreeInfo {
    TreeInfo::new(
        id.0,
        tree.num_leaves(),
        tree.depth(),
        tree.algorithm().selector(),
        u32::try_from(tree.leaf_size()).unwrap_or(u32::MAX),
        tree.is_built(),
        tree.root().unwrap_or([0; 32]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let ctx = SpiContext::new(ContextConfig::default());
        let a = ctx.create_tree(4, HashAlgorithm::Sha256, None).unwrap();
        let b = ctx.create_tree(8, HashAlgorithm::Blake2b256, Some(16)).unwrap();
        assert_eq!(a, TreeId(1));
        assert_eq!(b, TreeId(2));
        assert_eq!(ctx.num_trees(), 2);

        let info = ctx.tree_info(b).unwrap();
        assert_eq!(*info.num_leaves(), 8);
        assert_eq!(*info.depth(), 3);
        assert_eq!(*info.hash_type(), 1);
        assert_eq!(*info.leaf_size(), 16);
        assert!(!*info.built());
        assert_eq!(*info.root(), [0; 32]);
    }

    #[test]
    fn test_destroy() {
        let ctx = SpiContext::new(ContextConfig::default());
        let id = ctx.create_tree(2, HashAlgorithm::Sha256, None).unwrap();
        ctx.destroy_tree(id).unwrap();
        assert_eq!(ctx.num_trees(), 0);
        assert!(matches!(ctx.tree(id), Err(RequestError::UnknownTree(_))));
        assert!(matches!(
            ctx.destroy_tree(id),
            Err(RequestError::UnknownTree(_))
        ));

        // Ids are not reused.
        let next = ctx.create_tree(2, HashAlgorithm::Sha256, None).unwrap();
        assert_eq!(next, TreeId(2));
    }

    #[test]
    fn test_destroy_while_held() {
        let ctx = SpiContext::new(ContextConfig::default());
        let id = ctx.create_tree(2, HashAlgorithm::Sha256, None).unwrap();
        let held = ctx.tree(id).unwrap();
        ctx.destroy_tree(id).unwrap();
        assert!(ctx.tree(id).is_err());
        assert_eq!(held.read().unwrap().num_leaves(), 2);
    }

    #[test]
    fn test_limits() {
        let config = ContextConfig {
            max_tree_size: 16,
            ..Default::default()
        };
        let ctx = SpiContext::new(config);
        assert!(matches!(
            ctx.create_tree(32, HashAlgorithm::Sha256, None),
            Err(RequestError::Invalid(_))
        ));
        assert!(matches!(
            ctx.create_tree(3, HashAlgorithm::Sha256, None),
            Err(RequestError::Merkle(_))
        ));
        assert_eq!(ctx.num_trees(), 0);
        assert_eq!(ctx.supported_hash_types(), 0b11);
    }

    #[test]
    fn test_leaf_size_fits_tree_info() {
        let wide = u32::MAX as usize + 1;
        let ctx = SpiContext::new(ContextConfig::default());
        assert!(matches!(
            ctx.create_tree(2, HashAlgorithm::Sha256, Some(wide)),
            Err(RequestError::Invalid(_))
        ));

        let config = ContextConfig {
            default_tree: TreeConfig::default().with_leaf_size(wide),
            ..Default::default()
        };
        let ctx = SpiContext::new(config);
        assert!(matches!(
            ctx.create_tree(2, HashAlgorithm::Sha256, None),
            Err(RequestError::Invalid(_))
        ));
        assert_eq!(ctx.num_trees(), 0);

        let id = ctx
            .create_tree(2, HashAlgorithm::Sha256, Some(u32::MAX as usize))
            .unwrap();
        assert_eq!(*ctx.tree_info(id).unwrap().leaf_size(), u32::MAX);
    }

    #[test]
    fn test_num_trees_survives_poisoned_registry() {
        let ctx = SpiContext::new(ContextConfig::default());
        ctx.create_tree(2, HashAlgorithm::Sha256, None).unwrap();
        ctx.create_tree(4, HashAlgorithm::Sha256, None).unwrap();

        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ctx.trees.write().unwrap();
            panic!("poison the registry");
        }));
        assert!(res.is_err());
        assert!(ctx.trees.is_poisoned());

        assert_eq!(ctx.num_trees(), 2);
        assert!(matches!(ctx.tree(TreeId(1)), Err(RequestError::Poisoned(_))));
    }
}

//! Arena-backed binary Merkle tree.
//!
//! Nodes are built bottom-up into the tree's [`Arena`] and linked by
//! [`NodeRef`] handles, so the tree owns every node through its arena and
//! releases them all at once.  There are no parent links; proofs are found
//! by descending from the root along the bits of the leaf index.

use spi_arena::Arena;
use spi_hash::{Digest, HashAlgorithm};
use tracing::*;

use crate::config::TreeConfig;
use crate::error::{MerkleError, MerkleResult};
use crate::node::{self, Node, NodeRef};
use crate::proof::{MerkleProof, ProofNode, SiblingSide};
use crate::util::validate_tree_parameters;

/// Binary Merkle tree over a power-of-two number of fixed-size leaf records.
///
/// A tree is created empty, built once from the full leaf buffer, and can
/// then be rebuilt one leaf at a time with [`MerkleTree::update_leaf`].
#[derive(Debug)]
pub struct MerkleTree {
    config: TreeConfig,
    num_leaves: u64,
    depth: u8,
    arena: Arena,
    /// Concatenated leaf records, empty until built.
    leaves: Vec<u8>,
    root: Option<NodeRef>,
}

impl MerkleTree {
    /// Validates the parameters and allocates an unbuilt tree.
    pub fn create(num_leaves: u64, config: TreeConfig) -> MerkleResult<Self> {
        config.validate()?;
        let depth = validate_tree_parameters(num_leaves, config.max_depth)?;
        leaf_buffer_len(num_leaves, config.leaf_size)?;

        let arena = config.new_arena()?;
        debug!(
            %num_leaves,
            %depth,
            alg = %config.hash_algorithm,
            leaf_size = config.leaf_size,
            "created tree"
        );

        Ok(Self {
            config,
            num_leaves,
            depth,
            arena,
            leaves: Vec::new(),
            root: None,
        })
    }

    /// Creates and builds a tree from individual leaf records.
    ///
    /// Every record must be exactly `config.leaf_size` bytes.
    pub fn from_records<R: AsRef<[u8]>>(config: TreeConfig, records: &[R]) -> MerkleResult<Self> {
        let mut tree = Self::create(records.len() as u64, config)?;

        let mut buf = alloc_leaf_buffer(tree.leaf_buffer_len()?)?;
        for rec in records {
            let rec = rec.as_ref();
            if rec.len() != config.leaf_size {
                return Err(MerkleError::InvalidSize("leaf record length"));
            }
            buf.extend_from_slice(rec);
        }

        tree.build_owned(buf)?;
        Ok(tree)
    }

    /// Builds the tree from concatenated leaf records, returning the root.
    ///
    /// `leaf_data` must be exactly `num_leaves * leaf_size` bytes.  If the
    /// build fails the tree is left unbuilt with an empty arena.
    pub fn build(&mut self, leaf_data: &[u8]) -> MerkleResult<Digest> {
        if self.root.is_some() {
            return Err(MerkleError::InvalidTree("already built"));
        }
        if leaf_data.len() != self.leaf_buffer_len()? {
            return Err(MerkleError::InvalidSize("leaf data length"));
        }

        let mut buf = alloc_leaf_buffer(leaf_data.len())?;
        buf.extend_from_slice(leaf_data);
        self.build_owned(buf)
    }

    fn build_owned(&mut self, leaves: Vec<u8>) -> MerkleResult<Digest> {
        if self.root.is_some() {
            return Err(MerkleError::InvalidTree("already built"));
        }

        match build_nodes(
            &mut self.arena,
            self.config.hash_algorithm,
            &leaves,
            self.config.leaf_size,
        ) {
            Ok((root, digest)) => {
                self.leaves = leaves;
                self.root = Some(root);
                debug!(
                    num_leaves = self.num_leaves,
                    arena_bytes = self.arena.used_bytes(),
                    root = %spi_hash::to_hex(&digest),
                    "built tree"
                );
                Ok(digest)
            }
            Err(e) => {
                // Drop whatever nodes made it into the arena.
                self.arena.reset();
                warn!(%e, "tree build failed, rolled back");
                Err(e)
            }
        }
    }

    /// Replaces one leaf record and rebuilds the whole tree, returning the
    /// new root.
    ///
    /// The rebuild goes into a fresh arena, the tree is only changed once it
    /// has succeeded.
    pub fn update_leaf(&mut self, index: u64, record: &[u8]) -> MerkleResult<Digest> {
        self.ensure_built()?;
        self.check_index(index)?;
        if record.len() != self.config.leaf_size {
            return Err(MerkleError::InvalidSize("leaf record length"));
        }

        let mut leaves = alloc_leaf_buffer(self.leaves.len())?;
        leaves.extend_from_slice(&self.leaves);
        let start = index as usize * self.config.leaf_size;
        leaves[start..start + record.len()].copy_from_slice(record);

        let mut arena = self.config.new_arena()?;
        let (root, digest) = build_nodes(
            &mut arena,
            self.config.hash_algorithm,
            &leaves,
            self.config.leaf_size,
        )?;

        self.arena = arena;
        self.leaves = leaves;
        self.root = Some(root);
        debug!(%index, root = %spi_hash::to_hex(&digest), "rebuilt tree after leaf update");
        Ok(digest)
    }

    /// Generates an inclusion proof for leaf `index`.
    pub fn prove(&self, index: u64) -> MerkleResult<MerkleProof> {
        let root = self.ensure_built()?;
        self.check_index(index)?;

        let mut cur = root;
        let mut siblings = Vec::with_capacity(self.depth as usize);
        for level in (0..self.depth as usize).rev() {
            let Node::Internal { left, right, .. } = self.node(cur)? else {
                return Err(MerkleError::InvalidTree("leaf above bottom level"));
            };

            let side = SiblingSide::for_index(index, level);
            let (next, sibling) = match side {
                SiblingSide::Right => (left, right),
                SiblingSide::Left => (right, left),
            };
            siblings.push(ProofNode::new(*self.node(sibling)?.digest(), side));
            cur = next;
        }

        // Collected top-down, proofs go leaf-first.
        siblings.reverse();

        let leaf_digest = match self.node(cur)? {
            Node::Leaf { digest, leaf_index } if leaf_index == index => digest,
            _ => return Err(MerkleError::InvalidTree("descent did not reach the leaf")),
        };

        trace!(%index, depth = self.depth, "generated proof");
        Ok(MerkleProof::new(
            leaf_digest,
            index,
            siblings,
            *self.node(root)?.digest(),
        ))
    }

    /// Generates proofs for several leaves, failing on the first bad index.
    pub fn prove_batch(&self, indices: &[u64]) -> MerkleResult<Vec<MerkleProof>> {
        indices.iter().map(|&i| self.prove(i)).collect()
    }

    /// Returns the root digest.
    pub fn root(&self) -> MerkleResult<Digest> {
        let root = self.ensure_built()?;
        Ok(*self.node(root)?.digest())
    }

    /// Returns the handle of the root node, if built.
    pub fn root_ref(&self) -> Option<NodeRef> {
        self.root
    }

    /// Decodes a node out of the arena.
    pub fn node(&self, r: NodeRef) -> MerkleResult<Node> {
        node::load(&self.arena, r)
    }

    /// Returns the record for leaf `index`.
    pub fn leaf_record(&self, index: u64) -> MerkleResult<&[u8]> {
        self.ensure_built()?;
        self.check_index(index)?;
        let start = index as usize * self.config.leaf_size;
        Ok(&self.leaves[start..start + self.config.leaf_size])
    }

    /// Returns the digest of leaf `index`.
    pub fn leaf_digest(&self, index: u64) -> MerkleResult<Digest> {
        let rec = self.leaf_record(index)?;
        Ok(self.config.hash_algorithm.hash_leaf(rec))
    }

    /// Number of leaves.
    pub fn num_leaves(&self) -> u64 {
        self.num_leaves
    }

    /// Levels between the leaves and the root.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Hash algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.config.hash_algorithm
    }

    /// Leaf record size in bytes.
    pub fn leaf_size(&self) -> usize {
        self.config.leaf_size
    }

    /// Configuration the tree was created with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Returns if the tree has been built.
    pub fn is_built(&self) -> bool {
        self.root.is_some()
    }

    /// The arena holding the nodes.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Releases the arena and leaf buffer.
    pub fn destroy(self) {
        debug!(num_leaves = self.num_leaves, "destroyed tree");
        self.arena.destroy();
    }

    fn ensure_built(&self) -> MerkleResult<NodeRef> {
        self.root.ok_or(MerkleError::InvalidTree("not built"))
    }

    fn check_index(&self, index: u64) -> MerkleResult<()> {
        if index >= self.num_leaves {
            return Err(MerkleError::LeafOutOfBounds {
                index,
                num_leaves: self.num_leaves,
            });
        }
        Ok(())
    }

    fn leaf_buffer_len(&self) -> MerkleResult<usize> {
        leaf_buffer_len(self.num_leaves, self.config.leaf_size)
    }
}

fn leaf_buffer_len(num_leaves: u64, leaf_size: usize) -> MerkleResult<usize> {
    usize::try_from(num_leaves)
        .ok()
        .and_then(|n| n.checked_mul(leaf_size))
        .ok_or(MerkleError::InvalidSize("leaf data does not fit in memory"))
}

fn alloc_leaf_buffer(len: usize) -> MerkleResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| MerkleError::OutOfMemory { requested: len })?;
    Ok(buf)
}

/// Hashes every record into a leaf node, then combines adjacent pairs level
/// by level until one node is left.
fn build_nodes(
    arena: &mut Arena,
    alg: HashAlgorithm,
    leaves: &[u8],
    leaf_size: usize,
) -> MerkleResult<(NodeRef, Digest)> {
    let n = leaves.len() / leaf_size;
    let mut level: Vec<(NodeRef, Digest)> = Vec::new();
    level
        .try_reserve_exact(n)
        .map_err(|_| MerkleError::OutOfMemory {
            requested: n * size_of::<(NodeRef, Digest)>(),
        })?;

    for (i, rec) in leaves.chunks_exact(leaf_size).enumerate() {
        let digest = alg.hash_leaf(rec);
        let r = node::store(
            arena,
            &Node::Leaf {
                digest,
                leaf_index: i as u64,
            },
        )?;
        level.push((r, digest));
    }

    // Parents overwrite the front half of the level in place.
    while level.len() > 1 {
        let half = level.len() / 2;
        for i in 0..half {
            let (left, ld) = level[2 * i];
            let (right, rd) = level[2 * i + 1];
            let digest = alg.hash_node(&ld, &rd);
            let r = node::store(
                arena,
                &Node::Internal {
                    digest,
                    left,
                    right,
                },
            )?;
            level[i] = (r, digest);
        }
        level.truncate(half);
    }

    level
        .first()
        .copied()
        .ok_or(MerkleError::InvalidSize("zero leaves"))
}

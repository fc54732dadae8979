//! Inclusion proof types.

use spi_hash::{Digest, HashAlgorithm};

/// Which side of the running hash a sibling digest goes on.
///
/// `Right` means the proven node is the left child at that level, so the
/// sibling is appended: `H(current || sibling)`.  `Left` is the mirror case.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SiblingSide {
    /// Sibling is the right child.
    Right = 0,

    /// Sibling is the left child.
    Left = 1,
}

impl SiblingSide {
    /// Returns the side of the sibling at `level` for `leaf_index`, counting
    /// levels up from the leaves.
    pub fn for_index(leaf_index: u64, level: usize) -> Self {
        if level < u64::BITS as usize && (leaf_index >> level) & 1 == 1 {
            Self::Left
        } else {
            Self::Right
        }
    }

    /// Returns the wire tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parses a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Right),
            1 => Some(Self::Left),
            _ => None,
        }
    }

    /// Combines the running digest with a sibling on this side.
    pub fn combine(self, alg: HashAlgorithm, current: &Digest, sibling: &Digest) -> Digest {
        match self {
            Self::Right => alg.hash_node(current, sibling),
            Self::Left => alg.hash_node(sibling, current),
        }
    }
}

/// One step of a proof path.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProofNode {
    pub(crate) digest: Digest,
    pub(crate) side: SiblingSide,
}

impl ProofNode {
    /// Creates a new instance.
    pub fn new(digest: Digest, side: SiblingSide) -> Self {
        Self { digest, side }
    }

    /// Sibling digest.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Sibling side.
    pub fn side(&self) -> SiblingSide {
        self.side
    }
}

/// Proof that a leaf is included under a root.
///
/// Siblings are ordered from the leaf level up to just below the root, so
/// `siblings().len()` equals the tree depth.  The proof owns all of its data
/// and stays valid after the tree that produced it is gone.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MerkleProof {
    pub(crate) leaf_digest: Digest,
    pub(crate) leaf_index: u64,
    pub(crate) siblings: Vec<ProofNode>,
    pub(crate) root_digest: Digest,
}

impl MerkleProof {
    /// Creates a new instance from its parts.
    pub fn new(
        leaf_digest: Digest,
        leaf_index: u64,
        siblings: Vec<ProofNode>,
        root_digest: Digest,
    ) -> Self {
        Self {
            leaf_digest,
            leaf_index,
            siblings,
            root_digest,
        }
    }

    /// Digest of the proven leaf record.
    pub fn leaf_digest(&self) -> &Digest {
        &self.leaf_digest
    }

    /// Index of the proven leaf.
    pub fn leaf_index(&self) -> u64 {
        self.leaf_index
    }

    /// Sibling path, leaf level first.
    pub fn siblings(&self) -> &[ProofNode] {
        &self.siblings
    }

    /// Mutable access to the sibling path.
    pub fn siblings_mut(&mut self) -> &mut Vec<ProofNode> {
        &mut self.siblings
    }

    /// Root the proof claims to lead to.  Advisory only, verification
    /// compares against the caller's root.
    pub fn root_digest(&self) -> &Digest {
        &self.root_digest
    }

    /// Depth of the tree this proof was generated from.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Applies the sibling path to the embedded leaf digest.
    pub fn compute_root(&self, alg: HashAlgorithm) -> Digest {
        self.compute_root_from(alg, &self.leaf_digest)
    }

    /// Applies the sibling path to `leaf_digest`.
    pub fn compute_root_from(&self, alg: HashAlgorithm, leaf_digest: &Digest) -> Digest {
        self.siblings
            .iter()
            .fold(*leaf_digest, |cur, sib| sib.side.combine(alg, &cur, &sib.digest))
    }
}

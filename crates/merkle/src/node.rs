//! Tree nodes as fixed-size records inside the arena.
//!
//! Each node occupies [`NODE_LEN`] bytes:
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0 | 32 | digest |
//! | 32 | 8 | tag, 0 = leaf, 1 = internal |
//! | 40 | 16 | leaf index and 8 zero bytes, or left and right child refs |
//!
//! A child ref is the child's arena block then offset, both `u32`.  All
//! integers are little-endian.

use spi_arena::{Arena, Slot};
use spi_codec::{
    BufDecoder, Codec, CodecError, Decoder, Encoder, SliceEncoder, impl_wrapper_codec,
};
use spi_hash::Digest;

use crate::error::{MerkleError, MerkleResult};

/// Size in bytes of one encoded node.
pub const NODE_LEN: usize = 56;

const TAG_LEAF: u64 = 0;
const TAG_INTERNAL: u64 = 1;

/// Position of a node within its tree's arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeRef(Slot);

impl NodeRef {
    /// Returns the underlying arena slot.
    pub fn slot(&self) -> Slot {
        self.0
    }
}

impl Codec for NodeRef {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let block = u32::decode(dec)?;
        let offset = u32::decode(dec)?;
        Ok(Self(Slot::from_parts(block, offset, NODE_LEN as u32)))
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.0.block().encode(enc)?;
        self.0.offset().encode(enc)
    }
}

/// Tree node, decoded out of the arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Node {
    /// Hash of one leaf record.
    Leaf {
        /// `H(record)`.
        digest: Digest,

        /// Position of the record among the tree's leaves.
        leaf_index: u64,
    },

    /// Hash of two children.
    Internal {
        /// `H(left.digest || right.digest)`.
        digest: Digest,

        /// Left child.
        left: NodeRef,

        /// Right child.
        right: NodeRef,
    },
}

impl Node {
    /// Returns the node's digest.
    pub fn digest(&self) -> &Digest {
        match self {
            Self::Leaf { digest, .. } | Self::Internal { digest, .. } => digest,
        }
    }

    /// Returns if this is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Padding([u8; 8]);
impl_wrapper_codec!(Padding => [u8; 8]);

impl Codec for Node {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let digest = Digest::decode(dec)?;
        match u64::decode(dec)? {
            TAG_LEAF => {
                let leaf_index = u64::decode(dec)?;
                if Padding::decode(dec)? != Padding([0; 8]) {
                    return Err(CodecError::MalformedField("Node.padding"));
                }
                Ok(Self::Leaf { digest, leaf_index })
            }
            TAG_INTERNAL => {
                let left = NodeRef::decode(dec)?;
                let right = NodeRef::decode(dec)?;
                Ok(Self::Internal {
                    digest,
                    left,
                    right,
                })
            }
            _ => Err(CodecError::InvalidVariant("Node")),
        }
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        match self {
            Self::Leaf { digest, leaf_index } => {
                digest.encode(enc)?;
                TAG_LEAF.encode(enc)?;
                leaf_index.encode(enc)?;
                Padding([0; 8]).encode(enc)
            }
            Self::Internal {
                digest,
                left,
                right,
            } => {
                digest.encode(enc)?;
                TAG_INTERNAL.encode(enc)?;
                left.encode(enc)?;
                right.encode(enc)
            }
        }
    }
}

/// Allocates a node in the arena and writes it there.
pub(crate) fn store(arena: &mut Arena, node: &Node) -> MerkleResult<NodeRef> {
    let slot = arena.allocate(NODE_LEN)?;
    let buf = arena
        .get_mut(slot)
        .ok_or(MerkleError::InvalidTree("fresh arena slot missing"))?;
    let mut enc = SliceEncoder::new(buf);
    node.encode(&mut enc)
        .map_err(|_| MerkleError::InvalidTree("node does not fit its slot"))?;
    Ok(NodeRef(slot))
}

/// Reads a node back out of the arena.
pub(crate) fn load(arena: &Arena, r: NodeRef) -> MerkleResult<Node> {
    let buf = arena
        .get(r.0)
        .ok_or(MerkleError::InvalidTree("dangling node ref"))?;
    let mut dec = BufDecoder::new(buf);
    Node::decode(&mut dec).map_err(|_| MerkleError::InvalidTree("corrupt node"))
}

#[cfg(test)]
mod tests {
    use spi_codec::encode_to_vec;

    use super::*;

    #[test]
    fn test_layout() {
        let leaf = Node::Leaf {
            digest: [0xaa; 32],
            leaf_index: 0x0102,
        };
        let bytes = encode_to_vec(&leaf).unwrap();
        assert_eq!(bytes.len(), NODE_LEN);
        assert_eq!(&bytes[..32], &[0xaa; 32]);
        assert_eq!(&bytes[32..40], &[0; 8]);
        assert_eq!(&bytes[40..42], &[0x02, 0x01]);

        let internal = Node::Internal {
            digest: [0xbb; 32],
            left: NodeRef(Slot::from_parts(1, 56, NODE_LEN as u32)),
            right: NodeRef(Slot::from_parts(2, 112, NODE_LEN as u32)),
        };
        let bytes = encode_to_vec(&internal).unwrap();
        assert_eq!(bytes.len(), NODE_LEN);
        assert_eq!(bytes[32], 1);
        assert_eq!(&bytes[40..48], &[1, 0, 0, 0, 56, 0, 0, 0]);
        assert_eq!(&bytes[48..56], &[2, 0, 0, 0, 112, 0, 0, 0]);
    }

    #[test]
    fn test_store_load() {
        let mut arena = Arena::new(NODE_LEN * 2).unwrap();
        let a = Node::Leaf {
            digest: [1; 32],
            leaf_index: 0,
        };
        let b = Node::Leaf {
            digest: [2; 32],
            leaf_index: 1,
        };
        let ra = store(&mut arena, &a).unwrap();
        let rb = store(&mut arena, &b).unwrap();
        let parent = Node::Internal {
            digest: [3; 32],
            left: ra,
            right: rb,
        };
        let rp = store(&mut arena, &parent).unwrap();

        // Third node spills into a second block.
        assert_eq!(rp.slot().block(), 1);
        assert_eq!(load(&arena, ra).unwrap(), a);
        assert_eq!(load(&arena, rp).unwrap(), parent);
        assert!(!load(&arena, rp).unwrap().is_leaf());
    }

    #[test]
    fn test_bad_tag() {
        let mut bytes = encode_to_vec(&Node::Leaf {
            digest: [0; 32],
            leaf_index: 3,
        })
        .unwrap();
        bytes[32] = 9;
        assert_eq!(
            spi_codec::decode_buf_exact::<Node>(&bytes).unwrap_err(),
            CodecError::InvalidVariant("Node")
        );
    }
}

//! Binary wire format for proofs.
//!
//! ```text
//! leaf_digest    32
//! leaf_index      8  u64
//! sibling_count   8  u64
//! siblings       33 * sibling_count  (digest, side tag 0 = right / 1 = left)
//! root_digest    32
//! ```
//!
//! Integers are little-endian.  Decoding is strict, trailing bytes after the
//! root digest are rejected.

use spi_codec::{
    Codec, CodecError, Decoder, Encoder, decode_buf_exact, encode_to_slice, encode_to_vec,
};
use spi_hash::{DIGEST_LEN, Digest};

use crate::error::{MerkleError, MerkleResult};
use crate::proof::{MerkleProof, ProofNode, SiblingSide};

/// Encoded size of a proof with no siblings.
pub const MIN_PROOF_LEN: usize = DIGEST_LEN + 8 + 8 + DIGEST_LEN;

/// Encoded size of one sibling entry.
pub const PROOF_NODE_LEN: usize = DIGEST_LEN + 1;

/// Most siblings a decoded proof may carry.
pub const MAX_PROOF_SIBLINGS: usize = 64;

impl Codec for SiblingSide {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        Self::from_tag(u8::decode(dec)?).ok_or(CodecError::InvalidVariant("SiblingSide"))
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.tag().encode(enc)
    }
}

impl Codec for ProofNode {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let digest = Digest::decode(dec)?;
        let side = SiblingSide::decode(dec)?;
        Ok(Self { digest, side })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.digest.encode(enc)?;
        self.side.encode(enc)
    }
}

impl Codec for MerkleProof {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let leaf_digest = Digest::decode(dec)?;
        let leaf_index = u64::decode(dec)?;

        let count = u64::decode(dec)?;
        if count > MAX_PROOF_SIBLINGS as u64 {
            return Err(CodecError::MalformedField("MerkleProof.sibling_count"));
        }
        let count = count as usize;
        if count * PROOF_NODE_LEN > dec.remaining() {
            return Err(CodecError::OverrunInput);
        }

        let mut siblings = Vec::with_capacity(count);
        for _ in 0..count {
            siblings.push(ProofNode::decode(dec)?);
        }

        let root_digest = Digest::decode(dec)?;
        Ok(Self {
            leaf_digest,
            leaf_index,
            siblings,
            root_digest,
        })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        if self.siblings.len() > MAX_PROOF_SIBLINGS {
            return Err(CodecError::MalformedField("MerkleProof.sibling_count"));
        }

        self.leaf_digest.encode(enc)?;
        self.leaf_index.encode(enc)?;
        (self.siblings.len() as u64).encode(enc)?;
        for sib in &self.siblings {
            sib.encode(enc)?;
        }
        self.root_digest.encode(enc)
    }
}

impl MerkleProof {
    /// Returns the size of the encoded proof.
    pub fn encoded_len(&self) -> usize {
        MIN_PROOF_LEN + self.siblings.len() * PROOF_NODE_LEN
    }

    /// Encodes into a new buffer.
    pub fn to_bytes(&self) -> MerkleResult<Vec<u8>> {
        Ok(encode_to_vec(self)?)
    }

    /// Encodes into `out`, returning the number of bytes written.
    pub fn serialize_into(&self, out: &mut [u8]) -> MerkleResult<usize> {
        let needed = self.encoded_len();
        if out.len() < needed {
            return Err(MerkleError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }
        Ok(encode_to_slice(self, out)?)
    }

    /// Decodes a proof, rejecting truncated, oversized or trailing input.
    pub fn from_bytes(buf: &[u8]) -> MerkleResult<Self> {
        if buf.len() < MIN_PROOF_LEN {
            return Err(MerkleError::InvalidProof(CodecError::OverrunInput));
        }
        decode_buf_exact(buf).map_err(MerkleError::InvalidProof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> MerkleProof {
        let siblings = (0..n)
            .map(|i| {
                let side = if i % 2 == 0 {
                    SiblingSide::Right
                } else {
                    SiblingSide::Left
                };
                ProofNode::new([i as u8; 32], side)
            })
            .collect();
        MerkleProof::new([0xaa; 32], 0b10, siblings, [0xbb; 32])
    }

    #[test]
    fn test_layout() {
        let proof = sample(2);
        let bytes = proof.to_bytes().unwrap();
        assert_eq!(bytes.len(), 32 + 8 + 8 + 2 * 33 + 32);
        assert_eq!(bytes.len(), proof.encoded_len());

        assert_eq!(&bytes[..32], &[0xaa; 32]);
        assert_eq!(&bytes[32..40], &[2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[40..48], &[2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[48..80], &[0; 32]);
        assert_eq!(bytes[80], 0);
        assert_eq!(&bytes[81..113], &[1; 32]);
        assert_eq!(bytes[113], 1);
        assert_eq!(&bytes[114..], &[0xbb; 32]);

        assert_eq!(MerkleProof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_empty_proof_is_minimum() {
        let proof = sample(0);
        let bytes = proof.to_bytes().unwrap();
        assert_eq!(bytes.len(), MIN_PROOF_LEN);
        assert_eq!(MerkleProof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_short_input() {
        let bytes = sample(0).to_bytes().unwrap();
        assert!(matches!(
            MerkleProof::from_bytes(&bytes[..MIN_PROOF_LEN - 1]),
            Err(MerkleError::InvalidProof(_))
        ));
        assert!(MerkleProof::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_count_overruns_buffer() {
        let mut bytes = sample(1).to_bytes().unwrap();
        bytes[40] = 3;
        assert_eq!(
            MerkleProof::from_bytes(&bytes).unwrap_err(),
            MerkleError::InvalidProof(CodecError::OverrunInput)
        );
    }

    #[test]
    fn test_count_too_large() {
        let mut bytes = sample(0).to_bytes().unwrap();
        bytes[40..48].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            MerkleProof::from_bytes(&bytes),
            Err(MerkleError::InvalidProof(CodecError::MalformedField(_)))
        ));
    }

    #[test]
    fn test_bad_side_tag() {
        let mut bytes = sample(1).to_bytes().unwrap();
        bytes[80] = 2;
        assert_eq!(
            MerkleProof::from_bytes(&bytes).unwrap_err(),
            MerkleError::InvalidProof(CodecError::InvalidVariant("SiblingSide"))
        );
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = sample(1).to_bytes().unwrap();
        bytes.push(0);
        assert_eq!(
            MerkleProof::from_bytes(&bytes).unwrap_err(),
            MerkleError::InvalidProof(CodecError::ExtraInput)
        );
    }

    #[test]
    fn test_serialize_into() {
        let proof = sample(3);
        let mut small = vec![0; proof.encoded_len() - 1];
        assert_eq!(
            proof.serialize_into(&mut small).unwrap_err(),
            MerkleError::BufferTooSmall {
                needed: proof.encoded_len(),
                available: small.len()
            }
        );

        let mut big = vec![0; 512];
        let n = proof.serialize_into(&mut big).unwrap();
        assert_eq!(n, proof.encoded_len());
        assert_eq!(MerkleProof::from_bytes(&big[..n]).unwrap(), proof);
    }

    #[test]
    fn test_too_many_siblings_not_encoded() {
        let proof = sample(MAX_PROOF_SIBLINGS + 1);
        assert!(matches!(
            proof.to_bytes(),
            Err(MerkleError::InvalidProof(CodecError::MalformedField(_)))
        ));
    }
}

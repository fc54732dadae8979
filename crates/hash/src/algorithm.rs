//! Runtime selection between the hash backends.

use std::fmt;
use std::str::FromStr;

use crate::blake2b::{BLAKE2B_BLOCK_LEN, Blake2b256};
use crate::digest::{DIGEST_LEN, Digest};
use crate::errors::HashError;
use crate::sha256::{SHA256_BLOCK_LEN, Sha256};
use crate::traits::HashFunction;

/// Hash function used by a tree.
///
/// New backends are added as new variants.  The numeric selector is part of
/// the external interface and must stay stable.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum HashAlgorithm {
    /// SHA-256.
    #[default]
    Sha256 = 0,

    /// BLAKE2b with 32-byte output.
    Blake2b256 = 1,
}

impl HashAlgorithm {
    /// All supported algorithms, in selector order.
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Sha256, HashAlgorithm::Blake2b256];

    /// Returns the stable one-byte selector.
    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Bitmask with bit `selector` set for each supported algorithm.
    pub fn supported_mask() -> u64 {
        Self::ALL
            .iter()
            .fold(0, |mask, alg| mask | (1 << alg.selector()))
    }

    /// Returns the canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake2b256 => "blake2b256",
        }
    }

    /// Output length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => <Sha256 as HashFunction>::DIGEST_LEN,
            Self::Blake2b256 => <Blake2b256 as HashFunction>::DIGEST_LEN,
        }
    }

    /// Internal block length in bytes.
    pub fn block_len(self) -> usize {
        match self {
            Self::Sha256 => SHA256_BLOCK_LEN,
            Self::Blake2b256 => BLAKE2B_BLOCK_LEN,
        }
    }

    /// Starts an incremental hash.
    pub fn init(self) -> HashContext {
        match self {
            Self::Sha256 => HashContext::Sha256(Sha256::new()),
            Self::Blake2b256 => HashContext::Blake2b256(Blake2b256::new()),
        }
    }

    /// One-shot hash of `data`.
    pub fn hash(self, data: &[u8]) -> Digest {
        match self {
            Self::Sha256 => Sha256::digest(data),
            Self::Blake2b256 => Blake2b256::digest(data),
        }
    }

    /// Hashes a leaf record.
    pub fn hash_leaf(self, record: &[u8]) -> Digest {
        self.hash(record)
    }

    /// Hashes a node's left and right children, `H(left || right)`.
    pub fn hash_node(self, left: &Digest, right: &Digest) -> Digest {
        let mut pair = [0u8; DIGEST_LEN * 2];
        pair[..DIGEST_LEN].copy_from_slice(left);
        pair[DIGEST_LEN..].copy_from_slice(right);
        self.hash(&pair)
    }
}

impl TryFrom<u8> for HashAlgorithm {
    type Error = HashError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Sha256),
            1 => Ok(Self::Blake2b256),
            _ => Err(HashError::InvalidHashType(value)),
        }
    }
}

impl From<HashAlgorithm> for u8 {
    fn from(value: HashAlgorithm) -> Self {
        value.selector()
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake2b256" | "blake2b-256" | "blake2b" => Ok(Self::Blake2b256),
            _ => Err(HashError::UnknownName),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-progress hash for a runtime-selected algorithm.
#[derive(Clone, Debug)]
pub enum HashContext {
    /// SHA-256 state.
    Sha256(Sha256),

    /// BLAKE2b-256 state.
    Blake2b256(Blake2b256),
}

impl HashContext {
    /// Returns the algorithm this context computes.
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Sha256(_) => HashAlgorithm::Sha256,
            Self::Blake2b256(_) => HashAlgorithm::Blake2b256,
        }
    }

    /// Absorbs more input.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(ctx) => ctx.update(data),
            Self::Blake2b256(ctx) => ctx.update(data),
        }
    }

    /// Finishes the hash.
    pub fn finalize(self) -> Digest {
        match self {
            Self::Sha256(ctx) => ctx.finalize(),
            Self::Blake2b256(ctx) => ctx.finalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip() {
        for alg in HashAlgorithm::ALL {
            assert_eq!(HashAlgorithm::try_from(alg.selector()).unwrap(), alg);
            assert_eq!(alg.name().parse::<HashAlgorithm>().unwrap(), alg);
        }
        assert_eq!(
            HashAlgorithm::try_from(2).unwrap_err(),
            HashError::InvalidHashType(2)
        );
        assert_eq!(
            "md5".parse::<HashAlgorithm>().unwrap_err(),
            HashError::UnknownName
        );
    }

    #[test]
    fn test_supported_mask() {
        assert_eq!(HashAlgorithm::supported_mask(), 0b11);
    }

    #[test]
    fn test_sizes() {
        assert_eq!(HashAlgorithm::Sha256.digest_len(), 32);
        assert_eq!(HashAlgorithm::Sha256.block_len(), 64);
        assert_eq!(HashAlgorithm::Blake2b256.digest_len(), 32);
        assert_eq!(HashAlgorithm::Blake2b256.block_len(), 128);
    }

    #[test]
    fn test_context_matches_oneshot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        for alg in HashAlgorithm::ALL {
            let mut ctx = alg.init();
            assert_eq!(ctx.algorithm(), alg);
            ctx.update(&data[..10]);
            ctx.update(&data[10..]);
            assert_eq!(ctx.finalize(), alg.hash(data));
        }
    }

    #[test]
    fn test_hash_node_is_concat_hash() {
        for alg in HashAlgorithm::ALL {
            let l = alg.hash_leaf(b"l");
            let r = alg.hash_leaf(b"r");
            let mut concat = l.to_vec();
            concat.extend_from_slice(&r);
            assert_eq!(alg.hash_node(&l, &r), alg.hash(&concat));
            assert_ne!(alg.hash_node(&l, &r), alg.hash_node(&r, &l));
        }
    }

    #[test]
    fn test_algorithms_differ() {
        assert_ne!(
            HashAlgorithm::Sha256.hash(b"x"),
            HashAlgorithm::Blake2b256.hash(b"x")
        );
    }

    proptest::proptest! {
        #[test]
        fn split_updates_match_oneshot(
            data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..600),
            cut in proptest::prelude::any::<usize>(),
        ) {
            let cut = if data.is_empty() { 0 } else { cut % data.len() };
            for alg in HashAlgorithm::ALL {
                let mut ctx = alg.init();
                ctx.update(&data[..cut]);
                ctx.update(&data[cut..]);
                proptest::prop_assert_eq!(ctx.finalize(), alg.hash(&data));
            }
        }
    }
}

//! Binary Merkle trees with inclusion proofs.
//!
//! A [`MerkleTree`] is built over a power-of-two number of fixed-size leaf
//! records, with every node stored in the tree's own arena.  Proofs are
//! self-contained [`MerkleProof`] values with a fixed binary encoding, and
//! are checked by a [`ProofVerifier`] without needing the tree.
//!
//! ```
//! use spi_merkle::{MerkleTree, ProofVerifier, TreeConfig};
//!
//! let records: Vec<[u8; 32]> = (0..4u8).map(|i| [i; 32]).collect();
//! let tree = MerkleTree::from_records(TreeConfig::default(), &records)?;
//! let root = tree.root()?;
//!
//! let bytes = tree.prove(2)?.to_bytes()?;
//! let proof = spi_merkle::MerkleProof::from_bytes(&bytes)?;
//!
//! let verifier = ProofVerifier::new(tree.algorithm());
//! assert!(verifier.verify(&proof, &records[2], &root));
//! assert!(!verifier.verify(&proof, &records[0], &root));
//! # Ok::<(), spi_merkle::MerkleError>(())
//! ```
//!
//! # Modules
//!
//! - `tree`: construction, rebuild and proof generation
//! - `proof`: proof types
//! - `codec_impl`: proof wire format
//! - `verify`: verification and batch reports
//! - `node`: in-arena node records

// stupid linter issue
#[cfg(test)]
use criterion as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use sha2 as _;

mod codec_impl;
pub mod config;
pub mod error;
pub mod node;
pub mod proof;
pub mod tree;
pub mod util;
pub mod verify;

pub use codec_impl::{MAX_PROOF_SIBLINGS, MIN_PROOF_LEN, PROOF_NODE_LEN};
pub use config::TreeConfig;
pub use error::{MerkleError, MerkleResult};
pub use proof::{MerkleProof, ProofNode, SiblingSide};
pub use tree::MerkleTree;
pub use util::{is_power_of_two, tree_depth, validate_tree_parameters};
pub use verify::{BatchReport, ProofVerifier, VerifyFailure};

// Re-exported so callers don't need a direct dependency for the basics.
pub use spi_hash::{DIGEST_LEN, Digest, HashAlgorithm};

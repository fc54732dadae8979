//! Hash backends used to build and verify Merkle trees.
//!
//! Two concrete functions are provided, both producing 32-byte digests:
//!
//! - [`Sha256`]: FIPS 180-4 SHA-256.
//! - [`Blake2b`]: RFC 7693 BLAKE2b, used here with a 32-byte output
//!   ([`Blake2b256`]).
//!
//! Each implements the [`HashFunction`] capability trait (init, update,
//! final, plus a one-shot [`HashFunction::digest`]).  Callers that pick the
//! function at runtime go through [`HashAlgorithm`], which dispatches by
//! enum variant rather than through trait objects.
//!
//! ```
//! use spi_hash::HashAlgorithm;
//!
//! let left = HashAlgorithm::Sha256.hash_leaf(b"left");
//! let right = HashAlgorithm::Sha256.hash_leaf(b"right");
//! let parent = HashAlgorithm::Sha256.hash_node(&left, &right);
//! assert_eq!(parent.len(), 32);
//! ```

mod algorithm;
mod blake2b;
mod digest;
mod errors;
mod sha256;
mod traits;

pub use algorithm::{HashAlgorithm, HashContext};
pub use blake2b::{BLAKE2B_BLOCK_LEN, BLAKE2B_MAX_OUTPUT_LEN, Blake2b, Blake2b256};
pub use digest::{DIGEST_LEN, Digest, eq_ct, to_hex};
pub use errors::HashError;
pub use sha256::{SHA256_BLOCK_LEN, Sha256};
pub use traits::HashFunction;


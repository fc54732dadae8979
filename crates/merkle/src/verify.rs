//! Proof verification, independent of any live tree.

use spi_hash::{Digest, HashAlgorithm, eq_ct};
use thiserror::Error;

use crate::codec_impl::MAX_PROOF_SIBLINGS;
use crate::error::{MerkleError, MerkleResult};
use crate::proof::{MerkleProof, SiblingSide};

/// Why a proof did not verify.
///
/// These are expected negative outcomes, not malformed input.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum VerifyFailure {
    /// The record does not hash to the proof's leaf digest.
    #[error("leaf record does not match proof leaf digest")]
    LeafDigestMismatch,

    /// The recomputed root differs from the expected root.
    #[error("recomputed root does not match expected root")]
    RootMismatch,

    /// The proof is longer than any supported tree.
    #[error("proof has {0} siblings")]
    TooManySiblings(usize),

    /// The root embedded in the proof differs from the expected root.
    #[error("embedded root does not match expected root")]
    EmbeddedRootMismatch,

    /// A side tag disagrees with the leaf index.
    #[error("sibling side at level {level} disagrees with leaf index")]
    SideMismatch {
        /// Level counted up from the leaves.
        level: usize,
    },

    /// The leaf index has bits set above the proof depth.
    #[error("leaf index out of range for proof depth")]
    IndexOutOfRange,
}

/// Outcome of [`ProofVerifier::verify_batch`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchReport {
    total: usize,
    failures: Vec<(usize, VerifyFailure)>,
}

impl BatchReport {
    /// Number of entries checked.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of entries that verified.
    pub fn passed(&self) -> usize {
        self.total - self.failures.len()
    }

    /// Failed entries by position, with the reason.
    pub fn failures(&self) -> &[(usize, VerifyFailure)] {
        &self.failures
    }

    /// Returns if every entry verified.
    pub fn all_verified(&self) -> bool {
        self.failures.is_empty()
    }

    /// Per-entry results in input order.
    pub fn results(&self) -> Vec<bool> {
        let mut out = vec![true; self.total];
        for (i, _) in &self.failures {
            out[*i] = false;
        }
        out
    }
}

/// Checks proofs against caller-supplied roots.
///
/// The caller's root is authoritative, the root embedded in the proof is
/// ignored by [`Self::verify`] and only checked by [`Self::verify_strict`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ProofVerifier {
    alg: HashAlgorithm,
}

impl ProofVerifier {
    /// Creates a verifier for proofs hashed with `alg`.
    pub fn new(alg: HashAlgorithm) -> Self {
        Self { alg }
    }

    /// Algorithm used for recomputation.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.alg
    }

    /// Returns if `leaf_record` is proven under `expected_root`.
    pub fn verify(&self, proof: &MerkleProof, leaf_record: &[u8], expected_root: &Digest) -> bool {
        self.check(proof, leaf_record, expected_root).is_ok()
    }

    /// Like [`Self::verify`], but explains a failure.
    pub fn check(
        &self,
        proof: &MerkleProof,
        leaf_record: &[u8],
        expected_root: &Digest,
    ) -> Result<(), VerifyFailure> {
        if proof.depth() > MAX_PROOF_SIBLINGS {
            return Err(VerifyFailure::TooManySiblings(proof.depth()));
        }

        let leaf = self.alg.hash_leaf(leaf_record);
        if !eq_ct(&leaf, proof.leaf_digest()) {
            return Err(VerifyFailure::LeafDigestMismatch);
        }

        let root = proof.compute_root_from(self.alg, &leaf);
        if !eq_ct(&root, expected_root) {
            return Err(VerifyFailure::RootMismatch);
        }
        Ok(())
    }

    /// Like [`Self::check`], and also requires the embedded root to match
    /// and every side tag to agree with the leaf index bits.
    pub fn verify_strict(
        &self,
        proof: &MerkleProof,
        leaf_record: &[u8],
        expected_root: &Digest,
    ) -> Result<(), VerifyFailure> {
        if !eq_ct(proof.root_digest(), expected_root) {
            return Err(VerifyFailure::EmbeddedRootMismatch);
        }

        let depth = proof.depth();
        if depth < u64::BITS as usize && proof.leaf_index() >> depth != 0 {
            return Err(VerifyFailure::IndexOutOfRange);
        }

        for (level, sib) in proof.siblings().iter().enumerate() {
            if sib.side() != SiblingSide::for_index(proof.leaf_index(), level) {
                return Err(VerifyFailure::SideMismatch { level });
            }
        }

        self.check(proof, leaf_record, expected_root)
    }

    /// Checks each `(proof, record, root)` triple independently.
    ///
    /// This is not atomic, the report lists every entry that failed.
    pub fn verify_batch<R: AsRef<[u8]>>(
        &self,
        proofs: &[MerkleProof],
        records: &[R],
        expected_roots: &[Digest],
    ) -> MerkleResult<BatchReport> {
        if proofs.len() != records.len() || proofs.len() != expected_roots.len() {
            return Err(MerkleError::BatchLengthMismatch {
                proofs: proofs.len(),
                records: records.len(),
                roots: expected_roots.len(),
            });
        }

        let failures = proofs
            .iter()
            .zip(records)
            .zip(expected_roots)
            .enumerate()
            .filter_map(|(i, ((proof, rec), root))| {
                self.check(proof, rec.as_ref(), root).err().map(|f| (i, f))
            })
            .collect();

        Ok(BatchReport {
            total: proofs.len(),
            failures,
        })
    }
}

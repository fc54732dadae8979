//! Capability interface shared by the hash backends.

use crate::digest::Digest;

/// Incremental hash function producing a [`Digest`].
///
/// The lifecycle is `new -> update* -> finalize`.  Finalizing consumes the
/// state, so a context can never be fed again after producing its output.
pub trait HashFunction: Clone + Sized {
    /// Output length in bytes.
    const DIGEST_LEN: usize;

    /// Internal block length in bytes.
    const BLOCK_LEN: usize;

    /// Creates a fresh context.
    fn new() -> Self;

    /// Absorbs more input.
    fn update(&mut self, data: &[u8]);

    /// Pads, runs the final compression and returns the digest.
    fn finalize(self) -> Digest;

    /// One-shot hash of `data`, equivalent to `new`, `update`, `finalize`.
    fn digest(data: &[u8]) -> Digest {
        let mut ctx = Self::new();
        ctx.update(data);
        ctx.finalize()
    }
}

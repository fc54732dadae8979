//! BLAKE2b (RFC 7693), unkeyed.

use crate::digest::{DIGEST_LEN, Digest};
use crate::errors::HashError;
use crate::traits::HashFunction;

/// BLAKE2b message block length in bytes.
pub const BLAKE2B_BLOCK_LEN: usize = 128;

/// Largest output length BLAKE2b supports.
pub const BLAKE2B_MAX_OUTPUT_LEN: usize = 64;

const ROUNDS: usize = 12;

const IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

/// Message word permutation per round.  Rounds 10 and 11 reuse rows 0 and 1.
const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

/// Incremental BLAKE2b context with a configurable output length.
///
/// The last block is held back in the buffer until [`Self::finalize_into`]
/// so that it can be compressed with the final-block flag set.  The byte
/// counter covers every byte absorbed, split across two 64-bit words.
#[derive(Clone, Debug)]
pub struct Blake2b {
    h: [u64; 8],
    /// Bytes compressed so far, low word first.
    t: [u64; 2],
    buf: [u8; BLAKE2B_BLOCK_LEN],
    buf_len: usize,
    out_len: usize,
}

impl Blake2b {
    /// Creates an unkeyed context producing `out_len` bytes.
    pub fn with_output_len(out_len: usize) -> Result<Self, HashError> {
        if out_len == 0 || out_len > BLAKE2B_MAX_OUTPUT_LEN {
            return Err(HashError::InvalidOutputLength(out_len));
        }
        Ok(Self::init(out_len))
    }

    /// `out_len` must be in `1..=BLAKE2B_MAX_OUTPUT_LEN`.
    fn init(out_len: usize) -> Self {
        let mut h = IV;
        // Parameter block word 0: digest length, key length 0, fanout 1, depth 1.
        h[0] ^= 0x0101_0000 ^ out_len as u64;

        Self {
            h,
            t: [0, 0],
            buf: [0; BLAKE2B_BLOCK_LEN],
            buf_len: 0,
            out_len,
        }
    }

    /// Returns the configured output length.
    pub fn output_len(&self) -> usize {
        self.out_len
    }

    /// Absorbs more input.
    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            // Only compress a full buffer once we know more input follows it.
            if self.buf_len == BLAKE2B_BLOCK_LEN {
                self.increment_counter(BLAKE2B_BLOCK_LEN as u64);
                let block = self.buf;
                self.compress(&block, false);
                self.buf_len = 0;
            }

            let take = (BLAKE2B_BLOCK_LEN - self.buf_len).min(data.len());
            self.buf[self.buf_len..self.buf_len + take].copy_from_slice(&data[..take]);
            self.buf_len += take;
            data = &data[take..];
        }
    }

    /// Runs the final compression and writes `output_len` bytes into `out`.
    ///
    /// Returns the number of bytes written, which is the smaller of
    /// `out.len()` and the configured output length.
    pub fn finalize_into(mut self, out: &mut [u8]) -> usize {
        self.increment_counter(self.buf_len as u64);
        self.buf[self.buf_len..].fill(0);
        let block = self.buf;
        self.compress(&block, true);

        let mut full = [0u8; BLAKE2B_MAX_OUTPUT_LEN];
        for (chunk, word) in full.chunks_exact_mut(8).zip(self.h.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }

        let n = self.out_len.min(out.len());
        out[..n].copy_from_slice(&full[..n]);
        n
    }

    /// Finalizes into a newly allocated vec of `output_len` bytes.
    pub fn finalize_vec(self) -> Vec<u8> {
        let mut out = vec![0; self.out_len];
        self.finalize_into(&mut out);
        out
    }

    fn increment_counter(&mut self, n: u64) {
        let (lo, carry) = self.t[0].overflowing_add(n);
        self.t[0] = lo;
        if carry {
            self.t[1] = self.t[1].wrapping_add(1);
        }
    }

    fn compress(&mut self, block: &[u8; BLAKE2B_BLOCK_LEN], last: bool) {
        let mut m = [0u64; 16];
        for (word, bytes) in m.iter_mut().zip(block.chunks_exact(8)) {
            *word = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]);
        }

        let mut v = [0u64; 16];
        v[..8].copy_from_slice(&self.h);
        v[8..].copy_from_slice(&IV);
        v[12] ^= self.t[0];
        v[13] ^= self.t[1];
        if last {
            v[14] = !v[14];
        }

        for r in 0..ROUNDS {
            let s = &SIGMA[r % 10];
            g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
            g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
            g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
            g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
            g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
            g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
            g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
            g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
        }

        for i in 0..8 {
            self.h[i] ^= v[i] ^ v[i + 8];
        }
    }
}

/// Mixing function.
#[inline(always)]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

/// BLAKE2b with a 32-byte output, the Merkle tree instance.
#[derive(Clone, Debug)]
pub struct Blake2b256(Blake2b);

impl Blake2b256 {
    /// Creates a fresh context.
    pub fn new() -> Self {
        Self(Blake2b::init(DIGEST_LEN))
    }

    /// Absorbs more input.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data)
    }

    /// Returns the 32-byte digest.
    pub fn finalize(self) -> Digest {
        let mut out = [0; DIGEST_LEN];
        self.0.finalize_into(&mut out);
        out
    }
}

impl Default for Blake2b256 {
    fn default() -> Self {
        Self::new()
    }
}

impl HashFunction for Blake2b256 {
    const DIGEST_LEN: usize = DIGEST_LEN;
    const BLOCK_LEN: usize = BLAKE2B_BLOCK_LEN;

    fn new() -> Self {
        Blake2b256::new()
    }

    fn update(&mut self, data: &[u8]) {
        Blake2b256::update(self, data)
    }

    fn finalize(self) -> Digest {
        Blake2b256::finalize(self)
    }
}

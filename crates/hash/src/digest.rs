//! Digest type and comparison helpers.

/// Length in bytes of every digest produced by the Merkle backends.
pub const DIGEST_LEN: usize = 32;

/// Fixed-size hash output.
pub type Digest = [u8; DIGEST_LEN];

/// Checks if two digests are equal, attempting to do it in constant time.
///
/// This is used when comparing a root recomputed from a proof against a
/// trusted one, so it does not short-circuit on the first differing byte.
pub fn eq_ct(a: &Digest, b: &Digest) -> bool {
    let mut acc: u8 = 0;
    for i in 0..DIGEST_LEN {
        acc |= a[i] ^ b[i];
    }

    acc == 0
}

/// Renders a digest as lowercase hex.
pub fn to_hex(d: &Digest) -> String {
    hex::encode(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_ct() {
        let a = [7u8; DIGEST_LEN];
        let mut b = a;
        assert!(eq_ct(&a, &b));

        b[DIGEST_LEN - 1] ^= 0x80;
        assert!(!eq_ct(&a, &b));
    }

    #[test]
    fn test_to_hex() {
        let mut d = [0u8; DIGEST_LEN];
        d[0] = 0xab;
        d[31] = 0x01;
        let h = to_hex(&d);
        assert_eq!(h.len(), 64);
        assert!(h.starts_with("ab00"));
        assert!(h.ends_with("0001"));
        assert_eq!(hex::decode(&h).unwrap(), d);
    }
}

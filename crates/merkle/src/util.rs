//! Shared size validation.

use crate::error::{MerkleError, MerkleResult};

/// Returns if `n` is a non-zero power of two.
pub fn is_power_of_two(n: u64) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Returns the depth of a tree over `num_leaves` leaves.
///
/// This is `log2` for powers of two and rounds up otherwise.  Zero and one
/// leaf both give depth zero.
pub fn tree_depth(num_leaves: u64) -> u8 {
    if num_leaves <= 1 {
        return 0;
    }
    (u64::BITS - (num_leaves - 1).leading_zeros()) as u8
}

/// Checks that `num_leaves` can form a complete tree no deeper than
/// `max_depth`, returning the depth.
pub fn validate_tree_parameters(num_leaves: u64, max_depth: u8) -> MerkleResult<u8> {
    if num_leaves == 0 {
        return Err(MerkleError::InvalidSize("zero leaves"));
    }
    if !is_power_of_two(num_leaves) {
        return Err(MerkleError::InvalidSize("leaf count not a power of two"));
    }

    let depth = tree_depth(num_leaves);
    if depth > max_depth {
        return Err(MerkleError::InvalidSize("tree deeper than configured maximum"));
    }
    Ok(depth)
}

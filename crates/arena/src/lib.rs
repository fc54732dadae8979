//! Bump-pointer arena backing Merkle tree nodes.
//!
//! An [`Arena`] owns a chain of equally sized blocks.  Allocation hands out
//! [`Slot`] handles (block, offset, length) rather than references, so the
//! tree can store child links inside the arena itself and the whole
//! structure is released as one unit.

mod arena;
mod errors;

pub use arena::{ALIGN, Arena, Slot};
pub use errors::{ArenaError, ArenaResult};

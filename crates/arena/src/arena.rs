//! Chained-block bump allocator.

use std::fmt;

use tracing::*;

use crate::errors::{ArenaError, ArenaResult};

/// Every allocation is rounded up to a multiple of this.
pub const ALIGN: usize = 8;

/// Handle to a region allocated out of an [`Arena`].
///
/// Slots are plain indices, so they can be copied around and stored inside
/// other allocations.  A slot is only meaningful for the arena that produced
/// it, and only until that arena is reset or destroyed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Slot {
    block: u32,
    offset: u32,
    len: u32,
}

impl Slot {
    /// Reassembles a slot from its parts, such as when decoding one that was
    /// stored inside the arena.
    pub fn from_parts(block: u32, offset: u32, len: u32) -> Self {
        Self { block, offset, len }
    }

    /// Index of the block the slot lives in.
    pub fn block(&self) -> u32 {
        self.block
    }

    /// Byte offset within the block.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Length in bytes after alignment.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns if the slot covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

struct Block {
    data: Vec<u8>,
    used: usize,
}

impl Block {
    fn try_new(capacity: usize) -> ArenaResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ArenaError::OutOfMemory {
                requested: capacity,
                capacity,
            })?;
        data.resize(capacity, 0);
        Ok(Self { data, used: 0 })
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.used
    }
}

/// Bump-pointer arena over a chain of blocks of equal capacity.
///
/// There is no per-allocation free.  [`Arena::reset`] rewinds every block
/// while keeping its storage, and [`Arena::destroy`] (or dropping) releases
/// everything at once.
pub struct Arena {
    blocks: Vec<Block>,
    /// Index of the block allocations are currently served from.
    current: usize,
    block_capacity: usize,
    /// Most blocks the arena may hold, unbounded if `None`.
    max_blocks: Option<usize>,
}

impl Arena {
    /// Creates an arena and allocates its first block.
    pub fn new(block_capacity: usize) -> ArenaResult<Self> {
        if block_capacity == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        if block_capacity > u32::MAX as usize {
            return Err(ArenaError::CapacityTooLarge(block_capacity));
        }

        let first = Block::try_new(block_capacity)?;
        Ok(Self {
            blocks: vec![first],
            current: 0,
            block_capacity,
            max_blocks: None,
        })
    }

    /// Creates an arena that never holds more than `max_blocks` blocks.
    ///
    /// Once the cap is reached, allocations that don't fit in the retained
    /// blocks fail with [`ArenaError::OutOfMemory`].
    pub fn with_max_blocks(block_capacity: usize, max_blocks: usize) -> ArenaResult<Self> {
        if max_blocks == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        let mut arena = Self::new(block_capacity)?;
        arena.max_blocks = Some(max_blocks);
        Ok(arena)
    }

    /// Allocates `size` bytes, rounded up to [`ALIGN`].
    ///
    /// Requests are served from the current block if it has room.  Otherwise
    /// the next retained block is tried, and once those run out a new block
    /// is appended.  A request larger than the block capacity always fails.
    pub fn allocate(&mut self, size: usize) -> ArenaResult<Slot> {
        let aligned = align_up(size).ok_or(ArenaError::OutOfMemory {
            requested: size,
            capacity: self.block_capacity,
        })?;
        if aligned > self.block_capacity {
            return Err(ArenaError::OutOfMemory {
                requested: aligned,
                capacity: self.block_capacity,
            });
        }

        while self.blocks[self.current].remaining() < aligned {
            self.current += 1;
            if self.current == self.blocks.len() {
                if self.max_blocks.is_some_and(|max| self.blocks.len() >= max) {
                    self.current -= 1;
                    return Err(ArenaError::OutOfMemory {
                        requested: aligned,
                        capacity: self.block_capacity,
                    });
                }
                let block = match Block::try_new(self.block_capacity) {
                    Ok(b) => b,
                    Err(e) => {
                        self.current -= 1;
                        return Err(e);
                    }
                };
                self.blocks.push(block);
                trace!(
                    blocks = self.blocks.len(),
                    capacity = self.block_capacity,
                    "arena grew"
                );
            }
        }

        let block = &mut self.blocks[self.current];
        let offset = block.used;
        block.used += aligned;

        // Both bounded by `block_capacity`, which fits in a u32.
        Ok(Slot {
            block: self.current as u32,
            offset: offset as u32,
            len: aligned as u32,
        })
    }

    /// Allocates a slot and copies `bytes` into its start.
    pub fn allocate_copy(&mut self, bytes: &[u8]) -> ArenaResult<Slot> {
        let slot = self.allocate(bytes.len())?;
        if let Some(buf) = self.get_mut(slot) {
            buf[..bytes.len()].copy_from_slice(bytes);
        }
        Ok(slot)
    }

    /// Returns the bytes for a slot, or `None` if the slot is not currently
    /// allocated in this arena.
    pub fn get(&self, slot: Slot) -> Option<&[u8]> {
        let (block, start, end) = self.locate(slot)?;
        Some(&self.blocks[block].data[start..end])
    }

    /// Mutable version of [`Arena::get`].
    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut [u8]> {
        let (block, start, end) = self.locate(slot)?;
        Some(&mut self.blocks[block].data[start..end])
    }

    fn locate(&self, slot: Slot) -> Option<(usize, usize, usize)> {
        let block = slot.block as usize;
        let start = slot.offset as usize;
        let end = start.checked_add(slot.len as usize)?;
        if end > self.blocks.get(block)?.used {
            return None;
        }
        Some((block, start, end))
    }

    /// Rewinds every block to empty without releasing any storage.
    ///
    /// Slots handed out before the reset must not be used afterwards.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.used = 0;
        }
        self.current = 0;
        trace!(blocks = self.blocks.len(), "arena reset");
    }

    /// Releases every block.
    pub fn destroy(self) {
        trace!(blocks = self.blocks.len(), "arena destroyed");
        drop(self);
    }

    /// Capacity of each block.
    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Block cap set with [`Arena::with_max_blocks`].
    pub fn max_blocks(&self) -> Option<usize> {
        self.max_blocks
    }

    /// Number of blocks currently held, whether in use or not.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Total aligned bytes handed out since creation or the last reset.
    pub fn used_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.used).sum()
    }

    /// Total bytes of backing storage held.
    pub fn reserved_bytes(&self) -> usize {
        self.blocks.len() * self.block_capacity
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("block_capacity", &self.block_capacity)
            .field("num_blocks", &self.blocks.len())
            .field("max_blocks", &self.max_blocks)
            .field("current", &self.current)
            .field("used_bytes", &self.used_bytes())
            .finish()
    }
}

fn align_up(size: usize) -> Option<usize> {
    Some(size.checked_add(ALIGN - 1)? & !(ALIGN - 1))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(Arena::new(0).unwrap_err(), ArenaError::ZeroCapacity);
    }

    #[test]
    fn test_block_cap() {
        assert_eq!(
            Arena::with_max_blocks(64, 0).unwrap_err(),
            ArenaError::ZeroCapacity
        );

        let mut arena = Arena::with_max_blocks(16, 2).unwrap();
        assert_eq!(arena.max_blocks(), Some(2));
        arena.allocate(16).unwrap();
        let second = arena.allocate(16).unwrap();
        assert_eq!(second.block(), 1);
        assert_eq!(
            arena.allocate(8).unwrap_err(),
            ArenaError::OutOfMemory {
                requested: 8,
                capacity: 16
            }
        );
        assert_eq!(arena.num_blocks(), 2);

        // Retained blocks are still usable after a reset.
        arena.reset();
        arena.allocate(16).unwrap();
        assert_eq!(arena.allocate(16).unwrap().block(), 1);
    }

    #[test]
    fn test_alignment() {
        let mut arena = Arena::new(64).unwrap();
        let a = arena.allocate(1).unwrap();
        let b = arena.allocate(9).unwrap();
        let c = arena.allocate(8).unwrap();
        assert_eq!((a.offset(), a.len()), (0, 8));
        assert_eq!((b.offset(), b.len()), (8, 16));
        assert_eq!((c.offset(), c.len()), (24, 8));
        assert_eq!(arena.used_bytes(), 32);
    }

    #[test]
    fn test_oversized_request_fails() {
        let mut arena = Arena::new(32).unwrap();
        assert_eq!(
            arena.allocate(33).unwrap_err(),
            ArenaError::OutOfMemory {
                requested: 40,
                capacity: 32
            }
        );
        assert!(matches!(
            arena.allocate(usize::MAX),
            Err(ArenaError::OutOfMemory { .. })
        ));
        // A failed request leaves the arena untouched.
        assert_eq!(arena.num_blocks(), 1);
        assert_eq!(arena.used_bytes(), 0);
    }

    #[test]
    fn test_grows_new_block() {
        let mut arena = Arena::new(16).unwrap();
        let a = arena.allocate(16).unwrap();
        let b = arena.allocate(8).unwrap();
        assert_eq!(a.block(), 0);
        assert_eq!((b.block(), b.offset()), (1, 0));
        assert_eq!(arena.num_blocks(), 2);
        assert_eq!(arena.reserved_bytes(), 32);
    }

    #[test]
    fn test_reset_reuses_first_offset() {
        let mut arena = Arena::new(64).unwrap();
        let first = arena.allocate(16).unwrap();
        for _ in 0..3 {
            arena.allocate(16).unwrap();
        }
        assert_eq!(arena.used_bytes(), 64);
        assert_eq!(arena.num_blocks(), 1);

        arena.reset();
        let again = arena.allocate(16).unwrap();
        assert_eq!(again, first);
        assert_eq!(arena.num_blocks(), 1);
    }

    #[test]
    fn test_reset_walks_retained_blocks() {
        let mut arena = Arena::new(16).unwrap();
        for _ in 0..4 {
            arena.allocate(16).unwrap();
        }
        assert_eq!(arena.num_blocks(), 4);

        arena.reset();
        for i in 0..4 {
            let s = arena.allocate(16).unwrap();
            assert_eq!(s.block(), i);
        }
        assert_eq!(arena.num_blocks(), 4);
    }

    #[test]
    fn test_get_and_stale_slots() {
        let mut arena = Arena::new(32).unwrap();
        let s = arena.allocate_copy(b"hello").unwrap();
        assert_eq!(&arena.get(s).unwrap()[..5], b"hello");

        arena.get_mut(s).unwrap()[0] = b'j';
        assert_eq!(&arena.get(s).unwrap()[..5], b"jello");

        arena.reset();
        assert!(arena.get(s).is_none());
        assert!(arena.get(Slot::from_parts(7, 0, 8)).is_none());
    }

    proptest! {
        #[test]
        fn allocations_never_overlap(sizes in prop::collection::vec(0usize..=40, 1..64)) {
            let mut arena = Arena::new(40).unwrap();
            let mut slots = Vec::new();
            for size in sizes {
                let slot = arena.allocate(size).unwrap();
                prop_assert!(slot.len() as usize >= size);
                prop_assert_eq!(slot.offset() as usize % ALIGN, 0);
                slots.push(slot);
            }

            for (i, a) in slots.iter().enumerate() {
                for b in &slots[i + 1..] {
                    if a.block() == b.block() {
                        let a_end = a.offset() + a.len();
                        let b_end = b.offset() + b.len();
                        prop_assert!(a_end <= b.offset() || b_end <= a.offset());
                    }
                }
            }
        }
    }
}

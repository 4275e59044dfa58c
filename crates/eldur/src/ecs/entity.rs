//! # Entity — Generational Handles
//!
//! An [`Entity`] is a `(index, generation)` pair. The index names a storage
//! slot; the generation says which *occupant* of that slot the handle was
//! issued for. Freeing a slot bumps its generation, so a handle kept around
//! after `despawn` can never match the slot's next occupant:
//!
//! ```text
//! spawn      -> Entity(3v0)
//! despawn    -> generations[3] = 1, free list = [3]
//! spawn      -> Entity(3v1)        (same slot, new generation)
//! is_alive(Entity(3v0)) == false   (stale)
//! ```
//!
//! Freed indices are reused first so component stores indexed by
//! `Entity::index` stay dense.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A lightweight handle to an entity in a [`World`](super::world::World).
///
/// Handles are plain `Copy` values; they never change after `spawn`. Whether a
/// handle still refers to a live entity is answered by
/// [`World::is_alive`](super::world::World::is_alive).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Slot index. Shared by every entity that ever occupied the slot.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single integer (generation in the high bits).
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    /// Inverse of [`to_bits`](Self::to_bits).
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Issues and recycles entity handles.
///
/// `generations[i]` is the generation a *live* occupant of slot `i` carries.
/// Dead slots have already been bumped and sit on `free`.
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Hand out a handle, preferring a recycled slot.
    pub fn allocate(&mut self) -> Entity {
        match self.free.pop() {
            Some(index) => Entity {
                index,
                generation: self.generations[index as usize],
            },
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                Entity {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Free the slot behind `entity`. Returns `false` (and does nothing) for a
    /// handle that is already stale, so double frees are harmless.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.generations[entity.index as usize];
        *slot = slot.wrapping_add(1);
        self.free.push(entity.index);
        true
    }

    /// O(1) liveness check.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.index as usize)
            .is_some_and(|&generation| generation == entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free.len()
    }

    /// Slots ever handed out, live or free.
    pub fn total_slots(&self) -> usize {
        self.generations.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Every live handle, in slot order.
    pub fn alive(&self) -> Vec<Entity> {
        let free: std::collections::HashSet<u32> = self.free.iter().copied().collect();
        (0..self.generations.len() as u32)
            .filter(|index| !free.contains(index))
            .map(|index| Entity {
                index,
                generation: self.generations[index as usize],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slots_are_sequential() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!((a.index(), a.generation()), (0, 0));
        assert_eq!((b.index(), b.generation()), (1, 0));
        assert_eq!(alloc.total_slots(), 2);
    }

    #[test]
    fn reuse_bumps_generation_and_kills_old_handle() {
        let mut alloc = EntityAllocator::new();
        let old = alloc.allocate();
        assert!(alloc.deallocate(old));

        let new = alloc.allocate();
        assert_eq!(new.index(), old.index());
        assert_eq!(new.generation(), 1);
        assert!(!alloc.is_alive(old));
        assert!(alloc.is_alive(new));
    }

    #[test]
    fn double_free_is_a_noop() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert_eq!(alloc.free_count(), 1);
    }

    #[test]
    fn unknown_index_is_dead() {
        let alloc = EntityAllocator::new();
        assert!(!alloc.is_alive(Entity {
            index: 7,
            generation: 0
        }));
    }

    #[test]
    fn counts_track_lifecycle() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let _b = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        alloc.deallocate(a);
        assert_eq!(alloc.alive_count(), 1);
        assert_eq!(alloc.free_count(), 1);
        assert_eq!(alloc.alive().len(), 1);
    }

    #[test]
    fn bits_roundtrip_keeps_both_halves() {
        let e = Entity {
            index: 12,
            generation: 3,
        };
        assert_eq!(Entity::from_bits(e.to_bits()), e);
        assert_eq!(format!("{e:?}"), "Entity(12v3)");
    }
}

//! # Component — Per-Type Sparse-Set Storage
//!
//! Every component type gets its own [`ComponentStore`], created the first
//! time a value of that type is inserted. A store is a sparse set:
//!
//! ```text
//! sparse:   [None, Some(1), None, Some(0)]   <- indexed by Entity::index
//! entities: [e3,   e1]                       <- dense, parallel to values
//! values:   [Box<T>, Box<T>]                 <- type-erased, one box per value
//! ```
//!
//! Lookups are O(1) through `sparse`; iteration walks the dense arrays, which is
//! what lets a query drive from the smallest store. Values are stored as
//! `Box<dyn Any + Send + Sync>` and downcast on the way out, so the store needs
//! no `unsafe` and a wrong-type request is reported as
//! [`EcsError::TypeMismatch`] instead of undefined behavior.

use std::any::{Any, TypeId};

use super::entity::Entity;
use crate::error::{EcsError, Result};

/// Marker for types that can be attached to entities.
///
/// Components are plain values: queries hand out clones, and a system that
/// changes one writes it back with
/// [`World::insert_component`](super::world::World::insert_component). Any
/// `'static + Send + Sync + Clone` type qualifies automatically.
pub trait Component: 'static + Send + Sync + Clone {}

impl<T: 'static + Send + Sync + Clone> Component for T {}

/// Storage for every value of one component type.
pub(crate) struct ComponentStore {
    type_id: TypeId,
    type_name: &'static str,
    sparse: Vec<Option<usize>>,
    entities: Vec<Entity>,
    values: Vec<Box<dyn Any + Send + Sync>>,
}

impl ComponentStore {
    pub fn new<T: 'static + Send + Sync>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            sparse: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Entities holding a value, in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.row(entity).is_some()
    }

    fn row(&self, entity: Entity) -> Option<usize> {
        let row = (*self.sparse.get(entity.index as usize)?)?;
        (self.entities[row] == entity).then_some(row)
    }

    fn check<T: 'static>(&self) -> Result<()> {
        if self.type_id == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(EcsError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: self.type_name,
            })
        }
    }

    /// Insert or overwrite the value for `entity`.
    pub fn insert<T: 'static + Send + Sync>(&mut self, entity: Entity, value: T) -> Result<()> {
        self.check::<T>()?;
        let slot = entity.index as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        if let Some(row) = self.row(entity) {
            self.values[row] = Box::new(value);
            return Ok(());
        }
        // A previous occupant of this slot should have been removed on
        // despawn; clear it anyway so `sparse` never points at two entities.
        if let Some(row) = self.sparse[slot] {
            self.swap_remove_row(row);
        }
        self.sparse[slot] = Some(self.entities.len());
        self.entities.push(entity);
        self.values.push(Box::new(value));
        Ok(())
    }

    pub fn get<T: 'static>(&self, entity: Entity) -> Result<Option<&T>> {
        let Some(row) = self.row(entity) else {
            return Ok(None);
        };
        match self.values[row].downcast_ref::<T>() {
            Some(value) => Ok(Some(value)),
            None => Err(EcsError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: self.type_name,
            }),
        }
    }

    /// Take the value out of the store.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> Result<Option<T>> {
        self.check::<T>()?;
        let Some(row) = self.row(entity) else {
            return Ok(None);
        };
        match self.swap_remove_row(row).downcast::<T>() {
            Ok(value) => Ok(Some(*value)),
            Err(_) => Err(EcsError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: self.type_name,
            }),
        }
    }

    /// Drop the value for `entity` without knowing its type. Used by despawn.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        match self.row(entity) {
            Some(row) => {
                self.swap_remove_row(row);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.values.clear();
    }

    fn swap_remove_row(&mut self, row: usize) -> Box<dyn Any + Send + Sync> {
        let removed = self.entities.swap_remove(row);
        let value = self.values.swap_remove(row);
        self.sparse[removed.index as usize] = None;
        if let Some(&moved) = self.entities.get(row) {
            self.sparse[moved.index as usize] = Some(row);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32, generation: u32) -> Entity {
        Entity { index, generation }
    }

    #[test]
    fn insert_get_overwrite() {
        let mut store = ComponentStore::new::<u32>();
        let e = entity(4, 0);
        store.insert(e, 10u32).unwrap();
        assert_eq!(store.get::<u32>(e).unwrap(), Some(&10));

        store.insert(e, 20u32).unwrap();
        assert_eq!(store.get::<u32>(e).unwrap(), Some(&20));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_swaps_last_into_hole() {
        let mut store = ComponentStore::new::<u32>();
        let (a, b, c) = (entity(0, 0), entity(1, 0), entity(2, 0));
        store.insert(a, 1u32).unwrap();
        store.insert(b, 2u32).unwrap();
        store.insert(c, 3u32).unwrap();

        assert_eq!(store.remove::<u32>(a).unwrap(), Some(1));
        assert_eq!(store.entities(), &[c, b]);
        assert_eq!(store.get::<u32>(c).unwrap(), Some(&3));
        assert_eq!(store.get::<u32>(b).unwrap(), Some(&2));
        assert!(!store.contains(a));
    }

    #[test]
    fn stale_generation_does_not_match() {
        let mut store = ComponentStore::new::<u32>();
        store.insert(entity(1, 0), 5u32).unwrap();
        assert_eq!(store.get::<u32>(entity(1, 1)).unwrap(), None);
        assert!(!store.remove_entity(entity(1, 1)));
    }

    #[test]
    fn newer_occupant_replaces_leftover_row() {
        let mut store = ComponentStore::new::<u32>();
        store.insert(entity(1, 0), 5u32).unwrap();
        store.insert(entity(1, 1), 6u32).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get::<u32>(entity(1, 1)).unwrap(), Some(&6));
    }

    #[test]
    fn wrong_type_is_a_mismatch() {
        let mut store = ComponentStore::new::<u32>();
        let e = entity(0, 0);
        store.insert(e, 1u32).unwrap();

        assert!(matches!(
            store.get::<f32>(e),
            Err(EcsError::TypeMismatch { found: "u32", .. })
        ));
        assert!(matches!(
            store.insert(e, 1.0f32),
            Err(EcsError::TypeMismatch { expected: "f32", .. })
        ));
        assert!(store.remove::<f32>(e).is_err());
        // The failed remove must not have dropped the value.
        assert_eq!(store.get::<u32>(e).unwrap(), Some(&1));
    }

    #[test]
    fn values_are_dropped_on_removal() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut store = ComponentStore::new::<Tracked>();
        store.insert(entity(0, 0), Tracked).unwrap();
        store.insert(entity(1, 0), Tracked).unwrap();
        store.remove_entity(entity(0, 0));
        assert_eq!(DROPS.load(Ordering::SeqCst), 1);
        drop(store);
        assert_eq!(DROPS.load(Ordering::SeqCst), 2);
    }
}

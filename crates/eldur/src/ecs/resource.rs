//! Singleton values keyed by type.
//!
//! Resources hold global state such as a score, a spawn timer, or the frame
//! [`Time`](crate::time::Time). There is at most one value per type; inserting
//! again replaces the old value.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::error::{EcsError, Result};

/// Marker for types usable as resources. Blanket-implemented.
pub trait Resource: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Resource for T {}

struct ResourceEntry {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

/// Type-keyed singleton storage.
#[derive(Default)]
pub struct Resources {
    entries: HashMap<TypeId, ResourceEntry>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning the value it replaced (if any).
    pub fn insert<T: Resource>(&mut self, value: T) -> Option<T> {
        let previous = self.entries.insert(
            TypeId::of::<T>(),
            ResourceEntry {
                type_name: std::any::type_name::<T>(),
                value: Box::new(value),
            },
        )?;
        log::trace!("replaced resource `{}`", previous.type_name);
        previous.value.downcast::<T>().ok().map(|b| *b)
    }

    /// Shared access. Fails with [`EcsError::ResourceNotFound`] when missing.
    pub fn get<T: Resource>(&self) -> Result<&T> {
        let entry = self
            .entries
            .get(&TypeId::of::<T>())
            .ok_or(EcsError::ResourceNotFound(std::any::type_name::<T>()))?;
        entry
            .value
            .downcast_ref::<T>()
            .ok_or(EcsError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: entry.type_name,
            })
    }

    /// Exclusive access. Fails with [`EcsError::ResourceNotFound`] when missing.
    pub fn get_mut<T: Resource>(&mut self) -> Result<&mut T> {
        let entry = self
            .entries
            .get_mut(&TypeId::of::<T>())
            .ok_or(EcsError::ResourceNotFound(std::any::type_name::<T>()))?;
        let found = entry.type_name;
        entry
            .value
            .downcast_mut::<T>()
            .ok_or(EcsError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })
    }

    pub fn contains<T: Resource>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Take ownership of a resource. Handy for the take-use-reinsert pattern
    /// when a resource and the rest of the world are needed at the same time.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast::<T>().ok())
            .map(|b| *b)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! # Query — Visiting Entities by Component Set
//!
//! ```text
//! world.each::<(Position, Velocity)>(|world, entity, (pos, vel)| { ... })
//!
//! 1. Look up the store for every requested type. A missing store means
//!    nothing can match.
//! 2. Drive from the smallest store; probe the others for presence.
//! 3. Collect the matches into a snapshot Vec<Entity>.
//! 4. For each snapshotted entity still alive, clone its components and call
//!    the visitor with `&mut World`, so it can write values back.
//! ```
//!
//! Driving from the smallest store keeps the cost proportional to the matching
//! set rather than the entity count. The snapshot is what makes writes inside
//! the visitor safe: inserting, removing, spawning or despawning never changes
//! which entities the running `each` call visits.
//!
//! Items are owned clones, not references. A system that changes a component
//! writes the new value back with `insert_component`, which is the single
//! place a change is recorded.

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;

use super::component::{Component, ComponentStore};
use super::entity::Entity;
use super::world::World;
use crate::error::Result;

/// A set of component types fetched together.
///
/// Implemented for tuples of 1 to 8 [`Component`] types. For a single type
/// use a one-element tuple: `world.each::<(Health,)>(..)`.
pub trait Query {
    /// The values handed to the visitor for one entity.
    type Item;

    /// Component types an entity must have to match.
    fn type_ids() -> Vec<TypeId>;

    /// Clone this query's components off `entity`. `Ok(None)` if any is missing.
    fn fetch(world: &World, entity: Entity) -> Result<Option<Self::Item>>;
}

macro_rules! impl_query_tuple {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Query for ($($T,)+) {
            type Item = ($($T,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$T>()),+]
            }

            fn fetch(world: &World, entity: Entity) -> Result<Option<Self::Item>> {
                Ok(Some(($(
                    match world.get::<$T>(entity)? {
                        Some(value) => value.clone(),
                        None => return Ok(None),
                    },
                )+)))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);
impl_query_tuple!(A, B, C, D, E);
impl_query_tuple!(A, B, C, D, E, F);
impl_query_tuple!(A, B, C, D, E, F, G);
impl_query_tuple!(A, B, C, D, E, F, G, H);

/// Extra presence conditions that narrow a query without fetching values.
pub trait QueryFilter {
    /// Types that must be present. Also considered when picking the driver.
    fn required() -> Vec<TypeId> {
        Vec::new()
    }

    fn matches(world: &World, entity: Entity) -> bool;
}

/// Entity must have `T`.
pub struct With<T>(PhantomData<T>);

/// Entity must not have `T`.
pub struct Without<T>(PhantomData<T>);

impl<T: 'static> QueryFilter for With<T> {
    fn required() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn matches(world: &World, entity: Entity) -> bool {
        world.has_component::<T>(entity)
    }
}

impl<T: 'static> QueryFilter for Without<T> {
    fn matches(world: &World, entity: Entity) -> bool {
        !world.has_component::<T>(entity)
    }
}

impl QueryFilter for () {
    fn matches(_world: &World, _entity: Entity) -> bool {
        true
    }
}

macro_rules! impl_filter_tuple {
    ($($F:ident),+) => {
        impl<$($F: QueryFilter),+> QueryFilter for ($($F,)+) {
            fn required() -> Vec<TypeId> {
                let mut ids = Vec::new();
                $(ids.extend($F::required());)+
                ids
            }

            fn matches(world: &World, entity: Entity) -> bool {
                true $(&& $F::matches(world, entity))+
            }
        }
    };
}

impl_filter_tuple!(A);
impl_filter_tuple!(A, B);
impl_filter_tuple!(A, B, C);
impl_filter_tuple!(A, B, C, D);

/// Entities holding every type in `required`, driven from the smallest store.
pub(crate) fn candidates(
    stores: &HashMap<TypeId, ComponentStore>,
    required: &[TypeId],
) -> Vec<Entity> {
    let mut selected = Vec::with_capacity(required.len());
    for type_id in required {
        match stores.get(type_id) {
            Some(store) => selected.push(store),
            None => return Vec::new(),
        }
    }
    let Some(driver) = selected.iter().min_by_key(|store| store.len()) else {
        return Vec::new();
    };
    driver
        .entities()
        .iter()
        .copied()
        .filter(|&entity| selected.iter().all(|store| store.contains(entity)))
        .collect()
}

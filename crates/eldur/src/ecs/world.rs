//! # World — Entities, Components, Resources
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ World                                                │
//! │   allocator  : EntityAllocator   (index, generation) │
//! │   stores     : TypeId -> ComponentStore (sparse set) │
//! │   resources  : Resources         (TypeId -> value)   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The world is single-threaded and owned by the [`App`](crate::app::App).
//! Systems reach it through [`Context::world`](crate::context::Context).
//!
//! Operations on a dead entity are soft: `insert_component` returns `false`,
//! `get` returns `Ok(None)`, `despawn` returns `false`. Only genuine storage
//! corruption (a type mismatch) is reported as an error.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{Component, ComponentStore};
use super::entity::{Entity, EntityAllocator};
use super::query::{Query, QueryFilter, candidates};
use super::resource::{Resource, Resources};
use crate::error::Result;

/// The central container for all game state.
pub struct World {
    allocator: EntityAllocator,
    stores: HashMap<TypeId, ComponentStore>,
    resources: Resources,
    #[cfg(feature = "diagnostics")]
    spawned_this_frame: u32,
    #[cfg(feature = "diagnostics")]
    despawned_this_frame: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            stores: HashMap::new(),
            resources: Resources::new(),
            #[cfg(feature = "diagnostics")]
            spawned_this_frame: 0,
            #[cfg(feature = "diagnostics")]
            despawned_this_frame: 0,
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Insert a resource, replacing any existing value of the same type.
    pub fn insert_resource<T: Resource>(&mut self, value: T) {
        self.resources.insert(value);
    }

    /// Shared access to a resource.
    ///
    /// Fails with [`EcsError::ResourceNotFound`](crate::error::EcsError) if it
    /// was never inserted.
    pub fn resource<T: Resource>(&self) -> Result<&T> {
        self.resources.get::<T>()
    }

    /// Exclusive access to a resource.
    pub fn resource_mut<T: Resource>(&mut self) -> Result<&mut T> {
        self.resources.get_mut::<T>()
    }

    pub fn get_resource<T: Resource>(&self) -> Option<&T> {
        self.resources.get::<T>().ok()
    }

    pub fn get_resource_mut<T: Resource>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>().ok()
    }

    pub fn has_resource<T: Resource>(&self) -> bool {
        self.resources.contains::<T>()
    }

    pub fn remove_resource<T: Resource>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }

    // ── Entity lifecycle ─────────────────────────────────────────────

    /// Spawn an entity with no components.
    pub fn spawn_empty(&mut self) -> Entity {
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_frame += 1;
        }
        self.allocator.allocate()
    }

    /// Spawn an entity carrying a tuple of components.
    ///
    /// ```ignore
    /// let ball = world.spawn((Position::default(), Velocity { dx: 1.0, dy: 0.0 }));
    /// ```
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.spawn_empty();
        bundle.insert_into(self, entity);
        entity
    }

    /// Despawn an entity and drop all of its components.
    ///
    /// Returns `false` without doing anything if the entity is already dead,
    /// so despawning twice is safe.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.deallocate(entity) {
            log::debug!("ignoring despawn of dead entity {entity:?}");
            return false;
        }
        for store in self.stores.values_mut() {
            store.remove_entity(entity);
        }
        #[cfg(feature = "diagnostics")]
        {
            self.despawned_this_frame += 1;
        }
        true
    }

    /// Despawn every live entity. Resources are kept.
    pub fn despawn_all(&mut self) {
        for entity in self.allocator.alive() {
            self.allocator.deallocate(entity);
            #[cfg(feature = "diagnostics")]
            {
                self.despawned_this_frame += 1;
            }
        }
        for store in self.stores.values_mut() {
            store.clear();
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// All live entities, in slot order.
    pub fn entities(&self) -> Vec<Entity> {
        self.allocator.alive()
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach `component` to `entity`, overwriting any previous value of the
    /// same type. This is also how a changed component is written back.
    ///
    /// Returns `false` (no effect) if the entity is dead.
    pub fn insert_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        match self.try_insert_component(entity, component) {
            Ok(inserted) => inserted,
            // Stores are keyed by `TypeId::of::<T>()`; a mismatch means the
            // store map itself is corrupt.
            Err(err) => panic!("component store corrupt: {err}"),
        }
    }

    /// [`insert_component`](Self::insert_component), surfacing a store type
    /// mismatch as an error.
    pub fn try_insert_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<bool> {
        if !self.allocator.is_alive(entity) {
            log::debug!(
                "ignoring insert of `{}` on dead entity {entity:?}",
                std::any::type_name::<T>()
            );
            return Ok(false);
        }
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(ComponentStore::new::<T>)
            .insert(entity, component)?;
        Ok(true)
    }

    /// Detach and return a component. `None` if the entity is dead or never
    /// had one.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        match self.try_remove_component(entity) {
            Ok(value) => value,
            Err(err) => panic!("component store corrupt: {err}"),
        }
    }

    pub fn try_remove_component<T: Component>(&mut self, entity: Entity) -> Result<Option<T>> {
        if !self.allocator.is_alive(entity) {
            return Ok(None);
        }
        match self.stores.get_mut(&TypeId::of::<T>()) {
            Some(store) => store.remove::<T>(entity),
            None => Ok(None),
        }
    }

    /// Borrow a component. `Ok(None)` if the entity is dead or lacks it.
    pub fn get<T: 'static>(&self, entity: Entity) -> Result<Option<&T>> {
        if !self.allocator.is_alive(entity) {
            return Ok(None);
        }
        match self.stores.get(&TypeId::of::<T>()) {
            Some(store) => store.get::<T>(entity),
            None => Ok(None),
        }
    }

    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
            && self
                .stores
                .get(&TypeId::of::<T>())
                .is_some_and(|store| store.contains(entity))
    }

    /// Every entity that has a `T`.
    pub fn entities_with<T: 'static>(&self) -> Vec<Entity> {
        self.stores
            .get(&TypeId::of::<T>())
            .map(|store| store.entities().to_vec())
            .unwrap_or_default()
    }

    /// Number of entities holding a `T`.
    pub fn component_count<T: 'static>(&self) -> usize {
        self.stores
            .get(&TypeId::of::<T>())
            .map_or(0, ComponentStore::len)
    }

    /// Number of component types that have been stored at least once.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Short names of the stored component types with their population.
    pub fn store_sizes(&self) -> Vec<(&'static str, usize)> {
        let mut sizes: Vec<_> = self
            .stores
            .values()
            .map(|store| (store.type_name(), store.len()))
            .collect();
        sizes.sort_unstable();
        sizes
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Visit every entity that has all of `Q`'s components.
    ///
    /// The visitor receives `&mut World` plus cloned component values, so it
    /// may write values back, spawn, or despawn. The visited set is fixed when
    /// the call starts; entities that die (or lose a queried component) before
    /// their turn are skipped, and entities spawned by the visitor are not
    /// visited.
    ///
    /// ```ignore
    /// world.each::<(Position, Velocity)>(|world, entity, (pos, vel)| {
    ///     world.insert_component(entity, pos + vel);
    /// })?;
    /// ```
    pub fn each<Q: Query>(&mut self, mut f: impl FnMut(&mut World, Entity, Q::Item)) -> Result<()> {
        self.visit::<Q, ()>(|world, entity, item| {
            f(world, entity, item);
            Ok(())
        })
    }

    /// [`each`](Self::each) with an additional presence filter.
    ///
    /// ```ignore
    /// world.each_filtered::<(Transform,), (With<Player>, Without<Frozen>)>(|w, e, (t,)| { .. })?;
    /// ```
    pub fn each_filtered<Q: Query, F: QueryFilter>(
        &mut self,
        mut f: impl FnMut(&mut World, Entity, Q::Item),
    ) -> Result<()> {
        self.visit::<Q, F>(|world, entity, item| {
            f(world, entity, item);
            Ok(())
        })
    }

    /// [`each`](Self::each) with a fallible visitor. Stops at the first error.
    pub fn try_each<Q: Query>(
        &mut self,
        f: impl FnMut(&mut World, Entity, Q::Item) -> Result<()>,
    ) -> Result<()> {
        self.visit::<Q, ()>(f)
    }

    /// Collect `(entity, values)` for every match. A read-only snapshot.
    pub fn query<Q: Query>(&self) -> Result<Vec<(Entity, Q::Item)>> {
        self.query_filtered::<Q, ()>()
    }

    pub fn query_filtered<Q: Query, F: QueryFilter>(&self) -> Result<Vec<(Entity, Q::Item)>> {
        let mut out = Vec::new();
        for entity in self.snapshot::<Q, F>() {
            if let Some(item) = Q::fetch(self, entity)? {
                out.push((entity, item));
            }
        }
        Ok(out)
    }

    /// The match for a query expected to have exactly one result (the player,
    /// the camera). `None` when there are zero or several matches.
    pub fn single<Q: Query>(&self) -> Result<Option<(Entity, Q::Item)>> {
        let snapshot = self.snapshot::<Q, ()>();
        if snapshot.len() != 1 {
            if snapshot.len() > 1 {
                log::warn!(
                    "single::<{}> matched {} entities",
                    std::any::type_name::<Q>(),
                    snapshot.len()
                );
            }
            return Ok(None);
        }
        let entity = snapshot[0];
        Ok(Q::fetch(self, entity)?.map(|item| (entity, item)))
    }

    fn snapshot<Q: Query, F: QueryFilter>(&self) -> Vec<Entity> {
        let mut required = Q::type_ids();
        required.extend(F::required());
        let mut matched = candidates(&self.stores, &required);
        matched.retain(|&entity| F::matches(self, entity));
        matched
    }

    fn visit<Q: Query, F: QueryFilter>(
        &mut self,
        mut f: impl FnMut(&mut World, Entity, Q::Item) -> Result<()>,
    ) -> Result<()> {
        for entity in self.snapshot::<Q, F>() {
            if !self.allocator.is_alive(entity) {
                continue;
            }
            if let Some(item) = Q::fetch(self, entity)? {
                f(self, entity, item)?;
            }
        }
        Ok(())
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Slot statistics; resets the per-frame spawn/despawn counters.
    #[cfg(feature = "diagnostics")]
    pub(crate) fn take_entity_stats(&mut self) -> crate::diag::EntityPoolStats {
        let stats = crate::diag::EntityPoolStats {
            total_slots: self.allocator.total_slots(),
            free_count: self.allocator.free_count(),
            alive_count: self.allocator.alive_count(),
            spawned_this_frame: self.spawned_this_frame,
            despawned_this_frame: self.despawned_this_frame,
        };
        self.spawned_this_frame = 0;
        self.despawned_this_frame = 0;
        stats
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ── Bundles ──────────────────────────────────────────────────────────────

/// A group of components inserted together by [`World::spawn`].
///
/// Implemented for `()` and tuples of up to 8 components.
pub trait Bundle {
    fn insert_into(self, world: &mut World, entity: Entity);
}

impl Bundle for () {
    fn insert_into(self, _world: &mut World, _entity: Entity) {}
}

macro_rules! impl_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            #[allow(non_snake_case)]
            fn insert_into(self, world: &mut World, entity: Entity) {
                let ($($T,)+) = self;
                $(world.insert_component(entity, $T);)+
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

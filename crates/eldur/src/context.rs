//! Context — the per-system view of the app.
//!
//! [`Context`] bundles the ECS [`World`], the event bus, input state, and
//! frame timing into a single struct. Startup and update systems receive
//! `&mut Context`, giving them access to everything they need. A fresh
//! context is built for every system call; it borrows the app's state, it
//! never copies it.

use crate::ecs::event::{EventAccess, Events};
use crate::ecs::system::SystemId;
use crate::ecs::world::{Bundle, World};
use crate::ecs::{Component, Entity, Resource};
use crate::error::Result;
use crate::input::{CursorPosition, Input, KeyCode, MouseButton};
use crate::time::Time;

// ── InputState ──────────────────────────────────────────────────────────

/// Wraps keyboard and mouse input with convenience methods.
///
/// Access via [`Context::input`]; fed via [`App::input_mut`](crate::app::App::input_mut).
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    pub cursor: CursorPosition,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the key is currently held down.
    pub fn pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed(key)
    }

    /// Returns `true` if the key was pressed this frame.
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.keys.just_pressed(key)
    }

    /// Returns `true` if the key was released this frame.
    pub fn just_released(&self, key: KeyCode) -> bool {
        self.keys.just_released(key)
    }

    /// Returns `true` if the mouse button is currently held down.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse.pressed(button)
    }

    /// Returns `true` if the mouse button was pressed this frame.
    pub fn mouse_just_pressed(&self, button: MouseButton) -> bool {
        self.mouse.just_pressed(button)
    }

    /// Returns `true` if the mouse button was released this frame.
    pub fn mouse_just_released(&self, button: MouseButton) -> bool {
        self.mouse.just_released(button)
    }

    pub(crate) fn end_frame(&mut self) {
        self.keys.clear_just();
        self.mouse.clear_just();
    }
}

// ── Context ──────────────────────────────────────────────────────────────

/// The view of the app passed to every startup and update system.
///
/// # Example
///
/// ```ignore
/// fn setup(ctx: &mut Context) -> SystemResult {
///     ctx.spawn((Transform::default(), Paddle));
///     ctx.insert_resource(Score(0));
///     Ok(())
/// }
///
/// fn update(ctx: &mut Context) -> SystemResult {
///     let dt = ctx.delta();
///     if ctx.key_pressed(KeyCode::ArrowLeft) {
///         // move something
///     }
///     for hit in ctx.events.drain::<BrickHit>()? {
///         ctx.resource_mut::<Score>()?.0 += hit.points;
///     }
///     Ok(())
/// }
/// ```
pub struct Context<'a> {
    /// The ECS world containing all entities, components, and resources.
    pub world: &'a mut World,
    /// Event writers and readers. Readers are keyed by the running system.
    pub events: EventAccess<'a>,
    /// Frame timing (delta time, elapsed time, FPS).
    pub time: &'a Time,
    /// Keyboard, mouse and cursor state.
    pub input: &'a InputState,
    stop: &'a mut bool,
    system: SystemId,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        events: &'a mut Events,
        time: &'a Time,
        input: &'a InputState,
        stop: &'a mut bool,
        system: SystemId,
    ) -> Self {
        Self {
            world,
            events: EventAccess::new(events, system),
            time,
            input,
            stop,
            system,
        }
    }

    /// Spawn an entity carrying `bundle`, a tuple of components.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        self.world.spawn(bundle)
    }

    /// Create an empty entity. Returns an [`EntityBuilder`] for adding components.
    pub fn create(&mut self) -> EntityBuilder<'_> {
        let entity = self.world.spawn_empty();
        EntityBuilder {
            world: &mut *self.world,
            entity,
        }
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    pub fn resource<T: Resource>(&self) -> Result<&T> {
        self.world.resource::<T>()
    }

    pub fn resource_mut<T: Resource>(&mut self) -> Result<&mut T> {
        self.world.resource_mut::<T>()
    }

    pub fn insert_resource<T: Resource>(&mut self, value: T) {
        self.world.insert_resource(value);
    }

    /// Seconds since the previous frame.
    pub fn delta(&self) -> f32 {
        self.time.delta_secs()
    }

    /// Seconds since the app started.
    pub fn elapsed(&self) -> f32 {
        self.time.elapsed_secs()
    }

    /// Frames advanced so far (0 during startup).
    pub fn frame(&self) -> u64 {
        self.time.frame_count()
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.input.pressed(key)
    }

    pub fn key_just_pressed(&self, key: KeyCode) -> bool {
        self.input.just_pressed(key)
    }

    pub fn mouse_position(&self) -> CursorPosition {
        self.input.cursor
    }

    /// Ask the app to stop. The rest of this frame's systems still run.
    pub fn stop(&mut self) {
        if !*self.stop {
            log::info!("stop requested at frame {}", self.time.frame_count());
        }
        *self.stop = true;
    }

    pub fn stop_requested(&self) -> bool {
        *self.stop
    }

    /// Id of the system this context was built for.
    pub fn system_id(&self) -> SystemId {
        self.system
    }
}

// ── EntityBuilder ────────────────────────────────────────────────────────

/// Builder for adding components to a freshly created entity.
///
/// Returned by [`Context::create`]. Chain `.insert()` calls, then `.id()`.
///
/// # Example
///
/// ```ignore
/// let paddle = ctx.create()
///     .insert(Transform::from_xy(0.0, -250.0))
///     .insert(Paddle { speed: 400.0 })
///     .id();
/// ```
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityBuilder<'w> {
    /// Add a component to this entity.
    pub fn insert<T: Component>(self, component: T) -> Self {
        self.world.insert_component(self.entity, component);
        self
    }

    /// Get the entity ID.
    pub fn id(&self) -> Entity {
        self.entity
    }
}

//! # Sparse-Set ECS
//!
//! A small, single-threaded Entity Component System. Every component type has
//! its own sparse-set store, created on first insert, so new component types
//! need no registration.
//!
//! ## Module Overview
//!
//! - [`entity`] — Generational entity handles and the slot allocator
//! - [`component`] — Type-erased per-type storage (`Box<dyn Any>`)
//! - [`resource`] — Type-keyed singletons
//! - [`query`] — Component tuples and presence filters
//! - [`world`] — Central container (entities + components + resources)
//! - [`event`] — Double-buffered typed event channels
//! - [`system`] — System trait, stages, and the schedule runner

pub(crate) mod component;
pub mod entity;
pub mod event;
pub mod query;
pub mod resource;
pub mod system;
pub mod world;

pub use component::Component;
pub use entity::Entity;
pub use event::{EventReader, EventWriter, Events, ReaderId};
pub use query::{Query, QueryFilter, With, Without};
pub use resource::{Resource, Resources};
pub use system::{Schedule, Stage, System, SystemId, SystemResult};
pub use world::{Bundle, World};

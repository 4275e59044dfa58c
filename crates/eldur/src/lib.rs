//! # Eldur — Retained-Mode ECS Core
//!
//! A small entity-component-system runtime for headless simulations and
//! game logic: a [`World`](ecs::World) of generational entities and sparse
//! component stores, snapshot queries, staged systems with run conditions, a
//! double-buffered event bus, typed resources, and an [`App`](app::App) that
//! drives them frame by frame through plugins.
//!
//! The [`animation`] module adds tweens and keyframe clips that animate
//! [`Transform`](math::Transform) and [`Tint`](animation::Tint) components.
//!
//! Start with `use eldur::prelude::*` and build an [`App`](app::App).

pub mod animation;
pub mod app;
pub mod config;
pub mod context;
pub mod ecs;
pub mod error;
pub mod input;
pub mod math;
pub mod prelude;
pub mod time;

#[cfg(feature = "diagnostics")]
pub mod diag;

pub use error::{EcsError, Result};

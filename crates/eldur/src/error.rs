//! Error types shared by the world, scheduler, and animation modules.
//!
//! Only hard failures live here. Operations on stale entities and repeated
//! registrations are deliberately *soft*: they return `false`/`None` or
//! overwrite, because game code routinely despawns an entity and then tidies
//! up cached handles that may already be gone.

use thiserror::Error;

/// Errors surfaced by the engine core.
///
/// A system that returns one of these terminates [`App::run`](crate::app::App::run).
#[derive(Error, Debug)]
pub enum EcsError {
    /// `resource::<T>()` was called before any `insert_resource::<T>()`.
    #[error("resource `{0}` not found; insert it before reading it")]
    ResourceNotFound(&'static str),

    /// A type-erased store held a value of a different concrete type than the
    /// one requested. Indicates a bug in the code that fills the store.
    #[error("type mismatch: expected `{expected}`, store holds `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Invalid JSON for an [`AppConfig`](crate::config::AppConfig) or an
    /// animation clip.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Keyframe data that cannot be sampled (unsorted times, mixed value kinds).
    #[error("invalid animation data: {0}")]
    Animation(String),

    /// Failure raised by user system code.
    #[error("system error: {0}")]
    System(String),
}

impl EcsError {
    /// Convenience constructor for user systems.
    pub fn system(message: impl Into<String>) -> Self {
        Self::System(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = EcsError> = std::result::Result<T, E>;

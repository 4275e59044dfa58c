//! Convenience re-exports — `use eldur::prelude::*` for the common items.

// Core
pub use crate::app::{App, AppState, Plugin, Plugins};
pub use crate::config::AppConfig;
pub use crate::context::{Context, EntityBuilder, InputState};
pub use crate::ecs::{
    Bundle, Entity, EventReader, EventWriter, Events, ReaderId, Resources, Stage, SystemId,
    SystemResult, With, Without, World,
};
pub use crate::error::{EcsError, Result};
pub use crate::input::{CursorPosition, Input, KeyCode, MouseButton};
pub use crate::math::{Color, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::time::{Time, Timer, TimerMode};

// Animation
pub use crate::animation::{
    AnimValue, AnimationClip, AnimationPlayer, AnimationPlugin, EaseFunction, Keyframe, Lerp,
    PropertyTween, RepeatMode, Tint, Tween, TweenTarget,
};

// Diagnostics (feature-gated)
#[cfg(feature = "diagnostics")]
pub use crate::diag::{DiagnosticsPlugin, FrameDiagnostics};

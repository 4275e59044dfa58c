//! # Animation — Tweens and Keyframe Clips
//!
//! Two complementary tools for animating values over time:
//!
//! ## Tweens
//!
//! [`Tween<T>`] maps elapsed time through an [`EaseFunction`] to a value
//! between `from` and `to`. Any [`Lerp`] type works: `f32`, glam vectors,
//! quaternions and [`Color`]. [`RepeatMode`] decides what happens past the
//! end:
//!
//! ```text
//! progress   Once        Loop        PingPong
//!   1.0 ┤   ╭────       ╭╮ ╭╮        ╭╮
//!       │  ╱           ╱ │╱ │       ╱  ╲  ╱
//!   0.0 ┼─╯           ╱  ╯  ╯      ╱    ╲╱
//!       0   d   2d    0  d  2d     0  d  2d
//! ```
//!
//! ## Keyframe Clips
//!
//! An [`AnimationClip`] holds named tracks, each a time-sorted list of
//! [`Keyframe`]s. Sampling finds the bracketing pair and eases into the later
//! keyframe with that keyframe's easing. [`AnimationPlayer`] is a component
//! that advances a clip's local time and wraps it per the clip's repeat mode.
//!
//! ## Systems
//!
//! [`AnimationPlugin`] drives [`PropertyTween`] and [`AnimationPlayer`]
//! components each frame, writing results into [`Transform`] and [`Tint`]
//! with the usual fetch, modify, `insert_component` pattern.

use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::app::{App, Plugin};
use crate::context::Context;
use crate::ecs::system::{Stage, SystemResult};
use crate::ecs::{Entity, World};
use crate::error::{EcsError, Result};
use crate::math::{Color, Quat, Transform, Vec2, Vec3, Vec4};

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Standard easing curves.
///
/// Each variant maps `t` in \[0, 1\] to an eased value with `f(0) = 0` and
/// `f(1) = 1`. Back and elastic curves overshoot in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseFunction {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    SineIn,
    SineOut,
    SineInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    BackIn,
    BackOut,
    BackInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

const BACK_C1: f32 = 1.701_58;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = 2.0 * PI / 3.0;
const ELASTIC_C5: f32 = 2.0 * PI / 4.5;

impl EaseFunction {
    /// Evaluate the easing function at `t` (clamped to \[0, 1\]).
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::CubicIn => t * t * t,
            Self::CubicOut => 1.0 - (1.0 - t).powi(3),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::QuartIn => t.powi(4),
            Self::QuartOut => 1.0 - (1.0 - t).powi(4),
            Self::QuartInOut => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Self::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Self::SineOut => (t * PI / 2.0).sin(),
            Self::SineInOut => -(PI * t).cos() / 2.0 + 0.5,
            Self::ExpoIn => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Self::ExpoOut => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Self::ExpoInOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::BackIn => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Self::BackOut => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
            Self::BackInOut => {
                if t < 0.5 {
                    (2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }
            Self::ElasticIn => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Self::ElasticOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Self::ElasticInOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
                } else {
                    2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin() / 2.0
                        + 1.0
                }
            }
            Self::BounceIn => 1.0 - bounce_out(1.0 - t),
            Self::BounceOut => bounce_out(t),
            Self::BounceInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984_375
    }
}

// ---------------------------------------------------------------------------
// Repeat and interpolation
// ---------------------------------------------------------------------------

/// What happens when time runs past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Hold the final value.
    #[default]
    Once,
    /// Jump back to the start. Exactly at the end counts as the start.
    Loop,
    /// Run backwards to the start, then forwards again.
    PingPong,
}

impl RepeatMode {
    /// Length of one full cycle for a run of `duration`.
    fn period(self, duration: f32) -> f32 {
        match self {
            Self::Once | Self::Loop => duration,
            Self::PingPong => 2.0 * duration,
        }
    }

    /// Map raw elapsed time to normalized progress in \[0, 1\].
    pub fn progress(self, time: f32, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 1.0;
        }
        let time = time.max(0.0);
        match self {
            Self::Once => (time / duration).min(1.0),
            Self::Loop => (time % duration) / duration,
            Self::PingPong => {
                let phase = (time % (2.0 * duration)) / duration;
                if phase <= 1.0 { phase } else { 2.0 - phase }
            }
        }
    }

    /// Fold an ever-growing clock back into one period so long runs keep
    /// their precision. Progress is unchanged.
    fn fold(self, time: f32, duration: f32) -> f32 {
        match self {
            Self::Once => time.min(duration.max(0.0)),
            Self::Loop | Self::PingPong => {
                let period = self.period(duration);
                if period > 0.0 { time % period } else { 0.0 }
            }
        }
    }
}

/// Types that can be interpolated.
pub trait Lerp: Copy {
    /// `self` at `t = 0`, `to` at `t = 1`. `t` may leave \[0, 1\] for
    /// overshooting curves.
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(self, to: Self, t: f32) -> Self {
        Vec2::lerp(self, to, t)
    }
}

impl Lerp for Vec3 {
    fn lerp(self, to: Self, t: f32) -> Self {
        Vec3::lerp(self, to, t)
    }
}

impl Lerp for Vec4 {
    fn lerp(self, to: Self, t: f32) -> Self {
        Vec4::lerp(self, to, t)
    }
}

impl Lerp for Quat {
    fn lerp(self, to: Self, t: f32) -> Self {
        self.slerp(to, t)
    }
}

impl Lerp for Color {
    fn lerp(self, to: Self, t: f32) -> Self {
        Color::from_vec4(self.to_vec4().lerp(to.to_vec4(), t))
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// Interpolates from one value to another over `duration` seconds.
///
/// ```ignore
/// let mut fade = Tween::new(1.0, 0.0, 0.5, EaseFunction::QuadOut);
/// let alpha = fade.tick(ctx.delta());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tween<T: Lerp> {
    pub from: T,
    pub to: T,
    pub duration: f32,
    pub ease: EaseFunction,
    pub repeat: RepeatMode,
    elapsed: f32,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, duration: f32, ease: EaseFunction) -> Self {
        Self {
            from,
            to,
            duration,
            ease,
            repeat: RepeatMode::Once,
            elapsed: 0.0,
        }
    }

    /// Set the repeat mode (builder pattern).
    pub fn with_repeat(mut self, repeat: RepeatMode) -> Self {
        self.repeat = repeat;
        self
    }

    /// Value `time` seconds after the start. Does not touch the tween's clock.
    pub fn sample_at(&self, time: f32) -> T {
        let progress = self.repeat.progress(time, self.duration);
        self.from.lerp(self.to, self.ease.sample(progress))
    }

    /// Advance the clock by `dt` seconds and return the new value.
    pub fn tick(&mut self, dt: f32) -> T {
        let next = self.elapsed + dt.max(0.0);
        // `fold` keeps looping clocks small. An exact end lands on 0, which is
        // already the value Loop reports at the end.
        self.elapsed = self.repeat.fold(next, self.duration);
        self.value()
    }

    /// Value at the tween's own clock.
    pub fn value(&self) -> T {
        self.sample_at(self.elapsed)
    }

    /// Seconds into the current cycle.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Normalized, un-eased progress of the current cycle.
    pub fn progress(&self) -> f32 {
        self.repeat.progress(self.elapsed, self.duration)
    }

    /// Only `Once` tweens finish.
    pub fn is_finished(&self) -> bool {
        self.repeat == RepeatMode::Once && self.elapsed >= self.duration
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Keyframe clips
// ---------------------------------------------------------------------------

/// A keyframe value. All keyframes of one track share a variant.
///
/// In JSON: a number, a `[x, y]` / `[x, y, z]` array, or an
/// `{ "r", "g", "b", "a" }` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Color(Color),
}

impl AnimValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Color(_) => "color",
        }
    }

    /// Interpolate toward `to`. Mismatched kinds hold `self`.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        match (self, to) {
            (Self::Float(a), Self::Float(b)) => Self::Float(Lerp::lerp(a, b, t)),
            (Self::Vec2(a), Self::Vec2(b)) => Self::Vec2(Lerp::lerp(a, b, t)),
            (Self::Vec3(a), Self::Vec3(b)) => Self::Vec3(Lerp::lerp(a, b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(Lerp::lerp(a, b, t)),
            (a, _) => a,
        }
    }

    pub fn as_f32(self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec2(self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3(self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(self) -> Option<Color> {
        match self {
            Self::Color(v) => Some(v),
            _ => None,
        }
    }
}

/// One point on a track. `ease` shapes the segment that ends here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: AnimValue,
    #[serde(default)]
    pub ease: EaseFunction,
}

impl Keyframe {
    pub fn new(time: f32, value: AnimValue) -> Self {
        Self {
            time,
            value,
            ease: EaseFunction::Linear,
        }
    }

    pub fn eased(mut self, ease: EaseFunction) -> Self {
        self.ease = ease;
        self
    }
}

/// Named tracks of keyframes played by an [`AnimationPlayer`].
///
/// ```json
/// {
///   "name": "pulse",
///   "repeat": "ping_pong",
///   "tracks": {
///     "scale": [
///       { "time": 0.0, "value": 1.0 },
///       { "time": 0.5, "value": 1.5, "ease": "quad_out" }
///     ]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub repeat: RepeatMode,
    /// Playback length. Extended to the last keyframe if shorter.
    #[serde(default)]
    duration: f32,
    tracks: BTreeMap<String, Vec<Keyframe>>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repeat: RepeatMode::Once,
            duration: 0.0,
            tracks: BTreeMap::new(),
        }
    }

    /// Parse and validate a clip.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut clip: AnimationClip = serde_json::from_str(json)?;
        let tracks = std::mem::take(&mut clip.tracks);
        for (name, keyframes) in tracks {
            clip.add_track(name, keyframes)?;
        }
        Ok(clip)
    }

    pub fn with_repeat(mut self, repeat: RepeatMode) -> Self {
        self.repeat = repeat;
        self
    }

    /// Add a track (builder pattern). See [`add_track`](Self::add_track).
    pub fn with_track(mut self, name: impl Into<String>, keyframes: Vec<Keyframe>) -> Result<Self> {
        self.add_track(name, keyframes)?;
        Ok(self)
    }

    /// Add or replace a track. Keyframes must be non-empty, sorted by time,
    /// and share one value kind.
    pub fn add_track(&mut self, name: impl Into<String>, keyframes: Vec<Keyframe>) -> Result<()> {
        let name = name.into();
        let Some(first) = keyframes.first() else {
            return Err(EcsError::Animation(format!("track `{name}` has no keyframes")));
        };
        if let Some(bad) = keyframes.iter().find(|k| !k.time.is_finite() || k.time < 0.0) {
            return Err(EcsError::Animation(format!(
                "track `{name}` has a keyframe at invalid time {}",
                bad.time
            )));
        }
        for pair in keyframes.windows(2) {
            if !(pair[0].time <= pair[1].time) {
                return Err(EcsError::Animation(format!(
                    "track `{name}`: keyframe at {} comes after {}",
                    pair[1].time, pair[0].time
                )));
            }
        }
        if let Some(odd) = keyframes.iter().find(|k| k.value.kind() != first.value.kind()) {
            return Err(EcsError::Animation(format!(
                "track `{name}` mixes {} and {} keyframes",
                first.value.kind(),
                odd.value.kind()
            )));
        }
        let end = keyframes.last().map_or(0.0, |k| k.time);
        self.duration = self.duration.max(end);
        self.tracks.insert(name, keyframes);
        Ok(())
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn track_names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    /// Value of `track` at `time` (seconds, not wrapped). Clamps to the first
    /// and last keyframes outside their range.
    pub fn sample(&self, track: &str, time: f32) -> Option<AnimValue> {
        let keys = self.tracks.get(track)?;
        let first = keys.first()?;
        let last = keys.last()?;
        if time.is_nan() || time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }
        let next = keys.partition_point(|k| k.time <= time);
        let (Some(a), Some(b)) = (next.checked_sub(1).and_then(|i| keys.get(i)), keys.get(next))
        else {
            return Some(first.value);
        };
        let span = b.time - a.time;
        let t = if span > 0.0 { (time - a.time) / span } else { 1.0 };
        Some(a.value.lerp(b.value, b.ease.sample(t)))
    }
}

/// Component: plays an [`AnimationClip`] on an entity.
///
/// Clips are shared through an `Arc`, so many players can run the same clip.
/// Track names the [`AnimationPlugin`] applies: `translation`,
/// `translation.x|y|z`, `scale`, `rotation` (Z radians), `color`, `alpha`.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    clip: Arc<AnimationClip>,
    /// Raw clock, folded per repeat mode.
    clock: f32,
    /// Playback speed multiplier (1.0 = normal).
    pub speed: f32,
    paused: bool,
}

impl AnimationPlayer {
    pub fn new(clip: impl Into<Arc<AnimationClip>>) -> Self {
        Self {
            clip: clip.into(),
            clock: 0.0,
            speed: 1.0,
            paused: false,
        }
    }

    /// Set playback speed multiplier (builder pattern).
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Advance by `dt` seconds of real time.
    pub fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let next = (self.clock + dt * self.speed).max(0.0);
        self.clock = self.clip.repeat.fold(next, self.clip.duration);
    }

    /// Clip-local time in \[0, duration\], after wrapping or reflecting.
    pub fn time(&self) -> f32 {
        self.clip.repeat.progress(self.clock, self.clip.duration) * self.clip.duration
    }

    pub fn sample_property(&self, name: &str) -> Option<AnimValue> {
        self.clip.sample(name, self.time())
    }

    /// Every track sampled at the current time.
    pub fn sample_all(&self) -> Vec<(&str, AnimValue)> {
        let time = self.time();
        self.clip
            .track_names()
            .filter_map(|name| Some((name, self.clip.sample(name, time)?)))
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.clip.repeat == RepeatMode::Once && self.clock >= self.clip.duration
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Replace the clip and restart playback.
    pub fn play(&mut self, clip: impl Into<Arc<AnimationClip>>) {
        self.clip = clip.into();
        self.clock = 0.0;
    }

    pub fn restart(&mut self) {
        self.clock = 0.0;
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }
}

// ---------------------------------------------------------------------------
// Components driven by the plugin
// ---------------------------------------------------------------------------

/// Component: color multiplier a renderer would apply to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tint(pub Color);

/// What property a [`PropertyTween`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TweenTarget {
    TranslationX,
    TranslationY,
    TranslationZ,
    ScaleUniform,
    /// Z-axis rotation in radians (2D rotation).
    Rotation,
    ColorR,
    ColorG,
    ColorB,
    ColorA,
}

impl TweenTarget {
    fn apply_transform(self, value: f32, transform: &mut Transform) -> bool {
        match self {
            Self::TranslationX => transform.translation.x = value,
            Self::TranslationY => transform.translation.y = value,
            Self::TranslationZ => transform.translation.z = value,
            Self::ScaleUniform => transform.scale = Vec3::splat(value),
            Self::Rotation => transform.rotation = Quat::from_rotation_z(value),
            _ => return false,
        }
        true
    }

    fn apply_color(self, value: f32, color: &mut Color) -> bool {
        match self {
            Self::ColorR => color.r = value,
            Self::ColorG => color.g = value,
            Self::ColorB => color.b = value,
            Self::ColorA => color.a = value,
            _ => return false,
        }
        true
    }
}

/// Component: tweens one scalar property of the entity's [`Transform`] or
/// [`Tint`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTween {
    pub target: TweenTarget,
    pub tween: Tween<f32>,
}

impl PropertyTween {
    pub fn new(target: TweenTarget, tween: Tween<f32>) -> Self {
        Self { target, tween }
    }
}

/// Write `value` into the entity's Transform or Tint. Entities without the
/// matching component are left alone.
fn write_scalar(world: &mut World, entity: Entity, target: TweenTarget, value: f32) -> Result<()> {
    if let Some(mut transform) = world.get::<Transform>(entity)?.copied() {
        if target.apply_transform(value, &mut transform) {
            world.insert_component(entity, transform);
            return Ok(());
        }
    }
    if let Some(Tint(mut color)) = world.get::<Tint>(entity)?.copied() {
        if target.apply_color(value, &mut color) {
            world.insert_component(entity, Tint(color));
        }
    }
    Ok(())
}

fn apply_track(name: &str, value: AnimValue, transform: &mut Transform) -> bool {
    match (name, value) {
        ("translation", AnimValue::Vec3(v)) => transform.translation = v,
        ("translation", AnimValue::Vec2(v)) => {
            transform.translation.x = v.x;
            transform.translation.y = v.y;
        }
        ("translation.x", AnimValue::Float(v)) => transform.translation.x = v,
        ("translation.y", AnimValue::Float(v)) => transform.translation.y = v,
        ("translation.z", AnimValue::Float(v)) => transform.translation.z = v,
        ("scale", AnimValue::Float(v)) => transform.scale = Vec3::splat(v),
        ("scale", AnimValue::Vec2(v)) => transform.scale = v.extend(transform.scale.z),
        ("scale", AnimValue::Vec3(v)) => transform.scale = v,
        ("rotation", AnimValue::Float(v)) => transform.rotation = Quat::from_rotation_z(v),
        _ => return false,
    }
    true
}

fn apply_tint_track(name: &str, value: AnimValue, color: &mut Color) -> bool {
    match (name, value) {
        ("color", AnimValue::Color(c)) => *color = c,
        ("alpha", AnimValue::Float(a)) => color.a = a,
        _ => return false,
    }
    true
}

/// System: tick every [`PropertyTween`] and write its value.
pub fn advance_property_tweens(ctx: &mut Context<'_>) -> SystemResult {
    let dt = ctx.delta();
    ctx.world
        .try_each::<(PropertyTween,)>(|world, entity, (mut property,)| {
            if property.tween.is_finished() {
                return Ok(());
            }
            let value = property.tween.tick(dt);
            write_scalar(world, entity, property.target, value)?;
            world.insert_component(entity, property);
            Ok(())
        })
}

/// System: advance every [`AnimationPlayer`] and apply its tracks.
pub fn advance_animation_players(ctx: &mut Context<'_>) -> SystemResult {
    let dt = ctx.delta();
    ctx.world
        .try_each::<(AnimationPlayer,)>(|world, entity, (mut player,)| {
            player.advance(dt);
            let samples = player.sample_all();

            if let Some(mut transform) = world.get::<Transform>(entity)?.copied() {
                let mut changed = false;
                for &(name, value) in &samples {
                    changed |= apply_track(name, value, &mut transform);
                }
                if changed {
                    world.insert_component(entity, transform);
                }
            }
            if let Some(Tint(mut color)) = world.get::<Tint>(entity)?.copied() {
                let mut changed = false;
                for &(name, value) in &samples {
                    changed |= apply_tint_track(name, value, &mut color);
                }
                if changed {
                    world.insert_component(entity, Tint(color));
                }
            }

            world.insert_component(entity, player);
            Ok(())
        })
}

// ── Plugin ───────────────────────────────────────────────────────────

/// Plugin: registers [`advance_property_tweens`] and
/// [`advance_animation_players`] in [`Stage::PostUpdate`], after gameplay
/// systems have had a chance to add or change animations.
pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_system(Stage::PostUpdate, advance_property_tweens)
            .add_system(Stage::PostUpdate, advance_animation_players);
    }
}

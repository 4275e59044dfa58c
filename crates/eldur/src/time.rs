//! Frame timing, delta time, and timers.
//!
//! The [`Time`] value is advanced by the [`App`](crate::app::App) at the start
//! of each frame. Systems read it through [`Context::time`](crate::context::Context)
//! to get the frame delta and the total elapsed time.
//!
//! With [`AppConfig::fixed_delta`](crate::config::AppConfig) set, every frame
//! advances by exactly that amount, which makes runs reproducible.

use std::time::{Duration, Instant};

/// Frame timing. Owned by the app and lent to every system.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    /// When the current frame started (wall clock).
    frame_start: Instant,
    /// Duration of the previous frame.
    delta: Duration,
    /// Total time since app startup.
    elapsed: Duration,
    /// Frame counter.
    frame_count: u64,
    /// When set, every frame advances by this much instead of wall time.
    fixed: Option<Duration>,
}

impl Time {
    pub fn new() -> Self {
        Self {
            frame_start: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed: None,
        }
    }

    /// A clock that always advances by `step`.
    pub fn fixed(step: Duration) -> Self {
        Self {
            fixed: Some(step),
            ..Self::new()
        }
    }

    /// Call at the start of each frame to update timing.
    pub(crate) fn advance(&mut self) {
        let now = Instant::now();
        let delta = self.fixed.unwrap_or(now - self.frame_start);
        self.frame_start = now;
        self.advance_by(delta);
    }

    /// Step the clock by an explicit amount.
    pub fn advance_by(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Restart wall-clock measurement without counting a frame. Used after
    /// startup so the first frame's delta excludes setup time.
    pub(crate) fn reset_frame_start(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds (f32), the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total elapsed time since app start.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total elapsed time in seconds (f32).
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames advanced so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

// ── Timer ───────────────────────────────────────────────────────────────

/// Whether a [`Timer`] fires once or keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Once,
    Repeating,
}

/// Counts elapsed time toward a duration.
///
/// ```ignore
/// struct SpawnTimer(Timer);
///
/// fn spawn_enemies(ctx: &mut Context) -> SystemResult {
///     let dt = ctx.time.delta();
///     if ctx.resource_mut::<SpawnTimer>()?.0.tick(dt).just_finished() {
///         ctx.spawn((Enemy,));
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    duration: Duration,
    elapsed: Duration,
    mode: TimerMode,
    finished: bool,
    times_finished_this_tick: u32,
    paused: bool,
}

impl Timer {
    pub fn new(duration: Duration, mode: TimerMode) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            mode,
            finished: false,
            times_finished_this_tick: 0,
            paused: false,
        }
    }

    /// Negative and NaN durations become zero; durations too large for a
    /// [`Duration`] (including infinity) never finish.
    pub fn from_seconds(seconds: f32, mode: TimerMode) -> Self {
        let duration = Duration::try_from_secs_f32(seconds.max(0.0)).unwrap_or(Duration::MAX);
        Self::new(duration, mode)
    }

    /// Advance by `delta`. A repeating timer may finish several times in one
    /// tick if `delta` spans more than one period.
    pub fn tick(&mut self, delta: Duration) -> &Self {
        self.times_finished_this_tick = 0;
        if self.paused {
            return self;
        }
        if self.mode == TimerMode::Once && self.finished {
            return self;
        }

        self.elapsed += delta;
        if self.elapsed < self.duration {
            return self;
        }

        match self.mode {
            TimerMode::Once => {
                self.elapsed = self.duration;
                self.finished = true;
                self.times_finished_this_tick = 1;
            }
            TimerMode::Repeating => {
                self.finished = true;
                if self.duration.is_zero() {
                    self.times_finished_this_tick = 1;
                    self.elapsed = Duration::ZERO;
                } else {
                    let periods = self.elapsed.as_nanos() / self.duration.as_nanos();
                    self.times_finished_this_tick = u32::try_from(periods).unwrap_or(u32::MAX);
                    let rem = self.elapsed.as_nanos() % self.duration.as_nanos();
                    self.elapsed = Duration::from_nanos(rem as u64);
                }
            }
        }
        self
    }

    /// `true` if the last tick reached the duration.
    pub fn just_finished(&self) -> bool {
        self.times_finished_this_tick > 0
    }

    pub fn times_finished_this_tick(&self) -> u32 {
        self.times_finished_this_tick
    }

    /// A `Once` timer stays finished; a repeating timer reports whether it has
    /// ever completed a period.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Progress through the current period in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.finished = false;
        self.times_finished_this_tick = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fixed_clock_is_deterministic() {
        let mut time = Time::fixed(ms(16));
        time.advance();
        time.advance();
        assert_eq!(time.delta(), ms(16));
        assert_eq!(time.elapsed(), ms(32));
        assert_eq!(time.frame_count(), 2);
        assert!(time.is_fixed());
    }

    #[test]
    fn fps_from_delta() {
        let mut time = Time::new();
        assert_eq!(time.fps(), 0.0);
        time.advance_by(ms(500));
        assert!((time.fps() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn once_timer_fires_a_single_time() {
        let mut timer = Timer::new(ms(100), TimerMode::Once);
        assert!(!timer.tick(ms(60)).just_finished());
        assert!(timer.tick(ms(60)).just_finished());
        assert!(!timer.tick(ms(60)).just_finished());
        assert!(timer.finished());
        assert_eq!(timer.fraction(), 1.0);
    }

    #[test]
    fn repeating_timer_counts_every_period() {
        let mut timer = Timer::new(ms(100), TimerMode::Repeating);
        assert_eq!(timer.tick(ms(250)).times_finished_this_tick(), 2);
        assert_eq!(timer.elapsed(), ms(50));
        assert_eq!(timer.tick(ms(10)).times_finished_this_tick(), 0);
        assert_eq!(timer.tick(ms(40)).times_finished_this_tick(), 1);
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn same_deltas_same_firings() {
        let deltas = [ms(16), ms(17), ms(33), ms(8), ms(70)];
        let run = || {
            let mut timer = Timer::new(ms(50), TimerMode::Repeating);
            deltas
                .iter()
                .map(|&d| timer.tick(d).times_finished_this_tick())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn paused_timer_does_not_advance() {
        let mut timer = Timer::from_seconds(1.0, TimerMode::Once);
        timer.pause();
        timer.tick(Duration::from_secs(2));
        assert!(!timer.finished());
        timer.unpause();
        timer.reset();
        assert_eq!(timer.remaining(), Duration::from_secs(1));
    }

    #[test]
    fn out_of_range_seconds_do_not_panic() {
        let mut endless = Timer::from_seconds(f32::INFINITY, TimerMode::Repeating);
        assert_eq!(endless.duration(), Duration::MAX);
        assert!(!endless.tick(Duration::from_secs(3600)).just_finished());

        let instant = Timer::from_seconds(-2.0, TimerMode::Once);
        assert_eq!(instant.duration(), Duration::ZERO);
        let nan = Timer::from_seconds(f32::NAN, TimerMode::Once);
        assert_eq!(nan.duration(), Duration::ZERO);
    }
}

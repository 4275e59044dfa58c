//! App builder, frame loop, and plugin system.
//!
//! The [`App`] owns the [`World`], the event bus, the clock and the input
//! state. Register plugins, resources and systems, then call
//! [`run()`](App::run) or step frames yourself with [`update()`](App::update).
//!
//! ```text
//! Idle ──run()/update()──▶ Running ──stop / frame_limit──▶ Stopped
//!          │
//!          └─ startup systems, once
//!
//! every frame:  time.advance → events.update → First..Last → input.end_frame
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use eldur::prelude::*;
//!
//! fn main() -> eldur::Result<()> {
//!     env_logger::init();
//!     App::new()
//!         .add_plugins(ScorePlugin)
//!         .insert_resource(Score(0))
//!         .add_startup_system(setup)
//!         .add_update_system(move_ball)
//!         .run()
//! }
//! ```

use std::time::Instant;

use crate::config::AppConfig;
use crate::context::{Context, InputState};
use crate::ecs::event::{Event, Events};
use crate::ecs::system::{FrameData, Schedule, Stage, SystemId, SystemResult};
use crate::ecs::{Resource, World};
use crate::error::Result;
use crate::time::Time;

/// A plugin can add resources, systems, events, and other plugins to the app.
///
/// `build` runs once per [`App::add_plugins`] call. Adding the same plugin
/// twice builds it twice.
///
/// ```ignore
/// pub struct ScorePlugin;
///
/// impl Plugin for ScorePlugin {
///     fn build(&self, app: &mut App) {
///         app.insert_resource(Score(0))
///             .add_event::<BrickHit>()
///             .add_update_system(tally_score);
///     }
/// }
/// ```
pub trait Plugin {
    fn build(&self, app: &mut App);

    /// Used in logs and to detect repeated additions.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// One plugin or a tuple of plugins, accepted by [`App::add_plugins`].
pub trait Plugins {
    fn add_to(self, app: &mut App);
}

impl<P: Plugin> Plugins for P {
    fn add_to(self, app: &mut App) {
        app.add_plugin(self);
    }
}

macro_rules! impl_plugins_tuple {
    ($($P:ident),+) => {
        impl<$($P: Plugins),+> Plugins for ($($P,)+) {
            #[allow(non_snake_case)]
            fn add_to(self, app: &mut App) {
                let ($($P,)+) = self;
                $($P.add_to(app);)+
            }
        }
    };
}

impl_plugins_tuple!(A);
impl_plugins_tuple!(A, B);
impl_plugins_tuple!(A, B, C);
impl_plugins_tuple!(A, B, C, D);
impl_plugins_tuple!(A, B, C, D, E);
impl_plugins_tuple!(A, B, C, D, E, F);
impl_plugins_tuple!(A, B, C, D, E, F, G);
impl_plugins_tuple!(A, B, C, D, E, F, G, H);

/// Lifecycle of an [`App`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Running,
    Stopped,
}

/// The app builder and frame loop.
pub struct App {
    world: World,
    events: Events,
    time: Time,
    input: InputState,
    config: AppConfig,
    startup: Schedule,
    schedule: Schedule,
    state: AppState,
    stop_requested: bool,
    started: bool,
    plugins: Vec<String>,
    next_system_id: u32,
}

impl App {
    /// Create an app with an empty world, default config and no systems.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let time = config.fixed_step().map_or_else(Time::new, Time::fixed);
        Self {
            world: World::new(),
            events: Events::new(),
            time,
            input: InputState::new(),
            config,
            startup: Schedule::new(),
            schedule: Schedule::new(),
            state: AppState::Idle,
            stop_requested: false,
            started: false,
            plugins: Vec::new(),
            next_system_id: 0,
        }
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Insert a resource into the world, replacing any previous value.
    pub fn insert_resource<T: Resource>(&mut self, value: T) -> &mut Self {
        self.world.insert_resource(value);
        self
    }

    /// Declare an event type up front. Sending also creates the channel, so
    /// this is optional; declaring twice is harmless.
    pub fn add_event<T: Event>(&mut self) -> &mut Self {
        self.events.register::<T>();
        self
    }

    /// Add a system that runs once, before the first frame.
    pub fn add_startup_system<F>(&mut self, system: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> SystemResult + 'static,
    {
        let id = self.next_id();
        self.startup.add_system(id, Stage::Update, None, system);
        self
    }

    /// Add a system that runs every frame in [`Stage::Update`].
    pub fn add_update_system<F>(&mut self, system: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> SystemResult + 'static,
    {
        self.add_system(Stage::Update, system)
    }

    /// Add a system that runs every frame in `stage`.
    pub fn add_system<F>(&mut self, stage: Stage, system: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> SystemResult + 'static,
    {
        let id = self.next_id();
        self.schedule.add_system(id, stage, None, system);
        self
    }

    /// Add a system that runs in `stage` on frames where `condition` holds.
    pub fn add_system_if<C, F>(&mut self, stage: Stage, condition: C, system: F) -> &mut Self
    where
        C: Fn(&World) -> bool + 'static,
        F: FnMut(&mut Context<'_>) -> SystemResult + 'static,
    {
        let id = self.next_id();
        self.schedule
            .add_system(id, stage, Some(Box::new(condition)), system);
        self
    }

    /// Apply a plugin, or a tuple of plugins in order.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to(self);
        self
    }

    fn add_plugin<P: Plugin>(&mut self, plugin: P) {
        let name = plugin.name().to_string();
        if self.plugins.contains(&name) {
            log::debug!("plugin `{name}` added again; building it again");
        } else {
            log::debug!("building plugin `{name}`");
            self.plugins.push(name);
        }
        plugin.build(self);
    }

    fn next_id(&mut self) -> SystemId {
        let id = SystemId(self.next_system_id);
        self.next_system_id += 1;
        id
    }

    // ── Access ───────────────────────────────────────────────────────

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }

    /// Where a window or test harness feeds key and mouse state.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Systems registered across all update stages.
    pub fn system_count(&self) -> usize {
        self.schedule.len()
    }

    /// Names of the plugins built so far, in first-added order.
    pub fn plugin_names(&self) -> &[String] {
        &self.plugins
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p == name)
    }

    /// Request a stop from outside a system. Takes effect at the next frame
    /// boundary.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    // ── Frame loop ───────────────────────────────────────────────────

    fn run_startup(&mut self) -> Result<()> {
        self.started = true;
        self.state = AppState::Running;
        log::info!(
            "starting `{}` ({} startup, {} update systems)",
            self.config.title,
            self.startup.len(),
            self.schedule.len()
        );
        let result = self.startup.run(FrameData {
            world: &mut self.world,
            events: &mut self.events,
            time: &self.time,
            input: &self.input,
            stop: &mut self.stop_requested,
        });
        self.time.reset_frame_start();
        result
    }

    /// Run exactly one frame, running the startup systems first if they have
    /// not run yet. Does nothing once the app has stopped.
    pub fn update(&mut self) -> Result<()> {
        if self.state == AppState::Stopped {
            log::debug!("update() on a stopped app ignored");
            return Ok(());
        }
        if !self.started {
            if let Err(err) = self.run_startup() {
                self.state = AppState::Stopped;
                return Err(err);
            }
        }
        if self.config.frame_limit == Some(0) {
            log::debug!("frame limit 0; no update frames run");
            self.stop_requested = true;
        }
        if self.stop_requested {
            self.finish();
            return Ok(());
        }

        self.time.advance();
        self.events.update();
        let result = self.schedule.run(FrameData {
            world: &mut self.world,
            events: &mut self.events,
            time: &self.time,
            input: &self.input,
            stop: &mut self.stop_requested,
        });
        self.input.end_frame();

        #[cfg(feature = "diagnostics")]
        crate::diag::record_frame(&mut self.world, &self.time, &self.schedule, &self.events);

        if let Err(err) = result {
            self.state = AppState::Stopped;
            return Err(err);
        }

        if let Some(limit) = self.config.frame_limit {
            if self.time.frame_count() >= limit {
                log::debug!("frame limit {limit} reached");
                self.stop_requested = true;
            }
        }
        if self.stop_requested {
            self.finish();
        }
        Ok(())
    }

    /// Run frames until a system calls `stop()` or the frame limit is hit.
    ///
    /// A failing system aborts the loop and its error is returned.
    pub fn run(&mut self) -> Result<()> {
        let budget = self.config.frame_budget();
        while self.state != AppState::Stopped {
            let frame_start = Instant::now();
            if let Err(err) = self.update() {
                log::error!(
                    "`{}` aborted at frame {}: {err}",
                    self.config.title,
                    self.time.frame_count()
                );
                return Err(err);
            }
            if let Some(budget) = budget {
                if let Some(rest) = budget.checked_sub(frame_start.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.state = AppState::Stopped;
        log::info!(
            "`{}` stopped after {} frames",
            self.config.title,
            self.time.frame_count()
        );
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcsError;
    use crate::input::KeyCode;

    #[derive(Default)]
    struct Counter(u32);

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Trace {
        fn push(ctx: &mut Context<'_>, line: impl Into<String>) -> SystemResult {
            ctx.resource_mut::<Trace>()?.0.push(line.into());
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct ScoreEvent(u32);

    fn fixed_app() -> App {
        App::with_config(AppConfig::default().with_fixed_delta(0.25))
    }

    #[test]
    fn systems_run_in_registration_order() {
        let mut app = fixed_app();
        app.insert_resource(Counter(0)).insert_resource(Trace::default());
        for _ in 0..3 {
            app.add_update_system(|ctx| {
                ctx.resource_mut::<Counter>()?.0 += 1;
                let seen = ctx.resource::<Counter>()?.0;
                Trace::push(ctx, seen.to_string())
            });
        }
        app.update().unwrap();
        assert_eq!(app.world().resource::<Trace>().unwrap().0, ["1", "2", "3"]);
    }

    #[test]
    fn startup_runs_once_before_updates() {
        let mut app = fixed_app();
        app.insert_resource(Trace::default())
            .add_update_system(|ctx| Trace::push(ctx, "update"))
            .add_startup_system(|ctx| Trace::push(ctx, "startup"));

        assert_eq!(app.state(), AppState::Idle);
        app.update().unwrap();
        app.update().unwrap();
        assert_eq!(app.state(), AppState::Running);
        assert_eq!(
            app.world().resource::<Trace>().unwrap().0,
            ["startup", "update", "update"]
        );
    }

    #[test]
    fn stop_lets_the_frame_finish() {
        let mut app = fixed_app();
        app.insert_resource(Trace::default())
            .add_update_system(|ctx| {
                if ctx.frame() == 2 {
                    ctx.stop();
                }
                let line = format!("a{}", ctx.frame());
                Trace::push(ctx, line)
            })
            .add_update_system(|ctx| {
                let line = format!("b{}", ctx.frame());
                Trace::push(ctx, line)
            });

        app.run().unwrap();
        assert_eq!(app.state(), AppState::Stopped);
        assert_eq!(
            app.world().resource::<Trace>().unwrap().0,
            ["a1", "b1", "a2", "b2"]
        );
    }

    #[test]
    fn stop_during_startup_skips_all_frames() {
        let mut app = fixed_app();
        app.insert_resource(Counter(0))
            .add_startup_system(|ctx| {
                ctx.stop();
                Ok(())
            })
            .add_update_system(|ctx| {
                ctx.resource_mut::<Counter>()?.0 += 1;
                Ok(())
            });
        app.run().unwrap();
        assert_eq!(app.world().resource::<Counter>().unwrap().0, 0);
        assert_eq!(app.time().frame_count(), 0);
    }

    #[test]
    fn frame_limit_stops_run() {
        let mut app = App::with_config(
            AppConfig::default()
                .with_fixed_delta(0.5)
                .with_frame_limit(4),
        );
        app.insert_resource(Counter(0)).add_update_system(|ctx| {
            ctx.resource_mut::<Counter>()?.0 += 1;
            Ok(())
        });
        app.run().unwrap();
        assert_eq!(app.world().resource::<Counter>().unwrap().0, 4);
        assert!((app.time().elapsed_secs() - 2.0).abs() < 1e-6);

        app.update().unwrap();
        assert_eq!(app.world().resource::<Counter>().unwrap().0, 4);
    }

    #[test]
    fn zero_frame_limit_runs_startup_only() {
        let mut app = App::with_config(AppConfig::default().with_frame_limit(0));
        app.insert_resource(Counter(0))
            .add_startup_system(|ctx| {
                ctx.resource_mut::<Counter>()?.0 += 10;
                Ok(())
            })
            .add_update_system(|ctx| {
                ctx.resource_mut::<Counter>()?.0 += 1;
                Ok(())
            });
        app.run().unwrap();
        assert_eq!(app.state(), AppState::Stopped);
        assert_eq!(app.time().frame_count(), 0);
        assert_eq!(app.world().resource::<Counter>().unwrap().0, 10);
    }

    #[test]
    fn system_error_terminates_run() {
        let mut app = fixed_app();
        app.insert_resource(Counter(0))
            .add_update_system(|ctx| {
                if ctx.frame() == 3 {
                    return Err(EcsError::system("corrupt state"));
                }
                Ok(())
            })
            .add_update_system(|ctx| {
                ctx.resource_mut::<Counter>()?.0 += 1;
                Ok(())
            });

        let err = app.run().unwrap_err();
        assert!(matches!(err, EcsError::System(ref msg) if msg == "corrupt state"));
        assert_eq!(app.state(), AppState::Stopped);
        assert_eq!(app.world().resource::<Counter>().unwrap().0, 2);
    }

    #[test]
    fn missing_resource_is_fatal() {
        let mut app = fixed_app();
        app.add_update_system(|ctx| {
            ctx.resource::<Counter>()?;
            Ok(())
        });
        assert!(matches!(app.run(), Err(EcsError::ResourceNotFound(_))));
    }

    #[test]
    fn event_seen_once_by_each_system() {
        // Frame 5: system 1 sends, system 3 reads it the same frame.
        // Frame 6: system 0 (registered before the sender) reads it.
        // Frame 7: nobody sees it.
        let mut app = fixed_app();
        app.insert_resource(Trace::default())
            .add_event::<ScoreEvent>()
            .add_update_system(|ctx| {
                for ScoreEvent(points) in ctx.events.drain::<ScoreEvent>()? {
                    let line = format!("s0 f{} {points}", ctx.frame());
                    Trace::push(ctx, line)?;
                }
                Ok(())
            })
            .add_update_system(|ctx| {
                if ctx.frame() == 5 {
                    ctx.events.writer::<ScoreEvent>()?.send(ScoreEvent(10));
                }
                Ok(())
            })
            .add_update_system(|_| Ok(()))
            .add_update_system(|ctx| {
                for ScoreEvent(points) in ctx.events.drain::<ScoreEvent>()? {
                    let line = format!("s3 f{} {points}", ctx.frame());
                    Trace::push(ctx, line)?;
                }
                Ok(())
            });

        for _ in 0..8 {
            app.update().unwrap();
        }
        assert_eq!(
            app.world().resource::<Trace>().unwrap().0,
            ["s3 f5 10", "s0 f6 10"]
        );
    }

    #[test]
    fn startup_events_reach_first_frame() {
        let mut app = fixed_app();
        app.insert_resource(Counter(0))
            .add_startup_system(|ctx| ctx.events.send(ScoreEvent(7)))
            .add_update_system(|ctx| {
                let total: u32 = ctx.events.drain::<ScoreEvent>()?.iter().map(|e| e.0).sum();
                ctx.resource_mut::<Counter>()?.0 += total;
                Ok(())
            });
        app.update().unwrap();
        app.update().unwrap();
        assert_eq!(app.world().resource::<Counter>().unwrap().0, 7);
    }

    struct Inner;
    impl Plugin for Inner {
        fn build(&self, app: &mut App) {
            app.add_update_system(|ctx| Trace::push(ctx, "inner"));
        }
    }

    struct Outer;
    impl Plugin for Outer {
        fn build(&self, app: &mut App) {
            app.insert_resource(Trace::default())
                .add_plugins(Inner)
                .add_update_system(|ctx| Trace::push(ctx, "outer"));
        }
    }

    struct Tail;
    impl Plugin for Tail {
        fn build(&self, app: &mut App) {
            app.add_update_system(|ctx| Trace::push(ctx, "tail"));
        }
        fn name(&self) -> &str {
            "tail"
        }
    }

    #[test]
    fn plugins_compose_in_build_order() {
        let mut app = fixed_app();
        app.add_plugins((Outer, Tail));
        app.update().unwrap();
        assert_eq!(
            app.world().resource::<Trace>().unwrap().0,
            ["inner", "outer", "tail"]
        );
        assert_eq!(app.plugin_names().len(), 3);
        assert!(app.has_plugin("tail"));
    }

    #[test]
    fn re_adding_a_plugin_builds_it_again() {
        let mut app = fixed_app();
        app.insert_resource(Trace::default());
        app.add_plugins(Tail).add_plugins(Tail);
        app.update().unwrap();
        assert_eq!(app.world().resource::<Trace>().unwrap().0, ["tail", "tail"]);
        assert_eq!(app.plugin_names(), ["tail"]);
    }

    #[test]
    fn stages_and_conditions() {
        let mut app = fixed_app();
        app.insert_resource(Trace::default())
            .add_system(Stage::Last, |ctx| Trace::push(ctx, "last"))
            .add_system_if(
                Stage::Update,
                |world| !world.has_resource::<bool>(),
                |ctx| Trace::push(ctx, "gameplay"),
            )
            .add_system(Stage::First, |ctx| Trace::push(ctx, "first"));

        app.update().unwrap();
        app.world_mut().insert_resource(true);
        app.update().unwrap();

        assert_eq!(
            app.world().resource::<Trace>().unwrap().0,
            ["first", "gameplay", "last", "first", "last"]
        );
    }

    #[test]
    fn just_pressed_lasts_one_frame() {
        let mut app = fixed_app();
        app.insert_resource(Trace::default()).add_update_system(|ctx| {
            let line = format!(
                "{} {}",
                ctx.key_pressed(KeyCode::Space),
                ctx.key_just_pressed(KeyCode::Space)
            );
            Trace::push(ctx, line)
        });

        app.input_mut().keys.press(KeyCode::Space);
        app.update().unwrap();
        app.update().unwrap();
        assert_eq!(
            app.world().resource::<Trace>().unwrap().0,
            ["true true", "true false"]
        );
    }

    #[test]
    fn delta_follows_fixed_step() {
        let mut app = fixed_app();
        app.insert_resource(Trace::default())
            .add_update_system(|ctx| {
                let line = format!("{:.2}/{:.2}", ctx.delta(), ctx.elapsed());
                Trace::push(ctx, line)
            });
        app.update().unwrap();
        app.update().unwrap();
        assert_eq!(
            app.world().resource::<Trace>().unwrap().0,
            ["0.25/0.25", "0.25/0.50"]
        );
    }
}

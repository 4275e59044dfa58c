//! # System — Functions That Operate on the World
//!
//! A system is a function that takes `&mut Context` and returns a
//! [`SystemResult`]. It queries entities, writes components back, reads
//! resources and sends events. That's it.
//!
//! - Systems run in the order they're added, grouped by [`Stage`].
//! - No automatic parallelism. At most one system touches the world at a time.
//! - A system returning `Err` aborts the frame and the run loop.
//!
//! ## Schedule
//!
//! A [`Schedule`] keeps one ordered list per stage. Startup systems live in
//! their own schedule that the [`App`](crate::app::App) runs once; update
//! systems run every frame, `First` through `Last`.
//!
//! A system may carry a run condition, evaluated against the world just
//! before the system would run. When it returns `false` the system is skipped
//! for that frame.

use serde::Serialize;

use super::event::Events;
use super::world::World;
use crate::context::{Context, InputState};
use crate::error::EcsError;
use crate::time::Time;

/// What every system returns. `Err` is fatal for the run loop.
pub type SystemResult = Result<(), EcsError>;

/// A system that can be executed with a [`Context`].
///
/// Any `FnMut(&mut Context) -> SystemResult` implements this trait, so you
/// can use closures or function pointers directly.
pub trait System {
    fn run(&mut self, ctx: &mut Context<'_>) -> SystemResult;
}

impl<F: FnMut(&mut Context<'_>) -> SystemResult> System for F {
    fn run(&mut self, ctx: &mut Context<'_>) -> SystemResult {
        (self)(ctx)
    }
}

/// Identifies one registered system. Also keys the system's event cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SystemId(pub(crate) u32);

impl SystemId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Frame phases, run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stage {
    First,
    PreUpdate,
    Update,
    PostUpdate,
    Last,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::First,
        Stage::PreUpdate,
        Stage::Update,
        Stage::PostUpdate,
        Stage::Last,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Predicate deciding whether a system runs this frame.
pub type RunCondition = Box<dyn Fn(&World) -> bool>;

struct SystemEntry {
    id: SystemId,
    name: String,
    condition: Option<RunCondition>,
    system: Box<dyn System>,
}

/// Per-system timing recorded during a single frame.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Serialize)]
pub struct SystemTiming {
    pub name: String,
    pub stage: Stage,
    pub duration_us: f64,
    pub skipped: bool,
}

/// Everything a schedule lends to its systems for one run.
pub(crate) struct FrameData<'a> {
    pub world: &'a mut World,
    pub events: &'a mut Events,
    pub time: &'a Time,
    pub input: &'a InputState,
    pub stop: &'a mut bool,
}

/// Ordered lists of systems, one per [`Stage`].
pub struct Schedule {
    stages: [Vec<SystemEntry>; 5],
    /// Per-system timings from the most recent `run()` call.
    #[cfg(feature = "diagnostics")]
    pub(crate) timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            stages: Default::default(),
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    /// Append a system to the end of `stage`.
    pub(crate) fn add_system<F>(
        &mut self,
        id: SystemId,
        stage: Stage,
        condition: Option<RunCondition>,
        system: F,
    ) where
        F: FnMut(&mut Context<'_>) -> SystemResult + 'static,
    {
        let name = short_system_name(std::any::type_name::<F>());
        log::trace!("registered system `{name}` ({stage:?}, id {})", id.0);
        self.stages[stage.slot()].push(SystemEntry {
            id,
            name,
            condition,
            system: Box::new(system),
        });
    }

    /// Run every stage in order. Stops at the first failing system and
    /// returns its error; the remaining systems of the frame do not run.
    pub(crate) fn run(&mut self, frame: FrameData<'_>) -> SystemResult {
        let FrameData {
            world,
            events,
            time,
            input,
            stop,
        } = frame;

        #[cfg(feature = "diagnostics")]
        self.timings.clear();

        for stage in Stage::ALL {
            for entry in &mut self.stages[stage.slot()] {
                if let Some(condition) = &entry.condition {
                    if !condition(world) {
                        #[cfg(feature = "diagnostics")]
                        self.timings.push(SystemTiming {
                            name: entry.name.clone(),
                            stage,
                            duration_us: 0.0,
                            skipped: true,
                        });
                        continue;
                    }
                }

                #[cfg(feature = "diagnostics")]
                let start = std::time::Instant::now();

                let mut ctx = Context::new(world, events, time, input, stop, entry.id);
                let result = entry.system.run(&mut ctx);

                #[cfg(feature = "diagnostics")]
                self.timings.push(SystemTiming {
                    name: entry.name.clone(),
                    stage,
                    duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
                    skipped: false,
                });

                if let Err(err) = result {
                    log::error!("system `{}` ({stage:?}) failed: {err}", entry.name);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Returns the number of systems in this schedule.
    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// System names in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .flatten()
            .map(|entry| entry.name.as_str())
            .collect()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path and generic arguments from a fully-qualified type
/// name, keeping only the last meaningful segment (e.g.
/// `breakout::move_paddle` → `move_paddle`, `spawn_wave<game::Boss>` →
/// `spawn_wave`, `{{closure}}` → `<closure>`).
fn short_system_name(full: &str) -> String {
    if full.contains("{{closure}}") {
        return "<closure>".to_string();
    }
    let mut path = String::with_capacity(full.len());
    let mut depth = 0usize;
    for c in full.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => path.push(c),
            _ => {}
        }
    }
    let path = path.trim_end_matches("::");
    path.rsplit("::").next().unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_system(_ctx: &mut Context<'_>) -> SystemResult {
        Ok(())
    }

    struct Counter(u32);

    fn run_once(schedule: &mut Schedule, world: &mut World) -> SystemResult {
        let mut events = Events::new();
        let time = Time::new();
        let input = InputState::new();
        let mut stop = false;
        schedule.run(FrameData {
            world,
            events: &mut events,
            time: &time,
            input: &input,
            stop: &mut stop,
        })
    }

    #[test]
    fn schedule_captures_system_name() {
        let mut schedule = Schedule::new();
        schedule.add_system(SystemId(0), Stage::Update, None, dummy_system);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.system_names(), vec!["dummy_system"]);
    }

    #[test]
    fn closure_system_name() {
        let mut schedule = Schedule::new();
        schedule.add_system(SystemId(0), Stage::Update, None, |_| Ok(()));
        assert_eq!(schedule.system_names(), vec!["<closure>"]);
    }

    fn generic_system<T: 'static>(_ctx: &mut Context<'_>) -> SystemResult {
        Ok(())
    }

    #[test]
    fn generic_system_name_drops_type_arguments() {
        let mut schedule = Schedule::new();
        schedule.add_system(SystemId(0), Stage::Update, None, generic_system::<Vec<u32>>);
        assert_eq!(schedule.system_names(), vec!["generic_system"]);
        assert_eq!(short_system_name("game::spawn::<game::enemy::Boss>"), "spawn");
    }

    #[test]
    fn stages_run_in_order_regardless_of_registration() {
        fn record(tag: &'static str) -> impl FnMut(&mut Context<'_>) -> SystemResult {
            move |ctx| {
                ctx.resource_mut::<Vec<&'static str>>()?.push(tag);
                Ok(())
            }
        }

        let mut schedule = Schedule::new();
        schedule.add_system(SystemId(0), Stage::Last, None, record("last"));
        schedule.add_system(SystemId(1), Stage::Update, None, record("update-a"));
        schedule.add_system(SystemId(2), Stage::First, None, record("first"));
        schedule.add_system(SystemId(3), Stage::Update, None, record("update-b"));

        let mut world = World::new();
        world.insert_resource(Vec::<&'static str>::new());
        run_once(&mut schedule, &mut world).unwrap();

        assert_eq!(
            world.resource::<Vec<&'static str>>().unwrap(),
            &vec!["first", "update-a", "update-b", "last"]
        );
    }

    #[test]
    fn run_condition_skips_system() {
        let mut schedule = Schedule::new();
        schedule.add_system(
            SystemId(0),
            Stage::Update,
            Some(Box::new(|world: &World| world.has_resource::<bool>())),
            |ctx| {
                ctx.resource_mut::<Counter>()?.0 += 1;
                Ok(())
            },
        );

        let mut world = World::new();
        world.insert_resource(Counter(0));
        run_once(&mut schedule, &mut world).unwrap();
        assert_eq!(world.resource::<Counter>().unwrap().0, 0);

        world.insert_resource(true);
        run_once(&mut schedule, &mut world).unwrap();
        assert_eq!(world.resource::<Counter>().unwrap().0, 1);
    }

    #[test]
    fn failing_system_stops_the_frame() {
        let mut schedule = Schedule::new();
        schedule.add_system(SystemId(0), Stage::Update, None, |ctx| {
            ctx.resource::<Counter>()?;
            Ok(())
        });
        schedule.add_system(SystemId(1), Stage::Update, None, |ctx| {
            ctx.insert_resource(Counter(99));
            Ok(())
        });

        let mut world = World::new();
        let err = run_once(&mut schedule, &mut world).unwrap_err();
        assert!(matches!(err, EcsError::ResourceNotFound(_)));
        assert!(!world.has_resource::<Counter>());
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn timings_cover_every_system() {
        let mut schedule = Schedule::new();
        schedule.add_system(SystemId(0), Stage::Update, None, dummy_system);
        schedule.add_system(SystemId(1), Stage::Last, Some(Box::new(|_: &World| false)), dummy_system);

        let mut world = World::new();
        run_once(&mut schedule, &mut world).unwrap();
        assert_eq!(schedule.timings.len(), 2);
        assert!(!schedule.timings[0].skipped);
        assert!(schedule.timings[1].skipped);
    }
}

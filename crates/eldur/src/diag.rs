//! Per-frame diagnostics snapshot.
//!
//! Enabled by the `diagnostics` feature flag. After every frame the app
//! records a [`FrameDiagnostics`] resource: frame timing, entity pool
//! statistics, component store sizes, buffered events and per-system
//! timings. Everything serializes with serde so it can be logged as JSON or
//! shipped elsewhere.
//!
//! [`DiagnosticsPlugin`] logs that snapshot every
//! [`AppConfig::diagnostics_interval`](crate::config::AppConfig) frames.

use serde::Serialize;

use crate::app::{App, Plugin};
use crate::context::Context;
use crate::ecs::event::Events;
use crate::ecs::system::{Schedule, Stage, SystemResult, SystemTiming};
use crate::ecs::world::World;
use crate::error::Result;
use crate::time::Time;

// ── Snapshot types ───────────────────────────────────────────────────────

/// Entity slot usage for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityPoolStats {
    pub total_slots: usize,
    pub free_count: usize,
    pub alive_count: usize,
    pub spawned_this_frame: u32,
    pub despawned_this_frame: u32,
}

impl EntityPoolStats {
    /// Share of slots sitting on the free list, as a percentage.
    pub fn fragmentation_pct(&self) -> f32 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.free_count as f32 / self.total_slots as f32 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreInfo {
    pub component: &'static str,
    pub len: usize,
}

/// Resource: what happened during the most recent frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameDiagnostics {
    pub frame: u64,
    pub fps: f32,
    pub delta_ms: f32,
    pub elapsed_secs: f32,
    pub entity_count: usize,
    pub stores: Vec<StoreInfo>,
    pub event_channels: usize,
    pub events_buffered: usize,
    /// Sum of the per-system durations.
    pub systems_us: f64,
    pub system_timings: Vec<SystemTiming>,
    pub entity_pool: EntityPoolStats,
}

impl FrameDiagnostics {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The slowest system that actually ran this frame.
    pub fn slowest_system(&self) -> Option<&SystemTiming> {
        self.system_timings
            .iter()
            .filter(|t| !t.skipped)
            .max_by(|a, b| a.duration_us.total_cmp(&b.duration_us))
    }
}

/// Build this frame's snapshot and store it as a [`FrameDiagnostics`]
/// resource. Resets the world's per-frame spawn counters.
pub(crate) fn record_frame(world: &mut World, time: &Time, schedule: &Schedule, events: &Events) {
    let entity_pool = world.take_entity_stats();
    let stores = world
        .store_sizes()
        .into_iter()
        .map(|(component, len)| StoreInfo { component, len })
        .collect();
    let system_timings = schedule.timings.clone();
    let systems_us = system_timings.iter().map(|t| t.duration_us).sum();

    let snapshot = FrameDiagnostics {
        frame: time.frame_count(),
        fps: time.fps(),
        delta_ms: time.delta_secs() * 1000.0,
        elapsed_secs: time.elapsed_secs(),
        entity_count: world.entity_count(),
        stores,
        event_channels: events.channel_count(),
        events_buffered: events.buffered(),
        systems_us,
        system_timings,
        entity_pool,
    };
    world.insert_resource(snapshot);
}

// ── Plugin ───────────────────────────────────────────────────────────────

/// Logs the latest [`FrameDiagnostics`] as JSON at `debug` level.
///
/// Runs in [`Stage::Last`], so the snapshot it logs is the previous frame's.
/// The interval comes from the app config; `0` registers nothing.
pub struct DiagnosticsPlugin;

impl Plugin for DiagnosticsPlugin {
    fn build(&self, app: &mut App) {
        let interval = app.config().diagnostics_interval;
        if interval == 0 {
            log::debug!("diagnostics logging disabled");
            return;
        }
        app.add_system(Stage::Last, move |ctx: &mut Context<'_>| {
            log_diagnostics(ctx, interval)
        });
    }
}

fn log_diagnostics(ctx: &mut Context<'_>, interval: u64) -> SystemResult {
    if ctx.frame() % interval != 0 {
        return Ok(());
    }
    let Some(snapshot) = ctx.world.get_resource::<FrameDiagnostics>() else {
        return Ok(());
    };
    match snapshot.to_json() {
        Ok(json) => log::debug!(target: "eldur::diag", "{json}"),
        Err(err) => log::warn!("could not serialize diagnostics: {err}"),
    }
    Ok(())
}

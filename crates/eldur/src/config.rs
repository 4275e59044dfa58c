//! App configuration.
//!
//! ```json
//! { "title": "breakout", "frame_limit": 600, "fixed_delta": 0.016 }
//! ```
//!
//! Every field is optional; missing fields take their [`Default`] values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings read by [`App`](crate::app::App) at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shown in log lines.
    pub title: String,
    /// Stop after this many update frames (`0` runs startup only). `None`
    /// runs until a system stops.
    pub frame_limit: Option<u64>,
    /// Seconds added per frame instead of wall-clock time.
    pub fixed_delta: Option<f32>,
    /// Sleep between frames so the loop runs at most this fast.
    pub target_fps: Option<f32>,
    /// Frames between diagnostics log lines. `0` disables them.
    pub diagnostics_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: String::from("eldur"),
            frame_limit: None,
            fixed_delta: None,
            target_fps: None,
            diagnostics_interval: 300,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn with_fixed_delta(mut self, seconds: f32) -> Self {
        self.fixed_delta = Some(seconds);
        self
    }

    /// `None` for negative, NaN or unrepresentably large steps.
    pub(crate) fn fixed_step(&self) -> Option<Duration> {
        self.fixed_delta
            .and_then(|s| Duration::try_from_secs_f32(s).ok())
    }

    pub(crate) fn frame_budget(&self) -> Option<Duration> {
        self.target_fps
            .filter(|fps| *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f32(1.0 / fps).ok())
    }
}

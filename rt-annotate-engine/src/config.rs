//! Annotation process configuration
//!
//! Timing and display parameters of the real-time loop. Defaults match the
//! usual interactive use; the application can override them from its
//! configuration file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the annotation process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Interval between timer refreshes when no key is pressed (default: 100ms)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// How long a passed annotation stays highlighted as "next" (default: 1s)
    #[serde(default = "default_highlight")]
    pub highlight_secs: f64,

    /// Reference time step of the up/down keys (default: 2s)
    #[serde(default = "default_time_step")]
    pub time_step_secs: f64,

    /// Number of previous annotations shown (default: 10)
    #[serde(default = "default_previous_lines")]
    pub previous_lines: usize,
}

fn default_tick_interval() -> u64 {
    100
}

fn default_highlight() -> f64 {
    1.0
}

fn default_time_step() -> f64 {
    2.0
}

fn default_previous_lines() -> usize {
    10
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            highlight_secs: default_highlight(),
            time_step_secs: default_time_step(),
            previous_lines: default_previous_lines(),
        }
    }
}

impl ProcessConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the tick interval
    pub fn with_tick_interval_ms(mut self, millis: u64) -> Self {
        self.tick_interval_ms = millis;
        self
    }

    /// Builder method: set the highlight duration
    pub fn with_highlight_secs(mut self, seconds: f64) -> Self {
        self.highlight_secs = seconds;
        self
    }

    /// Builder method: set the up/down time step
    pub fn with_time_step_secs(mut self, seconds: f64) -> Self {
        self.time_step_secs = seconds;
        self
    }

    /// Builder method: set the number of previous annotations shown
    pub fn with_previous_lines(mut self, lines: usize) -> Self {
        self.previous_lines = lines;
        self
    }

    /// Tick interval as a duration (at least one millisecond)
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

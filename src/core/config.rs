//! Configuration for camera timing and surface behavior
//!
//! Options come either from a preset [`SyncProfile`] or from JSON. Every field
//! has a default, so partial JSON documents are accepted.

use crate::{
    core::{
        constants::{ANIMATED_SETTLE_MS, CAMERA_DEBOUNCE_MS, IMMEDIATE_SETTLE_MS},
        viewport::Viewport,
    },
    spatial::fit::FitOptions,
    MapError,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncProfile {
    Balanced,
    /// Short settle and debounce windows, for maps without camera animations
    Responsive,
    /// Longer windows, for slow native camera animations
    Smooth,
    Custom(SyncOptions),
}

impl SyncProfile {
    pub fn resolve(&self) -> SyncOptions {
        match self {
            Self::Balanced => SyncOptions::default(),
            Self::Responsive => SyncOptions {
                camera: CameraTimingConfig {
                    debounce_ms: 50,
                    animated_settle_ms: 200,
                    immediate_settle_ms: 20,
                },
                ..SyncOptions::default()
            },
            Self::Smooth => SyncOptions {
                camera: CameraTimingConfig {
                    debounce_ms: 200,
                    animated_settle_ms: 600,
                    immediate_settle_ms: 100,
                },
                ..SyncOptions::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

impl Default for SyncProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Top-level options of a map surface
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    pub camera: CameraTimingConfig,
    /// Region applied on first attach; the surface starts at the default region otherwise
    pub initial_viewport: Option<Viewport>,
    /// Marker taps are reported but never change the selection
    pub readonly: bool,
    /// Constraints used by `fit_to_pins`
    pub fit: FitOptions,
}

impl SyncOptions {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let options: SyncOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if let Some(viewport) = &self.initial_viewport {
            if !viewport.center().is_valid() {
                return Err(MapError::InvalidCoordinates(format!(
                    "initial viewport center {:?}",
                    viewport.center()
                )));
            }
        }
        Ok(())
    }
}

/// Timing of the camera queue and of the native idle debounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTimingConfig {
    /// Quiet window before a native camera idle event is written back
    pub debounce_ms: u64,
    pub animated_settle_ms: u64,
    pub immediate_settle_ms: u64,
}

impl CameraTimingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Wait after a move before the next queued one may be applied
    pub fn settle_delay(&self, animated: bool) -> Duration {
        Duration::from_millis(if animated {
            self.animated_settle_ms
        } else {
            self.immediate_settle_ms
        })
    }
}

impl Default for CameraTimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: CAMERA_DEBOUNCE_MS,
            animated_settle_ms: ANIMATED_SETTLE_MS,
            immediate_settle_ms: IMMEDIATE_SETTLE_MS,
        }
    }
}

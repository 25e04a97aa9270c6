//! Editor configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 3.0;
pub const DEFAULT_GROUP_PADDING: f64 = 40.0;
pub const DEFAULT_PASTE_OFFSET: f64 = 40.0;
pub const DEFAULT_MINIMAP_WIDTH: f64 = 240.0;
pub const DEFAULT_MINIMAP_HEIGHT: f64 = 160.0;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_WHEEL_ZOOM_SENSITIVITY: f64 = 0.0015;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Tunables for the interaction engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Screen pixels a node press must travel before it becomes a drag.
    pub drag_threshold_px: f64,
    /// World units added around the selection when grouping.
    pub group_padding: f64,
    /// World units each successive paste is shifted by.
    pub paste_offset: f64,
    pub minimap_width: f64,
    pub minimap_height: f64,
    /// Upper bound on one generation request before its node is unlocked.
    pub generation_timeout_secs: u64,
    /// Zoom factor change per wheel pixel while Ctrl/Meta is held.
    pub wheel_zoom_sensitivity: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            group_padding: DEFAULT_GROUP_PADDING,
            paste_offset: DEFAULT_PASTE_OFFSET,
            minimap_width: DEFAULT_MINIMAP_WIDTH,
            minimap_height: DEFAULT_MINIMAP_HEIGHT,
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            wheel_zoom_sensitivity: DEFAULT_WHEEL_ZOOM_SENSITIVITY,
        }
    }
}

impl EditorConfig {
    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `NODEFLOW_DRAG_THRESHOLD_PX`: default 3
    /// - `NODEFLOW_GROUP_PADDING`: default 40
    /// - `NODEFLOW_PASTE_OFFSET`: default 40
    /// - `NODEFLOW_MINIMAP_WIDTH` / `NODEFLOW_MINIMAP_HEIGHT`: default 240×160
    /// - `NODEFLOW_GENERATION_TIMEOUT_SECS`: default 300
    /// - `NODEFLOW_WHEEL_ZOOM_SENSITIVITY`: default 0.0015
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a present but unparsable or
    /// out-of-range value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(v) => Some(v),
            Err(_) => None,
        })
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`EditorConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            drag_threshold_px: parse_or(&lookup, "NODEFLOW_DRAG_THRESHOLD_PX", DEFAULT_DRAG_THRESHOLD_PX, |v: &f64| {
                v.is_finite() && *v >= 0.0
            })?,
            group_padding: parse_or(&lookup, "NODEFLOW_GROUP_PADDING", DEFAULT_GROUP_PADDING, positive)?,
            paste_offset: parse_or(&lookup, "NODEFLOW_PASTE_OFFSET", DEFAULT_PASTE_OFFSET, positive)?,
            minimap_width: parse_or(&lookup, "NODEFLOW_MINIMAP_WIDTH", DEFAULT_MINIMAP_WIDTH, positive)?,
            minimap_height: parse_or(&lookup, "NODEFLOW_MINIMAP_HEIGHT", DEFAULT_MINIMAP_HEIGHT, positive)?,
            generation_timeout_secs: parse_or(
                &lookup,
                "NODEFLOW_GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS,
                |v: &u64| *v > 0,
            )?,
            wheel_zoom_sensitivity: parse_or(
                &lookup,
                "NODEFLOW_WHEEL_ZOOM_SENSITIVITY",
                DEFAULT_WHEEL_ZOOM_SENSITIVITY,
                positive,
            )?,
        })
    }
}

fn positive(v: &f64) -> bool {
    v.is_finite() && *v > 0.0
}

fn parse_or<T, F, V>(lookup: &F, key: &str, default: T, valid: V) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) if valid(&v) => Ok(v),
        _ => Err(ConfigError::Invalid { key: key.to_owned(), value: raw }),
    }
}

//! Engine configuration: policy flags chosen by the host.
//!
//! Defaults are usable as-is. Hosts may deserialize an [`EngineConfig`] from
//! their own settings (every field is optional) or read it from `TILES_*`
//! environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::HashMap;
use std::env::VarError;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_DRAG_THRESHOLD_PX, DEFAULT_FIT_FRACTION, DEFAULT_LONG_PRESS_MS, DEFAULT_MIN_STITCH_TILES};
use crate::tile::DisplayPolicy;

/// Errors produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but its value could not be parsed.
    #[error("config parse failed: {key}={value:?}")]
    Parse { key: String, value: String },
}

/// Every variable [`EngineConfig::from_env`] reads.
const ENV_KEYS: [&str; 8] = [
    "TILES_STITCH_MODE",
    "TILES_SCALE_TO_FIT",
    "TILES_FIT_FRACTION",
    "TILES_DISPLAY_POLICY",
    "TILES_BLOCK_DUPLICATE_BLANKS",
    "TILES_RETAIN_STITCHED_EDITS",
    "TILES_LONG_PRESS_MS",
    "TILES_DRAG_THRESHOLD_PX",
];

/// Which placement policy stitching uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StitchMode {
    /// One left-to-right strip.
    #[default]
    Linear,
    /// The grid's rows and columns, unscaled.
    Row,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stitch_mode: StitchMode,
    /// Scale a linear composite down to fit the viewport.
    pub scale_to_fit: bool,
    /// Fraction of the fitted size used when scaling, in `(0, 1]`.
    pub fit_fraction: f64,
    pub display_policy: DisplayPolicy,
    /// Refuse to add a blank tile while another tile is blank.
    pub block_duplicate_blanks: bool,
    /// Carry drag/resize/content edits back when unstitching.
    pub retain_stitched_edits: bool,
    pub long_press_ms: u64,
    pub drag_threshold_px: f64,
    /// Fewest tiles for which stitching is offered.
    pub min_stitch_tiles: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stitch_mode: StitchMode::Linear,
            scale_to_fit: false,
            fit_fraction: DEFAULT_FIT_FRACTION,
            display_policy: DisplayPolicy::AspectFit,
            block_duplicate_blanks: false,
            retain_stitched_edits: false,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            min_stitch_tiles: DEFAULT_MIN_STITCH_TILES,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `TILES_STITCH_MODE`: `linear` (default) or `row`
    /// - `TILES_SCALE_TO_FIT`: `true` / `false` (default false)
    /// - `TILES_FIT_FRACTION`: default 0.9
    /// - `TILES_DISPLAY_POLICY`: `aspect_fit` (default) or `intrinsic`
    /// - `TILES_BLOCK_DUPLICATE_BLANKS`: default false
    /// - `TILES_RETAIN_STITCHED_EDITS`: default false
    /// - `TILES_LONG_PRESS_MS`: default 100
    /// - `TILES_DRAG_THRESHOLD_PX`: default 3
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] when a variable is set to an unparseable or
    /// non-Unicode value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for key in ENV_KEYS {
            match std::env::var(key) {
                Ok(value) => {
                    vars.insert(key, value);
                }
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(raw)) => {
                    return Err(ConfigError::Parse { key: key.to_string(), value: raw.to_string_lossy().into_owned() });
                }
            }
        }
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] when a key is present with an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let fit_fraction = parse_or("TILES_FIT_FRACTION", &lookup, d.fit_fraction, parse_f64)?;
        if !(fit_fraction > 0.0 && fit_fraction <= 1.0) {
            return Err(ConfigError::Parse { key: "TILES_FIT_FRACTION".into(), value: fit_fraction.to_string() });
        }
        Ok(Self {
            stitch_mode: parse_or("TILES_STITCH_MODE", &lookup, d.stitch_mode, parse_stitch_mode)?,
            scale_to_fit: parse_or("TILES_SCALE_TO_FIT", &lookup, d.scale_to_fit, parse_bool)?,
            fit_fraction,
            display_policy: parse_or("TILES_DISPLAY_POLICY", &lookup, d.display_policy, parse_display_policy)?,
            block_duplicate_blanks: parse_or("TILES_BLOCK_DUPLICATE_BLANKS", &lookup, d.block_duplicate_blanks, parse_bool)?,
            retain_stitched_edits: parse_or("TILES_RETAIN_STITCHED_EDITS", &lookup, d.retain_stitched_edits, parse_bool)?,
            long_press_ms: parse_or("TILES_LONG_PRESS_MS", &lookup, d.long_press_ms, parse_u64)?,
            drag_threshold_px: parse_or("TILES_DRAG_THRESHOLD_PX", &lookup, d.drag_threshold_px, parse_f64)?,
            min_stitch_tiles: d.min_stitch_tiles,
        })
    }
}

/// A value that does not parse as the expected type.
struct Invalid;

fn parse_or<T, F, P>(key: &str, lookup: &F, default: T, parse: P) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, Invalid>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    parse(raw.trim()).map_err(|Invalid| ConfigError::Parse { key: key.to_string(), value: raw })
}

fn parse_bool(raw: &str) -> Result<bool, Invalid> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Invalid),
    }
}

fn parse_u64(raw: &str) -> Result<u64, Invalid> {
    raw.parse::<u64>().map_err(|_| Invalid)
}

fn parse_f64(raw: &str) -> Result<f64, Invalid> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Invalid),
    }
}

fn parse_stitch_mode(raw: &str) -> Result<StitchMode, Invalid> {
    match raw.to_ascii_lowercase().as_str() {
        "linear" => Ok(StitchMode::Linear),
        "row" | "grid" => Ok(StitchMode::Row),
        _ => Err(Invalid),
    }
}

fn parse_display_policy(raw: &str) -> Result<DisplayPolicy, Invalid> {
    match raw.to_ascii_lowercase().as_str() {
        "aspect_fit" | "fit" => Ok(DisplayPolicy::AspectFit),
        "intrinsic" => Ok(DisplayPolicy::Intrinsic),
        _ => Err(Invalid),
    }
}

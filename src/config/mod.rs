//! QC thresholds and their validation.
//!
//! A [`QcSettings`] value describes, per variable, which tests apply and with
//! which thresholds. Every map may be empty: a variable that is not configured
//! for a test never fails that test.
//!
//! Variable names are lower case. Input column headers are lower-cased on
//! read, so a `WS` column matches the `ws` variable.

pub mod presets;

pub use presets::{variable_info, Preset, VariableInfo, VARIABLES};

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use validator::Validate;

use crate::error::{QcError, Result};
use crate::utils::constants::{DEFAULT_WINDOW, ENV_PREFIX, MIN_WINDOW};

/// Inclusive physical range, written as `[min, max]` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl From<[f64; 2]> for ValueRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<ValueRange> for [f64; 2] {
    fn from(range: ValueRange) -> Self {
        [range.min, range.max]
    }
}

/// Stuck-sensor parameters, written as `[min_variation, low, high]`.
///
/// Only windows lying entirely inside `[low, high]` can be judged stuck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Variation {
    pub min_variation: f64,
    pub low: f64,
    pub high: f64,
}

impl Variation {
    pub fn new(min_variation: f64, low: f64, high: f64) -> Self {
        Self {
            min_variation,
            low,
            high,
        }
    }

    pub fn applies_to(&self, value: f64) -> bool {
        (self.low..=self.high).contains(&value)
    }

    /// True when every value is present, inside the sub-range, and the window
    /// spans less than `min_variation`. An empty window is never stuck.
    pub fn is_stuck<I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        let mut count = 0usize;

        for value in values {
            let Some(value) = value else {
                return false;
            };
            if !self.applies_to(value) {
                return false;
            }
            lowest = lowest.min(value);
            highest = highest.max(value);
            count += 1;
        }

        count > 0 && (highest - lowest) < self.min_variation
    }
}

impl From<[f64; 3]> for Variation {
    fn from([min_variation, low, high]: [f64; 3]) -> Self {
        Self {
            min_variation,
            low,
            high,
        }
    }
}

impl From<Variation> for [f64; 3] {
    fn from(v: Variation) -> Self {
        [v.min_variation, v.low, v.high]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QcSettings {
    /// Variables that must be present for a row to be complete
    #[serde(default, alias = "vars_check")]
    pub vars_checked: Vec<String>,

    #[serde(default)]
    pub ranges: BTreeMap<String, ValueRange>,

    /// Maximum absolute difference between consecutive rows
    #[serde(default)]
    pub steps: BTreeMap<String, f64>,

    #[serde(default = "default_window")]
    #[validate(range(min = 2))]
    pub window: usize,

    #[serde(default)]
    pub variations: BTreeMap<String, Variation>,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

impl Default for QcSettings {
    fn default() -> Self {
        Self {
            vars_checked: Vec::new(),
            ranges: BTreeMap::new(),
            steps: BTreeMap::new(),
            window: DEFAULT_WINDOW,
            variations: BTreeMap::new(),
        }
    }
}

impl QcSettings {
    pub fn builder() -> QcSettingsBuilder {
        QcSettingsBuilder::new()
    }

    /// Load settings from a TOML, JSON or YAML file, then apply
    /// `STATION_QC_*` environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading QC settings from {}", path.display());

        let settings: QcSettings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate_settings()?;
        Ok(settings)
    }

    /// Reject configurations that would produce meaningless flags.
    pub fn validate_settings(&self) -> Result<()> {
        if self.window < MIN_WINDOW {
            return Err(QcError::invalid_config(format!(
                "window must be at least {}, got {}",
                MIN_WINDOW, self.window
            )));
        }
        self.validate()?;

        for var in &self.vars_checked {
            check_name(var, "vars_checked")?;
        }

        for (var, range) in &self.ranges {
            check_name(var, "ranges")?;
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(QcError::invalid_config(format!(
                    "range for '{}' must be finite, got [{}, {}]",
                    var, range.min, range.max
                )));
            }
            if range.min > range.max {
                return Err(QcError::invalid_config(format!(
                    "range for '{}' is inverted: [{}, {}]",
                    var, range.min, range.max
                )));
            }
        }

        for (var, step) in &self.steps {
            check_name(var, "steps")?;
            if !step.is_finite() || *step < 0.0 {
                return Err(QcError::invalid_config(format!(
                    "step for '{}' must be a non-negative number, got {}",
                    var, step
                )));
            }
        }

        for (var, variation) in &self.variations {
            check_name(var, "variations")?;
            if !variation.min_variation.is_finite() || variation.min_variation < 0.0 {
                return Err(QcError::invalid_config(format!(
                    "minimum variation for '{}' must be a non-negative number, got {}",
                    var, variation.min_variation
                )));
            }
            if !variation.low.is_finite() || !variation.high.is_finite() {
                return Err(QcError::invalid_config(format!(
                    "persistence sub-range for '{}' must be finite",
                    var
                )));
            }
            if variation.low > variation.high {
                return Err(QcError::invalid_config(format!(
                    "persistence sub-range for '{}' is inverted: [{}, {}]",
                    var, variation.low, variation.high
                )));
            }
        }

        Ok(())
    }

    /// Every variable referenced by at least one test.
    pub fn configured_variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = self
            .vars_checked
            .iter()
            .map(String::as_str)
            .chain(self.ranges.keys().map(String::as_str))
            .chain(self.steps.keys().map(String::as_str))
            .chain(self.variations.keys().map(String::as_str))
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Config files lower-case map keys but not list items, so mixed case would
// let one variable name refer to two different columns.
fn check_name(var: &str, section: &str) -> Result<()> {
    if var.trim().is_empty() {
        return Err(QcError::invalid_config(format!(
            "empty variable name in {}",
            section
        )));
    }
    if var.chars().any(char::is_uppercase) {
        return Err(QcError::invalid_config(format!(
            "variable name '{}' in {} must be lower case",
            var, section
        )));
    }
    Ok(())
}

pub struct QcSettingsBuilder {
    settings: QcSettings,
}

impl Default for QcSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QcSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: QcSettings::default(),
        }
    }

    pub fn check_var(mut self, var: impl Into<String>) -> Self {
        let var = var.into();
        if !self.settings.vars_checked.contains(&var) {
            self.settings.vars_checked.push(var);
        }
        self
    }

    pub fn range(mut self, var: impl Into<String>, min: f64, max: f64) -> Self {
        self.settings.ranges.insert(var.into(), ValueRange::new(min, max));
        self
    }

    pub fn step(mut self, var: impl Into<String>, max_step: f64) -> Self {
        self.settings.steps.insert(var.into(), max_step);
        self
    }

    pub fn variation(mut self, var: impl Into<String>, min_variation: f64, low: f64, high: f64) -> Self {
        self.settings
            .variations
            .insert(var.into(), Variation::new(min_variation, low, high));
        self
    }

    pub fn window(mut self, window: usize) -> Self {
        self.settings.window = window;
        self
    }

    pub fn build(self) -> Result<QcSettings> {
        self.settings.validate_settings()?;
        Ok(self.settings)
    }
}

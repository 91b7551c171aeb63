use tracing::debug;

use crate::config::QcSettings;
use crate::error::Result;
use crate::models::{validate_series, Observation, QcFlags, QcRecord, StationSeries};
use crate::processors::PersistenceWindow;
use crate::utils::constants::{UNEVALUABLE_PERSISTENCE_PASSES, UNEVALUABLE_STEP_PASSES};

/// Runs the completeness, range, step and persistence tests on one station.
#[derive(Debug, Clone)]
pub struct QualityChecker {
    settings: QcSettings,
}

impl QualityChecker {
    pub fn new(settings: QcSettings) -> Result<Self> {
        settings.validate_settings()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &QcSettings {
        &self.settings
    }

    /// Passes when every checked variable has a value.
    pub fn complete_test(&self, row: &Observation) -> bool {
        self.settings
            .vars_checked
            .iter()
            .all(|var| row.is_present(var))
    }

    /// Passes when every ranged variable is present and inside its range.
    /// A missing value counts as out of range.
    pub fn range_test(&self, row: &Observation) -> bool {
        self.settings
            .ranges
            .iter()
            .all(|(var, range)| row.value(var).is_some_and(|v| range.contains(v)))
    }

    /// Passes when no configured variable jumps more than its maximum step
    /// from `previous` to `current`. A gap on either side fails.
    pub fn step_test(&self, previous: Option<&Observation>, current: &Observation) -> bool {
        if self.settings.steps.is_empty() {
            return true;
        }
        let Some(previous) = previous else {
            return UNEVALUABLE_STEP_PASSES;
        };

        self.settings
            .steps
            .iter()
            .all(|(var, max_step)| step_within(previous.value(var), current.value(var), *max_step))
    }

    /// Passes unless a configured variable is stuck over the last `window`
    /// rows of `history`, the last element being the current row.
    pub fn persistence_test(&self, history: &[Observation]) -> bool {
        if self.settings.variations.is_empty() {
            return true;
        }
        if history.len() < self.settings.window {
            return UNEVALUABLE_PERSISTENCE_PASSES;
        }

        let recent = &history[history.len() - self.settings.window..];
        self.settings
            .variations
            .iter()
            .all(|(var, variation)| !variation.is_stuck(recent.iter().map(|row| row.value(var))))
    }

    /// Streaming evaluator; rows must be fed in timestamp order.
    pub fn evaluator(&self) -> SeriesEvaluator<'_> {
        SeriesEvaluator::new(self)
    }

    /// Flags for a single station's time-ordered series.
    pub fn check_series(&self, rows: &[Observation]) -> Result<Vec<QcFlags>> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        validate_series(&first.station_id, rows)?;

        let mut evaluator = self.evaluator();
        let flags: Vec<QcFlags> = rows.iter().map(|row| evaluator.evaluate(row)).collect();

        debug!(
            "Station {}: evaluated {} rows",
            first.station_id,
            flags.len()
        );
        Ok(flags)
    }

    /// Flags and labels for a single station's time-ordered series.
    pub fn quality_check(&self, rows: &[Observation]) -> Result<Vec<QcRecord>> {
        let flags = self.check_series(rows)?;
        Ok(rows
            .iter()
            .zip(flags)
            .map(|(row, qc)| QcRecord::for_observation(row, qc))
            .collect())
    }

    pub fn check_station(&self, series: &StationSeries) -> Result<Vec<QcRecord>> {
        series.validate_order()?;
        self.quality_check(&series.observations)
    }
}

fn step_within(previous: Option<f64>, current: Option<f64>, max_step: f64) -> bool {
    match (previous, current) {
        (Some(prev), Some(curr)) => (curr - prev).abs() <= max_step,
        _ => false,
    }
}

/// Row-by-row test state: the previous row's step values and one
/// persistence window per configured variable.
pub struct SeriesEvaluator<'a> {
    settings: &'a QcSettings,
    checker: &'a QualityChecker,
    previous_steps: Option<Vec<Option<f64>>>,
    windows: Vec<PersistenceWindow>,
}

impl<'a> SeriesEvaluator<'a> {
    fn new(checker: &'a QualityChecker) -> Self {
        let settings = &checker.settings;
        Self {
            settings,
            checker,
            previous_steps: None,
            windows: settings
                .variations
                .keys()
                .map(|_| PersistenceWindow::new(settings.window))
                .collect(),
        }
    }

    pub fn evaluate(&mut self, row: &Observation) -> QcFlags {
        let complete = self.checker.complete_test(row);
        let range_ok = self.checker.range_test(row);
        let no_steps = self.step(row);
        let no_persistence = self.persistence(row);

        QcFlags::from_tests(complete, range_ok, no_steps, no_persistence)
    }

    fn step(&mut self, row: &Observation) -> bool {
        let current: Vec<Option<f64>> = self
            .settings
            .steps
            .keys()
            .map(|var| row.value(var))
            .collect();

        let passed = if self.settings.steps.is_empty() {
            true
        } else {
            match &self.previous_steps {
                None => UNEVALUABLE_STEP_PASSES,
                Some(previous) => self
                    .settings
                    .steps
                    .values()
                    .zip(previous.iter().zip(&current))
                    .all(|(max_step, (prev, curr))| step_within(*prev, *curr, *max_step)),
            }
        };

        self.previous_steps = Some(current);
        passed
    }

    fn persistence(&mut self, row: &Observation) -> bool {
        let mut passed = true;

        // every window must advance, so no short-circuit here
        for ((var, variation), window) in self.settings.variations.iter().zip(&mut self.windows) {
            window.push(row.value(var));
            let variable_passed = match window.is_stuck(variation) {
                Some(stuck) => !stuck,
                None => UNEVALUABLE_PERSISTENCE_PASSES,
            };
            passed &= variable_passed;
        }

        passed
    }
}

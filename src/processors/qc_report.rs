use crate::models::{QcRecord, QualityLabel};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QcReport {
    pub total_records: usize,
    pub label_counts: BTreeMap<QualityLabel, usize>,
    pub test_failures: TestFailures,
    pub station_statistics: BTreeMap<String, StationStatistics>,
}

/// How many rows failed each individual test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestFailures {
    pub incomplete: usize,
    pub out_of_range: usize,
    pub steps: usize,
    pub persistence: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationStatistics {
    pub total_records: usize,
    pub good_records: usize,
    pub suspicious_records: usize,
    pub wrong_records: usize,
    pub incomplete_records: usize,
    pub first_timestamp: Option<chrono::NaiveDateTime>,
    pub last_timestamp: Option<chrono::NaiveDateTime>,
}

impl StationStatistics {
    pub fn good_fraction(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.good_records as f64 / self.total_records as f64
    }
}

impl QcReport {
    pub fn from_records(records: &[QcRecord]) -> Self {
        let mut report = QcReport {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records {
            *report.label_counts.entry(record.label).or_default() += 1;

            if !record.qc.is_complete() {
                report.test_failures.incomplete += 1;
            }
            if !record.qc.is_range_ok() {
                report.test_failures.out_of_range += 1;
            }
            if !record.qc.has_no_steps() {
                report.test_failures.steps += 1;
            }
            if !record.qc.has_no_persistence() {
                report.test_failures.persistence += 1;
            }

            let stats = report
                .station_statistics
                .entry(record.station_id.clone())
                .or_default();

            stats.total_records += 1;
            match record.label {
                QualityLabel::Good => stats.good_records += 1,
                QualityLabel::Suspicious => stats.suspicious_records += 1,
                QualityLabel::Wrong => stats.wrong_records += 1,
                QualityLabel::Incomplete => stats.incomplete_records += 1,
            }

            stats.first_timestamp = Some(
                stats
                    .first_timestamp
                    .map_or(record.timestamp, |t| t.min(record.timestamp)),
            );
            stats.last_timestamp = Some(
                stats
                    .last_timestamp
                    .map_or(record.timestamp, |t| t.max(record.timestamp)),
            );
        }

        report
    }

    /// Fold another report in, e.g. when checking a directory file by file.
    pub fn merge(&mut self, other: QcReport) {
        self.total_records += other.total_records;
        for (label, count) in other.label_counts {
            *self.label_counts.entry(label).or_default() += count;
        }

        self.test_failures.incomplete += other.test_failures.incomplete;
        self.test_failures.out_of_range += other.test_failures.out_of_range;
        self.test_failures.steps += other.test_failures.steps;
        self.test_failures.persistence += other.test_failures.persistence;

        for (station_id, theirs) in other.station_statistics {
            let ours = self.station_statistics.entry(station_id).or_default();
            ours.total_records += theirs.total_records;
            ours.good_records += theirs.good_records;
            ours.suspicious_records += theirs.suspicious_records;
            ours.wrong_records += theirs.wrong_records;
            ours.incomplete_records += theirs.incomplete_records;
            ours.first_timestamp = match (ours.first_timestamp, theirs.first_timestamp) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            ours.last_timestamp = match (ours.last_timestamp, theirs.last_timestamp) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
    }

    pub fn count(&self, label: QualityLabel) -> usize {
        self.label_counts.get(&label).copied().unwrap_or(0)
    }

    fn percent(&self, count: usize) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        100.0 * count as f64 / self.total_records as f64
    }

    /// Render a plain-text summary report
    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Quality Check Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", self.total_records));
        summary.push_str(&format!("Stations: {}\n", self.station_statistics.len()));

        summary.push_str("\nLabels:\n");
        for label in QualityLabel::ALL.iter().rev() {
            let count = self.count(*label);
            summary.push_str(&format!(
                "  {:<11} {:>8} ({:.1}%)\n",
                label.as_str(),
                count,
                self.percent(count)
            ));
        }

        summary.push_str("\nFailed Tests:\n");
        summary.push_str(&format!("  complete    {:>8}\n", self.test_failures.incomplete));
        summary.push_str(&format!("  range       {:>8}\n", self.test_failures.out_of_range));
        summary.push_str(&format!("  step        {:>8}\n", self.test_failures.steps));
        summary.push_str(&format!("  persistence {:>8}\n", self.test_failures.persistence));

        let mut worst: Vec<(&String, &StationStatistics)> = self.station_statistics.iter().collect();
        worst.sort_by(|a, b| a.1.good_fraction().total_cmp(&b.1.good_fraction()));

        if !worst.is_empty() {
            summary.push_str("\nLowest Quality Stations:\n");
            for (i, (station_id, stats)) in worst.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {}: {:.1}% good of {} rows (incomplete {}, wrong {}, suspicious {})\n",
                    i + 1,
                    station_id,
                    100.0 * stats.good_fraction(),
                    stats.total_records,
                    stats.incomplete_records,
                    stats.wrong_records,
                    stats.suspicious_records
                ));
            }
        }

        summary
    }
}

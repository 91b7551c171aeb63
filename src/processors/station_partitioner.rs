use crate::error::{QcError, Result};
use crate::models::{Observation, QcRecord, StationSeries};
use crate::processors::QualityChecker;
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Splits a multi-station series by station, checks every station on its
/// own, and puts the results back in input order.
pub struct StationPartitioner {
    max_workers: usize,
    station_filter: Option<String>,
}

/// Row indices of one station, sorted by timestamp.
struct StationGroup<'a> {
    station_id: &'a str,
    indices: Vec<usize>,
}

impl StationPartitioner {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            station_filter: None,
        }
    }

    pub fn with_station_filter(mut self, station_id: Option<String>) -> Self {
        self.station_filter = station_id;
        self
    }

    /// One record per input row, `result[i]` annotating `rows[i]`.
    ///
    /// With a station filter set, rows of other stations are dropped and the
    /// output follows the order of the kept rows.
    pub fn check_all_stations(
        &self,
        checker: &QualityChecker,
        rows: &[Observation],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<QcRecord>> {
        let rows: Vec<&Observation> = match &self.station_filter {
            Some(id) => rows.iter().filter(|r| &r.station_id == id).collect(),
            None => rows.iter().collect(),
        };

        let groups = self.partition(&rows)?;
        let total_stations = groups.len();
        let processed_count = AtomicUsize::new(0);

        info!(
            "Checking {} rows across {} stations with {} workers",
            rows.len(),
            total_stations,
            self.max_workers
        );
        if let Some(p) = progress {
            p.set_message(&format!("Checking {} stations...", total_stations));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| QcError::Config(e.to_string()))?;

        let station_results: Result<Vec<Vec<(usize, QcRecord)>>> = pool.install(|| {
            groups
                .par_iter()
                .map(|group| {
                    let result = Self::check_group(checker, &rows, group);

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    result
                })
                .collect()
        });

        let mut slots: Vec<Option<QcRecord>> = vec![None; rows.len()];
        for (index, record) in station_results?.into_iter().flatten() {
            slots[index] = Some(record);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    QcError::InvalidFormat(format!("row {} was not assigned to a station", index))
                })
            })
            .collect()
    }

    /// Group row indices by station, ordering each group by timestamp.
    fn partition<'a>(&self, rows: &[&'a Observation]) -> Result<Vec<StationGroup<'a>>> {
        let mut by_station: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
        for (index, row) in rows.iter().enumerate() {
            by_station
                .entry(row.station_id.as_str())
                .or_default()
                .push(index);
        }

        let mut groups = Vec::with_capacity(by_station.len());
        for (station_id, mut indices) in by_station {
            // stable sort keeps input order for equal keys, which are rejected below
            indices.sort_by_key(|&i| rows[i].timestamp);

            for pair in indices.windows(2) {
                if rows[pair[0]].timestamp == rows[pair[1]].timestamp {
                    return Err(QcError::DuplicateTimestamp {
                        station_id: station_id.to_string(),
                        timestamp: rows[pair[1]].timestamp,
                    });
                }
            }

            groups.push(StationGroup {
                station_id,
                indices,
            });
        }

        Ok(groups)
    }

    fn check_group(
        checker: &QualityChecker,
        rows: &[&Observation],
        group: &StationGroup<'_>,
    ) -> Result<Vec<(usize, QcRecord)>> {
        let series = StationSeries::new(
            group.station_id.to_string(),
            group.indices.iter().map(|&i| rows[i].clone()).collect(),
        );
        let records = checker.check_station(&series).map_err(|e| {
            warn!("Station {} failed: {}", group.station_id, e);
            e
        })?;

        Ok(group.indices.iter().copied().zip(records).collect())
    }
}

impl Default for StationPartitioner {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QcSettings;
    use crate::models::QualityLabel;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;

    fn checker() -> QualityChecker {
        QualityChecker::new(
            QcSettings::builder()
                .check_var("a")
                .range("a", 0.0, 2.0)
                .step("a", 1.0)
                .variation("a", 1.1, 1.0, 3.0)
                .window(3)
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    fn at(step: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(10 * step)
    }

    fn obs(station: &str, step: i64, a: Option<f64>) -> Observation {
        Observation::new(at(step), station).with_value("a", a)
    }

    #[test]
    fn test_stations_are_isolated() {
        // interleaved stations: A is flat inside the sub-range, B varies
        let rows = vec![
            obs("A", 0, Some(1.0)),
            obs("B", 0, Some(0.1)),
            obs("A", 1, Some(1.0)),
            obs("B", 1, Some(0.9)),
            obs("A", 2, Some(1.0)),
            obs("B", 2, Some(1.8)),
        ];

        let records = StationPartitioner::new(2)
            .check_all_stations(&checker(), &rows, None)
            .unwrap();

        assert_eq!(records.len(), rows.len());
        for (record, row) in records.iter().zip(&rows) {
            assert_eq!(record.station_id, row.station_id);
            assert_eq!(record.timestamp, row.timestamp);
        }
        assert_eq!(records[4].label, QualityLabel::Suspicious);
        assert_eq!(records[5].label, QualityLabel::Good);

        let alone: Vec<Observation> = rows.iter().filter(|r| r.station_id == "B").cloned().collect();
        let expected = checker().quality_check(&alone).unwrap();
        assert_eq!(vec![records[1].clone(), records[3].clone(), records[5].clone()], expected);
    }

    #[test]
    fn test_unsorted_input_keeps_row_alignment() {
        let rows = vec![
            obs("A", 2, Some(1.5)),
            obs("A", 0, Some(0.5)),
            obs("A", 1, Some(1.0)),
        ];

        let records = StationPartitioner::new(1)
            .check_all_stations(&checker(), &rows, None)
            .unwrap();

        assert_eq!(records[1].timestamp, at(0));
        // first in time, so no predecessor
        assert!(!records[1].qc.has_no_steps());
        assert!(records[2].qc.has_no_steps());
        assert!(records[0].qc.has_no_steps());
    }

    #[test]
    fn test_duplicate_timestamps_rejected() {
        let rows = vec![obs("A", 0, Some(1.0)), obs("A", 0, Some(1.1))];
        let result = StationPartitioner::new(1).check_all_stations(&checker(), &rows, None);
        assert!(matches!(result, Err(QcError::DuplicateTimestamp { .. })));
    }

    #[test]
    fn test_station_filter() {
        let rows = vec![obs("A", 0, Some(1.0)), obs("B", 0, Some(1.0))];
        let records = StationPartitioner::new(1)
            .with_station_filter(Some("B".to_string()))
            .check_all_stations(&checker(), &rows, None)
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].station_id, "B");
    }

    #[test]
    fn test_empty_input() {
        let records = StationPartitioner::default()
            .check_all_stations(&checker(), &[], None)
            .unwrap();
        assert!(records.is_empty());
    }
}

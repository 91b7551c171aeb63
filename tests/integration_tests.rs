use chrono::{Duration, NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use station_qc::config::{Preset, QcSettings};
use station_qc::models::{Observation, QcFlags, QualityLabel};
use station_qc::processors::{QcReport, QualityChecker, StationPartitioner};
use station_qc::readers::ObservationReader;
use station_qc::writers::{write_results, ParquetWriter};
use station_qc::QcError;
use std::fs;
use tempfile::TempDir;

fn ts(step: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 7, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(10 * step)
}

fn series(values: &[Option<f64>]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Observation::new(ts(i as i64), "ST01").with_value("a", *v))
        .collect()
}

fn scenario_checker() -> QualityChecker {
    let settings = QcSettings::builder()
        .check_var("a")
        .range("a", 0.0, 2.0)
        .step("a", 1.0)
        .window(3)
        .variation("a", 1.1, 1.0, 3.0)
        .build()
        .unwrap();
    QualityChecker::new(settings).unwrap()
}

fn labels(checker: &QualityChecker, values: &[Option<f64>]) -> Vec<QualityLabel> {
    checker
        .quality_check(&series(values))
        .unwrap()
        .into_iter()
        .map(|r| r.label)
        .collect()
}

#[test]
fn test_flat_series_becomes_suspicious_once_window_fills() {
    let checker = scenario_checker();
    let flags = checker.check_series(&series(&[Some(1.0); 3])).unwrap();

    let last = flags[2];
    assert!(last.is_complete());
    assert!(last.is_range_ok());
    assert!(last.has_no_steps());
    assert!(!last.has_no_persistence());
    assert_eq!(last.label(), QualityLabel::Suspicious);

    // first row has no predecessor, second row is GOOD
    assert_eq!(
        labels(&checker, &[Some(1.0); 3]),
        vec![
            QualityLabel::Suspicious,
            QualityLabel::Good,
            QualityLabel::Suspicious
        ]
    );
}

#[test]
fn test_missing_first_value_is_incomplete() {
    let checker = scenario_checker();
    let flags = checker
        .check_series(&series(&[None, Some(1.0), Some(1.0)]))
        .unwrap();

    assert!(!flags[0].is_complete());
    assert!(!flags[0].is_range_ok());
    assert_eq!(flags[0].label(), QualityLabel::Incomplete);
}

#[test]
fn test_out_of_range_series_is_wrong_but_not_stuck() {
    let checker = scenario_checker();
    let flags = checker.check_series(&series(&[Some(3.5); 3])).unwrap();

    for mask in &flags {
        assert!(!mask.is_range_ok());
        assert!(mask.has_no_persistence());
        assert_eq!(mask.label(), QualityLabel::Wrong);
    }
}

#[test]
fn test_unordered_series_is_rejected() {
    let checker = scenario_checker();
    let mut rows = series(&[Some(1.0), Some(1.2)]);
    rows.swap(0, 1);

    assert!(matches!(
        checker.check_series(&rows),
        Err(QcError::UnorderedSeries { .. })
    ));
}

#[test]
fn test_csv_to_csv_multi_station() -> station_qc::Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("network.csv");
    // stations interleaved, ST02 out of time order
    fs::write(
        &input,
        "date,station_id,a\n\
         2023-07-15 00:00:00,ST01,1.0\n\
         2023-07-15 00:10:00,ST02,0.5\n\
         2023-07-15 00:10:00,ST01,1.5\n\
         2023-07-15 00:00:00,ST02,0.4\n\
         2023-07-15 00:20:00,ST01,NaN\n",
    )?;

    let table = ObservationReader::new().read_observations(&input)?;
    let checker = scenario_checker();
    let records = StationPartitioner::new(2).check_all_stations(&checker, &table.observations, None)?;

    let summary: Vec<(&str, QualityLabel)> = records
        .iter()
        .map(|r| (r.station_id.as_str(), r.label))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ST01", QualityLabel::Suspicious),
            ("ST02", QualityLabel::Good),
            ("ST01", QualityLabel::Good),
            ("ST02", QualityLabel::Suspicious),
            ("ST01", QualityLabel::Incomplete),
        ]
    );

    let output = dir.path().join("network_QC.csv");
    write_results(&output, &records, "snappy", "date", "station_id")?;
    let written = fs::read_to_string(&output)?;
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "date,station_id,QC,QC_label");
    assert_eq!(lines[2], "2023-07-15 00:10:00,ST02,29,GOOD");
    assert_eq!(lines.len(), 6);

    let report = QcReport::from_records(&records);
    assert_eq!(report.count(QualityLabel::Good), 2);
    assert_eq!(report.station_statistics.len(), 2);
    Ok(())
}

#[test]
fn test_duplicate_timestamps_are_rejected() {
    let rows = vec![
        Observation::new(ts(0), "ST01").with_value("a", Some(1.0)),
        Observation::new(ts(0), "ST01").with_value("a", Some(1.1)),
    ];
    let result = StationPartitioner::new(1).check_all_stations(&scenario_checker(), &rows, None);
    assert!(matches!(result, Err(QcError::DuplicateTimestamp { .. })));
}

#[test]
fn test_parquet_output_round_trip() -> station_qc::Result<()> {
    let dir = TempDir::new()?;
    let checker = QualityChecker::new(Preset::Short.settings()?)?;

    let rows: Vec<Observation> = (0..20)
        .map(|i| {
            Observation::new(ts(i), "ST09")
                .with_value("t", Some(15.0 + 0.3 * i as f64))
                .with_value("h", Some(60.0))
                .with_value("p", Some(0.0))
                .with_value("ws", Some(2.0 + (i % 3) as f64))
                .with_value("wd", Some(180.0))
        })
        .collect();
    let records = checker.quality_check(&rows)?;

    let output = dir.path().join("st09_QC.parquet");
    write_results(&output, &records, "zstd", "date", "station_id")?;

    let writer = ParquetWriter::new();
    assert_eq!(writer.get_file_info(&output)?.total_rows, 20);
    assert_eq!(writer.read_records(&output, 100)?, records);

    // flat humidity inside the persistence sub-range is flagged once the window fills
    assert_eq!(records[1].label, QualityLabel::Good);
    assert!(records[2..].iter().all(|r| r.label == QualityLabel::Suspicious));
    Ok(())
}

#[test]
fn test_partial_configuration_file() -> station_qc::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("qc.json");
    fs::write(&path, r#"{ "ranges": { "t": [-10.0, 40.0] } }"#)?;

    let settings = QcSettings::from_file(&path)?;
    assert_eq!(settings.window, 12);
    assert!(settings.steps.is_empty());

    let checker = QualityChecker::new(settings)?;
    let rows = vec![
        Observation::new(ts(0), "ST01").with_value("t", Some(20.0)),
        Observation::new(ts(1), "ST01").with_value("t", Some(45.0)),
    ];
    let flags = checker.check_series(&rows)?;

    // no step thresholds configured, so even the first row passes the step test
    assert_eq!(flags[0], QcFlags::all());
    assert_eq!(flags[1].label(), QualityLabel::Wrong);
    Ok(())
}

#[test]
fn test_label_precedence() {
    assert_eq!(QcFlags::NONE.label(), QualityLabel::Incomplete);
    assert_eq!(QcFlags::COMPLETE.label(), QualityLabel::Wrong);
    assert_eq!(
        (QcFlags::COMPLETE | QcFlags::RANGE_OK).label(),
        QualityLabel::Suspicious
    );
    assert_eq!(
        (QcFlags::COMPLETE | QcFlags::RANGE_OK | QcFlags::NO_STEPS).label(),
        QualityLabel::Suspicious
    );
    assert_eq!(QcFlags::all().label(), QualityLabel::Good);
}

#[test]
fn test_upper_case_column_matches_configured_variable() -> station_qc::Result<()> {
    let dir = TempDir::new()?;
    let config = dir.path().join("qc.toml");
    fs::write(&config, "vars_checked = [\"ws\"]\n\n[ranges]\nws = [0.0, 75.0]\n")?;
    let input = dir.path().join("wind.csv");
    fs::write(
        &input,
        "date,station_id,WS\n2023-07-15 00:00:00,ST01,3.5\n2023-07-15 00:10:00,ST01,80.0\n",
    )?;

    let settings = QcSettings::from_file(&config)?;
    let table = ObservationReader::new().read_observations(&input)?;
    assert!(table.missing_variables(&settings).is_empty());

    let flags = QualityChecker::new(settings)?.check_series(&table.observations)?;
    assert_eq!(flags[0], QcFlags::all());
    assert!(flags[1].is_complete());
    assert_eq!(flags[1].label(), QualityLabel::Wrong);
    Ok(())
}

use crate::cli::args::{Cli, Commands, InputArgs, SettingsArgs};
use crate::config::{variable_info, QcSettings};
use crate::error::{QcError, Result};
use crate::models::{QcFlags, QualityLabel};
use crate::processors::{QcReport, QualityChecker, StationPartitioner};
use crate::readers::ObservationReader;
use crate::utils::constants::CSV_EXTENSION;
use crate::utils::progress::ProgressReporter;
use crate::utils::{default_output_path, is_qc_output, output_path_in_dir, OutputFormat};
use crate::writers::{write_results, ParquetWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn, Level};

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Check {
            input,
            output,
            options,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&input));
            let settings = resolve_settings(&options.settings)?;

            println!("Checking observations...");
            println!("Input file: {}", input.display());
            if !options.summary_only {
                println!("Output file: {}", output.display());
            }

            let report = tokio::task::spawn_blocking(move || {
                let progress = ProgressReporter::new_spinner("Reading observations...", false);
                let report = check_file(&input, &output, &options, &settings, Some(&progress));
                progress.finish_with_message("Quality check complete");
                report
            })
            .await??;

            println!("\n{}", report.generate_summary());
        }

        Commands::CheckDirectory {
            input_dir,
            output_dir,
            format,
            file_pattern,
            options,
        } => {
            let format: OutputFormat = format.parse()?;
            let settings = resolve_settings(&options.settings)?;
            let files = find_input_files(&input_dir, &file_pattern)?;

            println!("Checking {} files in {}", files.len(), input_dir.display());
            if files.is_empty() {
                println!("No input files found");
                return Ok(());
            }

            if let Some(dir) = &output_dir {
                std::fs::create_dir_all(dir)?;
            }

            let progress = ProgressReporter::new(files.len() as u64, "Checking files...", false);
            let mut combined = QcReport::default();
            let mut failed_files = Vec::new();

            for (i, input) in files.into_iter().enumerate() {
                let output = match &output_dir {
                    Some(dir) => output_path_in_dir(&input, dir, format),
                    None => output_path_in_dir(
                        &input,
                        input.parent().unwrap_or_else(|| Path::new(".")),
                        format,
                    ),
                };
                progress.set_message(&format!("Checking {}", input.display()));

                let task_options = options.clone();
                let task_settings = settings.clone();
                let task_input = input.clone();
                let result = tokio::task::spawn_blocking(move || {
                    check_file(&task_input, &output, &task_options, &task_settings, None)
                })
                .await?;

                match result {
                    Ok(report) => {
                        progress.println(&format!(
                            "{}: {} rows, {} good",
                            input.display(),
                            report.total_records,
                            report.count(QualityLabel::Good)
                        ));
                        combined.merge(report);
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", input.display(), e);
                        failed_files.push(input);
                    }
                }

                progress.update((i + 1) as u64);
            }

            progress.finish_with_message("Directory check complete");
            println!("\n{}", combined.generate_summary());

            if !failed_files.is_empty() {
                println!("{} files could not be checked:", failed_files.len());
                for file in &failed_files {
                    println!("  {}", file.display());
                }
            }
        }

        Commands::ShowConfig {
            settings,
            variables,
        } => {
            let resolved = resolve_settings(&settings)?;
            if variables {
                println!("{}", describe_variables(&resolved));
            } else {
                println!("{}", resolved.to_json()?);
            }
        }

        Commands::Explain { qc } => {
            println!("{}", explain(qc)?);
        }
    }

    Ok(())
}

/// Set up logging: INFO by default, DEBUG with `--verbose`, optionally to a file.
fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let result = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| QcError::Config(format!("Failed to initialise logging: {}", e)))?;
    debug!("Logging initialized at level: {}", level);
    Ok(())
}

/// A config file wins over the preset.
pub fn resolve_settings(args: &SettingsArgs) -> Result<QcSettings> {
    match &args.config {
        Some(path) => QcSettings::from_file(path),
        None => {
            debug!("Using preset '{}'", args.preset.name());
            args.preset.settings()
        }
    }
}

/// Read, check and (unless `summary_only`) write one observation file.
pub fn check_file(
    input: &Path,
    output: &Path,
    options: &InputArgs,
    settings: &QcSettings,
    progress: Option<&ProgressReporter>,
) -> Result<QcReport> {
    let checker = QualityChecker::new(settings.clone())?;
    let reader = ObservationReader::new()
        .with_time_column(options.time_column.as_str())
        .with_station_column(options.station_column.as_str())
        .with_default_station(options.default_station.clone());

    let table = reader.read_observations(input)?;
    info!("Read {} rows from {}", table.len(), input.display());

    for var in table.missing_variables(checker.settings()) {
        warn!(
            "{}: configured variable '{}' has no column and is read as missing on every row",
            input.display(),
            var
        );
    }

    let partitioner = StationPartitioner::new(options.max_workers)
        .with_station_filter(options.station_id.clone());
    let records = partitioner.check_all_stations(&checker, &table.observations, progress)?;

    let report = QcReport::from_records(&records);

    if options.summary_only {
        return Ok(report);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    write_results(
        output,
        &records,
        &options.compression,
        &options.time_column,
        &options.station_column,
    )?;
    info!("Wrote {} QC records to {}", records.len(), output.display());

    if OutputFormat::from_path(output)? == OutputFormat::Parquet {
        let file_info = ParquetWriter::new().get_file_info(output)?;
        debug!("{}", file_info.summary());
    }

    Ok(report)
}

/// CSV files in `dir` whose name contains `pattern`, skipping earlier QC output.
pub fn find_input_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || is_qc_output(&path) {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(CSV_EXTENSION));
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(pattern));

        if is_csv && matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// One line per configured variable with the tests that use it, plus its
/// description and unit when it is a catalogued name.
pub fn describe_variables(settings: &QcSettings) -> String {
    let mut text = String::from("Configured variables:\n");

    for var in settings.configured_variables() {
        let mut tests = Vec::new();
        if settings.vars_checked.iter().any(|v| v == var) {
            tests.push("complete");
        }
        if settings.ranges.contains_key(var) {
            tests.push("range");
        }
        if settings.steps.contains_key(var) {
            tests.push("step");
        }
        if settings.variations.contains_key(var) {
            tests.push("persistence");
        }

        let about = match variable_info(var) {
            Some(info) => format!("{} ({})", info.description, info.unit),
            None => "uncatalogued".to_string(),
        };
        text.push_str(&format!("  {:<6} {:<28} {}\n", var, about, tests.join(", ")));
    }

    text
}

/// Human-readable breakdown of a QC value.
pub fn explain(qc: u16) -> Result<String> {
    let flags = QcFlags::from_bits(qc)?;
    let tests = [
        ("complete", flags.is_complete()),
        ("range", flags.is_range_ok()),
        ("step", flags.has_no_steps()),
        ("persistence", flags.has_no_persistence()),
    ];

    let mut text = format!("QC {} ({:#07b})\n", qc, qc);
    for (name, passed) in tests {
        text.push_str(&format!(
            "  {:<12} {}\n",
            name,
            if passed { "pass" } else { "FAIL" }
        ));
    }
    text.push_str(&format!("Label: {}", flags.label()));
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use std::fs;
    use tempfile::TempDir;

    fn input_args() -> InputArgs {
        InputArgs {
            settings: SettingsArgs {
                config: None,
                preset: Preset::Standard,
            },
            station_id: None,
            time_column: "date".to_string(),
            station_column: "station_id".to_string(),
            default_station: None,
            compression: "snappy".to_string(),
            max_workers: 2,
            summary_only: false,
        }
    }

    #[test]
    fn test_explain() {
        let text = explain(29).unwrap();
        assert!(text.contains("Label: GOOD"));
        assert!(!text.contains("FAIL"));

        let text = explain(13).unwrap();
        assert!(text.contains("persistence  FAIL"));
        assert!(text.ends_with("Label: SUSPICIOUS"));

        assert!(explain(2).is_err());
    }

    #[test]
    fn test_find_input_files() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("b_station.csv"), "")?;
        fs::write(dir.path().join("a_station.CSV"), "")?;
        fs::write(dir.path().join("a_station_QC.csv"), "")?;
        fs::write(dir.path().join("notes.txt"), "")?;
        fs::write(dir.path().join("other.csv"), "")?;

        let files = find_input_files(dir.path(), "station")?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_station.CSV", "b_station.csv"]);
        Ok(())
    }

    #[test]
    fn test_check_file_writes_output() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("obs.csv");
        fs::write(
            &input,
            "date,station_id,t,h,p,ws\n\
             2023-07-15 12:00:00,ST01,20.0,50,0,3.0\n\
             2023-07-15 12:10:00,ST01,25.0,50,0,3.1\n",
        )?;
        let output = dir.path().join("out").join("obs_QC.csv");

        let report = check_file(
            &input,
            &output,
            &input_args(),
            &Preset::Standard.settings()?,
            None,
        )?;

        assert_eq!(report.total_records, 2);
        let written = fs::read_to_string(&output)?;
        assert_eq!(written.lines().count(), 3);
        assert!(written.starts_with("date,station_id,QC,QC_label"));
        Ok(())
    }

    #[test]
    fn test_check_file_keeps_input_column_names() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("obs.csv");
        fs::write(
            &input,
            "time,station,T\n\
             2023-07-15 12:00:00,ST01,20.0\n\
             2023-07-15 12:10:00,ST01,20.5\n",
        )?;
        let output = dir.path().join("obs_QC.csv");

        let mut options = input_args();
        options.time_column = "time".to_string();
        options.station_column = "station".to_string();
        let settings = QcSettings::builder()
            .check_var("t")
            .range("t", -30.0, 50.0)
            .build()?;

        let report = check_file(&input, &output, &options, &settings, None)?;

        // upper-case T column matches the lower-case t variable
        assert_eq!(report.count(QualityLabel::Good), 2);
        let written = fs::read_to_string(&output)?;
        assert_eq!(written.lines().next(), Some("time,station,QC,QC_label"));
        Ok(())
    }

    #[test]
    fn test_parquet_file_info_reports_written_compression() -> Result<()> {
        use parquet::basic::Compression;

        let dir = TempDir::new()?;
        let input = dir.path().join("obs.csv");
        fs::write(&input, "date,station_id,t\n2023-07-15 12:00:00,ST01,20.0\n")?;
        let output = dir.path().join("obs_QC.parquet");

        let mut options = input_args();
        options.compression = "zstd".to_string();
        check_file(&input, &output, &options, &Preset::Standard.settings()?, None)?;

        let info = ParquetWriter::new().get_file_info(&output)?;
        assert!(matches!(info.compression, Compression::ZSTD(_)), "{:?}", info.compression);
        Ok(())
    }

    #[test]
    fn test_describe_variables() -> Result<()> {
        let text = describe_variables(&Preset::Short.settings()?);
        assert!(text.contains("wind direction (deg)"));
        assert!(text.lines().any(|l| l.contains("wd") && l.ends_with("range")));
        assert!(text
            .lines()
            .any(|l| l.contains("relative humidity") && l.ends_with("complete, range, step, persistence")));

        let custom = QcSettings::builder().step("dew", 1.0).build()?;
        assert!(describe_variables(&custom).contains("uncatalogued"));
        Ok(())
    }

    #[test]
    fn test_summary_only_skips_output() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("obs.csv");
        fs::write(&input, "date,station_id,t\n2023-07-15 12:00:00,ST01,20.0\n")?;
        let output = dir.path().join("obs_QC.csv");

        let mut options = input_args();
        options.summary_only = true;
        check_file(&input, &output, &options, &Preset::Standard.settings()?, None)?;

        assert!(!output.exists());
        Ok(())
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Preset;
use crate::utils::constants::{DEFAULT_STATION_COLUMN, DEFAULT_TIME_COLUMN};

#[derive(Parser)]
#[command(name = "station-qc")]
#[command(about = "Quality control for weather station time series")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

/// Where the QC thresholds come from.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    #[arg(
        long,
        help = "Threshold file (TOML, JSON or YAML); overrides --preset",
        conflicts_with = "preset"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Preset::Standard)]
    pub preset: Preset,
}

/// Input layout and processing options shared by `check` and `check-directory`.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[arg(short, long, help = "Only check this station")]
    pub station_id: Option<String>,

    #[arg(long, default_value = DEFAULT_TIME_COLUMN)]
    pub time_column: String,

    #[arg(long, default_value = DEFAULT_STATION_COLUMN)]
    pub station_column: String,

    #[arg(
        long,
        help = "Station id for files without a station column"
    )]
    pub default_station: Option<String>,

    #[arg(short, long, default_value = "snappy")]
    pub compression: String,

    #[arg(long, default_value_t = num_cpus::get())]
    pub max_workers: usize,

    #[arg(long, default_value = "false", help = "Print the report without writing output")]
    pub summary_only: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check one observation file
    Check {
        #[arg(short, long, help = "Input CSV file")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Output file, .csv or .parquet [default: <input>_QC.csv]"
        )]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: InputArgs,
    },

    /// Check every CSV file in a directory
    CheckDirectory {
        #[arg(short, long, help = "Input directory containing CSV files")]
        input_dir: PathBuf,

        #[arg(
            short,
            long,
            help = "Output directory [default: next to each input file]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(long, default_value = "csv", help = "Output format: csv or parquet")]
        format: String,

        #[arg(
            long,
            help = "Only process files whose name contains this text",
            default_value = ""
        )]
        file_pattern: String,

        #[command(flatten)]
        options: InputArgs,
    },

    /// Print the resolved QC settings as JSON
    ShowConfig {
        #[command(flatten)]
        settings: SettingsArgs,

        #[arg(long, help = "List configured variables with their tests and units instead of JSON")]
        variables: bool,
    },

    /// Decode a QC value into its test results and label
    Explain {
        #[arg(help = "QC value from an output file, e.g. 29")]
        qc: u16,
    },
}

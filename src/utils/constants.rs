/// Input column names
pub const DEFAULT_TIME_COLUMN: &str = "date";
pub const DEFAULT_STATION_COLUMN: &str = "station_id";

/// Output column names
pub const QC_COLUMN: &str = "QC";
pub const QC_LABEL_COLUMN: &str = "QC_label";

/// Cell values read as a missing reading
pub const MISSING_MARKERS: [&str; 6] = ["", "NaN", "nan", "NA", "null", "None"];

/// Accepted timestamp layouts, tried in order
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persistence window (rows) when none is configured: two hours of 10-minute data
pub const DEFAULT_WINDOW: usize = 12;
pub const MIN_WINDOW: usize = 2;

/// Outcome of a test that cannot be evaluated for lack of history
pub const UNEVALUABLE_STEP_PASSES: bool = false;
pub const UNEVALUABLE_PERSISTENCE_PASSES: bool = true;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "STATION_QC";

/// Output file naming
pub const QC_FILE_SUFFIX: &str = "_QC";
pub const CSV_EXTENSION: &str = "csv";
pub const PARQUET_EXTENSION: &str = "parquet";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

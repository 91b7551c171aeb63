pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::CsvWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

use crate::error::Result;
use crate::models::QcRecord;
use crate::utils::OutputFormat;
use std::path::Path;

/// Write QC records in the format implied by the output path's extension.
///
/// CSV output reuses the input's time and station column names; Parquet
/// output has a fixed schema.
pub fn write_results(
    path: &Path,
    records: &[QcRecord],
    compression: &str,
    time_column: &str,
    station_column: &str,
) -> Result<()> {
    match OutputFormat::from_path(path)? {
        OutputFormat::Csv => CsvWriter::new()
            .with_columns(time_column, station_column)
            .write_records(records, path),
        OutputFormat::Parquet => ParquetWriter::new()
            .with_compression(compression)?
            .write_records(records, path),
    }
}

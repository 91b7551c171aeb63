use crate::error::Result;
use crate::models::QcRecord;
use crate::utils::constants::{
    DEFAULT_STATION_COLUMN, DEFAULT_TIME_COLUMN, OUTPUT_TIMESTAMP_FORMAT, QC_COLUMN,
    QC_LABEL_COLUMN,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes one `date,station_id,QC,QC_label` line per record.
pub struct CsvWriter {
    time_column: String,
    station_column: String,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            station_column: DEFAULT_STATION_COLUMN.to_string(),
        }
    }

    /// Reuse the input file's column names in the output.
    pub fn with_columns(mut self, time_column: &str, station_column: &str) -> Self {
        self.time_column = time_column.to_string();
        self.station_column = station_column.to_string();
        self
    }

    pub fn write_records(&self, records: &[QcRecord], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(records, file)
    }

    pub fn write_to<W: Write>(&self, records: &[QcRecord], writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            self.time_column.as_str(),
            self.station_column.as_str(),
            QC_COLUMN,
            QC_LABEL_COLUMN,
        ])?;

        for record in records {
            csv_writer.write_record([
                record.timestamp.format(OUTPUT_TIMESTAMP_FORMAT).to_string(),
                record.station_id.clone(),
                record.qc_value().to_string(),
                record.label.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

use crate::error::{QcError, Result};
use crate::models::{QcFlags, QcRecord};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_BATCH_SIZE, DEFAULT_ROW_GROUP_SIZE, DEFAULT_STATION_COLUMN, QC_COLUMN,
    QC_LABEL_COLUMN,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const TIMESTAMP_COLUMN: &str = "timestamp";

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(QcError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write QC records to a Parquet file. An empty slice still produces a
    /// file carrying the schema.
    pub fn write_records(&self, records: &[QcRecord], path: &Path) -> Result<()> {
        self.write_records_batched(records, path, DEFAULT_BATCH_SIZE)
    }

    /// Write records in batches for memory efficiency
    pub fn write_records_batched(
        &self,
        records: &[QcRecord],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        let schema = self.create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in records.chunks(batch_size.max(1)) {
            let batch = self.records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        let fields = vec![
            Field::new(DEFAULT_STATION_COLUMN, DataType::Utf8, false),
            Field::new(
                TIMESTAMP_COLUMN,
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
            Field::new(QC_COLUMN, DataType::UInt16, false),
            Field::new(QC_LABEL_COLUMN, DataType::Utf8, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(&self, records: &[QcRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
        let station_ids: Vec<&str> = records.iter().map(|r| r.station_id.as_str()).collect();
        let timestamps: Vec<i64> = records
            .iter()
            .map(|r| r.timestamp.and_utc().timestamp_millis())
            .collect();
        let qc_values: Vec<u16> = records.iter().map(|r| r.qc_value()).collect();
        let labels: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(station_ids)),
                Arc::new(TimestampMillisecondArray::from(timestamps)),
                Arc::new(UInt16Array::from(qc_values)),
                Arc::new(StringArray::from(labels)),
            ],
        )?;

        Ok(batch)
    }

    /// Read QC records back from a file written by this writer, up to `limit` rows.
    pub fn read_records(&self, path: &Path, limit: usize) -> Result<Vec<QcRecord>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, DEFAULT_BATCH_SIZE))
            .build()?;

        let mut records = Vec::new();

        for batch_result in parquet_reader {
            let batch = batch_result?;

            let station_ids = batch
                .column(0)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| column_type_error(DEFAULT_STATION_COLUMN))?;
            let timestamps = batch
                .column(1)
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(|| column_type_error(TIMESTAMP_COLUMN))?;
            let qc_values = batch
                .column(2)
                .as_any()
                .downcast_ref::<UInt16Array>()
                .ok_or_else(|| column_type_error(QC_COLUMN))?;

            for i in 0..batch.num_rows() {
                if records.len() >= limit {
                    return Ok(records);
                }

                let timestamp = DateTime::from_timestamp_millis(timestamps.value(i))
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| {
                        QcError::InvalidFormat("Timestamp out of range in Parquet file".to_string())
                    })?;

                // the label column is derived, so it is recomputed from the mask
                records.push(QcRecord::new(
                    station_ids.value(i).to_string(),
                    timestamp,
                    QcFlags::from_bits(qc_values.value(i))?,
                ));
            }
        }

        Ok(records)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        // codec as stored in the file, not this writer's setting
        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            self.compression
        };

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }
}

fn column_type_error(column: &str) -> QcError {
    QcError::InvalidFormat(format!("Invalid {} column type", column))
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}

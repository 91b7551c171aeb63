use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{QcError, Result};
use crate::utils::constants::{CSV_EXTENSION, PARQUET_EXTENSION, QC_FILE_SUFFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    /// Pick the writer from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some(CSV_EXTENSION) => Ok(OutputFormat::Csv),
            Some(PARQUET_EXTENSION) => Ok(OutputFormat::Parquet),
            _ => Err(QcError::InvalidFormat(format!(
                "Unsupported output extension: {}",
                path.display()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => CSV_EXTENSION,
            OutputFormat::Parquet => PARQUET_EXTENSION,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            CSV_EXTENSION => Ok(OutputFormat::Csv),
            PARQUET_EXTENSION => Ok(OutputFormat::Parquet),
            other => Err(QcError::Config(format!("Unsupported output format: {}", other))),
        }
    }
}

/// True for files this tool wrote itself, so directory runs skip them.
pub fn is_qc_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(QC_FILE_SUFFIX))
}

fn qc_file_name(input: &Path, format: OutputFormat) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("observations");
    format!("{}{}.{}", stem, QC_FILE_SUFFIX, format.extension())
}

/// `data/00.csv` -> `data/00_QC.csv`
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_file_name(qc_file_name(input, OutputFormat::Csv))
}

/// `data/00.csv` + `out/` -> `out/00_QC.<ext>`
pub fn output_path_in_dir(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    output_dir.join(qc_file_name(input, format))
}

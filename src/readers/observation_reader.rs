use crate::config::QcSettings;
use crate::error::{QcError, Result};
use crate::models::Observation;
use crate::utils::constants::{
    DATE_FORMAT, DEFAULT_STATION_COLUMN, DEFAULT_TIME_COLUMN, MISSING_MARKERS, TIMESTAMP_FORMATS,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Rows of a tabular file plus the variable columns it declared.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    pub variables: Vec<String>,
    pub observations: Vec<Observation>,
}

impl ObservationTable {
    /// Configured variables that have no column in the file.
    pub fn missing_variables<'a>(&self, settings: &'a QcSettings) -> Vec<&'a str> {
        settings
            .configured_variables()
            .into_iter()
            .filter(|var| !self.variables.iter().any(|v| v.as_str() == *var))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Reads observation CSV files: one time column, one station column, and
/// one numeric column per variable. Variable headers are lower-cased.
pub struct ObservationReader {
    time_column: String,
    station_column: String,
    default_station: Option<String>,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            station_column: DEFAULT_STATION_COLUMN.to_string(),
            default_station: None,
        }
    }

    pub fn with_time_column(mut self, column: impl Into<String>) -> Self {
        self.time_column = column.into();
        self
    }

    pub fn with_station_column(mut self, column: impl Into<String>) -> Self {
        self.station_column = column.into();
        self
    }

    /// Station id used when the file has no station column.
    pub fn with_default_station(mut self, station_id: Option<String>) -> Self {
        self.default_station = station_id;
        self
    }

    pub fn read_observations(&self, path: &Path) -> Result<ObservationTable> {
        let file = File::open(path)?;
        self.read_from(BufReader::new(file))
    }

    pub fn read_from<R: Read>(&self, reader: R) -> Result<ObservationTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();

        let time_idx = headers
            .iter()
            .position(|h| h == self.time_column)
            .ok_or_else(|| {
                QcError::InvalidFormat(format!("Missing time column '{}'", self.time_column))
            })?;

        let station_idx = headers.iter().position(|h| h == self.station_column);
        if station_idx.is_none() && self.default_station.is_none() {
            return Err(QcError::InvalidFormat(format!(
                "Missing station column '{}' and no default station given",
                self.station_column
            )));
        }

        // unnamed columns are row indices written by dataframe tools
        let variable_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, name)| *i != time_idx && Some(*i) != station_idx && !name.is_empty())
            .map(|(i, name)| (i, name.to_lowercase()))
            .collect();

        for (n, (_, name)) in variable_columns.iter().enumerate() {
            if variable_columns[..n].iter().any(|(_, earlier)| earlier == name) {
                return Err(QcError::InvalidFormat(format!(
                    "Duplicate variable column '{}' (names are compared case-insensitively)",
                    name
                )));
            }
        }

        let mut observations = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            let raw_time = record.get(time_idx).unwrap_or("");
            let timestamp = parse_timestamp(raw_time).map_err(|_| {
                QcError::InvalidFormat(format!("Invalid timestamp '{}' on line {}", raw_time, line))
            })?;

            let station_id = match (station_idx, &self.default_station) {
                (Some(i), _) => record.get(i).unwrap_or("").to_string(),
                (None, Some(default)) => default.clone(),
                (None, None) => String::new(),
            };
            if station_id.is_empty() {
                return Err(QcError::InvalidFormat(format!(
                    "Empty station id on line {}",
                    line
                )));
            }

            let mut observation = Observation::new(timestamp, station_id);
            for (i, name) in &variable_columns {
                let cell = record.get(*i).unwrap_or("");
                let value = parse_value(cell).map_err(|_| {
                    QcError::InvalidFormat(format!(
                        "Invalid value '{}' for '{}' on line {}",
                        cell, name, line
                    ))
                })?;
                observation.set_value(name.as_str(), value);
            }
            observations.push(observation);
        }

        Ok(ObservationTable {
            variables: variable_columns.into_iter().map(|(_, name)| name).collect(),
            observations,
        })
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a timestamp in any of the accepted layouts; bare dates map to midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.naive_utc());
    }

    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)?;
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| QcError::InvalidFormat(format!("Invalid date: {}", raw)))
}

/// `None` for the missing-value markers, otherwise a number.
pub fn parse_value(raw: &str) -> std::result::Result<Option<f64>, std::num::ParseFloatError> {
    let raw = raw.trim();
    if MISSING_MARKERS.contains(&raw) {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some)
}

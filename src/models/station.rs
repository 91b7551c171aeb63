use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{QcError, Result};
use crate::models::Observation;

/// Time-ordered observations of a single station.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StationSeries {
    #[validate(length(min = 1))]
    pub station_id: String,

    pub observations: Vec<Observation>,
}

impl StationSeries {
    pub fn new(station_id: String, observations: Vec<Observation>) -> Self {
        Self {
            station_id,
            observations,
        }
    }

    /// Check that every row belongs to this station and timestamps strictly increase.
    pub fn validate_order(&self) -> Result<()> {
        self.validate()?;
        validate_series(&self.station_id, &self.observations)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Check a single-station series: one station id, strictly increasing timestamps.
pub fn validate_series(station_id: &str, observations: &[Observation]) -> Result<()> {
    for obs in observations {
        if obs.station_id != station_id {
            return Err(QcError::MixedStations {
                expected: station_id.to_string(),
                found: obs.station_id.clone(),
            });
        }
    }

    for pair in observations.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.timestamp == prev.timestamp {
            return Err(QcError::DuplicateTimestamp {
                station_id: station_id.to_string(),
                timestamp: curr.timestamp,
            });
        }
        if curr.timestamp < prev.timestamp {
            return Err(QcError::UnorderedSeries {
                station_id: station_id.to_string(),
                timestamp: curr.timestamp,
            });
        }
    }

    Ok(())
}

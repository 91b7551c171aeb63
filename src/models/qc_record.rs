use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Observation, QcFlags, QualityLabel};

/// QC outcome for one input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcRecord {
    pub station_id: String,
    pub timestamp: NaiveDateTime,
    pub qc: QcFlags,
    pub label: QualityLabel,
}

impl QcRecord {
    pub fn new(station_id: String, timestamp: NaiveDateTime, qc: QcFlags) -> Self {
        Self {
            station_id,
            timestamp,
            qc,
            label: qc.label(),
        }
    }

    pub fn for_observation(observation: &Observation, qc: QcFlags) -> Self {
        Self::new(observation.station_id.clone(), observation.timestamp, qc)
    }

    pub fn qc_value(&self) -> u16 {
        self.qc.bits()
    }

    pub fn is_good(&self) -> bool {
        self.label == QualityLabel::Good
    }
}

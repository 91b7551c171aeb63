use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One reading of a station at one timestamp.
///
/// Missing values are stored explicitly as `None`. A variable that is not in
/// `values` at all is treated the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub station_id: String,
    pub values: BTreeMap<String, Option<f64>>,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, station_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            station_id: station_id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, variable: impl Into<String>, value: Option<f64>) -> Self {
        self.set_value(variable, value);
        self
    }

    pub fn set_value(&mut self, variable: impl Into<String>, value: Option<f64>) {
        // NaN is a missing reading, never a number
        let value = value.filter(|v| !v.is_nan());
        self.values.insert(variable.into(), value);
    }

    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values
            .get(variable)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan())
    }

    pub fn is_present(&self, variable: &str) -> bool {
        self.value(variable).is_some()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_missing_and_absent_values() {
        let obs = Observation::new(ts(), "ST01")
            .with_value("t", Some(21.5))
            .with_value("h", None);

        assert_eq!(obs.value("t"), Some(21.5));
        assert_eq!(obs.value("h"), None);
        assert_eq!(obs.value("p"), None);
        assert!(obs.is_present("t"));
        assert!(!obs.is_present("h"));
        assert_eq!(obs.variables().collect::<Vec<_>>(), vec!["h", "t"]);
    }

    #[test]
    fn test_nan_is_missing() {
        let obs = Observation::new(ts(), "ST01").with_value("t", Some(f64::NAN));
        assert_eq!(obs.value("t"), None);
    }
}

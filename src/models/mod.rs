pub mod flags;
pub mod label;
pub mod observation;
pub mod qc_record;
pub mod station;

pub use flags::QcFlags;
pub use label::QualityLabel;
pub use observation::Observation;
pub use qc_record::QcRecord;
pub use station::{validate_series, StationSeries};

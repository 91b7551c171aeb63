pub mod observation_reader;

pub use observation_reader::{parse_timestamp, parse_value, ObservationReader, ObservationTable};

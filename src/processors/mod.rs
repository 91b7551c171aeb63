pub mod persistence_window;
pub mod qc_report;
pub mod quality_checker;
pub mod station_partitioner;

pub use persistence_window::PersistenceWindow;
pub use qc_report::{QcReport, StationStatistics, TestFailures};
pub use quality_checker::{QualityChecker, SeriesEvaluator};
pub use station_partitioner::StationPartitioner;

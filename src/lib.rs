//! Quality control for weather station time series.
//!
//! Each row of a station series gets a QC bit mask from four tests
//! (completeness, range, step and persistence) and a quality label derived
//! from it in fixed precedence: `INCOMPLETE`, `WRONG`, `SUSPICIOUS`, `GOOD`.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

pub use error::{QcError, Result};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::QcSettings;
use crate::error::Result;

/// Default variable names understood by the built-in presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
}

pub const VARIABLES: [VariableInfo; 5] = [
    VariableInfo {
        name: "t",
        description: "temperature",
        unit: "°C",
    },
    VariableInfo {
        name: "h",
        description: "relative humidity",
        unit: "%",
    },
    VariableInfo {
        name: "p",
        description: "precipitation",
        unit: "mm/dt",
    },
    VariableInfo {
        name: "ws",
        description: "wind speed",
        unit: "m/s",
    },
    VariableInfo {
        name: "wd",
        description: "wind direction",
        unit: "deg",
    },
];

pub fn variable_info(name: &str) -> Option<&'static VariableInfo> {
    VARIABLES.iter().find(|v| v.name == name)
}

/// Threshold tables for 10-minute station networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Two-hour persistence window (12 rows)
    #[default]
    Standard,
    /// Three-row persistence window, humidity plateau above 95% exempt
    Short,
}

impl Preset {
    pub fn settings(&self) -> Result<QcSettings> {
        let builder = QcSettings::builder()
            .check_var("t")
            .check_var("h")
            .check_var("p")
            .check_var("ws")
            .range("t", -30.0, 50.0)
            .range("h", 0.0, 100.0)
            .range("p", 0.0, 400.0)
            .range("ws", 0.0, 75.0)
            .step("t", 2.0)
            .step("h", 10.0)
            .variation("t", 0.01, -30.0, 50.0)
            .variation("ws", 0.01, 0.0, 75.0);

        match self {
            Preset::Standard => builder
                .variation("h", 0.01, 0.0, 100.0)
                .window(12)
                .build(),
            Preset::Short => builder
                .range("wd", 0.0, 360.0)
                .variation("h", 0.01, 0.0, 95.0)
                .window(3)
                .build(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Standard => "standard",
            Preset::Short => "short",
        }
    }
}

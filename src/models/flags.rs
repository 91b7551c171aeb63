use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

use crate::error::{QcError, Result};
use crate::models::QualityLabel;

/// Per-row QC status: one bit per test, set when the test passed.
///
/// Bit `0b10` belongs to the retired consistency test and is never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct QcFlags(u16);

impl QcFlags {
    pub const NONE: QcFlags = QcFlags(0);
    pub const COMPLETE: QcFlags = QcFlags(0b0_0001);
    pub const RANGE_OK: QcFlags = QcFlags(0b0_0100);
    pub const NO_STEPS: QcFlags = QcFlags(0b0_1000);
    pub const NO_PERSISTENCE: QcFlags = QcFlags(0b1_0000);

    const KNOWN_BITS: u16 = Self::COMPLETE.0 | Self::RANGE_OK.0 | Self::NO_STEPS.0 | Self::NO_PERSISTENCE.0;

    /// Every test passed.
    pub const fn all() -> Self {
        QcFlags(Self::KNOWN_BITS)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub fn from_bits(bits: u16) -> Result<Self> {
        if bits & !Self::KNOWN_BITS != 0 {
            return Err(QcError::InvalidFlagBits(bits));
        }
        Ok(QcFlags(bits))
    }

    /// Build a mask from the four individual test outcomes.
    pub fn from_tests(complete: bool, range_ok: bool, no_steps: bool, no_persistence: bool) -> Self {
        let mut flags = QcFlags::NONE;
        flags.set(QcFlags::COMPLETE, complete);
        flags.set(QcFlags::RANGE_OK, range_ok);
        flags.set(QcFlags::NO_STEPS, no_steps);
        flags.set(QcFlags::NO_PERSISTENCE, no_persistence);
        flags
    }

    pub const fn contains(&self, other: QcFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, flag: QcFlags, passed: bool) {
        if passed {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }

    pub const fn is_complete(&self) -> bool {
        self.contains(QcFlags::COMPLETE)
    }

    pub const fn is_range_ok(&self) -> bool {
        self.contains(QcFlags::RANGE_OK)
    }

    pub const fn has_no_steps(&self) -> bool {
        self.contains(QcFlags::NO_STEPS)
    }

    pub const fn has_no_persistence(&self) -> bool {
        self.contains(QcFlags::NO_PERSISTENCE)
    }

    pub fn label(&self) -> QualityLabel {
        QualityLabel::classify(*self)
    }

    /// Names of the tests that did not pass, in severity order.
    pub fn failed_tests(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.is_complete() {
            failed.push("complete");
        }
        if !self.is_range_ok() {
            failed.push("range");
        }
        if !self.has_no_steps() {
            failed.push("step");
        }
        if !self.has_no_persistence() {
            failed.push("persistence");
        }
        failed
    }
}

impl BitOr for QcFlags {
    type Output = QcFlags;

    fn bitor(self, rhs: QcFlags) -> QcFlags {
        QcFlags(self.0 | rhs.0)
    }
}

impl TryFrom<u16> for QcFlags {
    type Error = QcError;

    fn try_from(bits: u16) -> Result<Self> {
        QcFlags::from_bits(bits)
    }
}

impl From<QcFlags> for u16 {
    fn from(flags: QcFlags) -> u16 {
        flags.0
    }
}

impl fmt::Display for QcFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

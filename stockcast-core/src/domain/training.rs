//! TrainingRow: the cleaned `(timestamp, value)` pair fed to a forecaster.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closing price reindexed under the generic forecasting schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub timestamp: NaiveDate,
    pub value: f64,
}

impl TrainingRow {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

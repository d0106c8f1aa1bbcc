// src/data_input/log_data.rs

use crate::axis_names::AXIS_COUNT;

/// Structure to hold data parsed from a single row of the CSV log.
/// Uses `Option<f64>` to handle potentially missing or unparseable values.
#[derive(Debug, Default, Clone)]
pub struct LogRowData {
    pub time_sec: Option<f64>,                 // Timestamp (in seconds, relative to log start).
    pub setpoint: [Option<f64>; AXIS_COUNT],   // Commanded rate [Roll, Pitch, Yaw].
    pub gyro: [Option<f64>; AXIS_COUNT],       // Measured rate (filtered gyro) [Roll, Pitch, Yaw].
    pub throttle: Option<f64>,                 // Throttle command, for flight segmentation.
}

// src/data_input/log_data.rs

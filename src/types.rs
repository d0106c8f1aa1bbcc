// src/types.rs
// Shared data-model types for the analysis pipeline.

use crate::axis_names::AXIS_COUNT;

// Compile-time assertion: AXIS_COUNT must be 3.
// Per-axis result arrays and the console report layout depend on it.
const _: () = assert!(AXIS_COUNT == 3, "AXIS_COUNT must be 3");

/// Per-axis container, indexed 0=Roll, 1=Pitch, 2=Yaw.
pub type PerAxis<T> = [T; AXIS_COUNT];

/// Equal-length time/setpoint/measured-rate arrays for one axis of one
/// flight segment. Times are seconds and strictly increasing; rates are
/// whatever angular-rate unit the log uses (deg/s for Betaflight).
#[derive(Debug, Clone)]
pub struct SampleSeries {
    time_s: Vec<f64>,
    setpoint: Vec<f64>,
    measured: Vec<f64>,
}

impl SampleSeries {
    /// Builds a series, enforcing the invariants: all three arrays equal
    /// length, time strictly increasing. A violation means the upstream
    /// partition handed over a malformed window; the caller skips that
    /// segment/axis rather than aborting the run.
    pub fn new(time_s: Vec<f64>, setpoint: Vec<f64>, measured: Vec<f64>) -> Option<Self> {
        if time_s.len() != setpoint.len() || time_s.len() != measured.len() {
            return None;
        }
        if time_s.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }
        Some(Self {
            time_s,
            setpoint,
            measured,
        })
    }

    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    pub fn time_s(&self) -> &[f64] {
        &self.time_s
    }

    pub fn setpoint(&self) -> &[f64] {
        &self.setpoint
    }

    pub fn measured(&self) -> &[f64] {
        &self.measured
    }

    /// Sampling frequency as 1 / mean(Δt).
    ///
    /// Returns `None` for fewer than two samples. With strictly increasing
    /// time the mean spacing is always positive.
    pub fn sample_rate_hz(&self) -> Option<f64> {
        if self.time_s.len() < 2 {
            return None;
        }
        let span = self.time_s[self.time_s.len() - 1] - self.time_s[0];
        let mean_dt = span / (self.time_s.len() - 1) as f64;
        Some(1.0 / mean_dt)
    }
}

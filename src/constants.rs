// src/constants.rs

// Constants for flight segmentation based on throttle activity.
pub const DEFAULT_THROTTLE_THRESHOLD: f64 = 1300.0; // Throttle value above which flight is considered active
pub const MIN_SEGMENT_DURATION_S: f64 = 5.0; // Shorter active stretches are discarded

// Minimum segment length before the per-segment dominant-frequency analysis runs.
pub const MIN_FREQ_ANALYSIS_SAMPLES: usize = 1000;

// Constants for the synthetic ARX step response simulation.
pub const STEP_RESPONSE_LEN: usize = 200; // Samples simulated against a unit step
pub const DEGENERATE_STEP_INDEX: usize = 10; // Where the fallback response injects its step

// Constants for step response metric extraction.
pub const STEADY_STATE_TAIL_SAMPLES: usize = 20; // Tail averaged to estimate steady state
pub const STEADY_STATE_EPSILON: f64 = 1e-6; // Below this the step metrics are skipped
pub const SETTLING_WINDOW_SAMPLES: usize = 30; // Consecutive in-band samples required to settle
pub const SETTLING_BAND_FRACTION: f64 = 0.05; // Settling band as a fraction of steady state
pub const RISE_LOW_FRACTION: f64 = 0.1; // Rise time measured between these two
pub const RISE_HIGH_FRACTION: f64 = 0.9; // fractions of steady state

// src/constants.rs

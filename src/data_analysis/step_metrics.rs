// src/data_analysis/step_metrics.rs

use crate::constants::{
    RISE_HIGH_FRACTION, RISE_LOW_FRACTION, SETTLING_BAND_FRACTION, SETTLING_WINDOW_SAMPLES,
    STEADY_STATE_EPSILON, STEADY_STATE_TAIL_SAMPLES,
};

/// Transient characteristics extracted from a simulated step response.
/// Times are in samples, not seconds.
#[derive(Debug, Clone, Copy)]
pub struct StepMetrics {
    /// Mean of the response tail, used as the reference level.
    pub steady_state: f64,
    /// Samples between the 10% and 90% crossings of steady state.
    pub rise_time_samples: Option<f64>,
    /// Earliest index from which the response stays inside the settling band.
    pub settling_time_samples: Option<f64>,
    /// Peak excess over steady state after the 90% crossing, in percent.
    pub overshoot_percent: Option<f64>,
}

/// Analyzes a simulated step response.
///
/// Returns None when the steady state is too close to zero for the
/// fractional thresholds to be meaningful (the caller skips that model).
/// Each individual metric is itself optional since a response may never
/// cross its thresholds.
pub fn analyze_step_response(step: &[f64]) -> Option<StepMetrics> {
    let tail_start = step.len().saturating_sub(STEADY_STATE_TAIL_SAMPLES);
    let tail = &step[tail_start..];
    if tail.is_empty() {
        return None;
    }

    let steady_state = tail.iter().sum::<f64>() / tail.len() as f64;
    if steady_state.abs() < STEADY_STATE_EPSILON {
        return None;
    }

    let rise_low_idx = step
        .iter()
        .position(|&v| v >= RISE_LOW_FRACTION * steady_state);
    let rise_high_idx = step
        .iter()
        .position(|&v| v >= RISE_HIGH_FRACTION * steady_state);

    let rise_time_samples = match (rise_low_idx, rise_high_idx) {
        (Some(low), Some(high)) => Some(high as f64 - low as f64),
        _ => None,
    };

    // Settling: a full window of consecutive samples inside the band. The
    // band carries the sign of the steady state, matching the rise checks.
    let settling_band = SETTLING_BAND_FRACTION * steady_state;
    let mut settling_time_samples = None;
    for i in 0..step.len().saturating_sub(SETTLING_WINDOW_SAMPLES) {
        if step[i..i + SETTLING_WINDOW_SAMPLES]
            .iter()
            .all(|&v| (v - steady_state).abs() <= settling_band)
        {
            settling_time_samples = Some(i as f64);
            break;
        }
    }

    let mut overshoot_percent = None;
    if let Some(high) = rise_high_idx {
        if high > 0 && high < step.len() - 1 {
            let max_response = step[high..].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            overshoot_percent =
                Some((max_response - steady_state) / steady_state.abs() * 100.0);
        }
    }

    Some(StepMetrics {
        steady_state,
        rise_time_samples,
        settling_time_samples,
        overshoot_percent,
    })
}

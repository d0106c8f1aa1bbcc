// src/data_analysis/segment_stats.rs

use ndarray::Array1;
use ndarray_stats::QuantileExt;

use crate::constants::MIN_FREQ_ANALYSIS_SAMPLES;
use crate::data_analysis::spectral_analysis::{self, WelchConfig};
use crate::types::SampleSeries;

/// Tracking-error statistics for one axis of one flight segment, plus the
/// dominant measured-rate frequency when the segment is long enough for a
/// spectral estimate.
#[derive(Debug, Clone, Copy)]
pub struct SegmentStats {
    /// Mean absolute error, error = setpoint - measured.
    pub error_mean: f64,
    pub error_rms: f64,
    pub error_peak: f64,
    /// (dominant frequency Hz, PSD power at that frequency).
    pub dominant_frequency: Option<(f64, f64)>,
}

/// Basic per-segment analysis: tracking-error statistics always, dominant
/// frequency only above the minimum-samples gate.
pub fn analyze_segment_stats(series: &SampleSeries, config: &WelchConfig) -> SegmentStats {
    let n = series.len();
    if n == 0 {
        return SegmentStats {
            error_mean: 0.0,
            error_rms: 0.0,
            error_peak: 0.0,
            dominant_frequency: None,
        };
    }

    let setpoint = series.setpoint();
    let measured = series.measured();

    let mut abs_sum = 0.0;
    let mut square_sum = 0.0;
    let mut error_peak = 0.0_f64;
    for i in 0..n {
        let error = setpoint[i] - measured[i];
        abs_sum += error.abs();
        square_sum += error * error;
        error_peak = error_peak.max(error.abs());
    }

    let mut dominant_frequency = None;
    if n > MIN_FREQ_ANALYSIS_SAMPLES {
        if let Some(sample_rate) = series.sample_rate_hz() {
            if let Ok(psd) = spectral_analysis::welch_psd(measured, sample_rate, config) {
                let powers = Array1::from_iter(psd.iter().map(|&(_, power)| power));
                if let Ok(idx) = powers.argmax() {
                    dominant_frequency = Some((psd[idx].0, psd[idx].1));
                }
            }
        }
    }

    SegmentStats {
        error_mean: abs_sum / n as f64,
        error_rms: (square_sum / n as f64).sqrt(),
        error_peak,
        dominant_frequency,
    }
}

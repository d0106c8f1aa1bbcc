// src/data_analysis/performance_index.rs

use ndarray::Array1;
use ndarray_stats::QuantileExt;
use std::error::Error;

use crate::data_analysis::spectral_analysis::{self, WelchConfig};
use crate::fft_utils;

/// Spectral content above this frequency counts as noise/vibration energy.
const HIGH_FREQ_CUTOFF_HZ: f64 = 30.0;

/// Composite 0-100 control quality scores for one axis of one segment,
/// plus the raw metrics they were derived from.
#[derive(Debug, Clone)]
pub struct PerformanceIndex {
    /// 100 at zero RMS error, dropping 2 points per unit of RMS.
    pub tracking_score: f64,
    /// 100 with no high-frequency energy, dropping 500 points per ratio unit.
    pub noise_score: f64,
    /// 100 at perfect setpoint/measured correlation.
    pub response_score: f64,
    /// Weighted composite: 0.5 tracking + 0.3 noise + 0.2 response.
    pub performance_index: f64,
    pub error_mean: f64,
    pub error_rms: f64,
    pub error_peak: f64,
    /// Dominant frequency of the measured signal and its PSD power.
    pub peak_freq: f64,
    pub peak_power: f64,
    /// Share of PSD energy above the high-frequency cutoff.
    pub high_freq_ratio: f64,
    /// Peak cross-correlation normalized by signal spread; not
    /// lag-compensated, so phase lag leaks into the score.
    pub responsiveness: f64,
    /// Lag (in samples) at which the cross-correlation peaks.
    pub corr_lag: i64,
}

/// Scores tracking, noise, and responsiveness for one axis of a segment.
pub fn calculate_performance_index(
    setpoint: &[f64],
    measured: &[f64],
    sample_rate: f64,
    config: &WelchConfig,
) -> Result<PerformanceIndex, Box<dyn Error>> {
    if setpoint.is_empty() || setpoint.len() != measured.len() {
        return Err("Setpoint and measured signals must be non-empty and equal length".into());
    }

    let n = setpoint.len();

    let mut abs_sum = 0.0;
    let mut square_sum = 0.0;
    let mut error_peak = 0.0_f64;
    for i in 0..n {
        let error = setpoint[i] - measured[i];
        abs_sum += error.abs();
        square_sum += error * error;
        error_peak = error_peak.max(error.abs());
    }
    let error_mean = abs_sum / n as f64;
    let error_rms = (square_sum / n as f64).sqrt();

    let psd = spectral_analysis::welch_psd(measured, sample_rate, config)?;
    let powers = Array1::from_iter(psd.iter().map(|&(_, power)| power));
    let peak_idx = powers
        .argmax()
        .map_err(|e| format!("PSD peak search failed: {}", e))?;
    let peak_freq = psd[peak_idx].0;
    let peak_power = psd[peak_idx].1;

    let total_energy: f64 = psd.iter().map(|&(_, power)| power).sum();
    let high_freq_energy: f64 = psd
        .iter()
        .filter(|&&(freq, _)| freq > HIGH_FREQ_CUTOFF_HZ)
        .map(|&(_, power)| power)
        .sum();
    let high_freq_ratio = if total_energy > 0.0 {
        high_freq_energy / total_energy
    } else {
        0.0
    };

    let correlation = cross_correlate_full(setpoint, measured);
    let mut corr_max = f64::NEG_INFINITY;
    let mut corr_argmax = 0;
    for (i, &value) in correlation.iter().enumerate() {
        if value > corr_max {
            corr_max = value;
            corr_argmax = i;
        }
    }
    let corr_lag = corr_argmax as i64 - (n as i64 - 1);

    let denom = population_std(setpoint) * population_std(measured) * n as f64;
    let responsiveness = if denom > 0.0 { corr_max / denom } else { 0.0 };

    let tracking_score = (100.0 - error_rms * 2.0).max(0.0);
    let noise_score = (100.0 - high_freq_ratio * 500.0).max(0.0);
    let response_score = (responsiveness * 100.0).max(0.0);
    let performance_index =
        tracking_score * 0.5 + noise_score * 0.3 + response_score * 0.2;

    Ok(PerformanceIndex {
        tracking_score,
        noise_score,
        response_score,
        performance_index,
        error_mean,
        error_rms,
        error_peak,
        peak_freq,
        peak_power,
        high_freq_ratio,
        responsiveness,
        corr_lag,
    })
}

/// Full cross-correlation (all 2N-1 lags), computed as an FFT convolution
/// against the reversed second signal.
fn cross_correlate_full(a: &[f64], b: &[f64]) -> Vec<f64> {
    let n = a.len();
    let full_len = 2 * n - 1;
    let nfft = full_len.next_power_of_two();

    let mut padded_a = Array1::<f64>::zeros(nfft);
    let mut padded_b = Array1::<f64>::zeros(nfft);
    for i in 0..n {
        padded_a[i] = a[i];
        padded_b[i] = b[n - 1 - i];
    }

    let spectrum_a = fft_utils::fft_forward(&padded_a);
    let spectrum_b = fft_utils::fft_forward(&padded_b);
    let product = Array1::from_iter(
        spectrum_a
            .iter()
            .zip(spectrum_b.iter())
            .map(|(x, y)| x * y),
    );
    let convolved = fft_utils::fft_inverse(&product, nfft);

    convolved.iter().take(full_len).cloned().collect()
}

fn population_std(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 30) as f64) - 1.0
            })
            .collect()
    }

    #[test]
    fn test_perfect_tracking_scores_high() {
        let signal = noise(2048, 21);
        let perf =
            calculate_performance_index(&signal, &signal, 1000.0, &WelchConfig::default())
                .unwrap();

        assert_eq!(perf.tracking_score, 100.0);
        assert_eq!(perf.error_rms, 0.0);
        assert_eq!(perf.corr_lag, 0);
        assert!(perf.responsiveness > 0.95, "responsiveness was {:.4}", perf.responsiveness);
    }

    #[test]
    fn test_pure_delay_keeps_responsiveness_high() {
        // The correlation peak moves to the delay lag, but its height (and
        // so the responsiveness score) barely changes.
        let setpoint = noise(2048, 33);
        let mut measured = vec![0.0; 2048];
        for i in 5..2048 {
            measured[i] = setpoint[i - 5];
        }

        let perf =
            calculate_performance_index(&setpoint, &measured, 1000.0, &WelchConfig::default())
                .unwrap();

        assert_eq!(perf.corr_lag, -5);
        assert!(perf.responsiveness > 0.9, "responsiveness was {:.4}", perf.responsiveness);
        assert!(perf.response_score > 90.0);
    }

    #[test]
    fn test_constant_signals_degrade_gracefully() {
        let flat = vec![1.0; 2048];
        let perf = calculate_performance_index(&flat, &flat, 1000.0, &WelchConfig::default())
            .unwrap();

        assert_eq!(perf.responsiveness, 0.0);
        assert_eq!(perf.response_score, 0.0);
        assert_eq!(perf.tracking_score, 100.0);
        assert_eq!(perf.noise_score, 100.0);
        assert!((perf.performance_index - 80.0).abs() < 1e-12);
    }

    #[test]
    fn test_high_frequency_content_zeroes_noise_score() {
        let fs = 1000.0;
        let setpoint = vec![0.0; 4096];
        let measured: Vec<f64> = (0..4096)
            .map(|i| 20.0 * (2.0 * std::f64::consts::PI * 100.0 * i as f64 / fs).sin())
            .collect();

        let perf =
            calculate_performance_index(&setpoint, &measured, fs, &WelchConfig::default())
                .unwrap();

        assert!(perf.high_freq_ratio > 0.9, "ratio was {:.4}", perf.high_freq_ratio);
        assert_eq!(perf.noise_score, 0.0);
        assert!((perf.peak_freq - 100.0).abs() < 2.0);
        assert!(perf.tracking_score > 60.0 && perf.tracking_score < 80.0);
    }
}

// src/data_analysis/spectral_analysis.rs

use ndarray::Array1;
use num_complex::Complex64;
use std::error::Error;

use crate::fft_utils;

/// Nominal Welch segment length. The downstream decision thresholds were
/// tuned against spectra estimated with this window.
pub const DEFAULT_SEGMENT_LENGTH: usize = 1024;

/// Smallest window the estimator will adapt down to for short inputs.
const MIN_SEGMENT_LENGTH: usize = 8;

/// Configuration for Welch's method spectral analysis
#[derive(Debug, Clone)]
pub struct WelchConfig {
    /// Segment length in samples; adapted down when the signal is shorter.
    pub segment_length: usize,
    /// Overlap fraction between consecutive segments (0.5 = 50%).
    pub overlap: f64,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            segment_length: DEFAULT_SEGMENT_LENGTH,
            overlap: 0.5,
        }
    }
}

impl WelchConfig {
    /// Window length actually used for a signal of `data_len` samples:
    /// the configured length, shrunk to the data when necessary.
    fn effective_segment_length(&self, data_len: usize) -> usize {
        self.segment_length.min(data_len)
    }

    fn hop_size(&self, segment_length: usize) -> usize {
        (((1.0 - self.overlap) * segment_length as f64) as usize).max(1)
    }
}

/// Generates a Hann window (Tukey with alpha = 1.0) of the given length.
fn hann_window(length: usize) -> Array1<f64> {
    if length <= 1 {
        return Array1::ones(length);
    }
    Array1::from_iter((0..length).map(|n| {
        let x = n as f64 / (length - 1) as f64;
        0.5 * (1.0 - (2.0 * std::f64::consts::PI * x).cos())
    }))
}

/// Calculates the frequency vector for FFT results
pub fn frequency_vector(nfft: usize, sample_rate: f64) -> Vec<f64> {
    let num_freqs = nfft / 2 + 1;
    (0..num_freqs)
        .map(|i| (i as f64 * sample_rate) / (nfft as f64))
        .collect()
}

/// Computes Power Spectral Density using Welch's method.
///
/// Segments the signal with overlap, removes each segment's mean, applies a
/// Hann window, computes the FFT, and averages power across segments. The
/// normalization (1 / (fs * sum(w^2)), one-sided doubling) matches the
/// averaged-periodogram convention the decision thresholds expect.
pub fn welch_psd(
    signal: &[f64],
    sample_rate: f64,
    config: &WelchConfig,
) -> Result<Vec<(f64, f64)>, Box<dyn Error>> {
    let cross = welch_cpsd(signal, signal, sample_rate, config)?;
    Ok(cross.iter().map(|&(freq, c)| (freq, c.re)).collect())
}

/// Computes Cross-Power Spectral Density using Welch's method.
///
/// Returns complex-valued CPSD averaged across segments. `welch_psd` is the
/// degenerate case with both signals identical, which keeps the two
/// estimators consistent bin for bin.
pub fn welch_cpsd(
    signal1: &[f64],
    signal2: &[f64],
    sample_rate: f64,
    config: &WelchConfig,
) -> Result<Vec<(f64, Complex64)>, Box<dyn Error>> {
    if signal1.is_empty() || signal2.is_empty() {
        return Err("Empty signal provided".into());
    }

    if signal1.len() != signal2.len() {
        return Err("Signals must have equal length".into());
    }

    let segment_length = config.effective_segment_length(signal1.len());
    if segment_length < MIN_SEGMENT_LENGTH {
        return Err(format!(
            "Signal too short for spectral estimation: {} samples",
            signal1.len()
        )
        .into());
    }

    let hop_size = config.hop_size(segment_length);

    let window = hann_window(segment_length);
    let window_power: f64 = window.iter().map(|&w| w * w).sum();

    let num_segments = (signal1.len() - segment_length) / hop_size + 1;

    let nfft = segment_length.next_power_of_two();
    let num_freqs = nfft / 2 + 1;

    // Accumulator for averaged CPSD
    let mut cpsd_sum = vec![Complex64::new(0.0, 0.0); num_freqs];
    let mut segment_count = 0;

    for seg_idx in 0..num_segments {
        let start = seg_idx * hop_size;
        let end = start + segment_length;

        if end > signal1.len() {
            break;
        }

        let segment1 = &signal1[start..end];
        let segment2 = &signal2[start..end];

        // Constant detrend: remove each segment's mean before windowing.
        let mean1: f64 = segment1.iter().sum::<f64>() / segment_length as f64;
        let mean2: f64 = segment2.iter().sum::<f64>() / segment_length as f64;

        // Apply window and zero-pad to the FFT length.
        let mut padded1 = Array1::<f64>::zeros(nfft);
        let mut padded2 = Array1::<f64>::zeros(nfft);
        for i in 0..segment_length {
            padded1[i] = (segment1[i] - mean1) * window[i];
            padded2[i] = (segment2[i] - mean2) * window[i];
        }

        let spectrum1 = fft_utils::fft_forward(&padded1);
        let spectrum2 = fft_utils::fft_forward(&padded2);

        if spectrum1.is_empty() || spectrum2.is_empty() {
            continue;
        }

        for i in 0..num_freqs.min(spectrum1.len()).min(spectrum2.len()) {
            // CPSD: conj(X(f)) * Y(f), so arg(Sxy) = phase(y) - phase(x)
            let cross_power = spectrum1[i].conj() * spectrum2[i];

            let mut cpsd = cross_power / (sample_rate * window_power);

            // One-sided spectrum: double power for positive frequencies (except DC and Nyquist)
            let is_nyquist = (nfft % 2 == 0) && (i == num_freqs - 1);
            if i > 0 && !is_nyquist {
                cpsd *= 2.0;
            }

            cpsd_sum[i] += cpsd;
        }

        segment_count += 1;
    }

    if segment_count == 0 {
        return Err("No valid segments processed".into());
    }

    let frequencies = frequency_vector(nfft, sample_rate);
    let cpsd_avg: Vec<(f64, Complex64)> = frequencies
        .iter()
        .zip(cpsd_sum.iter())
        .map(|(&freq, &cpsd)| (freq, cpsd / segment_count as f64))
        .collect();

    Ok(cpsd_avg)
}

/// Calculates coherence: γ²(f) = |Sxy(f)|² / (Sxx(f) × Syy(f)), clamped to [0, 1].
pub fn coherence(
    cpsd: &[(f64, Complex64)],
    psd1: &[(f64, f64)],
    psd2: &[(f64, f64)],
) -> Result<Vec<(f64, f64)>, Box<dyn Error>> {
    if cpsd.len() != psd1.len() || cpsd.len() != psd2.len() {
        return Err("Input arrays must have equal length".into());
    }

    let mut coh = Vec::with_capacity(cpsd.len());

    for i in 0..cpsd.len() {
        let freq = cpsd[i].0;
        let cpsd_mag_sqr = cpsd[i].1.norm_sqr();
        let psd_product = psd1[i].1 * psd2[i].1;

        let coherence_val = if psd_product > 1e-12 {
            (cpsd_mag_sqr / psd_product).clamp(0.0, 1.0)
        } else {
            0.0
        };

        coh.push((freq, coherence_val));
    }

    Ok(coh)
}

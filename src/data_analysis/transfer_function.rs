// src/data_analysis/transfer_function.rs

use std::error::Error;

use crate::data_analysis::spectral_analysis::{self, WelchConfig};

/// Threshold above which a local magnitude maximum counts as a resonance.
const RESONANCE_MAGNITUDE_THRESHOLD: f64 = 1.1;

/// Resonances below this frequency are treated as DC/drift artifacts.
const RESONANCE_MIN_FREQ_HZ: f64 = 1.0;

/// Non-parametric frequency response of one axis, estimated from the
/// setpoint (input) and measured rate (output) of a flight segment.
///
/// All vectors are bin-aligned. Immutable once produced.
#[derive(Debug, Clone)]
pub struct FrequencyResponse {
    /// Frequency bins in Hz.
    pub frequencies: Vec<f64>,
    /// |H(f)| as a linear gain ratio (1.0 = unity).
    pub magnitude: Vec<f64>,
    /// arg(H(f)) in degrees, wrapped to (-180, 180].
    pub phase_deg: Vec<f64>,
    /// Coherence between setpoint and measured rate, in [0, 1] per bin.
    pub coherence: Vec<f64>,
    /// Stability margin in degrees at the gain-crossover bin.
    pub phase_margin: f64,
    /// Resonant peaks as (frequency Hz, linear magnitude), ascending frequency.
    pub resonant_frequencies: Vec<(f64, f64)>,
}

/// Estimates the closed-loop frequency response H(f) = Sxy / (Sxx + eps)
/// via Welch spectra, along with coherence, phase margin, and resonances.
///
/// The spectral estimator adapts its window for short segments, so the only
/// error cases are inputs too short to window at all.
pub fn estimate_frequency_response(
    setpoint: &[f64],
    measured: &[f64],
    sample_rate: f64,
    config: &WelchConfig,
) -> Result<FrequencyResponse, Box<dyn Error>> {
    let pxx = spectral_analysis::welch_psd(setpoint, sample_rate, config)?;
    let pyy = spectral_analysis::welch_psd(measured, sample_rate, config)?;
    let pxy = spectral_analysis::welch_cpsd(setpoint, measured, sample_rate, config)?;

    let coherence_pairs = spectral_analysis::coherence(&pxy, &pxx, &pyy)?;

    let num_bins = pxy.len();
    let mut frequencies = Vec::with_capacity(num_bins);
    let mut magnitude = Vec::with_capacity(num_bins);
    let mut phase_deg = Vec::with_capacity(num_bins);

    for i in 0..num_bins {
        let (freq, sxy) = pxy[i];
        // Epsilon keeps bins with no input energy finite instead of blowing up.
        let h = sxy / (pxx[i].1 + 1e-10);
        frequencies.push(freq);
        magnitude.push(h.norm());
        phase_deg.push(h.arg().to_degrees());
    }

    let phase_margin = phase_margin_at_crossover(&magnitude, &phase_deg);
    let resonant_frequencies = find_resonant_peaks(&frequencies, &magnitude);
    let coherence = coherence_pairs.into_iter().map(|(_, c)| c).collect();

    Ok(FrequencyResponse {
        frequencies,
        magnitude,
        phase_deg,
        coherence,
        phase_margin,
        resonant_frequencies,
    })
}

/// Phase margin at the bin where |H| is closest to unity gain.
///
/// The sign of the crossover phase is folded into the margin, so both
/// -120 deg and +120 deg map to a 60 deg margin.
fn phase_margin_at_crossover(magnitude: &[f64], phase_deg: &[f64]) -> f64 {
    if magnitude.is_empty() {
        return 0.0;
    }

    let mut crossover_idx = 0;
    let mut best_distance = f64::INFINITY;
    for (i, &mag) in magnitude.iter().enumerate() {
        let distance = (mag - 1.0).abs();
        if distance < best_distance {
            best_distance = distance;
            crossover_idx = i;
        }
    }

    let phase = phase_deg[crossover_idx];
    if phase < 0.0 {
        180.0 + phase
    } else {
        180.0 - phase
    }
}

/// Local magnitude maxima (strictly greater than both neighbors) above the
/// resonance thresholds. Endpoint bins cannot qualify.
fn find_resonant_peaks(frequencies: &[f64], magnitude: &[f64]) -> Vec<(f64, f64)> {
    let mut peaks = Vec::new();

    for i in 1..magnitude.len().saturating_sub(1) {
        let mag = magnitude[i];
        if mag > magnitude[i - 1]
            && mag > magnitude[i + 1]
            && frequencies[i] > RESONANCE_MIN_FREQ_HZ
            && mag > RESONANCE_MAGNITUDE_THRESHOLD
        {
            peaks.push((frequencies[i], mag));
        }
    }

    peaks
}

// src/data_analysis/pid_recommender.rs

use std::fmt;

use crate::axis_names::axis_name;
use crate::data_analysis::arx_model::ArxFit;
use crate::data_analysis::performance_index::PerformanceIndex;
use crate::data_analysis::segment_diagnostics::SegmentDiagnostics;
use crate::data_analysis::step_metrics;
use crate::data_analysis::transfer_function::FrequencyResponse;
use crate::types::PerAxis;

/// One of the three tunable controller terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidTerm {
    P,
    I,
    D,
}

impl PidTerm {
    pub fn label(&self) -> &'static str {
        match self {
            PidTerm::P => "P",
            PidTerm::I => "I",
            PidTerm::D => "D",
        }
    }
}

impl fmt::Display for PidTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weights and decision thresholds of the fusion stage.
///
/// Everything that governs how the per-source recommendations are blended
/// lives here rather than in ambient constants, so tests can run the fusion
/// against alternate weight sets. The per-source rule tables (which error
/// magnitude or score maps to which delta) stay fixed in the generator
/// functions; they define what the sources say, not how they are combined.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Confidence carried by the basic error/frequency heuristic.
    pub basic_weight: f64,
    /// Confidence carried by the transfer-function analysis.
    pub transfer_weight: f64,
    /// Confidence carried by the ARX step-response analysis.
    pub arx_weight: f64,
    /// Confidence carried by the performance-index analysis.
    pub performance_weight: f64,
    /// Combine-weight multiplier for the performance source when scores are
    /// poor enough to act on.
    pub performance_urgency_factor: f64,
    /// Tracking or overall score below this makes the performance source
    /// urgent; otherwise its deltas are not applied at all.
    pub performance_urgency_threshold: f64,
    /// Below this total weight `weighted_combine` falls back to a plain
    /// average.
    pub min_combine_weight: f64,
    /// Opposite-sign magnitude ratio at which one side counts as dominant.
    pub dominance_ratio: f64,
    /// How far the combined value is pulled toward a dominant side.
    pub dominance_bias: f64,
    /// Average ARX fit (percent) below which its deltas are suppressed.
    pub arx_fit_gate_percent: f64,
    /// Largest per-term adjustment (percent) still counting as well-tuned.
    pub well_tuned_threshold: i32,
    /// D adjustment below this marks a noise problem worth fixing first.
    pub noise_priority_delta: i32,
    /// Fraction of the largest adjustment D must reach for the noise
    /// override to take priority.
    pub noise_priority_fraction: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            basic_weight: 0.3,
            transfer_weight: 0.3,
            arx_weight: 0.2,
            performance_weight: 0.2,
            performance_urgency_factor: 1.5,
            performance_urgency_threshold: 60.0,
            min_combine_weight: 0.01,
            dominance_ratio: 2.0,
            dominance_bias: 0.8,
            arx_fit_gate_percent: 40.0,
            well_tuned_threshold: 5,
            noise_priority_delta: -10,
            noise_priority_fraction: 0.7,
        }
    }
}

/// Per-term adjustment percentages proposed by one source. `None` means the
/// source has no opinion on that term and leaves it untouched in the fold.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermDeltas {
    pub p: Option<f64>,
    pub i: Option<f64>,
    pub d: Option<f64>,
}

/// Which analysis produced a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionSource {
    Basic,
    TransferFunction,
    ArxModel,
    Performance,
}

/// One source's input to the fusion: proposed deltas, advisory notes, and
/// the weights it carries. The combine weight can differ from the
/// confidence weight (the performance source blends in with an urgency
/// boost but still only certifies its base confidence).
#[derive(Debug, Clone)]
pub struct Contribution {
    pub source: ContributionSource,
    pub deltas: TermDeltas,
    pub notes: Vec<String>,
    pub combine_weight: f64,
    pub confidence_weight: f64,
}

/// Result of folding the ordered contributions: fused per-term values and
/// the accumulated (uncapped) confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct FusedAdjustments {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub confidence: f64,
}

/// Fused tuning recommendation for one axis, aggregated over all segments.
#[derive(Debug, Clone)]
pub struct Recommendation {
    /// Final adjustments, rounded to integer percent.
    pub p_percent: i32,
    pub i_percent: i32,
    pub d_percent: i32,
    /// Error metrics averaged across segments.
    pub error_mean: f64,
    pub error_rms: f64,
    pub error_peak: f64,
    /// Average dominant frequency and power, when any segment produced one.
    pub frequency: Option<(f64, f64)>,
    /// Fused confidence in [0, 1].
    pub confidence: f64,
    /// Advisory notes from every applied source in application order,
    /// followed by conflict notes and the confidence statement.
    pub rationale: Vec<String>,
    /// Which term to adjust first, with the reason.
    pub priority: Option<(PidTerm, String)>,
    pub well_tuned: bool,
    /// Actionable bottom-line summary.
    pub summary: Vec<String>,
}

/// Everything the fusion needs about one axis, flattened across segments.
struct AxisAggregates<'a> {
    error_mean: Vec<f64>,
    error_rms: Vec<f64>,
    error_peak: Vec<f64>,
    peak_freq: Vec<f64>,
    peak_power: Vec<f64>,
    responses: Vec<&'a FrequencyResponse>,
    arx_fits: Vec<&'a ArxFit>,
    performances: Vec<&'a PerformanceIndex>,
}

impl<'a> AxisAggregates<'a> {
    fn collect(diagnostics: &'a [PerAxis<Option<SegmentDiagnostics>>], axis_index: usize) -> Self {
        let mut aggregates = AxisAggregates {
            error_mean: Vec::new(),
            error_rms: Vec::new(),
            error_peak: Vec::new(),
            peak_freq: Vec::new(),
            peak_power: Vec::new(),
            responses: Vec::new(),
            arx_fits: Vec::new(),
            performances: Vec::new(),
        };

        for segment in diagnostics {
            if let Some(diag) = &segment[axis_index] {
                aggregates.error_mean.push(diag.stats.error_mean);
                aggregates.error_rms.push(diag.stats.error_rms);
                aggregates.error_peak.push(diag.stats.error_peak);
                if let Some((freq, power)) = diag.stats.dominant_frequency {
                    aggregates.peak_freq.push(freq);
                    aggregates.peak_power.push(power);
                }
                if let Some(response) = &diag.frequency_response {
                    aggregates.responses.push(response);
                }
                if let Some(arx) = &diag.arx {
                    aggregates.arx_fits.push(arx);
                }
                if let Some(performance) = &diag.performance {
                    aggregates.performances.push(performance);
                }
            }
        }

        aggregates
    }
}

/// Generates one fused recommendation per axis from the per-segment
/// diagnostics. Axes without any analyzed segment stay `None`.
///
/// `advanced` reports whether the advanced diagnostics were attempted at
/// all; it changes the wording of the confidence statement even when every
/// advanced estimator came back empty.
pub fn generate_recommendations(
    diagnostics: &[PerAxis<Option<SegmentDiagnostics>>],
    advanced: bool,
    config: &FusionConfig,
) -> PerAxis<Option<Recommendation>> {
    std::array::from_fn(|axis_index| {
        let aggregates = AxisAggregates::collect(diagnostics, axis_index);
        if aggregates.error_rms.is_empty() {
            return None;
        }
        Some(recommend_axis(axis_index, &aggregates, advanced, config))
    })
}

fn recommend_axis(
    axis_index: usize,
    aggregates: &AxisAggregates,
    advanced: bool,
    config: &FusionConfig,
) -> Recommendation {
    let mut contributions = vec![basic_contribution(aggregates, config)];

    if advanced {
        if !aggregates.responses.is_empty() {
            contributions.push(transfer_contribution(axis_index, &aggregates.responses, config));
        }
        if !aggregates.arx_fits.is_empty() {
            contributions.push(arx_contribution(axis_index, &aggregates.arx_fits, config));
        }
        if !aggregates.performances.is_empty() {
            let tracking: Vec<f64> = aggregates
                .performances
                .iter()
                .map(|p| p.tracking_score)
                .collect();
            let overall: Vec<f64> = aggregates
                .performances
                .iter()
                .map(|p| p.performance_index)
                .collect();
            // Healthy scores keep the performance source out of the fusion
            // entirely; it only weighs in when something needs fixing.
            if mean(&tracking) < config.performance_urgency_threshold
                || mean(&overall) < config.performance_urgency_threshold
            {
                contributions.push(performance_contribution(
                    axis_index,
                    &aggregates.performances,
                    config,
                ));
            }
        }
    }

    let fused = fuse_contributions(&contributions, config);
    let mut rationale: Vec<String> = contributions
        .into_iter()
        .flat_map(|contribution| contribution.notes)
        .collect();

    let p_percent = fused.p.round() as i32;
    let i_percent = fused.i.round() as i32;
    let d_percent = fused.d.round() as i32;

    if let Some(explanation) = resolve_conflicts(&rationale, p_percent, i_percent, d_percent) {
        rationale.push(explanation);
    }

    let confidence = fused.confidence.min(1.0);

    let error_mean = mean(&aggregates.error_mean);
    let error_rms = mean(&aggregates.error_rms);
    let error_peak = mean(&aggregates.error_peak);
    let frequency = if aggregates.peak_freq.is_empty() {
        None
    } else {
        Some((mean(&aggregates.peak_freq), mean(&aggregates.peak_power)))
    };

    let priority = prioritize_adjustment(p_percent, i_percent, d_percent, config);

    let well_tuned = p_percent.abs() <= config.well_tuned_threshold
        && i_percent.abs() <= config.well_tuned_threshold
        && d_percent.abs() <= config.well_tuned_threshold;

    let summary = build_summary(
        axis_index,
        p_percent,
        i_percent,
        d_percent,
        priority.as_ref(),
        well_tuned,
        error_rms,
        frequency,
        config,
    );

    rationale.push(confidence_statement(confidence, advanced));

    Recommendation {
        p_percent,
        i_percent,
        d_percent,
        error_mean,
        error_rms,
        error_peak,
        frequency,
        confidence,
        rationale,
        priority,
        well_tuned,
        summary,
    }
}

/// Folds the ordered contributions into fused P/I/D values.
///
/// The first contribution seeds the values outright; every later one is
/// blended in per term via `weighted_combine`, weighting the running value
/// by the confidence accumulated so far and the newcomer by its combine
/// weight. Terms a contribution has no opinion on pass through untouched.
pub fn fuse_contributions(contributions: &[Contribution], config: &FusionConfig) -> FusedAdjustments {
    let mut fused = FusedAdjustments::default();

    for (index, contribution) in contributions.iter().enumerate() {
        if index == 0 {
            fused.p = contribution.deltas.p.unwrap_or(0.0);
            fused.i = contribution.deltas.i.unwrap_or(0.0);
            fused.d = contribution.deltas.d.unwrap_or(0.0);
        } else {
            let weight = contribution.combine_weight;
            if let Some(value) = contribution.deltas.p {
                fused.p = weighted_combine(fused.p, value, fused.confidence, weight, config);
            }
            if let Some(value) = contribution.deltas.i {
                fused.i = weighted_combine(fused.i, value, fused.confidence, weight, config);
            }
            if let Some(value) = contribution.deltas.d {
                fused.d = weighted_combine(fused.d, value, fused.confidence, weight, config);
            }
        }
        fused.confidence += contribution.confidence_weight;
    }

    fused
}

/// Weighted average with safeguards for conflicting recommendations.
///
/// When the two values disagree in sign and one side is dominant in both
/// magnitude (at or beyond `dominance_ratio` times the other) and weight,
/// the result is pulled `dominance_bias` of the way toward the dominant
/// value so a strong signal is not diluted by a weak conflicting one.
pub fn weighted_combine(
    value1: f64,
    value2: f64,
    weight1: f64,
    weight2: f64,
    config: &FusionConfig,
) -> f64 {
    let weight1 = weight1.max(0.0);
    let weight2 = weight2.max(0.0);

    let total_weight = weight1 + weight2;
    if total_weight < config.min_combine_weight {
        return (value1 + value2) / 2.0;
    }

    let mut result = (value1 * weight1 + value2 * weight2) / total_weight;

    if value1 * value2 < 0.0 {
        let magnitude1 = value1.abs();
        let magnitude2 = value2.abs();

        if magnitude1 >= config.dominance_ratio * magnitude2 && weight1 >= weight2 {
            result = config.dominance_bias * value1 + (1.0 - config.dominance_bias) * result;
        } else if magnitude2 >= config.dominance_ratio * magnitude1 && weight2 >= weight1 {
            result = config.dominance_bias * value2 + (1.0 - config.dominance_bias) * result;
        }
    }

    result
}

fn basic_contribution(aggregates: &AxisAggregates, config: &FusionConfig) -> Contribution {
    let avg_error_mean = mean(&aggregates.error_mean);
    let avg_error_rms = mean(&aggregates.error_rms);
    let avg_error_peak = mean(&aggregates.error_peak);

    let mut p_adjustment: f64 = 0.0;
    let mut i_adjustment: f64 = 0.0;
    let mut d_adjustment: f64 = 0.0;
    let mut notes = Vec::new();

    if avg_error_rms > 50.0 {
        p_adjustment += 15.0;
        notes.push(format!(
            "High RMS error ({:.1}): Consider increasing P by ~15%",
            avg_error_rms
        ));
    } else if avg_error_rms < 10.0 {
        notes.push("Good tracking performance".to_string());
    }

    if !aggregates.peak_freq.is_empty() {
        let avg_peak_freq = mean(&aggregates.peak_freq);
        let avg_peak_power = mean(&aggregates.peak_power);

        if avg_peak_freq > 30.0 && avg_peak_power > 1000.0 {
            d_adjustment -= 20.0;
            notes.push(format!(
                "High frequency oscillations detected ({:.1}Hz): Consider reducing D by ~20%",
                avg_peak_freq
            ));
        } else if avg_peak_freq < 10.0 && avg_peak_power > 1000.0 {
            p_adjustment -= 10.0;
            d_adjustment += 15.0;
            notes.push(format!(
                "Low frequency oscillations detected ({:.1}Hz): Consider reducing P by ~10% and increasing D by ~15%",
                avg_peak_freq
            ));
        } else if (10.0..=30.0).contains(&avg_peak_freq) && avg_peak_power > 2000.0 {
            p_adjustment -= 10.0;
            notes.push(format!(
                "Medium frequency oscillations detected ({:.1}Hz): Consider reducing P by ~10%",
                avg_peak_freq
            ));
        }
    }

    if avg_error_mean > 30.0 {
        i_adjustment += 20.0;
        notes.push(format!(
            "High average error ({:.1}): Consider increasing I by ~20%",
            avg_error_mean
        ));
    }

    if p_adjustment.abs() < 5.0 && i_adjustment.abs() < 5.0 && d_adjustment.abs() < 5.0 {
        notes.push("Current tune appears to be well-balanced based on basic metrics.".to_string());
    }

    if avg_error_peak > 100.0 {
        notes.push(
            "High peak errors detected. This could indicate mechanical issues or extreme maneuvers."
                .to_string(),
        );
    }

    Contribution {
        source: ContributionSource::Basic,
        deltas: TermDeltas {
            p: Some(p_adjustment),
            i: Some(i_adjustment),
            d: Some(d_adjustment),
        },
        notes,
        combine_weight: config.basic_weight,
        confidence_weight: config.basic_weight,
    }
}

fn transfer_contribution(
    axis_index: usize,
    responses: &[&FrequencyResponse],
    config: &FusionConfig,
) -> Contribution {
    let mut p_adjustment = 0.0;
    let mut d_adjustment = 0.0;
    let mut notes = Vec::new();

    let phase_margins: Vec<f64> = responses.iter().map(|r| r.phase_margin).collect();

    let mut resonances: Vec<(f64, f64)> = Vec::new();
    let mut coherence_values = Vec::new();
    for response in responses {
        resonances.extend(response.resonant_frequencies.iter().copied());

        // Average coherence in the 0-20 Hz band where pilot inputs live.
        let mut sum = 0.0;
        let mut count = 0usize;
        for (bin, &freq) in response.frequencies.iter().enumerate() {
            if freq > 0.0 && freq < 20.0 {
                sum += response.coherence[bin];
                count += 1;
            }
        }
        if count > 0 {
            coherence_values.push(sum / count as f64);
        }
    }

    let avg_phase_margin = mean(&phase_margins);
    if avg_phase_margin < 30.0 {
        p_adjustment -= 15.0;
        d_adjustment += 20.0;
        notes.push(format!(
            "Low phase margin ({:.1}°): Reduce P by ~15% and increase D by ~20% to improve stability",
            avg_phase_margin
        ));
    } else if avg_phase_margin > 70.0 {
        p_adjustment += 10.0;
        notes.push(format!(
            "High phase margin ({:.1}°): System is overdamped, consider increasing P by ~10% for better responsiveness",
            avg_phase_margin
        ));
    } else {
        notes.push(format!(
            "Good phase margin ({:.1}°): System has good stability reserves",
            avg_phase_margin
        ));
    }

    if !resonances.is_empty() {
        let low_band: Vec<f64> = resonances
            .iter()
            .filter(|&&(freq, _)| freq < 10.0)
            .map(|&(_, magnitude)| magnitude)
            .collect();
        let mid_band: Vec<f64> = resonances
            .iter()
            .filter(|&&(freq, _)| (10.0..30.0).contains(&freq))
            .map(|&(_, magnitude)| magnitude)
            .collect();
        let high_band: Vec<f64> = resonances
            .iter()
            .filter(|&&(freq, _)| freq >= 30.0)
            .map(|&(_, magnitude)| magnitude)
            .collect();

        if max_of(&low_band) > 3.0 {
            p_adjustment -= 15.0;
            notes.push("Strong low-frequency resonance detected: Consider reducing P by ~15%".to_string());
        }
        if max_of(&mid_band) > 2.5 {
            p_adjustment -= 10.0;
            d_adjustment += 10.0;
            notes.push(
                "Mid-frequency resonance detected: Consider reducing P by ~10% and increasing D by ~10%"
                    .to_string(),
            );
        }
        if max_of(&high_band) > 2.0 {
            d_adjustment -= 20.0;
            notes.push("High-frequency resonance detected: Consider reducing D by ~20%".to_string());
        }
    }

    if !coherence_values.is_empty() {
        let avg_coherence = mean(&coherence_values);
        if avg_coherence < 0.5 {
            notes.push(format!(
                "Low input-output coherence ({:.2}): System behavior is nonlinear or there's significant noise in the signal. Mechanical issues may be present.",
                avg_coherence
            ));
        }
    }

    if notes.is_empty() {
        notes.push(format!(
            "Transfer function analysis shows no significant issues for {} axis.",
            axis_name(axis_index).to_uppercase()
        ));
    }

    Contribution {
        source: ContributionSource::TransferFunction,
        deltas: TermDeltas {
            p: Some(p_adjustment),
            i: None,
            d: Some(d_adjustment),
        },
        notes,
        combine_weight: config.transfer_weight,
        confidence_weight: config.transfer_weight,
    }
}

fn arx_contribution(axis_index: usize, fits: &[&ArxFit], config: &FusionConfig) -> Contribution {
    let mut notes = Vec::new();

    // Degenerate fits count as 0% and drag the average down, which is
    // exactly what should gate unreliable step-response conclusions.
    let fit_values: Vec<f64> = fits.iter().map(|fit| fit.model().fit_percent).collect();
    let avg_fit = mean(&fit_values);

    if avg_fit < config.arx_fit_gate_percent {
        notes.push(format!(
            "ARX model fit quality is low ({:.1}%): Recommendations may be less reliable",
            avg_fit
        ));
        return Contribution {
            source: ContributionSource::ArxModel,
            deltas: TermDeltas {
                p: Some(0.0),
                i: Some(0.0),
                d: Some(0.0),
            },
            notes,
            combine_weight: config.arx_weight,
            confidence_weight: config.arx_weight,
        };
    }

    let mut p_adjustment = 0.0;
    let mut i_adjustment = 0.0;
    let mut d_adjustment = 0.0;

    let mut rise_times = Vec::new();
    let mut settling_times = Vec::new();
    let mut overshoots = Vec::new();

    for fit in fits {
        if let Some(metrics) = step_metrics::analyze_step_response(&fit.model().step_response) {
            if let Some(rise) = metrics.rise_time_samples {
                rise_times.push(rise);
            }
            if let Some(settling) = metrics.settling_time_samples {
                settling_times.push(settling);
            }
            if let Some(overshoot) = metrics.overshoot_percent {
                overshoots.push(overshoot);
            }
        }
    }

    if !rise_times.is_empty() {
        let avg_rise_time = mean(&rise_times);
        if avg_rise_time > 20.0 {
            p_adjustment += 25.0;
            notes.push(format!(
                "Slow system response (rise time: {:.1} samples): Consider increasing P by ~25%",
                avg_rise_time
            ));
        } else if avg_rise_time > 10.0 {
            p_adjustment += 15.0;
            notes.push(format!(
                "Moderate system response (rise time: {:.1} samples): Consider increasing P by ~15%",
                avg_rise_time
            ));
        } else if avg_rise_time < 3.0 {
            p_adjustment -= 10.0;
            notes.push(format!(
                "Very fast system response (rise time: {:.1} samples): Consider decreasing P by ~10%",
                avg_rise_time
            ));
        }
    }

    if !overshoots.is_empty() {
        let avg_overshoot = mean(&overshoots);
        if avg_overshoot > 30.0 {
            p_adjustment -= 20.0;
            d_adjustment += 15.0;
            notes.push(format!(
                "High system overshoot ({:.1}%): Consider decreasing P by ~20% and increasing D by ~15%",
                avg_overshoot
            ));
        } else if avg_overshoot > 15.0 {
            p_adjustment -= 10.0;
            d_adjustment += 10.0;
            notes.push(format!(
                "Moderate system overshoot ({:.1}%): Consider decreasing P by ~10% and increasing D by ~10%",
                avg_overshoot
            ));
        } else if avg_overshoot < 5.0 {
            p_adjustment += 5.0;
            notes.push(format!(
                "Low system overshoot ({:.1}%): Consider increasing P by ~5% for better responsiveness",
                avg_overshoot
            ));
        }
    }

    if !settling_times.is_empty() {
        let avg_settling_time = mean(&settling_times);
        if avg_settling_time > 50.0 {
            i_adjustment += 20.0;
            notes.push(format!(
                "Slow system settling (settling time: {:.1} samples): Consider increasing I by ~20%",
                avg_settling_time
            ));
        } else if avg_settling_time > 30.0 {
            i_adjustment += 10.0;
            notes.push(format!(
                "Moderate system settling (settling time: {:.1} samples): Consider increasing I by ~10%",
                avg_settling_time
            ));
        }
    }

    if notes.is_empty() {
        notes.push(format!(
            "ARX model analysis suggests good step response characteristics for {} axis.",
            axis_name(axis_index).to_uppercase()
        ));
    }

    Contribution {
        source: ContributionSource::ArxModel,
        deltas: TermDeltas {
            p: Some(p_adjustment),
            i: Some(i_adjustment),
            d: Some(d_adjustment),
        },
        notes,
        combine_weight: config.arx_weight,
        confidence_weight: config.arx_weight,
    }
}

fn performance_contribution(
    axis_index: usize,
    performances: &[&PerformanceIndex],
    config: &FusionConfig,
) -> Contribution {
    let mut p_adjustment = 0.0;
    let mut i_adjustment = 0.0;
    let mut d_adjustment = 0.0;
    let mut notes = Vec::new();

    let combine_weight = config.performance_weight * config.performance_urgency_factor;

    if performances.is_empty() {
        notes.push(format!(
            "No performance data available for {} axis.",
            axis_name(axis_index).to_uppercase()
        ));
        return Contribution {
            source: ContributionSource::Performance,
            deltas: TermDeltas {
                p: Some(0.0),
                i: Some(0.0),
                d: Some(0.0),
            },
            notes,
            combine_weight,
            confidence_weight: config.performance_weight,
        };
    }

    let tracking: Vec<f64> = performances.iter().map(|p| p.tracking_score).collect();
    let noise: Vec<f64> = performances.iter().map(|p| p.noise_score).collect();
    let response: Vec<f64> = performances.iter().map(|p| p.response_score).collect();
    let overall: Vec<f64> = performances.iter().map(|p| p.performance_index).collect();

    let avg_tracking = mean(&tracking);
    let avg_noise = mean(&noise);
    let avg_response = mean(&response);
    let avg_performance = mean(&overall);

    if avg_tracking < 40.0 {
        p_adjustment += 25.0;
        i_adjustment += 15.0;
        notes.push(format!(
            "Very poor tracking performance (score: {:.1}): Consider increasing P by ~25% and I by ~15%",
            avg_tracking
        ));
    } else if avg_tracking < 60.0 {
        p_adjustment += 15.0;
        i_adjustment += 10.0;
        notes.push(format!(
            "Poor tracking performance (score: {:.1}): Consider increasing P by ~15% and I by ~10%",
            avg_tracking
        ));
    } else if avg_tracking > 80.0 {
        notes.push(format!(
            "Excellent tracking performance (score: {:.1})",
            avg_tracking
        ));
    }

    if avg_noise < 40.0 {
        d_adjustment -= 25.0;
        notes.push(format!(
            "High noise/vibration detected (score: {:.1}): Consider reducing D by ~25%",
            avg_noise
        ));
    } else if avg_noise < 60.0 {
        d_adjustment -= 15.0;
        notes.push(format!(
            "Moderate noise/vibration detected (score: {:.1}): Consider reducing D by ~15%",
            avg_noise
        ));
    } else if avg_noise > 80.0 {
        notes.push(format!(
            "Excellent noise performance (score: {:.1})",
            avg_noise
        ));
    }

    if avg_response < 40.0 {
        p_adjustment += 20.0;
        d_adjustment -= 10.0;
        notes.push(format!(
            "Poor responsiveness (score: {:.1}): Consider increasing P by ~20% and reducing D by ~10%",
            avg_response
        ));
    } else if avg_response < 60.0 {
        p_adjustment += 10.0;
        notes.push(format!(
            "Moderate responsiveness (score: {:.1}): Consider increasing P by ~10%",
            avg_response
        ));
    }

    if avg_performance > 80.0 {
        notes.push(format!(
            "Overall performance is excellent ({:.1}). Only minor PID adjustments may be needed.",
            avg_performance
        ));
    } else if avg_performance < 50.0 {
        notes.push(format!(
            "Overall performance is poor ({:.1}). Significant PID adjustments are recommended.",
            avg_performance
        ));
    }

    if notes.is_empty() {
        notes.push(format!(
            "Performance metrics suggest good overall performance for {} axis.",
            axis_name(axis_index).to_uppercase()
        ));
    }

    Contribution {
        source: ContributionSource::Performance,
        deltas: TermDeltas {
            p: Some(p_adjustment),
            i: Some(i_adjustment),
            d: Some(d_adjustment),
        },
        notes,
        combine_weight,
        confidence_weight: config.performance_weight,
    }
}

/// Scans the rationale text for contradictory directives per term and
/// explains which side won, or notes a cancellation to zero. Returns all
/// explanation lines joined into a single entry.
pub fn resolve_conflicts(
    rationale: &[String],
    p_percent: i32,
    i_percent: i32,
    d_percent: i32,
) -> Option<String> {
    let (increase_p, decrease_p) = directive_flags(rationale, 'p');
    let (increase_i, decrease_i) = directive_flags(rationale, 'i');
    let (increase_d, decrease_d) = directive_flags(rationale, 'd');

    let mut explanation: Vec<String> = Vec::new();

    if increase_p && decrease_p {
        if p_percent > 0 {
            explanation.push(
                "Conflicting P recommendations detected: Prioritizing responsiveness over stability."
                    .to_string(),
            );
        } else if p_percent < 0 {
            explanation.push(
                "Conflicting P recommendations detected: Prioritizing stability over responsiveness."
                    .to_string(),
            );
        } else {
            explanation.push("Conflicting P recommendations balanced out to no change.".to_string());
        }
    }

    if increase_i && decrease_i {
        if i_percent > 0 {
            explanation.push(
                "Conflicting I recommendations detected: Prioritizing steady-state accuracy."
                    .to_string(),
            );
        } else if i_percent < 0 {
            explanation.push(
                "Conflicting I recommendations detected: Prioritizing reducing steady-state oscillation."
                    .to_string(),
            );
        } else {
            explanation.push("Conflicting I recommendations balanced out to no change.".to_string());
        }
    }

    if increase_d && decrease_d {
        if d_percent > 0 {
            explanation.push(
                "Conflicting D recommendations detected: Prioritizing damping and stability."
                    .to_string(),
            );
        } else if d_percent < 0 {
            explanation.push(
                "Conflicting D recommendations detected: Prioritizing noise reduction.".to_string(),
            );
        } else {
            explanation.push("Conflicting D recommendations balanced out to no change.".to_string());
        }
    }

    if increase_p && !decrease_p && p_percent <= 0 {
        explanation.push("P increase was recommended but weighted down by other factors.".to_string());
    }
    if !increase_p && decrease_p && p_percent >= 0 {
        explanation.push("P decrease was recommended but weighted out by other factors.".to_string());
    }

    if increase_i && !decrease_i && i_percent <= 0 {
        explanation.push("I increase was recommended but weighted down by other factors.".to_string());
    }
    if !increase_i && decrease_i && i_percent >= 0 {
        explanation.push("I decrease was recommended but weighted out by other factors.".to_string());
    }

    if increase_d && !decrease_d && d_percent <= 0 {
        explanation.push("D increase was recommended but weighted down by other factors.".to_string());
    }
    if !increase_d && decrease_d && d_percent >= 0 {
        explanation.push("D decrease was recommended but weighted out by other factors.".to_string());
    }

    let has_conflict =
        increase_p && decrease_p || increase_i && decrease_i || increase_d && decrease_d;
    let has_zero_with_rec = (p_percent == 0 && (increase_p || decrease_p))
        || (i_percent == 0 && (increase_i || decrease_i))
        || (d_percent == 0 && (increase_d || decrease_d));

    if has_conflict || has_zero_with_rec {
        explanation.push(
            "Remember that PID tuning involves trade-offs between responsiveness, stability, and noise rejection."
                .to_string(),
        );
    }

    if explanation.is_empty() {
        None
    } else {
        Some(explanation.join("\n"))
    }
}

/// Whether the rationale mentions increasing respectively decreasing the
/// given term. The generated notes use both gerund ("increasing P") and
/// imperative ("increase D") forms, so both are matched.
fn directive_flags(rationale: &[String], term_letter: char) -> (bool, bool) {
    let increase_needles = [
        format!("increasing {}", term_letter),
        format!("increase {}", term_letter),
    ];
    let decrease_needles = [
        format!("reducing {}", term_letter),
        format!("reduce {}", term_letter),
        format!("decreasing {}", term_letter),
        format!("decrease {}", term_letter),
    ];

    let mut increase = false;
    let mut decrease = false;
    for text in rationale {
        let lower = text.to_lowercase();
        if increase_needles.iter().any(|needle| lower.contains(needle.as_str())) {
            increase = true;
        }
        if decrease_needles.iter().any(|needle| lower.contains(needle.as_str())) {
            decrease = true;
        }
    }

    (increase, decrease)
}

/// Picks which term to adjust first: the largest magnitude wins, ties in
/// P, I, D order. A significant negative D adjustment overrides the pick,
/// since noise problems should be fixed before anything else.
pub fn prioritize_adjustment(
    p_percent: i32,
    i_percent: i32,
    d_percent: i32,
    config: &FusionConfig,
) -> Option<(PidTerm, String)> {
    if p_percent == 0 && i_percent == 0 && d_percent == 0 {
        return None;
    }

    let candidates = [
        (PidTerm::P, p_percent),
        (PidTerm::I, i_percent),
        (PidTerm::D, d_percent),
    ];

    let mut term = PidTerm::P;
    let mut max_value = -1;
    for (candidate, value) in candidates {
        if value.abs() > max_value {
            term = candidate;
            max_value = value.abs();
        }
    }

    let mut reason = match term {
        PidTerm::P => {
            if p_percent > 0 {
                format!("Increase P by {}% to improve responsiveness.", p_percent)
            } else {
                format!("Decrease P by {}% to reduce oscillations.", p_percent.abs())
            }
        }
        PidTerm::I => {
            if i_percent > 0 {
                format!("Increase I by {}% to improve steady-state tracking.", i_percent)
            } else {
                format!("Decrease I by {}% to reduce I-term buildup.", i_percent.abs())
            }
        }
        PidTerm::D => {
            if d_percent > 0 {
                format!("Increase D by {}% to improve damping.", d_percent)
            } else {
                format!("Decrease D by {}% to reduce noise amplification.", d_percent.abs())
            }
        }
    };

    if d_percent < config.noise_priority_delta
        && d_percent.abs() as f64 >= max_value as f64 * config.noise_priority_fraction
    {
        term = PidTerm::D;
        reason = format!(
            "Decrease D by {}% to reduce noise amplification. Noise should be addressed before other tuning.",
            d_percent.abs()
        );
    }

    if max_value < config.well_tuned_threshold {
        reason.push_str(
            " This is a relatively small adjustment, which indicates the current tune is reasonable.",
        );
    }

    Some((term, reason))
}

#[allow(clippy::too_many_arguments)]
fn build_summary(
    axis_index: usize,
    p_percent: i32,
    i_percent: i32,
    d_percent: i32,
    priority: Option<&(PidTerm, String)>,
    well_tuned: bool,
    avg_error_rms: f64,
    frequency: Option<(f64, f64)>,
    config: &FusionConfig,
) -> Vec<String> {
    let axis_label = axis_name(axis_index).to_uppercase();
    let mut summary = Vec::new();

    if well_tuned {
        summary.push(format!(
            "Your {} axis appears to be well-tuned! No significant adjustments needed.",
            axis_label
        ));
        if avg_error_rms < 10.0 {
            summary.push(format!("- Low tracking error (RMS: {:.1})", avg_error_rms));
        }
        if let Some((_, avg_peak_power)) = frequency {
            if avg_peak_power < 100.0 {
                summary.push(format!("- Low oscillations (power: {:.1})", avg_peak_power));
            }
        }
    } else if let Some((term, reason)) = priority {
        let adjustment = match term {
            PidTerm::P => p_percent,
            PidTerm::I => i_percent,
            PidTerm::D => d_percent,
        };
        let direction = if adjustment > 0 { "Increase" } else { "Decrease" };
        summary.push(format!(
            "RECOMMENDED ACTION: {} {} by {}% [Adjust first]",
            direction,
            term,
            adjustment.abs()
        ));
        summary.push(format!("- {}", reason));

        for (other, value) in [
            (PidTerm::P, p_percent),
            (PidTerm::I, i_percent),
            (PidTerm::D, d_percent),
        ] {
            if other != *term && value.abs() > config.well_tuned_threshold {
                let verb = if value > 0 { "increase" } else { "decrease" };
                summary.push(format!(
                    "- After testing, also {} {} by {}%",
                    verb,
                    other,
                    value.abs()
                ));
            }
        }
    } else {
        summary.push(format!(
            "Your {} axis tuning could be improved, but only minor adjustments are recommended:",
            axis_label
        ));
        for (term, value) in [
            (PidTerm::P, p_percent),
            (PidTerm::I, i_percent),
            (PidTerm::D, d_percent),
        ] {
            if value != 0 {
                let direction = if value > 0 { "Increase" } else { "Decrease" };
                summary.push(format!("- {} {} by {}%", direction, term, value.abs()));
            }
        }
    }

    summary
}

fn confidence_statement(confidence: f64, advanced: bool) -> String {
    let confidence_percent = confidence * 100.0;
    let mut text = format!("Recommendation confidence: {:.0}%", confidence_percent);

    if advanced {
        if confidence_percent >= 80.0 {
            text.push_str(" (High - based on comprehensive analysis)");
        } else if confidence_percent >= 60.0 {
            text.push_str(" (Medium - based on multiple analysis methods)");
        } else {
            text.push_str(" (Low - limited analysis available)");
        }
    } else {
        text.push_str(" (Based on basic analysis only)");
    }

    text
}

/// Detailed per-axis report: metrics, every rationale line, and the final
/// adjustments.
pub fn format_axis_report(axis_index: usize, recommendation: &Recommendation) -> String {
    let mut report = String::new();
    let axis_label = axis_name(axis_index).to_uppercase();

    report.push_str(&format!("\n{} Axis - DETAILED Analysis:\n", axis_label));
    report.push_str(&format!(
        "Average error metrics: mean={:.1}, RMS={:.1}, peak={:.1}\n",
        recommendation.error_mean, recommendation.error_rms, recommendation.error_peak
    ));
    if let Some((avg_peak_freq, avg_peak_power)) = recommendation.frequency {
        report.push_str(&format!(
            "Average dominant frequency: {:.1}Hz, power: {:.1}\n",
            avg_peak_freq, avg_peak_power
        ));
    }
    for note in &recommendation.rationale {
        report.push_str(&format!("- {}\n", note));
    }
    report.push_str("\nCalculated PID adjustments:\n");
    report.push_str(&format!("P: {:+}%\n", recommendation.p_percent));
    report.push_str(&format!("I: {:+}%\n", recommendation.i_percent));
    report.push_str(&format!("D: {:+}%\n", recommendation.d_percent));

    report
}

/// Bottom-line summary across all axes, listing what to change per axis.
pub fn format_summary(recommendations: &PerAxis<Option<Recommendation>>) -> String {
    let divider = "=".repeat(50);
    let mut report = String::new();

    report.push_str(&format!("\n{}\n", divider));
    report.push_str("SUMMARY: WHAT TO CHANGE\n");
    report.push_str(&format!("{}\n", divider));

    for (axis_index, recommendation) in recommendations.iter().enumerate() {
        if let Some(rec) = recommendation {
            report.push_str(&format!("\n{} AXIS:\n", axis_name(axis_index).to_uppercase()));
            for line in &rec.summary {
                report.push_str(&format!("{}\n", line));
            }
        }
    }

    report
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

// src/data_analysis/pid_recommender.rs

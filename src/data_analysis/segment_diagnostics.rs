// src/data_analysis/segment_diagnostics.rs

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::data_analysis::arx_model::{self, ArxFit, ArxOrders};
use crate::data_analysis::performance_index::{self, PerformanceIndex};
use crate::data_analysis::segment_stats::{self, SegmentStats};
use crate::data_analysis::spectral_analysis::WelchConfig;
use crate::data_analysis::transfer_function::{self, FrequencyResponse};
use crate::types::{PerAxis, SampleSeries};

/// Which diagnostics to run per segment/axis, and with which knobs.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// When false, only the basic error/frequency statistics are computed.
    pub advanced: bool,
    pub welch: WelchConfig,
    pub arx_orders: ArxOrders,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            advanced: true,
            welch: WelchConfig::default(),
            arx_orders: ArxOrders::default(),
        }
    }
}

/// Everything the analysis stage produces for one axis of one segment.
///
/// Advanced diagnostics are optional: absent when advanced analysis is
/// disabled, or when an estimator could not run on this input. A missing
/// entry later means that source simply contributes nothing to the fusion.
#[derive(Debug, Clone)]
pub struct SegmentDiagnostics {
    pub stats: SegmentStats,
    pub frequency_response: Option<FrequencyResponse>,
    pub arx: Option<ArxFit>,
    pub performance: Option<PerformanceIndex>,
}

/// Runs the full diagnostic set for one axis of one segment.
pub fn analyze_axis_segment(
    series: &SampleSeries,
    options: &AnalysisOptions,
) -> SegmentDiagnostics {
    let stats = segment_stats::analyze_segment_stats(series, &options.welch);

    let mut frequency_response = None;
    let mut arx = None;
    let mut performance = None;

    if options.advanced {
        if let Some(sample_rate) = series.sample_rate_hz() {
            frequency_response = transfer_function::estimate_frequency_response(
                series.setpoint(),
                series.measured(),
                sample_rate,
                &options.welch,
            )
            .ok();
            performance = performance_index::calculate_performance_index(
                series.setpoint(),
                series.measured(),
                sample_rate,
                &options.welch,
            )
            .ok();
        }
        // ARX identification never fails; it degrades to a degenerate fit.
        arx = Some(arx_model::identify_arx(
            series.setpoint(),
            series.measured(),
            &options.arx_orders,
        ));
    }

    SegmentDiagnostics {
        stats,
        frequency_response,
        arx,
        performance,
    }
}

/// Fans the diagnostics out across all segments. Each segment/axis
/// combination is a pure function of its series, so with the `parallel`
/// feature enabled segments run on the rayon pool; the recommendation
/// fusion afterwards sees the same ordering either way.
pub fn analyze_all_segments(
    segments: &[PerAxis<Option<SampleSeries>>],
    options: &AnalysisOptions,
) -> Vec<PerAxis<Option<SegmentDiagnostics>>> {
    #[cfg(feature = "parallel")]
    {
        segments
            .par_iter()
            .map(|axes| analyze_segment_axes(axes, options))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        segments
            .iter()
            .map(|axes| analyze_segment_axes(axes, options))
            .collect()
    }
}

fn analyze_segment_axes(
    axes: &PerAxis<Option<SampleSeries>>,
    options: &AnalysisOptions,
) -> PerAxis<Option<SegmentDiagnostics>> {
    std::array::from_fn(|axis| {
        axes[axis]
            .as_ref()
            .map(|series| analyze_axis_segment(series, options))
    })
}

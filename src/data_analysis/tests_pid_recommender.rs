#[cfg(test)]
mod tests {
    use crate::data_analysis::arx_model::{ArxFit, ArxModel, ArxOrders};
    use crate::data_analysis::performance_index::PerformanceIndex;
    use crate::data_analysis::pid_recommender::{
        format_axis_report, format_summary, fuse_contributions, generate_recommendations,
        prioritize_adjustment, resolve_conflicts, weighted_combine, Contribution,
        ContributionSource, FusionConfig, PidTerm, TermDeltas,
    };
    use crate::data_analysis::segment_diagnostics::SegmentDiagnostics;
    use crate::data_analysis::segment_stats::SegmentStats;
    use crate::data_analysis::transfer_function::FrequencyResponse;

    fn stats_diag(
        error_mean: f64,
        error_rms: f64,
        error_peak: f64,
        frequency: Option<(f64, f64)>,
    ) -> SegmentDiagnostics {
        SegmentDiagnostics {
            stats: SegmentStats {
                error_mean,
                error_rms,
                error_peak,
                dominant_frequency: frequency,
            },
            frequency_response: None,
            arx: None,
            performance: None,
        }
    }

    fn flat_response(phase_margin: f64) -> FrequencyResponse {
        FrequencyResponse {
            frequencies: vec![0.0, 5.0, 10.0, 15.0],
            magnitude: vec![1.0; 4],
            phase_deg: vec![0.0; 4],
            coherence: vec![0.9; 4],
            phase_margin,
            resonant_frequencies: Vec::new(),
        }
    }

    fn degenerate_arx() -> ArxFit {
        let orders = ArxOrders::default();
        ArxFit::Degenerate(ArxModel {
            orders,
            parameters: vec![0.0; 8],
            a_poly: vec![1.0, 0.0, 0.0, 0.0, 0.0],
            b_poly: vec![0.0; 4],
            predicted: Vec::new(),
            fit_percent: 0.0,
            step_response: Vec::new(),
        })
    }

    fn perf_scores(tracking: f64, noise: f64, response: f64, overall: f64) -> PerformanceIndex {
        PerformanceIndex {
            tracking_score: tracking,
            noise_score: noise,
            response_score: response,
            performance_index: overall,
            error_mean: 10.0,
            error_rms: 35.0,
            error_peak: 60.0,
            peak_freq: 5.0,
            peak_power: 200.0,
            high_freq_ratio: 0.05,
            responsiveness: 0.5,
            corr_lag: 0,
        }
    }

    #[test]
    fn test_weighted_combine_same_sign_is_plain_weighted_average() {
        let config = FusionConfig::default();
        assert!((weighted_combine(10.0, 20.0, 0.3, 0.3, &config) - 15.0).abs() < 1e-12);
        assert!((weighted_combine(15.0, 0.0, 0.3, 0.2, &config) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_combine_tiny_weights_fall_back_to_simple_average() {
        let config = FusionConfig::default();
        assert!((weighted_combine(10.0, -4.0, 0.0, 0.0, &config) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_combine_dominant_conflict_biases_toward_strong_signal() {
        let config = FusionConfig::default();
        let result = weighted_combine(10.0, -5.0, 0.8, 0.2, &config);

        // Unbiased weighted average would be 7.0; the dominant side (twice
        // the magnitude, higher weight) pulls the result most of the way in.
        let unbiased: f64 = (10.0 * 0.8 + (-5.0) * 0.2) / 1.0;
        assert!((result - 10.0).abs() < (unbiased - 10.0).abs());
        assert!((result - 9.4).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_combine_balanced_conflict_stays_weighted() {
        let config = FusionConfig::default();
        // Neither side reaches double the other's magnitude.
        assert!((weighted_combine(10.0, -6.0, 0.5, 0.5, &config) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fuse_skips_terms_without_opinion() {
        let config = FusionConfig::default();
        let contributions = vec![
            Contribution {
                source: ContributionSource::Basic,
                deltas: TermDeltas {
                    p: Some(10.0),
                    i: Some(4.0),
                    d: Some(0.0),
                },
                notes: Vec::new(),
                combine_weight: 0.3,
                confidence_weight: 0.3,
            },
            Contribution {
                source: ContributionSource::TransferFunction,
                deltas: TermDeltas {
                    p: Some(-20.0),
                    i: None,
                    d: Some(6.0),
                },
                notes: Vec::new(),
                combine_weight: 0.3,
                confidence_weight: 0.3,
            },
        ];

        let fused = fuse_contributions(&contributions, &config);

        // P conflicts with a dominant newcomer: weighted mean is -5, then
        // biased 80% toward -20.
        assert!((fused.p - -17.0).abs() < 1e-9);
        // I has no second opinion and passes through.
        assert!((fused.i - 4.0).abs() < 1e-12);
        assert!((fused.d - 3.0).abs() < 1e-12);
        assert!((fused.confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_high_rms_error_recommends_more_p() {
        let diagnostics = vec![[Some(stats_diag(5.0, 60.0, 80.0, None)), None, None]];
        let recommendations =
            generate_recommendations(&diagnostics, false, &FusionConfig::default());

        let rec = recommendations[0].as_ref().unwrap();
        assert_eq!(rec.p_percent, 15);
        assert_eq!(rec.i_percent, 0);
        assert_eq!(rec.d_percent, 0);
        assert!(rec
            .rationale
            .iter()
            .any(|note| note.contains("increasing P")));
        assert!((rec.confidence - 0.3).abs() < 1e-12);
        assert_eq!(
            rec.rationale.last().unwrap(),
            "Recommendation confidence: 30% (Based on basic analysis only)"
        );

        assert!(recommendations[1].is_none());
        assert!(recommendations[2].is_none());
    }

    #[test]
    fn test_high_frequency_oscillation_recommends_less_d() {
        let diagnostics = vec![[
            Some(stats_diag(5.0, 20.0, 50.0, Some((35.0, 1500.0)))),
            None,
            None,
        ]];
        let recommendations =
            generate_recommendations(&diagnostics, false, &FusionConfig::default());

        let rec = recommendations[0].as_ref().unwrap();
        assert_eq!(rec.d_percent, -20);
        assert_eq!(rec.p_percent, 0);
        assert_eq!(rec.frequency, Some((35.0, 1500.0)));

        // A significant D cut is a noise problem, so D leads the summary.
        let (term, reason) = rec.priority.as_ref().unwrap();
        assert_eq!(*term, PidTerm::D);
        assert!(reason.contains("Noise should be addressed before other tuning."));
        assert_eq!(
            rec.summary[0],
            "RECOMMENDED ACTION: Decrease D by 20% [Adjust first]"
        );
    }

    #[test]
    fn test_noise_override_takes_priority_over_larger_p() {
        let config = FusionConfig::default();
        let (term, reason) = prioritize_adjustment(25, 0, -18, &config).unwrap();
        assert_eq!(term, PidTerm::D);
        assert!(reason.starts_with("Decrease D by 18%"));
        assert!(reason.contains("Noise should be addressed before other tuning."));
    }

    #[test]
    fn test_priority_ties_resolve_in_term_order() {
        let config = FusionConfig::default();
        let (term, _) = prioritize_adjustment(10, -10, 10, &config).unwrap();
        assert_eq!(term, PidTerm::P);

        assert!(prioritize_adjustment(0, 0, 0, &config).is_none());
    }

    #[test]
    fn test_small_priority_gets_reassuring_suffix() {
        let config = FusionConfig::default();
        let (term, reason) = prioritize_adjustment(3, 0, 0, &config).unwrap();
        assert_eq!(term, PidTerm::P);
        assert!(reason.ends_with("indicates the current tune is reasonable."));
    }

    #[test]
    fn test_confidence_capped_with_all_sources() {
        let diag = SegmentDiagnostics {
            stats: SegmentStats {
                error_mean: 5.0,
                error_rms: 60.0,
                error_peak: 80.0,
                dominant_frequency: None,
            },
            frequency_response: Some(flat_response(45.0)),
            arx: Some(degenerate_arx()),
            performance: Some(perf_scores(30.0, 70.0, 50.0, 47.0)),
        };
        let diagnostics = vec![[Some(diag), None, None]];
        let recommendations =
            generate_recommendations(&diagnostics, true, &FusionConfig::default());

        let rec = recommendations[0].as_ref().unwrap();
        assert!(rec.confidence <= 1.0);
        assert!((rec.confidence - 1.0).abs() < 1e-9);
        assert!(rec
            .rationale
            .last()
            .unwrap()
            .contains("(High - based on comprehensive analysis)"));

        // All four sources left their notes.
        assert!(rec.rationale.iter().any(|n| n.contains("High RMS error")));
        assert!(rec.rationale.iter().any(|n| n.contains("Good phase margin")));
        assert!(rec
            .rationale
            .iter()
            .any(|n| n.contains("ARX model fit quality is low")));
        assert!(rec
            .rationale
            .iter()
            .any(|n| n.contains("Very poor tracking performance")));

        // Fold trace for P: 15 (basic), then 7.5 against the neutral
        // transfer source, 5.625 against the gated ARX zeros, then pulled
        // to ~13.6 by the urgent performance source (+35).
        assert_eq!(rec.p_percent, 14);
        assert_eq!(rec.i_percent, 4);
        assert_eq!(rec.d_percent, 0);
    }

    #[test]
    fn test_low_arx_fit_dilutes_without_direction() {
        let mut diag = stats_diag(5.0, 60.0, 80.0, None);
        diag.arx = Some(degenerate_arx());
        let diagnostics = vec![[Some(diag), None, None]];
        let recommendations =
            generate_recommendations(&diagnostics, true, &FusionConfig::default());

        let rec = recommendations[0].as_ref().unwrap();
        // Basic +15 averaged against the gate's zeros: (15*0.3)/(0.5) = 9.
        assert_eq!(rec.p_percent, 9);
        assert!((rec.confidence - 0.5).abs() < 1e-12);
        assert!(rec
            .rationale
            .iter()
            .any(|n| n.contains("ARX model fit quality is low (0.0%)")));
    }

    #[test]
    fn test_healthy_performance_stays_out_of_fusion() {
        let mut diag = stats_diag(5.0, 20.0, 50.0, None);
        diag.performance = Some(perf_scores(90.0, 90.0, 80.0, 88.0));
        let diagnostics = vec![[Some(diag), None, None]];
        let recommendations =
            generate_recommendations(&diagnostics, true, &FusionConfig::default());

        let rec = recommendations[0].as_ref().unwrap();
        assert!((rec.confidence - 0.3).abs() < 1e-12);
        assert!(!rec
            .rationale
            .iter()
            .any(|n| n.contains("tracking performance (score")));
    }

    #[test]
    fn test_well_tuned_axis_summary() {
        let diagnostics = vec![[Some(stats_diag(2.0, 5.0, 20.0, None)), None, None]];
        let recommendations =
            generate_recommendations(&diagnostics, false, &FusionConfig::default());

        let rec = recommendations[0].as_ref().unwrap();
        assert!(rec.well_tuned);
        assert!(rec.priority.is_none());
        assert_eq!(
            rec.summary,
            vec![
                "Your ROLL axis appears to be well-tuned! No significant adjustments needed."
                    .to_string(),
                "- Low tracking error (RMS: 5.0)".to_string(),
            ]
        );
    }

    #[test]
    fn test_well_tuned_summary_mentions_low_oscillation_power() {
        let diagnostics = vec![[
            Some(stats_diag(2.0, 5.0, 20.0, Some((12.0, 50.0)))),
            None,
            None,
        ]];
        let recommendations =
            generate_recommendations(&diagnostics, false, &FusionConfig::default());

        let rec = recommendations[0].as_ref().unwrap();
        assert!(rec.well_tuned);
        assert_eq!(rec.summary.len(), 3);
        assert_eq!(rec.summary[2], "- Low oscillations (power: 50.0)");
    }

    #[test]
    fn test_conflicting_p_directives_explained() {
        let rationale = vec![
            "High RMS error (60.0): Consider increasing P by ~15%".to_string(),
            "Strong low-frequency resonance detected: Consider reducing P by ~15%".to_string(),
        ];
        let explanation = resolve_conflicts(&rationale, -5, 0, 0).unwrap();

        assert!(explanation
            .contains("Conflicting P recommendations detected: Prioritizing stability over responsiveness."));
        assert!(explanation.contains("Remember that PID tuning involves trade-offs"));
        // All lines are folded into a single rationale entry.
        assert!(explanation.contains('\n'));
    }

    #[test]
    fn test_conflict_cancelled_to_zero_is_noted() {
        let rationale = vec![
            "Slow system response (rise time: 25.0 samples): Consider increasing P by ~25%"
                .to_string(),
            "Mid-frequency resonance detected: Consider reducing P by ~10% and increasing D by ~10%"
                .to_string(),
        ];
        let explanation = resolve_conflicts(&rationale, 0, 0, 0).unwrap();
        assert!(explanation.contains("Conflicting P recommendations balanced out to no change."));
    }

    #[test]
    fn test_one_sided_increase_weighted_down() {
        let rationale =
            vec!["Slow system response (rise time: 25.0 samples): Consider increasing P by ~25%"
                .to_string()];
        let explanation = resolve_conflicts(&rationale, 0, 0, 0).unwrap();
        assert!(explanation.contains("P increase was recommended but weighted down by other factors."));
        assert!(explanation.contains("Remember that PID tuning involves trade-offs"));
    }

    #[test]
    fn test_one_sided_decrease_weighted_out() {
        let rationale = vec![
            "High frequency oscillations detected (35.0Hz): Consider reducing D by ~20%".to_string(),
        ];
        let explanation = resolve_conflicts(&rationale, 0, 0, 2).unwrap();
        assert!(explanation.contains("D decrease was recommended but weighted out by other factors."));
        // Final D is nonzero and there is no two-sided conflict, so no
        // trade-off reminder.
        assert!(!explanation.contains("Remember that PID tuning involves trade-offs"));
    }

    #[test]
    fn test_imperative_directives_are_recognized() {
        let rationale = vec![
            "Low phase margin (22.0°): Reduce P by ~15% and increase D by ~20% to improve stability"
                .to_string(),
            "High noise/vibration detected (score: 35.0): Consider reducing D by ~25%".to_string(),
        ];
        let explanation = resolve_conflicts(&rationale, -15, 0, -3).unwrap();
        assert!(explanation
            .contains("Conflicting D recommendations detected: Prioritizing noise reduction."));
    }

    #[test]
    fn test_no_directives_means_no_conflict_entry() {
        let rationale = vec!["Good tracking performance".to_string()];
        assert!(resolve_conflicts(&rationale, 0, 0, 0).is_none());
    }

    #[test]
    fn test_axis_report_layout() {
        let diagnostics = vec![[Some(stats_diag(5.0, 60.0, 80.0, None)), None, None]];
        let recommendations =
            generate_recommendations(&diagnostics, false, &FusionConfig::default());
        let rec = recommendations[0].as_ref().unwrap();

        let report = format_axis_report(0, rec);
        assert!(report.starts_with("\nROLL Axis - DETAILED Analysis:\n"));
        assert!(report.contains("Average error metrics: mean=5.0, RMS=60.0, peak=80.0\n"));
        assert!(report.contains("- High RMS error (60.0): Consider increasing P by ~15%\n"));
        assert!(report.contains("\nCalculated PID adjustments:\nP: +15%\nI: +0%\nD: +0%\n"));
        assert!(!report.contains("Average dominant frequency"));
    }

    #[test]
    fn test_summary_layout() {
        let diagnostics = vec![[Some(stats_diag(2.0, 5.0, 20.0, None)), None, None]];
        let recommendations =
            generate_recommendations(&diagnostics, false, &FusionConfig::default());

        let summary = format_summary(&recommendations);
        assert!(summary.contains(&"=".repeat(50)));
        assert!(summary.contains("SUMMARY: WHAT TO CHANGE\n"));
        assert!(summary.contains("\nROLL AXIS:\n"));
        assert!(summary.contains("Your ROLL axis appears to be well-tuned!"));
        assert!(!summary.contains("PITCH AXIS"));
    }
}
